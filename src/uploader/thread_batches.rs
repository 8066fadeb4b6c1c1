use std::path::PathBuf;

/// A run of consecutive pages posted together as one message
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageBatch {
    /// 0-based position in the thread
    pub index: usize,
    pub total: usize,
    pub pages: Vec<PathBuf>,
}

impl PageBatch {
    /// 1-based number shown in the post text
    pub fn number(&self) -> usize {
        self.index + 1
    }

    pub fn is_first(&self) -> bool {
        self.index == 0
    }

    pub fn is_last(&self) -> bool {
        self.index + 1 == self.total
    }
}

pub fn batch_count(total_pages: usize, batch_size: usize) -> usize {
    total_pages.div_ceil(batch_size)
}

/// Splits pages into `batch_size` chunks, keeping order; only the last chunk
/// may be short. `batch_size` must be at least 1.
pub fn plan_batches(pages: &[PathBuf], batch_size: usize) -> Vec<PageBatch> {
    let total = batch_count(pages.len(), batch_size);

    pages
        .chunks(batch_size)
        .enumerate()
        .map(|(index, chunk)| PageBatch {
            index,
            total,
            pages: chunk.to_vec(),
        })
        .collect()
}

/// Text for one batch post. The first post carries the opening line and the
/// hashtags; the rest only the counter.
pub fn compose_batch_text(batch: &PageBatch, opening: &str, hashtags: &str) -> String {
    if batch.is_first() {
        format!(
            "{}({}/{})\n\n{}",
            opening,
            batch.number(),
            batch.total,
            hashtags
        )
    } else {
        format!("({}/{})", batch.number(), batch.total)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pages(count: usize) -> Vec<PathBuf> {
        (1..=count)
            .map(|i| PathBuf::from(format!("demo/page_{:02}.png", i)))
            .collect()
    }

    #[test]
    fn test_batch_count() {
        assert_eq!(batch_count(5, 2), 3);
        assert_eq!(batch_count(4, 2), 2);
        assert_eq!(batch_count(1, 4), 1);
        assert_eq!(batch_count(16, 1), 16);
    }

    #[test]
    fn test_plan_batches_sizes_and_order() {
        let pages = pages(5);
        let batches = plan_batches(&pages, 2);

        let sizes: Vec<_> = batches.iter().map(|b| b.pages.len()).collect();
        assert_eq!(sizes, vec![2, 2, 1]);

        let flattened: Vec<_> = batches.iter().flat_map(|b| b.pages.clone()).collect();
        assert_eq!(flattened, pages);

        assert!(batches[0].is_first());
        assert!(batches[2].is_last());
        assert!(batches.iter().all(|b| b.total == 3));
    }

    #[test]
    fn test_plan_batches_exact_multiple() {
        let batches = plan_batches(&pages(6), 3);
        let sizes: Vec<_> = batches.iter().map(|b| b.pages.len()).collect();
        assert_eq!(sizes, vec![3, 3]);
    }

    #[test]
    fn test_compose_batch_text() {
        let batches = plan_batches(&pages(5), 2);

        assert_eq!(
            compose_batch_text(&batches[0], "📖 新作漫画公開！", "#創作漫画"),
            "📖 新作漫画公開！(1/3)\n\n#創作漫画"
        );
        assert_eq!(compose_batch_text(&batches[1], "ignored", "ignored"), "(2/3)");
        assert_eq!(compose_batch_text(&batches[2], "ignored", "ignored"), "(3/3)");
    }
}
