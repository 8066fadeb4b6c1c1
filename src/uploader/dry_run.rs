use std::cell::Cell;
use std::path::Path;

use crate::errors::AppResult;
use crate::image_processor;

use super::platform::{MediaId, NewPost, PostId, SocialPlatform};

/// Stands in for X on `--dry-run`: pages are still read from disk, nothing
/// leaves the machine.
#[derive(Debug, Default)]
pub struct DryRunPlatform {
    next_id: Cell<u64>,
}

impl DryRunPlatform {
    pub fn new() -> Self {
        Self::default()
    }

    fn next(&self, prefix: &str) -> String {
        let id = self.next_id.get() + 1;
        self.next_id.set(id);
        format!("{}-{}", prefix, id)
    }
}

impl SocialPlatform for DryRunPlatform {
    async fn upload_media(&self, path: &Path) -> AppResult<MediaId> {
        let page = image_processor::read_page(path).await?;
        let id = self.next("dry-media");
        log::info!(
            "[dry-run] would upload {} ({}, {} bytes) as {}",
            page.file_name,
            page.mime_type,
            page.bytes.len(),
            id
        );
        Ok(MediaId(id))
    }

    async fn create_post(&self, post: &NewPost) -> AppResult<PostId> {
        let id = self.next("dry-post");
        log::info!(
            "[dry-run] would post {} (media: {}, reply to: {}):\n{}",
            id,
            post.media_ids.len(),
            post.reply_to.as_ref().map_or("none".to_string(), |p| p.to_string()),
            post.text
        );
        Ok(PostId(id))
    }

    fn post_url(&self, id: &PostId) -> String {
        format!("dry-run://status/{}", id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_dry_run_hands_out_distinct_ids() {
        let dir = tempfile::tempdir().unwrap();
        let page = dir.path().join("page_01.png");
        image::RgbImage::new(1, 1).save(&page).unwrap();

        let platform = DryRunPlatform::new();
        let media = platform.upload_media(&page).await.unwrap();
        let post = platform
            .create_post(&NewPost {
                text: "(1/1)".to_string(),
                media_ids: vec![media.clone()],
                reply_to: None,
            })
            .await
            .unwrap();

        assert_eq!(media, MediaId("dry-media-1".to_string()));
        assert_eq!(post, PostId("dry-post-2".to_string()));
        assert_eq!(platform.post_url(&post), "dry-run://status/dry-post-2");
    }

    #[tokio::test]
    async fn test_dry_run_still_reads_pages() {
        let platform = DryRunPlatform::new();
        assert!(platform.upload_media(Path::new("missing.png")).await.is_err());
    }
}
