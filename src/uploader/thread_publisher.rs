use rand::seq::SliceRandom;
use rand::Rng;
use tokio::time::{sleep, Duration};

use crate::config::{WorkConfig, DEFAULT_HASHTAGS, DEFAULT_TWEET_PATTERN};
use crate::errors::{AppError, AppResult};
use crate::security::InputValidator;
use crate::works::Work;

use super::platform::{MediaId, NewPost, PostId, SocialPlatform};
use super::thread_batches::{compose_batch_text, plan_batches, PageBatch};

#[derive(Debug, Clone)]
pub struct ThreadOptions {
    pub batch_size: usize,
    /// Pause between batch posts
    pub post_delay: Duration,
}

impl Default for ThreadOptions {
    fn default() -> Self {
        Self {
            batch_size: 2,
            post_delay: Duration::from_secs(3),
        }
    }
}

/// Outcome of the promotional reply that closes the thread
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TailOutcome {
    Posted(PostId),
    Failed(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublishedThread {
    pub work_name: String,
    /// Batch posts in thread order, then the tail post if it went out
    pub post_ids: Vec<PostId>,
    pub first_post_url: String,
    pub tail: TailOutcome,
}

#[derive(Debug)]
pub enum PublishResult {
    Published(PublishedThread),
    /// `posted_ids` are posts that went out before the failure and stay
    /// visible; nothing is rolled back.
    Failed {
        work_name: String,
        error: AppError,
        posted_ids: Vec<PostId>,
    },
}

fn draw<'a, R: Rng + ?Sized>(candidates: &'a [String], fallback: &'a str, rng: &mut R) -> &'a str {
    candidates
        .choose(rng)
        .map(String::as_str)
        .unwrap_or(fallback)
}

/// Posts `work` as a reply chain: one post per batch of pages, then the
/// promotional tail. Batch failures abort; a tail failure does not.
pub async fn publish_thread<P, R>(
    platform: &P,
    work: &Work,
    config: &WorkConfig,
    options: &ThreadOptions,
    rng: &mut R,
) -> PublishResult
where
    P: SocialPlatform,
    R: Rng + ?Sized,
{
    let opening = draw(&config.tweet_patterns, DEFAULT_TWEET_PATTERN, rng).to_string();
    let hashtags = draw(&config.hashtag_patterns, DEFAULT_HASHTAGS, rng).to_string();

    let mut posted_ids = Vec::new();

    if let Err(error) = post_batches(
        platform,
        work,
        options,
        &opening,
        &hashtags,
        &mut posted_ids,
    )
    .await
    {
        log::error!("❌ Thread for '{}' aborted: {}", work.name, error);
        if !posted_ids.is_empty() {
            log::warn!(
                "{} posts of the partial thread remain visible: {:?}",
                posted_ids.len(),
                posted_ids.iter().map(|id| id.0.as_str()).collect::<Vec<_>>()
            );
        }
        return PublishResult::Failed {
            work_name: work.name.clone(),
            error,
            posted_ids,
        };
    }

    // Non-empty: the work has at least one page, so at least one batch posted
    let first_post_url = platform.post_url(&posted_ids[0]);
    let last_post = posted_ids[posted_ids.len() - 1].clone();

    let tail = post_tail(platform, config, last_post).await;
    if let TailOutcome::Posted(id) = &tail {
        posted_ids.push(id.clone());
    }

    log::info!("=== Thread for '{}' complete: {} ===", work.name, first_post_url);

    PublishResult::Published(PublishedThread {
        work_name: work.name.clone(),
        post_ids: posted_ids,
        first_post_url,
        tail,
    })
}

async fn post_batches<P: SocialPlatform>(
    platform: &P,
    work: &Work,
    options: &ThreadOptions,
    opening: &str,
    hashtags: &str,
    posted_ids: &mut Vec<PostId>,
) -> AppResult<()> {
    InputValidator::validate_batch_size(options.batch_size)?;

    if work.pages.is_empty() {
        return Err(AppError::validation("pages", "Work has no pages"));
    }

    // Nothing goes out unless every page can be uploaded
    for page in &work.pages {
        InputValidator::validate_image_file(page)?;
    }

    let batches = plan_batches(&work.pages, options.batch_size);

    log::info!(
        "=== Posting '{}' ({} pages in {} posts) ===",
        work.name,
        work.page_count(),
        batches.len()
    );

    for batch in &batches {
        let media_ids = upload_batch(platform, batch).await?;

        let post = NewPost {
            text: compose_batch_text(batch, opening, hashtags),
            media_ids,
            reply_to: posted_ids.last().cloned(),
        };

        let post_id = platform
            .create_post(&post)
            .await
            .map_err(|e| AppError::post_failed(batch.number(), batch.total, e))?;

        log::info!(
            "  ✓ Posted {}/{}: {}",
            batch.number(),
            batch.total,
            platform.post_url(&post_id)
        );
        posted_ids.push(post_id);

        if !batch.is_last() && !options.post_delay.is_zero() {
            sleep(options.post_delay).await;
        }
    }

    Ok(())
}

async fn upload_batch<P: SocialPlatform>(platform: &P, batch: &PageBatch) -> AppResult<Vec<MediaId>> {
    let mut media_ids = Vec::with_capacity(batch.pages.len());

    for page in &batch.pages {
        log::info!("[{}/{}] Uploading {}", batch.number(), batch.total, page.display());
        let media_id = platform.upload_media(page).await.map_err(|e| match e {
            AppError::UploadFailed { .. } => e,
            other => AppError::upload_failed(&page.to_string_lossy(), other),
        })?;
        log::debug!("  ✓ Uploaded {} as media {}", page.display(), media_id);
        media_ids.push(media_id);
    }

    Ok(media_ids)
}

async fn post_tail<P: SocialPlatform>(platform: &P, config: &WorkConfig, reply_to: PostId) -> TailOutcome {
    let post = NewPost {
        text: config.final_message(),
        media_ids: Vec::new(),
        reply_to: Some(reply_to),
    };

    match platform.create_post(&post).await {
        Ok(id) => {
            log::info!("  ✓ Final post: {}", platform.post_url(&id));
            TailOutcome::Posted(id)
        }
        Err(e) => {
            log::warn!("  ✗ Final post failed (thread itself is complete): {}", e);
            TailOutcome::Failed(e.to_string())
        }
    }
}
