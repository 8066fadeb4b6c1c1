use crate::errors::{AppError, AppResult};
use crate::image_processor;
use reqwest::header::HeaderMap;
use reqwest::{multipart, Client, RequestBuilder};
use serde::{Deserialize, Serialize};
use std::cmp::min;
use std::path::Path;
use tokio::time::{sleep, Duration};

use super::platform::{MediaId, NewPost, PostId, SocialPlatform};

pub const DEFAULT_API_BASE: &str = "https://api.x.com";
pub const DEFAULT_STATUS_URL_BASE: &str = "https://twitter.com/i/web/status";

#[derive(Debug, Clone)]
pub struct RetryConfig {
    pub max_retries: u32,
    pub base_delay: Duration,
    pub max_delay: Duration,
    pub exponential_base: f64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            base_delay: Duration::from_millis(1000),
            max_delay: Duration::from_secs(900),
            exponential_base: 2.0,
        }
    }
}

#[derive(Debug, Serialize)]
struct CreateTweetRequest<'a> {
    text: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    media: Option<TweetMedia<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    reply: Option<TweetReply<'a>>,
}

#[derive(Debug, Serialize)]
struct TweetMedia<'a> {
    media_ids: Vec<&'a str>,
}

#[derive(Debug, Serialize)]
struct TweetReply<'a> {
    in_reply_to_tweet_id: &'a str,
}

#[derive(Debug, Deserialize)]
struct DataEnvelope<T> {
    data: T,
}

#[derive(Debug, Deserialize)]
struct IdData {
    id: String,
}

/// X API v2 client authenticated with an OAuth 2.0 user access token
pub struct XClient {
    client: Client,
    access_token: String,
    api_base: String,
    status_url_base: String,
    retry_config: RetryConfig,
}

impl XClient {
    pub fn new(access_token: &str) -> AppResult<Self> {
        Ok(Self {
            client: Client::builder().timeout(Duration::from_secs(120)).build()?,
            access_token: access_token.to_string(),
            api_base: DEFAULT_API_BASE.to_string(),
            status_url_base: DEFAULT_STATUS_URL_BASE.to_string(),
            retry_config: RetryConfig::default(),
        })
    }

    pub fn with_api_base(mut self, api_base: &str) -> Self {
        self.api_base = api_base.trim_end_matches('/').to_string();
        self
    }

    pub fn with_retry_config(mut self, retry_config: RetryConfig) -> Self {
        self.retry_config = retry_config;
        self
    }

    /// Sends the request built by `build`, retrying rate limits and server
    /// errors. `build` runs once per attempt since multipart bodies are
    /// consumed by sending.
    async fn send_with_retry<F>(&self, endpoint: &str, build: F) -> AppResult<String>
    where
        F: Fn() -> AppResult<RequestBuilder>,
    {
        let mut attempt = 0;

        loop {
            let response = build()?.bearer_auth(&self.access_token).send().await?;
            let status = response.status();

            if status.is_success() {
                let response_text = response.text().await?;
                log::debug!(
                    "X response from {} (first 300 chars): {}",
                    endpoint,
                    &response_text[..response_text
                        .char_indices()
                        .nth(300)
                        .map_or(response_text.len(), |(i, _)| i)]
                );
                return Ok(response_text);
            }

            let reset_delay = self.extract_rate_limit_reset(response.headers());
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            let error = AppError::Api {
                status: status.as_u16(),
                message: error_text,
            };

            attempt += 1;
            if error.is_retryable() && attempt <= self.retry_config.max_retries {
                let delay = if status.as_u16() == 429 {
                    reset_delay.unwrap_or_else(|| self.calculate_backoff_delay(attempt))
                } else {
                    self.calculate_backoff_delay(attempt)
                };

                log::warn!(
                    "Request to {} failed (attempt {}), retrying in {:?}: {}",
                    endpoint,
                    attempt,
                    delay,
                    error
                );
                sleep(delay).await;
                continue;
            }

            return Err(error);
        }
    }

    fn calculate_backoff_delay(&self, attempt: u32) -> Duration {
        let delay_ms = self.retry_config.base_delay.as_millis() as f64
            * self.retry_config.exponential_base.powi(attempt as i32 - 1);

        let delay = Duration::from_millis(delay_ms as u64);
        min(delay, self.retry_config.max_delay)
    }

    /// `x-rate-limit-reset` is the epoch second at which the window reopens
    fn extract_rate_limit_reset(&self, headers: &HeaderMap) -> Option<Duration> {
        let reset_at = headers
            .get("x-rate-limit-reset")?
            .to_str()
            .ok()?
            .trim()
            .parse::<i64>()
            .ok()?;
        let wait_secs = (reset_at - chrono::Utc::now().timestamp()).max(1) as u64;
        Some(min(Duration::from_secs(wait_secs), self.retry_config.max_delay))
    }
}

impl SocialPlatform for XClient {
    async fn upload_media(&self, path: &Path) -> AppResult<MediaId> {
        let page = image_processor::read_page(path).await?;
        let url = format!("{}/2/media/upload", self.api_base);

        let response_text = self
            .send_with_retry("media/upload", || {
                let part = multipart::Part::bytes(page.bytes.clone())
                    .file_name(page.file_name.clone())
                    .mime_str(page.mime_type)?;
                let form = multipart::Form::new()
                    .text("media_category", "tweet_image")
                    .part("media", part);
                Ok(self.client.post(&url).multipart(form))
            })
            .await
            .map_err(|e| AppError::upload_failed(&path.to_string_lossy(), e))?;

        let media_id = extract_id(&response_text)
            .ok_or_else(|| AppError::upload_failed(&path.to_string_lossy(), "response has no media id"))?;
        Ok(MediaId(media_id))
    }

    async fn create_post(&self, post: &NewPost) -> AppResult<PostId> {
        let url = format!("{}/2/tweets", self.api_base);
        let body = CreateTweetRequest {
            text: &post.text,
            media: (!post.media_ids.is_empty()).then(|| TweetMedia {
                media_ids: post.media_ids.iter().map(|m| m.0.as_str()).collect(),
            }),
            reply: post.reply_to.as_ref().map(|id| TweetReply {
                in_reply_to_tweet_id: &id.0,
            }),
        };

        let response_text = self
            .send_with_retry("tweets", || Ok(self.client.post(&url).json(&body)))
            .await?;

        extract_id(&response_text).map(PostId).ok_or_else(|| AppError::Api {
            status: 200,
            message: "response has no post id".to_string(),
        })
    }

    fn post_url(&self, id: &PostId) -> String {
        format!("{}/{}", self.status_url_base, id)
    }
}

/// Pulls `data.id` out of a v2 response. Falls back to the v1.1
/// `media_id_string` shape.
pub fn extract_id(response_data: &str) -> Option<String> {
    if let Ok(envelope) = serde_json::from_str::<DataEnvelope<IdData>>(response_data) {
        return Some(envelope.data.id);
    }

    match serde_json::from_str::<serde_json::Value>(response_data) {
        Ok(json) => {
            if let Some(id) = json.get("media_id_string").and_then(|v| v.as_str()) {
                return Some(id.to_string());
            }
            log::error!("No id found in X response: {}", response_data);
        }
        Err(e) => {
            log::error!("Failed to parse X response as JSON: {}", e);
        }
    }
    None
}
