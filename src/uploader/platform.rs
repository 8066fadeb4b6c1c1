use std::fmt;
use std::path::Path;

use crate::errors::AppResult;

/// Identifier the platform hands back for an uploaded image
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MediaId(pub String);

/// Identifier of a created post
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PostId(pub String);

impl fmt::Display for MediaId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Display for PostId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A post to create. `reply_to` links it under an earlier post.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewPost {
    pub text: String,
    pub media_ids: Vec<MediaId>,
    pub reply_to: Option<PostId>,
}

/// What the publisher needs from a social platform. Implementations own
/// authentication, transport and rate-limit backoff.
#[allow(async_fn_in_trait)]
pub trait SocialPlatform {
    async fn upload_media(&self, path: &Path) -> AppResult<MediaId>;

    async fn create_post(&self, post: &NewPost) -> AppResult<PostId>;

    /// Public link to a post
    fn post_url(&self, id: &PostId) -> String;
}
