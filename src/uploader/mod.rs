// Uploader module - turns a work into a reply-chained thread
//
// platform: the seam to the social network, x_client: the real one,
// dry_run: a stand-in, thread_batches + thread_publisher: the posting loop

pub mod dry_run;
pub mod platform;
pub mod thread_batches;
pub mod thread_publisher;
pub mod x_client;

pub use dry_run::DryRunPlatform;
pub use platform::{MediaId, NewPost, PostId, SocialPlatform};
pub use thread_publisher::{publish_thread, PublishResult, PublishedThread, TailOutcome, ThreadOptions};
pub use x_client::XClient;
