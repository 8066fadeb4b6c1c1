#![allow(dead_code)]

use std::cell::RefCell;
use std::fs;
use std::path::{Path, PathBuf};

use manga_thread_poster::config::Settings;
use manga_thread_poster::errors::{AppError, AppResult};
use manga_thread_poster::uploader::{MediaId, NewPost, PostId, SocialPlatform};

/// In-memory platform that records every call and can fail on demand
#[derive(Default)]
pub struct MockPlatform {
    pub uploads: RefCell<Vec<PathBuf>>,
    pub posts: RefCell<Vec<(PostId, NewPost)>>,
    /// 1-based upload call that fails
    pub fail_upload_at: Option<usize>,
    /// 1-based post call that fails
    pub fail_post_at: Option<usize>,
}

impl MockPlatform {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing_upload(at: usize) -> Self {
        Self {
            fail_upload_at: Some(at),
            ..Self::default()
        }
    }

    pub fn failing_post(at: usize) -> Self {
        Self {
            fail_post_at: Some(at),
            ..Self::default()
        }
    }

    pub fn posts(&self) -> Vec<(PostId, NewPost)> {
        self.posts.borrow().clone()
    }
}

impl SocialPlatform for MockPlatform {
    async fn upload_media(&self, path: &Path) -> AppResult<MediaId> {
        let mut uploads = self.uploads.borrow_mut();
        uploads.push(path.to_path_buf());
        if self.fail_upload_at == Some(uploads.len()) {
            return Err(AppError::upload_failed(&path.to_string_lossy(), "mock upload failure"));
        }
        Ok(MediaId(format!("media-{}", uploads.len())))
    }

    async fn create_post(&self, post: &NewPost) -> AppResult<PostId> {
        let call = self.posts.borrow().len() + 1;
        if self.fail_post_at == Some(call) {
            // Failed calls still count so later calls keep their numbering
            self.posts
                .borrow_mut()
                .push((PostId(format!("failed-{}", call)), post.clone()));
            return Err(AppError::Api {
                status: 503,
                message: "mock post failure".to_string(),
            });
        }
        let id = PostId(format!("post-{}", call));
        self.posts.borrow_mut().push((id.clone(), post.clone()));
        Ok(id)
    }

    fn post_url(&self, id: &PostId) -> String {
        format!("https://twitter.com/i/web/status/{}", id)
    }
}

pub fn write_page(path: &Path) {
    image::RgbImage::new(2, 2).save(path).unwrap();
}

/// Creates `<root>/<name>/page_NN.png` for 1..=pages
pub fn make_work(root: &Path, name: &str, pages: usize) -> PathBuf {
    let dir = root.join(name);
    fs::create_dir_all(&dir).unwrap();
    for i in 1..=pages {
        write_page(&dir.join(format!("page_{:02}.png", i)));
    }
    dir
}

/// Settings pointing every file into `base`, with no delay between posts
pub fn test_settings(base: &Path) -> Settings {
    Settings {
        root_dir: base.join("manga"),
        config_file: base.join("manga_config.json"),
        history_file: base.join("post_history.json"),
        token_file: base.join("x_token.json"),
        batch_size: 2,
        post_delay_secs: 0,
        log_file: base.join("bot.log"),
        log_level: "debug".to_string(),
        work: None,
        dry_run: false,
    }
}

pub fn init_test_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}
