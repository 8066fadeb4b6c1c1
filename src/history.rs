//! Posting history, keyed by work name and rewritten wholesale after each
//! successful run.
//!
//! Only one run may write the file at a time; see `single_instance`.

use chrono::{Local, SecondsFormat};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use crate::config::{load_json_file, save_json_file, LoadOutcome};
use crate::errors::AppResult;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostRecord {
    pub date: String,
    pub first_tweet_url: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkHistory {
    pub post_count: usize,
    pub last_posted: String,
    pub posts: Vec<PostRecord>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PostHistory {
    works: BTreeMap<String, WorkHistory>,
}

impl PostHistory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, work_name: &str) -> Option<&WorkHistory> {
        self.works.get(work_name)
    }

    /// Number of works posted at least once
    pub fn work_count(&self) -> usize {
        self.works.len()
    }

    /// Appends one successful post for `work_name`, creating its entry if needed
    pub fn record_post(&mut self, work_name: &str, posted_at: &str, first_tweet_url: &str) {
        let entry = self.works.entry(work_name.to_string()).or_default();

        entry.posts.push(PostRecord {
            date: posted_at.to_string(),
            first_tweet_url: first_tweet_url.to_string(),
        });
        entry.post_count += 1;
        entry.last_posted = posted_at.to_string();

        if entry.post_count != entry.posts.len() {
            log::warn!(
                "History for '{}' had post_count {} but {} posts, correcting",
                work_name,
                entry.post_count,
                entry.posts.len()
            );
            entry.post_count = entry.posts.len();
        }
    }
}

pub fn now_timestamp() -> String {
    Local::now().to_rfc3339_opts(SecondsFormat::Secs, false)
}

pub fn load_history(path: &Path) -> LoadOutcome<PostHistory> {
    load_json_file(path)
}

/// Overwrites `path` with the whole history. The previous file is kept as
/// `<path>.bak` and the new content is renamed into place.
pub fn save_history(path: &Path, history: &PostHistory) -> AppResult<()> {
    if path.exists() {
        let mut backup_name = path.file_name().unwrap_or_default().to_os_string();
        backup_name.push(".bak");
        if let Err(e) = fs::copy(path, path.with_file_name(backup_name)) {
            log::warn!("Failed to create history backup: {}", e);
        }
    }

    save_json_file(path, history)?;

    log::info!("History saved to {}", path.display());
    Ok(())
}
