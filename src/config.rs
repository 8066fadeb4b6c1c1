use clap::Parser;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::errors::{AppError, AppResult};
use crate::security::InputValidator;

pub const DEFAULT_TWEET_PATTERN: &str = "📖 新作漫画公開！";
pub const DEFAULT_HASHTAGS: &str = "#創作漫画 #オリジナル漫画";
pub const DEFAULT_SHOP_URL: &str = "https://example.com";
pub const DEFAULT_FINAL_TEXT: &str =
    "💖 続きは通販で読めます！\n📕 {shop_url}\n\n#同人誌 #通販 #オリジナル";

/// Runtime settings, taken from flags with environment fallbacks
#[derive(Debug, Clone, Parser)]
#[command(name = "manga-thread-poster", version, about)]
pub struct Settings {
    /// Directory holding one subdirectory per work
    #[arg(long, env = "MANGA_ROOT", default_value = "manga")]
    pub root_dir: PathBuf,

    /// Per-work text settings (optional)
    #[arg(long, env = "MANGA_CONFIG", default_value = "manga_config.json")]
    pub config_file: PathBuf,

    #[arg(long, env = "POST_HISTORY", default_value = "post_history.json")]
    pub history_file: PathBuf,

    /// Pages attached to each post
    #[arg(long, env = "BATCH_SIZE", default_value_t = 2)]
    pub batch_size: usize,

    /// Pause between batch posts
    #[arg(long, env = "POST_DELAY_SECS", default_value_t = 3)]
    pub post_delay_secs: u64,

    /// OAuth 2.0 tokens, rewritten whenever X rotates the refresh token
    #[arg(long, env = "X_TOKEN_FILE", default_value = "x_token.json")]
    pub token_file: PathBuf,

    #[arg(long, env = "BOT_LOG_FILE", default_value = "bot.log")]
    pub log_file: PathBuf,

    #[arg(long, env = "BOT_LOG_LEVEL", default_value = "info")]
    pub log_level: String,

    /// Post this work instead of a random one
    #[arg(long)]
    pub work: Option<String>,

    /// Walk through the whole run without contacting X
    #[arg(long)]
    pub dry_run: bool,
}

impl Settings {
    pub fn post_delay(&self) -> Duration {
        Duration::from_secs(self.post_delay_secs)
    }

    pub fn lock_file(&self) -> PathBuf {
        let mut name = self
            .history_file
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_else(|| "post_history.json".into());
        name.push(".lock");
        self.history_file.with_file_name(name)
    }
}

pub fn validate_settings(settings: &Settings) -> AppResult<()> {
    InputValidator::validate_batch_size(settings.batch_size)?;

    if settings.post_delay_secs > 300 {
        return Err(AppError::validation(
            "post_delay_secs",
            "Must be 300 seconds or fewer",
        ));
    }

    let valid_log_levels = ["error", "warn", "info", "debug", "trace"];
    if !valid_log_levels.contains(&settings.log_level.as_str()) {
        return Err(AppError::validation("log_level", "Must be a valid log level"));
    }

    if let Some(work) = &settings.work {
        if work.trim().is_empty() {
            return Err(AppError::validation("work", "Work name cannot be empty"));
        }
    }

    Ok(())
}

/// Result of reading an optional JSON file
#[derive(Debug, Clone, PartialEq)]
pub enum LoadOutcome<T> {
    Found(T),
    NotFound,
    ParseError(String),
}

pub fn load_json_file<T: DeserializeOwned>(path: &Path) -> LoadOutcome<T> {
    let content = match fs::read_to_string(path) {
        Ok(text) => text,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return LoadOutcome::NotFound,
        Err(e) => return LoadOutcome::ParseError(format!("read failed: {}", e)),
    };

    match serde_json::from_str(&content) {
        Ok(value) => LoadOutcome::Found(value),
        Err(e) => LoadOutcome::ParseError(e.to_string()),
    }
}

/// Writes `value` as pretty JSON through a temp file renamed over `path`,
/// so readers never see a half-written file.
pub fn save_json_file<T: Serialize + ?Sized>(path: &Path, value: &T) -> AppResult<()> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    fs::create_dir_all(dir)?;

    let content = serde_json::to_string_pretty(value)?;

    let mut temp = tempfile::NamedTempFile::new_in(dir)?;
    temp.write_all(content.as_bytes())?;
    temp.write_all(b"\n")?;
    temp.as_file().sync_all()?;
    temp.persist(path).map_err(|e| AppError::Io(e.error))?;
    Ok(())
}

/// Text settings for one work. Missing fields take the default record's value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkConfig {
    pub title: String,
    pub tweet_patterns: Vec<String>,
    pub hashtag_patterns: Vec<String>,
    pub shop_url: String,
    pub final_text: String,
}

impl Default for WorkConfig {
    fn default() -> Self {
        Self {
            title: String::new(),
            tweet_patterns: vec![DEFAULT_TWEET_PATTERN.to_string()],
            hashtag_patterns: vec![DEFAULT_HASHTAGS.to_string()],
            shop_url: DEFAULT_SHOP_URL.to_string(),
            final_text: DEFAULT_FINAL_TEXT.to_string(),
        }
    }
}

impl WorkConfig {
    pub fn default_for(work_name: &str) -> Self {
        Self {
            title: work_name.to_string(),
            ..Self::default()
        }
    }

    pub fn final_message(&self) -> String {
        self.final_text.replace("{shop_url}", &self.shop_url)
    }
}

pub type WorkConfigs = BTreeMap<String, WorkConfig>;

pub fn load_work_configs(path: &Path) -> LoadOutcome<WorkConfigs> {
    load_json_file(path)
}

/// Returns the work's own entry, or the default record when it has none
pub fn resolve_work_config(work_name: &str, configs: &WorkConfigs) -> WorkConfig {
    match configs.get(work_name) {
        Some(config) => {
            if let Err(e) = validate_work_config(config) {
                log::warn!("Config for '{}' looks wrong: {}", work_name, e);
            }
            config.clone()
        }
        None => {
            log::warn!("No config entry for '{}', using defaults", work_name);
            WorkConfig::default_for(work_name)
        }
    }
}

pub fn validate_work_config(config: &WorkConfig) -> AppResult<()> {
    InputValidator::validate_shop_url(&config.shop_url)?;
    InputValidator::validate_final_text(&config.final_text)?;

    if config.tweet_patterns.is_empty() {
        return Err(AppError::validation("tweet_patterns", "Must not be empty"));
    }
    if config.hashtag_patterns.is_empty() {
        return Err(AppError::validation("hashtag_patterns", "Must not be empty"));
    }

    Ok(())
}
