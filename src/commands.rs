use rand::Rng;

use crate::config::{self, LoadOutcome, Settings, WorkConfigs};
use crate::errors::{AppError, AppResult};
use crate::history::{self, PostHistory};
use crate::uploader::{publish_thread, PublishResult, SocialPlatform, TailOutcome, ThreadOptions};
use crate::works;

/// What one successful run did
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunReport {
    pub work_name: String,
    pub post_ids: Vec<String>,
    pub first_post_url: String,
    pub tail_posted: bool,
    pub history_saved: bool,
}

fn load_configs(settings: &Settings) -> WorkConfigs {
    match config::load_work_configs(&settings.config_file) {
        LoadOutcome::Found(configs) => {
            log::info!(
                "Loaded config for {} works from {}",
                configs.len(),
                settings.config_file.display()
            );
            configs
        }
        LoadOutcome::NotFound => {
            log::info!(
                "No config file at {}, every work uses defaults",
                settings.config_file.display()
            );
            WorkConfigs::new()
        }
        LoadOutcome::ParseError(e) => {
            log::warn!(
                "Failed to parse config file {}: {}. Using defaults.",
                settings.config_file.display(),
                e
            );
            WorkConfigs::new()
        }
    }
}

fn load_post_history(settings: &Settings) -> PostHistory {
    match history::load_history(&settings.history_file) {
        LoadOutcome::Found(history) => {
            log::info!("Loaded history for {} works", history.work_count());
            history
        }
        LoadOutcome::NotFound => {
            log::info!(
                "No history at {}, starting fresh",
                settings.history_file.display()
            );
            PostHistory::new()
        }
        LoadOutcome::ParseError(e) => {
            log::warn!(
                "Failed to parse history file {}: {}. Starting fresh.",
                settings.history_file.display(),
                e
            );
            PostHistory::new()
        }
    }
}

/// One full run: pick a work, post it as a thread, record it in the history.
pub async fn post_random_work<P, R>(settings: &Settings, platform: &P, rng: &mut R) -> AppResult<RunReport>
where
    P: SocialPlatform,
    R: Rng + ?Sized,
{
    let configs = load_configs(settings);
    let mut post_history = load_post_history(settings);

    let discovered = works::discover_works(&settings.root_dir)?;
    if discovered.is_empty() {
        return Err(AppError::NoWorks {
            root: settings.root_dir.display().to_string(),
        });
    }

    let work = match &settings.work {
        Some(name) => works::find_work(&discovered, name)?,
        None => works::select_work(&discovered, &post_history, rng).ok_or_else(|| AppError::NoWorks {
            root: settings.root_dir.display().to_string(),
        })?,
    };
    log::info!("Selected '{}' ({} pages)", work.name, work.page_count());

    let work_config = config::resolve_work_config(&work.name, &configs);
    let options = ThreadOptions {
        batch_size: settings.batch_size,
        post_delay: settings.post_delay(),
    };

    let published = match publish_thread(platform, work, &work_config, &options, rng).await {
        PublishResult::Published(thread) => thread,
        PublishResult::Failed {
            work_name, error, ..
        } => {
            return Err(AppError::PublishFailed {
                work: work_name,
                reason: error.to_string(),
            })
        }
    };

    post_history.record_post(&published.work_name, &history::now_timestamp(), &published.first_post_url);
    let history_saved = match history::save_history(&settings.history_file, &post_history) {
        Ok(()) => true,
        Err(e) => {
            log::error!("Failed to save history (thread is already posted): {}", e);
            false
        }
    };

    Ok(RunReport {
        work_name: published.work_name,
        post_ids: published.post_ids.into_iter().map(|id| id.0).collect(),
        first_post_url: published.first_post_url,
        tail_posted: matches!(published.tail, TailOutcome::Posted(_)),
        history_saved,
    })
}
