use clap::Parser;
use std::process::ExitCode;

use manga_thread_poster::auth::{self, TokenManager};
use manga_thread_poster::commands::{post_random_work, RunReport};
use manga_thread_poster::config::{self, Settings};
use manga_thread_poster::errors::AppResult;
use manga_thread_poster::uploader::{DryRunPlatform, XClient};
use manga_thread_poster::{logging, single_instance};

async fn run(settings: &Settings) -> AppResult<RunReport> {
    config::validate_settings(settings)?;

    let lock = single_instance::RunLock::acquire(&settings.lock_file())?;
    single_instance::register_cleanup_handler(lock.path().to_path_buf());

    let mut rng = rand::thread_rng();

    if settings.dry_run {
        log::info!("Dry run: nothing will be posted");
        post_random_work(settings, &DryRunPlatform::new(), &mut rng).await
    } else {
        let tokens = TokenManager::new(auth::load_credentials()?, &settings.token_file)?;
        let client = XClient::new(&tokens.access_token().await?)?;
        post_random_work(settings, &client, &mut rng).await
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    // A .env file is optional; real deployments inject the variables
    let _ = dotenvy::dotenv();
    let settings = Settings::parse();

    logging::init_logging(&settings.log_file, &settings.log_level);

    log::info!("{}", "=".repeat(50));
    log::info!("Starting manga-thread-poster v{}", env!("CARGO_PKG_VERSION"));
    log::info!("{}", "=".repeat(50));

    match run(&settings).await {
        Ok(report) => {
            if !report.tail_posted {
                log::warn!("Final promotional post was not published");
            }
            if !report.history_saved {
                log::warn!("History was not saved for this run");
            }
            log::info!(
                "✅ Posted '{}' in {} posts: {}",
                report.work_name,
                report.post_ids.len(),
                report.first_post_url
            );
            ExitCode::SUCCESS
        }
        Err(e) => {
            if e.is_configuration() {
                log::error!("❌ Configuration error: {}", e);
            } else {
                log::error!("❌ Run failed: {}", e);
            }
            ExitCode::FAILURE
        }
    }
}
