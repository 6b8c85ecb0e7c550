mod application;
mod core;
mod infrastructure;
mod interfaces;

use std::path::Path;

use anyhow::Result;
use clap::Parser;
use log::{error, info};
use tokio_util::sync::CancellationToken;

use crate::application::config::AppConfig;
use crate::application::pipeline::NotificationPipeline;
use crate::core::detection::ChangeDetector;
use crate::core::species::{CooldownTracker, IgnoreList};
use crate::infrastructure::notifier::HttpNotifier;
use crate::infrastructure::store::SqliteDetectionStore;
use crate::interfaces::cli::{Cli, Commands};
use crate::interfaces::doctor;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config_path = cli.config.clone();

    match cli.command.unwrap_or(Commands::Run { post_url: None }) {
        Commands::Run { post_url } => run_service(&config_path, post_url).await,
        Commands::CheckDb { path } => {
            let database_path = match path {
                Some(path) => path,
                None => AppConfig::load_or_create(&config_path)?.database_file(),
            };
            doctor::check_database(&database_path)
        }
        Commands::CheckConfig => doctor::check_config(&config_path),
    }
}

async fn run_service(config_path: &Path, post_url_arg: Option<String>) -> Result<()> {
    let mut config = AppConfig::load_or_create(config_path)?;

    env_logger::Builder::from_default_env()
        .filter_level(config.level_filter()?)
        .init();

    // One-shot seeding: a URL on the command line only fills an empty config.
    if let Some(post_url) = post_url_arg {
        if config.post_url.is_empty() {
            config.post_url = post_url;
            match config.save(config_path) {
                Ok(()) => info!("Updated config with post_url: {}", config.post_url),
                Err(e) => error!("Error saving config: {}", e),
            }
        }
    }

    if config.post_url.is_empty() {
        anyhow::bail!(
            "no post_url configured; set it in {} or pass it as an argument",
            config_path.display()
        );
    }

    let database_path = config.database_file();
    if !database_path.exists() {
        anyhow::bail!("detection database not found at {}", database_path.display());
    }

    info!("Starting BirdNET notification service");
    info!("Database: {}", database_path.display());
    info!("Post URL: {}", config.post_url);
    info!("Poll interval: {} seconds", config.poll_interval);
    info!("Cooldown: {} minutes", config.cooldown_minutes);

    let ignore_list = IgnoreList::load(&config_path.with_file_name("ignore_species.txt"));
    let gate = CooldownTracker::new(
        ignore_list,
        chrono::Duration::minutes(config.cooldown_minutes as i64),
    );
    let store = SqliteDetectionStore::new(&database_path);
    let detector = ChangeDetector::init(Box::new(store)).await;
    let notifier = HttpNotifier::new(config.post_url.clone())?;

    let mut pipeline = NotificationPipeline::new(
        detector,
        gate,
        Box::new(notifier),
        config.max_species,
        std::time::Duration::from_secs(config.poll_interval),
    );

    let cancel = CancellationToken::new();
    let signal_token = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Received interrupt signal, shutting down...");
            signal_token.cancel();
        }
    });

    pipeline.run(cancel).await;
    Ok(())
}
