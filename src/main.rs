use std::path::Path;
use std::time::Duration;

use anyhow::Result;
use tokio_cron_scheduler::{Job, JobScheduler};
use tracing::info;

mod auth;
mod catalog;
mod config;
mod content;
mod credentials;
mod error;
mod governor;
mod images;
mod lister;
mod models;
mod retry;
mod spreadsheet;
mod submitters;
mod traits;

use auth::TokenRefresher;
use catalog::CatalogClient;
use config::Config;
use content::ContentClient;
use credentials::CredentialStore;
use governor::{MAX_GATE_WAIT, RateLimitGovernor};
use images::ImageFetcher;
use lister::ListingBot;
use submitters::console::ConsoleSubmitter;

const IMAGE_WORKDIR: &str = "img";
const REFRESH_PERIOD: Duration = Duration::from_secs(40 * 60);

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt::init();

    info!("Starting bulk listing bot");

    // Configuration and spreadsheet shape problems are fatal before any
    // network work begins.
    let config = Config::from_env()?;
    images::prepare_workdir(Path::new(IMAGE_WORKDIR))?;
    let rows = spreadsheet::load_rows(&config.spreadsheet)?;

    if rows.is_empty() {
        info!("No products to register");
        return Ok(());
    }

    let store = CredentialStore::new();
    let refresher = TokenRefresher::new(config.auth.clone(), store.clone());

    // Obtain a token immediately, then keep it fresh in the background
    refresher.refresh().await;

    let sched = JobScheduler::new().await?;

    let job_refresher = refresher.clone();
    sched
        .add(Job::new_repeated_async(REFRESH_PERIOD, move |_uuid, _l| {
            let refresher = job_refresher.clone();
            Box::pin(async move {
                refresher.refresh().await;
            })
        })?)
        .await?;

    info!("Token refresh scheduled every 40 minutes");
    sched.start().await?;

    let governor = RateLimitGovernor::new(MAX_GATE_WAIT);
    let bot = ListingBot::new(
        CatalogClient::new(store.clone()),
        ContentClient::new(&config.content, governor),
        ImageFetcher::new(IMAGE_WORKDIR),
        config.step_interval,
    );

    let submitter = ConsoleSubmitter::new(config.login_email.clone());
    bot.run_batch(&rows, &submitter).await?;

    info!("Batch complete");
    Ok(())
}
