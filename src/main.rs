mod config;
mod error;
mod history;
mod models;
mod notify;
mod pipeline;
mod scrapers;
mod storage;

use config::Config;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    info!("🏠 Listing Watch - InfoCasas new listings");
    info!("=========================================");

    let config = Config::from_env()?;
    let summary = pipeline::run(&config).await?;

    let elapsed = summary.finished_at - summary.started_at;
    info!(
        "✅ Done in {}s: {} pages, {} listings, {} new, {} in history",
        elapsed.num_seconds(),
        summary.pages,
        summary.scraped,
        summary.new,
        summary.history
    );
    info!("Slack: {} | Email: {}", summary.slack, summary.email);

    Ok(())
}
