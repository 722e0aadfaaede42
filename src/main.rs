use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Command;
use tracing::info;

use cwscraper::aws::ClientFactory;
use cwscraper::config::{QueueSettings, ScrapeConfig};
use cwscraper::executor::Executor;
use cwscraper::utils::logging::init_logging;

#[tokio::main]
async fn main() -> Result<()> {
    init_logging();

    Command::new("cwscraper")
        .version(env!("CARGO_PKG_VERSION"))
        .about("CloudWatch metric scraper")
        .get_matches();

    let config = ScrapeConfig::from_env().context("failed to load SCRAPE_CONFIG")?;
    let queue_settings =
        QueueSettings::from_env(&config.default_region).context("failed to load queue settings")?;

    info!(
        default_region = %config.default_region,
        discovery_jobs = config.discovery_jobs.len(),
        static_jobs = config.static_jobs.len(),
        queue = %queue_settings.url,
        "configuration loaded"
    );

    let factory = Arc::new(ClientFactory::new(&config).await);
    // Resolve the queue client up front; without it there is no point
    // scraping anything.
    let queue = Arc::new(
        factory
            .queue_sender(&queue_settings)
            .await
            .context("failed to build queue client")?,
    );

    let executor = Executor::new(Arc::new(config), factory, queue);
    let results = executor.scrape_and_emit().await?;

    for ((region, role), stats) in &results {
        let scraped: usize = stats.iter().map(|s| s.count).sum();
        info!(
            region = %region,
            role = ?role,
            metrics = scraped,
            "shard complete"
        );
    }

    Ok(())
}
