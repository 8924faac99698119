use crate::scrapers::types::Snapshot;
use anyhow::Result;
use async_trait::async_trait;

/// Common trait for listing sources
#[async_trait]
pub trait ScraperTrait: Send + Sync {
    /// Walk the source and collect every listing currently on offer
    async fn scrape(&self) -> Result<Snapshot>;

    /// Get the name of the scraper source
    fn source_name(&self) -> &'static str;
}
