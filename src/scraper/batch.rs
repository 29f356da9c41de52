//! Batch scraping
//!
//! Scrapes a list of URLs with one shared [`PageScraper`]. Every URL gets a
//! fresh [`ScrapeOutcome`], so errors and results never leak between pages,
//! and a failure on one URL never stops the rest.

use crate::error::Result;
use crate::scraper::ScrapeResult;
use crate::scraper::config::ScraperConfig;
use crate::scraper::error::ScrapeError;
use crate::scraper::page::{PageScraper, ScrapeOutcome};
use futures::stream::{self, StreamExt};
use tracing::{info, instrument};

/// One URL's result in a batch
#[derive(Debug)]
pub struct BatchEntry {
    pub url: String,
    pub properties: ScrapeResult,
    pub errors: Vec<ScrapeError>,
}

impl BatchEntry {
    /// Whether the page itself could not be scraped
    pub fn failed(&self) -> bool {
        self.properties.is_empty() && !self.errors.is_empty()
    }
}

impl From<ScrapeOutcome> for BatchEntry {
    fn from(outcome: ScrapeOutcome) -> Self {
        Self {
            url: outcome.url,
            properties: outcome.result,
            errors: outcome.errors,
        }
    }
}

/// Scrapes several URLs, returning results in input order
#[derive(Debug)]
pub struct BatchScraper {
    urls: Vec<String>,
    engine: PageScraper,
}

impl BatchScraper {
    /// Create a batch scraper with the default configuration
    pub fn new<I, S>(urls: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::with_config(urls, ScraperConfig::default())
    }

    /// Create a batch scraper with a custom configuration
    pub fn with_config<I, S>(urls: I, config: ScraperConfig) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Ok(Self {
            urls: urls
                .into_iter()
                .map(|url| url.into().trim().to_string())
                .collect(),
            engine: PageScraper::new(config)?,
        })
    }

    pub fn urls(&self) -> &[String] {
        &self.urls
    }

    /// Scrape every URL.
    ///
    /// With `batch_concurrency` of 1 (the default) pages are scraped strictly
    /// one after another. Higher values overlap up to that many pages; the
    /// returned entries are in input order either way.
    #[instrument(skip(self), fields(urls = self.urls.len()))]
    pub async fn scrape_all(&self) -> Vec<BatchEntry> {
        let concurrency = self.engine.config().batch_concurrency.max(1);
        info!(
            "Scraping {} URLs with concurrency {}",
            self.urls.len(),
            concurrency
        );

        let entries: Vec<BatchEntry> = stream::iter(&self.urls)
            .map(|url| self.engine.scrape(url))
            .buffered(concurrency)
            .map(BatchEntry::from)
            .collect()
            .await;

        let failed = entries.iter().filter(|entry| entry.failed()).count();
        info!("Batch finished: {} scraped, {} failed", entries.len() - failed, failed);
        entries
    }
}
