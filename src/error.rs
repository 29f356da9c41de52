//! Error types for the metascrape crate

use thiserror::Error;

/// Result type for metascrape operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for fatal metascrape failures.
///
/// Recoverable problems met while scraping a page (a failed fetch, an image
/// that does not decode) are never returned through this type; they are
/// collected as [`ScrapeError`](crate::scraper::ScrapeError) entries instead.
#[derive(Debug, Error)]
pub enum Error {
    /// HTTP client error
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Invalid scraper configuration
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}
