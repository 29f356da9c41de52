//! Error types for the scraper module

use std::path::PathBuf;
use thiserror::Error;

/// A non-fatal problem met while scraping one page.
///
/// Scrape errors are collected in order next to the result rather than
/// returned; only the initial page fetch cuts a scrape short.
#[derive(Debug, Error)]
pub enum ScrapeError {
    /// DNS, connect, TLS or timeout failure
    #[error("Scraping {url} failed: {source}")]
    Transport {
        /// URL that was requested
        url: String,
        /// Underlying client error
        source: reqwest::Error,
    },

    /// The server answered with something other than 200
    #[error("{url} returned HTTP response: {status}")]
    HttpStatus {
        /// URL that was requested
        url: String,
        /// HTTP status code
        status: u16,
    },

    /// The temporary image directory could not be created
    #[error("Unable to save temp images to {}.", path.display())]
    DirectoryCreate {
        /// Directory that could not be created
        path: PathBuf,
        /// Underlying I/O error
        source: std::io::Error,
    },

    /// The downloaded image could not be written to its temp file
    #[error("Unable to write temp image for {url}: {source}")]
    TempFile {
        /// Image URL
        url: String,
        /// Underlying I/O error
        source: std::io::Error,
    },

    /// The downloaded bytes are not an image we can decode
    #[error("Unable to decode image {url}: {source}")]
    Decode {
        /// Image URL
        url: String,
        /// Underlying decoder error
        source: image::ImageError,
    },

    /// The image decoded but its dimensions could not be read
    #[error("Unable to measure image {url}: {reason}")]
    Measurement {
        /// Image URL
        url: String,
        /// What went wrong
        reason: String,
    },

    /// The page URL could not be parsed
    #[error("Invalid URL {url}: {source}")]
    InvalidUrl {
        /// The rejected URL
        url: String,
        /// Parser error
        source: url::ParseError,
    },
}
