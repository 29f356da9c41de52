//! # metascrape - Page Metadata Extraction for Rust
//!
//! This crate fetches a web page and extracts the metadata a link preview
//! needs: OpenGraph and generic `<meta>` properties, the page title, and the
//! images the page embeds, with absolute URLs and optionally their measured
//! size and real type.
//!
//! ## Features
//!
//! - OpenGraph aware meta extraction with normalized, first-seen-wins keys
//! - Image URL resolution against the page URL
//! - Optional deep image inspection, in memory or through temp files
//! - Batch scraping with results in input order
//! - Errors collected per page instead of aborting the scrape
//! - Async API with Tokio
//!
//! ## Example
//!
//! ```rust,no_run
//! use metascrape::Scraper;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let mut scraper = Scraper::new("https://www.bbc.co.uk/news")?;
//!     scraper.set_deep_image_inspection(true);
//!     scraper.scrape().await;
//!
//!     for (key, value) in scraper.properties().properties.iter() {
//!         println!("{}: {}", key, value);
//!     }
//!     for image in scraper.properties().images() {
//!         println!("{} ({}x{})", image.url, image.width, image.height);
//!     }
//!     for error in scraper.error_messages() {
//!         eprintln!("{}", error);
//!     }
//!     Ok(())
//! }
//! ```

mod error;
pub mod scraper;

pub use error::Error;
pub use crate::scraper::{BatchEntry, BatchScraper, ScrapeError, ScrapeResult, Scraper, ScraperConfig};

/// Re-export of types module for public use
pub mod prelude {
    pub use crate::error::Error;
    pub use crate::error::Result;
}
