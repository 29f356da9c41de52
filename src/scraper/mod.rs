//! # Page Scraper Module
//!
//! Fetches a page and extracts its metadata: OpenGraph and generic meta
//! properties, the page title, and the images it embeds with absolute URLs
//! and, optionally, measured size and type.
//!
//! ## Key Components
//!
//! - `ScraperConfig`: What to collect and the network policy for requests
//! - `Scraper`: Scrapes one URL and keeps the result and errors for inspection
//! - `BatchScraper`: Scrapes a list of URLs, each with fresh state
//! - `ScrapeResult`: Properties, images and title of one page
//! - `ScrapeError`: Non-fatal problems collected while scraping
//!
//! ## Pipeline
//!
//! URL → fetch → parse → meta extraction and image collection (with optional
//! per-image inspection) → [`ScrapeResult`]. Only a failed page fetch stops a
//! scrape early; every other failure is recorded and skipped.

mod batch;
mod config;
mod document;
mod error;
mod fetcher;
mod images;
mod inspector;
mod meta;
mod page;

pub use batch::{BatchEntry, BatchScraper};
pub use config::{
    DEFAULT_MIN_HEIGHT, DEFAULT_MIN_WIDTH, DEFAULT_USER_AGENT, FetchConfig, ScraperConfig,
    ScraperConfigBuilder,
};
pub use document::{Document, ImageTag, MetaTag};
pub use error::ScrapeError;
pub use fetcher::Fetcher;
pub use images::{BaseUrl, CollectOptions, collect_images};
pub use inspector::{ImageInfo, ImageInspector, ImageKind, MeasureStrategy, reported_type};
pub use meta::{PropertyMap, extract_properties};
pub use page::{PageScraper, ScrapeOutcome, ScrapeState, Scraper};

use serde::{Serialize, Serializer};

/// Sentinel used in results for a dimension nobody knows
pub const UNKNOWN: &str = "unknown";

/// Width or height of an image
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Dimension {
    /// A measured or declared pixel count
    Pixels(u32),
    /// Neither the tag nor inspection said anything
    Unknown,
    /// Non-numeric attribute text such as `100%`, kept as written
    Raw(String),
}

impl Dimension {
    /// Interpret a `width`/`height` attribute.
    ///
    /// Fractional values are truncated, which keeps `< minimum` comparisons
    /// exact for whole-pixel minimums. Negative values clamp to zero.
    pub fn from_attribute(value: Option<&str>) -> Self {
        let Some(value) = value.map(str::trim).filter(|v| !v.is_empty()) else {
            return Self::Unknown;
        };
        if let Ok(pixels) = value.parse::<u32>() {
            return Self::Pixels(pixels);
        }
        match value.parse::<f64>() {
            Ok(number) if number.is_finite() => Self::Pixels(number.trunc().max(0.0) as u32),
            _ => Self::Raw(value.to_string()),
        }
    }

    /// Pixel count, if known
    pub fn pixels(&self) -> Option<u32> {
        match self {
            Self::Pixels(pixels) => Some(*pixels),
            _ => None,
        }
    }

    /// Whether this is a pixel count below `minimum`. Unknown and raw values
    /// are never below anything.
    pub fn is_below(&self, minimum: u32) -> bool {
        self.pixels().is_some_and(|pixels| pixels < minimum)
    }
}

impl Serialize for Dimension {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Pixels(pixels) => serializer.serialize_u32(*pixels),
            Self::Unknown => serializer.serialize_str(UNKNOWN),
            Self::Raw(raw) => serializer.serialize_str(raw),
        }
    }
}

impl std::fmt::Display for Dimension {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Pixels(pixels) => write!(f, "{}", pixels),
            Self::Unknown => f.write_str(UNKNOWN),
            Self::Raw(raw) => f.write_str(raw),
        }
    }
}

/// An image embedded in a page
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ImageRecord {
    /// Absolute URL of the image
    pub url: String,

    /// The tag's `alt` text
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    pub width: Dimension,

    pub height: Dimension,

    /// Type claimed by the URL's extension
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reported_type: Option<String>,

    /// Type found by decoding the image
    #[serde(skip_serializing_if = "Option::is_none")]
    pub actual_type: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub mime_type: Option<String>,
}

impl ImageRecord {
    /// Whether either known dimension is below the given minimum
    pub fn is_smaller_than(&self, min_width: u32, min_height: u32) -> bool {
        self.width.is_below(min_width) || self.height.is_below(min_height)
    }
}

/// Metadata extracted from one page
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ScrapeResult {
    /// Normalized meta properties in document order
    pub properties: PropertyMap,

    /// Images in document order; `None` when images were not collected
    #[serde(skip_serializing_if = "Option::is_none")]
    pub images: Option<Vec<ImageRecord>>,

    /// Page title; `None` when the title was not collected
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
}

impl ScrapeResult {
    /// Whether nothing at all was extracted
    pub fn is_empty(&self) -> bool {
        self.properties.is_empty() && self.images.is_none() && self.title.is_none()
    }

    /// Images found, or an empty slice when none were collected
    pub fn images(&self) -> &[ImageRecord] {
        self.images.as_deref().unwrap_or_default()
    }
}
