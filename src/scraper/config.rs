//! # Scraper Configuration Module
//!
//! Options for a page scrape: which tags to collect, whether and how images are
//! inspected, and the network policy used for every request. Uses a builder
//! pattern for flexible configuration.
//!
//! ## Key Components
//!
//! - `FetchConfig`: User agent, timeouts and redirect limit for HTTP requests
//! - `ScraperConfig`: The main configuration struct with scrape parameters
//! - `ScraperConfigBuilder`: Builder pattern implementation for easier configuration

use std::path::PathBuf;
use std::time::Duration;

/// User agent sent with every request. Some origins reject agents they do not
/// recognise, so this mimics an old browser build.
pub const DEFAULT_USER_AGENT: &str = "Gecko/20050511 Firefox/1.0.4";

/// Images narrower than this are dropped from results
pub const DEFAULT_MIN_WIDTH: u32 = 5;

/// Images shorter than this are dropped from results
pub const DEFAULT_MIN_HEIGHT: u32 = 5;

/// Network policy shared by page and image requests
#[derive(Debug, Clone)]
pub struct FetchConfig {
    /// User agent to use for requests
    pub user_agent: String,

    /// Connection timeout in seconds
    pub connect_timeout_secs: u64,

    /// Total request timeout in seconds
    pub timeout_secs: u64,

    /// Maximum number of redirects to follow
    pub max_redirects: usize,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            user_agent: DEFAULT_USER_AGENT.to_string(),
            connect_timeout_secs: 10,
            timeout_secs: 45,
            max_redirects: 5,
        }
    }
}

impl FetchConfig {
    /// Get the connection timeout as a Duration
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }

    /// Get the total timeout as a Duration
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Configuration for the scraper
#[derive(Debug, Clone)]
pub struct ScraperConfig {
    /// Network policy
    pub fetch: FetchConfig,

    /// Measure inspected images from a temp file instead of in memory
    pub save_temp_image: bool,

    /// Directory for temp image files, created on demand
    pub temp_image_dir: PathBuf,

    /// Only report `og:` meta tags (no generic tags, images or title)
    pub scrape_open_graph_only: bool,

    /// Download every image to measure its real size and type
    pub deep_image_inspection: bool,

    /// Minimum image width to be included in results
    pub min_width: u32,

    /// Minimum image height to be included in results
    pub min_height: u32,

    /// Maximum number of image inspections in flight for one page
    pub image_concurrency: usize,

    /// Maximum number of pages scraped at once in batch mode
    pub batch_concurrency: usize,
}

impl Default for ScraperConfig {
    fn default() -> Self {
        Self {
            fetch: FetchConfig::default(),
            save_temp_image: false,
            temp_image_dir: PathBuf::from("./tmp"),
            scrape_open_graph_only: false,
            deep_image_inspection: false,
            min_width: DEFAULT_MIN_WIDTH,
            min_height: DEFAULT_MIN_HEIGHT,
            image_concurrency: 4,
            batch_concurrency: 1,
        }
    }
}

/// Builder for ScraperConfig
#[derive(Debug, Default)]
pub struct ScraperConfigBuilder {
    config: ScraperConfig,
}

impl ScraperConfigBuilder {
    /// Create a new builder with default configuration
    pub fn new() -> Self {
        Self {
            config: ScraperConfig::default(),
        }
    }

    /// Set the user agent to use for requests
    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.config.fetch.user_agent = user_agent.into();
        self
    }

    /// Set the connection timeout in seconds
    pub fn connect_timeout_secs(mut self, secs: u64) -> Self {
        self.config.fetch.connect_timeout_secs = secs;
        self
    }

    /// Set the total request timeout in seconds
    pub fn timeout_secs(mut self, secs: u64) -> Self {
        self.config.fetch.timeout_secs = secs;
        self
    }

    /// Set the maximum number of redirects to follow
    pub fn max_redirects(mut self, max_redirects: usize) -> Self {
        self.config.fetch.max_redirects = max_redirects;
        self
    }

    /// Set whether inspected images are measured from a temp file
    pub fn save_temp_image(mut self, save_temp_image: bool) -> Self {
        self.config.save_temp_image = save_temp_image;
        self
    }

    /// Set the directory used for temp image files
    pub fn temp_image_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.temp_image_dir = dir.into();
        self
    }

    /// Set whether only `og:` tags are reported
    pub fn scrape_open_graph_only(mut self, og_only: bool) -> Self {
        self.config.scrape_open_graph_only = og_only;
        self
    }

    /// Set whether images are downloaded and measured
    pub fn deep_image_inspection(mut self, deep: bool) -> Self {
        self.config.deep_image_inspection = deep;
        self
    }

    /// Set the minimum image width and height
    pub fn min_image_size(mut self, min_width: u32, min_height: u32) -> Self {
        self.config.min_width = min_width;
        self.config.min_height = min_height;
        self
    }

    /// Set the number of concurrent image inspections per page
    pub fn image_concurrency(mut self, image_concurrency: usize) -> Self {
        self.config.image_concurrency = image_concurrency;
        self
    }

    /// Set the number of pages scraped at once in batch mode
    pub fn batch_concurrency(mut self, batch_concurrency: usize) -> Self {
        self.config.batch_concurrency = batch_concurrency;
        self
    }

    /// Build the configuration
    pub fn build(self) -> ScraperConfig {
        self.config
    }
}

impl ScraperConfig {
    /// Create a new builder
    pub fn builder() -> ScraperConfigBuilder {
        ScraperConfigBuilder::new()
    }

    /// Check the configuration for values that can never work.
    ///
    /// Zero concurrency would deadlock the semaphores and a zero total timeout
    /// fails every request, so both are rejected up front.
    pub fn validate(&self) -> Result<(), String> {
        if self.image_concurrency == 0 {
            return Err("image_concurrency must be at least 1".to_string());
        }
        if self.batch_concurrency == 0 {
            return Err("batch_concurrency must be at least 1".to_string());
        }
        if self.fetch.timeout_secs == 0 {
            return Err("timeout_secs must be at least 1".to_string());
        }
        Ok(())
    }
}
