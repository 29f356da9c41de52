//! Single page scraping
//!
//! [`PageScraper`] runs the fetch → parse → extract pipeline and holds no
//! per-page state, so one engine can scrape any number of URLs. [`Scraper`]
//! wraps it for a single URL and keeps the latest result around.

use crate::error::{Error, Result};
use crate::scraper::config::ScraperConfig;
use crate::scraper::document::{Document, ImageTag, MetaTag};
use crate::scraper::error::ScrapeError;
use crate::scraper::fetcher::Fetcher;
use crate::scraper::images::{BaseUrl, CollectOptions, collect_images};
use crate::scraper::inspector::{ImageInspector, MeasureStrategy};
use crate::scraper::meta::extract_properties;
use crate::scraper::ScrapeResult;
use std::path::PathBuf;
use tracing::{debug, info, instrument, warn};

/// Progress of a single page scrape.
///
/// An outcome only ever holds `Init`, `Done` or `Failed`. `Fetched`, `Parsed`
/// and `Extracted` are intermediate steps, reported in `debug!` events as a
/// scrape passes through them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ScrapeState {
    #[default]
    Init,
    Fetched,
    Parsed,
    Extracted,
    Done,
    /// The page could not be fetched; nothing was extracted
    Failed,
}

/// Everything one scrape produced
#[derive(Debug, Default)]
pub struct ScrapeOutcome {
    pub url: String,
    pub result: ScrapeResult,
    pub errors: Vec<ScrapeError>,
    pub state: ScrapeState,
}

impl ScrapeOutcome {
    fn failed(url: &str, error: ScrapeError) -> Self {
        Self {
            url: url.to_string(),
            result: ScrapeResult::default(),
            errors: vec![error],
            state: ScrapeState::Failed,
        }
    }

    /// Error messages in the order they were met
    pub fn error_messages(&self) -> Vec<String> {
        self.errors.iter().map(ToString::to_string).collect()
    }
}

/// What was taken from the parsed document. Owned so the (non-`Send`) DOM
/// can be dropped before any image is fetched.
struct ParsedPage {
    meta_tags: Vec<MetaTag>,
    image_tags: Vec<ImageTag>,
    title: Option<String>,
}

impl ParsedPage {
    fn parse(text: &str) -> Self {
        let document = Document::parse(text);
        Self {
            meta_tags: document.meta_tags(),
            image_tags: document.image_tags(),
            title: document.title(),
        }
    }
}

/// Stateless scraping engine shared by [`Scraper`] and
/// [`BatchScraper`](crate::scraper::BatchScraper)
#[derive(Debug, Clone)]
pub struct PageScraper {
    fetcher: Fetcher,
    config: ScraperConfig,
}

impl PageScraper {
    /// Create an engine, building the HTTP client from `config`
    pub fn new(config: ScraperConfig) -> Result<Self> {
        config.validate().map_err(Error::InvalidConfig)?;
        let fetcher = Fetcher::new(&config.fetch)?;
        Ok(Self { fetcher, config })
    }

    pub fn config(&self) -> &ScraperConfig {
        &self.config
    }

    fn inspector(&self) -> Option<ImageInspector> {
        if !self.config.deep_image_inspection {
            return None;
        }
        let strategy = if self.config.save_temp_image {
            MeasureStrategy::Disk {
                dir: self.config.temp_image_dir.clone(),
            }
        } else {
            MeasureStrategy::InMemory
        };
        Some(ImageInspector::new(self.fetcher.clone(), strategy))
    }

    fn collect_options(&self) -> CollectOptions {
        CollectOptions {
            min_width: self.config.min_width,
            min_height: self.config.min_height,
            concurrency: self.config.image_concurrency,
        }
    }

    /// Scrape one URL. Never fails: problems end up in the outcome's errors.
    #[instrument(skip(self))]
    pub async fn scrape(&self, url: &str) -> ScrapeOutcome {
        info!("Scraping {}", url);

        let base = match BaseUrl::parse(url) {
            Ok(base) => base,
            Err(source) => {
                warn!("Invalid URL {}: {}", url, source);
                return ScrapeOutcome::failed(
                    url,
                    ScrapeError::InvalidUrl {
                        url: url.to_string(),
                        source,
                    },
                );
            }
        };

        let text = match self.fetcher.fetch_text(url).await {
            Ok(text) => text,
            Err(error) => return ScrapeOutcome::failed(url, error),
        };
        debug!(state = ?ScrapeState::Fetched, bytes = text.len());

        let page = ParsedPage::parse(&text);
        debug!(
            state = ?ScrapeState::Parsed,
            meta_tags = page.meta_tags.len(),
            image_tags = page.image_tags.len()
        );

        let open_graph_only = self.config.scrape_open_graph_only;
        let properties = extract_properties(&page.meta_tags, open_graph_only);
        let mut result = ScrapeResult {
            properties,
            images: None,
            title: None,
        };
        let mut errors = Vec::new();

        if !open_graph_only {
            let inspector = self.inspector();
            let (images, image_errors) = collect_images(
                page.image_tags,
                &base,
                &self.collect_options(),
                inspector.as_ref(),
            )
            .await;
            errors.extend(image_errors);

            let title = match result.properties.get("title") {
                Some(title) => title.to_string(),
                None => page.title.unwrap_or_default(),
            };
            result.images = Some(images);
            result.title = Some(title);
        }
        debug!(state = ?ScrapeState::Extracted, properties = result.properties.len());

        info!(
            "Scraped {}: {} properties, {} images, {} errors",
            url,
            result.properties.len(),
            result.images().len(),
            errors.len()
        );

        ScrapeOutcome {
            url: url.to_string(),
            result,
            errors,
            state: ScrapeState::Done,
        }
    }
}

/// Scrapes a single URL and keeps the outcome
///
/// ```rust,no_run
/// # async fn run() -> metascrape::prelude::Result<()> {
/// let mut scraper = metascrape::Scraper::new("https://example.com/")?;
/// scraper.set_deep_image_inspection(true);
/// scraper.scrape().await;
///
/// println!("{:?}", scraper.properties().properties.get("title"));
/// for error in scraper.error_messages() {
///     eprintln!("{}", error);
/// }
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct Scraper {
    engine: PageScraper,
    outcome: ScrapeOutcome,
}

impl Scraper {
    /// Create a scraper for `url` with the default configuration
    pub fn new(url: impl Into<String>) -> Result<Self> {
        Self::with_config(url, ScraperConfig::default())
    }

    /// Create a scraper for `url` with a custom configuration
    pub fn with_config(url: impl Into<String>, config: ScraperConfig) -> Result<Self> {
        let url = url.into().trim().to_string();
        Ok(Self {
            engine: PageScraper::new(config)?,
            outcome: ScrapeOutcome {
                url,
                ..ScrapeOutcome::default()
            },
        })
    }

    /// Measure inspected images through a temp file instead of in memory
    pub fn set_save_temp_image(&mut self, save: bool) {
        self.engine.config.save_temp_image = save;
    }

    /// Directory for temp image files
    pub fn set_temp_image_dir(&mut self, dir: impl Into<PathBuf>) {
        self.engine.config.temp_image_dir = dir.into();
    }

    /// Only report `og:` tags
    pub fn set_scrape_open_graph_only(&mut self, og_only: bool) {
        self.engine.config.scrape_open_graph_only = og_only;
    }

    /// Download and measure every image
    pub fn set_deep_image_inspection(&mut self, deep: bool) {
        self.engine.config.deep_image_inspection = deep;
    }

    /// Scrape the URL, replacing any previous result and errors
    pub async fn scrape(&mut self) {
        let url = self.outcome.url.clone();
        self.outcome = self.engine.scrape(&url).await;
    }

    pub fn url(&self) -> &str {
        &self.outcome.url
    }

    /// The latest result; empty before the first scrape or after a failed fetch
    pub fn properties(&self) -> &ScrapeResult {
        &self.outcome.result
    }

    pub fn errors(&self) -> &[ScrapeError] {
        &self.outcome.errors
    }

    pub fn error_messages(&self) -> Vec<String> {
        self.outcome.error_messages()
    }

    pub fn state(&self) -> ScrapeState {
        self.outcome.state
    }

    /// Consume the scraper, returning its latest outcome
    pub fn into_outcome(self) -> ScrapeOutcome {
        self.outcome
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Server;

    const ARTICLE: &str = r#"<html>
<head>
  <title>Fallback Title</title>
  <meta property="og:title" content="Launch Day">
  <meta property="og:video:url" content="https://videos.example.com/1.mp4">
  <meta name="description" content="All about the launch">
  <meta property="og:title" content="Ignored Duplicate">
</head>
<body>
  <img src="/hero.png" alt="Hero" width="800" height="400">
  <img src="//cdn.example.com/pixel.gif" width="1" height="1">
  <img src="thumb.jpg">
</body>
</html>"#;

    async fn serve(server: &mut Server, path: &str, body: &str) -> mockito::Mock {
        server
            .mock("GET", path)
            .with_status(200)
            .with_header("content-type", "text/html; charset=utf-8")
            .with_body(body)
            .create_async()
            .await
    }

    #[tokio::test]
    async fn test_full_scrape() {
        let mut server = Server::new_async().await;
        let mock = serve(&mut server, "/news/launch.html", ARTICLE).await;

        let url = format!("{}/news/launch.html", server.url());
        let mut scraper = Scraper::new(&url).unwrap();
        scraper.scrape().await;

        assert_eq!(scraper.state(), ScrapeState::Done);
        assert!(scraper.errors().is_empty());

        let result = scraper.properties();
        assert_eq!(
            result.properties.keys().collect::<Vec<_>>(),
            vec!["title", "video_url", "description"]
        );
        assert_eq!(result.properties.get("title"), Some("Launch Day"));
        assert_eq!(result.title.as_deref(), Some("Launch Day"));

        let images = result.images();
        assert_eq!(images.len(), 2);
        assert_eq!(images[0].url, format!("{}/hero.png", server.url()));
        assert_eq!(images[0].description.as_deref(), Some("Hero"));
        assert_eq!(images[1].url, format!("{}/news/thumb.jpg", server.url()));

        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_title_falls_back_to_title_element() {
        let mut server = Server::new_async().await;
        serve(
            &mut server,
            "/",
            "<html><head><title> Plain Page </title></head><body></body></html>",
        )
        .await;

        let mut scraper = Scraper::new(format!("{}/", server.url())).unwrap();
        scraper.scrape().await;

        assert_eq!(scraper.properties().title.as_deref(), Some("Plain Page"));
        assert!(scraper.properties().images().is_empty());
    }

    #[tokio::test]
    async fn test_open_graph_only() {
        let mut server = Server::new_async().await;
        serve(
            &mut server,
            "/og",
            r#"<html><head>
                <meta property="og:type" content="video">
                <meta name="description" content="plain">
                </head><body><img src="a.png"></body></html>"#,
        )
        .await;

        let mut scraper = Scraper::new(format!("{}/og", server.url())).unwrap();
        scraper.set_scrape_open_graph_only(true);
        scraper.scrape().await;

        let result = scraper.properties();
        assert_eq!(result.properties.keys().collect::<Vec<_>>(), vec!["type"]);
        assert!(result.images.is_none());
        assert!(result.title.is_none());
    }

    #[tokio::test]
    async fn test_http_error_is_recorded_not_raised() {
        let mut server = Server::new_async().await;
        server
            .mock("GET", "/down")
            .with_status(503)
            .create_async()
            .await;

        let url = format!("{}/down", server.url());
        let mut scraper = Scraper::new(&url).unwrap();
        scraper.scrape().await;

        assert_eq!(scraper.state(), ScrapeState::Failed);
        assert!(scraper.properties().is_empty());
        assert_eq!(
            scraper.error_messages(),
            vec![format!("{} returned HTTP response: 503", url)]
        );
    }

    #[tokio::test]
    async fn test_timeout_is_recorded_not_raised() {
        let mut server = Server::new_async().await;
        server
            .mock("GET", "/slow")
            .with_status(200)
            .with_chunked_body(|w| {
                std::thread::sleep(std::time::Duration::from_secs(3));
                w.write_all(b"<html></html>")
            })
            .create_async()
            .await;

        let config = ScraperConfig::builder().timeout_secs(1).build();
        let mut scraper =
            Scraper::with_config(format!("{}/slow", server.url()), config).unwrap();
        scraper.scrape().await;

        assert_eq!(scraper.state(), ScrapeState::Failed);
        assert!(scraper.properties().is_empty());
        assert_eq!(scraper.errors().len(), 1);
        assert!(matches!(scraper.errors()[0], ScrapeError::Transport { .. }));
    }

    #[tokio::test]
    async fn test_invalid_url() {
        let mut scraper = Scraper::new("not a url").unwrap();
        scraper.scrape().await;

        assert_eq!(scraper.state(), ScrapeState::Failed);
        assert!(matches!(scraper.errors(), [ScrapeError::InvalidUrl { .. }]));
    }

    #[tokio::test]
    async fn test_rescrape_starts_fresh() {
        let mut server = Server::new_async().await;
        server
            .mock("GET", "/flaky")
            .with_status(500)
            .create_async()
            .await;

        let url = format!("{}/flaky", server.url());
        let mut scraper = Scraper::new(&url).unwrap();
        scraper.scrape().await;
        assert_eq!(scraper.errors().len(), 1);

        server.reset_async().await;
        serve(&mut server, "/flaky", ARTICLE).await;
        scraper.scrape().await;

        assert_eq!(scraper.url(), url);
        assert!(scraper.errors().is_empty());
        assert_eq!(scraper.properties().properties.get("title"), Some("Launch Day"));
    }

    #[test]
    fn test_invalid_config_is_fatal() {
        let config = ScraperConfig::builder().image_concurrency(0).build();
        let err = Scraper::with_config("https://example.com", config).unwrap_err();
        assert!(matches!(err, Error::InvalidConfig(_)));
    }
}
