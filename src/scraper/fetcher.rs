//! HTTP fetching for pages and images
//!
//! Every request goes through one [`Fetcher`] so the page and the images it
//! references share the same user agent, timeouts and redirect policy.

use crate::error::{Error, Result};
use crate::scraper::config::FetchConfig;
use crate::scraper::error::ScrapeError;
use reqwest::header::{CONNECTION, HeaderMap, HeaderValue};
use reqwest::{Client as ReqwestClient, Response, StatusCode, redirect};
use tracing::{debug, instrument, warn};

/// HTTP client for pages and images
///
/// TLS certificates and host names are NOT verified. Many of the sites this is
/// pointed at serve broken chains, and the extracted data is not trusted
/// anyway, but it means responses can be spoofed by anyone on the path.
#[derive(Debug, Clone)]
pub struct Fetcher {
    /// The underlying reqwest client
    client: ReqwestClient,
}

impl Fetcher {
    /// Create a new fetcher from a network policy
    pub fn new(config: &FetchConfig) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(CONNECTION, HeaderValue::from_static("close"));

        let client = ReqwestClient::builder()
            .user_agent(config.user_agent.as_str())
            .default_headers(headers)
            .connect_timeout(config.connect_timeout())
            .timeout(config.timeout())
            .redirect(redirect::Policy::limited(config.max_redirects))
            .referer(true)
            .pool_max_idle_per_host(0)
            .danger_accept_invalid_certs(true)
            .danger_accept_invalid_hostnames(true)
            .build()
            .map_err(Error::Http)?;

        Ok(Self { client })
    }

    /// Fetch a page and decode it to text.
    ///
    /// The body is decoded with the charset from the response's
    /// `Content-Type`, falling back to UTF-8, so the parser always sees
    /// well-formed text.
    #[instrument(skip(self), level = "debug")]
    pub async fn fetch_text(&self, url: &str) -> std::result::Result<String, ScrapeError> {
        let response = self.send(url).await?;
        response.text().await.map_err(|source| ScrapeError::Transport {
            url: url.to_string(),
            source,
        })
    }

    /// Fetch raw bytes, used for images
    #[instrument(skip(self), level = "debug")]
    pub async fn fetch_bytes(&self, url: &str) -> std::result::Result<Vec<u8>, ScrapeError> {
        let response = self.send(url).await?;
        let bytes = response
            .bytes()
            .await
            .map_err(|source| ScrapeError::Transport {
                url: url.to_string(),
                source,
            })?;
        debug!("Fetched {} bytes from {}", bytes.len(), url);
        Ok(bytes.to_vec())
    }

    /// Send a GET request and accept only a 200 response
    async fn send(&self, url: &str) -> std::result::Result<Response, ScrapeError> {
        debug!("Sending GET request to {}", url);
        let response = self.client.get(url).send().await.map_err(|source| {
            warn!("Request to {} failed: {}", url, source);
            ScrapeError::Transport {
                url: url.to_string(),
                source,
            }
        })?;

        let status = response.status();
        if status != StatusCode::OK {
            warn!("{} returned HTTP response: {}", url, status);
            return Err(ScrapeError::HttpStatus {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        Ok(response)
    }
}
