//! Image collection
//!
//! Resolves every `<img>` on a page to an absolute URL, attaches its `alt`
//! text and size, and drops images too small to be content (spacers,
//! tracking pixels).

use crate::scraper::document::ImageTag;
use crate::scraper::error::ScrapeError;
use crate::scraper::inspector::{ImageInfo, ImageInspector, Inspection, reported_type};
use crate::scraper::{DEFAULT_MIN_HEIGHT, DEFAULT_MIN_WIDTH, Dimension, ImageRecord};
use futures::future;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tracing::{debug, instrument};
use url::Url;

/// The parts of a page URL needed to resolve relative image paths
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BaseUrl {
    scheme: String,
    /// Host, plus `:port` when the URL names a non-default port
    authority: String,
    /// Directory of the page path, always ending in `/`
    directory: String,
}

impl BaseUrl {
    /// Parse a page URL
    pub fn parse(url: &str) -> Result<Self, url::ParseError> {
        let parsed = Url::parse(url)?;
        let host = parsed.host_str().ok_or(url::ParseError::EmptyHost)?;
        let authority = match parsed.port() {
            Some(port) => format!("{}:{}", host, port),
            None => host.to_string(),
        };

        let path = parsed.path();
        let directory = match path.rfind('/') {
            Some(end) => path[..=end].to_string(),
            None => "/".to_string(),
        };

        Ok(Self {
            scheme: parsed.scheme().to_string(),
            authority,
            directory,
        })
    }

    pub fn scheme(&self) -> &str {
        &self.scheme
    }

    pub fn authority(&self) -> &str {
        &self.authority
    }

    pub fn directory(&self) -> &str {
        &self.directory
    }

    /// Turn an `<img src>` into an absolute URL.
    ///
    /// - `//host/a.png` takes the page's scheme
    /// - anything starting with `http`, and `data:` URIs, are used as-is
    /// - `/a.png` is resolved against the page's host
    /// - `a.png` is resolved against the page's directory
    pub fn resolve(&self, src: &str) -> String {
        let src = src.trim();

        if src.starts_with("//") {
            return format!("{}:{}", self.scheme, src);
        }
        if src.starts_with("http") || is_data_uri(src) {
            return src.to_string();
        }

        let mut absolute = format!("{}://{}", self.scheme, self.authority);
        if !src.starts_with('/') {
            absolute.push_str(&self.directory);
            if !absolute.ends_with('/') {
                absolute.push('/');
            }
        }
        absolute.push_str(src);
        absolute
    }
}

fn is_data_uri(src: &str) -> bool {
    src.get(..5)
        .is_some_and(|scheme| scheme.eq_ignore_ascii_case("data:"))
}

/// Options for collecting a page's images
#[derive(Debug, Clone)]
pub struct CollectOptions {
    /// Images narrower than this are dropped
    pub min_width: u32,

    /// Images shorter than this are dropped
    pub min_height: u32,

    /// Maximum number of image inspections in flight
    pub concurrency: usize,
}

impl Default for CollectOptions {
    fn default() -> Self {
        Self {
            min_width: DEFAULT_MIN_WIDTH,
            min_height: DEFAULT_MIN_HEIGHT,
            concurrency: 4,
        }
    }
}

/// An `<img>` with a usable `src`
struct Candidate {
    url: String,
    description: Option<String>,
    tag: ImageTag,
}

impl Candidate {
    fn from_tag(tag: ImageTag, base: &BaseUrl) -> Option<Self> {
        let src = tag.src.as_deref().map(str::trim).filter(|src| !src.is_empty())?;
        let url = base.resolve(src);
        let description = tag.alt.clone().filter(|alt| !alt.is_empty());
        Some(Self {
            url,
            description,
            tag,
        })
    }

    fn into_declared_record(self) -> ImageRecord {
        ImageRecord {
            width: Dimension::from_attribute(self.tag.width.as_deref()),
            height: Dimension::from_attribute(self.tag.height.as_deref()),
            url: self.url,
            description: self.description,
            reported_type: None,
            actual_type: None,
            mime_type: None,
        }
    }

    fn into_inspected_record(self, info: ImageInfo) -> ImageRecord {
        ImageRecord {
            mime_type: info.mime_type().map(str::to_string),
            actual_type: info.actual_type.map(|kind| kind.name().to_string()),
            reported_type: info.reported_type,
            width: info.width,
            height: info.height,
            url: self.url,
            description: self.description,
        }
    }
}

/// Collect a page's images
///
/// # Arguments
///
/// * `tags` - The page's `<img>` tags in document order
/// * `base` - The page URL, for resolving relative sources
/// * `options` - Size limits and inspection concurrency
/// * `inspector` - When given, every image is downloaded and measured instead
///   of trusting its `width`/`height` attributes
///
/// # Returns
///
/// The kept images in document order, and the errors met while inspecting
/// them, also in document order.
#[instrument(skip_all, fields(images = tags.len(), deep = inspector.is_some()))]
pub async fn collect_images(
    tags: Vec<ImageTag>,
    base: &BaseUrl,
    options: &CollectOptions,
    inspector: Option<&ImageInspector>,
) -> (Vec<ImageRecord>, Vec<ScrapeError>) {
    let candidates: Vec<Candidate> = tags
        .into_iter()
        .filter_map(|tag| Candidate::from_tag(tag, base))
        .collect();

    let inspections = match inspector {
        Some(inspector) => inspect_all(inspector, &candidates, options.concurrency).await,
        None => candidates.iter().map(|_| None).collect(),
    };

    let mut records = Vec::with_capacity(candidates.len());
    let mut errors = Vec::new();

    for (candidate, inspection) in candidates.into_iter().zip(inspections) {
        let record = match inspection {
            Some(Inspection { info, error }) => {
                errors.extend(error);
                candidate.into_inspected_record(info)
            }
            None => candidate.into_declared_record(),
        };

        if record.is_smaller_than(options.min_width, options.min_height) {
            debug!(
                "Skipping {} ({}x{}): below minimum size",
                record.url, record.width, record.height
            );
            continue;
        }
        records.push(record);
    }

    (records, errors)
}

/// Inspect candidates concurrently, returning one slot per candidate in the
/// document order. `data:` URIs are not fetched and get `None`.
async fn inspect_all(
    inspector: &ImageInspector,
    candidates: &[Candidate],
    concurrency: usize,
) -> Vec<Option<Inspection>> {
    // Limit concurrent image downloads
    let semaphore = Arc::new(Semaphore::new(concurrency.max(1)));

    let (positions, tasks): (Vec<usize>, Vec<_>) = candidates
        .iter()
        .enumerate()
        .filter(|(_, candidate)| !is_data_uri(&candidate.url))
        .map(|(position, candidate)| {
            let permit = semaphore.clone().acquire_owned();
            let inspector = inspector.clone();
            let url = candidate.url.clone();

            let task = tokio::spawn(async move {
                let _permit = permit.await;
                inspector.inspect(&url).await
            });
            (position, task)
        })
        .unzip();

    let results = future::join_all(tasks).await;

    let mut inspections: Vec<Option<Inspection>> = candidates.iter().map(|_| None).collect();
    for (position, result) in positions.into_iter().zip(results) {
        let inspection = result.unwrap_or_else(|e| {
            let url = &candidates[position].url;
            Inspection {
                info: ImageInfo::unmeasured(reported_type(url)),
                error: Some(ScrapeError::Measurement {
                    url: url.clone(),
                    reason: format!("inspection task failed: {}", e),
                }),
            }
        });
        inspections[position] = Some(inspection);
    }

    inspections
}
