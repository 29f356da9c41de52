//! Image inspection
//!
//! Downloads an image and measures it: pixel size, the encoding it really uses
//! and the matching MIME type. Measurement either goes through a temp file in
//! a configured directory or decodes the bytes in memory.

use crate::scraper::Dimension;
use crate::scraper::error::ScrapeError;
use crate::scraper::fetcher::Fetcher;
use image::{GenericImageView, ImageFormat, ImageReader};
use regex::Regex;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;
use tracing::{debug, instrument, warn};
use url::Url;

/// Extensions we trust enough to report as the image's claimed type
static REPORTED_TYPE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\.(png|gif|bmp|jpg|jpeg)$").expect("extension pattern is valid")
});

/// Encodings the inspector can recognise
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageKind {
    Gif,
    Jpeg,
    Png,
    Bmp,
    WebP,
    Tiff,
    Ico,
}

/// kind → (name, MIME type)
const IMAGE_KINDS: [(ImageKind, &str, &str); 7] = [
    (ImageKind::Gif, "gif", "image/gif"),
    (ImageKind::Jpeg, "jpeg", "image/jpeg"),
    (ImageKind::Png, "png", "image/png"),
    (ImageKind::Bmp, "bmp", "image/bmp"),
    (ImageKind::WebP, "webp", "image/webp"),
    (ImageKind::Tiff, "tiff", "image/tiff"),
    (ImageKind::Ico, "ico", "image/vnd.microsoft.icon"),
];

impl ImageKind {
    fn from_format(format: ImageFormat) -> Option<Self> {
        match format {
            ImageFormat::Gif => Some(Self::Gif),
            ImageFormat::Jpeg => Some(Self::Jpeg),
            ImageFormat::Png => Some(Self::Png),
            ImageFormat::Bmp => Some(Self::Bmp),
            ImageFormat::WebP => Some(Self::WebP),
            ImageFormat::Tiff => Some(Self::Tiff),
            ImageFormat::Ico => Some(Self::Ico),
            _ => None,
        }
    }

    fn entry(self) -> (ImageKind, &'static str, &'static str) {
        IMAGE_KINDS
            .into_iter()
            .find(|(kind, _, _)| *kind == self)
            .unwrap_or((self, "unknown", "application/octet-stream"))
    }

    /// Lowercase canonical name, e.g. `jpeg`
    pub fn name(self) -> &'static str {
        self.entry().1
    }

    pub fn mime_type(self) -> &'static str {
        self.entry().2
    }
}

/// The type an image URL claims through its file extension, lowercased.
///
/// Only the last path segment is considered, so query strings and host names
/// never produce a match.
pub fn reported_type(url: &str) -> Option<String> {
    let path = Url::parse(url)
        .map(|parsed| parsed.path().to_string())
        .unwrap_or_else(|_| url.split(['?', '#']).next().unwrap_or_default().to_string());
    let file_name = path.rsplit('/').next().unwrap_or_default();

    REPORTED_TYPE
        .captures(file_name)
        .and_then(|captures| captures.get(1))
        .map(|ext| ext.as_str().to_lowercase())
}

/// What inspection learned about an image
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageInfo {
    pub reported_type: Option<String>,
    pub actual_type: Option<ImageKind>,
    pub width: Dimension,
    pub height: Dimension,
}

impl ImageInfo {
    pub(crate) fn unmeasured(reported_type: Option<String>) -> Self {
        Self {
            reported_type,
            actual_type: None,
            width: Dimension::Unknown,
            height: Dimension::Unknown,
        }
    }

    pub fn mime_type(&self) -> Option<&'static str> {
        self.actual_type.map(ImageKind::mime_type)
    }
}

/// Result of inspecting one image. Inspection never fails outright: on error
/// `info` holds whatever was learned before the failure.
#[derive(Debug)]
pub struct Inspection {
    pub info: ImageInfo,
    pub error: Option<ScrapeError>,
}

/// Where downloaded images are measured
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MeasureStrategy {
    /// Decode the downloaded bytes directly
    InMemory,
    /// Write each image to its own temp file in `dir`, measure, delete
    Disk { dir: PathBuf },
}

struct Measured {
    kind: Option<ImageKind>,
    width: u32,
    height: u32,
}

/// Downloads and measures images
#[derive(Debug, Clone)]
pub struct ImageInspector {
    fetcher: Fetcher,
    strategy: MeasureStrategy,
}

impl ImageInspector {
    pub fn new(fetcher: Fetcher, strategy: MeasureStrategy) -> Self {
        Self { fetcher, strategy }
    }

    /// Download and measure one image
    #[instrument(skip(self), level = "debug")]
    pub async fn inspect(&self, url: &str) -> Inspection {
        let mut info = ImageInfo::unmeasured(reported_type(url));

        let bytes = match self.fetcher.fetch_bytes(url).await {
            Ok(bytes) => bytes,
            Err(error) => {
                return Inspection {
                    info,
                    error: Some(error),
                };
            }
        };

        let measured = match &self.strategy {
            MeasureStrategy::InMemory => measure_in_memory(url, bytes).await,
            MeasureStrategy::Disk { dir } => measure_on_disk(url, bytes, dir).await,
        };

        match measured {
            Ok(measured) => {
                debug!(
                    "Measured {} as {}x{} {:?}",
                    url, measured.width, measured.height, measured.kind
                );
                info.actual_type = measured.kind;
                info.width = Dimension::Pixels(measured.width);
                info.height = Dimension::Pixels(measured.height);
                Inspection { info, error: None }
            }
            Err(error) => {
                warn!("Failed to measure {}: {}", url, error);
                Inspection {
                    info,
                    error: Some(error),
                }
            }
        }
    }
}

fn check_dimensions(url: &str, width: u32, height: u32) -> Result<(), ScrapeError> {
    if width == 0 || height == 0 {
        return Err(ScrapeError::Measurement {
            url: url.to_string(),
            reason: format!("image reports a size of {}x{}", width, height),
        });
    }
    Ok(())
}

fn task_failed(url: &str, err: tokio::task::JoinError) -> ScrapeError {
    ScrapeError::Measurement {
        url: url.to_string(),
        reason: format!("measurement task failed: {}", err),
    }
}

async fn measure_in_memory(url: &str, bytes: Vec<u8>) -> Result<Measured, ScrapeError> {
    let owned_url = url.to_string();
    tokio::task::spawn_blocking(move || {
        let decode_error = |source| ScrapeError::Decode {
            url: owned_url.clone(),
            source,
        };

        let format = image::guess_format(&bytes).map_err(decode_error)?;
        let image = image::load_from_memory_with_format(&bytes, format).map_err(decode_error)?;
        let (width, height) = image.dimensions();
        check_dimensions(&owned_url, width, height)?;

        Ok(Measured {
            kind: ImageKind::from_format(format),
            width,
            height,
        })
    })
    .await
    .map_err(|e| task_failed(url, e))?
}

async fn measure_on_disk(url: &str, bytes: Vec<u8>, dir: &Path) -> Result<Measured, ScrapeError> {
    tokio::fs::create_dir_all(dir)
        .await
        .map_err(|source| ScrapeError::DirectoryCreate {
            path: dir.to_path_buf(),
            source,
        })?;

    let owned_url = url.to_string();
    let dir = dir.to_path_buf();
    tokio::task::spawn_blocking(move || {
        let temp_error = |source| ScrapeError::TempFile {
            url: owned_url.clone(),
            source,
        };
        let decode_error = |source| ScrapeError::Decode {
            url: owned_url.clone(),
            source,
        };

        let format = image::guess_format(&bytes).map_err(decode_error)?;

        // Removed when `file` is dropped, whichever way this closure exits.
        let mut file = tempfile::Builder::new()
            .prefix("metascrape-")
            .tempfile_in(&dir)
            .map_err(temp_error)?;
        file.write_all(&bytes).map_err(temp_error)?;
        file.flush().map_err(temp_error)?;

        let mut reader = ImageReader::open(file.path()).map_err(temp_error)?;
        reader.set_format(format);
        let (width, height) = reader.into_dimensions().map_err(decode_error)?;
        check_dimensions(&owned_url, width, height)?;

        Ok(Measured {
            kind: ImageKind::from_format(format),
            width,
            height,
        })
    })
    .await
    .map_err(|e| task_failed(url, e))?
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scraper::config::FetchConfig;
    use mockito::Server;
    use std::io::Cursor;

    fn png_bytes(width: u32, height: u32) -> Vec<u8> {
        let mut bytes = Vec::new();
        image::RgbImage::new(width, height)
            .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
            .unwrap();
        bytes
    }

    fn inspector(strategy: MeasureStrategy) -> ImageInspector {
        ImageInspector::new(Fetcher::new(&FetchConfig::default()).unwrap(), strategy)
    }

    #[test]
    fn test_reported_type() {
        assert_eq!(reported_type("http://a.com/x/photo.JPG").as_deref(), Some("jpg"));
        assert_eq!(reported_type("http://a.com/logo.png?v=2").as_deref(), Some("png"));
        assert_eq!(reported_type("http://cdn.gif.com/image").as_deref(), None);
        assert_eq!(reported_type("http://a.com/archive.png.zip").as_deref(), None);
        assert_eq!(reported_type("http://a.com/anim.webp").as_deref(), None);
    }

    #[test]
    fn test_mime_table() {
        assert_eq!(ImageKind::Jpeg.name(), "jpeg");
        assert_eq!(ImageKind::Jpeg.mime_type(), "image/jpeg");
        assert_eq!(ImageKind::Png.mime_type(), "image/png");
        assert_eq!(ImageKind::Ico.mime_type(), "image/vnd.microsoft.icon");
        assert_eq!(ImageKind::from_format(ImageFormat::Gif), Some(ImageKind::Gif));
    }

    #[tokio::test]
    async fn test_inspect_in_memory() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("GET", "/pic.jpg")
            .with_status(200)
            .with_body(png_bytes(12, 7))
            .create_async()
            .await;

        let inspection = inspector(MeasureStrategy::InMemory)
            .inspect(&format!("{}/pic.jpg", server.url()))
            .await;

        assert!(inspection.error.is_none());
        let info = inspection.info;
        assert_eq!(info.reported_type.as_deref(), Some("jpg"));
        assert_eq!(info.actual_type, Some(ImageKind::Png));
        assert_eq!(info.mime_type(), Some("image/png"));
        assert_eq!(info.width, Dimension::Pixels(12));
        assert_eq!(info.height, Dimension::Pixels(7));

        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_inspect_on_disk_cleans_up() {
        let mut server = Server::new_async().await;
        server
            .mock("GET", "/pic.png")
            .with_status(200)
            .with_body(png_bytes(30, 40))
            .create_async()
            .await;

        let root = tempfile::tempdir().unwrap();
        let dir = root.path().join("images");
        let inspection = inspector(MeasureStrategy::Disk { dir: dir.clone() })
            .inspect(&format!("{}/pic.png", server.url()))
            .await;

        assert!(inspection.error.is_none());
        assert_eq!(inspection.info.actual_type, Some(ImageKind::Png));
        assert_eq!(inspection.info.width, Dimension::Pixels(30));
        assert_eq!(inspection.info.height, Dimension::Pixels(40));
        assert!(dir.is_dir());
        assert_eq!(std::fs::read_dir(&dir).unwrap().count(), 0);
    }

    #[tokio::test]
    async fn test_undecodable_bytes_leave_partial_info() {
        let mut server = Server::new_async().await;
        server
            .mock("GET", "/broken.gif")
            .with_status(200)
            .with_body("definitely not an image")
            .create_async()
            .await;

        let root = tempfile::tempdir().unwrap();
        let url = format!("{}/broken.gif", server.url());

        let inspection = inspector(MeasureStrategy::InMemory).inspect(&url).await;
        assert!(matches!(inspection.error, Some(ScrapeError::Decode { .. })));
        assert_eq!(inspection.info.reported_type.as_deref(), Some("gif"));
        assert_eq!(inspection.info.width, Dimension::Unknown);

        let disk = inspector(MeasureStrategy::Disk {
            dir: root.path().to_path_buf(),
        });
        let inspection = disk.inspect(&url).await;
        assert!(matches!(inspection.error, Some(ScrapeError::Decode { .. })));
        assert_eq!(inspection.info.height, Dimension::Unknown);
        assert_eq!(std::fs::read_dir(root.path()).unwrap().count(), 0);
    }

    #[tokio::test]
    async fn test_unwritable_directory() {
        let mut server = Server::new_async().await;
        server
            .mock("GET", "/pic.png")
            .with_status(200)
            .with_body(png_bytes(8, 8))
            .create_async()
            .await;

        let root = tempfile::tempdir().unwrap();
        let blocker = root.path().join("not-a-dir");
        std::fs::write(&blocker, b"file").unwrap();

        let inspection = inspector(MeasureStrategy::Disk {
            dir: blocker.join("images"),
        })
        .inspect(&format!("{}/pic.png", server.url()))
        .await;

        assert!(matches!(
            inspection.error,
            Some(ScrapeError::DirectoryCreate { .. })
        ));
        assert_eq!(inspection.info.width, Dimension::Unknown);
    }

    #[tokio::test]
    async fn test_fetch_failure() {
        let mut server = Server::new_async().await;
        server
            .mock("GET", "/gone.png")
            .with_status(410)
            .create_async()
            .await;

        let inspection = inspector(MeasureStrategy::InMemory)
            .inspect(&format!("{}/gone.png", server.url()))
            .await;

        assert!(matches!(
            inspection.error,
            Some(ScrapeError::HttpStatus { status: 410, .. })
        ));
        assert_eq!(inspection.info.reported_type.as_deref(), Some("png"));
    }
}
