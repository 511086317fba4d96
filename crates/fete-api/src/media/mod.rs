//! Third-party media hosting. The API only needs two operations from the
//! host (upload and destroy), so handlers depend on [`MediaHost`] and tests
//! swap in a fake.

pub mod cloudinary;
pub mod public_id;

#[cfg(test)]
pub mod fake;

use async_trait::async_trait;
use bytes::Bytes;
use thiserror::Error;
use tracing::{debug, warn};

use fete_types::api::MediaCleanupReport;

pub use cloudinary::{Cloudinary, CloudinaryConfig};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResourceType {
    Image,
    Video,
    Raw,
}

impl ResourceType {
    pub fn as_str(self) -> &'static str {
        match self {
            ResourceType::Image => "image",
            ResourceType::Video => "video",
            ResourceType::Raw => "raw",
        }
    }
}

/// An asset already stored on the host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaAsset {
    pub resource_type: ResourceType,
    pub public_id: String,
}

pub struct MediaUpload {
    pub resource_type: ResourceType,
    pub file_name: String,
    pub content_type: String,
    pub data: Bytes,
}

#[derive(Debug, Clone, PartialEq)]
pub struct UploadedMedia {
    pub url: String,
    pub public_id: String,
    /// Seconds; only reported for video.
    pub duration: Option<f64>,
}

#[derive(Debug, Error)]
pub enum MediaError {
    /// The host answered with a non-success status.
    #[error("media host rejected the request ({status}): {message}")]
    Rejected { status: u16, message: String },

    #[error("media host unreachable: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("unexpected media host response: {0}")]
    InvalidResponse(String),
}

#[async_trait]
pub trait MediaHost: Send + Sync {
    async fn upload(&self, upload: MediaUpload) -> Result<UploadedMedia, MediaError>;

    async fn destroy(&self, asset: &MediaAsset) -> Result<(), MediaError>;
}

/// Best-effort removal of every hosted asset referenced by `urls`.
/// URLs that don't point at the host are skipped; failures are only counted.
pub async fn cleanup(host: &dyn MediaHost, urls: &[&str]) -> MediaCleanupReport {
    let mut report = MediaCleanupReport::default();

    for url in urls {
        let Some(asset) = public_id::extract(url) else {
            debug!("Skipping non-Cloudinary media URL {}", url);
            report.skipped += 1;
            continue;
        };

        report.attempted += 1;
        match host.destroy(&asset).await {
            Ok(()) => report.deleted += 1,
            Err(e) => {
                warn!("Failed to delete media asset {}: {}", asset.public_id, e);
                report.failed += 1;
            }
        }
    }

    report
}
