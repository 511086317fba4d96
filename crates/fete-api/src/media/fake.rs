use async_trait::async_trait;
use tokio::sync::Mutex;

use super::{MediaAsset, MediaError, MediaHost, MediaUpload, UploadedMedia};

/// Records calls instead of talking to Cloudinary.
#[derive(Default)]
pub struct FakeMediaHost {
    uploads: Mutex<Vec<(String, usize)>>,
    destroyed: Mutex<Vec<MediaAsset>>,
    failing: Mutex<Vec<String>>,
    reject_uploads_with: Mutex<Option<u16>>,
}

impl FakeMediaHost {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make `destroy` fail for this public id.
    pub async fn fail_on(&self, public_id: &str) {
        self.failing.lock().await.push(public_id.to_string());
    }

    /// Make every `upload` fail with this HTTP status.
    pub async fn reject_uploads(&self, status: u16) {
        *self.reject_uploads_with.lock().await = Some(status);
    }

    pub async fn destroyed(&self) -> Vec<MediaAsset> {
        self.destroyed.lock().await.clone()
    }

    /// `(file name, byte length)` of every accepted upload.
    pub async fn uploads(&self) -> Vec<(String, usize)> {
        self.uploads.lock().await.clone()
    }
}

#[async_trait]
impl MediaHost for FakeMediaHost {
    async fn upload(&self, upload: MediaUpload) -> Result<UploadedMedia, MediaError> {
        if let Some(status) = *self.reject_uploads_with.lock().await {
            return Err(MediaError::Rejected {
                status,
                message: "rejected by fake".into(),
            });
        }

        let kind = upload.resource_type.as_str();
        let stem = upload
            .file_name
            .rsplit_once('.')
            .map_or(upload.file_name.as_str(), |(stem, _)| stem)
            .to_string();
        let public_id = format!("fete/{stem}");

        self.uploads
            .lock()
            .await
            .push((upload.file_name.clone(), upload.data.len()));

        Ok(UploadedMedia {
            url: format!("https://res.cloudinary.com/test/{kind}/upload/v1/{public_id}"),
            public_id,
            duration: (kind == "video").then_some(12.5),
        })
    }

    async fn destroy(&self, asset: &MediaAsset) -> Result<(), MediaError> {
        if self.failing.lock().await.contains(&asset.public_id) {
            return Err(MediaError::Rejected {
                status: 404,
                message: "not found".into(),
            });
        }
        self.destroyed.lock().await.push(asset.clone());
        Ok(())
    }
}
