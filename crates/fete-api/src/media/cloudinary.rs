//! Signed Cloudinary upload API client.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, multipart};
use serde::Deserialize;
use sha1::{Digest, Sha1};
use tracing::{debug, info};

use super::{MediaAsset, MediaError, MediaHost, MediaUpload, ResourceType, UploadedMedia};

const DEFAULT_API_BASE: &str = "https://api.cloudinary.com/v1_1";

/// Images are downscaled on ingest so pages never serve camera originals.
const IMAGE_TRANSFORMATION: &str = "c_limit,h_1080,w_1920";

const REQUEST_TIMEOUT: Duration = Duration::from_secs(300);

#[derive(Debug, Clone)]
pub struct CloudinaryConfig {
    pub cloud_name: String,
    pub api_key: String,
    pub api_secret: String,
    /// Root folder; videos go to `<folder>/videos`.
    pub folder: String,
}

pub struct Cloudinary {
    client: Client,
    config: CloudinaryConfig,
    api_base: String,
}

#[derive(Deserialize)]
struct UploadResult {
    secure_url: String,
    public_id: String,
    duration: Option<f64>,
}

#[derive(Deserialize)]
struct DestroyResult {
    result: String,
}

#[derive(Deserialize)]
struct ErrorEnvelope {
    error: ErrorMessage,
}

#[derive(Deserialize)]
struct ErrorMessage {
    message: String,
}

impl Cloudinary {
    pub fn new(config: CloudinaryConfig) -> Result<Self, MediaError> {
        Self::with_api_base(config, DEFAULT_API_BASE)
    }

    pub fn with_api_base(config: CloudinaryConfig, api_base: &str) -> Result<Self, MediaError> {
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .user_agent(env!("CARGO_PKG_NAME"))
            .build()?;

        Ok(Self {
            client,
            config,
            api_base: api_base.trim_end_matches('/').to_string(),
        })
    }

    pub fn cloud_name(&self) -> &str {
        &self.config.cloud_name
    }

    fn endpoint(&self, resource_type: ResourceType, action: &str) -> String {
        format!(
            "{}/{}/{}/{}",
            self.api_base,
            self.config.cloud_name,
            resource_type.as_str(),
            action
        )
    }

    fn folder_for(&self, resource_type: ResourceType) -> String {
        match resource_type {
            ResourceType::Video => format!("{}/videos", self.config.folder),
            _ => self.config.folder.clone(),
        }
    }
}

/// SHA-1 over the `&`-joined, key-sorted `k=v` pairs followed by the secret.
pub fn sign(params: &[(&str, &str)], api_secret: &str) -> String {
    let mut sorted: Vec<_> = params.iter().filter(|(_, v)| !v.is_empty()).collect();
    sorted.sort_by_key(|(k, _)| *k);

    let to_sign = sorted
        .iter()
        .map(|(k, v)| format!("{k}={v}"))
        .collect::<Vec<_>>()
        .join("&");

    let mut hasher = Sha1::new();
    hasher.update(to_sign.as_bytes());
    hasher.update(api_secret.as_bytes());
    hex::encode(hasher.finalize())
}

async fn rejection(response: reqwest::Response) -> MediaError {
    let status = response.status().as_u16();
    let message = match response.json::<ErrorEnvelope>().await {
        Ok(envelope) => envelope.error.message,
        Err(_) => "no error message".to_string(),
    };
    MediaError::Rejected { status, message }
}

#[async_trait]
impl MediaHost for Cloudinary {
    async fn upload(&self, upload: MediaUpload) -> Result<UploadedMedia, MediaError> {
        let folder = self.folder_for(upload.resource_type);
        let timestamp = chrono::Utc::now().timestamp().to_string();

        let mut params = vec![("folder", folder.as_str()), ("timestamp", timestamp.as_str())];
        if upload.resource_type == ResourceType::Image {
            params.push(("transformation", IMAGE_TRANSFORMATION));
        }
        let signature = sign(&params, &self.config.api_secret);

        let size = upload.data.len();
        let file = multipart::Part::stream_with_length(upload.data, size as u64)
            .file_name(upload.file_name.clone())
            .mime_str(&upload.content_type)?;

        let mut form = multipart::Form::new()
            .part("file", file)
            .text("api_key", self.config.api_key.clone())
            .text("signature", signature);
        for (key, value) in params {
            form = form.text(key, value.to_string());
        }

        debug!(
            "Uploading {} ({} bytes) to Cloudinary folder {}",
            upload.file_name, size, folder
        );

        let response = self
            .client
            .post(self.endpoint(upload.resource_type, "upload"))
            .multipart(form)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(rejection(response).await);
        }

        let result: UploadResult = response
            .json()
            .await
            .map_err(|e| MediaError::InvalidResponse(e.to_string()))?;

        info!("Uploaded {} to Cloudinary", result.public_id);
        Ok(UploadedMedia {
            url: result.secure_url,
            public_id: result.public_id,
            duration: result.duration,
        })
    }

    async fn destroy(&self, asset: &MediaAsset) -> Result<(), MediaError> {
        let timestamp = chrono::Utc::now().timestamp().to_string();
        let params = [
            ("invalidate", "true"),
            ("public_id", asset.public_id.as_str()),
            ("timestamp", timestamp.as_str()),
        ];
        let signature = sign(&params, &self.config.api_secret);

        let mut form: Vec<(&str, &str)> = params.to_vec();
        form.push(("api_key", self.config.api_key.as_str()));
        form.push(("signature", signature.as_str()));

        let response = self
            .client
            .post(self.endpoint(asset.resource_type, "destroy"))
            .form(&form)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(rejection(response).await);
        }

        let result: DestroyResult = response
            .json()
            .await
            .map_err(|e| MediaError::InvalidResponse(e.to_string()))?;

        match result.result.as_str() {
            "ok" => {
                debug!("Deleted {} from Cloudinary", asset.public_id);
                Ok(())
            }
            other => Err(MediaError::Rejected {
                status: 404,
                message: other.to_string(),
            }),
        }
    }
}
