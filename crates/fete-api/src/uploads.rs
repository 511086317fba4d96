use axum::{
    Json,
    extract::{
        Multipart, State,
        multipart::{Field, MultipartError, MultipartRejection},
    },
    http::StatusCode,
};
use bytes::{Bytes, BytesMut};
use tracing::{info, warn};

use fete_types::api::UploadResponse;

use crate::error::{ApiError, UploadErrorCode};
use crate::media::{MediaError, MediaUpload, ResourceType};
use crate::state::AppState;

pub const MAX_IMAGE_BYTES: usize = 10 * 1024 * 1024;
pub const MAX_VIDEO_BYTES: usize = 100 * 1024 * 1024;

/// Request body cap: the file limit plus room for multipart framing.
pub const fn body_limit(max_file_bytes: usize) -> usize {
    max_file_bytes + 1024 * 1024
}

/// What a single upload endpoint accepts.
pub struct UploadRules {
    pub field: &'static str,
    pub resource_type: ResourceType,
    pub max_bytes: usize,
    pub mime_types: &'static [&'static str],
    pub extensions: &'static [&'static str],
    noun: &'static str,
    service: &'static str,
    type_list: &'static str,
    limit_label: &'static str,
}

pub const IMAGE_RULES: UploadRules = UploadRules {
    field: "image",
    resource_type: ResourceType::Image,
    max_bytes: MAX_IMAGE_BYTES,
    mime_types: &["image/jpeg", "image/jpg", "image/png", "image/gif", "image/webp"],
    extensions: &["jpeg", "jpg", "png", "gif", "webp"],
    noun: "image",
    service: "Image upload service",
    type_list: "JPG, PNG, GIF, and WebP",
    limit_label: "10MB",
};

pub const VIDEO_RULES: UploadRules = UploadRules {
    field: "video",
    resource_type: ResourceType::Video,
    max_bytes: MAX_VIDEO_BYTES,
    mime_types: &[
        "video/mp4",
        "video/webm",
        "video/quicktime",
        "video/x-msvideo",
        "video/x-matroska",
    ],
    extensions: &["mp4", "webm", "mov", "avi", "mkv"],
    noun: "video",
    service: "Video upload service",
    type_list: "MP4, WebM, MOV, AVI, and MKV",
    limit_label: "100MB",
};

impl UploadRules {
    fn accepts(&self, content_type: &str, file_name: &str) -> bool {
        let mime = content_type.trim().to_ascii_lowercase();
        let extension = file_name
            .rsplit_once('.')
            .map(|(_, ext)| ext.to_ascii_lowercase())
            .unwrap_or_default();

        self.mime_types.contains(&mime.as_str()) && self.extensions.contains(&extension.as_str())
    }

    fn too_large(&self) -> ApiError {
        ApiError::upload(
            StatusCode::BAD_REQUEST,
            UploadErrorCode::FileTooLarge,
            format!("File size exceeds {} limit", self.limit_label),
        )
    }

    fn invalid_type(&self) -> ApiError {
        ApiError::upload(
            StatusCode::BAD_REQUEST,
            UploadErrorCode::InvalidFileType,
            format!("Invalid file type. Only {} are allowed", self.type_list),
        )
    }

    fn malformed(&self, e: MultipartError) -> ApiError {
        if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
            return self.too_large();
        }
        warn!("Malformed {} upload: {}", self.noun, e);
        ApiError::upload(
            StatusCode::BAD_REQUEST,
            UploadErrorCode::UploadError,
            e.body_text(),
        )
    }

    fn host_failure(&self, e: MediaError) -> ApiError {
        let message = match &e {
            MediaError::Rejected { status: 401, .. } => {
                "Cloudinary authentication failed. Check API credentials.".to_string()
            }
            MediaError::Rejected { status: 400, .. } => {
                format!("Invalid {} file or format", self.noun)
            }
            MediaError::Rejected { message, .. } => message.clone(),
            _ => format!("Failed to upload {} to cloud storage", self.noun),
        };
        warn!("Cloudinary {} upload failed: {}", self.noun, e);
        ApiError::Upload {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            code: UploadErrorCode::CloudinaryUploadFailed,
            message,
            detail: Some(e.to_string()),
        }
    }
}

pub async fn upload_image(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<UploadResponse>, ApiError> {
    handle_upload(&state, multipart, &IMAGE_RULES).await
}

pub async fn upload_video(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<UploadResponse>, ApiError> {
    handle_upload(&state, multipart, &VIDEO_RULES).await
}

async fn handle_upload(
    state: &AppState,
    multipart: Result<Multipart, MultipartRejection>,
    rules: &UploadRules,
) -> Result<Json<UploadResponse>, ApiError> {
    let Some(host) = state.media.clone() else {
        warn!("Rejected {} upload: Cloudinary is not configured", rules.noun);
        return Err(ApiError::upload(
            StatusCode::INTERNAL_SERVER_ERROR,
            UploadErrorCode::CloudinaryNotConfigured,
            format!(
                "{} not configured. Please contact administrator.",
                rules.service
            ),
        ));
    };

    let mut multipart = multipart.map_err(|rejection| {
        ApiError::upload(
            StatusCode::BAD_REQUEST,
            UploadErrorCode::UploadError,
            rejection.body_text(),
        )
    })?;

    let upload = read_file(&mut multipart, rules).await?;
    let size = upload.data.len();
    info!(
        "Received {} {} ({}, {} bytes)",
        rules.noun, upload.file_name, upload.content_type, size
    );

    let uploaded = host
        .upload(upload)
        .await
        .map_err(|e| rules.host_failure(e))?;

    Ok(Json(UploadResponse {
        url: uploaded.url,
        public_id: uploaded.public_id,
        duration: match rules.resource_type {
            ResourceType::Video => uploaded.duration,
            _ => None,
        },
    }))
}

/// Pull the file part named `rules.field`, ignoring any other parts.
async fn read_file(
    multipart: &mut Multipart,
    rules: &UploadRules,
) -> Result<MediaUpload, ApiError> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| rules.malformed(e))?
    {
        if field.name() != Some(rules.field) {
            continue;
        }

        let file_name = field.file_name().unwrap_or_default().to_string();
        let content_type = field.content_type().unwrap_or_default().to_string();
        if !rules.accepts(&content_type, &file_name) {
            warn!(
                "Rejected {} upload {:?} with type {:?}",
                rules.noun, file_name, content_type
            );
            return Err(rules.invalid_type());
        }

        let data = read_limited(field, rules).await?;
        if data.is_empty() {
            break;
        }

        return Ok(MediaUpload {
            resource_type: rules.resource_type,
            file_name,
            content_type,
            data,
        });
    }

    Err(ApiError::upload(
        StatusCode::BAD_REQUEST,
        UploadErrorCode::NoFile,
        "No file uploaded",
    ))
}

async fn read_limited(mut field: Field<'_>, rules: &UploadRules) -> Result<Bytes, ApiError> {
    let mut buf = BytesMut::new();
    while let Some(chunk) = field.chunk().await.map_err(|e| rules.malformed(e))? {
        if buf.len() + chunk.len() > rules.max_bytes {
            warn!("Rejected {} upload over {} bytes", rules.noun, rules.max_bytes);
            return Err(rules.too_large());
        }
        buf.extend_from_slice(&chunk);
    }
    Ok(buf.freeze())
}
