use std::fmt::Display;
use std::time::Duration;

use axum::{
    Json,
    extract::{Request, rejection::JsonRejection},
    http::{HeaderValue, StatusCode, header},
    middleware::Next,
    response::{IntoResponse, Response},
};
use thiserror::Error;
use tracing::error;

use fete_db::DbError;
use fete_types::api::ErrorBody;

/// Machine-readable codes the admin UI switches on after a failed upload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadErrorCode {
    NoFile,
    FileTooLarge,
    InvalidFileType,
    UploadError,
    CloudinaryNotConfigured,
    CloudinaryUploadFailed,
}

impl UploadErrorCode {
    pub fn as_str(self) -> &'static str {
        match self {
            UploadErrorCode::NoFile => "NO_FILE",
            UploadErrorCode::FileTooLarge => "FILE_TOO_LARGE",
            UploadErrorCode::InvalidFileType => "INVALID_FILE_TYPE",
            UploadErrorCode::UploadError => "UPLOAD_ERROR",
            UploadErrorCode::CloudinaryNotConfigured => "CLOUDINARY_NOT_CONFIGURED",
            UploadErrorCode::CloudinaryUploadFailed => "CLOUDINARY_UPLOAD_FAILED",
        }
    }
}

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),

    #[error("{message}")]
    InvalidId { message: String, received: String },

    #[error("{0}")]
    Unauthorized(&'static str),

    #[error("{0}")]
    NotFound(String),

    #[error("Too many requests, please try again later.")]
    RateLimited { retry_after: Duration },

    #[error("{message}")]
    Upload {
        status: StatusCode,
        code: UploadErrorCode,
        message: String,
        detail: Option<String>,
    },

    /// Database or third-party failure. `message` is what clients see,
    /// `detail` is only exposed in development.
    #[error("{message}")]
    Internal { message: String, detail: String },
}

impl ApiError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        ApiError::BadRequest(message.into())
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        ApiError::NotFound(message.into())
    }

    pub fn upload(status: StatusCode, code: UploadErrorCode, message: impl Into<String>) -> Self {
        ApiError::Upload {
            status,
            code,
            message: message.into(),
            detail: None,
        }
    }

    /// Log `cause` and hide it behind `message`.
    pub fn internal(message: impl Into<String>, cause: impl Display) -> Self {
        let message = message.into();
        error!("{}: {}", message, cause);
        ApiError::Internal {
            message,
            detail: cause.to_string(),
        }
    }

    /// Like [`ApiError::internal`], but tells the operator when the schema
    /// has not been created yet.
    pub fn db(message: impl Into<String>, e: DbError) -> Self {
        match e {
            DbError::NotInitialized => {
                error!("Database tables not found; migrations have not run");
                ApiError::Internal {
                    message: "Database not initialized. Please run migrations.".to_string(),
                    detail: e.to_string(),
                }
            }
            other if other.is_transient() => {
                ApiError::internal(message, format!("database unreachable after retries: {other}"))
            }
            other => ApiError::internal(message, other),
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) | ApiError::InvalidId { .. } => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::RateLimited { .. } => StatusCode::TOO_MANY_REQUESTS,
            ApiError::Upload { status, .. } => *status,
            ApiError::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn body(&self) -> ErrorBody {
        let mut body = ErrorBody {
            message: self.to_string(),
            error: None,
            received: None,
            details: None,
        };
        match self {
            ApiError::InvalidId { received, .. } => body.received = Some(received.clone()),
            ApiError::Upload { code, .. } => body.error = Some(code.as_str().to_string()),
            _ => {}
        }
        body
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

/// Carried in response extensions so [`expose_error_details`] can add the
/// hidden cause back in development.
#[derive(Debug, Clone)]
pub struct ErrorDetail {
    pub body: ErrorBody,
    pub detail: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = self.body();
        let mut response = (status, Json(body.clone())).into_response();

        match self {
            ApiError::RateLimited { retry_after } => {
                let secs = retry_after.as_secs().max(1);
                if let Ok(value) = HeaderValue::from_str(&secs.to_string()) {
                    response.headers_mut().insert(header::RETRY_AFTER, value);
                }
            }
            ApiError::Internal { detail, .. }
            | ApiError::Upload {
                detail: Some(detail),
                ..
            } => {
                response.extensions_mut().insert(ErrorDetail { body, detail });
            }
            _ => {}
        }

        response
    }
}

/// Development-only layer: re-renders error responses with their `details`.
pub async fn expose_error_details(req: Request, next: Next) -> Response {
    let mut response = next.run(req).await;
    let Some(ErrorDetail { mut body, detail }) = response.extensions_mut().remove::<ErrorDetail>()
    else {
        return response;
    };

    body.details = Some(detail);
    (response.status(), Json(body)).into_response()
}
