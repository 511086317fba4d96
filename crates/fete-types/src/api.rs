use chrono::{DateTime, NaiveDate};
use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize};

use crate::models::{Sections, Theme};

// -- JWT Claims --

/// Admin session token payload. `sub` is the admin's row id.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: i32,
    pub email: String,
    pub exp: usize,
}

// -- Admin auth --

/// Fields are optional so a missing one turns into a 400 with a readable
/// message instead of a deserialization rejection.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdminSummary {
    pub id: i32,
    pub email: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct LoginResponse {
    pub token: String,
    pub admin: AdminSummary,
}

// -- Celebrations --

/// Body of `POST /celebrations` and `PUT /celebrations/{id}`.
///
/// Create requires `title` and `slug`. On update every absent or null field
/// leaves the stored value untouched.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CelebrationRequest {
    pub title: Option<String>,
    pub subtitle: Option<String>,
    pub slug: Option<String>,
    pub event_type: Option<String>,
    #[serde(default, deserialize_with = "blank_date")]
    pub event_date: Option<NaiveDate>,
    pub story: Option<String>,
    pub cover_image: Option<String>,
    pub images: Option<Vec<String>>,
    pub videos: Option<Vec<String>>,
    pub qr_image: Option<String>,
    pub spotify_code: Option<String>,
    pub money_collection_enabled: Option<bool>,
    pub theme: Option<Theme>,
    pub sections: Option<Sections>,
    pub quotes: Option<Vec<String>>,
}

/// Date inputs post `""` when nothing was picked; that means "no date".
fn blank_date<'de, D>(deserializer: D) -> Result<Option<NaiveDate>, D::Error>
where
    D: Deserializer<'de>,
{
    let Some(raw) = Option::<String>::deserialize(deserializer)? else {
        return Ok(None);
    };
    let raw = raw.trim();
    if raw.is_empty() {
        return Ok(None);
    }

    // Pages loaded back into the editor may carry a full timestamp.
    raw.parse::<NaiveDate>()
        .or_else(|_| DateTime::parse_from_rfc3339(raw).map(|ts| ts.date_naive()))
        .map(Some)
        .map_err(serde::de::Error::custom)
}

/// Outcome of the best-effort media cleanup that runs when a page is deleted.
#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
pub struct MediaCleanupReport {
    pub attempted: usize,
    pub deleted: usize,
    pub failed: usize,
    pub skipped: usize,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteCelebrationResponse {
    pub message: String,
    pub media_cleanup: MediaCleanupReport,
}

// -- Wishes --

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateWishRequest {
    pub celebration_id: Option<i32>,
    pub name: Option<String>,
    pub message: Option<String>,
    pub amount: Option<Decimal>,
}

// -- Uploads --

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadResponse {
    pub url: String,
    pub public_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration: Option<f64>,
}

// -- Misc --

#[derive(Debug, Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub message: String,
}

/// Body of every non-2xx response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorBody {
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub received: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn blank_event_date_is_none() {
        for raw in [json!(""), json!("   "), json!(null)] {
            let req: CelebrationRequest =
                serde_json::from_value(json!({ "eventDate": raw })).unwrap();
            assert_eq!(req.event_date, None);
        }

        let req: CelebrationRequest = serde_json::from_value(json!({})).unwrap();
        assert_eq!(req.event_date, None);
    }

    #[test]
    fn event_date_parses_iso_dates() {
        let req: CelebrationRequest =
            serde_json::from_value(json!({ "eventDate": "2025-06-14" })).unwrap();
        assert_eq!(req.event_date, NaiveDate::from_ymd_opt(2025, 6, 14));

        let req: CelebrationRequest =
            serde_json::from_value(json!({ "eventDate": "2025-06-14T00:00:00.000Z" })).unwrap();
        assert_eq!(req.event_date, NaiveDate::from_ymd_opt(2025, 6, 14));

        let bad = serde_json::from_value::<CelebrationRequest>(json!({ "eventDate": "June" }));
        assert!(bad.is_err());
    }
}
