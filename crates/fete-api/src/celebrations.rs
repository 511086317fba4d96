use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use axum_extra::extract::WithRejection;
use tracing::{info, warn};

use fete_db::{CelebrationChanges, DbError, NewCelebration};
use fete_types::api::{CelebrationRequest, DeleteCelebrationResponse, MediaCleanupReport};
use fete_types::models::{Celebration, DEFAULT_EVENT_TYPE};

use crate::error::ApiError;
use crate::ids::parse_id;
use crate::media;
use crate::slug::{self, SlugError};
use crate::state::AppState;

const NOT_FOUND: &str = "Celebration not found";
const SLUG_TAKEN: &str = "Slug already exists";

fn slug_error(e: SlugError) -> ApiError {
    match e {
        SlugError::Empty => ApiError::bad_request("Invalid slug format"),
        other => ApiError::bad_request(other.to_string()),
    }
}

/// Unique-constraint races surface as the same 400 as the pre-check.
fn write_error(message: &str, e: DbError) -> ApiError {
    match e {
        DbError::UniqueViolation(_) => ApiError::bad_request(SLUG_TAKEN),
        other => ApiError::db(message, other),
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

// -- Public --

pub async fn get_by_slug(
    State(state): State<AppState>,
    Path(raw): Path<String>,
) -> Result<Json<Celebration>, ApiError> {
    let Ok(slug) = slug::normalize(&raw) else {
        return Err(ApiError::not_found(NOT_FOUND));
    };

    state
        .store
        .celebration_by_slug(&slug)
        .await
        .map_err(|e| ApiError::db("Failed to fetch celebration", e))?
        .map(Json)
        .ok_or_else(|| ApiError::not_found(NOT_FOUND))
}

// -- Admin --

pub async fn list(State(state): State<AppState>) -> Result<Json<Vec<Celebration>>, ApiError> {
    let celebrations = state
        .store
        .list_celebrations()
        .await
        .map_err(|e| ApiError::db("Failed to fetch celebrations", e))?;
    Ok(Json(celebrations))
}

pub async fn get_by_id(
    State(state): State<AppState>,
    Path(raw): Path<String>,
) -> Result<Json<Celebration>, ApiError> {
    let id = parse_id(&raw, "celebration")?;

    state
        .store
        .celebration_by_id(id)
        .await
        .map_err(|e| ApiError::db("Failed to fetch celebration", e))?
        .map(Json)
        .ok_or_else(|| ApiError::not_found(NOT_FOUND))
}

pub async fn create(
    State(state): State<AppState>,
    WithRejection(Json(req), _): WithRejection<Json<CelebrationRequest>, ApiError>,
) -> Result<(StatusCode, Json<Celebration>), ApiError> {
    let (Some(title), Some(raw_slug)) = (non_blank(req.title), non_blank(req.slug)) else {
        return Err(ApiError::bad_request("Title and slug are required"));
    };
    let slug = slug::normalize(&raw_slug).map_err(slug_error)?;

    let taken = state
        .store
        .slug_taken(&slug, None)
        .await
        .map_err(|e| ApiError::db("Failed to create celebration", e))?;
    if taken {
        warn!("Rejected duplicate slug {}", slug);
        return Err(ApiError::bad_request(SLUG_TAKEN));
    }

    let new = NewCelebration {
        title,
        subtitle: req.subtitle,
        slug,
        event_type: non_blank(req.event_type).unwrap_or_else(|| DEFAULT_EVENT_TYPE.to_string()),
        event_date: req.event_date,
        story: req.story,
        cover_image: req.cover_image,
        images: req.images.unwrap_or_default(),
        videos: req.videos.unwrap_or_default(),
        qr_image: req.qr_image,
        spotify_code: req.spotify_code,
        money_collection_enabled: req.money_collection_enabled.unwrap_or(false),
        theme: req.theme.unwrap_or_default(),
        sections: req.sections.unwrap_or_default(),
        quotes: req.quotes.unwrap_or_default(),
    };

    let celebration = state
        .store
        .insert_celebration(&new)
        .await
        .map_err(|e| write_error("Failed to create celebration", e))?;

    info!("Created celebration {} ({})", celebration.id, celebration.slug);
    Ok((StatusCode::CREATED, Json(celebration)))
}

pub async fn update(
    State(state): State<AppState>,
    Path(raw): Path<String>,
    WithRejection(Json(req), _): WithRejection<Json<CelebrationRequest>, ApiError>,
) -> Result<Json<Celebration>, ApiError> {
    let id = parse_id(&raw, "celebration")?;

    // A blank slug means "leave it alone", not "clear it".
    let slug = match non_blank(req.slug) {
        Some(raw_slug) => Some(slug::normalize(&raw_slug).map_err(slug_error)?),
        None => None,
    };

    if let Some(slug) = &slug {
        let taken = state
            .store
            .slug_taken(slug, Some(id))
            .await
            .map_err(|e| ApiError::db("Failed to update celebration", e))?;
        if taken {
            warn!("Rejected duplicate slug {} for celebration {}", slug, id);
            return Err(ApiError::bad_request(SLUG_TAKEN));
        }
    }

    let changes = CelebrationChanges {
        title: req.title,
        subtitle: req.subtitle,
        slug,
        event_type: req.event_type,
        event_date: req.event_date,
        story: req.story,
        cover_image: req.cover_image,
        images: req.images,
        videos: req.videos,
        qr_image: req.qr_image,
        spotify_code: req.spotify_code,
        money_collection_enabled: req.money_collection_enabled,
        theme: req.theme,
        sections: req.sections,
        quotes: req.quotes,
    };

    let celebration = state
        .store
        .update_celebration(id, &changes)
        .await
        .map_err(|e| write_error("Failed to update celebration", e))?
        .ok_or_else(|| ApiError::not_found(NOT_FOUND))?;

    info!("Updated celebration {}", id);
    Ok(Json(celebration))
}

/// Removes hosted media first (best effort), then the row and its wishes.
pub async fn delete(
    State(state): State<AppState>,
    Path(raw): Path<String>,
) -> Result<Json<DeleteCelebrationResponse>, ApiError> {
    let id = parse_id(&raw, "celebration")?;

    let celebration = state
        .store
        .celebration_by_id(id)
        .await
        .map_err(|e| ApiError::db("Failed to delete celebration", e))?
        .ok_or_else(|| ApiError::not_found(NOT_FOUND))?;

    let urls = celebration.media_urls();
    let media_cleanup = match &state.media {
        Some(host) => media::cleanup(&**host, &urls).await,
        None => {
            if !urls.is_empty() {
                warn!(
                    "Media host not configured; leaving {} assets of celebration {} in place",
                    urls.len(),
                    id
                );
            }
            MediaCleanupReport {
                skipped: urls.len(),
                ..Default::default()
            }
        }
    };

    let deleted = state
        .store
        .delete_celebration(id)
        .await
        .map_err(|e| ApiError::db("Failed to delete celebration", e))?;
    if !deleted {
        return Err(ApiError::not_found(NOT_FOUND));
    }

    info!(
        "Deleted celebration {} (media: {} deleted, {} failed, {} skipped)",
        id, media_cleanup.deleted, media_cleanup.failed, media_cleanup.skipped
    );
    Ok(Json(DeleteCelebrationResponse {
        message: "Celebration deleted successfully".to_string(),
        media_cleanup,
    }))
}
