use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use axum_extra::extract::WithRejection;
use tracing::{info, warn};

use fete_db::{AmountError, DbError, NewWish, check_amount};
use fete_types::api::{CreateWishRequest, MessageResponse};
use fete_types::models::{Wish, WishWithCelebration};

use crate::error::ApiError;
use crate::ids::parse_id;
use crate::state::AppState;

const CELEBRATION_NOT_FOUND: &str = "Celebration not found";
const WISH_NOT_FOUND: &str = "Wish not found";
const AMOUNT_TOO_LARGE: &str = "Amount must be less than 100,000,000";

fn amount_error(e: AmountError) -> ApiError {
    ApiError::bad_request(match e {
        AmountError::Negative => "Amount cannot be negative",
        AmountError::TooLarge => AMOUNT_TOO_LARGE,
        AmountError::TooPrecise => "Amount cannot have more than two decimal places",
    })
}

// -- Public --

/// Approved wishes only; unapproved ones never leave the admin API.
pub async fn list_for_celebration(
    State(state): State<AppState>,
    Path(raw): Path<String>,
) -> Result<Json<Vec<Wish>>, ApiError> {
    let celebration_id = parse_id(&raw, "celebration")?;

    let wishes = state
        .store
        .approved_wishes(celebration_id)
        .await
        .map_err(|e| ApiError::db("Failed to fetch wishes", e))?;
    Ok(Json(wishes))
}

pub async fn create(
    State(state): State<AppState>,
    WithRejection(Json(req), _): WithRejection<Json<CreateWishRequest>, ApiError>,
) -> Result<(StatusCode, Json<Wish>), ApiError> {
    let name = req.name.filter(|n| !n.trim().is_empty());
    let message = req.message.filter(|m| !m.trim().is_empty());
    let (Some(celebration_id), Some(name), Some(message)) = (req.celebration_id, name, message)
    else {
        return Err(ApiError::bad_request(
            "Celebration ID, name, and message are required",
        ));
    };

    if let Some(amount) = req.amount {
        check_amount(amount).map_err(amount_error)?;
    }

    let exists = state
        .store
        .celebration_exists(celebration_id)
        .await
        .map_err(|e| ApiError::db("Failed to create wish", e))?;
    if !exists {
        return Err(ApiError::not_found(CELEBRATION_NOT_FOUND));
    }

    let new = NewWish {
        celebration_id,
        name,
        message,
        amount: req.amount,
    };

    // The page can vanish between the check and the insert.
    let wish = state.store.insert_wish(&new).await.map_err(|e| match e {
        DbError::MissingReference => ApiError::not_found(CELEBRATION_NOT_FOUND),
        DbError::OutOfRange => ApiError::bad_request(AMOUNT_TOO_LARGE),
        other => ApiError::db("Failed to create wish", other),
    })?;

    info!("New wish {} for celebration {} awaiting approval", wish.id, celebration_id);
    Ok((StatusCode::CREATED, Json(wish)))
}

// -- Admin --

pub async fn list_all(
    State(state): State<AppState>,
) -> Result<Json<Vec<WishWithCelebration>>, ApiError> {
    let wishes = state
        .store
        .list_wishes()
        .await
        .map_err(|e| ApiError::db("Failed to fetch wishes", e))?;
    Ok(Json(wishes))
}

pub async fn approve(
    State(state): State<AppState>,
    Path(raw): Path<String>,
) -> Result<Json<Wish>, ApiError> {
    let id = parse_id(&raw, "wish")?;

    let wish = state
        .store
        .approve_wish(id)
        .await
        .map_err(|e| ApiError::db("Failed to approve wish", e))?
        .ok_or_else(|| ApiError::not_found(WISH_NOT_FOUND))?;

    info!("Approved wish {}", id);
    Ok(Json(wish))
}

pub async fn delete(
    State(state): State<AppState>,
    Path(raw): Path<String>,
) -> Result<Json<MessageResponse>, ApiError> {
    let id = parse_id(&raw, "wish")?;

    let deleted = state
        .store
        .delete_wish(id)
        .await
        .map_err(|e| ApiError::db("Failed to delete wish", e))?;
    if !deleted {
        warn!("Delete requested for missing wish {}", id);
        return Err(ApiError::not_found(WISH_NOT_FOUND));
    }

    info!("Deleted wish {}", id);
    Ok(Json(MessageResponse::new("Wish deleted successfully")))
}
