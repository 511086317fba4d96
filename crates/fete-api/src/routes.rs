use std::sync::Arc;

use axum::{
    Json, Router,
    extract::DefaultBodyLimit,
    middleware,
    routing::{delete, get, patch, post},
};

use fete_types::api::HealthResponse;

use crate::error::{ApiError, expose_error_details};
use crate::middleware::require_admin;
use crate::rate_limit::{RateLimiter, rate_limit};
use crate::state::AppState;
use crate::uploads::{MAX_IMAGE_BYTES, MAX_VIDEO_BYTES, body_limit};
use crate::{auth, celebrations, uploads, wishes};

/// Every `/api` route. Public and admin routers are merged, so a path can
/// serve a public method and an admin-only one (`GET` vs `POST /wishes`).
pub fn api_router(state: AppState) -> Router {
    let public = Router::new()
        .route("/health", get(health))
        .route("/admin/login", post(auth::login))
        .route("/celebrations/slug/{slug}", get(celebrations::get_by_slug))
        .route(
            "/wishes/celebration/{celebration_id}",
            get(wishes::list_for_celebration),
        )
        .route("/wishes", post(wishes::create));

    let admin = Router::new()
        .route("/admin/me", get(auth::me))
        .route(
            "/celebrations",
            get(celebrations::list).post(celebrations::create),
        )
        .route(
            "/celebrations/{id}",
            get(celebrations::get_by_id)
                .put(celebrations::update)
                .delete(celebrations::delete),
        )
        .route("/wishes", get(wishes::list_all))
        .route("/wishes/{id}/approve", patch(wishes::approve))
        .route("/wishes/{id}", delete(wishes::delete))
        .route(
            "/upload/image",
            post(uploads::upload_image).layer(DefaultBodyLimit::max(body_limit(MAX_IMAGE_BYTES))),
        )
        .route(
            "/upload/video",
            post(uploads::upload_video).layer(DefaultBodyLimit::max(body_limit(MAX_VIDEO_BYTES))),
        )
        .route_layer(middleware::from_fn_with_state(state.clone(), require_admin));

    public.merge(admin).with_state(state)
}

/// The full application: `/api` behind the rate limiter, JSON 404s elsewhere.
pub fn app(state: AppState, limiter: Arc<RateLimiter>, expose_details: bool) -> Router {
    let api = api_router(state).layer(middleware::from_fn_with_state(limiter, rate_limit));

    let router = Router::new().nest("/api", api).fallback(not_found);

    if expose_details {
        router.layer(middleware::from_fn(expose_error_details))
    } else {
        router
    }
}

async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        message: "Fete API is running".to_string(),
    })
}

async fn not_found() -> ApiError {
    ApiError::not_found("Route not found")
}
