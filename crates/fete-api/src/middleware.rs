use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use axum_extra::headers::{Authorization, HeaderMapExt, authorization::Bearer};
use tracing::warn;

use crate::auth::verify_token;
use crate::error::ApiError;
use crate::state::AppState;

/// Validate the Bearer token, confirm the admin still exists, and insert the
/// `Admin` row into request extensions.
pub async fn require_admin(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let bearer = req
        .headers()
        .typed_get::<Authorization<Bearer>>()
        .ok_or(ApiError::Unauthorized("Authentication required"))?;

    let claims = verify_token(&state.jwt_secret, bearer.token())?;

    let admin = state
        .store
        .admin_by_id(claims.sub)
        .await
        .map_err(|e| ApiError::db("Authentication error", e))?
        .ok_or_else(|| {
            warn!("Token for admin {} no longer matches a row", claims.sub);
            ApiError::Unauthorized("Admin not found")
        })?;

    req.extensions_mut().insert(admin);
    Ok(next.run(req).await)
}
