use argon2::{
    Argon2, PasswordHash, PasswordHasher, PasswordVerifier,
    password_hash::{SaltString, rand_core::OsRng},
};
use axum::{Extension, Json, extract::State};
use axum_extra::extract::WithRejection;
use jsonwebtoken::{
    DecodingKey, EncodingKey, Header, Validation, decode, encode, errors::ErrorKind,
};
use tracing::{info, warn};

use fete_types::api::{AdminSummary, Claims, LoginRequest, LoginResponse};
use fete_types::models::Admin;

use crate::error::ApiError;
use crate::state::AppState;

/// Admin sessions last a week.
const TOKEN_LIFETIME_DAYS: i64 = 7;

pub async fn login(
    State(state): State<AppState>,
    WithRejection(Json(req), _): WithRejection<Json<LoginRequest>, ApiError>,
) -> Result<Json<LoginResponse>, ApiError> {
    let (Some(email), Some(password)) = (
        req.email.filter(|e| !e.is_empty()),
        req.password.filter(|p| !p.is_empty()),
    ) else {
        return Err(ApiError::bad_request("Email and password are required"));
    };

    let admin = state
        .store
        .admin_credentials(&email)
        .await
        .map_err(|e| ApiError::db("Login failed", e))?;

    let Some(admin) = admin else {
        warn!("Login attempt for unknown admin {}", email);
        return Err(ApiError::Unauthorized("Invalid credentials"));
    };

    if !verify_password(&password, &admin.password_hash)? {
        warn!("Wrong password for admin {}", email);
        return Err(ApiError::Unauthorized("Invalid credentials"));
    }

    let token = create_token(&state.jwt_secret, admin.id, &admin.email)
        .map_err(|e| ApiError::internal("Login failed", e))?;

    info!("Admin {} logged in", admin.email);
    Ok(Json(LoginResponse {
        token,
        admin: AdminSummary {
            id: admin.id,
            email: admin.email,
        },
    }))
}

pub async fn me(Extension(admin): Extension<Admin>) -> Json<Admin> {
    Json(admin)
}

pub fn create_token(
    secret: &str,
    admin_id: i32,
    email: &str,
) -> jsonwebtoken::errors::Result<String> {
    let claims = Claims {
        sub: admin_id,
        email: email.to_string(),
        exp: (chrono::Utc::now() + chrono::Duration::days(TOKEN_LIFETIME_DAYS)).timestamp()
            as usize,
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
}

pub fn verify_token(secret: &str, token: &str) -> Result<Claims, ApiError> {
    decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .map(|data| data.claims)
    .map_err(|e| match e.kind() {
        ErrorKind::ExpiredSignature => ApiError::Unauthorized("Token expired"),
        _ => ApiError::Unauthorized("Invalid token"),
    })
}

/// Argon2id with a random salt, PHC string output.
pub fn hash_password(password: &str) -> Result<String, argon2::password_hash::Error> {
    let salt = SaltString::generate(&mut OsRng);
    Ok(Argon2::default()
        .hash_password(password.as_bytes(), &salt)?
        .to_string())
}

/// Prefixes of the bcrypt hashes admin rows created by earlier deployments
/// still carry.
const BCRYPT_PREFIXES: [&str; 3] = ["$2a$", "$2b$", "$2y$"];

/// Checks `password` against an Argon2 PHC string or a legacy bcrypt hash.
pub fn verify_password(password: &str, hash: &str) -> Result<bool, ApiError> {
    if BCRYPT_PREFIXES.iter().any(|prefix| hash.starts_with(prefix)) {
        return bcrypt::verify(password, hash).map_err(|e| ApiError::internal("Login failed", e));
    }

    let parsed =
        PasswordHash::new(hash).map_err(|e| ApiError::internal("Login failed", e))?;
    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok())
}
