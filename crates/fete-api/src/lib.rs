//! HTTP layer: axum handlers for the public celebration pages and the admin
//! API, plus the middleware they run behind.

pub mod auth;
pub mod celebrations;
pub mod cors;
pub mod error;
pub mod ids;
pub mod media;
pub mod middleware;
pub mod rate_limit;
pub mod routes;
pub mod slug;
pub mod state;
pub mod uploads;
pub mod wishes;

#[cfg(test)]
mod test_support;

pub use error::ApiError;
pub use routes::{api_router, app};
pub use state::{AppState, AppStateInner};
