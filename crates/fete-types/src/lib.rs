//! Shared models and wire types for the Fete backend.
//!
//! `models` mirrors what the store returns, `api` holds request and response
//! bodies specific to individual endpoints.

pub mod api;
pub mod models;
