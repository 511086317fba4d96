use std::sync::Arc;

use axum::http::{HeaderValue, Method, header};
use tower_http::cors::{AllowOrigin, CorsLayer};

/// Allowlisted origins, plus any local dev server when `development` is set.
pub fn origin_allowed(origin: &str, allowed: &[String], development: bool) -> bool {
    if allowed.iter().any(|a| a == origin) {
        return true;
    }
    development && is_local_origin(origin)
}

fn is_local_origin(origin: &str) -> bool {
    ["http://localhost", "http://127.0.0.1"]
        .iter()
        .any(|prefix| match origin.strip_prefix(prefix) {
            Some("") => true,
            Some(rest) => rest
                .strip_prefix(':')
                .is_some_and(|port| !port.is_empty() && port.bytes().all(|b| b.is_ascii_digit())),
            None => false,
        })
}

pub fn cors_layer(allowed: Vec<String>, development: bool) -> CorsLayer {
    let allowed = Arc::new(allowed);
    CorsLayer::new()
        .allow_origin(AllowOrigin::predicate(
            move |origin: &HeaderValue, _request| {
                origin
                    .to_str()
                    .is_ok_and(|o| origin_allowed(o, &allowed, development))
            },
        ))
        .allow_credentials(true)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
}

#[cfg(test)]
mod tests {
    use super::*;

    fn allowlist() -> Vec<String> {
        vec!["https://fete.example.com".to_string()]
    }

    #[test]
    fn allowlisted_origin_passes_everywhere() {
        assert!(origin_allowed("https://fete.example.com", &allowlist(), false));
        assert!(origin_allowed("https://fete.example.com", &allowlist(), true));
    }

    #[test]
    fn localhost_only_in_development() {
        for origin in ["http://localhost:5173", "http://127.0.0.1:3000", "http://localhost"] {
            assert!(origin_allowed(origin, &allowlist(), true), "{origin}");
            assert!(!origin_allowed(origin, &allowlist(), false), "{origin}");
        }
    }

    #[test]
    fn lookalike_hosts_are_rejected() {
        for origin in [
            "http://localhost.evil.com",
            "http://localhost:80.evil.com",
            "https://localhost:3000",
            "https://evil.example.com",
        ] {
            assert!(!origin_allowed(origin, &allowlist(), true), "{origin}");
        }
    }
}
