//! Slug normalization. Admins often paste a full page URL into the slug
//! field, so the scheme and host are stripped before validating.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SlugError {
    #[error("Slug is required")]
    Empty,
    #[error("Slug can only contain lowercase letters, numbers, and hyphens")]
    InvalidCharacters,
}

/// Returns a slug matching `^[a-z0-9-]+$`, or why the input can't become one.
pub fn normalize(raw: &str) -> Result<String, SlugError> {
    let mut s = strip_origin(raw.trim());
    if let Some(rest) = s.strip_prefix('/') {
        s = rest;
    }
    let slug = s.trim().to_lowercase();

    if slug.is_empty() {
        return Err(SlugError::Empty);
    }
    if !slug.bytes().all(is_slug_byte) {
        return Err(SlugError::InvalidCharacters);
    }
    Ok(slug)
}

fn is_slug_byte(b: u8) -> bool {
    b.is_ascii_lowercase() || b.is_ascii_digit() || b == b'-'
}

/// Drop a leading `http://host` or `https://host`.
fn strip_origin(s: &str) -> &str {
    let Some(after_scheme) = s
        .strip_prefix("https://")
        .or_else(|| s.strip_prefix("http://"))
    else {
        return s;
    };

    match after_scheme.find('/') {
        // `https://` alone has no host to strip.
        Some(0) => s,
        Some(i) => &after_scheme[i..],
        None if after_scheme.is_empty() => s,
        None => "",
    }
}
