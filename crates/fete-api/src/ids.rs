use crate::error::ApiError;

/// Placeholder values front-ends send when a route renders before its data.
const RESERVED: &[&str] = &["", "undefined", "null", "new"];

/// Parse a path id, rejecting anything that isn't a positive `i32` with a 400
/// that echoes the raw value.
pub fn parse_id(raw: &str, entity: &str) -> Result<i32, ApiError> {
    let trimmed = raw.trim();

    if RESERVED.iter().any(|r| trimmed.eq_ignore_ascii_case(r)) {
        return Err(ApiError::InvalidId {
            message: format!("Invalid {entity} ID"),
            received: raw.to_string(),
        });
    }

    match trimmed.parse::<i32>() {
        Ok(id) if id > 0 && trimmed.bytes().all(|b| b.is_ascii_digit()) => Ok(id),
        _ => Err(ApiError::InvalidId {
            message: format!("Invalid {entity} ID: must be a positive integer"),
            received: raw.to_string(),
        }),
    }
}
