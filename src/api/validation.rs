use super::ApiError;
use crate::models::FieldErrors;

/// Ids in paths are positive; anything else cannot name a row.
pub fn validate_id(id: i32, resource: &str) -> Result<i32, ApiError> {
    if id <= 0 {
        return Err(ApiError::not_found(resource, id));
    }
    Ok(id)
}

/// Parses `recipes_limit`. Absent or empty means no cap.
pub fn parse_recipes_limit(raw: Option<&str>) -> Result<Option<usize>, ApiError> {
    let Some(raw) = raw.map(str::trim).filter(|s| !s.is_empty()) else {
        return Ok(None);
    };

    raw.parse::<usize>().map(Some).map_err(|_| {
        ApiError::FieldErrors(FieldErrors::single(
            "recipes_limit",
            "A non-negative integer is required.",
        ))
    })
}
