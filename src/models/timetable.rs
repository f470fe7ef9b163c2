// src/models/timetable.rs

use serde::{Deserialize, Serialize};
use sqlx::prelude::FromRow;
use url::Url;
use validator::Validate;

/// Represents the 'timetables' table. One row per branch + semester; adding
/// again replaces the stored link.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Timetable {
    pub id: i64,
    pub branch: String,
    pub semester: i64,

    /// URL of the published timetable document/image.
    pub link: String,

    pub created_at: Option<chrono::DateTime<chrono::Utc>>,
}

/// DTO for publishing a timetable.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateTimetableRequest {
    #[validate(length(min = 1, max = 100))]
    pub branch: String,
    #[validate(range(min = 1, max = 8))]
    pub semester: i64,
    #[validate(length(min = 1, max = 500), custom(function = validate_url_string))]
    pub link: String,
}

/// Validates that a string is a correctly formatted URL.
pub fn validate_url_string(url: &str) -> Result<(), validator::ValidationError> {
    if Url::parse(url).is_err() {
        return Err(validator::ValidationError::new("invalid_url"));
    }
    Ok(())
}

/// Query parameters for fetching timetables.
#[derive(Debug, Deserialize)]
pub struct TimetableListParams {
    pub branch: Option<String>,
    pub semester: Option<i64>,
}
