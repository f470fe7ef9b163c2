// src/models/notice.rs

use serde::{Deserialize, Serialize};
use sqlx::prelude::FromRow;
use validator::Validate;

pub const AUDIENCES: [&str; 3] = ["student", "faculty", "both"];

/// Represents the 'notices' table in the database.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Notice {
    pub id: i64,
    pub title: String,

    /// Rich-text body, sanitized on write.
    pub description: String,

    /// 'student', 'faculty' or 'both'.
    pub audience: String,

    pub link: Option<String>,
    pub created_at: Option<chrono::DateTime<chrono::Utc>>,
}

/// DTO for creating a notice.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateNoticeRequest {
    #[validate(length(min = 1, max = 200))]
    pub title: String,
    #[validate(length(min = 1, max = 20000))]
    pub description: String,
    #[validate(custom(function = validate_audience))]
    pub audience: String,
    #[validate(length(max = 500))]
    pub link: Option<String>,
}

/// DTO for updating a notice. Fields are optional.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateNoticeRequest {
    pub title: Option<String>,
    pub description: Option<String>,
    pub audience: Option<String>,
    pub link: Option<String>,
}

pub fn validate_audience(audience: &str) -> Result<(), validator::ValidationError> {
    if !AUDIENCES.contains(&audience) {
        return Err(validator::ValidationError::new("invalid_audience"));
    }
    Ok(())
}
