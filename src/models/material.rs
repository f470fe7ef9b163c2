// src/models/material.rs

use serde::{Deserialize, Serialize};
use sqlx::prelude::FromRow;
use validator::Validate;

use crate::models::timetable::validate_url_string;

/// Represents the 'materials' table: study material links shared by faculty.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Material {
    pub id: i64,
    pub subject: String,
    pub title: String,
    pub link: String,
    pub faculty_id: i64,
    pub created_at: Option<chrono::DateTime<chrono::Utc>>,
}

/// DTO for sharing a material.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateMaterialRequest {
    #[validate(length(min = 1, max = 100))]
    pub subject: String,
    #[validate(length(min = 1, max = 200))]
    pub title: String,
    #[validate(length(min = 1, max = 500), custom(function = validate_url_string))]
    pub link: String,
}

/// Query parameters for listing materials.
#[derive(Debug, Deserialize)]
pub struct MaterialListParams {
    pub subject: Option<String>,
}
