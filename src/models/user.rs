// src/models/user.rs

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

pub const ROLE_STUDENT: &str = "student";
pub const ROLE_FACULTY: &str = "faculty";
pub const ROLE_ADMIN: &str = "admin";

/// Represents the 'users' table in the database.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: i64,

    /// Institution-issued login identifier (enrollment number or employee id).
    pub login_id: String,

    /// Argon2 password hash.
    /// Skipped during serialization to prevent leaking sensitive data.
    #[serde(skip)]
    pub password: String,

    /// User role: 'student', 'faculty' or 'admin'.
    pub role: String,

    pub name: String,

    pub email: String,

    /// Academic branch, set for students only.
    pub branch: Option<String>,

    /// Current semester, set for students only.
    pub semester: Option<i64>,

    /// Designation (e.g. "Assistant Professor"), set for faculty only.
    pub designation: Option<String>,

    pub created_at: Option<chrono::DateTime<chrono::Utc>>,
}

/// Aggregated profile data for the current user.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MeResponse {
    pub id: i64,
    pub login_id: String,
    pub role: String,
    pub name: String,
    pub email: String,
    pub branch: Option<String>,
    pub semester: Option<i64>,
    pub designation: Option<String>,
    pub created_at: Option<chrono::DateTime<chrono::Utc>>,
    /// For students: quiz attempts; for faculty: quizzes created.
    pub quiz_count: i64,
    /// For students: assignment submissions; for faculty: assignments created.
    pub assignment_count: i64,
}

/// DTO for self-registration. Only student and faculty accounts can be
/// created this way; admins are seeded or created through the admin panel.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    #[validate(length(
        min = 3,
        max = 50,
        message = "Login id length must be between 3 and 50 characters."
    ))]
    pub login_id: String,
    #[validate(length(
        min = 4,
        max = 128,
        message = "Password length must be between 4 and 128 characters."
    ))]
    pub password: String,
    #[validate(custom(function = validate_registration_role))]
    pub role: String,
    #[validate(length(min = 1, max = 100))]
    pub name: String,
    #[validate(email)]
    pub email: String,
    pub branch: Option<String>,
    #[validate(range(min = 1, max = 8))]
    pub semester: Option<i64>,
    pub designation: Option<String>,
}

fn validate_registration_role(role: &str) -> Result<(), validator::ValidationError> {
    if role != ROLE_STUDENT && role != ROLE_FACULTY {
        return Err(validator::ValidationError::new("invalid_role"));
    }
    Ok(())
}

/// DTO for user login. The role is checked against the stored account so a
/// student cannot sign in through the faculty form and vice versa.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequest {
    #[validate(length(min = 1, max = 50))]
    pub login_id: String,
    #[validate(length(min = 1, max = 128))]
    pub password: String,
    #[validate(length(min = 1, max = 20))]
    pub role: String,
}

/// DTO for profile self-update. Fields are optional.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProfileRequest {
    #[validate(length(min = 1, max = 100))]
    pub name: Option<String>,
    #[validate(email)]
    pub email: Option<String>,
    #[validate(length(min = 4, max = 128))]
    pub password: Option<String>,
}
