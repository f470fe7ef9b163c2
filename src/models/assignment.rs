// src/models/assignment.rs

use serde::{Deserialize, Serialize};
use sqlx::prelude::FromRow;
use validator::Validate;

use crate::models::timetable::validate_url_string;

pub const SUBMISSION_SUBMITTED: &str = "Submitted";
pub const SUBMISSION_EVALUATED: &str = "Evaluated";

/// Represents the 'assignments' table in the database.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Assignment {
    pub id: i64,
    pub title: String,
    pub description: String,
    pub subject: String,
    pub branch: String,
    pub semester: i64,
    pub due_date: chrono::DateTime<chrono::Utc>,
    pub total_marks: i64,

    /// 'ISA1', 'ISA2', 'ESA' or 'Other'.
    pub assessment_type: String,

    pub created_by: i64,
    pub created_at: Option<chrono::DateTime<chrono::Utc>>,
}

/// Represents the 'assignment_submissions' table. One per (assignment,
/// student); re-submission before evaluation replaces the file.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssignmentSubmission {
    pub id: i64,
    pub assignment_id: i64,
    pub student_id: i64,

    /// Location of the uploaded file on the media host.
    pub file_url: String,

    pub submitted_at: chrono::DateTime<chrono::Utc>,

    /// 'Submitted' or 'Evaluated'.
    pub status: String,

    pub marks: Option<i64>,
    pub feedback: Option<String>,
}

/// DTO for creating an assignment.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateAssignmentRequest {
    #[validate(length(min = 1, max = 200))]
    pub title: String,
    #[validate(length(max = 2000))]
    pub description: String,
    #[validate(length(min = 1, max = 100))]
    pub subject: String,
    #[validate(length(min = 1, max = 100))]
    pub branch: String,
    #[validate(range(min = 1, max = 8))]
    pub semester: i64,
    pub due_date: chrono::DateTime<chrono::Utc>,
    #[validate(range(min = 1))]
    pub total_marks: i64,
    pub assessment_type: String,
}

/// DTO for a student handing in work.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct SubmitAssignmentRequest {
    #[validate(length(min = 1, max = 500), custom(function = validate_url_string))]
    pub file_url: String,
}

/// DTO for faculty grading a submission.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct EvaluateSubmissionRequest {
    #[validate(range(min = 0))]
    pub marks: i64,
    #[validate(length(max = 2000))]
    pub feedback: Option<String>,
}

/// Query parameters for listing assignments.
#[derive(Debug, Deserialize)]
pub struct AssignmentListParams {
    pub branch: Option<String>,
    pub semester: Option<i64>,
    pub subject: Option<String>,
}
