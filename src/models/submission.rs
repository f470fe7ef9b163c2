// src/models/submission.rs

use serde::{Deserialize, Serialize};
use sqlx::{prelude::FromRow, types::Json};
use uuid::Uuid;

pub const SUBMISSION_IN_PROGRESS: &str = "In Progress";
pub const SUBMISSION_COMPLETED: &str = "Completed";

/// Represents the 'quiz_submissions' table in the database.
/// Answers are embedded as a JSON array; the row is the unit of atomicity.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuizSubmission {
    pub id: i64,
    pub quiz_id: i64,
    pub student_id: i64,
    pub start_time: chrono::DateTime<chrono::Utc>,

    /// Server-enforced cutoff: start_time + quiz.duration. Answers arriving
    /// after this (plus a small grace window) are rejected and the
    /// submission is finalized.
    pub deadline: chrono::DateTime<chrono::Utc>,

    pub end_time: Option<chrono::DateTime<chrono::Utc>>,

    /// 'In Progress' or 'Completed'.
    pub status: String,

    pub answers: Json<Vec<Answer>>,

    /// Set once on completion; never recomputed afterwards.
    pub total_marks_obtained: Option<i64>,
}

/// A recorded answer. Keyed by question id; the selected option is referenced
/// by its stable id rather than by text, so option wording edits cannot
/// invalidate stored answers.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Answer {
    pub question_id: Uuid,
    pub selected_option_id: i64,
}

/// DTO for starting an attempt. The student is taken from the token.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StartAttemptRequest {
    pub quiz_id: i64,
}

/// DTO for recording one answer.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitAnswerRequest {
    pub question_id: Uuid,
    pub selected_option_id: i64,
}

/// Aggregate result figures for a completed submission.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResultSummary {
    pub total_questions: i64,
    pub answered_questions: i64,
    pub correct_answers: i64,
    pub total_marks_obtained: i64,
    pub percentage: f64,
}

/// Per-question breakdown row for the result screen.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DetailedResult {
    pub question_id: Uuid,
    pub text: String,
    pub options: Vec<crate::models::quiz::QuestionOption>,
    pub correct_option_id: Option<i64>,
    pub correct_answer: String,
    pub selected_option_id: Option<i64>,
    pub is_correct: bool,
    pub marks_obtained: i64,
    pub possible_marks: i64,
}
