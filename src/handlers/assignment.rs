// src/handlers/assignment.rs

use axum::{
    Extension, Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use serde_json::json;
use sqlx::PgPool;
use validator::Validate;

use crate::{
    error::AppError,
    models::assignment::{
        Assignment, AssignmentListParams, AssignmentSubmission, CreateAssignmentRequest,
        EvaluateSubmissionRequest, SUBMISSION_EVALUATED, SubmitAssignmentRequest,
    },
    models::quiz::ASSESSMENT_TYPES,
    models::user::{ROLE_ADMIN, ROLE_STUDENT},
    utils::jwt::Claims,
};

/// Creates a new assignment.
/// Faculty only.
pub async fn create_assignment(
    State(pool): State<PgPool>,
    Extension(claims): Extension<Claims>,
    Json(payload): Json<CreateAssignmentRequest>,
) -> Result<impl IntoResponse, AppError> {
    if let Err(validation_errors) = payload.validate() {
        return Err(AppError::BadRequest(validation_errors.to_string()));
    }

    if !ASSESSMENT_TYPES.contains(&payload.assessment_type.as_str()) {
        return Err(AppError::BadRequest(format!(
            "Unknown assessment type '{}'",
            payload.assessment_type
        )));
    }

    let assignment = sqlx::query_as::<_, Assignment>(
        r#"
        INSERT INTO assignments
        (title, description, subject, branch, semester, due_date, total_marks, assessment_type, created_by)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
        RETURNING id, title, description, subject, branch, semester, due_date,
                  total_marks, assessment_type, created_by, created_at
        "#,
    )
    .bind(&payload.title)
    .bind(&payload.description)
    .bind(&payload.subject)
    .bind(&payload.branch)
    .bind(payload.semester)
    .bind(payload.due_date)
    .bind(payload.total_marks)
    .bind(&payload.assessment_type)
    .bind(claims.user_id())
    .fetch_one(&pool)
    .await
    .map_err(|e| {
        tracing::error!("Failed to create assignment: {:?}", e);
        AppError::InternalServerError(e.to_string())
    })?;

    Ok((
        StatusCode::CREATED,
        Json(json!({ "success": true, "assignment": assignment })),
    ))
}

/// Lists assignments, optionally filtered by branch/semester/subject.
pub async fn get_assignments(
    State(pool): State<PgPool>,
    Query(params): Query<AssignmentListParams>,
) -> Result<impl IntoResponse, AppError> {
    let assignments = sqlx::query_as::<_, Assignment>(
        r#"
        SELECT id, title, description, subject, branch, semester, due_date,
               total_marks, assessment_type, created_by, created_at
        FROM assignments
        WHERE ($1::TEXT IS NULL OR branch = $1)
          AND ($2::BIGINT IS NULL OR semester = $2)
          AND ($3::TEXT IS NULL OR subject = $3)
        ORDER BY due_date DESC
        "#,
    )
    .bind(&params.branch)
    .bind(params.semester)
    .bind(&params.subject)
    .fetch_all(&pool)
    .await?;

    Ok(Json(json!({ "success": true, "assignments": assignments })))
}

/// Student hands in work for an assignment.
///
/// Re-submitting before evaluation replaces the stored file; a graded
/// submission is frozen.
pub async fn submit_assignment(
    State(pool): State<PgPool>,
    Extension(claims): Extension<Claims>,
    Path(assignment_id): Path<i64>,
    Json(payload): Json<SubmitAssignmentRequest>,
) -> Result<impl IntoResponse, AppError> {
    if let Err(validation_errors) = payload.validate() {
        return Err(AppError::BadRequest(validation_errors.to_string()));
    }

    if claims.role != ROLE_STUDENT {
        return Err(AppError::Forbidden(
            "Only students can submit assignments".to_string(),
        ));
    }

    // Assignment must exist.
    sqlx::query_scalar::<_, i64>("SELECT id FROM assignments WHERE id = $1")
        .bind(assignment_id)
        .fetch_optional(&pool)
        .await?
        .ok_or(AppError::NotFound("Assignment not found".to_string()))?;

    let existing = sqlx::query_as::<_, AssignmentSubmission>(
        r#"
        SELECT id, assignment_id, student_id, file_url, submitted_at, status, marks, feedback
        FROM assignment_submissions
        WHERE assignment_id = $1 AND student_id = $2
        "#,
    )
    .bind(assignment_id)
    .bind(claims.user_id())
    .fetch_optional(&pool)
    .await?;

    if let Some(existing) = &existing {
        if existing.status == SUBMISSION_EVALUATED {
            return Err(AppError::Conflict(
                "Submission has already been evaluated".to_string(),
            ));
        }
    }

    let submission = sqlx::query_as::<_, AssignmentSubmission>(
        r#"
        INSERT INTO assignment_submissions (assignment_id, student_id, file_url, status)
        VALUES ($1, $2, $3, 'Submitted')
        ON CONFLICT (assignment_id, student_id) DO UPDATE SET
            file_url = EXCLUDED.file_url,
            submitted_at = CURRENT_TIMESTAMP
        RETURNING id, assignment_id, student_id, file_url, submitted_at, status, marks, feedback
        "#,
    )
    .bind(assignment_id)
    .bind(claims.user_id())
    .bind(&payload.file_url)
    .fetch_one(&pool)
    .await
    .map_err(|e| {
        tracing::error!("Failed to submit assignment: {:?}", e);
        AppError::InternalServerError(e.to_string())
    })?;

    Ok((
        StatusCode::CREATED,
        Json(json!({ "success": true, "submission": submission })),
    ))
}

/// Grades a submission with marks and feedback.
/// Only the assignment's author (or an admin) may evaluate.
pub async fn evaluate_submission(
    State(pool): State<PgPool>,
    Extension(claims): Extension<Claims>,
    Path(submission_id): Path<i64>,
    Json(payload): Json<EvaluateSubmissionRequest>,
) -> Result<impl IntoResponse, AppError> {
    if let Err(validation_errors) = payload.validate() {
        return Err(AppError::BadRequest(validation_errors.to_string()));
    }

    let row = sqlx::query_as::<_, AssignmentSubmission>(
        r#"
        SELECT id, assignment_id, student_id, file_url, submitted_at, status, marks, feedback
        FROM assignment_submissions
        WHERE id = $1
        "#,
    )
    .bind(submission_id)
    .fetch_optional(&pool)
    .await?
    .ok_or(AppError::NotFound("Submission not found".to_string()))?;

    let assignment = sqlx::query_as::<_, Assignment>(
        r#"
        SELECT id, title, description, subject, branch, semester, due_date,
               total_marks, assessment_type, created_by, created_at
        FROM assignments
        WHERE id = $1
        "#,
    )
    .bind(row.assignment_id)
    .fetch_optional(&pool)
    .await?
    .ok_or(AppError::NotFound("Assignment not found".to_string()))?;

    if assignment.created_by != claims.user_id() && claims.role != ROLE_ADMIN {
        return Err(AppError::Forbidden(
            "Only the assignment author can evaluate submissions".to_string(),
        ));
    }

    if payload.marks > assignment.total_marks {
        return Err(AppError::BadRequest(format!(
            "Marks cannot exceed the assignment total of {}",
            assignment.total_marks
        )));
    }

    let submission = sqlx::query_as::<_, AssignmentSubmission>(
        r#"
        UPDATE assignment_submissions
        SET marks = $1, feedback = $2, status = 'Evaluated'
        WHERE id = $3
        RETURNING id, assignment_id, student_id, file_url, submitted_at, status, marks, feedback
        "#,
    )
    .bind(payload.marks)
    .bind(&payload.feedback)
    .bind(submission_id)
    .fetch_one(&pool)
    .await?;

    Ok(Json(json!({ "success": true, "submission": submission })))
}

/// Lists all submissions for an assignment.
/// Only the assignment's author (or an admin).
pub async fn get_submissions(
    State(pool): State<PgPool>,
    Extension(claims): Extension<Claims>,
    Path(assignment_id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let created_by =
        sqlx::query_scalar::<_, i64>("SELECT created_by FROM assignments WHERE id = $1")
            .bind(assignment_id)
            .fetch_optional(&pool)
            .await?
            .ok_or(AppError::NotFound("Assignment not found".to_string()))?;

    if created_by != claims.user_id() && claims.role != ROLE_ADMIN {
        return Err(AppError::Forbidden(
            "Only the assignment author can view submissions".to_string(),
        ));
    }

    let submissions = sqlx::query_as::<_, AssignmentSubmission>(
        r#"
        SELECT id, assignment_id, student_id, file_url, submitted_at, status, marks, feedback
        FROM assignment_submissions
        WHERE assignment_id = $1
        ORDER BY submitted_at
        "#,
    )
    .bind(assignment_id)
    .fetch_all(&pool)
    .await?;

    Ok(Json(json!({ "success": true, "submissions": submissions })))
}
