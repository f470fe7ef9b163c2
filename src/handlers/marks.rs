// src/handlers/marks.rs

use axum::{
    Extension, Json,
    extract::{Path, State},
    response::IntoResponse,
};
use serde_json::json;
use sqlx::PgPool;

use crate::{
    error::AppError,
    models::marks::{AddMarksRequest, MarkRow, group_marks, max_marks_for},
    models::user::ROLE_STUDENT,
    utils::jwt::Claims,
};

/// Uploads marks for one student and exam type, keyed by subject.
///
/// The whole payload is validated against the exam-type maximum before any
/// row is written, so a single out-of-range entry rejects the upload without
/// a partial write.
/// Faculty only.
pub async fn add_marks(
    State(pool): State<PgPool>,
    Extension(claims): Extension<Claims>,
    Json(payload): Json<AddMarksRequest>,
) -> Result<impl IntoResponse, AppError> {
    let max = max_marks_for(&payload.exam_type).ok_or_else(|| {
        AppError::BadRequest(format!("Unknown exam type '{}'", payload.exam_type))
    })?;

    if payload.marks.is_empty() {
        return Err(AppError::BadRequest("No marks submitted".to_string()));
    }

    for (subject, marks) in &payload.marks {
        if *marks < 0 || *marks > max {
            return Err(AppError::BadRequest(format!(
                "Marks for '{}' must be between 0 and {} for {}",
                subject, max, payload.exam_type
            )));
        }
    }

    // Target must exist and be a student.
    let role = sqlx::query_scalar::<_, String>("SELECT role FROM users WHERE id = $1")
        .bind(payload.student_id)
        .fetch_optional(&pool)
        .await?
        .ok_or(AppError::NotFound("Student not found".to_string()))?;

    if role != ROLE_STUDENT {
        return Err(AppError::BadRequest(
            "Marks can only be uploaded for students".to_string(),
        ));
    }

    for (subject, marks) in &payload.marks {
        sqlx::query(
            r#"
            INSERT INTO marks (student_id, subject, exam_type, marks, uploaded_by)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (student_id, subject, exam_type) DO UPDATE SET
                marks = EXCLUDED.marks,
                uploaded_by = EXCLUDED.uploaded_by,
                created_at = CURRENT_TIMESTAMP
            "#,
        )
        .bind(payload.student_id)
        .bind(subject)
        .bind(&payload.exam_type)
        .bind(marks)
        .bind(claims.user_id())
        .execute(&pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to upsert marks: {:?}", e);
            AppError::InternalServerError(e.to_string())
        })?;
    }

    Ok(Json(json!({
        "success": true,
        "message": "Marks uploaded"
    })))
}

/// Fetches a student's marks as a nested map: examType -> subject -> marks.
/// Students may only read their own; faculty and admin may read anyone's.
pub async fn get_marks(
    State(pool): State<PgPool>,
    Extension(claims): Extension<Claims>,
    Path(student_id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    if claims.role == ROLE_STUDENT && claims.user_id() != student_id {
        return Err(AppError::Forbidden(
            "Students can only view their own marks".to_string(),
        ));
    }

    let rows = sqlx::query_as::<_, MarkRow>(
        r#"
        SELECT id, student_id, subject, exam_type, marks, uploaded_by, created_at
        FROM marks
        WHERE student_id = $1
        "#,
    )
    .bind(student_id)
    .fetch_all(&pool)
    .await?;

    Ok(Json(json!({
        "success": true,
        "marks": group_marks(rows)
    })))
}
