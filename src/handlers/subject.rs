// src/handlers/subject.rs

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use serde_json::json;
use sqlx::PgPool;
use validator::Validate;

use crate::{
    error::AppError,
    models::subject::{CreateSubjectRequest, Subject, SubjectListParams},
};

/// Lists subjects, optionally filtered by branch and semester.
pub async fn get_subjects(
    State(pool): State<PgPool>,
    Query(params): Query<SubjectListParams>,
) -> Result<impl IntoResponse, AppError> {
    let subjects = sqlx::query_as::<_, Subject>(
        r#"
        SELECT id, name, code, branch, semester, created_at
        FROM subjects
        WHERE ($1::TEXT IS NULL OR branch = $1)
          AND ($2::BIGINT IS NULL OR semester = $2)
        ORDER BY semester, name
        "#,
    )
    .bind(&params.branch)
    .bind(params.semester)
    .fetch_all(&pool)
    .await?;

    Ok(Json(json!({ "success": true, "subjects": subjects })))
}

/// Creates a new subject.
/// Admin only.
pub async fn add_subject(
    State(pool): State<PgPool>,
    Json(payload): Json<CreateSubjectRequest>,
) -> Result<impl IntoResponse, AppError> {
    if let Err(validation_errors) = payload.validate() {
        return Err(AppError::BadRequest(validation_errors.to_string()));
    }

    let subject = sqlx::query_as::<_, Subject>(
        r#"
        INSERT INTO subjects (name, code, branch, semester)
        VALUES ($1, $2, $3, $4)
        RETURNING id, name, code, branch, semester, created_at
        "#,
    )
    .bind(&payload.name)
    .bind(&payload.code)
    .bind(&payload.branch)
    .bind(payload.semester)
    .fetch_one(&pool)
    .await
    .map_err(|e| {
        tracing::error!("Failed to create subject: {:?}", e);
        AppError::InternalServerError(e.to_string())
    })?;

    Ok((
        StatusCode::CREATED,
        Json(json!({ "success": true, "subject": subject })),
    ))
}

/// Deletes a subject by ID.
/// Admin only.
pub async fn delete_subject(
    State(pool): State<PgPool>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let result = sqlx::query("DELETE FROM subjects WHERE id = $1")
        .bind(id)
        .execute(&pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to delete subject: {:?}", e);
            AppError::InternalServerError(e.to_string())
        })?;

    if result.rows_affected() == 0 {
        return Err(AppError::NotFound("Subject not found".to_string()));
    }

    Ok(Json(json!({ "success": true, "message": "Subject deleted" })))
}
