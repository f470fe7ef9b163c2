// src/handlers/timetable.rs

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
    models::timetable::{CreateTimetableRequest, Timetable, TimetableListParams},
};

/// Lists timetables, optionally filtered by branch and semester.
pub async fn get_timetables(
    State(pool): State<PgPool>,
    Query(params): Query<TimetableListParams>,
) -> Result<impl IntoResponse, AppError> {
    let timetables = sqlx::query_as::<_, Timetable>(
        r#"
        SELECT id, branch, semester, link, created_at
        FROM timetables
        WHERE ($1::TEXT IS NULL OR branch = $1)
          AND ($2::BIGINT IS NULL OR semester = $2)
        ORDER BY branch, semester
        "#,
    )
    .bind(&params.branch)
    .bind(params.semester)
    .fetch_all(&pool)
    .await?;

    Ok(Json(json!({ "success": true, "timetables": timetables })))
}

/// Publishes a timetable for a branch + semester.
/// Upserts: re-publishing replaces the stored link.
/// Faculty/admin only.
pub async fn add_timetable(
    State(pool): State<PgPool>,
    Json(payload): Json<CreateTimetableRequest>,
) -> Result<impl IntoResponse, AppError> {
    if let Err(validation_errors) = payload.validate() {
        return Err(AppError::BadRequest(validation_errors.to_string()));
    }

    let timetable = sqlx::query_as::<_, Timetable>(
        r#"
        INSERT INTO timetables (branch, semester, link)
        VALUES ($1, $2, $3)
        ON CONFLICT (branch, semester) DO UPDATE SET
            link = EXCLUDED.link,
            created_at = CURRENT_TIMESTAMP
        RETURNING id, branch, semester, link, created_at
        "#,
    )
    .bind(&payload.branch)
    .bind(payload.semester)
    .bind(&payload.link)
    .fetch_one(&pool)
    .await
    .map_err(|e| {
        tracing::error!("Failed to upsert timetable: {:?}", e);
        AppError::InternalServerError(e.to_string())
    })?;

    Ok((
        StatusCode::CREATED,
        Json(json!({ "success": true, "timetable": timetable })),
    ))
}

/// Deletes a timetable by ID.
/// Faculty/admin only.
pub async fn delete_timetable(
    State(pool): State<PgPool>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let result = sqlx::query("DELETE FROM timetables WHERE id = $1")
        .bind(id)
        .execute(&pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(AppError::NotFound("Timetable not found".to_string()));
    }

    Ok(Json(json!({ "success": true, "message": "Timetable deleted" })))
}
