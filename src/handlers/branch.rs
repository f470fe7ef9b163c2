// src/handlers/branch.rs

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use serde_json::json;
use sqlx::PgPool;
use validator::Validate;

use crate::{error::AppError, models::branch::{Branch, CreateBranchRequest}};

/// Lists all branches.
pub async fn get_branches(State(pool): State<PgPool>) -> Result<impl IntoResponse, AppError> {
    let branches = sqlx::query_as::<_, Branch>(
        r#"
        SELECT id, name, code, created_at
        FROM branches
        ORDER BY name
        "#,
    )
    .fetch_all(&pool)
    .await?;

    Ok(Json(json!({ "success": true, "branches": branches })))
}

/// Creates a new branch.
/// Admin only.
pub async fn add_branch(
    State(pool): State<PgPool>,
    Json(payload): Json<CreateBranchRequest>,
) -> Result<impl IntoResponse, AppError> {
    if let Err(validation_errors) = payload.validate() {
        return Err(AppError::BadRequest(validation_errors.to_string()));
    }

    let branch = sqlx::query_as::<_, Branch>(
        r#"
        INSERT INTO branches (name, code)
        VALUES ($1, $2)
        RETURNING id, name, code, created_at
        "#,
    )
    .bind(&payload.name)
    .bind(&payload.code)
    .fetch_one(&pool)
    .await
    .map_err(|e| {
        if e.to_string().contains("unique constraint") || e.to_string().contains("23505") {
            AppError::Conflict(format!("Branch '{}' already exists", payload.name))
        } else {
            tracing::error!("Failed to create branch: {:?}", e);
            AppError::InternalServerError(e.to_string())
        }
    })?;

    Ok((
        StatusCode::CREATED,
        Json(json!({ "success": true, "branch": branch })),
    ))
}

/// Deletes a branch by ID.
/// Admin only.
pub async fn delete_branch(
    State(pool): State<PgPool>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let result = sqlx::query("DELETE FROM branches WHERE id = $1")
        .bind(id)
        .execute(&pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to delete branch: {:?}", e);
            AppError::InternalServerError(e.to_string())
        })?;

    if result.rows_affected() == 0 {
        return Err(AppError::NotFound("Branch not found".to_string()));
    }

    Ok(Json(json!({ "success": true, "message": "Branch deleted" })))
}
