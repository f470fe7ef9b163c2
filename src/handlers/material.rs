// src/handlers/material.rs

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
    models::material::{CreateMaterialRequest, Material, MaterialListParams},
    models::user::ROLE_ADMIN,
    utils::jwt::Claims,
};

/// Lists study materials, optionally filtered by subject.
pub async fn get_materials(
    State(pool): State<PgPool>,
    Query(params): Query<MaterialListParams>,
) -> Result<impl IntoResponse, AppError> {
    let materials = sqlx::query_as::<_, Material>(
        r#"
        SELECT id, subject, title, link, faculty_id, created_at
        FROM materials
        WHERE ($1::TEXT IS NULL OR subject = $1)
        ORDER BY created_at DESC
        "#,
    )
    .bind(&params.subject)
    .fetch_all(&pool)
    .await?;

    Ok(Json(json!({ "success": true, "materials": materials })))
}

/// Shares a study material link.
/// Faculty only.
pub async fn add_material(
    State(pool): State<PgPool>,
    Extension(claims): Extension<Claims>,
    Json(payload): Json<CreateMaterialRequest>,
) -> Result<impl IntoResponse, AppError> {
    if let Err(validation_errors) = payload.validate() {
        return Err(AppError::BadRequest(validation_errors.to_string()));
    }

    let material = sqlx::query_as::<_, Material>(
        r#"
        INSERT INTO materials (subject, title, link, faculty_id)
        VALUES ($1, $2, $3, $4)
        RETURNING id, subject, title, link, faculty_id, created_at
        "#,
    )
    .bind(&payload.subject)
    .bind(&payload.title)
    .bind(&payload.link)
    .bind(claims.user_id())
    .fetch_one(&pool)
    .await
    .map_err(|e| {
        tracing::error!("Failed to create material: {:?}", e);
        AppError::InternalServerError(e.to_string())
    })?;

    Ok((
        StatusCode::CREATED,
        Json(json!({ "success": true, "material": material })),
    ))
}

/// Deletes a material by ID. Only the sharing faculty member (or an admin)
/// may remove it.
pub async fn delete_material(
    State(pool): State<PgPool>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let owner = sqlx::query_scalar::<_, i64>("SELECT faculty_id FROM materials WHERE id = $1")
        .bind(id)
        .fetch_optional(&pool)
        .await?
        .ok_or(AppError::NotFound("Material not found".to_string()))?;

    if owner != claims.user_id() && claims.role != ROLE_ADMIN {
        return Err(AppError::Forbidden(
            "Only the owner can delete this material".to_string(),
        ));
    }

    sqlx::query("DELETE FROM materials WHERE id = $1")
        .bind(id)
        .execute(&pool)
        .await?;

    Ok(Json(json!({ "success": true, "message": "Material deleted" })))
}
