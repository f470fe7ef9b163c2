// src/handlers/notice.rs

use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use serde_json::json;
use sqlx::{PgPool, Postgres, QueryBuilder};
use validator::Validate;

use crate::{
    error::AppError,
    models::notice::{AUDIENCES, CreateNoticeRequest, Notice, UpdateNoticeRequest},
    models::user::ROLE_STUDENT,
    utils::{html::clean_html, jwt::Claims},
};

/// Lists notices visible to the caller's role, newest first.
pub async fn get_notices(
    State(pool): State<PgPool>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, AppError> {
    // Students see student/both, everyone else faculty/both.
    let audience = if claims.role == ROLE_STUDENT {
        "student"
    } else {
        "faculty"
    };

    let notices = sqlx::query_as::<_, Notice>(
        r#"
        SELECT id, title, description, audience, link, created_at
        FROM notices
        WHERE audience = $1 OR audience = 'both'
        ORDER BY created_at DESC
        "#,
    )
    .bind(audience)
    .fetch_all(&pool)
    .await?;

    Ok(Json(json!({ "success": true, "notices": notices })))
}

/// Publishes a notice.
/// Faculty/admin only. The body is sanitized before storage.
pub async fn add_notice(
    State(pool): State<PgPool>,
    Json(payload): Json<CreateNoticeRequest>,
) -> Result<impl IntoResponse, AppError> {
    if let Err(validation_errors) = payload.validate() {
        return Err(AppError::BadRequest(validation_errors.to_string()));
    }

    let notice = sqlx::query_as::<_, Notice>(
        r#"
        INSERT INTO notices (title, description, audience, link)
        VALUES ($1, $2, $3, $4)
        RETURNING id, title, description, audience, link, created_at
        "#,
    )
    .bind(&payload.title)
    .bind(clean_html(&payload.description))
    .bind(&payload.audience)
    .bind(&payload.link)
    .fetch_one(&pool)
    .await
    .map_err(|e| {
        tracing::error!("Failed to create notice: {:?}", e);
        AppError::InternalServerError(e.to_string())
    })?;

    Ok((
        StatusCode::CREATED,
        Json(json!({ "success": true, "notice": notice })),
    ))
}

/// Updates a notice by ID.
/// Faculty/admin only.
pub async fn update_notice(
    State(pool): State<PgPool>,
    Path(id): Path<i64>,
    Json(payload): Json<UpdateNoticeRequest>,
) -> Result<impl IntoResponse, AppError> {
    if payload.title.is_none()
        && payload.description.is_none()
        && payload.audience.is_none()
        && payload.link.is_none()
    {
        return Ok(Json(json!({ "success": true, "message": "Nothing to update" })));
    }

    if let Some(audience) = &payload.audience {
        if !AUDIENCES.contains(&audience.as_str()) {
            return Err(AppError::BadRequest(format!(
                "Unknown audience '{}'",
                audience
            )));
        }
    }

    let mut builder: QueryBuilder<Postgres> = QueryBuilder::new("UPDATE notices SET ");
    let mut separated = builder.separated(", ");

    if let Some(title) = payload.title {
        separated.push("title = ");
        separated.push_bind_unseparated(title);
    }

    if let Some(description) = payload.description {
        separated.push("description = ");
        separated.push_bind_unseparated(clean_html(&description));
    }

    if let Some(audience) = payload.audience {
        separated.push("audience = ");
        separated.push_bind_unseparated(audience);
    }

    if let Some(link) = payload.link {
        separated.push("link = ");
        separated.push_bind_unseparated(link);
    }

    builder.push(" WHERE id = ");
    builder.push_bind(id);

    let result = builder.build().execute(&pool).await.map_err(|e| {
        tracing::error!("Failed to update notice: {:?}", e);
        AppError::InternalServerError(e.to_string())
    })?;

    if result.rows_affected() == 0 {
        return Err(AppError::NotFound("Notice not found".to_string()));
    }

    Ok(Json(json!({ "success": true, "message": "Notice updated" })))
}

/// Deletes a notice by ID.
/// Faculty/admin only.
pub async fn delete_notice(
    State(pool): State<PgPool>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let result = sqlx::query("DELETE FROM notices WHERE id = $1")
        .bind(id)
        .execute(&pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(AppError::NotFound("Notice not found".to_string()));
    }

    Ok(Json(json!({ "success": true, "message": "Notice deleted" })))
}
