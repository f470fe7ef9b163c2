// src/handlers/admin.rs

use axum::{
    Json,
    extract::{Extension, Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use serde::Deserialize;
use serde_json::json;
use sqlx::{PgPool, Postgres, QueryBuilder};
use validator::Validate;

use crate::{
    error::AppError,
    models::user::{ROLE_ADMIN, ROLE_FACULTY, ROLE_STUDENT, User},
    utils::{hash::hash_password, jwt::Claims},
};

/// Lists all users in the system.
/// Admin only.
pub async fn list_users(State(pool): State<PgPool>) -> Result<impl IntoResponse, AppError> {
    let users = sqlx::query_as::<_, User>(
        r#"
        SELECT id, login_id, password, role, name, email, branch, semester, designation, created_at
        FROM users
        ORDER BY id DESC
        "#,
    )
    .fetch_all(&pool)
    .await
    .map_err(|e| {
        tracing::error!("Failed to list users: {:?}", e);
        AppError::InternalServerError(e.to_string())
    })?;

    Ok(Json(json!({ "success": true, "users": users })))
}

/// DTO for Admin creating a user (can specify any role).
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct AdminCreateUserRequest {
    #[validate(length(min = 3, max = 50))]
    pub login_id: String,
    #[validate(length(min = 4, max = 128))]
    pub password: String,
    pub role: String,
    #[validate(length(min = 1, max = 100))]
    pub name: String,
    #[validate(email)]
    pub email: String,
    pub branch: Option<String>,
    pub semester: Option<i64>,
    pub designation: Option<String>,
}

/// Creates a new user with a specific role.
/// Admin only.
pub async fn create_user(
    State(pool): State<PgPool>,
    Json(payload): Json<AdminCreateUserRequest>,
) -> Result<impl IntoResponse, AppError> {
    if let Err(validation_errors) = payload.validate() {
        return Err(AppError::BadRequest(validation_errors.to_string()));
    }

    if ![ROLE_STUDENT, ROLE_FACULTY, ROLE_ADMIN].contains(&payload.role.as_str()) {
        return Err(AppError::BadRequest(format!(
            "Unknown role '{}'",
            payload.role
        )));
    }

    let hashed_password = hash_password(&payload.password)?;

    let id = sqlx::query_scalar::<_, i64>(
        r#"
        INSERT INTO users (login_id, password, role, name, email, branch, semester, designation)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
        RETURNING id
        "#,
    )
    .bind(&payload.login_id)
    .bind(&hashed_password)
    .bind(&payload.role)
    .bind(&payload.name)
    .bind(&payload.email)
    .bind(&payload.branch)
    .bind(payload.semester)
    .bind(&payload.designation)
    .fetch_one(&pool)
    .await
    .map_err(|e| {
        if e.to_string().contains("unique constraint") || e.to_string().contains("23505") {
            AppError::Conflict(format!("Login id '{}' already exists", payload.login_id))
        } else {
            tracing::error!("Failed to create user: {:?}", e);
            AppError::InternalServerError(e.to_string())
        }
    })?;

    Ok((
        StatusCode::CREATED,
        Json(json!({ "success": true, "id": id })),
    ))
}

/// DTO for updating a user. Fields are optional.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdminUpdateUserRequest {
    pub name: Option<String>,
    pub email: Option<String>,
    pub role: Option<String>,
    pub password: Option<String>,
    pub branch: Option<String>,
    pub semester: Option<i64>,
    pub designation: Option<String>,
}

/// Updates user information.
/// Admin only.
pub async fn update_user(
    State(pool): State<PgPool>,
    Path(id): Path<i64>,
    Json(payload): Json<AdminUpdateUserRequest>,
) -> Result<impl IntoResponse, AppError> {
    if let Some(role) = &payload.role {
        if ![ROLE_STUDENT, ROLE_FACULTY, ROLE_ADMIN].contains(&role.as_str()) {
            return Err(AppError::BadRequest(format!("Unknown role '{}'", role)));
        }
    }

    // Check existence
    sqlx::query_scalar::<_, i64>("SELECT id FROM users WHERE id = $1")
        .bind(id)
        .fetch_optional(&pool)
        .await?
        .ok_or(AppError::NotFound("User not found".to_string()))?;

    let hashed = match payload.password {
        Some(p) => Some(hash_password(&p)?),
        None => None,
    };

    if payload.name.is_none()
        && payload.email.is_none()
        && payload.role.is_none()
        && hashed.is_none()
        && payload.branch.is_none()
        && payload.semester.is_none()
        && payload.designation.is_none()
    {
        return Ok(Json(json!({ "success": true, "message": "Nothing to update" })));
    }

    let mut builder: QueryBuilder<Postgres> = QueryBuilder::new("UPDATE users SET ");
    let mut separated = builder.separated(", ");

    if let Some(name) = payload.name {
        separated.push("name = ");
        separated.push_bind_unseparated(name);
    }

    if let Some(email) = payload.email {
        separated.push("email = ");
        separated.push_bind_unseparated(email);
    }

    if let Some(role) = payload.role {
        separated.push("role = ");
        separated.push_bind_unseparated(role);
    }

    if let Some(password) = hashed {
        separated.push("password = ");
        separated.push_bind_unseparated(password);
    }

    if let Some(branch) = payload.branch {
        separated.push("branch = ");
        separated.push_bind_unseparated(branch);
    }

    if let Some(semester) = payload.semester {
        separated.push("semester = ");
        separated.push_bind_unseparated(semester);
    }

    if let Some(designation) = payload.designation {
        separated.push("designation = ");
        separated.push_bind_unseparated(designation);
    }

    builder.push(" WHERE id = ");
    builder.push_bind(id);

    builder.build().execute(&pool).await.map_err(|e| {
        tracing::error!("Failed to update user: {:?}", e);
        AppError::InternalServerError(e.to_string())
    })?;

    Ok(Json(json!({ "success": true, "message": "User updated" })))
}

/// Deletes a user by ID.
/// Admin only. Prevents deleting self.
pub async fn delete_user(
    State(pool): State<PgPool>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    // Prevent self-deletion
    if id == claims.user_id() {
        return Err(AppError::BadRequest("Cannot delete yourself".to_string()));
    }

    let result = sqlx::query("DELETE FROM users WHERE id = $1")
        .bind(id)
        .execute(&pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to delete user: {:?}", e);
            AppError::InternalServerError(e.to_string())
        })?;

    if result.rows_affected() == 0 {
        return Err(AppError::NotFound("User not found".to_string()));
    }

    Ok(Json(json!({ "success": true, "message": "User deleted" })))
}
