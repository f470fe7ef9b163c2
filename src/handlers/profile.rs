use axum::{Extension, Json, extract::State, response::IntoResponse};
use serde_json::json;
use sqlx::PgPool;
use validator::Validate;

use crate::{
    error::AppError,
    models::user::{MeResponse, ROLE_STUDENT, UpdateProfileRequest, User},
    utils::{hash::hash_password, jwt::Claims},
};

/// Get current user's profile and activity counts.
pub async fn get_me(
    State(pool): State<PgPool>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, AppError> {
    let user_id = claims.user_id();

    let user = sqlx::query_as::<_, User>(
        r#"
        SELECT id, login_id, password, role, name, email, branch, semester, designation, created_at
        FROM users
        WHERE id = $1
        "#,
    )
    .bind(user_id)
    .fetch_optional(&pool)
    .await?
    .ok_or(AppError::NotFound("User not found".to_string()))?;

    // Students count their attempts/submissions, faculty what they authored.
    let (quiz_count, assignment_count) = if user.role == ROLE_STUDENT {
        let quizzes = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM quiz_submissions WHERE student_id = $1",
        )
        .bind(user_id)
        .fetch_one(&pool)
        .await?;
        let assignments = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM assignment_submissions WHERE student_id = $1",
        )
        .bind(user_id)
        .fetch_one(&pool)
        .await?;
        (quizzes, assignments)
    } else {
        let quizzes =
            sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM quizzes WHERE created_by = $1")
                .bind(user_id)
                .fetch_one(&pool)
                .await?;
        let assignments =
            sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM assignments WHERE created_by = $1")
                .bind(user_id)
                .fetch_one(&pool)
                .await?;
        (quizzes, assignments)
    };

    Ok(Json(json!({
        "success": true,
        "user": MeResponse {
            id: user.id,
            login_id: user.login_id,
            role: user.role,
            name: user.name,
            email: user.email,
            branch: user.branch,
            semester: user.semester,
            designation: user.designation,
            created_at: user.created_at,
            quiz_count,
            assignment_count,
        }
    })))
}

/// Update the current user's own profile.
pub async fn update_profile(
    State(pool): State<PgPool>,
    Extension(claims): Extension<Claims>,
    Json(payload): Json<UpdateProfileRequest>,
) -> Result<impl IntoResponse, AppError> {
    if let Err(validation_errors) = payload.validate() {
        return Err(AppError::BadRequest(validation_errors.to_string()));
    }

    let user_id = claims.user_id();

    // Check existence
    sqlx::query_scalar::<_, i64>("SELECT id FROM users WHERE id = $1")
        .bind(user_id)
        .fetch_optional(&pool)
        .await?
        .ok_or(AppError::NotFound("User not found".to_string()))?;

    // Perform updates sequentially if fields are present
    if let Some(new_name) = payload.name {
        sqlx::query("UPDATE users SET name = $1 WHERE id = $2")
            .bind(new_name)
            .bind(user_id)
            .execute(&pool)
            .await?;
    }

    if let Some(new_email) = payload.email {
        sqlx::query("UPDATE users SET email = $1 WHERE id = $2")
            .bind(new_email)
            .bind(user_id)
            .execute(&pool)
            .await?;
    }

    if let Some(new_password) = payload.password {
        let hashed = hash_password(&new_password)?;
        sqlx::query("UPDATE users SET password = $1 WHERE id = $2")
            .bind(hashed)
            .bind(user_id)
            .execute(&pool)
            .await?;
    }

    Ok(Json(json!({
        "success": true,
        "message": "Profile updated"
    })))
}
