// src/handlers/quiz.rs

use axum::{
    Extension, Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use serde::Deserialize;
use serde_json::json;
use sqlx::{PgPool, Postgres, QueryBuilder};
use validator::Validate;

use crate::{
    error::AppError,
    models::quiz::{
        ASSESSMENT_TYPES, CreateQuizRequest, GenerateQuestionsRequest, PublicQuiz, QUIZ_DRAFT,
        QUIZ_PUBLISHED, Quiz, UpdateQuizRequest, build_questions, status_rank,
    },
    models::user::{ROLE_ADMIN, ROLE_STUDENT},
    utils::{ai::AiClient, jwt::Claims},
};

const QUIZ_COLUMNS: &str = "id, title, description, subject, branch, semester, due_date, \
                            total_marks, duration, assessment_type, status, questions, \
                            created_by, created_at";

pub(crate) async fn fetch_quiz(pool: &PgPool, id: i64) -> Result<Option<Quiz>, AppError> {
    let quiz = sqlx::query_as::<_, Quiz>(&format!(
        "SELECT {} FROM quizzes WHERE id = $1",
        QUIZ_COLUMNS
    ))
    .bind(id)
    .fetch_optional(pool)
    .await?;

    Ok(quiz)
}

/// Creates a quiz. Starts in Draft unless an explicit status is supplied;
/// publishing at creation time still requires at least one question.
/// Faculty only.
pub async fn create_quiz(
    State(pool): State<PgPool>,
    Extension(claims): Extension<Claims>,
    Json(payload): Json<CreateQuizRequest>,
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

    let status = payload.status.unwrap_or_else(|| QUIZ_DRAFT.to_string());
    if status_rank(&status).is_none() {
        return Err(AppError::BadRequest(format!("Unknown status '{}'", status)));
    }

    let questions = build_questions(payload.questions.unwrap_or_default())
        .map_err(AppError::BadRequest)?;

    if status != QUIZ_DRAFT && questions.is_empty() {
        return Err(AppError::Conflict(
            "Cannot publish a quiz with no questions".to_string(),
        ));
    }

    let quiz = sqlx::query_as::<_, Quiz>(&format!(
        r#"
        INSERT INTO quizzes
        (title, description, subject, branch, semester, due_date, total_marks,
         duration, assessment_type, status, questions, created_by)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
        RETURNING {}
        "#,
        QUIZ_COLUMNS
    ))
    .bind(&payload.title)
    .bind(&payload.description)
    .bind(&payload.subject)
    .bind(&payload.branch)
    .bind(payload.semester)
    .bind(payload.due_date)
    .bind(payload.total_marks)
    .bind(payload.duration)
    .bind(&payload.assessment_type)
    .bind(&status)
    .bind(serde_json::to_value(&questions)?)
    .bind(claims.user_id())
    .fetch_one(&pool)
    .await
    .map_err(|e| {
        tracing::error!("Failed to create quiz: {:?}", e);
        AppError::InternalServerError(e.to_string())
    })?;

    Ok((
        StatusCode::CREATED,
        Json(json!({ "success": true, "quiz": quiz })),
    ))
}

/// Query parameters for listing quizzes.
#[derive(Debug, Deserialize)]
pub struct QuizListParams {
    pub branch: Option<String>,
    pub semester: Option<i64>,
    pub subject: Option<String>,
    pub status: Option<String>,
}

/// Lists quizzes. Students see only Published quizzes, stripped of
/// correctness data; staff see full rows.
pub async fn get_quizzes(
    State(pool): State<PgPool>,
    Extension(claims): Extension<Claims>,
    Query(params): Query<QuizListParams>,
) -> Result<impl IntoResponse, AppError> {
    let status_filter = if claims.role == ROLE_STUDENT {
        Some(QUIZ_PUBLISHED.to_string())
    } else {
        params.status
    };

    let quizzes = sqlx::query_as::<_, Quiz>(&format!(
        r#"
        SELECT {}
        FROM quizzes
        WHERE ($1::TEXT IS NULL OR branch = $1)
          AND ($2::BIGINT IS NULL OR semester = $2)
          AND ($3::TEXT IS NULL OR subject = $3)
          AND ($4::TEXT IS NULL OR status = $4)
        ORDER BY due_date DESC
        "#,
        QUIZ_COLUMNS
    ))
    .bind(&params.branch)
    .bind(params.semester)
    .bind(&params.subject)
    .bind(&status_filter)
    .fetch_all(&pool)
    .await?;

    if claims.role == ROLE_STUDENT {
        let public: Vec<PublicQuiz> = quizzes.iter().map(PublicQuiz::from).collect();
        return Ok(Json(json!({ "success": true, "quizzes": public })));
    }

    Ok(Json(json!({ "success": true, "quizzes": quizzes })))
}

/// Retrieves a single quiz. The author (or an admin) gets the full document;
/// everyone else gets the public shape, and students only when Published.
pub async fn get_quiz(
    State(pool): State<PgPool>,
    Extension(claims): Extension<Claims>,
    Path(quiz_id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let quiz = fetch_quiz(&pool, quiz_id)
        .await?
        .ok_or(AppError::NotFound("Quiz not found".to_string()))?;

    if claims.user_id() == quiz.created_by || claims.role == ROLE_ADMIN {
        return Ok(Json(json!({ "success": true, "quiz": quiz })));
    }

    if claims.role == ROLE_STUDENT && quiz.status != QUIZ_PUBLISHED {
        return Err(AppError::NotFound("Quiz not found".to_string()));
    }

    Ok(Json(json!({ "success": true, "quiz": PublicQuiz::from(&quiz) })))
}

/// Updates a quiz. A provided questions array replaces the embedded list;
/// status changes must move forward on the Draft -> Published -> Closed
/// ladder, and publishing requires at least one question.
/// Only the author (or an admin).
pub async fn update_quiz(
    State(pool): State<PgPool>,
    Extension(claims): Extension<Claims>,
    Path(quiz_id): Path<i64>,
    Json(payload): Json<UpdateQuizRequest>,
) -> Result<impl IntoResponse, AppError> {
    let quiz = fetch_quiz(&pool, quiz_id)
        .await?
        .ok_or(AppError::NotFound("Quiz not found".to_string()))?;

    if quiz.created_by != claims.user_id() && claims.role != ROLE_ADMIN {
        return Err(AppError::Forbidden(
            "Only the quiz author can edit it".to_string(),
        ));
    }

    if let Some(assessment_type) = &payload.assessment_type {
        if !ASSESSMENT_TYPES.contains(&assessment_type.as_str()) {
            return Err(AppError::BadRequest(format!(
                "Unknown assessment type '{}'",
                assessment_type
            )));
        }
    }

    let new_questions = match payload.questions {
        Some(inputs) => Some(build_questions(inputs).map_err(AppError::BadRequest)?),
        None => None,
    };

    // Question count after this update, for the publish guard.
    let question_count = new_questions
        .as_ref()
        .map(|q| q.len())
        .unwrap_or(quiz.questions.len());

    if let Some(new_status) = &payload.status {
        let new_rank = status_rank(new_status)
            .ok_or_else(|| AppError::BadRequest(format!("Unknown status '{}'", new_status)))?;
        let current_rank = status_rank(&quiz.status).unwrap_or(0);

        if new_rank < current_rank {
            return Err(AppError::Conflict(format!(
                "Cannot move quiz from {} back to {}",
                quiz.status, new_status
            )));
        }

        if new_status == QUIZ_PUBLISHED && question_count == 0 {
            return Err(AppError::Conflict(
                "Cannot publish a quiz with no questions".to_string(),
            ));
        }
    }

    let nothing_to_do = payload.title.is_none()
        && payload.description.is_none()
        && payload.subject.is_none()
        && payload.branch.is_none()
        && payload.semester.is_none()
        && payload.due_date.is_none()
        && payload.total_marks.is_none()
        && payload.duration.is_none()
        && payload.assessment_type.is_none()
        && payload.status.is_none()
        && new_questions.is_none();

    if nothing_to_do {
        return Ok(Json(json!({ "success": true, "quiz": quiz })));
    }

    let mut builder: QueryBuilder<Postgres> = QueryBuilder::new("UPDATE quizzes SET ");
    let mut separated = builder.separated(", ");

    if let Some(title) = payload.title {
        separated.push("title = ");
        separated.push_bind_unseparated(title);
    }

    if let Some(description) = payload.description {
        separated.push("description = ");
        separated.push_bind_unseparated(description);
    }

    if let Some(subject) = payload.subject {
        separated.push("subject = ");
        separated.push_bind_unseparated(subject);
    }

    if let Some(branch) = payload.branch {
        separated.push("branch = ");
        separated.push_bind_unseparated(branch);
    }

    if let Some(semester) = payload.semester {
        separated.push("semester = ");
        separated.push_bind_unseparated(semester);
    }

    if let Some(due_date) = payload.due_date {
        separated.push("due_date = ");
        separated.push_bind_unseparated(due_date);
    }

    if let Some(total_marks) = payload.total_marks {
        separated.push("total_marks = ");
        separated.push_bind_unseparated(total_marks);
    }

    if let Some(duration) = payload.duration {
        separated.push("duration = ");
        separated.push_bind_unseparated(duration);
    }

    if let Some(assessment_type) = payload.assessment_type {
        separated.push("assessment_type = ");
        separated.push_bind_unseparated(assessment_type);
    }

    if let Some(status) = payload.status {
        separated.push("status = ");
        separated.push_bind_unseparated(status);
    }

    if let Some(questions) = &new_questions {
        separated.push("questions = ");
        separated.push_bind_unseparated(serde_json::to_value(questions)?);
    }

    builder.push(" WHERE id = ");
    builder.push_bind(quiz_id);

    builder.build().execute(&pool).await.map_err(|e| {
        tracing::error!("Failed to update quiz: {:?}", e);
        AppError::InternalServerError(e.to_string())
    })?;

    let updated = fetch_quiz(&pool, quiz_id)
        .await?
        .ok_or(AppError::NotFound("Quiz not found".to_string()))?;

    Ok(Json(json!({ "success": true, "quiz": updated })))
}

/// Generates questions with the AI collaborator and appends them to a Draft
/// quiz. Only the author (or an admin).
pub async fn generate_questions(
    State(pool): State<PgPool>,
    State(ai): State<Option<AiClient>>,
    Extension(claims): Extension<Claims>,
    Path(quiz_id): Path<i64>,
    Json(payload): Json<GenerateQuestionsRequest>,
) -> Result<impl IntoResponse, AppError> {
    if let Err(validation_errors) = payload.validate() {
        return Err(AppError::BadRequest(validation_errors.to_string()));
    }

    let ai = ai.ok_or_else(|| {
        AppError::BadRequest("Question generation is not configured on this server".to_string())
    })?;

    let quiz = fetch_quiz(&pool, quiz_id)
        .await?
        .ok_or(AppError::NotFound("Quiz not found".to_string()))?;

    if quiz.created_by != claims.user_id() && claims.role != ROLE_ADMIN {
        return Err(AppError::Forbidden(
            "Only the quiz author can generate questions".to_string(),
        ));
    }

    if quiz.status != QUIZ_DRAFT {
        return Err(AppError::Conflict(
            "Questions can only be generated for Draft quizzes".to_string(),
        ));
    }

    let generated = ai
        .generate_questions(&payload.topic, payload.num_questions, &payload.difficulty)
        .await?;

    let mut questions = quiz.questions.0.clone();
    questions.extend(generated);

    let updated = sqlx::query_as::<_, Quiz>(&format!(
        "UPDATE quizzes SET questions = $1 WHERE id = $2 RETURNING {}",
        QUIZ_COLUMNS
    ))
    .bind(serde_json::to_value(&questions)?)
    .bind(quiz_id)
    .fetch_one(&pool)
    .await?;

    Ok(Json(json!({ "success": true, "quiz": updated })))
}

/// Deletes a quiz. Draft only, so published quizzes referenced by student
/// submissions cannot disappear. Only the author (or an admin).
pub async fn delete_quiz(
    State(pool): State<PgPool>,
    Extension(claims): Extension<Claims>,
    Path(quiz_id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let quiz = fetch_quiz(&pool, quiz_id)
        .await?
        .ok_or(AppError::NotFound("Quiz not found".to_string()))?;

    if quiz.created_by != claims.user_id() && claims.role != ROLE_ADMIN {
        return Err(AppError::Forbidden(
            "Only the quiz author can delete it".to_string(),
        ));
    }

    if quiz.status != QUIZ_DRAFT {
        return Err(AppError::Conflict(
            "Only Draft quizzes can be deleted".to_string(),
        ));
    }

    sqlx::query("DELETE FROM quizzes WHERE id = $1")
        .bind(quiz_id)
        .execute(&pool)
        .await?;

    Ok(Json(json!({ "success": true, "message": "Quiz deleted" })))
}
