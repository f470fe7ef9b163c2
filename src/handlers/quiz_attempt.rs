// src/handlers/quiz_attempt.rs

use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use chrono::{Duration, Utc};
use serde_json::json;
use sqlx::PgPool;

use crate::{
    config::QUIZ_GRACE_SECONDS,
    error::AppError,
    handlers::quiz::fetch_quiz,
    models::quiz::{PublicQuiz, QUIZ_CLOSED, QUIZ_PUBLISHED, Question},
    models::submission::{
        Answer, DetailedResult, QuizSubmission, ResultSummary, SUBMISSION_IN_PROGRESS,
        StartAttemptRequest, SubmitAnswerRequest,
    },
    models::user::ROLE_ADMIN,
    utils::jwt::Claims,
};

const SUBMISSION_COLUMNS: &str = "id, quiz_id, student_id, start_time, deadline, end_time, \
                                  status, answers, total_marks_obtained";

/// Tally of a submission against a question set.
#[derive(Debug, PartialEq)]
struct ScoreOutcome {
    obtained: i64,
    correct: i64,
    answered: i64,
}

/// Scores recorded answers against the current question set.
///
/// Only answers whose question still exists count as answered; an answer is
/// correct when its selected option id equals the id of the option flagged
/// correct. Unanswered and unresolvable questions contribute zero.
fn score_answers(questions: &[Question], answers: &[Answer]) -> ScoreOutcome {
    let mut outcome = ScoreOutcome {
        obtained: 0,
        correct: 0,
        answered: 0,
    };

    for question in questions {
        let Some(answer) = answers.iter().find(|a| a.question_id == question.id) else {
            continue;
        };
        outcome.answered += 1;

        if question.correct_option_id() == Some(answer.selected_option_id) {
            outcome.correct += 1;
            outcome.obtained += question.marks;
        }
    }

    outcome
}

/// Percentage of `obtained` against `total`, clamped to [0, 100].
fn percentage(obtained: i64, total: i64) -> f64 {
    if total <= 0 {
        return 0.0;
    }
    ((obtained as f64 / total as f64) * 100.0).clamp(0.0, 100.0)
}

async fn fetch_submission(pool: &PgPool, id: i64) -> Result<Option<QuizSubmission>, AppError> {
    let submission = sqlx::query_as::<_, QuizSubmission>(&format!(
        "SELECT {} FROM quiz_submissions WHERE id = $1",
        SUBMISSION_COLUMNS
    ))
    .bind(id)
    .fetch_optional(pool)
    .await?;

    Ok(submission)
}

/// Completes and scores a submission exactly once.
///
/// The UPDATE is conditioned on the row still being In Progress, so a
/// concurrent (or repeated) completion loses the race and we return the
/// already-stored result instead of re-scoring.
async fn finalize_submission(
    pool: &PgPool,
    submission: &QuizSubmission,
    questions: &[Question],
) -> Result<QuizSubmission, AppError> {
    let outcome = score_answers(questions, &submission.answers);

    let finalized = sqlx::query_as::<_, QuizSubmission>(&format!(
        r#"
        UPDATE quiz_submissions
        SET end_time = $1, status = 'Completed', total_marks_obtained = $2
        WHERE id = $3 AND status = 'In Progress'
        RETURNING {}
        "#,
        SUBMISSION_COLUMNS
    ))
    .bind(Utc::now())
    .bind(outcome.obtained)
    .bind(submission.id)
    .fetch_optional(pool)
    .await?;

    match finalized {
        Some(s) => Ok(s),
        // Lost the race: someone completed it first. Return their result.
        None => fetch_submission(pool, submission.id)
            .await?
            .ok_or(AppError::NotFound("Submission not found".to_string())),
    }
}

fn past_grace(submission: &QuizSubmission) -> bool {
    Utc::now() > submission.deadline + Duration::seconds(QUIZ_GRACE_SECONDS)
}

/// Starts (or resumes) a quiz attempt.
///
/// One In Progress submission per (quiz, student): the insert relies on a
/// partial unique index, so two racing starts cannot create two rows. An
/// existing attempt is returned unchanged unless its deadline has passed,
/// in which case it is finalized and the completed record is returned.
/// Students only.
pub async fn start_quiz_attempt(
    State(pool): State<PgPool>,
    Extension(claims): Extension<Claims>,
    Json(payload): Json<StartAttemptRequest>,
) -> Result<impl IntoResponse, AppError> {
    let student_id = claims.user_id();

    let quiz = fetch_quiz(&pool, payload.quiz_id)
        .await?
        .ok_or(AppError::NotFound("Quiz not found".to_string()))?;

    if quiz.status == QUIZ_CLOSED {
        return Err(AppError::Conflict(
            "Quiz is closed and no longer accepts attempts".to_string(),
        ));
    }
    if quiz.status != QUIZ_PUBLISHED {
        // Drafts are invisible to students.
        return Err(AppError::NotFound("Quiz not found".to_string()));
    }
    if Utc::now() > quiz.due_date {
        return Err(AppError::Conflict("Quiz due date has passed".to_string()));
    }

    let start_time = Utc::now();
    let deadline = start_time + Duration::minutes(quiz.duration);

    let inserted = sqlx::query_as::<_, QuizSubmission>(&format!(
        r#"
        INSERT INTO quiz_submissions (quiz_id, student_id, start_time, deadline, status, answers)
        VALUES ($1, $2, $3, $4, 'In Progress', '[]'::jsonb)
        ON CONFLICT (quiz_id, student_id) WHERE status = 'In Progress' DO NOTHING
        RETURNING {}
        "#,
        SUBMISSION_COLUMNS
    ))
    .bind(payload.quiz_id)
    .bind(student_id)
    .bind(start_time)
    .bind(deadline)
    .fetch_optional(&pool)
    .await
    .map_err(|e| {
        tracing::error!("Failed to start quiz attempt: {:?}", e);
        AppError::InternalServerError(e.to_string())
    })?;

    let submission = match inserted {
        Some(s) => s,
        None => {
            // Resume the attempt the conflict pointed at.
            let existing = sqlx::query_as::<_, QuizSubmission>(&format!(
                r#"
                SELECT {}
                FROM quiz_submissions
                WHERE quiz_id = $1 AND student_id = $2 AND status = 'In Progress'
                "#,
                SUBMISSION_COLUMNS
            ))
            .bind(payload.quiz_id)
            .bind(student_id)
            .fetch_optional(&pool)
            .await?
            .ok_or_else(|| {
                AppError::InternalServerError("Concurrent attempt detected, retry".to_string())
            })?;

            if past_grace(&existing) {
                finalize_submission(&pool, &existing, quiz.questions.as_slice()).await?
            } else {
                existing
            }
        }
    };

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "success": true,
            "quiz": PublicQuiz::from(&quiz),
            "submission": submission
        })),
    ))
}

/// Records one answer within an In Progress submission.
///
/// Upserts by question id (last write wins), so the answer count can never
/// exceed the question count. Answers for questions outside the quiz are
/// rejected. Past the deadline the submission is finalized and the answer
/// refused.
pub async fn submit_quiz_answer(
    State(pool): State<PgPool>,
    Extension(claims): Extension<Claims>,
    Path(submission_id): Path<i64>,
    Json(payload): Json<SubmitAnswerRequest>,
) -> Result<impl IntoResponse, AppError> {
    let submission = fetch_submission(&pool, submission_id)
        .await?
        .ok_or(AppError::NotFound("Submission not found".to_string()))?;

    if submission.student_id != claims.user_id() {
        return Err(AppError::Forbidden(
            "This submission belongs to another student".to_string(),
        ));
    }

    if submission.status != SUBMISSION_IN_PROGRESS {
        return Err(AppError::Conflict(
            "Submission is already completed".to_string(),
        ));
    }

    let quiz = fetch_quiz(&pool, submission.quiz_id).await?;
    let questions: &[Question] = quiz.as_ref().map(|q| q.questions.as_slice()).unwrap_or(&[]);

    if past_grace(&submission) {
        finalize_submission(&pool, &submission, questions).await?;
        return Err(AppError::Conflict(
            "Time is up, the attempt has been completed".to_string(),
        ));
    }

    let question = questions
        .iter()
        .find(|q| q.id == payload.question_id)
        .ok_or_else(|| {
            AppError::BadRequest("Question does not belong to this quiz".to_string())
        })?;

    if !question.options.iter().any(|o| o.id == payload.selected_option_id) {
        return Err(AppError::BadRequest(format!(
            "Option {} does not exist on this question",
            payload.selected_option_id
        )));
    }

    let mut answers = submission.answers.0.clone();
    match answers
        .iter_mut()
        .find(|a| a.question_id == payload.question_id)
    {
        Some(answer) => answer.selected_option_id = payload.selected_option_id,
        None => answers.push(Answer {
            question_id: payload.question_id,
            selected_option_id: payload.selected_option_id,
        }),
    }

    let result = sqlx::query(
        "UPDATE quiz_submissions SET answers = $1 WHERE id = $2 AND status = 'In Progress'",
    )
    .bind(serde_json::to_value(&answers)?)
    .bind(submission_id)
    .execute(&pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(AppError::Conflict(
            "Submission is already completed".to_string(),
        ));
    }

    Ok(Json(json!({
        "success": true,
        "message": "Answer recorded"
    })))
}

/// Completes an attempt and computes its score.
///
/// Idempotent: completing an already-completed submission returns the stored
/// result without re-scoring.
pub async fn complete_quiz_attempt(
    State(pool): State<PgPool>,
    Extension(claims): Extension<Claims>,
    Path(submission_id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let submission = fetch_submission(&pool, submission_id)
        .await?
        .ok_or(AppError::NotFound("Submission not found".to_string()))?;

    if submission.student_id != claims.user_id() {
        return Err(AppError::Forbidden(
            "This submission belongs to another student".to_string(),
        ));
    }

    if submission.status != SUBMISSION_IN_PROGRESS {
        return Ok(Json(json!({ "success": true, "submission": submission })));
    }

    // Score against whatever question set currently resolves; a quiz edited
    // or removed mid-attempt yields zero for the missing questions rather
    // than an error.
    let quiz = fetch_quiz(&pool, submission.quiz_id).await?;
    let questions: &[Question] = quiz.as_ref().map(|q| q.questions.as_slice()).unwrap_or(&[]);

    let finalized = finalize_submission(&pool, &submission, questions).await?;

    Ok(Json(json!({ "success": true, "submission": finalized })))
}

/// Returns the scored submission with a per-question breakdown and aggregate
/// figures. Students see their own; the quiz author and admins see all.
pub async fn get_quiz_submission_result(
    State(pool): State<PgPool>,
    Extension(claims): Extension<Claims>,
    Path(submission_id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let submission = fetch_submission(&pool, submission_id)
        .await?
        .ok_or(AppError::NotFound("Submission not found".to_string()))?;

    let quiz = fetch_quiz(&pool, submission.quiz_id).await?;

    let is_owner = submission.student_id == claims.user_id();
    let is_author = quiz
        .as_ref()
        .map(|q| q.created_by == claims.user_id())
        .unwrap_or(false);
    if !is_owner && !is_author && claims.role != ROLE_ADMIN {
        return Err(AppError::Forbidden(
            "Not allowed to view this submission".to_string(),
        ));
    }

    // An expired but never-completed attempt is finalized on first read.
    let submission = if submission.status == SUBMISSION_IN_PROGRESS {
        if !past_grace(&submission) {
            return Err(AppError::Conflict(
                "Attempt is still in progress".to_string(),
            ));
        }
        let questions: &[Question] =
            quiz.as_ref().map(|q| q.questions.as_slice()).unwrap_or(&[]);
        finalize_submission(&pool, &submission, questions).await?
    } else {
        submission
    };

    let questions: &[Question] = quiz.as_ref().map(|q| q.questions.as_slice()).unwrap_or(&[]);
    let answers = &submission.answers.0;
    let outcome = score_answers(questions, answers);

    let detailed: Vec<DetailedResult> = questions
        .iter()
        .map(|question| {
            let selected = answers
                .iter()
                .find(|a| a.question_id == question.id)
                .map(|a| a.selected_option_id);
            let correct_option_id = question.correct_option_id();
            let is_correct = selected.is_some() && selected == correct_option_id;

            DetailedResult {
                question_id: question.id,
                text: question.text.clone(),
                options: question.options.clone(),
                correct_option_id,
                correct_answer: question.correct_answer.clone(),
                selected_option_id: selected,
                is_correct,
                marks_obtained: if is_correct { question.marks } else { 0 },
                possible_marks: question.marks,
            }
        })
        .collect();

    let total_marks_obtained = submission.total_marks_obtained.unwrap_or(outcome.obtained);
    let quiz_total = quiz.as_ref().map(|q| q.total_marks).unwrap_or(0);

    let result = ResultSummary {
        total_questions: questions.len() as i64,
        answered_questions: outcome.answered,
        correct_answers: outcome.correct,
        total_marks_obtained,
        percentage: percentage(total_marks_obtained, quiz_total),
    };

    Ok(Json(json!({
        "success": true,
        "submission": submission,
        "result": result,
        "detailedResults": detailed
    })))
}

/// Lists all submissions for a quiz.
/// Only the quiz author (or an admin).
pub async fn get_quiz_submissions(
    State(pool): State<PgPool>,
    Extension(claims): Extension<Claims>,
    Path(quiz_id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let quiz = fetch_quiz(&pool, quiz_id)
        .await?
        .ok_or(AppError::NotFound("Quiz not found".to_string()))?;

    if quiz.created_by != claims.user_id() && claims.role != ROLE_ADMIN {
        return Err(AppError::Forbidden(
            "Only the quiz author can view submissions".to_string(),
        ));
    }

    let submissions = sqlx::query_as::<_, QuizSubmission>(&format!(
        r#"
        SELECT {}
        FROM quiz_submissions
        WHERE quiz_id = $1
        ORDER BY start_time
        "#,
        SUBMISSION_COLUMNS
    ))
    .bind(quiz_id)
    .fetch_all(&pool)
    .await?;

    Ok(Json(json!({ "success": true, "submissions": submissions })))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::quiz::{OptionInput, QuestionInput};
    use uuid::Uuid;

    fn question(marks: i64, correct: usize) -> Question {
        QuestionInput {
            id: None,
            text: format!("Q worth {}", marks),
            options: (0..4)
                .map(|i| OptionInput {
                    text: format!("Option {}", i),
                    is_correct: i == correct,
                })
                .collect(),
            marks,
            difficulty: "Medium".to_string(),
        }
        .into_question()
        .unwrap()
    }

    fn answer(question: &Question, option_id: i64) -> Answer {
        Answer {
            question_id: question.id,
            selected_option_id: option_id,
        }
    }

    #[test]
    fn sums_only_matching_answers() {
        // q1 answered correctly (2 marks), q2 answered wrong (3 marks).
        let q1 = question(2, 0);
        let q2 = question(3, 1);
        let answers = vec![answer(&q1, 1), answer(&q2, 3)];

        let outcome = score_answers(&[q1, q2], &answers);
        assert_eq!(outcome.obtained, 2);
        assert_eq!(outcome.correct, 1);
        assert_eq!(outcome.answered, 2);
    }

    #[test]
    fn unanswered_questions_score_zero() {
        let q1 = question(5, 2);
        let q2 = question(5, 2);
        let answers = vec![answer(&q1, 3)];

        let outcome = score_answers(&[q1, q2], &answers);
        assert_eq!(outcome.obtained, 5);
        assert_eq!(outcome.answered, 1);
    }

    #[test]
    fn answers_for_removed_questions_are_ignored() {
        let kept = question(4, 0);
        let removed = question(6, 0);
        let answers = vec![answer(&kept, 1), answer(&removed, 1)];

        // Only `kept` is still on the quiz.
        let outcome = score_answers(std::slice::from_ref(&kept), &answers);
        assert_eq!(outcome.obtained, 4);
        assert_eq!(outcome.answered, 1);
        assert_eq!(outcome.correct, 1);
    }

    #[test]
    fn foreign_answers_never_inflate_counts() {
        let q = question(1, 0);
        let answers: Vec<Answer> = (0..10)
            .map(|_| Answer {
                question_id: Uuid::new_v4(),
                selected_option_id: 1,
            })
            .collect();

        let outcome = score_answers(std::slice::from_ref(&q), &answers);
        assert_eq!(outcome.answered, 0);
        assert_eq!(outcome.obtained, 0);
    }

    #[test]
    fn empty_question_set_scores_zero() {
        let q = question(5, 0);
        let answers = vec![answer(&q, 1)];
        let outcome = score_answers(&[], &answers);
        assert_eq!(
            outcome,
            ScoreOutcome {
                obtained: 0,
                correct: 0,
                answered: 0
            }
        );
    }

    #[test]
    fn percentage_half() {
        assert_eq!(percentage(5, 10), 50.0);
    }

    #[test]
    fn percentage_clamps_above_total() {
        // Question marks can drift out of sync with the quiz total.
        assert_eq!(percentage(15, 10), 100.0);
    }

    #[test]
    fn percentage_of_zero_total_is_zero() {
        assert_eq!(percentage(5, 0), 0.0);
    }
}
