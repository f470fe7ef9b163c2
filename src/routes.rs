// src/routes.rs

use std::sync::Arc;

use axum::{
    Router, http::Method, middleware,
    routing::{delete, get, post, put},
};
use tower_governor::{GovernorLayer, governor::GovernorConfigBuilder};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::{
    handlers::{
        admin, assignment, auth, branch, marks, material, notice, profile, quiz, quiz_attempt,
        subject, timetable,
    },
    state::AppState,
    utils::jwt::{admin_middleware, auth_middleware, faculty_middleware, student_middleware},
};

/// Assembles the main application router.
///
/// * Merges all sub-routers (auth, directory data, marks, assignments, quiz).
/// * Applies global middleware (Trace, CORS) and rate limiting on auth.
/// * Injects global state (pool, config, AI client).
pub fn create_router(state: AppState) -> Router {
    let origins = [
        "http://localhost:3000".parse().unwrap(),
        "http://127.0.0.1:3000".parse().unwrap(),
    ];

    let cors = CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([
            axum::http::header::AUTHORIZATION,
            axum::http::header::CONTENT_TYPE,
        ]);

    // Login/register take the brunt of bots; everything else sits behind JWT.
    let governor_conf = GovernorConfigBuilder::default()
        .per_second(5)
        .burst_size(20)
        .finish()
        .unwrap();
    let governor_conf = Arc::new(governor_conf);

    let auth_routes = Router::new()
        .route("/register", post(auth::register))
        .route("/login", post(auth::login))
        .layer(GovernorLayer::new(governor_conf))
        .merge(
            Router::new()
                .route("/me", get(profile::get_me))
                .route("/updateProfile", put(profile::update_profile))
                .layer(middleware::from_fn_with_state(
                    state.clone(),
                    auth_middleware,
                )),
        );

    let branch_routes = Router::new()
        .route("/getBranch", get(branch::get_branches))
        .merge(
            Router::new()
                .route("/addBranch", post(branch::add_branch))
                .route("/deleteBranch/{id}", delete(branch::delete_branch))
                .layer(middleware::from_fn(admin_middleware)),
        )
        .layer(middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ));

    let subject_routes = Router::new()
        .route("/getSubject", get(subject::get_subjects))
        .merge(
            Router::new()
                .route("/addSubject", post(subject::add_subject))
                .route("/deleteSubject/{id}", delete(subject::delete_subject))
                .layer(middleware::from_fn(admin_middleware)),
        )
        .layer(middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ));

    let timetable_routes = Router::new()
        .route("/getTimetable", get(timetable::get_timetables))
        .merge(
            Router::new()
                .route("/addTimetable", post(timetable::add_timetable))
                .route("/deleteTimetable/{id}", delete(timetable::delete_timetable))
                .layer(middleware::from_fn(faculty_middleware)),
        )
        .layer(middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ));

    let notice_routes = Router::new()
        .route("/getNotice", get(notice::get_notices))
        .merge(
            Router::new()
                .route("/addNotice", post(notice::add_notice))
                .route("/updateNotice/{id}", put(notice::update_notice))
                .route("/deleteNotice/{id}", delete(notice::delete_notice))
                .layer(middleware::from_fn(faculty_middleware)),
        )
        .layer(middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ));

    let material_routes = Router::new()
        .route("/getMaterial", get(material::get_materials))
        .merge(
            Router::new()
                .route("/addMaterial", post(material::add_material))
                .route("/deleteMaterial/{id}", delete(material::delete_material))
                .layer(middleware::from_fn(faculty_middleware)),
        )
        .layer(middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ));

    let marks_routes = Router::new()
        .route("/getMarks/{studentId}", get(marks::get_marks))
        .merge(
            Router::new()
                .route("/addMarks", post(marks::add_marks))
                .layer(middleware::from_fn(faculty_middleware)),
        )
        .layer(middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ));

    let assignment_routes = Router::new()
        .route("/getAssignments", get(assignment::get_assignments))
        .merge(
            Router::new()
                .route(
                    "/submitAssignment/{assignmentId}",
                    post(assignment::submit_assignment),
                )
                .layer(middleware::from_fn(student_middleware)),
        )
        .merge(
            Router::new()
                .route("/createAssignment", post(assignment::create_assignment))
                .route(
                    "/evaluateSubmission/{submissionId}",
                    post(assignment::evaluate_submission),
                )
                .route(
                    "/getSubmissions/{assignmentId}",
                    get(assignment::get_submissions),
                )
                .layer(middleware::from_fn(faculty_middleware)),
        )
        .layer(middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ));

    let quiz_routes = Router::new()
        .route("/getQuizzes", get(quiz::get_quizzes))
        .route("/getQuiz/{quizId}", get(quiz::get_quiz))
        .merge(
            Router::new()
                .route("/createQuiz", post(quiz::create_quiz))
                .route("/updateQuiz/{quizId}", put(quiz::update_quiz))
                .route(
                    "/generateQuizQuestions/{quizId}",
                    post(quiz::generate_questions),
                )
                .route("/deleteQuiz/{quizId}", delete(quiz::delete_quiz))
                .layer(middleware::from_fn(faculty_middleware)),
        )
        .layer(middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ));

    let quiz_submission_routes = Router::new()
        .route(
            "/completeQuizAttempt/{submissionId}",
            post(quiz_attempt::complete_quiz_attempt),
        )
        .route(
            "/getQuizSubmissionResult/{submissionId}",
            get(quiz_attempt::get_quiz_submission_result),
        )
        .merge(
            Router::new()
                .route("/startQuizAttempt", post(quiz_attempt::start_quiz_attempt))
                .route(
                    "/submitQuizAnswer/{submissionId}",
                    post(quiz_attempt::submit_quiz_answer),
                )
                .layer(middleware::from_fn(student_middleware)),
        )
        .merge(
            Router::new()
                .route(
                    "/getQuizSubmissions/{quizId}",
                    get(quiz_attempt::get_quiz_submissions),
                )
                .layer(middleware::from_fn(faculty_middleware)),
        )
        .layer(middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ));

    let admin_routes = Router::new()
        .route("/users", get(admin::list_users).post(admin::create_user))
        .route(
            "/users/{id}",
            put(admin::update_user).delete(admin::delete_user),
        )
        // Double middleware protection: Auth first, then Admin check
        .layer(middleware::from_fn(admin_middleware))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ));

    Router::new()
        .nest("/auth", auth_routes)
        .nest("/branch", branch_routes)
        .nest("/subject", subject_routes)
        .nest("/timetable", timetable_routes)
        .nest("/notice", notice_routes)
        .nest("/material", material_routes)
        .nest("/marks", marks_routes)
        .nest("/assignment", assignment_routes)
        .nest("/quiz", quiz_routes)
        .nest("/quizSubmission", quiz_submission_routes)
        .nest("/admin", admin_routes)
        // Global Middleware (applied from outside in)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
