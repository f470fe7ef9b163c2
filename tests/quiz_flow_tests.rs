// tests/quiz_flow_tests.rs

use campus_portal::{config::Config, routes, state::AppState};
use sqlx::postgres::PgPoolOptions;
use std::net::SocketAddr;

async fn spawn_app() -> String {
    let database_url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set");

    let pool = PgPoolOptions::new()
        .max_connections(1)
        .connect(&database_url)
        .await
        .expect("Failed to connect to Postgres for testing.");

    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .expect("Failed to migrate database");

    let config = Config {
        database_url: database_url.clone(),
        jwt_secret: "quiz_flow_test_secret".to_string(),
        jwt_expiration: 600,
        rust_log: "error".to_string(),
        admin_login_id: None,
        admin_password: None,
        ai_api_url: None,
        ai_api_key: None,
        ai_model: "gpt-4o-mini".to_string(),
    };

    let state = AppState {
        pool,
        config,
        ai: None,
    };
    let app = routes::create_router(state);
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    let address = format!("http://127.0.0.1:{}", port);

    tokio::spawn(async move {
        axum::serve(
            listener,
            app.into_make_service_with_connect_info::<SocketAddr>(),
        )
        .await
        .unwrap();
    });

    address
}

async fn signup(address: &str, client: &reqwest::Client, role: &str) -> String {
    let login_id = format!("{}_{}", role, &uuid::Uuid::new_v4().to_string()[..8]);

    client
        .post(format!("{}/auth/register", address))
        .json(&serde_json::json!({
            "loginId": login_id,
            "password": "password123",
            "role": role,
            "name": "Quiz Tester",
            "email": "quiz@example.edu",
            "branch": "Computer Science",
            "semester": if role == "student" { Some(4) } else { None }
        }))
        .send()
        .await
        .expect("Register failed");

    let login: serde_json::Value = client
        .post(format!("{}/auth/login", address))
        .json(&serde_json::json!({
            "loginId": login_id,
            "password": "password123",
            "role": role
        }))
        .send()
        .await
        .expect("Login failed")
        .json()
        .await
        .expect("Failed to parse login json");

    login["token"].as_str().expect("Token not found").to_string()
}

fn question(text: &str, correct: usize, marks: i64) -> serde_json::Value {
    let options: Vec<serde_json::Value> = (0..4)
        .map(|i| {
            serde_json::json!({
                "text": format!("{} option {}", text, i),
                "isCorrect": i == correct
            })
        })
        .collect();

    serde_json::json!({
        "text": text,
        "options": options,
        "marks": marks,
        "difficulty": "Medium"
    })
}

/// Creates a quiz with the given questions and returns its id.
async fn create_quiz(
    address: &str,
    client: &reqwest::Client,
    faculty_token: &str,
    questions: Vec<serde_json::Value>,
    total_marks: i64,
) -> i64 {
    let quiz: serde_json::Value = client
        .post(format!("{}/quiz/createQuiz", address))
        .header("Authorization", format!("Bearer {}", faculty_token))
        .json(&serde_json::json!({
            "title": "Operating Systems quiz",
            "description": "Scheduling and memory",
            "subject": "Operating Systems",
            "branch": "Computer Science",
            "semester": 4,
            "dueDate": "2030-01-01T00:00:00Z",
            "totalMarks": total_marks,
            "duration": 30,
            "assessmentType": "ISA1",
            "questions": questions
        }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    assert_eq!(quiz["success"], true, "create quiz failed: {}", quiz);
    quiz["quiz"]["id"].as_i64().unwrap()
}

async fn publish_quiz(address: &str, client: &reqwest::Client, token: &str, quiz_id: i64) {
    let resp: serde_json::Value = client
        .put(format!("{}/quiz/updateQuiz/{}", address, quiz_id))
        .header("Authorization", format!("Bearer {}", token))
        .json(&serde_json::json!({ "status": "Published" }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(resp["quiz"]["status"], "Published");
}

#[tokio::test]
async fn publish_with_zero_questions_fails_and_stays_draft() {
    let address = spawn_app().await;
    let client = reqwest::Client::new();
    let token = signup(&address, &client, "faculty").await;

    let quiz_id = create_quiz(&address, &client, &token, vec![], 10).await;

    let response = client
        .put(format!("{}/quiz/updateQuiz/{}", address, quiz_id))
        .header("Authorization", format!("Bearer {}", token))
        .json(&serde_json::json!({ "status": "Published" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 409);

    let quiz: serde_json::Value = client
        .get(format!("{}/quiz/getQuiz/{}", address, quiz_id))
        .header("Authorization", format!("Bearer {}", token))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(quiz["quiz"]["status"], "Draft");
}

#[tokio::test]
async fn status_cannot_regress() {
    let address = spawn_app().await;
    let client = reqwest::Client::new();
    let token = signup(&address, &client, "faculty").await;

    let quiz_id = create_quiz(&address, &client, &token, vec![question("Q1", 0, 5)], 5).await;
    publish_quiz(&address, &client, &token, quiz_id).await;

    let response = client
        .put(format!("{}/quiz/updateQuiz/{}", address, quiz_id))
        .header("Authorization", format!("Bearer {}", token))
        .json(&serde_json::json!({ "status": "Draft" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 409);
}

#[tokio::test]
async fn created_questions_carry_synced_correct_answer() {
    let address = spawn_app().await;
    let client = reqwest::Client::new();
    let token = signup(&address, &client, "faculty").await;

    let quiz_id =
        create_quiz(&address, &client, &token, vec![question("Kernels", 2, 5)], 5).await;

    let quiz: serde_json::Value = client
        .get(format!("{}/quiz/getQuiz/{}", address, quiz_id))
        .header("Authorization", format!("Bearer {}", token))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    let q = &quiz["quiz"]["questions"][0];
    let correct_option = q["options"]
        .as_array()
        .unwrap()
        .iter()
        .find(|o| o["isCorrect"] == true)
        .unwrap();
    assert_eq!(q["correctAnswer"], correct_option["text"]);
    // Option ids are stable 1..=4.
    let ids: Vec<i64> = q["options"]
        .as_array()
        .unwrap()
        .iter()
        .map(|o| o["id"].as_i64().unwrap())
        .collect();
    assert_eq!(ids, vec![1, 2, 3, 4]);
}

#[tokio::test]
async fn end_to_end_attempt_scores_half() {
    let address = spawn_app().await;
    let client = reqwest::Client::new();
    let faculty = signup(&address, &client, "faculty").await;
    let student = signup(&address, &client, "student").await;

    // Two questions worth 5 each; totalMarks = 10.
    let quiz_id = create_quiz(
        &address,
        &client,
        &faculty,
        vec![question("Q1", 0, 5), question("Q2", 1, 5)],
        10,
    )
    .await;
    publish_quiz(&address, &client, &faculty, quiz_id).await;

    // Start the attempt
    let start: serde_json::Value = client
        .post(format!("{}/quizSubmission/startQuizAttempt", address))
        .header("Authorization", format!("Bearer {}", student))
        .json(&serde_json::json!({ "quizId": quiz_id }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(start["success"], true, "start failed: {}", start);
    let submission_id = start["submission"]["id"].as_i64().unwrap();

    // The student-facing quiz must not leak correctness data
    let first_question = &start["quiz"]["questions"][0];
    assert!(first_question.get("correctAnswer").is_none());
    assert!(first_question["options"][0].get("isCorrect").is_none());

    // Answer only Q1, correctly (its correct option id is 1)
    let q1_id = first_question["id"].as_str().unwrap();
    let answer = client
        .post(format!("{}/quizSubmission/submitQuizAnswer/{}", address, submission_id))
        .header("Authorization", format!("Bearer {}", student))
        .json(&serde_json::json!({ "questionId": q1_id, "selectedOptionId": 1 }))
        .send()
        .await
        .unwrap();
    assert_eq!(answer.status().as_u16(), 200);

    // Complete
    let completed: serde_json::Value = client
        .post(format!("{}/quizSubmission/completeQuizAttempt/{}", address, submission_id))
        .header("Authorization", format!("Bearer {}", student))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(completed["submission"]["status"], "Completed");
    assert_eq!(completed["submission"]["totalMarksObtained"], 5);

    // Result breakdown
    let result: serde_json::Value = client
        .get(format!("{}/quizSubmission/getQuizSubmissionResult/{}", address, submission_id))
        .header("Authorization", format!("Bearer {}", student))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    assert_eq!(result["result"]["totalQuestions"], 2);
    assert_eq!(result["result"]["answeredQuestions"], 1);
    assert_eq!(result["result"]["correctAnswers"], 1);
    assert_eq!(result["result"]["totalMarksObtained"], 5);
    assert_eq!(result["result"]["percentage"], 50.0);
    assert_eq!(result["detailedResults"].as_array().unwrap().len(), 2);
    assert_eq!(result["detailedResults"][0]["isCorrect"], true);
    assert_eq!(result["detailedResults"][1]["isCorrect"], false);
}

#[tokio::test]
async fn double_start_resumes_same_submission() {
    let address = spawn_app().await;
    let client = reqwest::Client::new();
    let faculty = signup(&address, &client, "faculty").await;
    let student = signup(&address, &client, "student").await;

    let quiz_id = create_quiz(&address, &client, &faculty, vec![question("Q", 0, 5)], 5).await;
    publish_quiz(&address, &client, &faculty, quiz_id).await;

    let mut ids = Vec::new();
    for _ in 0..2 {
        let start: serde_json::Value = client
            .post(format!("{}/quizSubmission/startQuizAttempt", address))
            .header("Authorization", format!("Bearer {}", student))
            .json(&serde_json::json!({ "quizId": quiz_id }))
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        ids.push(start["submission"]["id"].as_i64().unwrap());
    }

    assert_eq!(ids[0], ids[1]);
}

#[tokio::test]
async fn complete_is_idempotent() {
    let address = spawn_app().await;
    let client = reqwest::Client::new();
    let faculty = signup(&address, &client, "faculty").await;
    let student = signup(&address, &client, "student").await;

    let quiz_id = create_quiz(&address, &client, &faculty, vec![question("Q", 0, 5)], 5).await;
    publish_quiz(&address, &client, &faculty, quiz_id).await;

    let start: serde_json::Value = client
        .post(format!("{}/quizSubmission/startQuizAttempt", address))
        .header("Authorization", format!("Bearer {}", student))
        .json(&serde_json::json!({ "quizId": quiz_id }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let submission_id = start["submission"]["id"].as_i64().unwrap();
    let q_id = start["quiz"]["questions"][0]["id"].as_str().unwrap();

    client
        .post(format!("{}/quizSubmission/submitQuizAnswer/{}", address, submission_id))
        .header("Authorization", format!("Bearer {}", student))
        .json(&serde_json::json!({ "questionId": q_id, "selectedOptionId": 1 }))
        .send()
        .await
        .unwrap();

    let first: serde_json::Value = client
        .post(format!("{}/quizSubmission/completeQuizAttempt/{}", address, submission_id))
        .header("Authorization", format!("Bearer {}", student))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    // Answer arriving after completion must be refused.
    let late_answer = client
        .post(format!("{}/quizSubmission/submitQuizAnswer/{}", address, submission_id))
        .header("Authorization", format!("Bearer {}", student))
        .json(&serde_json::json!({ "questionId": q_id, "selectedOptionId": 2 }))
        .send()
        .await
        .unwrap();
    assert_eq!(late_answer.status().as_u16(), 409);

    let second: serde_json::Value = client
        .post(format!("{}/quizSubmission/completeQuizAttempt/{}", address, submission_id))
        .header("Authorization", format!("Bearer {}", student))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    assert_eq!(
        first["submission"]["totalMarksObtained"],
        second["submission"]["totalMarksObtained"]
    );
    assert_eq!(
        first["submission"]["endTime"],
        second["submission"]["endTime"]
    );
}

#[tokio::test]
async fn start_on_closed_quiz_rejected() {
    let address = spawn_app().await;
    let client = reqwest::Client::new();
    let faculty = signup(&address, &client, "faculty").await;
    let student = signup(&address, &client, "student").await;

    let quiz_id = create_quiz(&address, &client, &faculty, vec![question("Q", 0, 5)], 5).await;
    publish_quiz(&address, &client, &faculty, quiz_id).await;

    let close: serde_json::Value = client
        .put(format!("{}/quiz/updateQuiz/{}", address, quiz_id))
        .header("Authorization", format!("Bearer {}", faculty))
        .json(&serde_json::json!({ "status": "Closed" }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(close["quiz"]["status"], "Closed");

    let response = client
        .post(format!("{}/quizSubmission/startQuizAttempt", address))
        .header("Authorization", format!("Bearer {}", student))
        .json(&serde_json::json!({ "quizId": quiz_id }))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status().as_u16(), 409);
}

#[tokio::test]
async fn foreign_question_answers_are_rejected() {
    let address = spawn_app().await;
    let client = reqwest::Client::new();
    let faculty = signup(&address, &client, "faculty").await;
    let student = signup(&address, &client, "student").await;

    let quiz_id = create_quiz(&address, &client, &faculty, vec![question("Q", 0, 5)], 5).await;
    publish_quiz(&address, &client, &faculty, quiz_id).await;

    let start: serde_json::Value = client
        .post(format!("{}/quizSubmission/startQuizAttempt", address))
        .header("Authorization", format!("Bearer {}", student))
        .json(&serde_json::json!({ "quizId": quiz_id }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let submission_id = start["submission"]["id"].as_i64().unwrap();
    let q_id = start["quiz"]["questions"][0]["id"].as_str().unwrap().to_string();

    // A question id from some other quiz
    let foreign = client
        .post(format!("{}/quizSubmission/submitQuizAnswer/{}", address, submission_id))
        .header("Authorization", format!("Bearer {}", student))
        .json(&serde_json::json!({
            "questionId": uuid::Uuid::new_v4(),
            "selectedOptionId": 1
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(foreign.status().as_u16(), 400);

    // An option id outside 1..=4
    let bad_option = client
        .post(format!("{}/quizSubmission/submitQuizAnswer/{}", address, submission_id))
        .header("Authorization", format!("Bearer {}", student))
        .json(&serde_json::json!({ "questionId": q_id, "selectedOptionId": 9 }))
        .send()
        .await
        .unwrap();
    assert_eq!(bad_option.status().as_u16(), 400);

    // Re-answering the same question twice keeps one answer
    for option in [1, 2] {
        client
            .post(format!("{}/quizSubmission/submitQuizAnswer/{}", address, submission_id))
            .header("Authorization", format!("Bearer {}", student))
            .json(&serde_json::json!({ "questionId": q_id, "selectedOptionId": option }))
            .send()
            .await
            .unwrap();
    }

    let completed: serde_json::Value = client
        .post(format!("{}/quizSubmission/completeQuizAttempt/{}", address, submission_id))
        .header("Authorization", format!("Bearer {}", student))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    let answers = completed["submission"]["answers"].as_array().unwrap();
    assert_eq!(answers.len(), 1);
    // Last write wins
    assert_eq!(answers[0]["selectedOptionId"], 2);
}

#[tokio::test]
async fn students_cannot_touch_other_students_submissions() {
    let address = spawn_app().await;
    let client = reqwest::Client::new();
    let faculty = signup(&address, &client, "faculty").await;
    let student_a = signup(&address, &client, "student").await;
    let student_b = signup(&address, &client, "student").await;

    let quiz_id = create_quiz(&address, &client, &faculty, vec![question("Q", 0, 5)], 5).await;
    publish_quiz(&address, &client, &faculty, quiz_id).await;

    let start: serde_json::Value = client
        .post(format!("{}/quizSubmission/startQuizAttempt", address))
        .header("Authorization", format!("Bearer {}", student_a))
        .json(&serde_json::json!({ "quizId": quiz_id }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let submission_id = start["submission"]["id"].as_i64().unwrap();
    let q_id = start["quiz"]["questions"][0]["id"].as_str().unwrap();

    let response = client
        .post(format!("{}/quizSubmission/submitQuizAnswer/{}", address, submission_id))
        .header("Authorization", format!("Bearer {}", student_b))
        .json(&serde_json::json!({ "questionId": q_id, "selectedOptionId": 1 }))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status().as_u16(), 403);
}
