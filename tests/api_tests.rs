// tests/api_tests.rs

use campus_portal::{config::Config, routes, state::AppState};
use sqlx::postgres::PgPoolOptions;
use std::net::SocketAddr;

/// Helper function to spawn the app on a random port for testing.
/// Returns the base URL (e.g., "http://127.0.0.1:12345").
async fn spawn_app() -> String {
    // Note: For Postgres, you must have a running database.
    // We'll read from DATABASE_URL environment variable.
    let database_url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set");

    // 1. Create a pool
    let pool = PgPoolOptions::new()
        .max_connections(1)
        .connect(&database_url)
        .await
        .expect("Failed to connect to Postgres for testing. Make sure DATABASE_URL is set.");

    // 2. Run migrations
    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .expect("Failed to migrate database");

    // 3. Create test configuration and state
    let config = Config {
        database_url: database_url.clone(),
        jwt_secret: "test_secret_for_integration_tests".to_string(),
        jwt_expiration: 600, // 10 minutes for tests
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

    // 4. Create the router with the app state
    let app = routes::create_router(state);

    // 5. Bind to port 0 to get a random available port
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind random port");

    let port = listener.local_addr().unwrap().port();
    let address = format!("http://127.0.0.1:{}", port);

    // 6. Spawn the server in the background
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

fn unique_login(prefix: &str) -> String {
    format!("{}_{}", prefix, &uuid::Uuid::new_v4().to_string()[..8])
}

/// Registers and logs in a user, returning (token, user_id).
async fn signup(address: &str, client: &reqwest::Client, role: &str) -> (String, i64) {
    let login_id = unique_login(role);

    let register = client
        .post(format!("{}/auth/register", address))
        .json(&serde_json::json!({
            "loginId": login_id,
            "password": "password123",
            "role": role,
            "name": "Test User",
            "email": "test@example.edu",
            "branch": "Computer Science",
            "semester": if role == "student" { Some(4) } else { None }
        }))
        .send()
        .await
        .expect("Register failed");
    assert_eq!(register.status().as_u16(), 201);

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

    assert_eq!(login["success"], true);
    let token = login["token"].as_str().expect("Token not found").to_string();
    let user_id = login["user"]["id"].as_i64().expect("User id not found");
    (token, user_id)
}

#[tokio::test]
async fn health_check_404() {
    // Arrange
    let address = spawn_app().await;
    let client = reqwest::Client::new();

    // Act
    let response = client
        .get(format!("{}/random_path_that_does_not_exist", address))
        .send()
        .await
        .expect("Failed to execute request");

    // Assert
    assert_eq!(response.status().as_u16(), 404);
}

#[tokio::test]
async fn register_works() {
    // Arrange
    let address = spawn_app().await;
    let client = reqwest::Client::new();

    // Act
    let response = client
        .post(format!("{}/auth/register", address))
        .json(&serde_json::json!({
            "loginId": unique_login("u"),
            "password": "password123",
            "role": "student",
            "name": "New Student",
            "email": "student@example.edu",
            "branch": "Computer Science",
            "semester": 3
        }))
        .send()
        .await
        .expect("Failed to execute request");

    // Assert
    assert_eq!(response.status().as_u16(), 201);
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["success"], true);
    // Password hash must never leak.
    assert!(body["user"].get("password").is_none());
}

#[tokio::test]
async fn register_fails_validation() {
    // Arrange
    let address = spawn_app().await;
    let client = reqwest::Client::new();

    // Act: Send a login id that is too short
    let response = client
        .post(format!("{}/auth/register", address))
        .json(&serde_json::json!({
            "loginId": "yo",
            "password": "password123",
            "role": "student",
            "name": "Shorty",
            "email": "short@example.edu"
        }))
        .send()
        .await
        .expect("Failed to execute request");

    // Assert
    assert_eq!(response.status().as_u16(), 400);
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["success"], false);
}

#[tokio::test]
async fn register_rejects_admin_role() {
    let address = spawn_app().await;
    let client = reqwest::Client::new();

    let response = client
        .post(format!("{}/auth/register", address))
        .json(&serde_json::json!({
            "loginId": unique_login("evil"),
            "password": "password123",
            "role": "admin",
            "name": "Not An Admin",
            "email": "evil@example.edu"
        }))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status().as_u16(), 400);
}

#[tokio::test]
async fn login_rejects_role_mismatch() {
    // Arrange: a student account
    let address = spawn_app().await;
    let client = reqwest::Client::new();
    let login_id = unique_login("s");

    client
        .post(format!("{}/auth/register", address))
        .json(&serde_json::json!({
            "loginId": login_id,
            "password": "password123",
            "role": "student",
            "name": "Role Tester",
            "email": "role@example.edu"
        }))
        .send()
        .await
        .unwrap();

    // Act: log in through the faculty form
    let response = client
        .post(format!("{}/auth/login", address))
        .json(&serde_json::json!({
            "loginId": login_id,
            "password": "password123",
            "role": "faculty"
        }))
        .send()
        .await
        .unwrap();

    // Assert
    assert_eq!(response.status().as_u16(), 401);
}

#[tokio::test]
async fn admin_routes_forbidden_for_students() {
    let address = spawn_app().await;
    let client = reqwest::Client::new();
    let (token, _) = signup(&address, &client, "student").await;

    let response = client
        .get(format!("{}/admin/users", address))
        .header("Authorization", format!("Bearer {}", token))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status().as_u16(), 403);
}

#[tokio::test]
async fn profile_me_returns_current_user() {
    let address = spawn_app().await;
    let client = reqwest::Client::new();
    let (token, user_id) = signup(&address, &client, "faculty").await;

    let me: serde_json::Value = client
        .get(format!("{}/auth/me", address))
        .header("Authorization", format!("Bearer {}", token))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    assert_eq!(me["success"], true);
    assert_eq!(me["user"]["id"].as_i64().unwrap(), user_id);
    assert_eq!(me["user"]["role"], "faculty");
}

#[tokio::test]
async fn marks_upload_and_nested_read() {
    let address = spawn_app().await;
    let client = reqwest::Client::new();
    let (faculty_token, _) = signup(&address, &client, "faculty").await;
    let (student_token, student_id) = signup(&address, &client, "student").await;

    // Upload ISA1 marks for two subjects
    let upload = client
        .post(format!("{}/marks/addMarks", address))
        .header("Authorization", format!("Bearer {}", faculty_token))
        .json(&serde_json::json!({
            "studentId": student_id,
            "examType": "ISA1",
            "marks": { "Maths": 25, "Physics": 21 }
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(upload.status().as_u16(), 200);

    // The student reads them back grouped by exam type
    let marks: serde_json::Value = client
        .get(format!("{}/marks/getMarks/{}", address, student_id))
        .header("Authorization", format!("Bearer {}", student_token))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    assert_eq!(marks["success"], true);
    assert_eq!(marks["marks"]["ISA1"]["Maths"], 25);
    assert_eq!(marks["marks"]["ISA1"]["Physics"], 21);
}

#[tokio::test]
async fn marks_over_exam_maximum_rejected_without_partial_write() {
    let address = spawn_app().await;
    let client = reqwest::Client::new();
    let (faculty_token, _) = signup(&address, &client, "faculty").await;
    let (student_token, student_id) = signup(&address, &client, "student").await;

    // ISA1 is capped at 30; "Physics": 45 must reject the whole upload.
    let upload = client
        .post(format!("{}/marks/addMarks", address))
        .header("Authorization", format!("Bearer {}", faculty_token))
        .json(&serde_json::json!({
            "studentId": student_id,
            "examType": "ISA1",
            "marks": { "Maths": 20, "Physics": 45 }
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(upload.status().as_u16(), 400);

    let marks: serde_json::Value = client
        .get(format!("{}/marks/getMarks/{}", address, student_id))
        .header("Authorization", format!("Bearer {}", student_token))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    // Neither subject was written.
    assert!(marks["marks"].get("ISA1").is_none());
}

#[tokio::test]
async fn students_cannot_read_other_students_marks() {
    let address = spawn_app().await;
    let client = reqwest::Client::new();
    let (token_a, _) = signup(&address, &client, "student").await;
    let (_token_b, student_b) = signup(&address, &client, "student").await;

    let response = client
        .get(format!("{}/marks/getMarks/{}", address, student_b))
        .header("Authorization", format!("Bearer {}", token_a))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status().as_u16(), 403);
}

#[tokio::test]
async fn assignment_submit_and_evaluate_flow() {
    let address = spawn_app().await;
    let client = reqwest::Client::new();
    let (faculty_token, _) = signup(&address, &client, "faculty").await;
    let (student_token, _) = signup(&address, &client, "student").await;

    // Faculty creates an assignment
    let assignment: serde_json::Value = client
        .post(format!("{}/assignment/createAssignment", address))
        .header("Authorization", format!("Bearer {}", faculty_token))
        .json(&serde_json::json!({
            "title": "Sorting worksheet",
            "description": "Implement three sorts",
            "subject": "Algorithms",
            "branch": "Computer Science",
            "semester": 4,
            "dueDate": "2030-01-01T00:00:00Z",
            "totalMarks": 20,
            "assessmentType": "ISA1"
        }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let assignment_id = assignment["assignment"]["id"].as_i64().unwrap();

    // Student submits
    let submission: serde_json::Value = client
        .post(format!("{}/assignment/submitAssignment/{}", address, assignment_id))
        .header("Authorization", format!("Bearer {}", student_token))
        .json(&serde_json::json!({ "fileUrl": "https://files.example.edu/work.pdf" }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let submission_id = submission["submission"]["id"].as_i64().unwrap();
    assert_eq!(submission["submission"]["status"], "Submitted");

    // Marks above the assignment total are rejected
    let over = client
        .post(format!("{}/assignment/evaluateSubmission/{}", address, submission_id))
        .header("Authorization", format!("Bearer {}", faculty_token))
        .json(&serde_json::json!({ "marks": 25, "feedback": "generous" }))
        .send()
        .await
        .unwrap();
    assert_eq!(over.status().as_u16(), 400);

    // Faculty evaluates
    let evaluated: serde_json::Value = client
        .post(format!("{}/assignment/evaluateSubmission/{}", address, submission_id))
        .header("Authorization", format!("Bearer {}", faculty_token))
        .json(&serde_json::json!({ "marks": 17, "feedback": "Good work" }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(evaluated["submission"]["status"], "Evaluated");
    assert_eq!(evaluated["submission"]["marks"], 17);

    // A graded submission is frozen
    let resubmit = client
        .post(format!("{}/assignment/submitAssignment/{}", address, assignment_id))
        .header("Authorization", format!("Bearer {}", student_token))
        .json(&serde_json::json!({ "fileUrl": "https://files.example.edu/work_v2.pdf" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resubmit.status().as_u16(), 409);
}
