// src/config.rs

use dotenvy::dotenv;
use std::env;

/// Number of seconds past a submission deadline during which quiz traffic
/// is still accepted, to absorb client clock skew and network latency.
pub const QUIZ_GRACE_SECONDS: i64 = 30;

/// Maximum marks per exam type (ISA1/ISA2 and ESA respectively).
pub const ISA_MAX_MARKS: i64 = 30;
pub const ESA_MAX_MARKS: i64 = 60;

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub jwt_secret: String,
    pub jwt_expiration: u64,
    pub rust_log: String,
    pub admin_login_id: Option<String>,
    pub admin_password: Option<String>,
    /// Base URL of an OpenAI-compatible chat completions API.
    /// Question generation is disabled when unset.
    pub ai_api_url: Option<String>,
    pub ai_api_key: Option<String>,
    pub ai_model: String,
}

impl Config {
    pub fn from_env() -> Self {
        dotenv().ok();

        let database_url = env::var("DATABASE_URL").expect("DATABASE_URL must be set");

        let jwt_secret = env::var("JWT_SECRET").expect("JWT_SECRET must be set");

        let jwt_expiration = env::var("JWT_EXPIRATION")
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
            .unwrap_or(86400);

        let rust_log = env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string());

        let admin_login_id = env::var("ADMIN_LOGIN_ID").ok();
        let admin_password = env::var("ADMIN_PASSWORD").ok();

        let ai_api_url = env::var("AI_API_URL").ok();
        let ai_api_key = env::var("AI_API_KEY").ok();
        let ai_model = env::var("AI_MODEL").unwrap_or_else(|_| "gpt-4o-mini".to_string());

        Self {
            database_url,
            jwt_secret,
            jwt_expiration,
            rust_log,
            admin_login_id,
            admin_password,
            ai_api_url,
            ai_api_key,
            ai_model,
        }
    }
}
