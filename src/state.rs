use crate::config::Config;
use crate::utils::ai::AiClient;
use axum::extract::FromRef;
use sqlx::PgPool;

#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
    pub config: Config,
    /// Present only when the AI endpoint is configured.
    pub ai: Option<AiClient>,
}

impl FromRef<AppState> for PgPool {
    fn from_ref(state: &AppState) -> Self {
        state.pool.clone()
    }
}

impl FromRef<AppState> for Config {
    fn from_ref(state: &AppState) -> Self {
        state.config.clone()
    }
}

impl FromRef<AppState> for Option<AiClient> {
    fn from_ref(state: &AppState) -> Self {
        state.ai.clone()
    }
}
