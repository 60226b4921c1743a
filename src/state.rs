use crate::auth::AuthManager;
use crate::config::CoreConfig;
use crate::services::jobs::JobRunner;
use axum::extract::FromRef;
use sqlx::PgPool;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub config: CoreConfig,
    pub db: PgPool,
    pub auth: Arc<AuthManager>,
    pub jobs: Arc<JobRunner>,
}

impl FromRef<AppState> for Arc<AuthManager> {
    fn from_ref(state: &AppState) -> Arc<AuthManager> {
        state.auth.clone()
    }
}

impl FromRef<AppState> for PgPool {
    fn from_ref(state: &AppState) -> PgPool {
        state.db.clone()
    }
}
