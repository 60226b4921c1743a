mod password;

use axum::extract::{FromRef, FromRequestParts};
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use chrono::{DateTime, Duration as ChronoDuration, Utc};
use rand::rngs::OsRng;
use rand::RngCore;
use sqlx::PgPool;
use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::error::{AppError, AppResult};

pub use password::{hash_password, verify_password};

/// A user resolved from a bearer session token. This service has one role: authenticated
/// or not — no capability sets, unlike the dashboard this was adapted from.
#[derive(Debug, Clone)]
pub struct AuthenticatedUser {
    pub id: Uuid,
    pub username: String,
}

#[derive(Debug)]
struct SessionEntry {
    user_id: Uuid,
    username: String,
    expires_at: DateTime<Utc>,
}

#[derive(Debug)]
pub struct AuthManager {
    sessions: RwLock<HashMap<String, SessionEntry>>,
    ttl: ChronoDuration,
}

impl AuthManager {
    pub fn new(token_ttl_minutes: i64) -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
            ttl: ChronoDuration::minutes(token_ttl_minutes),
        }
    }

    pub async fn issue(&self, user_id: Uuid, username: String) -> String {
        let mut buf = [0u8; 32];
        OsRng.fill_bytes(&mut buf);
        let token = URL_SAFE_NO_PAD.encode(buf);
        let expires_at = Utc::now() + self.ttl;
        let mut sessions = self.sessions.write().await;
        sessions.insert(
            token.clone(),
            SessionEntry {
                user_id,
                username,
                expires_at,
            },
        );
        token
    }

    pub async fn resolve(&self, token: &str) -> Option<(Uuid, String)> {
        let mut sessions = self.sessions.write().await;
        let entry = sessions.get(token)?;
        if entry.expires_at <= Utc::now() {
            sessions.remove(token);
            return None;
        }
        Some((entry.user_id, entry.username.clone()))
    }

    pub async fn prune_expired(&self) -> usize {
        let mut sessions = self.sessions.write().await;
        let now = Utc::now();
        let expired: Vec<String> = sessions
            .iter()
            .filter_map(|(token, entry)| (entry.expires_at <= now).then(|| token.clone()))
            .collect();
        for token in &expired {
            sessions.remove(token);
        }
        expired.len()
    }
}

#[derive(Debug, Clone)]
pub struct AuthUser(pub AuthenticatedUser);

impl<S> FromRequestParts<S> for AuthUser
where
    Arc<AuthManager>: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = AppError;

    fn from_request_parts(
        parts: &mut Parts,
        state: &S,
    ) -> impl Future<Output = Result<Self, Self::Rejection>> + Send {
        let manager = Arc::<AuthManager>::from_ref(state);
        let token_result: Result<String, AppError> = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.strip_prefix("Bearer "))
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .map(str::to_string)
            .ok_or_else(|| AppError::unauthorized("Missing or invalid token"));

        async move {
            let token = token_result?;
            let (id, username) = manager
                .resolve(&token)
                .await
                .ok_or_else(|| AppError::unauthorized("Missing or invalid token"))?;
            Ok(AuthUser(AuthenticatedUser { id, username }))
        }
    }
}

#[derive(sqlx::FromRow)]
pub(crate) struct UserAuthRow {
    pub id: Uuid,
    pub username: String,
    pub password_hash: String,
    pub disabled: bool,
}

pub(crate) async fn find_user_by_username(
    db: &PgPool,
    username: &str,
) -> AppResult<Option<UserAuthRow>> {
    sqlx::query_as("SELECT id, username, password_hash, disabled FROM users WHERE username = $1")
        .bind(username)
        .fetch_optional(db)
        .await
        .map_err(|err| {
            tracing::error!(error = %err, "database error resolving user");
            AppError::internal("Internal server error")
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn issued_tokens_resolve_until_expiry() {
        let manager = AuthManager::new(60);
        let user_id = Uuid::new_v4();
        let token = manager.issue(user_id, "alice".to_string()).await;
        let resolved = manager.resolve(&token).await;
        assert_eq!(resolved.map(|(id, _)| id), Some(user_id));
    }

    #[tokio::test]
    async fn unknown_token_does_not_resolve() {
        let manager = AuthManager::new(60);
        assert!(manager.resolve("nonexistent").await.is_none());
    }

    #[tokio::test]
    async fn prune_expired_removes_expired_sessions() {
        let manager = AuthManager::new(-1);
        let token = manager.issue(Uuid::new_v4(), "bob".to_string()).await;
        assert_eq!(manager.prune_expired().await, 1);
        assert!(manager.resolve(&token).await.is_none());
    }
}
