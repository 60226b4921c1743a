use axum::extract::{Form, State};
use axum::routing::post;
use axum::{Json, Router};

use crate::auth;
use crate::error::{AppError, AppResult};
use crate::state::AppState;

#[derive(Debug, Clone, serde::Deserialize, utoipa::ToSchema)]
pub struct TokenRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Clone, serde::Serialize, utoipa::ToSchema)]
pub struct TokenResponse {
    pub access_token: String,
    pub token_type: String,
}

/// `POST /auth/token` per §6: form-encoded username/password, PBKDF2 verification
/// against the stored hash, opaque bearer session token on success.
#[utoipa::path(
    post,
    path = "/api/v1/auth/token",
    tag = "auth",
    request_body(content = TokenRequest, content_type = "application/x-www-form-urlencoded"),
    responses(
        (status = 200, description = "Session token", body = TokenResponse),
        (status = 401, description = "Invalid credentials"),
        (status = 403, description = "User disabled")
    )
)]
pub(crate) async fn token(
    State(state): State<AppState>,
    Form(payload): Form<TokenRequest>,
) -> AppResult<Json<TokenResponse>> {
    let username = payload.username.trim();
    if username.is_empty() || payload.password.trim().is_empty() {
        return Err(AppError::unauthorized("Invalid credentials"));
    }

    let row = auth::find_user_by_username(&state.db, username).await?;
    let Some(row) = row else {
        return Err(AppError::unauthorized("Invalid credentials"));
    };
    if !auth::verify_password(&payload.password, &row.password_hash) {
        return Err(AppError::unauthorized("Invalid credentials"));
    }
    if row.disabled {
        return Err(AppError::forbidden("User is disabled"));
    }

    let access_token = state.auth.issue(row.id, row.username).await;
    Ok(Json(TokenResponse {
        access_token,
        token_type: "bearer".to_string(),
    }))
}

pub fn router() -> Router<AppState> {
    Router::new().route("/auth/token", post(token))
}
