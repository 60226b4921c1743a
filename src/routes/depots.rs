use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use uuid::Uuid;

use crate::auth::AuthUser;
use crate::domain::depot::{DepotCreateRequest, DepotPublic};
use crate::error::{AppError, AppResult};
use crate::services::depots as service;
use crate::state::AppState;

#[utoipa::path(
    get,
    path = "/api/v1/depots",
    tag = "depots",
    responses((status = 200, description = "Depots", body = [DepotPublic])),
    security(("bearer" = []))
)]
pub(crate) async fn list(
    State(state): State<AppState>,
    AuthUser(_user): AuthUser,
) -> AppResult<Json<Vec<DepotPublic>>> {
    let rows = service::list(&state.db).await?;
    Ok(Json(rows.iter().map(|r| r.to_public()).collect()))
}

#[utoipa::path(
    get,
    path = "/api/v1/depots/{id}",
    tag = "depots",
    params(("id" = Uuid, Path, description = "Depot id")),
    responses(
        (status = 200, description = "Depot", body = DepotPublic),
        (status = 404, description = "Unknown depot")
    ),
    security(("bearer" = []))
)]
pub(crate) async fn get(
    State(state): State<AppState>,
    AuthUser(_user): AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<DepotPublic>> {
    let row = service::get(&state.db, id)
        .await?
        .ok_or_else(|| AppError::not_found("Depot not found"))?;
    Ok(Json(row.to_public()))
}

#[utoipa::path(
    post,
    path = "/api/v1/depots",
    tag = "depots",
    request_body = DepotCreateRequest,
    responses((status = 201, description = "Depot created", body = DepotPublic)),
    security(("bearer" = []))
)]
pub(crate) async fn create(
    State(state): State<AppState>,
    AuthUser(_user): AuthUser,
    Json(request): Json<DepotCreateRequest>,
) -> AppResult<(StatusCode, Json<DepotPublic>)> {
    let row = service::create(&state.db, &request).await?;
    Ok((StatusCode::CREATED, Json(row.to_public())))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/depots", get(list).post(create))
        .route("/depots/:id", get(get))
}
