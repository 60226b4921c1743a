use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use uuid::Uuid;

use crate::auth::AuthUser;
use crate::domain::vehicle::{VehicleCreateRequest, VehiclePublic};
use crate::error::{AppError, AppResult};
use crate::services::vehicles as service;
use crate::state::AppState;

#[utoipa::path(
    get,
    path = "/api/v1/vehicles",
    tag = "vehicles",
    responses((status = 200, description = "Vehicles", body = [VehiclePublic])),
    security(("bearer" = []))
)]
pub(crate) async fn list(
    State(state): State<AppState>,
    AuthUser(_user): AuthUser,
) -> AppResult<Json<Vec<VehiclePublic>>> {
    let rows = service::list(&state.db).await?;
    Ok(Json(rows.iter().map(|r| r.to_public()).collect()))
}

#[utoipa::path(
    get,
    path = "/api/v1/vehicles/{id}",
    tag = "vehicles",
    params(("id" = Uuid, Path, description = "Vehicle id")),
    responses(
        (status = 200, description = "Vehicle", body = VehiclePublic),
        (status = 404, description = "Unknown vehicle")
    ),
    security(("bearer" = []))
)]
pub(crate) async fn get(
    State(state): State<AppState>,
    AuthUser(_user): AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<VehiclePublic>> {
    let row = service::get(&state.db, id)
        .await?
        .ok_or_else(|| AppError::not_found("Vehicle not found"))?;
    Ok(Json(row.to_public()))
}

#[utoipa::path(
    post,
    path = "/api/v1/vehicles",
    tag = "vehicles",
    request_body = VehicleCreateRequest,
    responses((status = 201, description = "Vehicle created", body = VehiclePublic)),
    security(("bearer" = []))
)]
pub(crate) async fn create(
    State(state): State<AppState>,
    AuthUser(_user): AuthUser,
    Json(request): Json<VehicleCreateRequest>,
) -> AppResult<(StatusCode, Json<VehiclePublic>)> {
    let row = service::create(&state.db, &request).await?;
    Ok((StatusCode::CREATED, Json(row.to_public())))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/vehicles", get(list).post(create))
        .route("/vehicles/:id", get(get))
}
