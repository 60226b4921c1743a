use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Serialize;
use uuid::Uuid;

use crate::auth::AuthUser;
use crate::domain::shipment::{ShipmentCreateRequest, ShipmentPublic};
use crate::error::{AppError, AppResult};
use crate::services::shipments as service;
use crate::state::AppState;

#[utoipa::path(
    get,
    path = "/api/v1/shipments",
    tag = "shipments",
    responses((status = 200, description = "Shipments", body = [ShipmentPublic])),
    security(("bearer" = []))
)]
pub(crate) async fn list(
    State(state): State<AppState>,
    AuthUser(_user): AuthUser,
) -> AppResult<Json<Vec<ShipmentPublic>>> {
    let rows = service::list(&state.db).await?;
    Ok(Json(rows.iter().map(|r| r.to_public()).collect()))
}

#[utoipa::path(
    get,
    path = "/api/v1/shipments/{id}",
    tag = "shipments",
    params(("id" = Uuid, Path, description = "Shipment id")),
    responses(
        (status = 200, description = "Shipment", body = ShipmentPublic),
        (status = 404, description = "Unknown shipment")
    ),
    security(("bearer" = []))
)]
pub(crate) async fn get(
    State(state): State<AppState>,
    AuthUser(_user): AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ShipmentPublic>> {
    let row = service::get(&state.db, id)
        .await?
        .ok_or_else(|| AppError::not_found("Shipment not found"))?;
    Ok(Json(row.to_public()))
}

#[utoipa::path(
    post,
    path = "/api/v1/shipments",
    tag = "shipments",
    request_body = ShipmentCreateRequest,
    responses((status = 201, description = "Shipment created", body = ShipmentPublic)),
    security(("bearer" = []))
)]
pub(crate) async fn create(
    State(state): State<AppState>,
    AuthUser(_user): AuthUser,
    Json(request): Json<ShipmentCreateRequest>,
) -> AppResult<(StatusCode, Json<ShipmentPublic>)> {
    let row = service::create(&state.db, &request).await?;
    Ok((StatusCode::CREATED, Json(row.to_public())))
}

#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct ShipmentResetResponse {
    pub reset_count: u64,
}

/// `POST /shipments/reset` per §6: wipes the current route plan and reverts every
/// shipment to PENDING so a fresh optimization run starts from a clean slate.
#[utoipa::path(
    post,
    path = "/api/v1/shipments/reset",
    tag = "shipments",
    responses((status = 200, description = "Shipments reset", body = ShipmentResetResponse)),
    security(("bearer" = []))
)]
pub(crate) async fn reset(
    State(state): State<AppState>,
    AuthUser(_user): AuthUser,
) -> AppResult<Json<ShipmentResetResponse>> {
    let reset_count = service::reset_all(&state.db).await?;
    Ok(Json(ShipmentResetResponse { reset_count }))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/shipments", get(list).post(create))
        .route("/shipments/:id", get(get))
        .route("/shipments/reset", post(reset))
}
