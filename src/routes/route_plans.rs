use axum::extract::{Path, Query, State};
use axum::routing::{get, patch};
use axum::{Json, Router};
use chrono::NaiveDate;
use serde::Deserialize;
use uuid::Uuid;

use crate::auth::AuthUser;
use crate::domain::route::{
    RoutePublic, RouteStatusUpdateRequest, RouteStopUpdateRequest, RouteTemperatureAnalysis,
    RouteWithStops,
};
use crate::error::{AppError, AppResult};
use crate::services::route_plans as service;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub(crate) struct ListQuery {
    plan_date: Option<NaiveDate>,
    status: Option<String>,
    vehicle_id: Option<Uuid>,
}

/// `GET /routes?plan_date=&status=&vehicle_id=` per §6.
#[utoipa::path(
    get,
    path = "/api/v1/routes",
    tag = "routes",
    params(
        ("plan_date" = Option<NaiveDate>, Query, description = "Filter to a single plan date"),
        ("status" = Option<String>, Query, description = "Filter by route status"),
        ("vehicle_id" = Option<Uuid>, Query, description = "Filter by assigned vehicle"),
    ),
    responses((status = 200, description = "Routes", body = [RoutePublic])),
    security(("bearer" = []))
)]
pub(crate) async fn list(
    State(state): State<AppState>,
    AuthUser(_user): AuthUser,
    Query(query): Query<ListQuery>,
) -> AppResult<Json<Vec<RoutePublic>>> {
    let rows = service::list(&state.db, query.plan_date).await?;
    let filtered = rows
        .into_iter()
        .filter(|row| query.status.as_deref().is_none_or(|s| row.status == s))
        .filter(|row| query.vehicle_id.is_none_or(|id| row.vehicle_id == id))
        .map(|row| row.to_public())
        .collect();
    Ok(Json(filtered))
}

/// `GET /routes/{id}` per §6: the full route including ordered stops and predicted temps.
#[utoipa::path(
    get,
    path = "/api/v1/routes/{id}",
    tag = "routes",
    params(("id" = Uuid, Path, description = "Route id")),
    responses(
        (status = 200, description = "Route with stops", body = RouteWithStops),
        (status = 404, description = "Unknown route")
    ),
    security(("bearer" = []))
)]
pub(crate) async fn get(
    State(state): State<AppState>,
    AuthUser(_user): AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<RouteWithStops>> {
    let route = service::get(&state.db, id)
        .await?
        .ok_or_else(|| AppError::not_found("Route not found"))?;
    let stops = service::list_stops(&state.db, id).await?;
    Ok(Json(RouteWithStops {
        route: route.to_public(),
        stops: stops.into_iter().map(|s| s.to_public()).collect(),
    }))
}

/// `GET /routes/{id}/temperature-analysis` per §6/§B.3: per-stop transit/door/cooling
/// breakdown.
#[utoipa::path(
    get,
    path = "/api/v1/routes/{id}/temperature-analysis",
    tag = "routes",
    params(("id" = Uuid, Path, description = "Route id")),
    responses((status = 200, description = "Per-stop temperature breakdown", body = RouteTemperatureAnalysis)),
    security(("bearer" = []))
)]
pub(crate) async fn temperature_analysis(
    State(state): State<AppState>,
    AuthUser(_user): AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<RouteTemperatureAnalysis>> {
    let stops = service::temperature_analysis(&state.db, id).await?;
    Ok(Json(RouteTemperatureAnalysis {
        route_id: id,
        stops,
    }))
}

/// `PATCH /routes/{id}/status` per §6: execution status update.
#[utoipa::path(
    patch,
    path = "/api/v1/routes/{id}/status",
    tag = "routes",
    params(("id" = Uuid, Path, description = "Route id")),
    request_body = RouteStatusUpdateRequest,
    responses(
        (status = 200, description = "Updated route", body = RoutePublic),
        (status = 404, description = "Unknown route")
    ),
    security(("bearer" = []))
)]
pub(crate) async fn update_status(
    State(state): State<AppState>,
    AuthUser(_user): AuthUser,
    Path(id): Path<Uuid>,
    Json(request): Json<RouteStatusUpdateRequest>,
) -> AppResult<Json<RoutePublic>> {
    let updated = service::update_status(&state.db, id, request.status.as_str())
        .await?
        .ok_or_else(|| AppError::not_found("Route not found"))?;
    Ok(Json(updated.to_public()))
}

/// `PATCH /routes/{id}/stops/{stop_id}` per §6: execution status update for one stop.
#[utoipa::path(
    patch,
    path = "/api/v1/routes/{id}/stops/{stop_id}",
    tag = "routes",
    params(
        ("id" = Uuid, Path, description = "Route id"),
        ("stop_id" = Uuid, Path, description = "Stop id"),
    ),
    request_body = RouteStopUpdateRequest,
    responses(
        (status = 200, description = "Updated stop"),
        (status = 404, description = "Unknown stop")
    ),
    security(("bearer" = []))
)]
pub(crate) async fn update_stop(
    State(state): State<AppState>,
    AuthUser(_user): AuthUser,
    Path((_id, stop_id)): Path<(Uuid, Uuid)>,
    Json(request): Json<RouteStopUpdateRequest>,
) -> AppResult<Json<crate::domain::route::RouteStopPublic>> {
    let updated = service::update_stop_actuals(
        &state.db,
        stop_id,
        request.actual_arrival_at,
        request.actual_departure_at,
    )
    .await?
    .ok_or_else(|| AppError::not_found("Stop not found"))?;
    Ok(Json(updated.to_public()))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/routes", get(list))
        .route("/routes/:id", get(get))
        .route("/routes/:id/temperature-analysis", get(temperature_analysis))
        .route("/routes/:id/status", patch(update_status))
        .route("/routes/:id/stops/:stop_id", patch(update_stop))
}
