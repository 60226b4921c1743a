use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Deserialize;
use uuid::Uuid;

use crate::auth::AuthUser;
use crate::domain::job::{
    OptimizationJobEventPublic, OptimizationJobPublic, OptimizationSubmitRequest,
    OptimizationSubmitResponse, OptimizationViolation,
};
use crate::error::{AppError, AppResult};
use crate::services::jobs::store;
use crate::services::optimization;
use crate::state::AppState;

/// `POST /optimization` per §4.1/§6: validates and defaults the submission, then
/// defers to the job store. 202 on a fresh job, 200 when an `idempotency_key` matched
/// an already-submitted one.
#[utoipa::path(
    post,
    path = "/api/v1/optimization",
    tag = "optimization",
    request_body = OptimizationSubmitRequest,
    responses(
        (status = 202, description = "Job accepted", body = OptimizationSubmitResponse),
        (status = 400, description = "Invalid submission")
    ),
    security(("bearer" = []))
)]
pub(crate) async fn submit(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Json(request): Json<OptimizationSubmitRequest>,
) -> AppResult<(StatusCode, Json<OptimizationSubmitResponse>)> {
    let outcome = optimization::submit(&state.db, request, Some(user.id))
        .await
        .map_err(AppError::bad_request)?;

    let status = if outcome.created {
        StatusCode::ACCEPTED
    } else {
        StatusCode::OK
    };
    Ok((
        status,
        Json(OptimizationSubmitResponse {
            job_id: outcome.job.id,
            status: outcome.job.status_enum(),
        }),
    ))
}

/// `GET /optimization/{id}` per §6: poll a job's current row.
#[utoipa::path(
    get,
    path = "/api/v1/optimization/{id}",
    tag = "optimization",
    params(("id" = Uuid, Path, description = "Job id")),
    responses(
        (status = 200, description = "Job state", body = OptimizationJobPublic),
        (status = 404, description = "Unknown job")
    ),
    security(("bearer" = []))
)]
pub(crate) async fn poll(
    State(state): State<AppState>,
    AuthUser(_user): AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<OptimizationJobPublic>> {
    let job = store::get_job(&state.db, id)
        .await
        .map_err(AppError::from_db)?
        .ok_or_else(|| AppError::not_found("Job not found"))?;
    Ok(Json(job.to_public()))
}

/// `POST /optimization/{id}/cancel` per §6: 400 if the job is already terminal.
#[utoipa::path(
    post,
    path = "/api/v1/optimization/{id}/cancel",
    tag = "optimization",
    params(("id" = Uuid, Path, description = "Job id")),
    responses(
        (status = 200, description = "Cancellation requested", body = OptimizationJobPublic),
        (status = 400, description = "Job already terminal"),
        (status = 404, description = "Unknown job")
    ),
    security(("bearer" = []))
)]
pub(crate) async fn cancel(
    State(state): State<AppState>,
    AuthUser(_user): AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<OptimizationJobPublic>> {
    let existing = store::get_job(&state.db, id)
        .await
        .map_err(AppError::from_db)?
        .ok_or_else(|| AppError::not_found("Job not found"))?;

    if existing.status_enum().is_terminal() {
        return Err(AppError::new(StatusCode::BAD_REQUEST, "Job is already terminal"));
    }

    let updated = state
        .jobs
        .request_cancel(id)
        .await
        .map_err(AppError::from_db)?
        .ok_or_else(|| AppError::new(StatusCode::BAD_REQUEST, "Job is already terminal"))?;
    Ok(Json(updated.to_public()))
}

/// `GET /optimization/{id}/violations` per §6: temperature violations on scheduled
/// stops plus a classified reason for every unassigned shipment.
#[utoipa::path(
    get,
    path = "/api/v1/optimization/{id}/violations",
    tag = "optimization",
    params(("id" = Uuid, Path, description = "Job id")),
    responses(
        (status = 200, description = "Violations", body = [OptimizationViolation]),
        (status = 404, description = "Unknown job")
    ),
    security(("bearer" = []))
)]
pub(crate) async fn violations(
    State(state): State<AppState>,
    AuthUser(_user): AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<Vec<OptimizationViolation>>> {
    let job = store::get_job(&state.db, id)
        .await
        .map_err(AppError::from_db)?
        .ok_or_else(|| AppError::not_found("Job not found"))?;

    let violations = optimization::violations_for_job(&state.db, &job, state.config.average_speed_kmh)
        .await
        .map_err(AppError::from_db)?;
    Ok(Json(violations))
}

#[derive(Debug, Deserialize)]
pub(crate) struct EventsQuery {
    #[serde(default)]
    after: i64,
    #[serde(default = "default_events_limit")]
    limit: i64,
}

fn default_events_limit() -> i64 {
    100
}

/// `GET /optimization/{id}/events` — the audit trail `POST /optimization` implicitly
/// creates (§B.2), not named as a path in spec.md but returned by the same job store
/// the poll/cancel endpoints use.
#[utoipa::path(
    get,
    path = "/api/v1/optimization/{id}/events",
    tag = "optimization",
    params(
        ("id" = Uuid, Path, description = "Job id"),
        ("after" = Option<i64>, Query, description = "Only events with id greater than this"),
        ("limit" = Option<i64>, Query, description = "Max events to return (default 100, max 500)"),
    ),
    responses((status = 200, description = "Job events", body = [OptimizationJobEventPublic])),
    security(("bearer" = []))
)]
pub(crate) async fn events(
    State(state): State<AppState>,
    AuthUser(_user): AuthUser,
    Path(id): Path<Uuid>,
    Query(query): Query<EventsQuery>,
) -> AppResult<Json<Vec<OptimizationJobEventPublic>>> {
    let events = store::list_events(&state.db, id, query.after, query.limit)
        .await
        .map_err(AppError::from_db)?;
    Ok(Json(events))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/optimization", post(submit))
        .route("/optimization/:id", get(poll))
        .route("/optimization/:id/cancel", post(cancel))
        .route("/optimization/:id/violations", get(violations))
        .route("/optimization/:id/events", get(events))
}
