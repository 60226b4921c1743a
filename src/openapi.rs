use axum::Router;
use utoipa::OpenApi;

use crate::domain::depot::{DepotCreateRequest, DepotPublic, DepotSnapshot};
use crate::domain::job::{
    OptimizationJobEventPublic, OptimizationJobError, OptimizationJobPublic,
    OptimizationParameters, OptimizationResultSummary, OptimizationStrategy,
    OptimizationSubmitRequest, OptimizationSubmitResponse, OptimizationViolation, ViolationReason,
};
use crate::domain::route::{
    RoutePublic, RouteStatusUpdateRequest, RouteStopPublic, RouteStopUpdateRequest,
    RouteTemperatureAnalysis, RouteWithStops, StopTemperatureBreakdown,
};
use crate::domain::shipment::{ShipmentCreateRequest, ShipmentPublic, TimeWindow};
use crate::domain::vehicle::{VehicleCreateRequest, VehiclePublic};
use crate::routes::auth::{TokenRequest, TokenResponse};
use crate::routes::health::HealthResponse;

#[derive(OpenApi)]
#[openapi(
    paths(
        crate::routes::health::healthz,
        crate::routes::auth::token,
        crate::routes::optimization::submit,
        crate::routes::optimization::poll,
        crate::routes::optimization::cancel,
        crate::routes::optimization::violations,
        crate::routes::optimization::events,
        crate::routes::route_plans::list,
        crate::routes::route_plans::get,
        crate::routes::route_plans::temperature_analysis,
        crate::routes::route_plans::update_status,
        crate::routes::route_plans::update_stop,
        crate::routes::vehicles::list,
        crate::routes::vehicles::get,
        crate::routes::vehicles::create,
        crate::routes::shipments::list,
        crate::routes::shipments::get,
        crate::routes::shipments::create,
        crate::routes::shipments::reset,
        crate::routes::depots::list,
        crate::routes::depots::get,
        crate::routes::depots::create,
    ),
    components(schemas(
        HealthResponse,
        TokenRequest,
        TokenResponse,
        OptimizationStrategy,
        OptimizationParameters,
        OptimizationJobError,
        OptimizationResultSummary,
        OptimizationJobPublic,
        OptimizationSubmitRequest,
        OptimizationSubmitResponse,
        OptimizationJobEventPublic,
        OptimizationViolation,
        ViolationReason,
        RoutePublic,
        RouteStopPublic,
        RouteWithStops,
        StopTemperatureBreakdown,
        RouteTemperatureAnalysis,
        RouteStatusUpdateRequest,
        RouteStopUpdateRequest,
        DepotPublic,
        DepotSnapshot,
        DepotCreateRequest,
        VehiclePublic,
        VehicleCreateRequest,
        ShipmentPublic,
        ShipmentCreateRequest,
        TimeWindow,
    )),
    tags(
        (name = "auth", description = "Session token issuance"),
        (name = "optimization", description = "Job submission, polling, cancellation, violations"),
        (name = "routes", description = "Planned routes and stops"),
        (name = "vehicles", description = "Vehicle fleet CRUD"),
        (name = "shipments", description = "Shipment CRUD"),
        (name = "depots", description = "Depot CRUD"),
    )
)]
struct ApiDoc;

pub fn openapi_json() -> serde_json::Value {
    serde_json::to_value(ApiDoc::openapi()).expect("OpenAPI document always serializes")
}

pub fn router<S>() -> Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    Router::new().route(
        "/openapi.json",
        axum::routing::get(|| async { axum::Json(ApiDoc::openapi()) }),
    )
}
