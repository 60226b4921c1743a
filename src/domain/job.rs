use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::types::Json as SqlJson;
use uuid::Uuid;

use super::enums::JobStatus;
use crate::domain::shipment::parse_hhmm;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OptimizationStrategy {
    MinimizeVehicles,
    MinimizeDistance,
}

/// The closed parameter set a submission may tune, per the job orchestrator's contract.
#[derive(Debug, Clone, Serialize, Deserialize, utoipa::ToSchema)]
pub struct OptimizationParameters {
    #[serde(default = "default_time_limit")]
    pub time_limit_seconds: u32,
    #[serde(default = "default_strategy")]
    pub strategy: OptimizationStrategy,
    pub ambient_temperature: f64,
    pub initial_vehicle_temp: f64,
    #[serde(default)]
    pub allow_partial: bool,
    #[serde(default)]
    pub max_vehicles: u32,
    pub planned_departure_time: String,
}

fn default_time_limit() -> u32 {
    300
}

fn default_strategy() -> OptimizationStrategy {
    OptimizationStrategy::MinimizeVehicles
}

impl OptimizationParameters {
    pub fn validate(&self) -> Result<(), String> {
        if !(10..=3600).contains(&self.time_limit_seconds) {
            return Err("time_limit_seconds must be between 10 and 3600".to_string());
        }
        parse_hhmm(&self.planned_departure_time)
            .map_err(|err| format!("planned_departure_time: {err}"))?;
        Ok(())
    }

    pub fn earliest_departure_minutes(&self) -> u32 {
        parse_hhmm(&self.planned_departure_time).unwrap_or(0)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, utoipa::ToSchema)]
pub struct OptimizationJobError {
    pub error_message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_traceback: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, utoipa::ToSchema)]
pub struct OptimizationResultSummary {
    pub routes_created: i64,
    pub shipments_assigned: i64,
    pub shipments_unassigned: i64,
    pub total_distance_km: f64,
    pub total_duration_minutes: i64,
    pub total_cost: f64,
    pub solver_status: String,
    pub solver_time_seconds: f64,
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct OptimizationJobRow {
    pub id: Uuid,
    pub status: String,
    pub progress: i32,
    pub plan_date: NaiveDate,
    pub depot_id: Uuid,
    pub vehicle_ids: Vec<Uuid>,
    pub shipment_ids: Vec<Uuid>,
    pub route_ids: Vec<Uuid>,
    pub unassigned_shipment_ids: Vec<Uuid>,
    pub parameters: SqlJson<OptimizationParameters>,
    pub result_summary: Option<SqlJson<OptimizationResultSummary>>,
    pub error_message: Option<String>,
    pub error_traceback: Option<String>,
    pub created_by: Option<Uuid>,
    pub job_key: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    pub cancel_requested_at: Option<DateTime<Utc>>,
}

impl OptimizationJobRow {
    pub fn status_enum(&self) -> JobStatus {
        JobStatus::from_str_db(&self.status)
    }

    pub fn to_public(&self) -> OptimizationJobPublic {
        OptimizationJobPublic {
            id: self.id,
            status: self.status_enum(),
            progress: self.progress,
            plan_date: self.plan_date,
            depot_id: self.depot_id,
            vehicle_ids: self.vehicle_ids.clone(),
            shipment_ids: self.shipment_ids.clone(),
            route_ids: self.route_ids.clone(),
            unassigned_shipment_ids: self.unassigned_shipment_ids.clone(),
            parameters: self.parameters.0.clone(),
            result_summary: self.result_summary.as_ref().map(|v| v.0.clone()),
            error_message: self.error_message.clone(),
            error_traceback: self.error_traceback.clone(),
            created_at: self.created_at,
            updated_at: self.updated_at,
            started_at: self.started_at,
            completed_at: self.completed_at,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, utoipa::ToSchema)]
pub struct OptimizationJobPublic {
    pub id: Uuid,
    pub status: JobStatus,
    pub progress: i32,
    pub plan_date: NaiveDate,
    pub depot_id: Uuid,
    pub vehicle_ids: Vec<Uuid>,
    pub shipment_ids: Vec<Uuid>,
    pub route_ids: Vec<Uuid>,
    pub unassigned_shipment_ids: Vec<Uuid>,
    pub parameters: OptimizationParameters,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result_summary: Option<OptimizationResultSummary>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_traceback: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Deserialize, utoipa::ToSchema)]
pub struct OptimizationSubmitRequest {
    pub plan_date: NaiveDate,
    #[serde(default)]
    pub vehicle_ids: Option<Vec<Uuid>>,
    #[serde(default)]
    pub shipment_ids: Option<Vec<Uuid>>,
    #[serde(default)]
    pub depot_id: Option<Uuid>,
    pub parameters: OptimizationParameters,
    #[serde(default)]
    pub idempotency_key: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, utoipa::ToSchema)]
pub struct OptimizationSubmitResponse {
    pub job_id: Uuid,
    pub status: JobStatus,
}

#[derive(Debug, Clone, Serialize, Deserialize, utoipa::ToSchema)]
pub struct OptimizationJobEventPublic {
    pub id: i64,
    pub created_at: DateTime<Utc>,
    pub kind: String,
    pub payload: serde_json::Value,
}

/// One entry of `GET /optimization/{id}/violations` — either a temperature violation
/// on a scheduled stop, or an unassigned shipment with a classified drop reason.
#[derive(Debug, Clone, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum OptimizationViolation {
    TemperatureViolation {
        route_id: Uuid,
        shipment_id: Uuid,
        sequence_number: i32,
        violation_amount: f64,
    },
    UnassignedShipment {
        shipment_id: Uuid,
        reason: ViolationReason,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ViolationReason {
    Capacity,
    TimeWindow,
    Sla,
    Temperature,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validate_rejects_out_of_range_time_limit() {
        let params = OptimizationParameters {
            time_limit_seconds: 5,
            strategy: OptimizationStrategy::MinimizeVehicles,
            ambient_temperature: 30.0,
            initial_vehicle_temp: -5.0,
            allow_partial: false,
            max_vehicles: 0,
            planned_departure_time: "06:00".to_string(),
        };
        assert!(params.validate().is_err());
    }

    #[test]
    fn earliest_departure_minutes_parses_hhmm() {
        let params = OptimizationParameters {
            time_limit_seconds: 300,
            strategy: OptimizationStrategy::MinimizeVehicles,
            ambient_temperature: 30.0,
            initial_vehicle_temp: -5.0,
            allow_partial: false,
            max_vehicles: 0,
            planned_departure_time: "06:30".to_string(),
        };
        assert_eq!(params.earliest_departure_minutes(), 390);
    }
}
