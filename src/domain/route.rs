use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::depot::DepotSnapshot;
use super::enums::RouteStatus;

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct RouteRow {
    pub id: Uuid,
    pub route_code: String,
    pub plan_date: NaiveDate,
    pub vehicle_id: Uuid,
    pub driver_id: Option<Uuid>,
    pub status: String,
    pub total_stops: i32,
    pub total_distance_km: f64,
    pub total_duration_minutes: i32,
    pub total_weight: f64,
    pub total_volume: f64,
    pub initial_temp: f64,
    pub predicted_final_temp: f64,
    pub predicted_max_temp: f64,
    pub planned_departure_at: DateTime<Utc>,
    pub planned_return_at: Option<DateTime<Utc>>,
    pub depot_latitude: f64,
    pub depot_longitude: f64,
    pub depot_address: String,
    pub optimization_job_id: Uuid,
    pub optimization_cost: f64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl RouteRow {
    pub fn status_enum(&self) -> RouteStatus {
        RouteStatus::from_str_db(&self.status)
    }

    pub fn to_public(&self) -> RoutePublic {
        RoutePublic {
            id: self.id,
            route_code: self.route_code.clone(),
            plan_date: self.plan_date,
            vehicle_id: self.vehicle_id,
            driver_id: self.driver_id,
            status: self.status_enum(),
            total_stops: self.total_stops,
            total_distance_km: self.total_distance_km,
            total_duration_minutes: self.total_duration_minutes,
            total_weight: self.total_weight,
            total_volume: self.total_volume,
            initial_temp: self.initial_temp,
            predicted_final_temp: self.predicted_final_temp,
            predicted_max_temp: self.predicted_max_temp,
            planned_departure_at: self.planned_departure_at,
            planned_return_at: self.planned_return_at,
            depot: DepotSnapshot {
                latitude: self.depot_latitude,
                longitude: self.depot_longitude,
                address: self.depot_address.clone(),
            },
            optimization_job_id: self.optimization_job_id,
            optimization_cost: self.optimization_cost,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, utoipa::ToSchema)]
pub struct RoutePublic {
    pub id: Uuid,
    pub route_code: String,
    pub plan_date: NaiveDate,
    pub vehicle_id: Uuid,
    pub driver_id: Option<Uuid>,
    pub status: RouteStatus,
    pub total_stops: i32,
    pub total_distance_km: f64,
    pub total_duration_minutes: i32,
    pub total_weight: f64,
    pub total_volume: f64,
    pub initial_temp: f64,
    pub predicted_final_temp: f64,
    pub predicted_max_temp: f64,
    pub planned_departure_at: DateTime<Utc>,
    pub planned_return_at: Option<DateTime<Utc>>,
    pub depot: DepotSnapshot,
    pub optimization_job_id: Uuid,
    pub optimization_cost: f64,
}

/// Builds the `R-{YYYYMMDD}-{license_plate}-{short-job-id}` route code.
pub fn route_code(plan_date: NaiveDate, license_plate: &str, job_id: Uuid) -> String {
    let job_suffix: String = job_id
        .simple()
        .to_string()
        .chars()
        .rev()
        .take(8)
        .collect::<Vec<_>>()
        .into_iter()
        .rev()
        .collect();
    format!(
        "R-{}-{}-{}",
        plan_date.format("%Y%m%d"),
        license_plate,
        job_suffix
    )
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct RouteStopRow {
    pub id: Uuid,
    pub route_id: Uuid,
    pub sequence_number: i32,
    pub shipment_id: Uuid,
    pub latitude: f64,
    pub longitude: f64,
    pub address: Option<String>,
    pub expected_arrival_at: DateTime<Utc>,
    pub expected_departure_at: DateTime<Utc>,
    pub target_time_window_index: i32,
    pub slack_minutes: i32,
    pub predicted_arrival_temp: f64,
    pub transit_temp_rise: f64,
    pub service_temp_rise: f64,
    pub cooling_applied: f64,
    pub predicted_departure_temp: f64,
    pub is_temp_feasible: bool,
    pub distance_from_prev: f64,
    pub travel_time_from_prev: i32,
}

impl RouteStopRow {
    pub fn to_public(&self) -> RouteStopPublic {
        RouteStopPublic {
            id: self.id,
            route_id: self.route_id,
            sequence_number: self.sequence_number,
            shipment_id: self.shipment_id,
            latitude: self.latitude,
            longitude: self.longitude,
            address: self.address.clone(),
            expected_arrival_at: self.expected_arrival_at,
            expected_departure_at: self.expected_departure_at,
            target_time_window_index: self.target_time_window_index,
            slack_minutes: self.slack_minutes,
            predicted_arrival_temp: self.predicted_arrival_temp,
            transit_temp_rise: self.transit_temp_rise,
            service_temp_rise: self.service_temp_rise,
            cooling_applied: self.cooling_applied,
            predicted_departure_temp: self.predicted_departure_temp,
            is_temp_feasible: self.is_temp_feasible,
            distance_from_prev: self.distance_from_prev,
            travel_time_from_prev: self.travel_time_from_prev,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, utoipa::ToSchema)]
pub struct RouteStopPublic {
    pub id: Uuid,
    pub route_id: Uuid,
    pub sequence_number: i32,
    pub shipment_id: Uuid,
    pub latitude: f64,
    pub longitude: f64,
    pub address: Option<String>,
    pub expected_arrival_at: DateTime<Utc>,
    pub expected_departure_at: DateTime<Utc>,
    pub target_time_window_index: i32,
    pub slack_minutes: i32,
    pub predicted_arrival_temp: f64,
    pub transit_temp_rise: f64,
    pub service_temp_rise: f64,
    pub cooling_applied: f64,
    pub predicted_departure_temp: f64,
    pub is_temp_feasible: bool,
    pub distance_from_prev: f64,
    pub travel_time_from_prev: i32,
}

#[derive(Debug, Clone, Serialize, Deserialize, utoipa::ToSchema)]
pub struct RouteWithStops {
    #[serde(flatten)]
    pub route: RoutePublic,
    pub stops: Vec<RouteStopPublic>,
}

/// Per-stop transit/door/cooling breakdown, for `GET /routes/{id}/temperature-analysis`.
#[derive(Debug, Clone, Serialize, Deserialize, utoipa::ToSchema)]
pub struct StopTemperatureBreakdown {
    pub sequence_number: i32,
    pub shipment_id: Uuid,
    pub transit_temp_rise: f64,
    pub service_temp_rise: f64,
    pub cooling_applied: f64,
    pub predicted_arrival_temp: f64,
    pub predicted_departure_temp: f64,
    pub is_temp_feasible: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, utoipa::ToSchema)]
pub struct RouteTemperatureAnalysis {
    pub route_id: Uuid,
    pub stops: Vec<StopTemperatureBreakdown>,
}

#[derive(Debug, Clone, Deserialize, utoipa::ToSchema)]
pub struct RouteStatusUpdateRequest {
    pub status: RouteStatus,
}

#[derive(Debug, Clone, Deserialize, utoipa::ToSchema)]
pub struct RouteStopUpdateRequest {
    #[serde(default)]
    pub actual_arrival_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub actual_departure_at: Option<DateTime<Utc>>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn route_code_has_expected_shape() {
        let job_id = Uuid::parse_str("11111111-2222-3333-4444-55566677aabb").unwrap();
        let date = NaiveDate::from_ymd_opt(2026, 7, 27).unwrap();
        let code = route_code(date, "ABC-123", job_id);
        assert!(code.starts_with("R-20260727-ABC-123-"));
        assert_eq!(code.rsplit('-').next().unwrap().len(), 8);
    }
}
