use sqlx::PgPool;
use uuid::Uuid;

use crate::domain::route::{RouteRow, RouteStopRow, StopTemperatureBreakdown};

const ROUTE_COLUMNS: &str = r#"
    id, route_code, plan_date, vehicle_id, driver_id, status, total_stops,
    total_distance_km, total_duration_minutes, total_weight, total_volume,
    initial_temp, predicted_final_temp, predicted_max_temp,
    planned_departure_at, planned_return_at,
    depot_latitude, depot_longitude, depot_address,
    optimization_job_id, optimization_cost, created_at, updated_at
"#;

const STOP_COLUMNS: &str = r#"
    id, route_id, sequence_number, shipment_id, latitude, longitude, address,
    expected_arrival_at, expected_departure_at, target_time_window_index,
    slack_minutes, predicted_arrival_temp, transit_temp_rise, service_temp_rise,
    cooling_applied, predicted_departure_temp, is_temp_feasible,
    distance_from_prev, travel_time_from_prev
"#;

pub async fn list(db: &PgPool, plan_date: Option<chrono::NaiveDate>) -> Result<Vec<RouteRow>, sqlx::Error> {
    match plan_date {
        Some(date) => {
            sqlx::query_as(&format!(
                "SELECT {ROUTE_COLUMNS} FROM routes WHERE plan_date = $1 ORDER BY created_at ASC"
            ))
            .bind(date)
            .fetch_all(db)
            .await
        }
        None => {
            sqlx::query_as(&format!("SELECT {ROUTE_COLUMNS} FROM routes ORDER BY created_at DESC LIMIT 200"))
                .fetch_all(db)
                .await
        }
    }
}

pub async fn get(db: &PgPool, id: Uuid) -> Result<Option<RouteRow>, sqlx::Error> {
    sqlx::query_as(&format!("SELECT {ROUTE_COLUMNS} FROM routes WHERE id = $1"))
        .bind(id)
        .fetch_optional(db)
        .await
}

pub async fn list_stops(db: &PgPool, route_id: Uuid) -> Result<Vec<RouteStopRow>, sqlx::Error> {
    sqlx::query_as(&format!(
        "SELECT {STOP_COLUMNS} FROM route_stops WHERE route_id = $1 ORDER BY sequence_number ASC"
    ))
    .bind(route_id)
    .fetch_all(db)
    .await
}

pub async fn temperature_analysis(
    db: &PgPool,
    route_id: Uuid,
) -> Result<Vec<StopTemperatureBreakdown>, sqlx::Error> {
    let stops = list_stops(db, route_id).await?;
    Ok(stops
        .into_iter()
        .map(|stop| StopTemperatureBreakdown {
            sequence_number: stop.sequence_number,
            shipment_id: stop.shipment_id,
            transit_temp_rise: stop.transit_temp_rise,
            service_temp_rise: stop.service_temp_rise,
            cooling_applied: stop.cooling_applied,
            predicted_arrival_temp: stop.predicted_arrival_temp,
            predicted_departure_temp: stop.predicted_departure_temp,
            is_temp_feasible: stop.is_temp_feasible,
        })
        .collect())
}

pub async fn update_status(db: &PgPool, id: Uuid, status: &str) -> Result<Option<RouteRow>, sqlx::Error> {
    sqlx::query_as(&format!(
        "UPDATE routes SET status = $2, updated_at = now() WHERE id = $1 RETURNING {ROUTE_COLUMNS}"
    ))
    .bind(id)
    .bind(status)
    .fetch_optional(db)
    .await
}

pub async fn update_stop_actuals(
    db: &PgPool,
    stop_id: Uuid,
    actual_arrival_at: Option<chrono::DateTime<chrono::Utc>>,
    actual_departure_at: Option<chrono::DateTime<chrono::Utc>>,
) -> Result<Option<RouteStopRow>, sqlx::Error> {
    sqlx::query_as(&format!(
        r#"
        UPDATE route_stops
        SET expected_arrival_at = COALESCE($2, expected_arrival_at),
            expected_departure_at = COALESCE($3, expected_departure_at)
        WHERE id = $1
        RETURNING {STOP_COLUMNS}
        "#
    ))
    .bind(stop_id)
    .bind(actual_arrival_at)
    .bind(actual_departure_at)
    .fetch_optional(db)
    .await
}
