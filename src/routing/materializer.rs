//! Turns a solved tour set into persisted `routes`/`route_stops` rows and shipment
//! status updates (§4.5). Temperature is never taken from the solver: each tour is
//! re-propagated independently through `thermo::propagate` so the stored prediction is
//! always the output of the one pure function, not whatever internal estimate the
//! solver used during search.

use chrono::{Duration as ChronoDuration, NaiveDate, Utc};
use sqlx::{PgPool, Postgres, Transaction};
use uuid::Uuid;

use crate::domain::depot::DepotRow;
use crate::domain::route::{route_code, RouteRow, RouteStopRow};
use crate::domain::shipment::ShipmentRow;
use crate::domain::vehicle::{VehicleRow, VehicleThermo};
use crate::routing::constraint_model::ConstraintModel;
use crate::routing::solver::{SolverSolution, SolverStatus};
use crate::thermo::{self, StopThermoInput};

pub struct MaterializeOutcome {
    pub route_ids: Vec<Uuid>,
    pub unassigned_shipment_ids: Vec<Uuid>,
    pub total_distance_km: f64,
    pub total_duration_minutes: i64,
    pub total_cost: f64,
}

/// Writes every non-empty tour as a `Route` + its `RouteStop`s, updates shipment
/// status/route assignment, and returns the summary used to populate the job's result.
/// Vehicles with zero visited nodes produce no Route row at all.
pub async fn materialize(
    db: &PgPool,
    plan_date: NaiveDate,
    optimization_job_id: Uuid,
    depot: &DepotRow,
    vehicles: &[VehicleRow],
    shipments: &[ShipmentRow],
    model: &ConstraintModel,
    solution: &SolverSolution,
) -> Result<MaterializeOutcome, sqlx::Error> {
    let mut tx = db.begin().await?;

    let mut route_ids = Vec::new();
    let mut total_distance_km = 0.0;
    let mut total_duration_minutes: i64 = 0;

    for tour in &solution.tours {
        if tour.stops.is_empty() {
            continue;
        }
        let vehicle = &vehicles[tour.vehicle_index];
        let route = write_route(
            &mut tx,
            plan_date,
            optimization_job_id,
            depot,
            vehicle,
            shipments,
            model,
            tour,
            solution.total_cost,
        )
        .await?;
        total_distance_km += route.total_distance_km;
        total_duration_minutes += route.total_duration_minutes as i64;
        route_ids.push(route.id);
    }

    let assigned_shipment_ids: Vec<Uuid> = solution
        .tours
        .iter()
        .flat_map(|t| &t.stops)
        .filter_map(|s| model.nodes[s.node_index].shipment_id)
        .collect();

    let unassigned_shipment_ids: Vec<Uuid> = solution
        .unassigned_node_indices
        .iter()
        .filter_map(|&index| model.nodes[index].shipment_id)
        .collect();

    for shipment_id in &unassigned_shipment_ids {
        sqlx::query(
            r#"
            UPDATE shipments
            SET status = 'PENDING', route_id = NULL, route_sequence = NULL, updated_at = now()
            WHERE id = $1
            "#,
        )
        .bind(shipment_id)
        .execute(&mut *tx)
        .await?;
    }

    let _ = assigned_shipment_ids;

    tx.commit().await?;

    Ok(MaterializeOutcome {
        route_ids,
        unassigned_shipment_ids,
        total_distance_km,
        total_duration_minutes,
        total_cost: solution.total_cost,
    })
}

#[allow(clippy::too_many_arguments)]
async fn write_route(
    tx: &mut Transaction<'_, Postgres>,
    plan_date: NaiveDate,
    optimization_job_id: Uuid,
    depot: &DepotRow,
    vehicle: &VehicleRow,
    shipments: &[ShipmentRow],
    model: &ConstraintModel,
    tour: &crate::routing::solver::SolvedTour,
    optimization_cost: f64,
) -> Result<RouteRow, sqlx::Error> {
    let vehicle_thermo = VehicleThermo::from(vehicle);

    let thermo_inputs: Vec<StopThermoInput> = tour
        .stops
        .iter()
        .enumerate()
        .map(|(i, stop)| {
            let node = &model.nodes[stop.node_index];
            let travel_minutes = if i == 0 {
                model.time_matrix[0][stop.node_index]
            } else {
                let prev_node = tour.stops[i - 1].node_index;
                model.time_matrix[prev_node][stop.node_index]
            };
            StopThermoInput {
                travel_hours: travel_minutes as f64 / 60.0,
                service_hours: node.service_minutes as f64 / 60.0,
                temp_limit_upper: node.temp_limit_upper,
                temp_limit_lower: node.temp_limit_lower,
                is_strict: node.is_strict,
            }
        })
        .collect();

    let thermo_results = thermo::propagate(
        &vehicle_thermo,
        model_ambient_temperature(model),
        model_initial_temperature(model),
        &thermo_inputs,
    );

    let route_id = Uuid::new_v4();
    let code = route_code(plan_date, &vehicle.license_plate, optimization_job_id);

    let planned_departure_at = Utc::now()
        .date_naive()
        .and_hms_opt(0, 0, 0)
        .unwrap()
        .and_utc()
        + ChronoDuration::minutes(model.earliest_departure_minutes as i64);

    let mut total_distance_meters: u64 = 0;
    let mut total_duration_minutes: i64 = 0;
    let mut total_weight = 0.0;
    let mut total_volume = 0.0;
    let mut predicted_max_temp = f64::NEG_INFINITY;

    let mut stop_rows = Vec::with_capacity(tour.stops.len());
    let mut cursor_at = planned_departure_at;

    for (i, stop) in tour.stops.iter().enumerate() {
        let node = &model.nodes[stop.node_index];
        let shipment_id = node
            .shipment_id
            .expect("tour stops never reference the depot node");
        let shipment = shipments
            .iter()
            .find(|s| s.id == shipment_id)
            .expect("solved node must correspond to a loaded shipment");

        let travel_minutes = if i == 0 {
            model.time_matrix[0][stop.node_index]
        } else {
            model.time_matrix[tour.stops[i - 1].node_index][stop.node_index]
        };
        let distance_meters = if i == 0 {
            model.distance_matrix[0][stop.node_index]
        } else {
            model.distance_matrix[tour.stops[i - 1].node_index][stop.node_index]
        };

        cursor_at = cursor_at + ChronoDuration::minutes(travel_minutes as i64);
        let arrival_at = cursor_at;
        cursor_at = cursor_at + ChronoDuration::minutes(node.service_minutes as i64);
        let departure_at = cursor_at;

        let target_window_index = node
            .original_windows
            .iter()
            .position(|(start, end)| stop.arrival_minutes >= *start && stop.arrival_minutes <= *end)
            .map(|i| i as i32)
            .unwrap_or(-1);

        let slack_minutes = node
            .original_windows
            .get(target_window_index.max(0) as usize)
            .map(|(_, end)| end.saturating_sub(stop.arrival_minutes) as i32)
            .unwrap_or(0);

        let thermo_result = thermo_results[i];
        predicted_max_temp = predicted_max_temp.max(thermo_result.arrival_temp);

        total_distance_meters += distance_meters as u64;
        total_duration_minutes += travel_minutes as i64 + node.service_minutes as i64;
        total_weight += node.demand_weight_grams as f64 / 1000.0;
        total_volume += node.demand_volume_liters as f64 / 1000.0;

        stop_rows.push(RouteStopRow {
            id: Uuid::new_v4(),
            route_id,
            sequence_number: i as i32 + 1,
            shipment_id,
            latitude: shipment.latitude,
            longitude: shipment.longitude,
            address: None,
            expected_arrival_at: arrival_at,
            expected_departure_at: departure_at,
            target_time_window_index: target_window_index,
            slack_minutes,
            predicted_arrival_temp: thermo_result.arrival_temp,
            transit_temp_rise: thermo_result.transit_temp_rise,
            service_temp_rise: thermo_result.service_temp_rise,
            cooling_applied: thermo_result.cooling_applied,
            predicted_departure_temp: thermo_result.departure_temp,
            is_temp_feasible: thermo_result.is_temp_feasible,
            distance_from_prev: distance_meters as f64 / 1000.0,
            travel_time_from_prev: travel_minutes as i32,
        });
    }

    let predicted_final_temp = thermo_results.last().map(|r| r.departure_temp).unwrap_or(0.0);
    let planned_return_at = cursor_at
        + ChronoDuration::minutes(
            model.time_matrix[tour.stops.last().map(|s| s.node_index).unwrap_or(0)][0] as i64,
        );

    let route: RouteRow = sqlx::query_as(
        r#"
        INSERT INTO routes (
            id, route_code, plan_date, vehicle_id, driver_id, status, total_stops,
            total_distance_km, total_duration_minutes, total_weight, total_volume,
            initial_temp, predicted_final_temp, predicted_max_temp,
            planned_departure_at, planned_return_at,
            depot_latitude, depot_longitude, depot_address,
            optimization_job_id, optimization_cost, created_at, updated_at
        ) VALUES (
            $1, $2, $3, $4, NULL, 'SCHEDULED', $5,
            $6, $7, $8, $9,
            $10, $11, $12,
            $13, $14,
            $15, $16, $17,
            $18, $19, now(), now()
        )
        RETURNING
            id, route_code, plan_date, vehicle_id, driver_id, status, total_stops,
            total_distance_km, total_duration_minutes, total_weight, total_volume,
            initial_temp, predicted_final_temp, predicted_max_temp,
            planned_departure_at, planned_return_at,
            depot_latitude, depot_longitude, depot_address,
            optimization_job_id, optimization_cost, created_at, updated_at
        "#,
    )
    .bind(route_id)
    .bind(&code)
    .bind(plan_date)
    .bind(vehicle.id)
    .bind(stop_rows.len() as i32)
    .bind(total_distance_meters as f64 / 1000.0)
    .bind(total_duration_minutes as i32)
    .bind(total_weight)
    .bind(total_volume)
    .bind(model_initial_temperature(model))
    .bind(predicted_final_temp)
    .bind(if predicted_max_temp.is_finite() {
        predicted_max_temp
    } else {
        model_initial_temperature(model)
    })
    .bind(planned_departure_at)
    .bind(Some(planned_return_at))
    .bind(depot.latitude)
    .bind(depot.longitude)
    .bind(&depot.address)
    .bind(optimization_job_id)
    .bind(optimization_cost)
    .fetch_one(&mut **tx)
    .await?;

    for stop in &stop_rows {
        sqlx::query(
            r#"
            INSERT INTO route_stops (
                id, route_id, sequence_number, shipment_id, latitude, longitude, address,
                expected_arrival_at, expected_departure_at, target_time_window_index,
                slack_minutes, predicted_arrival_temp, transit_temp_rise, service_temp_rise,
                cooling_applied, predicted_departure_temp, is_temp_feasible,
                distance_from_prev, travel_time_from_prev
            ) VALUES (
                $1, $2, $3, $4, $5, $6, $7,
                $8, $9, $10,
                $11, $12, $13, $14,
                $15, $16, $17,
                $18, $19
            )
            "#,
        )
        .bind(stop.id)
        .bind(stop.route_id)
        .bind(stop.sequence_number)
        .bind(stop.shipment_id)
        .bind(stop.latitude)
        .bind(stop.longitude)
        .bind(&stop.address)
        .bind(stop.expected_arrival_at)
        .bind(stop.expected_departure_at)
        .bind(stop.target_time_window_index)
        .bind(stop.slack_minutes)
        .bind(stop.predicted_arrival_temp)
        .bind(stop.transit_temp_rise)
        .bind(stop.service_temp_rise)
        .bind(stop.cooling_applied)
        .bind(stop.predicted_departure_temp)
        .bind(stop.is_temp_feasible)
        .bind(stop.distance_from_prev)
        .bind(stop.travel_time_from_prev)
        .execute(&mut **tx)
        .await?;

        sqlx::query(
            r#"
            UPDATE shipments
            SET status = 'ASSIGNED', route_id = $2, route_sequence = $3, updated_at = now()
            WHERE id = $1
            "#,
        )
        .bind(stop.shipment_id)
        .bind(route.id)
        .bind(stop.sequence_number)
        .execute(&mut **tx)
        .await?;
    }

    Ok(route)
}

fn model_ambient_temperature(model: &ConstraintModel) -> f64 {
    model.ambient_temperature
}

fn model_initial_temperature(model: &ConstraintModel) -> f64 {
    model.initial_vehicle_temp
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unassigned_shipment_ids_map_back_from_node_indices() {
        // Exercises the node->shipment lookup in isolation from the DB writes.
        let shipment_id = Uuid::new_v4();
        let nodes = vec![
            crate::routing::constraint_model::Node {
                shipment_id: None,
                latitude: 0.0,
                longitude: 0.0,
                window_domain: (0, 1440),
                original_windows: vec![(0, 1440)],
                service_minutes: 0,
                demand_weight_grams: 0,
                demand_volume_liters: 0,
                is_strict: false,
                priority: 0,
                temp_limit_upper: f64::INFINITY,
                temp_limit_lower: None,
            },
            crate::routing::constraint_model::Node {
                shipment_id: Some(shipment_id),
                latitude: 1.0,
                longitude: 1.0,
                window_domain: (0, 1440),
                original_windows: vec![(0, 1440)],
                service_minutes: 5,
                demand_weight_grams: 100,
                demand_volume_liters: 0,
                is_strict: false,
                priority: 50,
                temp_limit_upper: 5.0,
                temp_limit_lower: None,
            },
        ];
        let unassigned: Vec<Uuid> = vec![1]
            .into_iter()
            .filter_map(|index: usize| nodes[index].shipment_id)
            .collect();
        assert_eq!(unassigned, vec![shipment_id]);
    }
}
