//! Translates domain objects into a backend-neutral VRP constraint model (§4.3):
//! nodes, dimensions, disjunctions, and fixed costs, expressed without reference to any
//! particular solver library. `routing::solver` is the only module that knows how to
//! feed this into an actual metaheuristic backend.

use uuid::Uuid;

use crate::domain::depot::DepotRow;
use crate::domain::job::OptimizationParameters;
use crate::domain::shipment::ShipmentRow;
use crate::domain::vehicle::VehicleRow;
use crate::routing::matrices::{distance_matrix, time_matrix, Coordinate};

/// One node in the routing graph. Index 0 is always the depot.
#[derive(Debug, Clone)]
pub struct Node {
    pub shipment_id: Option<Uuid>,
    pub latitude: f64,
    pub longitude: f64,
    /// Time windows as `(start_minutes, end_minutes)`, already union-hulled per §4.3c
    /// when the shipment has more than one window; the original windows are kept
    /// alongside for the materializer to determine which one was actually hit.
    pub window_domain: (u32, u32),
    pub original_windows: Vec<(u32, u32)>,
    pub service_minutes: u32,
    pub demand_weight_grams: u32,
    pub demand_volume_liters: u32,
    pub is_strict: bool,
    pub priority: i32,
    pub temp_limit_upper: f64,
    pub temp_limit_lower: Option<f64>,
}

impl Node {
    pub fn is_depot(&self) -> bool {
        self.shipment_id.is_none()
    }
}

#[derive(Debug, Clone)]
pub struct VehicleSpec {
    pub vehicle_id: Uuid,
    pub license_plate: String,
    pub capacity_weight_grams: u32,
    pub capacity_volume_liters: u32,
    pub fixed_cost: f64,
}

/// Disjunction penalty for dropping a shipment node, per §4.3d.
#[derive(Debug, Clone, Copy)]
pub struct DropPenalty {
    pub node_index: usize,
    pub penalty: f64,
}

#[derive(Debug, Clone, Copy)]
pub enum FirstSolutionStrategy {
    ParallelCheapestInsertion,
}

#[derive(Debug, Clone, Copy)]
pub enum Metaheuristic {
    GuidedLocalSearch,
}

#[derive(Debug, Clone, Copy)]
pub struct SearchConfig {
    pub first_solution: FirstSolutionStrategy,
    pub metaheuristic: Metaheuristic,
    pub time_limit_seconds: u32,
}

/// The fully backend-neutral VRP instance §4.3 describes.
#[derive(Debug, Clone)]
pub struct ConstraintModel {
    pub nodes: Vec<Node>,
    pub vehicles: Vec<VehicleSpec>,
    pub distance_matrix: Vec<Vec<u32>>,
    pub time_matrix: Vec<Vec<u32>>,
    pub drop_penalties: Vec<DropPenalty>,
    pub earliest_departure_minutes: u32,
    pub time_dimension_slack_minutes: u32,
    pub time_dimension_horizon_minutes: u32,
    pub time_dimension_span_cost_coefficient: f64,
    pub ambient_temperature: f64,
    pub initial_vehicle_temp: f64,
    pub search: SearchConfig,
}

pub struct ConstraintModelConfig {
    pub average_speed_kmh: f64,
    pub vehicle_fixed_cost: f64,
    pub infeasible_cost: f64,
}

/// Builds the matrices (§4.3a) plus the full constraint model (§4.3b–f) from the loaded
/// depot, vehicles, and shipments for a single optimization job.
pub fn build(
    depot: &DepotRow,
    vehicles: &[VehicleRow],
    shipments: &[ShipmentRow],
    parameters: &OptimizationParameters,
    config: &ConstraintModelConfig,
) -> ConstraintModel {
    let mut nodes = Vec::with_capacity(1 + shipments.len());
    nodes.push(Node {
        shipment_id: None,
        latitude: depot.latitude,
        longitude: depot.longitude,
        window_domain: (0, 24 * 60),
        original_windows: vec![(0, 24 * 60)],
        service_minutes: 0,
        demand_weight_grams: 0,
        demand_volume_liters: 0,
        is_strict: false,
        priority: 0,
        temp_limit_upper: f64::INFINITY,
        temp_limit_lower: None,
    });

    for shipment in shipments {
        let windows: Vec<(u32, u32)> = shipment
            .time_windows
            .0
            .iter()
            .filter_map(|w| (*w).to_minutes().ok())
            .collect();
        let window_domain = if windows.is_empty() {
            (0, 24 * 60)
        } else {
            let start = windows.iter().map(|(s, _)| *s).min().unwrap();
            let end = windows.iter().map(|(_, e)| *e).max().unwrap();
            (start, end)
        };

        nodes.push(Node {
            shipment_id: Some(shipment.id),
            latitude: shipment.latitude,
            longitude: shipment.longitude,
            window_domain,
            original_windows: windows,
            service_minutes: shipment.service_duration.max(0) as u32,
            demand_weight_grams: (shipment.weight * 1000.0).ceil() as u32,
            demand_volume_liters: shipment
                .volume
                .map(|v| (v * 1000.0).ceil() as u32)
                .unwrap_or(0),
            is_strict: shipment.sla_tier_enum().is_strict(),
            priority: shipment.priority,
            temp_limit_upper: shipment.temp_limit_upper,
            temp_limit_lower: shipment.temp_limit_lower,
        });
    }

    let coordinates: Vec<Coordinate> = nodes
        .iter()
        .map(|n| Coordinate {
            latitude: n.latitude,
            longitude: n.longitude,
        })
        .collect();
    let distance_matrix = distance_matrix(&coordinates);
    let time_matrix = time_matrix(&distance_matrix, config.average_speed_kmh);

    let capped_vehicles = if parameters.max_vehicles > 0 {
        &vehicles[..vehicles.len().min(parameters.max_vehicles as usize)]
    } else {
        vehicles
    };

    let vehicle_specs: Vec<VehicleSpec> = capped_vehicles
        .iter()
        .map(|v| VehicleSpec {
            vehicle_id: v.id,
            license_plate: v.license_plate.clone(),
            capacity_weight_grams: (v.capacity_weight * 1000.0) as u32,
            capacity_volume_liters: (v.capacity_volume * 1000.0) as u32,
            fixed_cost: config.vehicle_fixed_cost,
        })
        .collect();

    let drop_penalties: Vec<DropPenalty> = nodes
        .iter()
        .enumerate()
        .skip(1)
        .map(|(index, node)| {
            let penalty = if node.is_strict {
                config.infeasible_cost
            } else {
                (config.vehicle_fixed_cost * 3.0 * (101 - node.priority.clamp(0, 100)) as f64
                    / 100.0)
                    .floor()
            };
            DropPenalty {
                node_index: index,
                penalty,
            }
        })
        .collect();

    ConstraintModel {
        nodes,
        vehicles: vehicle_specs,
        distance_matrix,
        time_matrix,
        drop_penalties,
        earliest_departure_minutes: parameters.earliest_departure_minutes(),
        time_dimension_slack_minutes: 60,
        time_dimension_horizon_minutes: 24 * 60,
        time_dimension_span_cost_coefficient: 10.0,
        ambient_temperature: parameters.ambient_temperature,
        initial_vehicle_temp: parameters.initial_vehicle_temp,
        search: SearchConfig {
            first_solution: FirstSolutionStrategy::ParallelCheapestInsertion,
            metaheuristic: Metaheuristic::GuidedLocalSearch,
            time_limit_seconds: parameters.time_limit_seconds,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::enums::SlaTier;
    use crate::domain::job::OptimizationStrategy;
    use crate::domain::shipment::TimeWindow;
    use chrono::Utc;
    use sqlx::types::Json as SqlJson;

    fn depot() -> DepotRow {
        DepotRow {
            id: Uuid::new_v4(),
            latitude: 25.0330,
            longitude: 121.5654,
            address: "Depot".to_string(),
            active: true,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn shipment(weight: f64, priority: i32, sla: SlaTier) -> ShipmentRow {
        ShipmentRow {
            id: Uuid::new_v4(),
            order_number: "ORD-1".to_string(),
            latitude: 25.0478,
            longitude: 121.5170,
            time_windows: SqlJson(vec![TimeWindow {
                start: "08:00".to_string(),
                end: "12:00".to_string(),
            }]),
            sla_tier: sla.as_str().to_string(),
            temp_limit_upper: 5.0,
            temp_limit_lower: None,
            service_duration: 10,
            weight,
            volume: None,
            priority,
            status: "PENDING".to_string(),
            route_id: None,
            route_sequence: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn params() -> OptimizationParameters {
        OptimizationParameters {
            time_limit_seconds: 300,
            strategy: OptimizationStrategy::MinimizeVehicles,
            ambient_temperature: 30.0,
            initial_vehicle_temp: -5.0,
            allow_partial: false,
            max_vehicles: 0,
            planned_departure_time: "06:00".to_string(),
        }
    }

    fn config() -> ConstraintModelConfig {
        ConstraintModelConfig {
            average_speed_kmh: 30.0,
            vehicle_fixed_cost: 50_000.0,
            infeasible_cost: 10_000_000.0,
        }
    }

    fn vehicle(license_plate: &str) -> VehicleRow {
        VehicleRow {
            id: Uuid::new_v4(),
            license_plate: license_plate.to_string(),
            capacity_weight: 500.0,
            capacity_volume: 2.0,
            insulation_grade: "STANDARD".to_string(),
            door_type: "ROLL".to_string(),
            has_strip_curtains: false,
            heat_transfer_coefficient: 0.05,
            door_coefficient: 0.8,
            cooling_rate: 1.0,
            min_temp_capability: -20.0,
            status: "AVAILABLE".to_string(),
            current_latitude: None,
            current_longitude: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn max_vehicles_zero_keeps_the_full_fleet() {
        let vehicles = vec![vehicle("V1"), vehicle("V2"), vehicle("V3")];
        let model = build(&depot(), &vehicles, &[], &params(), &config());
        assert_eq!(model.vehicles.len(), 3);
    }

    #[test]
    fn max_vehicles_caps_the_fleet_to_the_requested_count() {
        let vehicles = vec![vehicle("V1"), vehicle("V2"), vehicle("V3")];
        let mut capped = params();
        capped.max_vehicles = 2;
        let model = build(&depot(), &vehicles, &[], &capped, &config());
        assert_eq!(model.vehicles.len(), 2);
        assert_eq!(model.vehicles[0].license_plate, "V1");
        assert_eq!(model.vehicles[1].license_plate, "V2");
    }

    #[test]
    fn strict_shipment_gets_infeasible_cost_as_drop_penalty() {
        let model = build(
            &depot(),
            &[],
            &[shipment(50.0, 50, SlaTier::Strict)],
            &params(),
            &config(),
        );
        assert_eq!(model.drop_penalties.len(), 1);
        assert_eq!(model.drop_penalties[0].penalty, 10_000_000.0);
    }

    #[test]
    fn standard_shipment_penalty_follows_priority_formula() {
        let model = build(
            &depot(),
            &[],
            &[shipment(50.0, 80, SlaTier::Standard)],
            &params(),
            &config(),
        );
        let expected = (50_000.0_f64 * 3.0 * (101 - 80) as f64 / 100.0).floor();
        assert_eq!(model.drop_penalties[0].penalty, expected);
    }

    #[test]
    fn higher_priority_drop_costs_more() {
        let low = build(
            &depot(),
            &[],
            &[shipment(50.0, 10, SlaTier::Standard)],
            &params(),
            &config(),
        );
        let high = build(
            &depot(),
            &[],
            &[shipment(50.0, 90, SlaTier::Standard)],
            &params(),
            &config(),
        );
        assert!(high.drop_penalties[0].penalty > low.drop_penalties[0].penalty);
    }

    #[test]
    fn depot_is_always_node_zero_with_full_day_window() {
        let model = build(&depot(), &[], &[], &params(), &config());
        assert_eq!(model.nodes.len(), 1);
        assert!(model.nodes[0].is_depot());
        assert_eq!(model.nodes[0].window_domain, (0, 24 * 60));
    }

    #[test]
    fn weight_demand_is_converted_to_grams_and_rounded_up() {
        let model = build(
            &depot(),
            &[],
            &[shipment(1.2345, 50, SlaTier::Standard)],
            &params(),
            &config(),
        );
        assert_eq!(model.nodes[1].demand_weight_grams, 1235);
    }
}
