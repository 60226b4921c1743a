//! Classifies why each unassigned shipment was dropped, without re-solving (§C).
//! Priority order is fixed: CAPACITY, then TIME_WINDOW, then SLA, then TEMPERATURE as
//! the default fallback.

use crate::domain::job::ViolationReason;
use crate::domain::shipment::ShipmentRow;
use crate::domain::vehicle::VehicleRow;
use crate::routing::matrices::{haversine_meters, Coordinate};

pub struct ClassificationInputs<'a> {
    pub depot: Coordinate,
    pub vehicles: &'a [VehicleRow],
    pub earliest_departure_minutes: u32,
    pub average_speed_kmh: f64,
}

pub fn classify(shipment: &ShipmentRow, inputs: &ClassificationInputs) -> ViolationReason {
    if exceeds_every_vehicle_capacity(shipment, inputs.vehicles) {
        return ViolationReason::Capacity;
    }

    if is_unreachable_within_own_window(shipment, inputs) {
        return ViolationReason::TimeWindow;
    }

    if shipment.sla_tier_enum().is_strict() {
        return ViolationReason::Sla;
    }

    ViolationReason::Temperature
}

fn exceeds_every_vehicle_capacity(shipment: &ShipmentRow, vehicles: &[VehicleRow]) -> bool {
    if vehicles.is_empty() {
        return true;
    }
    vehicles.iter().all(|vehicle| {
        let over_weight = shipment.weight > vehicle.capacity_weight;
        let over_volume = shipment
            .volume
            .map(|v| v > vehicle.capacity_volume)
            .unwrap_or(false);
        over_weight || over_volume
    })
}

fn is_unreachable_within_own_window(shipment: &ShipmentRow, inputs: &ClassificationInputs) -> bool {
    let Some((_, widest_end)) = shipment.widest_window_minutes() else {
        return false;
    };

    let distance_meters = haversine_meters(
        inputs.depot,
        Coordinate {
            latitude: shipment.latitude,
            longitude: shipment.longitude,
        },
    );
    let meters_per_minute = inputs.average_speed_kmh * 1000.0 / 60.0;
    let travel_minutes = (distance_meters / meters_per_minute).round() as u32;

    widest_end < inputs.earliest_departure_minutes + travel_minutes
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::enums::SlaTier;
    use crate::domain::shipment::TimeWindow;
    use chrono::Utc;
    use sqlx::types::Json as SqlJson;
    use uuid::Uuid;

    fn vehicle(capacity_weight: f64, capacity_volume: f64) -> VehicleRow {
        VehicleRow {
            id: Uuid::new_v4(),
            license_plate: "ABC-1".to_string(),
            capacity_weight,
            capacity_volume,
            insulation_grade: "STANDARD".to_string(),
            door_type: "ROLL".to_string(),
            has_strip_curtains: false,
            heat_transfer_coefficient: 0.05,
            door_coefficient: 0.8,
            cooling_rate: -2.0,
            min_temp_capability: -10.0,
            status: "AVAILABLE".to_string(),
            current_latitude: None,
            current_longitude: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn shipment(weight: f64, window: (&str, &str), sla: SlaTier) -> ShipmentRow {
        ShipmentRow {
            id: Uuid::new_v4(),
            order_number: "ORD-1".to_string(),
            latitude: 25.10,
            longitude: 121.60,
            time_windows: SqlJson(vec![TimeWindow {
                start: window.0.to_string(),
                end: window.1.to_string(),
            }]),
            sla_tier: sla.as_str().to_string(),
            temp_limit_upper: 5.0,
            temp_limit_lower: None,
            service_duration: 10,
            weight,
            volume: None,
            priority: 50,
            status: "PENDING".to_string(),
            route_id: None,
            route_sequence: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn base_inputs(vehicles: &[VehicleRow]) -> ClassificationInputs<'_> {
        ClassificationInputs {
            depot: Coordinate {
                latitude: 25.033,
                longitude: 121.565,
            },
            vehicles,
            earliest_departure_minutes: 360,
            average_speed_kmh: 35.0,
        }
    }

    #[test]
    fn overweight_shipment_is_classified_as_capacity() {
        let vehicles = vec![vehicle(10.0, 10.0)];
        let shipment = shipment(50.0, ("06:00", "20:00"), SlaTier::Standard);
        assert_eq!(classify(&shipment, &base_inputs(&vehicles)), ViolationReason::Capacity);
    }

    #[test]
    fn unreachable_window_beats_sla_and_temperature() {
        let vehicles = vec![vehicle(100.0, 100.0)];
        let shipment = shipment(10.0, ("00:00", "00:30"), SlaTier::Strict);
        assert_eq!(classify(&shipment, &base_inputs(&vehicles)), ViolationReason::TimeWindow);
    }

    #[test]
    fn strict_sla_with_reachable_window_and_capacity_falls_to_sla() {
        let vehicles = vec![vehicle(100.0, 100.0)];
        let shipment = shipment(10.0, ("06:00", "22:00"), SlaTier::Strict);
        assert_eq!(classify(&shipment, &base_inputs(&vehicles)), ViolationReason::Sla);
    }

    #[test]
    fn standard_shipment_with_no_other_reason_defaults_to_temperature() {
        let vehicles = vec![vehicle(100.0, 100.0)];
        let shipment = shipment(10.0, ("06:00", "22:00"), SlaTier::Standard);
        assert_eq!(classify(&shipment, &base_inputs(&vehicles)), ViolationReason::Temperature);
    }

    #[test]
    fn no_vehicles_at_all_counts_as_capacity() {
        let shipment = shipment(10.0, ("06:00", "22:00"), SlaTier::Standard);
        assert_eq!(classify(&shipment, &base_inputs(&[])), ViolationReason::Capacity);
    }
}
