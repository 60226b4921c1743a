//! Pure thermodynamic propagation of refrigerated-compartment temperature along a tour.
//!
//! This module has no database or solver dependency: it is a function of vehicle
//! parameters, ambient temperature, an initial compartment temperature, and an ordered
//! sequence of `(travel_hours, service_hours, temp_limits)` per stop. Keeping it pure
//! lets the feasibility/penalty logic be property-tested independent of anything else.

use crate::domain::vehicle::VehicleThermo;

#[derive(Debug, Clone, Copy)]
pub struct StopThermoInput {
    pub travel_hours: f64,
    pub service_hours: f64,
    pub temp_limit_upper: f64,
    pub temp_limit_lower: Option<f64>,
    pub is_strict: bool,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StopThermoResult {
    pub arrival_temp: f64,
    pub departure_temp: f64,
    pub transit_temp_rise: f64,
    pub service_temp_rise: f64,
    pub cooling_applied: f64,
    pub is_temp_feasible: bool,
}

/// Propagates compartment temperature across a tour, one stop per `StopThermoInput`.
///
/// `departure(s_0) = initial_temp`. For stop i:
/// `arrival(s_i) = departure(s_{i-1}) + travel_hours·(ambient − departure(s_{i-1}))·K
///   + travel_hours·R`
/// `departure(s_i) = arrival(s_i) + service_hours·C·curtain_factor`
pub fn propagate(
    vehicle: &VehicleThermo,
    ambient: f64,
    initial_temp: f64,
    stops: &[StopThermoInput],
) -> Vec<StopThermoResult> {
    let mut results = Vec::with_capacity(stops.len());
    let mut departure_prev = initial_temp;

    for stop in stops {
        let transit_temp_rise = stop.travel_hours * (ambient - departure_prev) * vehicle.heat_transfer_coefficient;
        let cooling_applied = stop.travel_hours * vehicle.cooling_rate;
        let arrival_temp = departure_prev + transit_temp_rise + cooling_applied;

        let service_temp_rise = stop.service_hours * vehicle.door_coefficient * vehicle.curtain_factor;
        let departure_temp = arrival_temp + service_temp_rise;

        let within_upper = arrival_temp <= stop.temp_limit_upper;
        let within_lower = stop.temp_limit_lower.map_or(true, |lower| arrival_temp >= lower);
        let is_temp_feasible = within_upper && within_lower;

        results.push(StopThermoResult {
            arrival_temp,
            departure_temp,
            transit_temp_rise,
            service_temp_rise,
            cooling_applied,
            is_temp_feasible,
        });
        departure_prev = departure_temp;
    }

    results
}

/// `route_penalty` per §4.2: `INFEASIBLE_COST` if any STRICT stop is infeasible,
/// otherwise the sum over STANDARD stops of `max(0, arrival − upper) · temp_violation_penalty`.
pub fn route_penalty(
    stops: &[StopThermoInput],
    results: &[StopThermoResult],
    temp_violation_penalty: f64,
    infeasible_cost: f64,
) -> f64 {
    let any_strict_infeasible = stops
        .iter()
        .zip(results)
        .any(|(stop, result)| stop.is_strict && !result.is_temp_feasible);
    if any_strict_infeasible {
        return infeasible_cost;
    }

    stops
        .iter()
        .zip(results)
        .filter(|(stop, _)| !stop.is_strict)
        .map(|(stop, result)| (result.arrival_temp - stop.temp_limit_upper).max(0.0) * temp_violation_penalty)
        .sum()
}

/// `is_feasible` per §4.2: no STRICT stop violates its bound.
pub fn is_feasible(stops: &[StopThermoInput], results: &[StopThermoResult]) -> bool {
    stops
        .iter()
        .zip(results)
        .all(|(stop, result)| !stop.is_strict || result.is_temp_feasible)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn standard_insulated_van() -> VehicleThermo {
        VehicleThermo {
            heat_transfer_coefficient: 0.05,
            door_coefficient: 0.8,
            curtain_factor: 1.0,
            cooling_rate: -2.5,
        }
    }

    #[test]
    fn single_stop_matches_hand_computed_formula() {
        let vehicle = standard_insulated_van();
        let ambient = 30.0;
        let initial = -5.0;
        let stop = StopThermoInput {
            travel_hours: 0.5,
            service_hours: 0.25,
            temp_limit_upper: 5.0,
            temp_limit_lower: None,
            is_strict: false,
        };

        let results = propagate(&vehicle, ambient, initial, &[stop]);
        assert_eq!(results.len(), 1);

        let expected_transit_rise = 0.5 * (ambient - initial) * vehicle.heat_transfer_coefficient;
        let expected_cooling = 0.5 * vehicle.cooling_rate;
        let expected_arrival = initial + expected_transit_rise + expected_cooling;
        let expected_door_rise = 0.25 * vehicle.door_coefficient * vehicle.curtain_factor;
        let expected_departure = expected_arrival + expected_door_rise;

        let result = results[0];
        assert!((result.transit_temp_rise - expected_transit_rise).abs() < 1e-9);
        assert!((result.cooling_applied - expected_cooling).abs() < 1e-9);
        assert!((result.arrival_temp - expected_arrival).abs() < 1e-9);
        assert!((result.service_temp_rise - expected_door_rise).abs() < 1e-9);
        assert!((result.departure_temp - expected_departure).abs() < 1e-9);
        assert!(result.is_temp_feasible);
    }

    #[test]
    fn strip_curtains_halve_the_door_open_rise() {
        let mut vehicle = standard_insulated_van();
        let stop = StopThermoInput {
            travel_hours: 0.0,
            service_hours: 1.0,
            temp_limit_upper: 100.0,
            temp_limit_lower: None,
            is_strict: false,
        };

        let without_curtains = propagate(&vehicle, 30.0, 0.0, &[stop])[0].service_temp_rise;
        vehicle.curtain_factor = 0.5;
        let with_curtains = propagate(&vehicle, 30.0, 0.0, &[stop])[0].service_temp_rise;

        assert!((with_curtains - without_curtains * 0.5).abs() < 1e-9);
    }

    #[test]
    fn temperature_composition_law_holds_across_a_split_sequence() {
        let vehicle = standard_insulated_van();
        let ambient = 28.0;
        let initial = -6.0;
        let stops = vec![
            StopThermoInput {
                travel_hours: 0.4,
                service_hours: 0.1,
                temp_limit_upper: 8.0,
                temp_limit_lower: None,
                is_strict: false,
            },
            StopThermoInput {
                travel_hours: 0.3,
                service_hours: 0.2,
                temp_limit_upper: 8.0,
                temp_limit_lower: None,
                is_strict: false,
            },
            StopThermoInput {
                travel_hours: 0.6,
                service_hours: 0.15,
                temp_limit_upper: 8.0,
                temp_limit_lower: None,
                is_strict: false,
            },
        ];

        let whole = propagate(&vehicle, ambient, initial, &stops);

        let head = propagate(&vehicle, ambient, initial, &stops[..1]);
        let tail = propagate(&vehicle, ambient, head[0].departure_temp, &stops[1..]);

        assert!((whole[0].arrival_temp - head[0].arrival_temp).abs() < 1e-6);
        for (whole_stop, tail_stop) in whole[1..].iter().zip(tail.iter()) {
            assert!((whole_stop.arrival_temp - tail_stop.arrival_temp).abs() < 1e-6);
            assert!((whole_stop.departure_temp - tail_stop.departure_temp).abs() < 1e-6);
        }
    }

    #[test]
    fn lower_bound_violation_marks_infeasible_when_set() {
        let vehicle = standard_insulated_van();
        let stop = StopThermoInput {
            travel_hours: 2.0,
            service_hours: 0.0,
            temp_limit_upper: 100.0,
            temp_limit_lower: Some(-10.0),
            is_strict: true,
        };
        // Deep cooling over a long travel leg can push arrival below a lower bound.
        let mut vehicle_cold = vehicle;
        vehicle_cold.cooling_rate = -8.0;
        let results = propagate(&vehicle_cold, 30.0, -5.0, &[stop]);
        assert!(!results[0].is_temp_feasible);
    }

    #[test]
    fn route_penalty_is_infeasible_cost_when_any_strict_stop_violates() {
        let strict_violating = StopThermoInput {
            travel_hours: 2.0,
            service_hours: 0.0,
            temp_limit_upper: -10.0,
            temp_limit_lower: None,
            is_strict: true,
        };
        let result = StopThermoResult {
            arrival_temp: 0.0,
            departure_temp: 0.0,
            transit_temp_rise: 0.0,
            service_temp_rise: 0.0,
            cooling_applied: 0.0,
            is_temp_feasible: false,
        };
        let penalty = route_penalty(&[strict_violating], &[result], 100_000.0, 10_000_000.0);
        assert_eq!(penalty, 10_000_000.0);
        assert!(!is_feasible(&[strict_violating], &[result]));
    }

    #[test]
    fn route_penalty_accumulates_for_standard_stops_only() {
        let standard_over = StopThermoInput {
            travel_hours: 0.0,
            service_hours: 0.0,
            temp_limit_upper: 5.0,
            temp_limit_lower: None,
            is_strict: false,
        };
        let result = StopThermoResult {
            arrival_temp: 7.0,
            departure_temp: 7.0,
            transit_temp_rise: 0.0,
            service_temp_rise: 0.0,
            cooling_applied: 0.0,
            is_temp_feasible: false,
        };
        let penalty = route_penalty(&[standard_over], &[result], 1000.0, 10_000_000.0);
        assert_eq!(penalty, 2.0 * 1000.0);
    }
}
