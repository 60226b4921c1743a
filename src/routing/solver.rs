//! Drives the actual metaheuristic backend (§4.4). This is the only module that
//! touches `vrp_pragmatic`/`vrp_core` types directly; everything upstream works in the
//! backend-neutral terms of `routing::constraint_model`, and everything downstream
//! (`routing::materializer`) works in terms of `SolverSolution` below. If the solver
//! crate's exact surface drifts between releases, the blast radius is contained here.
//!
//! The pragmatic-format problem is assembled as JSON and deserialized into
//! `vrp_pragmatic::format::problem::Problem` rather than built from struct literals:
//! the wire schema (job/vehicle/shift shape) is stable across releases in a way the
//! exact Rust struct surface is not.

use std::collections::{HashMap, HashSet};
use std::io::BufWriter;
use std::sync::Arc;

use serde_json::json;
use vrp_core::solver::Builder as SolverBuilder;
use vrp_pragmatic::format::problem::Matrix as TravelMatrix;
use vrp_pragmatic::format::problem::Problem as PragmaticProblem;
use vrp_pragmatic::format::problem::PragmaticProblem as PragmaticProblemReader;
use vrp_pragmatic::format::solution::{write_pragmatic, PragmaticOutputType, Solution as PragmaticSolution};

use crate::routing::constraint_model::ConstraintModel;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SolverStatus {
    Optimal,
    Feasible,
    Infeasible,
    Timeout,
    NotSolved,
}

impl SolverStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SolverStatus::Optimal => "OPTIMAL",
            SolverStatus::Feasible => "FEASIBLE",
            SolverStatus::Infeasible => "INFEASIBLE",
            SolverStatus::Timeout => "TIMEOUT",
            SolverStatus::NotSolved => "NOT_SOLVED",
        }
    }
}

#[derive(Debug, Clone)]
pub struct SolvedStop {
    pub node_index: usize,
    pub arrival_minutes: u32,
    pub departure_minutes: u32,
}

#[derive(Debug, Clone)]
pub struct SolvedTour {
    pub vehicle_index: usize,
    pub stops: Vec<SolvedStop>,
}

#[derive(Debug, Clone)]
pub struct SolverSolution {
    pub status: SolverStatus,
    pub tours: Vec<SolvedTour>,
    pub unassigned_node_indices: Vec<usize>,
    pub total_cost: f64,
    pub solve_time_seconds: f64,
}

const MATRIX_PROFILE: &str = "default";

/// Builds a pragmatic-format problem from the constraint model, hands it to the
/// vrp-core solver, and maps the outcome back into backend-neutral terms. Purely a
/// translation/invocation shim: no business rules live here, those all live in
/// `constraint_model::build`.
pub fn solve(model: &ConstraintModel) -> Result<SolverSolution, String> {
    let started = std::time::Instant::now();

    if model.nodes.len() <= 1 || model.vehicles.is_empty() {
        return Ok(SolverSolution {
            status: SolverStatus::NotSolved,
            tours: Vec::new(),
            unassigned_node_indices: (1..model.nodes.len()).collect(),
            total_cost: 0.0,
            solve_time_seconds: started.elapsed().as_secs_f64(),
        });
    }

    let drop_penalty_by_node: HashMap<usize, f64> = model
        .drop_penalties
        .iter()
        .map(|p| (p.node_index, p.penalty))
        .collect();

    let problem_json = build_pragmatic_problem_json(model, &drop_penalty_by_node);
    let pragmatic_problem: PragmaticProblem = serde_json::from_value(problem_json)
        .map_err(|err| format!("failed to build pragmatic problem: {err}"))?;
    let matrix = build_matrix(model);

    let core_problem = Arc::new(
        (pragmatic_problem, vec![matrix])
            .read_pragmatic()
            .map_err(|err| format!("failed to read pragmatic problem: {err:?}"))?,
    );

    let max_time_secs = model.search.time_limit_seconds as u64;
    let config = SolverBuilder::new(core_problem.clone())
        .with_max_time(Some(max_time_secs))
        .build()
        .map_err(|err| format!("failed to build solver config: {err:?}"))?;

    let raw_solution = vrp_core::solver::Solver::new(core_problem.clone(), config)
        .solve()
        .map_err(|err| format!("solve failed: {err:?}"))?;

    let solve_time_seconds = started.elapsed().as_secs_f64();
    let timed_out = solve_time_seconds >= max_time_secs as f64;

    let pragmatic_solution = to_pragmatic_solution(core_problem.as_ref(), &raw_solution)?;

    Ok(map_solution(
        model,
        &raw_solution,
        &pragmatic_solution,
        timed_out,
        solve_time_seconds,
    ))
}

fn build_matrix(model: &ConstraintModel) -> TravelMatrix {
    TravelMatrix {
        profile: Some(MATRIX_PROFILE.to_string()),
        timestamp: None,
        travel_times: model
            .time_matrix
            .iter()
            .flat_map(|row| row.iter().map(|&m| (m as i64) * 60))
            .collect(),
        distances: model
            .distance_matrix
            .iter()
            .flat_map(|row| row.iter().map(|&m| m as i64))
            .collect(),
        error_codes: None,
    }
}

/// Builds the pragmatic problem as JSON (camelCase wire schema) and lets serde fill in
/// every field `vrp_pragmatic`'s `Deserialize` impls treat as optional (`objectives`,
/// `clustering`, vehicle skills/limits, job tags, ...).
fn build_pragmatic_problem_json(
    model: &ConstraintModel,
    drop_penalty_by_node: &HashMap<usize, f64>,
) -> serde_json::Value {
    let depot_location = json!({ "index": 0 });

    let jobs: Vec<serde_json::Value> = model
        .nodes
        .iter()
        .enumerate()
        .skip(1)
        .map(|(index, node)| {
            let demand = vec![node.demand_weight_grams, node.demand_volume_liters];
            let mut job = json!({
                "id": format!("node-{index}"),
                "deliveries": [{
                    "places": [{
                        "location": { "index": index },
                        "duration": node.service_minutes as f64 * 60.0,
                        "times": [[
                            minutes_to_iso(node.window_domain.0),
                            minutes_to_iso(node.window_domain.1),
                        ]],
                        "tag": serde_json::Value::Null,
                    }],
                    "demand": demand,
                }],
            });
            if let Some(&penalty) = drop_penalty_by_node.get(&index) {
                job["value"] = json!(penalty);
            }
            job
        })
        .collect();

    let vehicles: Vec<serde_json::Value> = model
        .vehicles
        .iter()
        .enumerate()
        .map(|(index, vehicle)| {
            json!({
                "typeId": format!("vehicle-type-{index}"),
                "vehicleIds": [vehicle.license_plate.clone()],
                "profile": { "matrix": MATRIX_PROFILE },
                "costs": {
                    "fixed": vehicle.fixed_cost,
                    "distance": 1.0,
                    "time": model.time_dimension_span_cost_coefficient,
                },
                "shifts": [{
                    "start": {
                        "earliest": minutes_to_iso(model.earliest_departure_minutes),
                        "location": depot_location,
                    },
                    "end": {
                        "latest": minutes_to_iso(model.time_dimension_horizon_minutes),
                        "location": depot_location,
                    },
                }],
                "capacity": [vehicle.capacity_weight_grams, vehicle.capacity_volume_liters],
            })
        })
        .collect();

    json!({
        "plan": { "jobs": jobs },
        "fleet": {
            "vehicles": vehicles,
            "profiles": [{ "name": MATRIX_PROFILE }],
        },
    })
}

fn minutes_to_iso(minutes: u32) -> String {
    format!("1970-01-01T{:02}:{:02}:00Z", minutes / 60, minutes % 60)
}

/// Parses an RFC3339 timestamp of the shape `minutes_to_iso` produces back into minutes
/// since midnight, for reading the solution's stop schedules.
fn iso_to_minutes(value: &str) -> u32 {
    value
        .get(11..16)
        .and_then(|hm| {
            let (h, m) = hm.split_once(':')?;
            Some(h.parse::<u32>().ok()? * 60 + m.parse::<u32>().ok()?)
        })
        .unwrap_or(0)
}

/// Converts the raw vrp-core solution (whose routes expose visits via `tour`/activities
/// and unassigned jobs as `(Job, UnassignmentInfo)` pairs, not a flat stop/job-id shape)
/// into the pragmatic solution format, whose `tours[].stops[].activities` gives us
/// stop-level job ids and arrival/departure directly.
fn to_pragmatic_solution(
    core_problem: &vrp_core::models::Problem,
    raw_solution: &vrp_core::models::Solution,
) -> Result<PragmaticSolution, String> {
    let mut writer = BufWriter::new(Vec::new());
    write_pragmatic(core_problem, raw_solution, PragmaticOutputType::default(), &mut writer)
        .map_err(|err| format!("failed to serialize solution: {err:?}"))?;
    let bytes = writer
        .into_inner()
        .map_err(|err| format!("failed to flush solution writer: {err}"))?;
    serde_json::from_slice(&bytes).map_err(|err| format!("failed to parse pragmatic solution: {err}"))
}

/// Translates the solver's native solution/outcome back into backend-neutral terms.
/// Node-to-route assignment and per-stop arrival times come from the converted
/// pragmatic solution's stop activities; overall cost comes from the raw vrp-core
/// solution, which is cheaper to read for that single scalar.
fn map_solution(
    model: &ConstraintModel,
    raw_solution: &vrp_core::models::Solution,
    pragmatic_solution: &PragmaticSolution,
    timed_out: bool,
    solve_time_seconds: f64,
) -> SolverSolution {
    let vehicle_index_by_plate: HashMap<&str, usize> = model
        .vehicles
        .iter()
        .enumerate()
        .map(|(index, v)| (v.license_plate.as_str(), index))
        .collect();

    let mut tours = Vec::new();
    let mut assigned: HashSet<usize> = HashSet::new();

    for tour in &pragmatic_solution.tours {
        let vehicle_index = vehicle_index_by_plate
            .get(tour.vehicle_id.as_str())
            .copied()
            .unwrap_or(0);

        let stops: Vec<SolvedStop> = tour
            .stops
            .iter()
            .flat_map(|stop| {
                let schedule = stop.schedule();
                let arrival_minutes = iso_to_minutes(&schedule.arrival);
                let departure_minutes = iso_to_minutes(&schedule.departure);
                stop.activities()
                    .into_iter()
                    .filter(|activity| activity.activity_type == "delivery")
                    .filter_map(move |activity| {
                        let node_index: usize = activity.job_id.strip_prefix("node-")?.parse().ok()?;
                        Some(SolvedStop {
                            node_index,
                            arrival_minutes,
                            departure_minutes,
                        })
                    })
            })
            .collect();

        for stop in &stops {
            assigned.insert(stop.node_index);
        }
        if !stops.is_empty() {
            tours.push(SolvedTour { vehicle_index, stops });
        }
    }

    let mut unassigned_node_indices: Vec<usize> = pragmatic_solution
        .unassigned
        .as_ref()
        .into_iter()
        .flatten()
        .filter_map(|job| job.job_id.strip_prefix("node-")?.parse().ok())
        .collect();

    for index in 1..model.nodes.len() {
        if !assigned.contains(&index) && !unassigned_node_indices.contains(&index) {
            unassigned_node_indices.push(index);
        }
    }

    let status = if tours.is_empty() {
        SolverStatus::Infeasible
    } else if timed_out {
        SolverStatus::Timeout
    } else if unassigned_node_indices.is_empty() {
        SolverStatus::Optimal
    } else {
        SolverStatus::Feasible
    };

    SolverSolution {
        status,
        tours,
        unassigned_node_indices,
        total_cost: raw_solution.cost,
        solve_time_seconds,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn iso_to_minutes_parses_hour_minute_component() {
        assert_eq!(iso_to_minutes("1970-01-01T08:05:00Z"), 485);
        assert_eq!(iso_to_minutes("1970-01-01T00:00:00Z"), 0);
    }

    #[test]
    fn iso_to_minutes_defaults_to_zero_on_garbage_input() {
        assert_eq!(iso_to_minutes("not-a-timestamp"), 0);
    }

    #[test]
    fn minutes_to_iso_round_trips_through_iso_to_minutes() {
        for minutes in [0, 59, 60, 485, 23 * 60 + 59] {
            assert_eq!(iso_to_minutes(&minutes_to_iso(minutes)), minutes);
        }
    }
}
