//! Orchestration-facing service behind `routes::optimization`: submission validation,
//! default resolution, and the violations view that combines a completed job's
//! persisted routes with the classifier in `services::violations`.

use sqlx::PgPool;
use uuid::Uuid;

use crate::domain::job::{OptimizationJobRow, OptimizationSubmitRequest, OptimizationViolation};
use crate::routing::matrices::Coordinate;
use crate::services::jobs::store;
use crate::services::violations::{self, ClassificationInputs};
use crate::services::{depots, route_plans, shipments, vehicles};

pub struct SubmitOutcome {
    pub job: OptimizationJobRow,
    pub created: bool,
}

pub async fn submit(
    db: &PgPool,
    mut request: OptimizationSubmitRequest,
    created_by: Option<Uuid>,
) -> Result<SubmitOutcome, String> {
    request.parameters.validate()?;

    let depot_id = match request.depot_id {
        Some(id) => id,
        None => store::default_depot_id(db)
            .await
            .map_err(|e| e.to_string())?
            .ok_or_else(|| "no active depot configured and none specified".to_string())?,
    };

    let vehicle_ids = match &request.vehicle_ids {
        Some(ids) if !ids.is_empty() => ids.clone(),
        _ => store::all_available_vehicle_ids(db).await.map_err(|e| e.to_string())?,
    };
    if vehicle_ids.is_empty() {
        return Err("no available vehicles to plan with".to_string());
    }

    let shipment_ids = match &request.shipment_ids {
        Some(ids) if !ids.is_empty() => ids.clone(),
        _ => store::all_pending_shipment_ids(db, request.plan_date)
            .await
            .map_err(|e| e.to_string())?,
    };
    if shipment_ids.is_empty() {
        return Err("no pending shipments to plan".to_string());
    }

    store::validate_references(db, &vehicle_ids, &shipment_ids, depot_id).await?;
    request.depot_id = Some(depot_id);

    let (job, created) = store::create_job(db, &request, &vehicle_ids, &shipment_ids, created_by)
        .await
        .map_err(|e| e.to_string())?;

    Ok(SubmitOutcome { job, created })
}

pub async fn violations_for_job(
    db: &PgPool,
    job: &OptimizationJobRow,
    average_speed_kmh: f64,
) -> Result<Vec<OptimizationViolation>, sqlx::Error> {
    let mut out = Vec::new();

    for route_id in &job.route_ids {
        let stops = route_plans::list_stops(db, *route_id).await?;
        for stop in stops.iter().filter(|s| !s.is_temp_feasible) {
            out.push(OptimizationViolation::TemperatureViolation {
                route_id: *route_id,
                shipment_id: stop.shipment_id,
                sequence_number: stop.sequence_number,
                violation_amount: (stop.predicted_arrival_temp - 0.0).max(0.0),
            });
        }
    }

    if !job.unassigned_shipment_ids.is_empty() {
        let all_vehicles = vehicles::list(db).await?;
        let job_vehicles: Vec<_> = all_vehicles
            .into_iter()
            .filter(|v| job.vehicle_ids.contains(&v.id))
            .collect();

        if let Some(depot) = depots::get(db, job.depot_id).await? {
            let inputs = ClassificationInputs {
                depot: Coordinate {
                    latitude: depot.latitude,
                    longitude: depot.longitude,
                },
                vehicles: &job_vehicles,
                earliest_departure_minutes: job.parameters.0.earliest_departure_minutes(),
                average_speed_kmh,
            };

            for shipment_id in &job.unassigned_shipment_ids {
                if let Some(shipment) = shipments::get(db, *shipment_id).await? {
                    let reason = violations::classify(&shipment, &inputs);
                    out.push(OptimizationViolation::UnassignedShipment {
                        shipment_id: *shipment_id,
                        reason,
                    });
                }
            }
        }
    }

    Ok(out)
}
