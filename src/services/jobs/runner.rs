use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use sqlx::PgPool;
use tokio::sync::{Mutex, Semaphore};
use tokio_util::sync::CancellationToken;
use tracing::Instrument;
use uuid::Uuid;

use super::store;
use crate::domain::depot::DepotRow;
use crate::domain::job::{
    OptimizationJobError, OptimizationJobRow, OptimizationParameters, OptimizationResultSummary,
};
use crate::domain::shipment::ShipmentRow;
use crate::domain::vehicle::VehicleRow;
use crate::routing::constraint_model::{self, ConstraintModel, ConstraintModelConfig};
use crate::routing::materializer;
use crate::routing::solver::{self, SolverSolution, SolverStatus};

#[derive(Debug, Clone)]
pub struct JobRunnerConfig {
    pub poll_interval: Duration,
    pub max_concurrent_jobs: usize,
    pub average_speed_kmh: f64,
    pub vehicle_fixed_cost: f64,
    pub infeasible_cost: f64,
    pub temp_violation_penalty: f64,
}

/// How often the in-flight solve's progress estimate is recomputed and, if changed,
/// persisted while the solver itself is blocked on a single long-running call.
const PROGRESS_TICK_INTERVAL: Duration = Duration::from_secs(10);

impl Default for JobRunnerConfig {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_millis(500),
            max_concurrent_jobs: 2,
            average_speed_kmh: 35.0,
            vehicle_fixed_cost: 50_000.0,
            infeasible_cost: 10_000_000.0,
            temp_violation_penalty: 1_000.0,
        }
    }
}

pub struct JobRunner {
    db: PgPool,
    config: JobRunnerConfig,
    semaphore: Arc<Semaphore>,
    running: Arc<Mutex<HashMap<Uuid, CancellationToken>>>,
}

impl JobRunner {
    pub fn new(db: PgPool, config: JobRunnerConfig) -> Self {
        let max_concurrency = config.max_concurrent_jobs.max(1);
        Self {
            db,
            config,
            semaphore: Arc::new(Semaphore::new(max_concurrency)),
            running: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    pub async fn request_cancel(&self, job_id: Uuid) -> Result<Option<OptimizationJobRow>, sqlx::Error> {
        let updated = store::request_cancel(&self.db, job_id).await?;
        if updated.is_some() {
            let token = { self.running.lock().await.get(&job_id).cloned() };
            if let Some(token) = token {
                token.cancel();
            }
        }
        Ok(updated)
    }

    pub fn start(self: Arc<Self>, cancel: CancellationToken) {
        tokio::spawn(async move {
            loop {
                tokio::select! {
                    _ = cancel.cancelled() => break,
                    _ = tokio::time::sleep(self.config.poll_interval) => {}
                }

                while let Ok(permit) = self.semaphore.clone().try_acquire_owned() {
                    let job = match store::claim_next_pending(&self.db).await {
                        Ok(job) => job,
                        Err(err) => {
                            tracing::warn!(error = %err, "optimization job poller failed to claim job");
                            drop(permit);
                            break;
                        }
                    };

                    let Some(job) = job else {
                        drop(permit);
                        break;
                    };

                    let runner = self.clone();
                    let span = tracing::info_span!(
                        "optimization_job",
                        job_id = %job.id,
                        plan_date = %job.plan_date,
                    );
                    tokio::spawn(async move {
                        let _permit = permit;
                        runner.run_one(job).instrument(span).await;
                    });
                }
            }
        });
    }

    async fn run_one(self: Arc<Self>, job: OptimizationJobRow) {
        let started = Instant::now();
        let job_id = job.id;
        let cancel = CancellationToken::new();
        {
            self.running.lock().await.insert(job_id, cancel.clone());
        }

        tracing::info!("optimization job execution started");
        let outcome = self.execute(&job, cancel).await;

        {
            self.running.lock().await.remove(&job_id);
        }

        match outcome {
            Ok(summary) => {
                tracing::info!(
                    duration_ms = started.elapsed().as_millis() as u64,
                    routes_created = summary.routes_created,
                    shipments_unassigned = summary.shipments_unassigned,
                    solver_status = %summary.solver_status,
                    "optimization job completed"
                );
            }
            Err(JobFailure::Cancelled) => {
                if let Err(err) = store::mark_cancelled(&self.db, job_id).await {
                    tracing::warn!(error = %err, "failed to persist cancelled optimization job");
                }
                tracing::info!(duration_ms = started.elapsed().as_millis() as u64, "optimization job cancelled");
            }
            Err(JobFailure::Failed(error)) => {
                if let Err(err) = store::mark_failed(&self.db, job_id, &error).await {
                    tracing::warn!(error = %err, "failed to persist failed optimization job");
                }
                tracing::warn!(
                    duration_ms = started.elapsed().as_millis() as u64,
                    error_message = %error.error_message,
                    "optimization job failed"
                );
            }
        }
    }

    async fn execute(
        &self,
        job: &OptimizationJobRow,
        cancel: CancellationToken,
    ) -> Result<OptimizationResultSummary, JobFailure> {
        if job.cancel_requested_at.is_some() {
            return Err(JobFailure::Cancelled);
        }

        let parameters = job.parameters.0.clone();
        parameters.validate().map_err(JobFailure::invalid)?;

        let depot = self.load_depot(job).await?;
        let vehicles = self.load_vehicles(&job.vehicle_ids).await?;
        let shipments = self.load_shipments(&job.shipment_ids).await?;

        if vehicles.is_empty() {
            return Err(JobFailure::invalid("no vehicles available for this plan".to_string()));
        }

        self.report_progress(job.id, 10).await;
        if cancel.is_cancelled() {
            return Err(JobFailure::Cancelled);
        }

        let model_config = ConstraintModelConfig {
            average_speed_kmh: self.config.average_speed_kmh,
            vehicle_fixed_cost: self.config.vehicle_fixed_cost,
            infeasible_cost: self.config.infeasible_cost,
        };
        let model = constraint_model::build(&depot, &vehicles, &shipments, &parameters, &model_config);

        self.report_progress(job.id, 25).await;

        let solve_started = Instant::now();
        let solution = self.solve_with_progress(job.id, &parameters, &model, solve_started).await?;
        let solve_time_seconds = solve_started.elapsed().as_secs_f64();

        if cancel.is_cancelled() {
            return Err(JobFailure::Cancelled);
        }

        if matches!(solution.status, SolverStatus::Infeasible) && !parameters.allow_partial {
            return Err(JobFailure::infeasible());
        }

        self.report_progress(job.id, 80).await;

        let outcome = materializer::materialize(
            &self.db,
            job.plan_date,
            job.id,
            &depot,
            &vehicles,
            &shipments,
            &model,
            &solution,
        )
        .await
        .map_err(JobFailure::db_error)?;

        self.report_progress(job.id, 95).await;

        let summary = OptimizationResultSummary {
            routes_created: outcome.route_ids.len() as i64,
            shipments_assigned: shipments.len() as i64 - outcome.unassigned_shipment_ids.len() as i64,
            shipments_unassigned: outcome.unassigned_shipment_ids.len() as i64,
            total_distance_km: outcome.total_distance_km,
            total_duration_minutes: outcome.total_duration_minutes,
            total_cost: outcome.total_cost,
            solver_status: solution.status.as_str().to_string(),
            solver_time_seconds: solve_time_seconds,
        };

        store::mark_completed(&self.db, job.id, &outcome.route_ids, &outcome.unassigned_shipment_ids, &summary)
            .await
            .map_err(JobFailure::db_error)?;

        Ok(summary)
    }

    /// Runs the synchronous, CPU-bound solve on a blocking thread (§5 — it must not
    /// stall the shared cooperative runtime the HTTP front end also uses) while a
    /// parallel ticking task advances the job's persisted progress, per §4.1 step 2:
    /// `progress = min(95, floor((elapsed / time_limit) * 95))`, written only when the
    /// bucket actually changes so the single-writer `progress` column isn't hammered.
    async fn solve_with_progress(
        &self,
        job_id: Uuid,
        parameters: &OptimizationParameters,
        model: &ConstraintModel,
        solve_started: Instant,
    ) -> Result<SolverSolution, JobFailure> {
        let time_limit_seconds = parameters.time_limit_seconds.max(1) as f64;
        let db = self.db.clone();
        let reporter_cancel = CancellationToken::new();

        let reporter_handle = {
            let reporter_cancel = reporter_cancel.clone();
            tokio::spawn(async move {
                let mut last_written: Option<i32> = None;
                let mut ticker = tokio::time::interval(PROGRESS_TICK_INTERVAL);
                ticker.tick().await;
                loop {
                    tokio::select! {
                        _ = reporter_cancel.cancelled() => break,
                        _ = ticker.tick() => {
                            let elapsed_seconds = solve_started.elapsed().as_secs_f64();
                            let fraction = (elapsed_seconds / time_limit_seconds).clamp(0.0, 1.0);
                            let progress = ((fraction * 95.0).floor() as i32).clamp(0, 95);
                            if last_written != Some(progress) {
                                if let Err(err) = store::update_progress(&db, job_id, progress).await {
                                    tracing::warn!(error = %err, job_id = %job_id, "failed to write optimization job progress");
                                }
                                last_written = Some(progress);
                            }
                        }
                    }
                }
            })
        };

        let model = model.clone();
        let solve_result = tokio::task::spawn_blocking(move || solver::solve(&model))
            .await
            .map_err(|err| JobFailure::solver_error(format!("solver task panicked: {err}")));

        reporter_cancel.cancel();
        if tokio::time::timeout(Duration::from_secs(2), reporter_handle).await.is_err() {
            tracing::warn!(job_id = %job_id, "progress reporter task did not shut down promptly");
        }

        solve_result?.map_err(JobFailure::solver_error)
    }

    async fn report_progress(&self, job_id: Uuid, progress: i32) {
        if let Err(err) = store::update_progress(&self.db, job_id, progress).await {
            tracing::warn!(error = %err, job_id = %job_id, "failed to write optimization job progress");
        }
    }

    async fn load_depot(&self, job: &OptimizationJobRow) -> Result<DepotRow, JobFailure> {
        let row: Option<DepotRow> = sqlx::query_as(
            "SELECT id, latitude, longitude, address, active, created_at, updated_at FROM depots WHERE id = $1",
        )
        .bind(job.depot_id)
        .fetch_optional(&self.db)
        .await
        .map_err(JobFailure::db_error)?;
        row.ok_or_else(|| JobFailure::invalid("depot for this job no longer exists".to_string()))
    }

    async fn load_vehicles(&self, vehicle_ids: &[Uuid]) -> Result<Vec<VehicleRow>, JobFailure> {
        sqlx::query_as(
            r#"
            SELECT id, license_plate, capacity_weight, capacity_volume, insulation_grade, door_type,
                   has_strip_curtains, heat_transfer_coefficient, door_coefficient, cooling_rate,
                   min_temp_capability, status, current_latitude, current_longitude, created_at, updated_at
            FROM vehicles
            WHERE id = ANY($1)
            "#,
        )
        .bind(vehicle_ids)
        .fetch_all(&self.db)
        .await
        .map_err(JobFailure::db_error)
    }

    async fn load_shipments(&self, shipment_ids: &[Uuid]) -> Result<Vec<ShipmentRow>, JobFailure> {
        sqlx::query_as(
            r#"
            SELECT id, order_number, latitude, longitude, time_windows, sla_tier, temp_limit_upper,
                   temp_limit_lower, service_duration, weight, volume, priority, status, route_id,
                   route_sequence, created_at, updated_at
            FROM shipments
            WHERE id = ANY($1)
            "#,
        )
        .bind(shipment_ids)
        .fetch_all(&self.db)
        .await
        .map_err(JobFailure::db_error)
    }
}

enum JobFailure {
    Cancelled,
    Failed(OptimizationJobError),
}

impl JobFailure {
    fn invalid(message: String) -> Self {
        JobFailure::Failed(OptimizationJobError {
            error_message: message,
            error_traceback: None,
        })
    }

    fn infeasible() -> Self {
        JobFailure::Failed(OptimizationJobError {
            error_message: "no feasible solution found within the given constraints".to_string(),
            error_traceback: None,
        })
    }

    fn solver_error(err: String) -> Self {
        JobFailure::Failed(OptimizationJobError {
            error_message: "solver failed to produce a solution".to_string(),
            error_traceback: Some(err),
        })
    }

    fn db_error(err: sqlx::Error) -> Self {
        JobFailure::Failed(OptimizationJobError {
            error_message: "a database error occurred while running this job".to_string(),
            error_traceback: Some(err.to_string()),
        })
    }
}
