use sqlx::types::Json as SqlJson;
use sqlx::PgPool;
use uuid::Uuid;

use crate::domain::job::{
    OptimizationJobEventPublic, OptimizationJobError, OptimizationJobRow, OptimizationParameters,
    OptimizationResultSummary, OptimizationSubmitRequest,
};

pub const JOB_STATUS_PENDING: &str = "PENDING";
pub const JOB_STATUS_RUNNING: &str = "RUNNING";
pub const JOB_STATUS_COMPLETED: &str = "COMPLETED";
pub const JOB_STATUS_FAILED: &str = "FAILED";
pub const JOB_STATUS_CANCELLED: &str = "CANCELLED";

const JOB_COLUMNS: &str = r#"
    id, status, progress, plan_date, depot_id, vehicle_ids, shipment_ids, route_ids,
    unassigned_shipment_ids, parameters, result_summary, error_message, error_traceback,
    created_by, job_key, created_at, updated_at, started_at, completed_at, cancel_requested_at
"#;

fn job_key_hash_hex(job_key: &str) -> String {
    use sha2::Digest;
    use std::fmt::Write;
    let digest = sha2::Sha256::digest(job_key.as_bytes());
    let mut out = String::with_capacity(digest.len() * 2);
    for byte in digest {
        let _ = write!(&mut out, "{:02x}", byte);
    }
    out
}

pub async fn create_job(
    db: &PgPool,
    request: &OptimizationSubmitRequest,
    vehicle_ids: &[Uuid],
    shipment_ids: &[Uuid],
    created_by: Option<Uuid>,
) -> Result<(OptimizationJobRow, bool), sqlx::Error> {
    let dedupe_key = request
        .idempotency_key
        .as_deref()
        .map(str::trim)
        .filter(|value| !value.is_empty());
    let dedupe_hash = dedupe_key.map(job_key_hash_hex);

    if let Some(job_key_hash) = dedupe_hash.as_deref() {
        let existing: Option<OptimizationJobRow> = sqlx::query_as(&format!(
            "SELECT {JOB_COLUMNS} FROM optimization_jobs WHERE job_key_hash = $1 LIMIT 1"
        ))
        .bind(job_key_hash)
        .fetch_optional(db)
        .await?;
        if let Some(existing) = existing {
            return Ok((existing, false));
        }
    }

    let job_id = Uuid::new_v4();
    let depot_id = request
        .depot_id
        .expect("caller resolves a concrete depot_id before creating the job");
    let inserted = sqlx::query_as(&format!(
        r#"
        INSERT INTO optimization_jobs (
            id, status, progress, plan_date, depot_id, vehicle_ids, shipment_ids, route_ids,
            unassigned_shipment_ids, parameters, created_by, job_key, job_key_hash,
            created_at, updated_at
        ) VALUES (
            $1, $2, 0, $3, $4, $5, $6, ARRAY[]::uuid[],
            ARRAY[]::uuid[], $7, $8, $9, $10,
            now(), now()
        )
        RETURNING {JOB_COLUMNS}
        "#
    ))
    .bind(job_id)
    .bind(JOB_STATUS_PENDING)
    .bind(request.plan_date)
    .bind(depot_id)
    .bind(vehicle_ids)
    .bind(shipment_ids)
    .bind(SqlJson(&request.parameters))
    .bind(created_by)
    .bind(dedupe_key)
    .bind(dedupe_hash.as_deref())
    .fetch_one(db)
    .await;

    match inserted {
        Ok(row) => {
            append_event(db, job_id, "created", serde_json::json!({})).await?;
            Ok((row, true))
        }
        Err(sqlx::Error::Database(db_err)) if db_err.code().as_deref() == Some("23505") => {
            let job_key_hash = dedupe_hash.as_deref().expect("unique violation implies a dedupe key");
            let existing: OptimizationJobRow = sqlx::query_as(&format!(
                "SELECT {JOB_COLUMNS} FROM optimization_jobs WHERE job_key_hash = $1 LIMIT 1"
            ))
            .bind(job_key_hash)
            .fetch_one(db)
            .await?;
            Ok((existing, false))
        }
        Err(err) => Err(err),
    }
}

pub async fn get_job(db: &PgPool, job_id: Uuid) -> Result<Option<OptimizationJobRow>, sqlx::Error> {
    sqlx::query_as(&format!("SELECT {JOB_COLUMNS} FROM optimization_jobs WHERE id = $1"))
        .bind(job_id)
        .fetch_optional(db)
        .await
}

pub async fn append_event(
    db: &PgPool,
    job_id: Uuid,
    kind: &str,
    payload: serde_json::Value,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        INSERT INTO optimization_job_events (job_id, kind, payload, created_at)
        VALUES ($1, $2, $3, now())
        "#,
    )
    .bind(job_id)
    .bind(kind)
    .bind(SqlJson(payload))
    .execute(db)
    .await?;
    Ok(())
}

pub async fn list_events(
    db: &PgPool,
    job_id: Uuid,
    after: i64,
    limit: i64,
) -> Result<Vec<OptimizationJobEventPublic>, sqlx::Error> {
    #[derive(sqlx::FromRow)]
    struct Row {
        id: i64,
        kind: String,
        payload: SqlJson<serde_json::Value>,
        created_at: chrono::DateTime<chrono::Utc>,
    }

    let limit = limit.clamp(1, 500);
    let rows: Vec<Row> = sqlx::query_as(
        r#"
        SELECT id, kind, payload, created_at
        FROM optimization_job_events
        WHERE job_id = $1 AND id > $2
        ORDER BY id ASC
        LIMIT $3
        "#,
    )
    .bind(job_id)
    .bind(after)
    .bind(limit)
    .fetch_all(db)
    .await?;

    Ok(rows
        .into_iter()
        .map(|row| OptimizationJobEventPublic {
            id: row.id,
            created_at: row.created_at,
            kind: row.kind,
            payload: row.payload.0,
        })
        .collect())
}

pub async fn claim_next_pending(db: &PgPool) -> Result<Option<OptimizationJobRow>, sqlx::Error> {
    let mut tx = db.begin().await?;
    let claimed: Option<OptimizationJobRow> = sqlx::query_as(&format!(
        r#"
        WITH next AS (
            SELECT id
            FROM optimization_jobs
            WHERE status = $1
            ORDER BY created_at ASC
            LIMIT 1
            FOR UPDATE SKIP LOCKED
        )
        UPDATE optimization_jobs
        SET status = $2, started_at = now(), updated_at = now()
        WHERE id IN (SELECT id FROM next)
        RETURNING {JOB_COLUMNS}
        "#
    ))
    .bind(JOB_STATUS_PENDING)
    .bind(JOB_STATUS_RUNNING)
    .fetch_optional(&mut *tx)
    .await?;

    if let Some(job) = &claimed {
        sqlx::query(
            "INSERT INTO optimization_job_events (job_id, kind, payload, created_at) VALUES ($1, 'started', $2, now())",
        )
        .bind(job.id)
        .bind(SqlJson(serde_json::json!({})))
        .execute(&mut *tx)
        .await?;
    }

    tx.commit().await?;
    Ok(claimed)
}

pub async fn update_progress(db: &PgPool, job_id: Uuid, progress: i32) -> Result<(), sqlx::Error> {
    sqlx::query("UPDATE optimization_jobs SET progress = $2, updated_at = now() WHERE id = $1")
        .bind(job_id)
        .bind(progress)
        .execute(db)
        .await?;
    append_event(db, job_id, "progress", serde_json::json!({ "progress": progress })).await
}

#[allow(clippy::too_many_arguments)]
pub async fn mark_completed(
    db: &PgPool,
    job_id: Uuid,
    route_ids: &[Uuid],
    unassigned_shipment_ids: &[Uuid],
    result_summary: &OptimizationResultSummary,
) -> Result<(), sqlx::Error> {
    let mut tx = db.begin().await?;
    sqlx::query(
        r#"
        UPDATE optimization_jobs
        SET status = $2,
            progress = 100,
            route_ids = $3,
            unassigned_shipment_ids = $4,
            result_summary = $5,
            completed_at = now(),
            updated_at = now()
        WHERE id = $1
        "#,
    )
    .bind(job_id)
    .bind(JOB_STATUS_COMPLETED)
    .bind(route_ids)
    .bind(unassigned_shipment_ids)
    .bind(SqlJson(result_summary))
    .execute(&mut *tx)
    .await?;

    sqlx::query(
        "INSERT INTO optimization_job_events (job_id, kind, payload, created_at) VALUES ($1, 'completed', $2, now())",
    )
    .bind(job_id)
    .bind(SqlJson(serde_json::json!({})))
    .execute(&mut *tx)
    .await?;

    tx.commit().await?;
    Ok(())
}

pub async fn mark_failed(db: &PgPool, job_id: Uuid, error: &OptimizationJobError) -> Result<(), sqlx::Error> {
    let mut tx = db.begin().await?;
    sqlx::query(
        r#"
        UPDATE optimization_jobs
        SET status = $2, error_message = $3, error_traceback = $4, completed_at = now(), updated_at = now()
        WHERE id = $1
        "#,
    )
    .bind(job_id)
    .bind(JOB_STATUS_FAILED)
    .bind(&error.error_message)
    .bind(&error.error_traceback)
    .execute(&mut *tx)
    .await?;

    sqlx::query(
        "INSERT INTO optimization_job_events (job_id, kind, payload, created_at) VALUES ($1, 'failed', $2, now())",
    )
    .bind(job_id)
    .bind(SqlJson(serde_json::json!({ "error_message": error.error_message })))
    .execute(&mut *tx)
    .await?;

    tx.commit().await?;
    Ok(())
}

pub async fn request_cancel(db: &PgPool, job_id: Uuid) -> Result<Option<OptimizationJobRow>, sqlx::Error> {
    let mut tx = db.begin().await?;

    let cancelled_pending: Option<OptimizationJobRow> = sqlx::query_as(&format!(
        r#"
        UPDATE optimization_jobs
        SET status = $2, cancel_requested_at = now(), completed_at = now(), updated_at = now()
        WHERE id = $1 AND status = $3
        RETURNING {JOB_COLUMNS}
        "#
    ))
    .bind(job_id)
    .bind(JOB_STATUS_CANCELLED)
    .bind(JOB_STATUS_PENDING)
    .fetch_optional(&mut *tx)
    .await?;

    if let Some(job) = cancelled_pending {
        sqlx::query(
            "INSERT INTO optimization_job_events (job_id, kind, payload, created_at) VALUES ($1, 'cancelled', $2, now())",
        )
        .bind(job_id)
        .bind(SqlJson(serde_json::json!({ "before_start": true })))
        .execute(&mut *tx)
        .await?;
        tx.commit().await?;
        return Ok(Some(job));
    }

    let running_updated: Option<OptimizationJobRow> = sqlx::query_as(&format!(
        r#"
        UPDATE optimization_jobs
        SET cancel_requested_at = now(), updated_at = now()
        WHERE id = $1 AND status = $2
        RETURNING {JOB_COLUMNS}
        "#
    ))
    .bind(job_id)
    .bind(JOB_STATUS_RUNNING)
    .fetch_optional(&mut *tx)
    .await?;

    if running_updated.is_some() {
        sqlx::query(
            "INSERT INTO optimization_job_events (job_id, kind, payload, created_at) VALUES ($1, 'cancel_requested', $2, now())",
        )
        .bind(job_id)
        .bind(SqlJson(serde_json::json!({})))
        .execute(&mut *tx)
        .await?;
    }

    tx.commit().await?;
    Ok(running_updated)
}

pub async fn mark_cancelled(db: &PgPool, job_id: Uuid) -> Result<(), sqlx::Error> {
    let mut tx = db.begin().await?;
    sqlx::query(
        "UPDATE optimization_jobs SET status = $2, completed_at = now(), updated_at = now() WHERE id = $1",
    )
    .bind(job_id)
    .bind(JOB_STATUS_CANCELLED)
    .execute(&mut *tx)
    .await?;

    sqlx::query(
        "INSERT INTO optimization_job_events (job_id, kind, payload, created_at) VALUES ($1, 'cancelled', $2, now())",
    )
    .bind(job_id)
    .bind(SqlJson(serde_json::json!({ "before_start": false })))
    .execute(&mut *tx)
    .await?;

    tx.commit().await?;
    Ok(())
}

pub async fn validate_references(
    db: &PgPool,
    vehicle_ids: &[Uuid],
    shipment_ids: &[Uuid],
    depot_id: Uuid,
) -> Result<(), String> {
    let vehicle_count: (i64,) = sqlx::query_as("SELECT COUNT(*)::BIGINT FROM vehicles WHERE id = ANY($1) AND status = 'AVAILABLE'")
        .bind(vehicle_ids)
        .fetch_one(db)
        .await
        .map_err(|err| err.to_string())?;
    if vehicle_count.0 as usize != vehicle_ids.len() {
        return Err("one or more vehicle_ids are unknown or unavailable".to_string());
    }

    let shipment_count: (i64,) = sqlx::query_as("SELECT COUNT(*)::BIGINT FROM shipments WHERE id = ANY($1) AND status = 'PENDING'")
        .bind(shipment_ids)
        .fetch_one(db)
        .await
        .map_err(|err| err.to_string())?;
    if shipment_count.0 as usize != shipment_ids.len() {
        return Err("one or more shipment_ids are unknown or not PENDING".to_string());
    }

    let depot_count: (i64,) = sqlx::query_as("SELECT COUNT(*)::BIGINT FROM depots WHERE id = $1 AND active = true")
        .bind(depot_id)
        .fetch_one(db)
        .await
        .map_err(|err| err.to_string())?;
    if depot_count.0 == 0 {
        return Err("depot_id is unknown or inactive".to_string());
    }

    Ok(())
}

pub async fn default_depot_id(db: &PgPool) -> Result<Option<Uuid>, sqlx::Error> {
    let row: Option<(Uuid,)> = sqlx::query_as("SELECT id FROM depots WHERE active = true ORDER BY created_at ASC LIMIT 1")
        .fetch_optional(db)
        .await?;
    Ok(row.map(|r| r.0))
}

pub async fn all_available_vehicle_ids(db: &PgPool) -> Result<Vec<Uuid>, sqlx::Error> {
    let rows: Vec<(Uuid,)> = sqlx::query_as("SELECT id FROM vehicles WHERE status = 'AVAILABLE'")
        .fetch_all(db)
        .await?;
    Ok(rows.into_iter().map(|r| r.0).collect())
}

pub async fn all_pending_shipment_ids(db: &PgPool, plan_date: chrono::NaiveDate) -> Result<Vec<Uuid>, sqlx::Error> {
    let _ = plan_date;
    let rows: Vec<(Uuid,)> = sqlx::query_as("SELECT id FROM shipments WHERE status = 'PENDING'")
        .fetch_all(db)
        .await?;
    Ok(rows.into_iter().map(|r| r.0).collect())
}

pub fn parameters_are_valid(parameters: &OptimizationParameters) -> Result<(), String> {
    parameters.validate()
}
