use sqlx::types::Json as SqlJson;
use sqlx::PgPool;
use uuid::Uuid;

use crate::domain::shipment::{ShipmentCreateRequest, ShipmentRow};

const COLUMNS: &str = r#"
    id, order_number, latitude, longitude, time_windows, sla_tier, temp_limit_upper,
    temp_limit_lower, service_duration, weight, volume, priority, status, route_id,
    route_sequence, created_at, updated_at
"#;

pub async fn list(db: &PgPool) -> Result<Vec<ShipmentRow>, sqlx::Error> {
    sqlx::query_as(&format!("SELECT {COLUMNS} FROM shipments ORDER BY created_at ASC"))
        .fetch_all(db)
        .await
}

pub async fn get(db: &PgPool, id: Uuid) -> Result<Option<ShipmentRow>, sqlx::Error> {
    sqlx::query_as(&format!("SELECT {COLUMNS} FROM shipments WHERE id = $1"))
        .bind(id)
        .fetch_optional(db)
        .await
}

pub async fn create(db: &PgPool, request: &ShipmentCreateRequest) -> Result<ShipmentRow, sqlx::Error> {
    sqlx::query_as(&format!(
        r#"
        INSERT INTO shipments (
            id, order_number, latitude, longitude, time_windows, sla_tier, temp_limit_upper,
            temp_limit_lower, service_duration, weight, volume, priority, status,
            created_at, updated_at
        ) VALUES (
            $1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, 'PENDING', now(), now()
        )
        RETURNING {COLUMNS}
        "#
    ))
    .bind(Uuid::new_v4())
    .bind(&request.order_number)
    .bind(request.latitude)
    .bind(request.longitude)
    .bind(SqlJson(&request.time_windows))
    .bind(request.sla_tier.as_str())
    .bind(request.temp_limit_upper)
    .bind(request.temp_limit_lower)
    .bind(request.service_duration)
    .bind(request.weight)
    .bind(request.volume)
    .bind(request.priority)
    .fetch_one(db)
    .await
}

/// `POST /shipments/reset` per §6: deletes every route stop and route, then returns
/// every shipment to PENDING with its route back-refs cleared, for replanning a day
/// from scratch.
pub async fn reset_all(db: &PgPool) -> Result<u64, sqlx::Error> {
    let mut tx = db.begin().await?;
    sqlx::query("DELETE FROM route_stops").execute(&mut *tx).await?;
    sqlx::query("DELETE FROM routes").execute(&mut *tx).await?;
    let result = sqlx::query(
        r#"
        UPDATE shipments
        SET status = 'PENDING', route_id = NULL, route_sequence = NULL, updated_at = now()
        "#,
    )
    .execute(&mut *tx)
    .await?;
    tx.commit().await?;
    Ok(result.rows_affected())
}
