use sqlx::PgPool;
use uuid::Uuid;

use crate::domain::depot::{DepotCreateRequest, DepotRow};

const COLUMNS: &str = "id, latitude, longitude, address, active, created_at, updated_at";

pub async fn list(db: &PgPool) -> Result<Vec<DepotRow>, sqlx::Error> {
    sqlx::query_as(&format!("SELECT {COLUMNS} FROM depots ORDER BY created_at ASC"))
        .fetch_all(db)
        .await
}

pub async fn get(db: &PgPool, id: Uuid) -> Result<Option<DepotRow>, sqlx::Error> {
    sqlx::query_as(&format!("SELECT {COLUMNS} FROM depots WHERE id = $1"))
        .bind(id)
        .fetch_optional(db)
        .await
}

pub async fn create(db: &PgPool, request: &DepotCreateRequest) -> Result<DepotRow, sqlx::Error> {
    sqlx::query_as(&format!(
        r#"
        INSERT INTO depots (id, latitude, longitude, address, active, created_at, updated_at)
        VALUES ($1, $2, $3, $4, $5, now(), now())
        RETURNING {COLUMNS}
        "#
    ))
    .bind(Uuid::new_v4())
    .bind(request.latitude)
    .bind(request.longitude)
    .bind(&request.address)
    .bind(request.active)
    .fetch_one(db)
    .await
}
