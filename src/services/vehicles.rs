//! Thin CRUD over `vehicles`. Present because §6 lists vehicle/shipment/depot
//! management as ambient supporting surface, not because the routing engine itself
//! needs anything beyond reading rows by id.

use sqlx::PgPool;
use uuid::Uuid;

use crate::domain::vehicle::{VehicleCreateRequest, VehicleRow};

const COLUMNS: &str = r#"
    id, license_plate, capacity_weight, capacity_volume, insulation_grade, door_type,
    has_strip_curtains, heat_transfer_coefficient, door_coefficient, cooling_rate,
    min_temp_capability, status, current_latitude, current_longitude, created_at, updated_at
"#;

pub async fn list(db: &PgPool) -> Result<Vec<VehicleRow>, sqlx::Error> {
    sqlx::query_as(&format!("SELECT {COLUMNS} FROM vehicles ORDER BY created_at ASC"))
        .fetch_all(db)
        .await
}

pub async fn get(db: &PgPool, id: Uuid) -> Result<Option<VehicleRow>, sqlx::Error> {
    sqlx::query_as(&format!("SELECT {COLUMNS} FROM vehicles WHERE id = $1"))
        .bind(id)
        .fetch_optional(db)
        .await
}

/// Writes the denormalized thermo coefficients from the grade/door-type the caller
/// supplied, keeping the update-on-change invariant enforced at insert time.
pub async fn create(db: &PgPool, request: &VehicleCreateRequest) -> Result<VehicleRow, sqlx::Error> {
    let heat_transfer_coefficient = request.insulation_grade.heat_transfer_coefficient();
    let door_coefficient = request.door_type.coefficient();

    sqlx::query_as(&format!(
        r#"
        INSERT INTO vehicles (
            id, license_plate, capacity_weight, capacity_volume, insulation_grade, door_type,
            has_strip_curtains, heat_transfer_coefficient, door_coefficient, cooling_rate,
            min_temp_capability, status, current_latitude, current_longitude, created_at, updated_at
        ) VALUES (
            $1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, 'AVAILABLE', $12, $13, now(), now()
        )
        RETURNING {COLUMNS}
        "#
    ))
    .bind(Uuid::new_v4())
    .bind(&request.license_plate)
    .bind(request.capacity_weight)
    .bind(request.capacity_volume)
    .bind(request.insulation_grade.as_str())
    .bind(request.door_type.as_str())
    .bind(request.has_strip_curtains)
    .bind(heat_transfer_coefficient)
    .bind(door_coefficient)
    .bind(request.cooling_rate)
    .bind(request.min_temp_capability)
    .bind(request.current_latitude)
    .bind(request.current_longitude)
    .fetch_one(db)
    .await
}
