use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::enums::{DoorType, InsulationGrade, VehicleStatus};

/// A mobile refrigerated unit, row as read from the `vehicles` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct VehicleRow {
    pub id: Uuid,
    pub license_plate: String,
    pub capacity_weight: f64,
    pub capacity_volume: f64,
    pub insulation_grade: String,
    pub door_type: String,
    pub has_strip_curtains: bool,
    pub heat_transfer_coefficient: f64,
    pub door_coefficient: f64,
    pub cooling_rate: f64,
    pub min_temp_capability: f64,
    pub status: String,
    pub current_latitude: Option<f64>,
    pub current_longitude: Option<f64>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl VehicleRow {
    pub fn insulation_grade_enum(&self) -> InsulationGrade {
        InsulationGrade::from_str_opt(&self.insulation_grade).unwrap_or(InsulationGrade::Standard)
    }

    pub fn door_type_enum(&self) -> DoorType {
        DoorType::from_str_opt(&self.door_type).unwrap_or(DoorType::Roll)
    }

    pub fn status_enum(&self) -> VehicleStatus {
        VehicleStatus::from_str_db(&self.status)
    }

    /// The canonical coefficients for the current grade/type; used to enforce the
    /// update-on-change invariant whenever grade or door type changes.
    pub fn canonical_coefficients(&self) -> (f64, f64) {
        (
            self.insulation_grade_enum().heat_transfer_coefficient(),
            self.door_type_enum().coefficient(),
        )
    }

    pub fn to_public(&self) -> VehiclePublic {
        VehiclePublic {
            id: self.id,
            license_plate: self.license_plate.clone(),
            capacity_weight: self.capacity_weight,
            capacity_volume: self.capacity_volume,
            insulation_grade: self.insulation_grade_enum(),
            door_type: self.door_type_enum(),
            has_strip_curtains: self.has_strip_curtains,
            cooling_rate: self.cooling_rate,
            min_temp_capability: self.min_temp_capability,
            status: self.status_enum(),
            current_latitude: self.current_latitude,
            current_longitude: self.current_longitude,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, utoipa::ToSchema)]
pub struct VehiclePublic {
    pub id: Uuid,
    pub license_plate: String,
    pub capacity_weight: f64,
    pub capacity_volume: f64,
    pub insulation_grade: InsulationGrade,
    pub door_type: DoorType,
    pub has_strip_curtains: bool,
    pub cooling_rate: f64,
    pub min_temp_capability: f64,
    pub status: VehicleStatus,
    pub current_latitude: Option<f64>,
    pub current_longitude: Option<f64>,
}

#[derive(Debug, Clone, Deserialize, utoipa::ToSchema)]
pub struct VehicleCreateRequest {
    pub license_plate: String,
    pub capacity_weight: f64,
    pub capacity_volume: f64,
    pub insulation_grade: InsulationGrade,
    pub door_type: DoorType,
    #[serde(default)]
    pub has_strip_curtains: bool,
    pub cooling_rate: f64,
    pub min_temp_capability: f64,
    #[serde(default)]
    pub current_latitude: Option<f64>,
    #[serde(default)]
    pub current_longitude: Option<f64>,
}

/// A snapshot of the fields the routing model needs, independent of the DB row shape.
#[derive(Debug, Clone)]
pub struct VehicleThermo {
    pub heat_transfer_coefficient: f64,
    pub door_coefficient: f64,
    pub curtain_factor: f64,
    pub cooling_rate: f64,
}

impl From<&VehicleRow> for VehicleThermo {
    fn from(row: &VehicleRow) -> Self {
        Self {
            heat_transfer_coefficient: row.heat_transfer_coefficient,
            door_coefficient: row.door_coefficient,
            curtain_factor: if row.has_strip_curtains { 0.5 } else { 1.0 },
            cooling_rate: row.cooling_rate,
        }
    }
}
