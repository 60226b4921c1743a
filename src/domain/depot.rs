use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct DepotRow {
    pub id: Uuid,
    pub latitude: f64,
    pub longitude: f64,
    pub address: String,
    pub active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl DepotRow {
    pub fn to_public(&self) -> DepotPublic {
        DepotPublic {
            id: self.id,
            latitude: self.latitude,
            longitude: self.longitude,
            address: self.address.clone(),
            active: self.active,
        }
    }

    pub fn snapshot(&self) -> DepotSnapshot {
        DepotSnapshot {
            latitude: self.latitude,
            longitude: self.longitude,
            address: self.address.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, utoipa::ToSchema)]
pub struct DepotPublic {
    pub id: Uuid,
    pub latitude: f64,
    pub longitude: f64,
    pub address: String,
    pub active: bool,
}

#[derive(Debug, Clone, Deserialize, utoipa::ToSchema)]
pub struct DepotCreateRequest {
    pub latitude: f64,
    pub longitude: f64,
    pub address: String,
    #[serde(default = "default_true")]
    pub active: bool,
}

fn default_true() -> bool {
    true
}

/// An immutable copy of depot coordinates taken at plan time, as recorded on a Route.
#[derive(Debug, Clone, Serialize, Deserialize, utoipa::ToSchema)]
pub struct DepotSnapshot {
    pub latitude: f64,
    pub longitude: f64,
    pub address: String,
}
