use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum InsulationGrade {
    Premium,
    Standard,
    Basic,
}

impl InsulationGrade {
    /// Canonical heat-transfer coefficient K, °C per hour per degree of ambient delta.
    pub fn heat_transfer_coefficient(&self) -> f64 {
        match self {
            InsulationGrade::Premium => 0.02,
            InsulationGrade::Standard => 0.05,
            InsulationGrade::Basic => 0.10,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            InsulationGrade::Premium => "PREMIUM",
            InsulationGrade::Standard => "STANDARD",
            InsulationGrade::Basic => "BASIC",
        }
    }

    pub fn from_str_opt(value: &str) -> Option<Self> {
        match value.trim().to_uppercase().as_str() {
            "PREMIUM" => Some(InsulationGrade::Premium),
            "STANDARD" => Some(InsulationGrade::Standard),
            "BASIC" => Some(InsulationGrade::Basic),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DoorType {
    Roll,
    Swing,
}

impl DoorType {
    /// Canonical door coefficient C used in the door-open temperature rise term.
    pub fn coefficient(&self) -> f64 {
        match self {
            DoorType::Roll => 0.8,
            DoorType::Swing => 1.2,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            DoorType::Roll => "ROLL",
            DoorType::Swing => "SWING",
        }
    }

    pub fn from_str_opt(value: &str) -> Option<Self> {
        match value.trim().to_uppercase().as_str() {
            "ROLL" => Some(DoorType::Roll),
            "SWING" => Some(DoorType::Swing),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum VehicleStatus {
    Available,
    InUse,
    Maintenance,
    Offline,
}

impl VehicleStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            VehicleStatus::Available => "AVAILABLE",
            VehicleStatus::InUse => "IN_USE",
            VehicleStatus::Maintenance => "MAINTENANCE",
            VehicleStatus::Offline => "OFFLINE",
        }
    }

    pub fn from_str_db(value: &str) -> Self {
        match value {
            "AVAILABLE" => VehicleStatus::Available,
            "IN_USE" => VehicleStatus::InUse,
            "MAINTENANCE" => VehicleStatus::Maintenance,
            "OFFLINE" => VehicleStatus::Offline,
            other => {
                tracing::warn!(status = %other, "unknown vehicle status; treating as offline");
                VehicleStatus::Offline
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ShipmentStatus {
    Pending,
    Assigned,
    InTransit,
    Delivered,
    Failed,
    Cancelled,
}

impl ShipmentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ShipmentStatus::Pending => "PENDING",
            ShipmentStatus::Assigned => "ASSIGNED",
            ShipmentStatus::InTransit => "IN_TRANSIT",
            ShipmentStatus::Delivered => "DELIVERED",
            ShipmentStatus::Failed => "FAILED",
            ShipmentStatus::Cancelled => "CANCELLED",
        }
    }

    pub fn from_str_db(value: &str) -> Self {
        match value {
            "PENDING" => ShipmentStatus::Pending,
            "ASSIGNED" => ShipmentStatus::Assigned,
            "IN_TRANSIT" => ShipmentStatus::InTransit,
            "DELIVERED" => ShipmentStatus::Delivered,
            "FAILED" => ShipmentStatus::Failed,
            "CANCELLED" => ShipmentStatus::Cancelled,
            other => {
                tracing::warn!(status = %other, "unknown shipment status; treating as failed");
                ShipmentStatus::Failed
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SlaTier {
    Strict,
    Standard,
}

impl SlaTier {
    pub fn as_str(&self) -> &'static str {
        match self {
            SlaTier::Strict => "STRICT",
            SlaTier::Standard => "STANDARD",
        }
    }

    pub fn from_str_db(value: &str) -> Self {
        match value {
            "STRICT" => SlaTier::Strict,
            _ => SlaTier::Standard,
        }
    }

    pub fn is_strict(&self) -> bool {
        matches!(self, SlaTier::Strict)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum JobStatus {
    Pending,
    Running,
    Completed,
    Failed,
    Cancelled,
}

impl JobStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            JobStatus::Pending => "PENDING",
            JobStatus::Running => "RUNNING",
            JobStatus::Completed => "COMPLETED",
            JobStatus::Failed => "FAILED",
            JobStatus::Cancelled => "CANCELLED",
        }
    }

    pub fn from_str_db(value: &str) -> Self {
        match value {
            "PENDING" => JobStatus::Pending,
            "RUNNING" => JobStatus::Running,
            "COMPLETED" => JobStatus::Completed,
            "FAILED" => JobStatus::Failed,
            "CANCELLED" => JobStatus::Cancelled,
            other => {
                tracing::warn!(status = %other, "unknown job status; treating as failed");
                JobStatus::Failed
            }
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            JobStatus::Completed | JobStatus::Failed | JobStatus::Cancelled
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RouteStatus {
    Scheduled,
    InProgress,
    Completed,
    Cancelled,
}

impl RouteStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RouteStatus::Scheduled => "SCHEDULED",
            RouteStatus::InProgress => "IN_PROGRESS",
            RouteStatus::Completed => "COMPLETED",
            RouteStatus::Cancelled => "CANCELLED",
        }
    }

    pub fn from_str_db(value: &str) -> Self {
        match value {
            "SCHEDULED" => RouteStatus::Scheduled,
            "IN_PROGRESS" => RouteStatus::InProgress,
            "COMPLETED" => RouteStatus::Completed,
            "CANCELLED" => RouteStatus::Cancelled,
            other => {
                tracing::warn!(status = %other, "unknown route status; treating as scheduled");
                RouteStatus::Scheduled
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insulation_grade_coefficients_match_canonical_values() {
        assert_eq!(InsulationGrade::Premium.heat_transfer_coefficient(), 0.02);
        assert_eq!(InsulationGrade::Standard.heat_transfer_coefficient(), 0.05);
        assert_eq!(InsulationGrade::Basic.heat_transfer_coefficient(), 0.10);
    }

    #[test]
    fn door_type_coefficients_match_canonical_values() {
        assert_eq!(DoorType::Roll.coefficient(), 0.8);
        assert_eq!(DoorType::Swing.coefficient(), 1.2);
    }

    #[test]
    fn unknown_db_status_degrades_to_a_safe_terminal_value() {
        assert_eq!(ShipmentStatus::from_str_db("bogus"), ShipmentStatus::Failed);
        assert_eq!(JobStatus::from_str_db("bogus"), JobStatus::Failed);
    }
}
