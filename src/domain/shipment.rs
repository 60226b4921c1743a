use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::types::Json as SqlJson;
use uuid::Uuid;

use super::enums::{ShipmentStatus, SlaTier};

/// A single `{start, end}` wall-clock delivery window, minutes from midnight once parsed.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, utoipa::ToSchema)]
pub struct TimeWindow {
    pub start: String,
    pub end: String,
}

impl TimeWindow {
    pub fn to_minutes(self) -> Result<(u32, u32), String> {
        let start = parse_hhmm(&self.start)?;
        let end = parse_hhmm(&self.end)?;
        if start >= end {
            return Err(format!(
                "time window start {} must be before end {}",
                self.start, self.end
            ));
        }
        Ok((start, end))
    }
}

pub fn parse_hhmm(value: &str) -> Result<u32, String> {
    let (h, m) = value
        .split_once(':')
        .ok_or_else(|| format!("not an HH:MM time: {value}"))?;
    let h: u32 = h.parse().map_err(|_| format!("invalid hour in {value}"))?;
    let m: u32 = m.parse().map_err(|_| format!("invalid minute in {value}"))?;
    if h > 23 || m > 59 {
        return Err(format!("out of range HH:MM: {value}"));
    }
    Ok(h * 60 + m)
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ShipmentRow {
    pub id: Uuid,
    pub order_number: String,
    pub latitude: f64,
    pub longitude: f64,
    pub time_windows: SqlJson<Vec<TimeWindow>>,
    pub sla_tier: String,
    pub temp_limit_upper: f64,
    pub temp_limit_lower: Option<f64>,
    pub service_duration: i32,
    pub weight: f64,
    pub volume: Option<f64>,
    pub priority: i32,
    pub status: String,
    pub route_id: Option<Uuid>,
    pub route_sequence: Option<i32>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ShipmentRow {
    pub fn sla_tier_enum(&self) -> SlaTier {
        SlaTier::from_str_db(&self.sla_tier)
    }

    pub fn status_enum(&self) -> ShipmentStatus {
        ShipmentStatus::from_str_db(&self.status)
    }

    /// Widest reachable window: `(min start, max end)` across all windows, in minutes.
    pub fn widest_window_minutes(&self) -> Option<(u32, u32)> {
        let mut min_start = None;
        let mut max_end = None;
        for window in &self.time_windows.0 {
            let Ok((start, end)) = window.to_minutes() else {
                continue;
            };
            min_start = Some(min_start.map_or(start, |m: u32| m.min(start)));
            max_end = Some(max_end.map_or(end, |m: u32| m.max(end)));
        }
        Some((min_start?, max_end?))
    }

    pub fn to_public(&self) -> ShipmentPublic {
        ShipmentPublic {
            id: self.id,
            order_number: self.order_number.clone(),
            latitude: self.latitude,
            longitude: self.longitude,
            time_windows: self.time_windows.0.clone(),
            sla_tier: self.sla_tier_enum(),
            temp_limit_upper: self.temp_limit_upper,
            temp_limit_lower: self.temp_limit_lower,
            service_duration: self.service_duration,
            weight: self.weight,
            volume: self.volume,
            priority: self.priority,
            status: self.status_enum(),
            route_id: self.route_id,
            route_sequence: self.route_sequence,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, utoipa::ToSchema)]
pub struct ShipmentPublic {
    pub id: Uuid,
    pub order_number: String,
    pub latitude: f64,
    pub longitude: f64,
    pub time_windows: Vec<TimeWindow>,
    pub sla_tier: SlaTier,
    pub temp_limit_upper: f64,
    pub temp_limit_lower: Option<f64>,
    pub service_duration: i32,
    pub weight: f64,
    pub volume: Option<f64>,
    pub priority: i32,
    pub status: ShipmentStatus,
    pub route_id: Option<Uuid>,
    pub route_sequence: Option<i32>,
}

#[derive(Debug, Clone, Deserialize, utoipa::ToSchema)]
pub struct ShipmentCreateRequest {
    pub order_number: String,
    pub latitude: f64,
    pub longitude: f64,
    pub time_windows: Vec<TimeWindow>,
    pub sla_tier: SlaTier,
    pub temp_limit_upper: f64,
    #[serde(default)]
    pub temp_limit_lower: Option<f64>,
    pub service_duration: i32,
    pub weight: f64,
    #[serde(default)]
    pub volume: Option<f64>,
    #[serde(default)]
    pub priority: i32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_valid_hhmm() {
        assert_eq!(parse_hhmm("08:00").unwrap(), 480);
        assert_eq!(parse_hhmm("23:59").unwrap(), 1439);
    }

    #[test]
    fn rejects_malformed_or_out_of_range_hhmm() {
        assert!(parse_hhmm("8:00:00").is_err());
        assert!(parse_hhmm("24:00").is_err());
        assert!(parse_hhmm("12:60").is_err());
    }

    #[test]
    fn time_window_rejects_start_after_end() {
        let window = TimeWindow {
            start: "12:00".to_string(),
            end: "08:00".to_string(),
        };
        assert!(window.to_minutes().is_err());
    }
}
