use anyhow::{Context, Result};

/// Environment-loaded configuration, in the shape of the teacher's `CoreConfig::from_env`:
/// one env var per field, typed defaults, validated once at startup. The IoT-specific
/// setup-override-file layer (`SetupConfigOverrides`) has no counterpart here — this
/// service has no deployed-appliance setup wizard.
#[derive(Debug, Clone)]
pub struct CoreConfig {
    pub database_url: String,
    pub bind_addr: String,
    pub access_token_expire_minutes: i64,
    pub db_pool_size: u32,
    pub default_solver_time_limit: u32,
    pub default_ambient_temperature: f64,
    pub default_initial_vehicle_temp: f64,
    pub default_depot_latitude: f64,
    pub default_depot_longitude: f64,
    pub default_depot_address: String,
    pub temp_violation_penalty: f64,
    pub late_delivery_penalty: f64,
    pub vehicle_fixed_cost: f64,
    pub distance_cost_per_km: f64,
    pub average_speed_kmh: f64,
    pub infeasible_cost: f64,
}

impl CoreConfig {
    pub fn from_env() -> Result<Self> {
        let database_url = std::env::var("DATABASE_URL")
            .ok()
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty())
            .context("DATABASE_URL must be set")?;

        // Accepted for interface compatibility with deployments that still set these
        // (the original Python service's Celery broker config); unused by this binary,
        // which runs its job poller in-process instead of against an external broker.
        let _ = std::env::var("DATABASE_URL_SYNC");
        let _ = std::env::var("REDIS_URL");
        let _ = std::env::var("CELERY_BROKER_URL");
        let _ = std::env::var("CELERY_RESULT_BACKEND");
        let _ = std::env::var("SECRET_KEY");
        let _ = env_optional_u32("DB_MAX_OVERFLOW");

        Ok(Self {
            database_url,
            bind_addr: env_string("BIND_ADDR", "0.0.0.0:8080"),
            access_token_expire_minutes: env_i64("ACCESS_TOKEN_EXPIRE_MINUTES", 60 * 24),
            db_pool_size: env_u32("DB_POOL_SIZE", 10),
            default_solver_time_limit: env_u32("DEFAULT_SOLVER_TIME_LIMIT", 300),
            default_ambient_temperature: env_f64("DEFAULT_AMBIENT_TEMPERATURE", 30.0),
            default_initial_vehicle_temp: env_f64("DEFAULT_INITIAL_VEHICLE_TEMP", -18.0),
            default_depot_latitude: env_f64("DEFAULT_DEPOT_LATITUDE", 25.0330),
            default_depot_longitude: env_f64("DEFAULT_DEPOT_LONGITUDE", 121.5654),
            default_depot_address: env_string("DEFAULT_DEPOT_ADDRESS", "Main depot"),
            temp_violation_penalty: env_f64("TEMP_VIOLATION_PENALTY", 1_000.0),
            late_delivery_penalty: env_f64("LATE_DELIVERY_PENALTY", 500.0),
            vehicle_fixed_cost: env_f64("VEHICLE_FIXED_COST", 50_000.0),
            distance_cost_per_km: env_f64("DISTANCE_COST_PER_KM", 10.0),
            average_speed_kmh: env_f64("AVERAGE_SPEED_KMH", 35.0),
            infeasible_cost: env_f64("INFEASIBLE_COST", 10_000_000.0),
        })
    }
}

fn env_string(key: &str, default: &str) -> String {
    std::env::var(key)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
        .unwrap_or_else(|| default.to_string())
}

fn env_u32(key: &str, default: u32) -> u32 {
    std::env::var(key)
        .ok()
        .and_then(|value| value.trim().parse::<u32>().ok())
        .unwrap_or(default)
}

fn env_optional_u32(key: &str) -> Option<u32> {
    std::env::var(key)
        .ok()
        .and_then(|value| value.trim().parse::<u32>().ok())
}

fn env_i64(key: &str, default: i64) -> i64 {
    std::env::var(key)
        .ok()
        .and_then(|value| value.trim().parse::<i64>().ok())
        .unwrap_or(default)
}

fn env_f64(key: &str, default: f64) -> f64 {
    std::env::var(key)
        .ok()
        .and_then(|value| value.trim().parse::<f64>().ok())
        .unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn env_f64_falls_back_to_default_on_missing_or_bad_value() {
        std::env::remove_var("COLDCHAIN_TEST_MISSING");
        assert_eq!(env_f64("COLDCHAIN_TEST_MISSING", 1.5), 1.5);
    }

    #[test]
    fn env_string_trims_and_falls_back_on_blank() {
        std::env::set_var("COLDCHAIN_TEST_BLANK", "   ");
        assert_eq!(env_string("COLDCHAIN_TEST_BLANK", "fallback"), "fallback");
        std::env::remove_var("COLDCHAIN_TEST_BLANK");
    }
}
