use crate::auth::AuthManager;
use crate::config::CoreConfig;
use crate::db;
use crate::services::jobs::{JobRunner, JobRunnerConfig};
use crate::state::AppState;
use std::sync::Arc;
use uuid::Uuid;

pub fn test_config() -> CoreConfig {
    CoreConfig {
        database_url: "postgresql://postgres@localhost/postgres".to_string(),
        bind_addr: "127.0.0.1:0".to_string(),
        access_token_expire_minutes: 60,
        db_pool_size: 5,
        default_solver_time_limit: 30,
        default_ambient_temperature: 30.0,
        default_initial_vehicle_temp: -18.0,
        default_depot_latitude: 25.0330,
        default_depot_longitude: 121.5654,
        default_depot_address: "Test depot".to_string(),
        temp_violation_penalty: 1_000.0,
        late_delivery_penalty: 500.0,
        vehicle_fixed_cost: 50_000.0,
        distance_cost_per_km: 10.0,
        average_speed_kmh: 35.0,
        infeasible_cost: 10_000_000.0,
    }
}

pub fn test_state() -> AppState {
    let config = test_config();
    let pool = db::connect_lazy(&config.database_url, config.db_pool_size).expect("connect_lazy");
    let auth = Arc::new(AuthManager::new(config.access_token_expire_minutes));
    let jobs = Arc::new(JobRunner::new(pool.clone(), JobRunnerConfig::default()));

    AppState {
        config,
        db: pool,
        auth,
        jobs,
    }
}

pub fn test_user() -> crate::auth::AuthenticatedUser {
    crate::auth::AuthenticatedUser {
        id: Uuid::new_v4(),
        username: "test-user".to_string(),
    }
}
