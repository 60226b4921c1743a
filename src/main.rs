use anyhow::{Context, Result};
use clap::Parser;
use coldchain_router::services::jobs::{JobRunner, JobRunnerConfig};
use coldchain_router::{auth, cli, config, db, openapi, routes, state};
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;

async fn bind_listener(addr: &str) -> Result<TcpListener> {
    match TcpListener::bind(addr).await {
        Ok(listener) => Ok(listener),
        Err(err) if err.kind() == std::io::ErrorKind::AddrInUse => {
            anyhow::bail!(
                "Failed to bind coldchain-router listener on {addr}: port already in use. Stop the other service using this port or re-run with --bind-addr to choose another address.",
            );
        }
        Err(err) => Err(err).with_context(|| format!("failed to bind coldchain-router listener on {addr}")),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = cli::Args::parse();
    if args.print_openapi {
        println!("{}", serde_json::to_string_pretty(&openapi::openapi_json())?);
        return Ok(());
    }

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let config = config::CoreConfig::from_env()?;
    let pool = db::connect_lazy(&config.database_url, config.db_pool_size)?;
    let auth = Arc::new(auth::AuthManager::new(config.access_token_expire_minutes));

    let jobs = Arc::new(JobRunner::new(
        pool.clone(),
        JobRunnerConfig {
            poll_interval: Duration::from_millis(500),
            max_concurrent_jobs: 2,
            average_speed_kmh: config.average_speed_kmh,
            vehicle_fixed_cost: config.vehicle_fixed_cost,
            infeasible_cost: config.infeasible_cost,
            temp_violation_penalty: config.temp_violation_penalty,
        },
    ));

    let bind_addr = args.bind_addr.clone().unwrap_or_else(|| config.bind_addr.clone());
    let state = state::AppState {
        config,
        db: pool,
        auth,
        jobs: jobs.clone(),
    };

    let cancel = CancellationToken::new();
    jobs.start(cancel.clone());

    let app = routes::router(state);
    let listener = bind_listener(&bind_addr).await?;
    axum::serve(listener, app).await?;
    cancel.cancel();
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::bind_listener;
    use anyhow::Result;

    #[tokio::test]
    async fn reports_port_in_use_with_actionable_message() -> Result<()> {
        let listener = match std::net::TcpListener::bind("127.0.0.1:0") {
            Ok(listener) => listener,
            Err(err) if err.kind() == std::io::ErrorKind::PermissionDenied => {
                return Ok(());
            }
            Err(err) => return Err(err.into()),
        };
        let addr = listener.local_addr()?;

        let err = bind_listener(&addr.to_string()).await.unwrap_err();
        if err.to_string().to_lowercase().contains("operation not permitted") {
            return Ok(());
        }
        let message = err.to_string().to_lowercase();

        assert!(message.contains(&addr.to_string()));
        assert!(message.contains("port already in use"));
        assert!(message.contains("--bind-addr"));

        drop(listener);
        Ok(())
    }
}
