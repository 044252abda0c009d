//! # Vigil - cluster liveness propagation
//!
//! One binary, three roles. The health role probes every peer on a timer and
//! publishes `serviceup` / `servicedown` events; the auth and notification
//! roles fold those events into a local status cache that gates
//! cross-service calls.
//!
//! ## Architecture
//! ```text
//! health ──probe──▶ auth, notification (/healthy)
//!    │
//!    └──publish──▶ Redis (serviceup / servicedown)
//!                     │
//!                     └──subscribe──▶ auth, notification (status cache)
//!
//! auth ──(cache says up?)──▶ notification (/receiveData)
//! ```

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

mod bus;
mod config;
mod forward;
mod health;
mod peers;
mod routes;
mod state;

#[cfg(test)]
mod testing;

use crate::config::{AppConfig, Role};
use crate::state::AppState;

/// Vigil - health monitor, status cache, and gated forwarding
#[derive(Parser, Debug)]
#[command(name = "vigil")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Service role to run
    #[command(subcommand)]
    role: Role,

    /// Configuration file path
    #[arg(short, long, global = true, default_value = "config/vigil.toml")]
    config: String,

    /// Redis URL (overrides host/port/credentials)
    #[arg(long, global = true, env = "REDIS_URL")]
    redis_url: Option<String>,

    /// Redis host (overrides config)
    #[arg(long, global = true, env = "REDIS_SERVER")]
    redis_host: Option<String>,

    /// Redis port (overrides config)
    #[arg(long, global = true, env = "REDIS_PORT")]
    redis_port: Option<u16>,

    /// Redis username (overrides config)
    #[arg(long, global = true, env = "REDIS_USERNAME")]
    redis_username: Option<String>,

    /// Redis password (overrides config)
    #[arg(long, global = true, env = "REDIS_PASSWORD", hide_env_values = true)]
    redis_password: Option<String>,

    /// Listen address (overrides config)
    #[arg(short, long, global = true, env = "LISTEN_ADDR")]
    listen: Option<String>,

    /// Seconds between health check cycles (overrides config)
    #[arg(long, global = true, env = "HEALTH_CHECK_INTERVAL_SECS")]
    interval_secs: Option<u64>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, global = true, default_value = "info", env = "LOG_LEVEL")]
    log_level: String,

    /// Enable JSON logging output
    #[arg(long, global = true, default_value = "false")]
    json_logs: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Pick up .env before clap reads the environment
    dotenvy::dotenv().ok();

    // Parse CLI arguments
    let args = Args::parse();

    // Initialize logging
    init_logging(&args.log_level, args.json_logs)?;

    let role = args.role;
    let service = role.service_name();

    info!(
        service = %service,
        "🔥 Starting Vigil v{}",
        env!("CARGO_PKG_VERSION")
    );

    // Load configuration
    let config = AppConfig::load(&args.config, &args)?;
    info!("📋 Configuration loaded from {}", args.config);

    let listen_addr = config.listen_addr_for(role);
    let store_addr = config.store.display_addr();

    // Create shutdown broadcast channel
    let (shutdown_tx, _) = tokio::sync::broadcast::channel::<()>(1);

    // Initialize application state
    let state = AppState::connect(config, role).await?;
    info!("✅ Redis connected: {}", store_addr);

    let mut tasks = Vec::new();

    if role.consumes_events() {
        if state.config.cache.seed_from_store {
            state.seed_from_store().await;
        }

        // Spawn status subscriber
        let subscriber = state.subscriber();
        let sub_shutdown = shutdown_tx.subscribe();
        tasks.push(tokio::spawn(async move {
            subscriber.run(sub_shutdown).await;
        }));

        state.register_self().await;
    }

    if role == Role::Health {
        // Spawn scheduled health checks
        let monitor = state.monitor.clone();
        let monitor_shutdown = shutdown_tx.subscribe();
        tasks.push(tokio::spawn(async move {
            monitor.run(monitor_shutdown).await;
        }));
    }

    // Build router
    let app = routes::create_router(state);

    // Start server
    let listener = tokio::net::TcpListener::bind(&listen_addr)
        .await
        .with_context(|| format!("Failed to bind {}", listen_addr))?;
    info!("🚀 {} listening on {}", service, listen_addr);

    // Handle graceful shutdown
    let signal_tx = shutdown_tx.clone();
    let shutdown_signal = async move {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl+C");
        }
        info!("🛑 Shutdown signal received");
        let _ = signal_tx.send(());
    };

    let served = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal)
        .await
        .context("Server error");

    // Stop background tasks even if the server failed
    let _ = shutdown_tx.send(());
    for task in tasks {
        let _ = task.await;
    }

    served?;

    info!("👋 {} shutdown complete", service);
    Ok(())
}

/// Initialize structured logging with tracing
fn init_logging(level: &str, json: bool) -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    if json {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().with_target(true).with_thread_ids(true))
            .init();
    }

    Ok(())
}
