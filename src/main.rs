//! Pizza service (v0.1)
//!
//! Serves the ordering API behind the instrumentation layer and exports
//! request logs and periodic metrics to the telemetry backend.
//!
//! # Architecture Overview
//!
//! ```text
//!     Client Request
//!     ─────────────▶ trace / request-id ─▶ capture ─▶ business routes
//!                                            │
//!     Client Response                        │ completed exchange
//!     ◀───────────── (unchanged) ◀───────────┤
//!                                            ▼
//!                          ┌──────────────────────────────────┐
//!                          │ stages                           │
//!                          │  http_log ─────▶ log shipper ────┼──▶ log endpoint
//!                          │  request_count ┐                 │
//!                          │  auth_attempts ├▶ accumulator    │
//!                          │  pizza_orders ─┘      │          │
//!                          └───────────────────────┼──────────┘
//!                                                  ▼
//!                          flusher (every tick) + host sampler ──▶ metrics endpoint
//! ```

use std::path::PathBuf;

use axum::Router;
use clap::Parser;
use tokio::net::TcpListener;

use pizza_telemetry::config::{load_config, ServiceConfig};
use pizza_telemetry::lifecycle::signals::trigger_on_signal;
use pizza_telemetry::observability::logging::init_tracing;
use pizza_telemetry::{HttpServer, Shutdown};

#[derive(Parser)]
#[command(name = "pizza-service")]
#[command(about = "Pizza ordering API with request telemetry", long_about = None)]
struct Cli {
    /// Path to a TOML configuration file; built-in defaults when omitted.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override `listener.bind_address`.
    #[arg(short, long)]
    bind: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => load_config(path)?,
        None => ServiceConfig::default(),
    };
    if let Some(bind) = cli.bind {
        config.listener.bind_address = bind;
    }

    init_tracing(&config.logging.level);
    tracing::info!("pizza-service v0.1.0 starting");
    tracing::info!(
        bind_address = %config.listener.bind_address,
        metrics_enabled = config.metrics.enabled,
        logging_enabled = config.logging.enabled,
        flush_interval_secs = config.metrics.flush_interval_secs,
        "Configuration loaded"
    );

    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    tracing::info!(address = %listener.local_addr()?, "Listening for connections");

    let shutdown = Shutdown::new();
    trigger_on_signal(shutdown.clone());

    // Business routes are registered by the ordering API; tag the login and
    // order-creation routes with `pizza_telemetry::tag`.
    let api = Router::new();
    HttpServer::new(config, api).run(listener, shutdown).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
