//! Routegate server binary.
//!
//! # Architecture Overview
//!
//! ```text
//!     Client Request
//!     ──────────────▶ axum listener
//!                        │
//!                        ▼
//!                  ┌─────────────┐   global middleware (request id, logger)
//!                  │  pipeline   │── router guards → route guards
//!                  └─────┬───────┘
//!                        ▼
//!                  ┌─────────────┐   registry: settings store, token service,
//!                  │   handler   │── auth config
//!                  └─────┬───────┘
//!                        ▼
//!     ◀────────────── JSON envelope {"ok":..,"data"|"error":..}
//! ```

use std::path::PathBuf;

use clap::Parser;
use tokio::net::TcpListener;

use routegate::config::{load_config, ServerConfig};
use routegate::lifecycle::{build_server, wait_for_signal, Shutdown};
use routegate::observability::{logging, metrics};

#[derive(Parser)]
#[command(name = "routegate")]
#[command(about = "Guarded JSON API server", long_about = None)]
struct Cli {
    /// TOML configuration file. Defaults apply when omitted.
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
        None => ServerConfig::default(),
    };
    if let Some(bind) = cli.bind {
        config.listener.bind_address = bind;
    }

    logging::init_logging(&config.logging);
    tracing::info!("routegate v{} starting", env!("CARGO_PKG_VERSION"));
    tracing::info!(
        bind_address = %config.listener.bind_address,
        request_timeout_secs = config.timeouts.request_secs,
        max_body_bytes = config.limits.max_body_bytes,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => metrics::init_metrics(addr),
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    tracing::info!(address = %listener.local_addr()?, "Listening for connections");

    let shutdown = Shutdown::new();
    let receiver = shutdown.subscribe();
    let trigger = shutdown.clone();
    tokio::spawn(async move {
        wait_for_signal().await;
        trigger.trigger();
    });

    build_server(config).serve(listener, receiver).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
