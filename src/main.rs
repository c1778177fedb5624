//! origin-relay
//!
//! A stateless HTTP relay built with Tokio and Axum.
//!
//! # Architecture Overview
//!
//! ```text
//!     Client Request        ┌──────────────────────────────────────────────┐
//!     ──────────────────────┼─▶ http::server ──▶ http::request (Params)    │
//!                           │                          │                   │
//!                           │                          ▼                   │
//!                           │                 relay::dispatch (Mode)       │
//!                           │                          │                   │
//!                           │                          ▼                   │
//!                           │   relay::fetch ──▶ relay::upstream ──────────┼──▶ Upstream
//!                           │        │  (failure: relay::error)            │
//!                           │        ▼                                     │
//!     Client Response       │   http::response                             │
//!     ◀─────────────────────┼── (cache headers, raw | JSON | JSONP)        │
//!                           └──────────────────────────────────────────────┘
//! ```

use std::path::PathBuf;

use clap::Parser;
use tokio::net::TcpListener;

use origin_relay::config::{load_config, validate_config, ConfigError, RelayConfig};
use origin_relay::observability::init_logging;
use origin_relay::{HttpServer, Shutdown};

#[derive(Parser, Debug)]
#[command(name = "origin-relay")]
#[command(about = "Stateless HTTP relay returning upstream resources as JSON, JSONP or raw bytes", long_about = None)]
struct Cli {
    /// TOML configuration file. Defaults apply when omitted.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override listener.bind_address.
    #[arg(short, long)]
    bind: Option<String>,

    /// Override observability.log_level.
    #[arg(long)]
    log_level: Option<String>,
}

fn resolve_config(cli: &Cli) -> Result<RelayConfig, ConfigError> {
    let mut config = match &cli.config {
        Some(path) => load_config(path)?,
        None => RelayConfig::default(),
    };

    if let Some(bind) = &cli.bind {
        config.listener.bind_address = bind.clone();
    }
    if let Some(level) = &cli.log_level {
        config.observability.log_level = level.clone();
    }

    validate_config(&config).map_err(ConfigError::Validation)?;
    Ok(config)
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let config = resolve_config(&cli)?;

    init_logging(&config.observability);

    tracing::info!("origin-relay v{} starting", env!("CARGO_PKG_VERSION"));
    tracing::info!(
        bind_address = %config.listener.bind_address,
        default_max_age_secs = config.cache.default_max_age_secs,
        min_max_age_secs = config.cache.min_max_age_secs,
        upstream_timeout_secs = config.upstream.request_timeout_secs,
        cors = config.cors.enabled,
        "Configuration loaded"
    );

    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    tracing::info!(
        address = %listener.local_addr()?,
        "Listening for connections"
    );

    let shutdown = Shutdown::new();
    let server = HttpServer::new(config)?;
    server.run(listener, shutdown.subscribe()).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
