//! Sanitizing gateway.
//!
//! Sits in front of the job board's backend services and cleans every JSON
//! body and path param before it reaches them.
//!
//! ```text
//!     Client ──▶ request id ─▶ trace ─▶ timeout/limit ─▶ route match
//!                                                           │
//!                                                           ▼
//!                                                  capture payload
//!                                                           │
//!                                                           ▼
//!                                                strip operator keys
//!                                                           │
//!                                                           ▼
//!                                                   strip markup
//!                                                           │
//!     Client ◀────────────────────── upstream response ◀── forward ──▶ Backend
//! ```

use std::path::PathBuf;

use clap::Parser;

use sanitizing_gateway::config::{load_config, GatewayConfig};
use sanitizing_gateway::lifecycle::startup;
use sanitizing_gateway::observability::logging::init_logging;

#[derive(Parser)]
#[command(name = "sanitizing-gateway")]
#[command(about = "Request-sanitizing HTTP gateway", long_about = None)]
struct Args {
    /// Path to the TOML config file. Defaults are used when omitted.
    #[arg(short, long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let config = match &args.config {
        Some(path) => load_config(path)?,
        None => GatewayConfig::default(),
    };

    init_logging(&config.observability);
    tracing::info!(version = env!("CARGO_PKG_VERSION"), "sanitizing-gateway starting");
    tracing::info!(
        bind_address = %config.listener.bind_address,
        routes = config.routes.len(),
        descend_into_arrays = config.sanitizer.descend_into_arrays,
        max_depth = config.sanitizer.max_depth,
        request_timeout_secs = config.timeouts.request_secs,
        "Configuration loaded"
    );

    startup::run(config, args.config).await?;
    Ok(())
}
