//! Order Gateway
//!
//! Fronts the order service with a circuit breaker and answers with a
//! deterministic fallback whenever the upstream is unhealthy.
//!
//! # Architecture Overview
//!
//! ```text
//!     Client ──▶ http::server ──▶ gateway::handler ──▶ upstream::executor ──▶ Order service
//!                    │                  │      │
//!                    │                  │      └──▶ gateway::fallback (503)
//!                    │                  ▼
//!                    │          resilience::circuit_breaker
//!                    │          (window, clock, retries)
//!                    ▼
//!                 admin (optional, bearer key)
//!
//!     config · observability · lifecycle are cross-cutting
//! ```

use clap::Parser;
use std::path::PathBuf;

use order_gateway::config::load_config;
use order_gateway::lifecycle::startup;
use order_gateway::observability::logging::init_logging;

#[derive(Parser)]
#[command(name = "order-gateway", version)]
#[command(about = "Circuit-breaking gateway in front of the order service", long_about = None)]
struct Cli {
    /// Path to a TOML configuration file
    #[arg(short, long, env = "GATEWAY_CONFIG")]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let config = load_config(cli.config.as_deref())?;
    init_logging(&config.observability.log_level);

    tracing::info!("order-gateway v{} starting", env!("CARGO_PKG_VERSION"));
    startup::run(config).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
