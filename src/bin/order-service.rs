//! Standalone order service used as the gateway's upstream.

use clap::Parser;
use tokio::net::TcpListener;

use order_gateway::lifecycle::signals::wait_for_termination;
use order_gateway::observability::logging::init_logging;
use order_gateway::orders;

#[derive(Parser)]
#[command(name = "order-service", version)]
#[command(about = "Serves the fixed order catalogue", long_about = None)]
struct Cli {
    #[arg(short, long, default_value = "0.0.0.0:8080")]
    bind: String,

    #[arg(long, default_value = "info")]
    log_level: String,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    init_logging(&cli.log_level);

    let listener = TcpListener::bind(&cli.bind).await?;
    tracing::info!(address = %listener.local_addr()?, "Order service listening");

    axum::serve(listener, orders::router())
        .with_graceful_shutdown(wait_for_termination())
        .await?;

    tracing::info!("Order service stopped");
    Ok(())
}
