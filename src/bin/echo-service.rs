//! Toy echo service: `GET /healthz` and `POST /echo`

use fleetcheck::echo::run_echo_server;
use fleetcheck::server::{shutdown_channel, shutdown_on_signal};
use fleetcheck::EchoConfig;
use tracing::{error, info};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let config = EchoConfig::from_env()?;
    info!(service = %config.service_name, "Starting echo service");

    let (shutdown_controller, shutdown_signal) = shutdown_channel();
    tokio::spawn(shutdown_on_signal(shutdown_controller));

    if let Err(e) = run_echo_server(&config, shutdown_signal).await {
        error!(error = %e, "Echo service failed");
        return Err(e.into());
    }

    info!("Echo service shut down gracefully");
    Ok(())
}
