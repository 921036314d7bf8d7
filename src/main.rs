use fleetcheck::aggregator::{create_metrics, HttpProber};
use fleetcheck::server::{
    run_aggregator_server, shutdown_channel, wait_for_signal, ReadinessState, ServerState,
};
use fleetcheck::{Aggregator, AggregatorConfig};
use std::sync::Arc;
use tracing::{error, info, warn};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    info!("Starting fleetcheck health aggregator");

    let config = match AggregatorConfig::from_env() {
        Ok(c) => c,
        Err(e) => {
            error!(error = %e, "Invalid configuration");
            return Err(e.into());
        }
    };

    if config.targets.is_empty() {
        warn!("No targets configured - /health will always report healthy");
    }
    for target in config.targets.iter() {
        info!(target = %target.name, endpoint = %target.endpoint, "Registered target");
    }

    let metrics = create_metrics()?;
    let aggregator = Arc::new(
        Aggregator::new(
            config.targets.clone(),
            Arc::new(HttpProber::new(config.probe_timeout)),
            config.probe_timeout,
        )
        .with_metrics(metrics.clone()),
    );
    info!(
        targets = config.targets.len(),
        probe_timeout_ms = config.probe_timeout.as_millis() as u64,
        "Aggregator configured"
    );

    let (shutdown_controller, shutdown_signal) = shutdown_channel();
    let readiness = ReadinessState::new();
    let state = ServerState::new(aggregator, readiness.clone(), metrics);

    let port = config.port;
    let mut server =
        tokio::spawn(async move { run_aggregator_server(port, state, shutdown_signal).await });

    tokio::select! {
        result = &mut server => {
            // Server exited on its own, most likely a bind failure
            return match result {
                Ok(Ok(())) => Ok(()),
                Ok(Err(e)) => {
                    error!(error = %e, "Aggregator server failed");
                    Err(e.into())
                }
                Err(e) => Err(e.into()),
            };
        }
        signal = wait_for_signal() => {
            let signal = signal?;
            info!(signal = %signal, "Initiating graceful shutdown");
            // Mark not ready so load balancers stop sending traffic during shutdown
            readiness.set_not_ready();
        }
    }

    shutdown_controller.shutdown();
    server.await??;

    info!("fleetcheck shut down gracefully");
    Ok(())
}
