//! Static-file web app over HTTPS with an HTTP-to-HTTPS redirect listener

use fleetcheck::server::{
    build_rustls_config, initialize_tls, shutdown_channel, shutdown_on_signal,
};
use fleetcheck::webapp::run_webapp;
use fleetcheck::WebAppConfig;
use tracing::{error, info};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let config = WebAppConfig::from_env()?;
    info!("Starting TLS web app");

    let bundle = match initialize_tls(&config.cert_path, &config.key_path, config.self_signed) {
        Ok(bundle) => bundle,
        Err(e) => {
            error!(error = %e, "Failed to initialize TLS certificates");
            return Err(anyhow::anyhow!("TLS init error: {}", e));
        }
    };
    let tls_config = match build_rustls_config(&bundle) {
        Ok(config) => config,
        Err(e) => {
            error!(error = %e, "Failed to build TLS config");
            return Err(anyhow::anyhow!("TLS config error: {}", e));
        }
    };

    let (shutdown_controller, shutdown_signal) = shutdown_channel();
    tokio::spawn(shutdown_on_signal(shutdown_controller));

    if let Err(e) = run_webapp(&config, tls_config, shutdown_signal).await {
        error!(error = %e, "Web app failed");
        return Err(e.into());
    }

    info!("Web app shut down gracefully");
    Ok(())
}
