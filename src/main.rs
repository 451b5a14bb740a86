//! # Metrics Authentication Gateway - Main Entry Point
//!
//! Starts the multi-listener authentication gateway in front of a
//! Prometheus-compatible metrics API. Startup is strictly ordered: logging
//! first, then configuration, then credentials (fatal if missing or still
//! placeholders), then listener binding. The gateway never serves traffic
//! with an invalid credential set.

use tokio::signal;
use tracing::{error, info, warn};

use metrics_auth_gateway::auth::credentials::CredentialSet;
use metrics_auth_gateway::core::config::GatewayConfig;
use metrics_auth_gateway::core::error::GatewayResult;
use metrics_auth_gateway::gateway::server::GatewayServer;

#[tokio::main]
async fn main() -> GatewayResult<()> {
    init_observability();

    info!("🚀 Starting Metrics Authentication Gateway");
    info!("Version: {}", env!("CARGO_PKG_VERSION"));

    match graceful_startup().await {
        Ok(server) => {
            graceful_shutdown(server).await?;
        }
        Err(e) => {
            error!(error_type = e.error_type(), "Failed to start gateway: {}", e);
            std::process::exit(1);
        }
    }

    info!("✅ Gateway shutdown complete");
    Ok(())
}

/// Initialize logging and tracing
fn init_observability() {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_target(true))
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "metrics_auth_gateway=info,tower_http=debug".into()),
        )
        .init();

    info!("📊 Observability initialized");
}

/// Ordered startup: configuration, credentials, server construction
async fn graceful_startup() -> GatewayResult<GatewayServer> {
    info!("📋 Loading configuration...");
    let config_path = std::env::var("GATEWAY_CONFIG_PATH")
        .unwrap_or_else(|_| "config/gateway.yaml".to_string());

    let config = GatewayConfig::load_from_file(&config_path).await.map_err(|e| {
        error!("Failed to load configuration from {}: {}", config_path, e);
        e
    })?;
    info!("✅ Configuration loaded and validated");

    info!("🔑 Loading credentials...");
    let credentials = match &config.credentials.env_file {
        Some(path) => {
            info!(file = %path.display(), "Reading credentials from env file");
            CredentialSet::from_env_file(path)?
        }
        None => {
            info!("Reading credentials from process environment");
            CredentialSet::from_process_env()?
        }
    };

    let server = GatewayServer::new(config, credentials)?;
    info!("🏗️  Gateway server created");

    Ok(server)
}

/// Run the server until a shutdown signal arrives
async fn graceful_shutdown(server: GatewayServer) -> GatewayResult<()> {
    let mut server_handle = tokio::spawn(async move {
        if let Err(e) = server.start().await {
            error!("Server error: {}", e);
        }
    });

    let shutdown_signal = async {
        let mut sigterm = signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler");
        let mut sigint = signal::unix::signal(signal::unix::SignalKind::interrupt())
            .expect("Failed to install SIGINT handler");

        tokio::select! {
            _ = sigterm.recv() => {
                info!("📡 Received SIGTERM, initiating graceful shutdown...");
            }
            _ = sigint.recv() => {
                info!("📡 Received SIGINT (Ctrl+C), initiating graceful shutdown...");
            }
        }
    };

    tokio::select! {
        _ = shutdown_signal => {
            info!("🛑 Shutdown signal received, stopping listeners...");
            server_handle.abort();
            // In-flight decisions have no side effects to undo; the only
            // cleanup is letting the sockets close
            tokio::time::sleep(std::time::Duration::from_millis(200)).await;
        }
        result = &mut server_handle => {
            match result {
                Ok(_) => info!("🏁 Server task completed"),
                Err(e) => warn!("🚨 Server task failed: {}", e),
            }
        }
    }

    Ok(())
}
