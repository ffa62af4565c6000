//! fritzd — the fritz-exporter daemon.
//!
//! Loads the configured devices, opens one TR-064 session per device and
//! serves `/metrics`; every scrape queries all devices live.
//!
//! # Usage
//!
//! ```text
//! FRITZ_USER=monitor FRITZ_PASS=secret fritzd
//! fritzd --config /etc/fritz/settings.json --port 8765
//! ```

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use tracing::{error, info, warn};

use fritz_collector::{DeviceRegistry, ScrapeOrchestrator};
use fritz_tr064::soap::{DEFAULT_PORT, SoapConnector};

#[derive(Parser, Debug)]
#[command(name = "fritzd", about = "Prometheus exporter for FRITZ!Box routers")]
struct Cli {
    /// Port to serve metrics on.
    #[arg(long, env = "FRITZ_EXPORTER_PORT", default_value = "8765")]
    port: u16,

    /// JSON file listing devices (`[{"host", "username", "password"}]`).
    #[arg(long, env = "FRITZ_CONFIG", default_value = "settings.json")]
    config: PathBuf,

    /// Per-device budget for one scrape, in seconds.
    #[arg(
        long,
        env = "FRITZ_DEVICE_TIMEOUT",
        default_value = "10",
        value_parser = clap::value_parser!(u64).range(1..)
    )]
    device_timeout: u64,

    /// TR-064 port on the devices.
    #[arg(long, env = "FRITZ_TR064_PORT", default_value_t = DEFAULT_PORT)]
    tr064_port: u16,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing.
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                tracing_subscriber::EnvFilter::new("info,fritzd=debug,fritz_collector=debug")
            }),
        )
        .init();

    let cli = Cli::parse();
    run(cli).await
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    info!(config = %cli.config.display(), "fritz exporter starting");

    let devices = fritz_core::load(&cli.config, |key| std::env::var(key).ok())?;
    if devices.is_empty() {
        warn!("no devices configured; scrapes will be empty");
    }

    let device_timeout = Duration::from_secs(cli.device_timeout);
    let connector = SoapConnector::new(cli.tr064_port, device_timeout);
    let registry = DeviceRegistry::connect(&devices, &connector).await;
    info!(
        configured = devices.len(),
        connected = registry.len(),
        "device registry ready"
    );

    let orchestrator = Arc::new(ScrapeOrchestrator::new(registry, device_timeout));
    let router = fritz_api::build_router(orchestrator);
    let addr = SocketAddr::from(([0, 0, 0, 0], cli.port));

    info!(%addr, "starting server");

    let listener = tokio::net::TcpListener::bind(addr).await?;

    // Graceful shutdown on Ctrl-C.
    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal(tokio::signal::ctrl_c()))
        .await?;

    info!("fritz exporter stopped");
    Ok(())
}

/// Resolves once `signal` fires. If the signal cannot be listened for,
/// the server keeps running until the process is killed.
async fn shutdown_signal<F>(signal: F)
where
    F: Future<Output = std::io::Result<()>>,
{
    match signal.await {
        Ok(()) => info!("shutdown signal received"),
        Err(e) => {
            error!(error = %e, "failed to listen for shutdown signal, running until killed");
            std::future::pending::<()>().await;
        }
    }
}
