//! Serve command: keeps the dispatcher mirror fresh until interrupted.

use anyhow::{Context, Result};
use colored::Colorize;
use std::net::SocketAddr;

use fh_core::CancellationToken;

use crate::config::AppConfig;
use crate::runtime::Runtime;

/// Runs the background refresh loop until Ctrl+C.
pub async fn run_server(config: &AppConfig) -> Result<()> {
    eprintln!("{} Starting Fleet Hunt dispatcher...", "[server]".cyan());

    let runtime = Runtime::open(config).await?;
    let service_config = runtime.service.config().clone();

    if config.metrics.enabled {
        let addr: SocketAddr = config
            .metrics
            .listen
            .parse()
            .context("Invalid metrics listen address")?;
        fh_observability::install_prometheus_exporter(addr)?;
        eprintln!("  {} Metrics: http://{}/metrics", "→".green(), addr);
    }

    let dispatcher = runtime.service.dispatcher();
    eprintln!();
    eprintln!("{}", "Fleet Hunt Dispatcher".bold());
    eprintln!("{}", "═".repeat(40));
    eprintln!("  {} {}", "Data:".cyan(), config.storage.data_dir.display());
    eprintln!(
        "  {} {}",
        "Artifacts:".cyan(),
        config.artifacts.definitions_dir.display()
    );
    eprintln!("  {} {}", "Hunts:".cyan(), dispatcher.len().await);
    eprintln!(
        "  {} every {}s",
        "Refresh:".cyan(),
        service_config.refresh_interval.as_secs()
    );
    eprintln!();
    eprintln!("Press {} to stop", "Ctrl+C".yellow());
    eprintln!();

    let cancel = CancellationToken::new();
    let refresher = dispatcher.spawn_refresh_task(service_config.refresh_interval, cancel.clone());

    tokio::signal::ctrl_c()
        .await
        .context("Failed to listen for Ctrl+C")?;

    eprintln!();
    eprintln!("{}", "Shutting down...".yellow());
    cancel.cancel();
    refresher.await.context("Refresh task panicked")?;

    tracing::info!(
        refreshes = dispatcher.refresh_count(),
        connected_clients = runtime.notifier.connected().await.len(),
        "Dispatcher stopped"
    );
    eprintln!("{} Server stopped", "[server]".cyan());

    Ok(())
}
