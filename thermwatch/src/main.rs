//! Temperature monitor.
//!
//! Polls the board temperature sensor, logs hot readings to a rotating file
//! and warns when the smoothed temperature crosses a threshold.

use anyhow::{Context, Result};
use clap::Parser;
use tokio::signal::unix::{SignalKind, signal};
use tokio::sync::watch;
use tracing::info;

use thermwatch::config::MonitorConfig;
use thermwatch::daemon::daemonize;
use thermwatch::{MonitorArgs, TemperatureMonitor};

fn main() -> Result<()> {
    // Parse CLI arguments
    let args = MonitorArgs::parse();
    let mut config = args.into_config().context("Invalid configuration")?;

    thermwatch_common::init_tracing(&config.logging)
        .map_err(|e| anyhow::anyhow!("Failed to init tracing: {}", e))?;

    if config.daemonize {
        config
            .resolve_log_path()
            .context("Failed to resolve log file path")?;
        info!(log = %config.log_file.display(), "Detaching from terminal");
        daemonize().context("Failed to daemonize")?;
    }

    // Built after the fork; the runtime must not exist in the parent.
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("Failed to build tokio runtime")?;

    runtime.block_on(run(config))
}

async fn run(config: MonitorConfig) -> Result<()> {
    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    // Both handlers are installed before the first reading is taken.
    let mut sigterm =
        signal(SignalKind::terminate()).context("Failed to install SIGTERM handler")?;
    let mut sigint =
        signal(SignalKind::interrupt()).context("Failed to install SIGINT handler")?;

    tokio::spawn(async move {
        let received = tokio::select! {
            _ = sigint.recv() => "SIGINT",
            _ = sigterm.recv() => "SIGTERM",
        };
        info!(signal = received, "Received termination signal, shutting down...");
        let _ = shutdown_tx.send(true);
    });

    let sensor = config.build_sensor();
    let mut monitor = TemperatureMonitor::new(&config, sensor);
    let stats = monitor.run(shutdown_rx).await;

    println!("Terminating...");

    info!(
        samples = stats.samples,
        read_failures = stats.read_failures,
        lines_logged = stats.lines_logged,
        rotations = stats.rotations,
        log_failures = stats.log_failures,
        alerts = stats.alerts,
        "Final statistics"
    );

    Ok(())
}
