//! Service lifecycle daemon.
//!
//! Runs one heartbeat step worker per configured service and keeps them
//! going until shutdown.
//!
//! # Architecture Overview
//!
//! ```text
//!   lifecycle.toml ──▶ config::load_config ──▶ StepWorkerService × N ──▶ ServiceGroup::start_all
//!         │                                            ▲
//!         └──▶ ConfigWatcher (file change, SIGHUP) ────┘ apply_config (live frequency)
//!
//!   Ctrl-C / SIGTERM / --run-for ──▶ Shutdown ──▶ ServiceGroup::stop_all ──▶ tick report
//! ```

use std::error::Error;
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use serde::Serialize;

use service_lifecycle::config::{load_config, ConfigWatcher, RuntimeConfig};
use service_lifecycle::lifecycle::signals::{SignalEvent, Signals};
use service_lifecycle::lifecycle::{ServiceGroup, Shutdown, State};
use service_lifecycle::observability::{init_logging, metrics};
use service_lifecycle::service::{Service, StepWorkHooks, StepWorkerService};
use service_lifecycle::worker::ThreadRegistry;

#[derive(Parser, Debug)]
#[command(name = "service-lifecycle")]
#[command(version, about = "Run stepped heartbeat services under lifecycle control", long_about = None)]
struct Cli {
    /// TOML configuration file. Watched for changes.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Stop after this many seconds instead of waiting for a signal.
    #[arg(long, value_name = "SECS")]
    run_for: Option<u64>,

    /// Print the final tick report as JSON.
    #[arg(long)]
    report_json: bool,
}

/// Step hooks counting beats.
#[derive(Debug, Default)]
struct Heartbeat {
    beats: AtomicU64,
}

impl StepWorkHooks for Heartbeat {
    fn on_work_setup(&self) {
        tracing::debug!("Heartbeat thread up");
    }

    fn on_work_start(&self) -> bool {
        let beat = self.beats.fetch_add(1, Ordering::Relaxed) + 1;
        tracing::trace!(beat, "Heartbeat");
        true
    }

    fn on_work_teardown(&self) {
        tracing::debug!(beats = self.beats.load(Ordering::Relaxed), "Heartbeat thread down");
    }
}

/// A running heartbeat and the config entry it came from.
struct RunningHeartbeat {
    config_name: String,
    service: Arc<StepWorkerService<Heartbeat>>,
}

#[derive(Debug, Serialize)]
struct TickReport {
    service: String,
    frequency_hz: f64,
    ticks: u64,
    state: Option<State>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => load_config(path)?,
        None => RuntimeConfig::default(),
    };
    init_logging(&config.observability)?;

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        services = config.services.len(),
        "service-lifecycle starting"
    );

    if config.observability.metrics_enabled {
        // Validated by load_config.
        if let Ok(addr) = config.observability.metrics_address.parse() {
            metrics::init_metrics(addr);
        }
    }

    let registry = Arc::new(ThreadRegistry::new());
    let (mut group, heartbeats) = build_services(&config, &registry)?;

    group.start_all()?;
    tracing::info!(threads = ?registry.names(), "All services started");

    let shutdown = Shutdown::new();
    if let Some(secs) = cli.run_for {
        shutdown.trigger_after(Duration::from_secs(secs));
    }
    let mut signals = Signals::install()?;

    let (watcher, mut updates) = match &cli.config {
        Some(path) => {
            let (watcher, updates) = ConfigWatcher::new(path);
            (Some(watcher), updates)
        }
        None => {
            let (_, updates) = tokio::sync::mpsc::unbounded_channel();
            (None, updates)
        }
    };
    let _watch_guard = match watcher.as_ref().map(ConfigWatcher::run) {
        Some(Ok(guard)) => Some(guard),
        Some(Err(e)) => {
            tracing::warn!(error = %e, "Config watcher unavailable, live reload disabled");
            None
        }
        None => None,
    };

    loop {
        tokio::select! {
            _ = shutdown.wait() => break,
            event = signals.recv() => match event {
                Ok(SignalEvent::Shutdown) => {
                    tracing::info!("Shutdown signal received");
                    shutdown.trigger();
                }
                Ok(SignalEvent::Reload) => match &watcher {
                    Some(watcher) => {
                        tracing::info!("Reload signal received");
                        watcher.reload();
                    }
                    None => tracing::info!("Reload signal ignored, no config file"),
                },
                Err(e) => {
                    tracing::error!(error = %e, "Signal handling failed, shutting down");
                    shutdown.trigger();
                }
            },
            Some(update) = updates.recv() => apply_update(&heartbeats, &update),
        }
    }

    let grace = Duration::from_secs(config.shutdown.grace_secs);
    let stopping = tokio::task::spawn_blocking(move || group.stop_all());
    match tokio::time::timeout(grace, stopping).await {
        Ok(Ok(true)) => tracing::info!("All services stopped"),
        Ok(Ok(false)) => tracing::warn!("Some services failed to stop"),
        Ok(Err(e)) => tracing::error!(error = %e, "Stop task panicked"),
        Err(_) => tracing::warn!(grace_secs = config.shutdown.grace_secs, "Services still stopping after grace period"),
    }

    print_report(&heartbeats, cli.report_json)?;
    tracing::info!("Shutdown complete");
    Ok(())
}

fn build_services(
    config: &RuntimeConfig,
    registry: &Arc<ThreadRegistry>,
) -> Result<(ServiceGroup, Vec<RunningHeartbeat>), Box<dyn Error>> {
    let mut group = ServiceGroup::new();
    let mut heartbeats = Vec::new();

    for entry in &config.services {
        for replica in 0..entry.nb_threads {
            let name = if entry.nb_threads == 1 {
                entry.name.clone()
            } else {
                format!("{}-{}", entry.name, replica)
            };
            let service = Arc::new(StepWorkerService::new(&name, Heartbeat::default()));
            if !service.apply_config(entry) {
                return Err(format!("invalid configuration for service {name}").into());
            }
            service.set_thread_registry(Arc::clone(registry));
            group.push(service.clone());
            heartbeats.push(RunningHeartbeat {
                config_name: entry.name.clone(),
                service,
            });
        }
    }
    Ok((group, heartbeats))
}

fn apply_update(heartbeats: &[RunningHeartbeat], update: &RuntimeConfig) {
    for heartbeat in heartbeats {
        match update.service(&heartbeat.config_name) {
            Some(entry) => {
                if heartbeat.service.apply_config(entry) {
                    tracing::info!(
                        service = %heartbeat.service.name(),
                        frequency_hz = entry.frequency_hz,
                        paused = entry.start_paused,
                        "Service reconfigured"
                    );
                }
            }
            None => tracing::warn!(
                service = %heartbeat.config_name,
                "Service missing from reloaded config, keeping it running"
            ),
        }
    }
    for entry in &update.services {
        if !heartbeats.iter().any(|h| h.config_name == entry.name) {
            tracing::warn!(service = %entry.name, "New services require a restart");
        }
    }
}

fn print_report(heartbeats: &[RunningHeartbeat], json: bool) -> Result<(), serde_json::Error> {
    let report: Vec<TickReport> = heartbeats
        .iter()
        .map(|h| TickReport {
            service: h.service.name().to_string(),
            frequency_hz: h.service.frequency(),
            ticks: h.service.ticks(),
            state: h.service.state(),
        })
        .collect();

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        for row in &report {
            let state = row.state.map(|s| s.to_string()).unwrap_or_default();
            println!(
                "{:<24} {:>8.2} Hz {:>10} ticks  {}",
                row.service, row.frequency_hz, row.ticks, state
            );
        }
    }
    Ok(())
}
