//! Metrics collection and exposition.
//!
//! # Metrics
//! - `lifecycle_operations_total` (counter): accepted operations by
//!   service, operation, outcome
//! - `lifecycle_rejected_total` (counter): operations refused by the
//!   controller, by service and operation
//! - `worker_threads_total` (counter): worker thread events (spawned,
//!   spawn_failed, exited)
//! - `step_worker_ticks_total` (counter): steps executed, by worker
//! - `service_running` (gauge): 1 while the service reports running
//!
//! # Design Decisions
//! - Low-overhead metric updates (atomic operations)
//! - Calls are no-ops until `init_metrics` installs a recorder

use std::net::SocketAddr;

use metrics_exporter_prometheus::PrometheusBuilder;

use crate::lifecycle::Operation;

/// Install the Prometheus recorder with an HTTP scrape listener on `addr`.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics exporter listening"),
        Err(e) => tracing::error!(error = %e, address = %addr, "Failed to install metrics exporter"),
    }
}

pub fn record_operation(service: &str, operation: Operation, success: bool) {
    let outcome = if success { "success" } else { "error" };
    ::metrics::counter!(
        "lifecycle_operations_total",
        "service" => service.to_string(),
        "operation" => operation.as_str(),
        "outcome" => outcome
    )
    .increment(1);
}

pub fn record_rejected(service: &str, operation: Operation) {
    ::metrics::counter!(
        "lifecycle_rejected_total",
        "service" => service.to_string(),
        "operation" => operation.as_str()
    )
    .increment(1);
}

pub fn record_worker_thread(event: &'static str) {
    ::metrics::counter!("worker_threads_total", "event" => event).increment(1);
}

pub fn record_step_tick(worker: &str) {
    ::metrics::counter!("step_worker_ticks_total", "worker" => worker.to_string()).increment(1);
}

pub fn record_service_running(service: &str, running: bool) {
    ::metrics::gauge!("service_running", "service" => service.to_string())
        .set(if running { 1.0 } else { 0.0 });
}
