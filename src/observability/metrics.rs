//! Metrics collection and exposition.
//!
//! # Metrics
//! - `farmctl_commands_total` (counter): handled commands by command, outcome
//! - `farmctl_denied_total` (counter): commands refused by the admin gate
//! - `farmctl_store_writes_total` (counter): store rewrites by store, outcome
//! - `farmctl_worker_transitions_total` (counter): worker actions by action, outcome
//! - `farmctl_proxies` (gauge): size of the live proxy set
//!
//! # Design Decisions
//! - Recording is a no-op until a recorder is installed (tests, exporter off)
//! - Labels are static strings, no identities or payloads

use metrics_exporter_prometheus::PrometheusBuilder;
use std::net::SocketAddr;

/// Install the Prometheus recorder and its scrape endpoint.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics endpoint listening"),
        Err(e) => tracing::error!(address = %addr, error = %e, "Failed to install metrics exporter"),
    }
}

fn outcome(ok: bool) -> &'static str {
    if ok {
        "ok"
    } else {
        "error"
    }
}

pub fn record_command(command: &'static str, ok: bool) {
    ::metrics::counter!("farmctl_commands_total", "command" => command, "outcome" => outcome(ok))
        .increment(1);
}

pub fn record_denied() {
    ::metrics::counter!("farmctl_denied_total").increment(1);
}

pub fn record_store_write(store: &'static str, ok: bool) {
    ::metrics::counter!("farmctl_store_writes_total", "store" => store, "outcome" => outcome(ok))
        .increment(1);
}

pub fn record_worker_transition(action: &'static str, ok: bool) {
    ::metrics::counter!("farmctl_worker_transitions_total", "action" => action, "outcome" => outcome(ok))
        .increment(1);
}

pub fn record_proxy_count(count: usize) {
    ::metrics::gauge!("farmctl_proxies").set(count as f64);
}
