//! Prometheus metrics setup and metric definitions

use anyhow::{Context, Result};
use metrics::{counter, describe_counter, describe_histogram, histogram};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use std::time::Duration;

/// Install the Prometheus recorder and return a handle for rendering metrics.
pub fn install_prometheus_recorder() -> Result<PrometheusHandle> {
    // Seconds. Sub-millisecond buckets for handlers that never leave memory.
    let buckets = vec![
        0.0005, 0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0,
    ];

    PrometheusBuilder::new()
        .set_buckets(&buckets)
        .context("failed to set histogram buckets")?
        .install_recorder()
        .context("failed to install Prometheus recorder")
}

/// Register metric descriptions so that HELP/TYPE lines are present from startup.
pub fn describe_metrics() {
    describe_counter!("mesh_action_total", "Total number of dispatched resource actions");
    describe_histogram!(
        "mesh_action_duration_seconds",
        "Time spent inside resource action handlers in seconds"
    );
    describe_counter!(
        "mesh_client_requests_total",
        "Outbound requests to sibling services by outcome"
    );
    describe_counter!(
        "mesh_authorization_total",
        "Authorization stage outcomes"
    );
    describe_counter!("mesh_log_metrics_total", "Log entries emitted at the metric level");
}

/// Record one handler invocation.
pub fn record_action(kind: &str, action: &str, status: u16, elapsed: Duration) {
    counter!(
        "mesh_action_total",
        "kind" => kind.to_string(),
        "action" => action.to_string(),
        "status" => status.to_string()
    )
    .increment(1);
    histogram!(
        "mesh_action_duration_seconds",
        "kind" => kind.to_string(),
        "action" => action.to_string()
    )
    .record(elapsed.as_secs_f64());
}

pub fn record_client_request(kind: &str, action: &str, outcome: &'static str) {
    counter!(
        "mesh_client_requests_total",
        "kind" => kind.to_string(),
        "action" => action.to_string(),
        "outcome" => outcome
    )
    .increment(1);
}

pub fn record_authorization(outcome: &'static str) {
    counter!("mesh_authorization_total", "outcome" => outcome).increment(1);
}

pub fn record_log_metric() {
    counter!("mesh_log_metrics_total").increment(1);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recording_without_recorder_is_noop() {
        describe_metrics();
        record_action("entity", "get", 200, Duration::from_millis(3));
        record_client_request("label", "query", "ok");
        record_authorization("granted");
    }
}
