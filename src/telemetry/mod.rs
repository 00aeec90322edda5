//! Telemetry initialization: metrics, tracing, and structured logging

pub mod metrics;

use crate::config::TelemetryConfig;
use crate::resource::Level;
use anyhow::Result;
use metrics_exporter_prometheus::PrometheusHandle;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Initialise the full telemetry stack.
///
/// Returns `Some(PrometheusHandle)` when metrics are enabled so the HTTP
/// server can expose a `/metrics` endpoint.
pub fn init(config: &TelemetryConfig) -> Result<Option<PrometheusHandle>> {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "mesh_core=info,tower_http=info".into());

    let prometheus_handle = if config.metrics_enabled {
        let handle = metrics::install_prometheus_recorder()?;
        metrics::describe_metrics();
        Some(handle)
    } else {
        None
    };

    let registry = tracing_subscriber::registry().with(env_filter);

    if config.log_format == "json" {
        // Flatten event fields so `message` is top-level.
        let fmt_layer = tracing_subscriber::fmt::layer()
            .json()
            .flatten_event(true);
        registry.with(fmt_layer).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }

    tracing::info!(service = %config.service_name, "telemetry initialised");
    Ok(prometheus_handle)
}

/// Emits `message` at a mesh log level.
///
/// Alarms become `error` events. Events are `info` events flagged
/// `event = true`. Metrics are `info` events carrying the `metric` field and
/// are also counted in `mesh_log_metrics_total`.
pub fn emit(level: Level, message: &str) {
    match level {
        Level::Trace => tracing::trace!("{}", message),
        Level::Debug => tracing::debug!("{}", message),
        Level::Info => tracing::info!("{}", message),
        Level::Alarm => tracing::error!(alarm = true, "{}", message),
        Level::Event => tracing::info!(event = true, "{}", message),
        Level::Metric => {
            tracing::info!(metric = %message, "{}", message);
            metrics::record_log_metric();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_emit_every_level_without_subscriber() {
        for level in Level::ALL {
            emit(level, "hello");
        }
    }

    #[test]
    fn test_metric_level_is_counted() {
        let recorder = metrics_exporter_prometheus::PrometheusBuilder::new().build_recorder();
        let handle = recorder.handle();

        ::metrics::with_local_recorder(&recorder, || {
            emit(Level::Metric, "cache warmed");
            emit(Level::Metric, "cache warmed");
            emit(Level::Event, "not a metric");
        });

        assert!(handle.render().contains("mesh_log_metrics_total 2"));
    }
}
