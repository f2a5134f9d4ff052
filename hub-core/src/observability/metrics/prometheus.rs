//! Prometheus export for buffered metrics.
//!
//! [`PrometheusMetricsSink`] replays each flushed batch into the `metrics`
//! facade; the installed Prometheus recorder then serves them on `/metrics`.

use std::sync::OnceLock;

use async_trait::async_trait;
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};

use super::sink::{MetricsSink, SinkError};
use super::{MetricKind, MetricPoint};

/// Global handle to the Prometheus recorder, if one could be installed.
static METRICS_HANDLE: OnceLock<Option<PrometheusHandle>> = OnceLock::new();

/// Install the Prometheus recorder. Safe to call more than once.
pub fn init_prometheus() -> Option<&'static PrometheusHandle> {
    METRICS_HANDLE
        .get_or_init(|| match PrometheusBuilder::new().install_recorder() {
            Ok(handle) => Some(handle),
            Err(e) => {
                tracing::warn!("Failed to install Prometheus recorder: {}", e);
                None
            }
        })
        .as_ref()
}

/// Current metrics in Prometheus text format, for the `/metrics` endpoint.
pub fn render_prometheus() -> String {
    METRICS_HANDLE
        .get()
        .and_then(Option::as_ref)
        .map(|handle| handle.render())
        .unwrap_or_else(|| "# Metrics recorder not initialized".to_string())
}

/// `custom.googleapis.com/lean_hub/request_count` -> `lean_hub_request_count`.
pub fn prometheus_name(metric_name: &str) -> String {
    let mut segments: Vec<&str> = metric_name.rsplit('/').take(2).collect();
    segments.reverse();
    segments
        .join("_")
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .collect()
}

#[derive(Debug, Default, Clone, Copy)]
pub struct PrometheusMetricsSink;

impl PrometheusMetricsSink {
    pub fn new() -> Self {
        Self
    }

    /// Apply a batch to whichever recorder is active.
    pub fn apply(&self, batch: &[MetricPoint]) {
        for point in batch {
            let name = prometheus_name(&point.metric_name);
            let labels: Vec<::metrics::Label> = point
                .labels
                .iter()
                .map(|(k, v)| ::metrics::Label::new(k.clone(), v.clone()))
                .collect();

            match point.kind {
                MetricKind::Counter => {
                    ::metrics::counter!(name, labels).increment(point.value.max(0.0) as u64)
                }
                MetricKind::Distribution => ::metrics::histogram!(name, labels).record(point.value),
                MetricKind::Gauge => ::metrics::gauge!(name, labels).set(point.value),
            }
        }
    }
}

#[async_trait]
impl MetricsSink for PrometheusMetricsSink {
    async fn send_batch(&self, batch: &[MetricPoint]) -> Result<(), SinkError> {
        self.apply(batch);
        Ok(())
    }
}
