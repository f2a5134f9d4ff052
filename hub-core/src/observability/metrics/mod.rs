//! Buffered custom metrics.
//!
//! Observations are appended to an in-memory buffer owned by [`MetricsClient`]
//! and only leave the process when [`MetricsClient::flush`] is called, which
//! hands the whole buffer to a [`MetricsSink`] as one batch.

pub mod client;
pub mod prometheus;
pub mod sink;

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub use client::{
    ERROR_COUNT, HEALTH_STATUS, MetricsClient, MetricsState, REQUEST_COUNT, REQUEST_DURATION,
    status_class,
};
pub use prometheus::{PrometheusMetricsSink, init_prometheus, render_prometheus};
pub use sink::{HttpMetricsSink, InMemoryMetricsSink, LogLineMetricsSink, MetricsSink, SinkError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MetricKind {
    Counter,
    Distribution,
    Gauge,
}

/// One numeric observation waiting in the buffer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricPoint {
    pub metric_name: String,
    pub kind: MetricKind,
    pub value: f64,
    pub labels: BTreeMap<String, String>,
    pub recorded_at: DateTime<Utc>,
}

impl MetricPoint {
    pub fn new(
        metric_name: impl Into<String>,
        kind: MetricKind,
        value: f64,
        labels: BTreeMap<String, String>,
    ) -> Self {
        Self {
            metric_name: metric_name.into(),
            kind,
            value,
            labels,
            recorded_at: Utc::now(),
        }
    }

    pub fn label(&self, key: &str) -> Option<&str> {
        self.labels.get(key).map(String::as_str)
    }

    /// Last segment of the namespaced metric name.
    pub fn short_name(&self) -> &str {
        self.metric_name
            .rsplit('/')
            .next()
            .unwrap_or(&self.metric_name)
    }
}
