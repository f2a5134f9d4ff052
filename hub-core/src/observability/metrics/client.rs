use std::collections::BTreeMap;
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::config::DEFAULT_METRIC_PREFIX;
use crate::observability::logging::{Fields, StructuredLogger};

use super::sink::MetricsSink;
use super::{MetricKind, MetricPoint};

pub const REQUEST_COUNT: &str = "request_count";
pub const REQUEST_DURATION: &str = "request_duration";
pub const ERROR_COUNT: &str = "error_count";
pub const HEALTH_STATUS: &str = "health_status";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetricsState {
    /// Nothing waiting to be flushed.
    Idle,
    /// At least one point is buffered.
    Accumulating,
}

/// Collapse an HTTP status code into its class label (`2xx`, `4xx`, ...).
pub fn status_class(status_code: u16) -> &'static str {
    match status_code {
        100..=199 => "1xx",
        200..=299 => "2xx",
        300..=399 => "3xx",
        400..=499 => "4xx",
        500..=599 => "5xx",
        _ => "unknown",
    }
}

/// Process-wide metrics buffer for one service.
///
/// `record_*` only append to the buffer. Nothing is sent until `flush` is
/// called; the buffer has no size limit, so callers are expected to flush
/// periodically. A flush that fails is logged and the batch is dropped.
pub struct MetricsClient {
    service_name: String,
    project_id: Option<String>,
    prefix: String,
    enabled: bool,
    buffer: Mutex<Vec<MetricPoint>>,
    sink: Arc<dyn MetricsSink>,
    logger: StructuredLogger,
}

impl fmt::Debug for MetricsClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MetricsClient")
            .field("service_name", &self.service_name)
            .field("project_id", &self.project_id)
            .field("prefix", &self.prefix)
            .field("enabled", &self.enabled)
            .field("pending", &self.pending())
            .finish_non_exhaustive()
    }
}

impl MetricsClient {
    /// Identity (service name, project id) is taken from the logger so that
    /// metrics and log records always agree.
    pub fn new(logger: StructuredLogger, sink: Arc<dyn MetricsSink>) -> Self {
        Self {
            service_name: logger.service_name().to_string(),
            project_id: logger.project_id().map(str::to_string),
            prefix: DEFAULT_METRIC_PREFIX.to_string(),
            enabled: true,
            buffer: Mutex::new(Vec::new()),
            sink,
            logger,
        }
    }

    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = prefix.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    pub fn service_name(&self) -> &str {
        &self.service_name
    }

    pub fn project_id(&self) -> Option<&str> {
        self.project_id.as_deref()
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn metric_name(&self, name: &str) -> String {
        format!("{}/{}", self.prefix, name)
    }

    /// Record one handled request: a count point and a duration point.
    pub fn record_request(&self, endpoint: &str, method: &str, status_code: u16, duration_ms: f64) {
        if !self.enabled {
            return;
        }

        let mut labels = self.base_labels();
        labels.insert("endpoint".to_string(), endpoint.to_string());
        labels.insert("method".to_string(), method.to_uppercase());
        labels.insert(
            "status_class".to_string(),
            status_class(status_code).to_string(),
        );

        let count = MetricPoint::new(
            self.metric_name(REQUEST_COUNT),
            MetricKind::Counter,
            1.0,
            labels.clone(),
        );
        let mut duration = MetricPoint::new(
            self.metric_name(REQUEST_DURATION),
            MetricKind::Distribution,
            duration_ms,
            labels,
        );
        duration.recorded_at = count.recorded_at;

        let mut buffer = self.lock_buffer();
        buffer.push(count);
        buffer.push(duration);
    }

    /// Record one error occurrence.
    ///
    /// Only `error_type` becomes a label; the message is attached to the
    /// accompanying log record instead.
    pub fn record_error(&self, error_type: &str, error_message: &str) {
        self.logger.error(
            "Error recorded",
            Fields::new()
                .with("error_type", error_type)
                .with("error_message", error_message),
        );

        if !self.enabled {
            return;
        }

        let mut labels = self.base_labels();
        labels.insert("error_type".to_string(), error_type.to_string());

        self.lock_buffer().push(MetricPoint::new(
            self.metric_name(ERROR_COUNT),
            MetricKind::Counter,
            1.0,
            labels,
        ));
    }

    /// Record the outcome of a health check as a 1/0 gauge and log `details`.
    pub fn record_health_check(&self, healthy: bool, details: impl Into<Fields>) {
        let fields = details.into().with("healthy", &healthy);
        if healthy {
            self.logger.info("Health check", fields);
        } else {
            self.logger.warning("Health check failed", fields);
        }

        if !self.enabled {
            return;
        }

        self.lock_buffer().push(MetricPoint::new(
            self.metric_name(HEALTH_STATUS),
            MetricKind::Gauge,
            if healthy { 1.0 } else { 0.0 },
            self.base_labels(),
        ));
    }

    /// Send every buffered point to the sink as one batch.
    ///
    /// Returns the number of points delivered. An empty buffer is a no-op and
    /// does not touch the sink. On sink failure the batch is dropped and a
    /// warning is logged; the error never reaches the caller.
    pub async fn flush(&self) -> usize {
        let batch = {
            let mut buffer = self.lock_buffer();
            if buffer.is_empty() {
                return 0;
            }
            std::mem::take(&mut *buffer)
        };

        match self.sink.send_batch(&batch).await {
            Ok(()) => {
                self.logger
                    .debug("Flushed metrics", Fields::new().with("points", &batch.len()));
                batch.len()
            }
            Err(e) => {
                self.logger.warning(
                    "Failed to flush metrics, dropping batch",
                    Fields::new()
                        .with("points", &batch.len())
                        .with("error", &e.to_string()),
                );
                0
            }
        }
    }

    /// Drop every buffered point without sending it. Returns how many were dropped.
    pub fn clear(&self) -> usize {
        let mut buffer = self.lock_buffer();
        let dropped = buffer.len();
        buffer.clear();
        dropped
    }

    pub fn pending(&self) -> usize {
        self.lock_buffer().len()
    }

    pub fn state(&self) -> MetricsState {
        if self.pending() == 0 {
            MetricsState::Idle
        } else {
            MetricsState::Accumulating
        }
    }

    /// Copy of the buffered points, oldest first.
    pub fn snapshot(&self) -> Vec<MetricPoint> {
        self.lock_buffer().clone()
    }

    fn base_labels(&self) -> BTreeMap<String, String> {
        let mut labels = BTreeMap::new();
        labels.insert("service".to_string(), self.service_name.clone());
        labels
    }

    fn lock_buffer(&self) -> MutexGuard<'_, Vec<MetricPoint>> {
        self.buffer.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
