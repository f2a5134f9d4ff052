pub mod context;
pub mod logging;
pub mod metrics;
pub mod timing;
pub mod trace_context;

use std::sync::Arc;

use crate::config::{MetricsSinkKind, ObservabilityConfig};
use crate::error::AppError;

pub use context::RequestContext;
pub use logging::{Fields, LogSink, MemorySink, Severity, StdoutSink, StructuredLogger, init_tracing};
pub use metrics::{MetricPoint, MetricsClient, MetricsSink};
pub use timing::{MonitorRequest, ObservedStatus, PANIC_ERROR_TYPE};
pub use trace_context::{
    CLOUD_TRACE_CONTEXT_HEADER, CORRELATION_ID_HEADER, CloudTraceContext, extract_trace_id,
    generate_correlation_id, inject_context_headers,
};

/// Logger and metrics client shared by every handler of one service.
#[derive(Debug, Clone)]
pub struct Observability {
    pub logger: StructuredLogger,
    pub metrics: Arc<MetricsClient>,
}

impl Observability {
    pub fn new(logger: StructuredLogger, metrics: Arc<MetricsClient>) -> Self {
        Self { logger, metrics }
    }

    /// Build the logger and metrics client described by `config`, writing
    /// log records to standard output.
    pub fn from_config(service_name: &str, config: &ObservabilityConfig) -> Result<Self, AppError> {
        let min_severity = config
            .log_level
            .split(',')
            .next()
            .and_then(|level| level.parse::<Severity>().ok())
            .unwrap_or(Severity::Info);

        let logger = StructuredLogger::new(service_name, config.project_id.clone())
            .with_min_severity(min_severity);

        let sink: Arc<dyn MetricsSink> = match config.metrics.sink {
            MetricsSinkKind::Log => Arc::new(metrics::LogLineMetricsSink::stdout()),
            MetricsSinkKind::Http => {
                let endpoint = config.metrics.endpoint.clone().ok_or_else(|| {
                    AppError::ConfigError(anyhow::anyhow!(
                        "observability.metrics.endpoint is required for the http metrics sink"
                    ))
                })?;
                Arc::new(metrics::HttpMetricsSink::new(
                    endpoint,
                    config.project_id.clone(),
                ))
            }
            MetricsSinkKind::Prometheus => {
                metrics::init_prometheus();
                Arc::new(metrics::PrometheusMetricsSink::new())
            }
        };

        let metrics = MetricsClient::new(logger.clone(), sink)
            .with_prefix(config.metrics.prefix.as_str())
            .with_enabled(config.metrics.enabled);

        Ok(Self::new(logger, Arc::new(metrics)))
    }

    /// Timing wrapper bound to this service's metrics client.
    pub fn monitor(&self, endpoint: impl Into<String>) -> MonitorRequest {
        MonitorRequest::new(self.metrics.clone(), endpoint)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::MetricsConfig;

    #[test]
    fn from_config_applies_identity_and_prefix() {
        let config = ObservabilityConfig {
            project_id: Some("my-project".to_string()),
            log_level: "warn,tower_http=debug".to_string(),
            metrics: MetricsConfig {
                prefix: "custom.googleapis.com/test".to_string(),
                ..Default::default()
            },
            ..Default::default()
        };

        let obs = Observability::from_config("project_3", &config).unwrap();
        assert_eq!(obs.logger.service_name(), "project_3");
        assert_eq!(obs.logger.project_id(), Some("my-project"));
        assert!(!obs.logger.enabled(Severity::Info));
        assert!(obs.logger.enabled(Severity::Warning));
        assert_eq!(obs.metrics.service_name(), "project_3");
        assert_eq!(
            obs.metrics.metric_name("request_count"),
            "custom.googleapis.com/test/request_count"
        );
    }

    #[test]
    fn http_sink_requires_endpoint() {
        let config = ObservabilityConfig {
            metrics: MetricsConfig {
                sink: MetricsSinkKind::Http,
                endpoint: None,
                ..Default::default()
            },
            ..Default::default()
        };

        let err = Observability::from_config("project_1", &config).unwrap_err();
        assert!(matches!(err, AppError::ConfigError(_)));
    }
}
