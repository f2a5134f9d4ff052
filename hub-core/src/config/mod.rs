use crate::error::AppError;
use config::{Config as Cfg, File};
use serde::Deserialize;

pub const DEFAULT_METRIC_PREFIX: &str = "custom.googleapis.com/lean_hub";

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default)]
    pub observability: ObservabilityConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ObservabilityConfig {
    /// Overrides the service's built-in name when set.
    #[serde(default)]
    pub service_name: Option<String>,
    /// Enables the trace-linkage log field and sink addressing.
    #[serde(default)]
    pub project_id: Option<String>,
    #[serde(default = "default_log_level")]
    pub log_level: String,
    #[serde(default)]
    pub otlp_endpoint: Option<String>,
    #[serde(default)]
    pub metrics: MetricsConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct MetricsConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default)]
    pub sink: MetricsSinkKind,
    /// Collector URL, required by the `http` sink.
    #[serde(default)]
    pub endpoint: Option<String>,
    #[serde(default = "default_prefix")]
    pub prefix: String,
    /// Seconds between background flushes. Zero disables them.
    #[serde(default = "default_flush_interval")]
    pub flush_interval_secs: u64,
}

#[derive(Debug, Deserialize, Clone, Copy, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum MetricsSinkKind {
    #[default]
    Log,
    Http,
    Prometheus,
}

fn default_port() -> u16 {
    8080
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_true() -> bool {
    true
}

fn default_prefix() -> String {
    DEFAULT_METRIC_PREFIX.to_string()
}

fn default_flush_interval() -> u64 {
    60
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: default_port(),
            observability: ObservabilityConfig::default(),
        }
    }
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            service_name: None,
            project_id: None,
            log_level: default_log_level(),
            otlp_endpoint: None,
            metrics: MetricsConfig::default(),
        }
    }
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            sink: MetricsSinkKind::default(),
            endpoint: None,
            prefix: default_prefix(),
            flush_interval_secs: default_flush_interval(),
        }
    }
}

impl ObservabilityConfig {
    /// The configured service name, or `default` when none was configured.
    pub fn service_name_or<'a>(&'a self, default: &'a str) -> &'a str {
        self.service_name
            .as_deref()
            .filter(|name| !name.trim().is_empty())
            .unwrap_or(default)
    }
}

impl Config {
    pub fn load() -> Result<Self, AppError> {
        dotenvy::dotenv().ok();

        let config = Cfg::builder()
            .add_source(File::with_name("configuration").required(false))
            .add_source(
                config::Environment::with_prefix("APP")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let mut config: Config = config.try_deserialize()?;
        config.observability.normalize(std::env::var("GCP_PROJECT_ID").ok());

        if config.observability.metrics.sink == MetricsSinkKind::Http
            && config.observability.metrics.endpoint.is_none()
        {
            return Err(AppError::ConfigError(anyhow::anyhow!(
                "observability.metrics.endpoint is required for the http metrics sink"
            )));
        }

        Ok(config)
    }
}

impl ObservabilityConfig {
    fn normalize(&mut self, fallback_project_id: Option<String>) {
        if self.project_id.is_none() {
            self.project_id = fallback_project_id;
        }
        self.project_id = self
            .project_id
            .take()
            .filter(|id| !id.trim().is_empty());
        self.otlp_endpoint = self
            .otlp_endpoint
            .take()
            .filter(|endpoint| !endpoint.trim().is_empty());
    }
}
