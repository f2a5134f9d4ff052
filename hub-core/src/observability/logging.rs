use std::fmt;
use std::io::Write;
use std::str::FromStr;
use std::sync::{Arc, Mutex, PoisonError};

use chrono::{SecondsFormat, Utc};
use opentelemetry::KeyValue;
use opentelemetry_otlp::WithExportConfig;
use opentelemetry_sdk::{Resource, runtime, trace as sdktrace};
use serde::Serialize;
use serde_json::{Map, Value};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use super::context::RequestContext;

/// Cloud Logging key that links a record to a trace.
pub const TRACE_FIELD: &str = "logging.googleapis.com/trace";

/// Cloud Logging key that links a record to a span within its trace.
pub const SPAN_FIELD: &str = "logging.googleapis.com/spanId";

/// Install the `tracing` subscriber used for framework diagnostics.
///
/// Application records go through [`StructuredLogger`]; this covers
/// tower-http spans and startup/shutdown messages. The OTLP layer is only
/// added when an endpoint is configured.
pub fn init_tracing(service_name: &str, log_level: &str, otlp_endpoint: Option<&str>) {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(log_level));

    let telemetry = otlp_endpoint.and_then(|endpoint| {
        let otlp_exporter = opentelemetry_otlp::new_exporter()
            .tonic()
            .with_endpoint(endpoint);

        match opentelemetry_otlp::new_pipeline()
            .tracing()
            .with_exporter(otlp_exporter)
            .with_trace_config(sdktrace::config().with_resource(Resource::new(vec![
                KeyValue::new("service.name", service_name.to_string()),
            ])))
            .install_batch(runtime::Tokio)
        {
            Ok(tracer) => Some(tracing_opentelemetry::layer().with_tracer(tracer)),
            Err(e) => {
                eprintln!(
                    "Failed to initialize OTLP tracer for service '{}' at endpoint '{}': {}",
                    service_name, endpoint, e
                );
                None
            }
        }
    });

    let result = tracing_subscriber::registry()
        .with(env_filter)
        .with(telemetry)
        .with(
            tracing_subscriber::fmt::layer()
                .with_file(true)
                .with_line_number(true)
                .json()
                .flatten_event(true),
        )
        .try_init();

    if let Err(e) = result {
        eprintln!("Tracing subscriber already installed: {}", e);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Severity {
    Debug,
    Info,
    Warning,
    Error,
    Critical,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Debug => "DEBUG",
            Severity::Info => "INFO",
            Severity::Warning => "WARNING",
            Severity::Error => "ERROR",
            Severity::Critical => "CRITICAL",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Severity {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "debug" | "trace" => Ok(Severity::Debug),
            "info" => Ok(Severity::Info),
            "warn" | "warning" => Ok(Severity::Warning),
            "error" => Ok(Severity::Error),
            "critical" | "fatal" => Ok(Severity::Critical),
            _ => Err(format!("Invalid severity: {}", s)),
        }
    }
}

/// Caller-supplied metadata for a log record.
///
/// Values that cannot be serialized are stored as their `Debug` rendering, so
/// building fields never fails.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Fields(Map<String, Value>);

impl Fields {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with<V>(mut self, key: impl Into<String>, value: &V) -> Self
    where
        V: Serialize + fmt::Debug + ?Sized,
    {
        self.insert(key, value);
        self
    }

    pub fn insert<V>(&mut self, key: impl Into<String>, value: &V)
    where
        V: Serialize + fmt::Debug + ?Sized,
    {
        let value = serde_json::to_value(value)
            .unwrap_or_else(|_| Value::String(format!("{:?}", value)));
        self.0.insert(key.into(), value);
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn into_map(self) -> Map<String, Value> {
        self.0
    }
}

impl From<()> for Fields {
    fn from(_: ()) -> Self {
        Self::new()
    }
}

impl From<Map<String, Value>> for Fields {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}

impl From<Value> for Fields {
    fn from(value: Value) -> Self {
        match value {
            Value::Object(map) => Self(map),
            Value::Null => Self::new(),
            other => {
                let mut map = Map::new();
                map.insert("metadata".to_string(), other);
                Self(map)
            }
        }
    }
}

/// Destination for serialized log lines.
///
/// Implementations must not fail observably; a line that cannot be written
/// is dropped.
pub trait LogSink: Send + Sync {
    fn write_line(&self, line: &str);
}

/// Writes one line per record to standard output.
#[derive(Debug, Default, Clone, Copy)]
pub struct StdoutSink;

impl LogSink for StdoutSink {
    fn write_line(&self, line: &str) {
        let mut stdout = std::io::stdout().lock();
        let _ = writeln!(stdout, "{}", line);
    }
}

/// Keeps every line in memory. Used by tests to inspect emitted records.
#[derive(Debug, Default)]
pub struct MemorySink {
    lines: Mutex<Vec<String>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn lines(&self) -> Vec<String> {
        self.lines
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Emitted lines parsed back into JSON objects.
    pub fn records(&self) -> Vec<Value> {
        self.lines()
            .iter()
            .filter_map(|line| serde_json::from_str(line).ok())
            .collect()
    }

    pub fn clear(&self) {
        self.lines
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }
}

impl LogSink for MemorySink {
    fn write_line(&self, line: &str) {
        self.lines
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(line.to_string());
    }
}

/// JSON-structured logger in the Cloud Logging record format.
///
/// Every record carries the service name, and the correlation and trace ids of
/// the request being served when called inside a [`RequestContext`] scope.
#[derive(Clone)]
pub struct StructuredLogger {
    service_name: Arc<str>,
    project_id: Option<Arc<str>>,
    min_severity: Severity,
    sink: Arc<dyn LogSink>,
}

impl fmt::Debug for StructuredLogger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StructuredLogger")
            .field("service_name", &self.service_name)
            .field("project_id", &self.project_id)
            .field("min_severity", &self.min_severity)
            .finish_non_exhaustive()
    }
}

impl StructuredLogger {
    pub fn new(service_name: impl Into<String>, project_id: Option<String>) -> Self {
        Self::with_sink(service_name, project_id, Arc::new(StdoutSink))
    }

    pub fn with_sink(
        service_name: impl Into<String>,
        project_id: Option<String>,
        sink: Arc<dyn LogSink>,
    ) -> Self {
        let service_name: String = service_name.into();
        Self {
            service_name: service_name.into(),
            project_id: project_id.filter(|id| !id.is_empty()).map(Into::into),
            min_severity: Severity::Info,
            sink,
        }
    }

    pub fn with_min_severity(mut self, min_severity: Severity) -> Self {
        self.min_severity = min_severity;
        self
    }

    pub fn service_name(&self) -> &str {
        &self.service_name
    }

    pub fn project_id(&self) -> Option<&str> {
        self.project_id.as_deref()
    }

    pub fn enabled(&self, severity: Severity) -> bool {
        severity >= self.min_severity
    }

    pub fn log(&self, severity: Severity, message: impl AsRef<str>, fields: impl Into<Fields>) {
        if !self.enabled(severity) {
            return;
        }
        let record = self.build_record(
            severity,
            message.as_ref(),
            fields.into(),
            RequestContext::current().as_ref(),
        );
        if let Ok(line) = serde_json::to_string(&record) {
            self.sink.write_line(&line);
        }
    }

    pub fn debug(&self, message: impl AsRef<str>, fields: impl Into<Fields>) {
        self.log(Severity::Debug, message, fields);
    }

    pub fn info(&self, message: impl AsRef<str>, fields: impl Into<Fields>) {
        self.log(Severity::Info, message, fields);
    }

    pub fn warning(&self, message: impl AsRef<str>, fields: impl Into<Fields>) {
        self.log(Severity::Warning, message, fields);
    }

    pub fn error(&self, message: impl AsRef<str>, fields: impl Into<Fields>) {
        self.log(Severity::Error, message, fields);
    }

    pub fn critical(&self, message: impl AsRef<str>, fields: impl Into<Fields>) {
        self.log(Severity::Critical, message, fields);
    }

    fn build_record(
        &self,
        severity: Severity,
        message: &str,
        fields: Fields,
        ctx: Option<&RequestContext>,
    ) -> Map<String, Value> {
        // Caller metadata first; the fixed fields below overwrite on collision.
        let mut record = fields.into_map();

        record.insert(
            "timestamp".to_string(),
            Value::String(Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)),
        );
        record.insert("severity".to_string(), Value::String(severity.to_string()));
        record.insert(
            "service".to_string(),
            Value::String(self.service_name.to_string()),
        );
        record.insert("message".to_string(), Value::String(message.to_string()));

        let Some(ctx) = ctx else {
            return record;
        };

        record.insert(
            "correlation_id".to_string(),
            Value::String(ctx.correlation_id().to_string()),
        );

        if let Some(trace_id) = ctx.trace_id() {
            record.insert("trace_id".to_string(), Value::String(trace_id.to_string()));
            if let Some(span_id) = ctx.span_id() {
                record.insert("span_id".to_string(), Value::String(span_id.to_string()));
            }

            if let Some(project_id) = &self.project_id {
                record.insert(
                    TRACE_FIELD.to_string(),
                    Value::String(format!("projects/{}/traces/{}", project_id, trace_id)),
                );
                if let Some(span_id) = ctx.span_id() {
                    record.insert(SPAN_FIELD.to_string(), Value::String(span_id.to_string()));
                }
            }
        }

        record
    }
}
