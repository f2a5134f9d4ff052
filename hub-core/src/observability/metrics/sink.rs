use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use async_trait::async_trait;
use serde::Serialize;
use thiserror::Error;

use crate::observability::logging::{LogSink, StdoutSink};

use super::MetricPoint;

#[derive(Debug, Error)]
pub enum SinkError {
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("collector rejected batch with status {0}")]
    Rejected(u16),

    #[error("failed to encode batch: {0}")]
    Encode(#[from] serde_json::Error),

    #[error("sink unavailable: {0}")]
    Unavailable(String),
}

/// Destination that accepts batches of metric points.
#[async_trait]
pub trait MetricsSink: Send + Sync {
    async fn send_batch(&self, batch: &[MetricPoint]) -> Result<(), SinkError>;
}

/// Writes each point as a `{"monitoring_metric": ...}` JSON line.
///
/// The platform's log agent picks these lines up, so this is the default
/// sink when no collector is configured.
pub struct LogLineMetricsSink {
    sink: Arc<dyn LogSink>,
}

impl LogLineMetricsSink {
    pub fn new(sink: Arc<dyn LogSink>) -> Self {
        Self { sink }
    }

    pub fn stdout() -> Self {
        Self::new(Arc::new(StdoutSink))
    }
}

#[async_trait]
impl MetricsSink for LogLineMetricsSink {
    async fn send_batch(&self, batch: &[MetricPoint]) -> Result<(), SinkError> {
        #[derive(Serialize)]
        struct Line<'a> {
            monitoring_metric: &'a MetricPoint,
        }

        for point in batch {
            let line = serde_json::to_string(&Line {
                monitoring_metric: point,
            })?;
            self.sink.write_line(&line);
        }
        Ok(())
    }
}

/// POSTs each batch as JSON to a collector endpoint.
pub struct HttpMetricsSink {
    client: reqwest::Client,
    endpoint: String,
    project_id: Option<String>,
}

impl HttpMetricsSink {
    pub fn new(endpoint: impl Into<String>, project_id: Option<String>) -> Self {
        Self::with_client(reqwest::Client::new(), endpoint, project_id)
    }

    pub fn with_client(
        client: reqwest::Client,
        endpoint: impl Into<String>,
        project_id: Option<String>,
    ) -> Self {
        Self {
            client,
            endpoint: endpoint.into(),
            project_id,
        }
    }
}

#[async_trait]
impl MetricsSink for HttpMetricsSink {
    async fn send_batch(&self, batch: &[MetricPoint]) -> Result<(), SinkError> {
        #[derive(Serialize)]
        struct Payload<'a> {
            #[serde(skip_serializing_if = "Option::is_none")]
            project_id: Option<&'a str>,
            points: &'a [MetricPoint],
        }

        let response = self
            .client
            .post(&self.endpoint)
            .json(&Payload {
                project_id: self.project_id.as_deref(),
                points: batch,
            })
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(SinkError::Rejected(status.as_u16()));
        }
        Ok(())
    }
}

/// Keeps every delivered batch in memory. Can be told to fail, for tests.
#[derive(Debug, Default)]
pub struct InMemoryMetricsSink {
    batches: Mutex<Vec<Vec<MetricPoint>>>,
    failing: AtomicBool,
}

impl InMemoryMetricsSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub fn batches(&self) -> Vec<Vec<MetricPoint>> {
        self.batches
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// All delivered points across batches, in delivery order.
    pub fn points(&self) -> Vec<MetricPoint> {
        self.batches().into_iter().flatten().collect()
    }
}

#[async_trait]
impl MetricsSink for InMemoryMetricsSink {
    async fn send_batch(&self, batch: &[MetricPoint]) -> Result<(), SinkError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(SinkError::Unavailable("in-memory sink set to fail".to_string()));
        }
        self.batches
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(batch.to_vec());
        Ok(())
    }
}
