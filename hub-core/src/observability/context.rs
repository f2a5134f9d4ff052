//! Per-request correlation context.
//!
//! The correlation middleware builds one [`RequestContext`] per inbound request
//! and runs the rest of the request inside [`RequestContext::scope`]. Code on
//! that request's task, the structured logger included, reads it back with
//! [`RequestContext::current`] without threading it through every call.
//! Work moved onto other tasks with `tokio::spawn` does not inherit the scope;
//! wrap it in `scope` again if it should log under the same correlation id.

use std::convert::Infallible;
use std::future::Future;
use std::sync::Arc;

use axum::{async_trait, extract::FromRequestParts, http::request::Parts};
use http::HeaderMap;

use super::trace_context::{
    CloudTraceContext, extract_cloud_trace, extract_correlation_id, generate_correlation_id,
};

tokio::task_local! {
    static REQUEST_CONTEXT: RequestContext;
}

#[derive(Debug)]
struct Inner {
    correlation_id: String,
    trace: Option<CloudTraceContext>,
}

/// Correlation and trace identifiers for a single request.
///
/// Cloning is cheap and every clone refers to the same immutable values.
#[derive(Debug, Clone)]
pub struct RequestContext {
    inner: Arc<Inner>,
}

impl RequestContext {
    pub fn new(correlation_id: String, trace: Option<CloudTraceContext>) -> Self {
        Self {
            inner: Arc::new(Inner {
                correlation_id,
                trace,
            }),
        }
    }

    /// Reuse the inbound correlation id or mint one, and parse the trace header.
    pub fn from_headers(headers: &HeaderMap) -> Self {
        let correlation_id =
            extract_correlation_id(headers).unwrap_or_else(generate_correlation_id);
        Self::new(correlation_id, extract_cloud_trace(headers))
    }

    pub fn correlation_id(&self) -> &str {
        &self.inner.correlation_id
    }

    pub fn trace_id(&self) -> Option<&str> {
        self.inner.trace.as_ref().map(|t| t.trace_id.as_str())
    }

    pub fn span_id(&self) -> Option<&str> {
        self.inner.trace.as_ref().and_then(|t| t.span_id.as_deref())
    }

    pub fn trace(&self) -> Option<&CloudTraceContext> {
        self.inner.trace.as_ref()
    }

    /// The context of the request the current task is serving, if any.
    pub fn current() -> Option<RequestContext> {
        REQUEST_CONTEXT.try_with(Clone::clone).ok()
    }

    /// Run `fut` with this context as the current one.
    pub async fn scope<F>(self, fut: F) -> F::Output
    where
        F: Future,
    {
        REQUEST_CONTEXT.scope(self, fut).await
    }

    /// Run a synchronous closure with this context as the current one.
    pub fn sync_scope<R>(self, f: impl FnOnce() -> R) -> R {
        REQUEST_CONTEXT.sync_scope(self, f)
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for RequestContext
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        if let Some(ctx) = parts.extensions.get::<RequestContext>() {
            return Ok(ctx.clone());
        }
        Ok(Self::current().unwrap_or_else(|| Self::from_headers(&parts.headers)))
    }
}
