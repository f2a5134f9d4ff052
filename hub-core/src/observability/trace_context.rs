//! Correlation id and Cloud Trace header helpers.
//!
//! The platform's load balancer sets `X-Cloud-Trace-Context` on every inbound
//! request using the format `TRACE_ID/SPAN_ID;o=OPTIONS`, where the span id and
//! the options suffix are optional. Services also accept an `X-Correlation-ID`
//! header from callers and echo it back on the response.

use http::{HeaderMap, HeaderValue};
use uuid::Uuid;

use super::context::RequestContext;

/// Header carrying the per-request correlation id, inbound and outbound.
pub const CORRELATION_ID_HEADER: &str = "x-correlation-id";

/// Header carrying the platform trace context.
pub const CLOUD_TRACE_CONTEXT_HEADER: &str = "x-cloud-trace-context";

/// Parsed form of an `X-Cloud-Trace-Context` header value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CloudTraceContext {
    pub trace_id: String,
    pub span_id: Option<String>,
    pub sampled: Option<bool>,
}

impl CloudTraceContext {
    /// Parse a raw header value.
    ///
    /// The trace id is everything before the first `/`. Parsing is
    /// permissive: a value without `/` is taken as a bare trace id with an
    /// optional `;` options suffix. Returns `None` when no trace id can be
    /// recovered.
    pub fn parse(value: &str) -> Option<Self> {
        let value = value.trim();
        let (trace_id, span_id, options) = match value.split_once('/') {
            Some((trace_id, rest)) => match rest.split_once(';') {
                Some((span_id, options)) => (trace_id, Some(span_id.trim()), Some(options)),
                None => (trace_id, Some(rest.trim()), None),
            },
            None => match value.split_once(';') {
                Some((trace_id, options)) => (trace_id, None, Some(options)),
                None => (value, None, None),
            },
        };
        let trace_id = trace_id.trim();

        if trace_id.is_empty() {
            return None;
        }

        let sampled = options
            .and_then(|options| options.trim().strip_prefix("o="))
            .and_then(|flag| match flag.trim() {
                "1" => Some(true),
                "0" => Some(false),
                _ => None,
            });

        Some(Self {
            trace_id: trace_id.to_string(),
            span_id: span_id.filter(|s| !s.is_empty()).map(str::to_string),
            sampled,
        })
    }

    /// Render back into header form.
    pub fn to_header_value(&self) -> String {
        let mut value = self.trace_id.clone();
        if let Some(span_id) = &self.span_id {
            value.push('/');
            value.push_str(span_id);
        }
        if let Some(sampled) = self.sampled {
            value.push_str(if sampled { ";o=1" } else { ";o=0" });
        }
        value
    }
}

/// Generate a unique correlation id for request tracking.
pub fn generate_correlation_id() -> String {
    Uuid::new_v4().to_string()
}

/// Extract the trace id from an `X-Cloud-Trace-Context` header value.
///
/// Missing, empty, or unparseable values yield `None`.
pub fn extract_trace_id(header_value: Option<&str>) -> Option<String> {
    header_value
        .and_then(CloudTraceContext::parse)
        .map(|ctx| ctx.trace_id)
}

/// Extract the correlation id from incoming request headers.
///
/// Any UTF-8 value is kept as sent. Empty, whitespace-only and non-UTF-8
/// values are ignored so the caller can mint a fresh id.
pub fn extract_correlation_id(headers: &HeaderMap) -> Option<String> {
    headers
        .get(CORRELATION_ID_HEADER)
        .and_then(|v| std::str::from_utf8(v.as_bytes()).ok())
        .filter(|s| !s.trim().is_empty())
        .map(|s| s.to_string())
}

/// Extract and parse the Cloud Trace header from incoming request headers.
pub fn extract_cloud_trace(headers: &HeaderMap) -> Option<CloudTraceContext> {
    headers
        .get(CLOUD_TRACE_CONTEXT_HEADER)
        .and_then(|v| v.to_str().ok())
        .and_then(CloudTraceContext::parse)
}

/// Inject the correlation id and trace context into outgoing request headers.
///
/// Used when a service calls another service so both sides log under the
/// same correlation id and trace.
pub fn inject_context_headers(headers: &mut HeaderMap, ctx: &RequestContext) {
    if let Ok(value) = HeaderValue::from_bytes(ctx.correlation_id().as_bytes()) {
        headers.insert(CORRELATION_ID_HEADER, value);
    }

    if let Some(trace) = ctx.trace()
        && let Ok(value) = HeaderValue::from_str(&trace.to_header_value())
    {
        headers.insert(CLOUD_TRACE_CONTEXT_HEADER, value);
    }
}
