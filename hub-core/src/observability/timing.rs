//! Request timing wrapper.
//!
//! [`MonitorRequest`] brackets a handler with a duration measurement and a
//! single metrics call: `record_request` when the handler returns `Ok`,
//! `record_error` when it returns `Err`. The handler's value or error is
//! handed back untouched.
//!
//! ```ignore
//! let monitor = MonitorRequest::new(metrics.clone(), "/query").method(Method::POST);
//! monitor.call(async move { run_query(request).await }).await
//! ```

use std::any::Any;
use std::fmt;
use std::future::Future;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::time::Instant;

use axum::{Json, http::Method, http::StatusCode, response::Response};
use futures::FutureExt;
use futures::future::BoxFuture;

use super::metrics::MetricsClient;

/// Status a successful handler result reports to the timing wrapper.
///
/// Results that carry their own status report it; everything else falls back
/// to the wrapper's declared success status.
pub trait ObservedStatus {
    fn observed_status(&self) -> Option<StatusCode> {
        None
    }
}

impl ObservedStatus for Response {
    fn observed_status(&self) -> Option<StatusCode> {
        Some(self.status())
    }
}

impl ObservedStatus for StatusCode {
    fn observed_status(&self) -> Option<StatusCode> {
        Some(*self)
    }
}

impl<T> ObservedStatus for (StatusCode, T) {
    fn observed_status(&self) -> Option<StatusCode> {
        Some(self.0)
    }
}

impl<T> ObservedStatus for Json<T> {}
impl ObservedStatus for () {}
impl ObservedStatus for String {}
impl ObservedStatus for &'static str {}
impl ObservedStatus for serde_json::Value {}

/// `error_type` recorded when a wrapped handler panics.
pub const PANIC_ERROR_TYPE: &str = "panic";

/// Short type name of `T`, without module path or generic arguments.
pub fn short_type_name<T: ?Sized>() -> &'static str {
    let full = std::any::type_name::<T>();
    let base = full.split('<').next().unwrap_or(full);
    base.rsplit("::").next().unwrap_or(base)
}

#[derive(Debug, Clone)]
pub struct MonitorRequest {
    client: Arc<MetricsClient>,
    endpoint: String,
    method: Method,
    success_status: StatusCode,
}

impl MonitorRequest {
    pub fn new(client: Arc<MetricsClient>, endpoint: impl Into<String>) -> Self {
        Self {
            client,
            endpoint: endpoint.into(),
            method: Method::GET,
            success_status: StatusCode::OK,
        }
    }

    pub fn method(mut self, method: Method) -> Self {
        self.method = method;
        self
    }

    /// Status recorded for results that do not carry one of their own.
    pub fn success_status(mut self, status: StatusCode) -> Self {
        self.success_status = status;
        self
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Await `handler` and record its outcome.
    ///
    /// A panic is recorded as an error and then resumed.
    pub async fn call<Fut, T, E>(&self, handler: Fut) -> Result<T, E>
    where
        Fut: Future<Output = Result<T, E>>,
        T: ObservedStatus,
        E: fmt::Display,
    {
        let start = Instant::now();
        match AssertUnwindSafe(handler).catch_unwind().await {
            Ok(result) => {
                self.observe(&result, start);
                result
            }
            Err(payload) => self.observe_panic(payload),
        }
    }

    /// Run a synchronous `handler` and record its outcome.
    pub fn call_sync<F, T, E>(&self, handler: F) -> Result<T, E>
    where
        F: FnOnce() -> Result<T, E>,
        T: ObservedStatus,
        E: fmt::Display,
    {
        let start = Instant::now();
        match panic::catch_unwind(AssertUnwindSafe(handler)) {
            Ok(result) => {
                self.observe(&result, start);
                result
            }
            Err(payload) => self.observe_panic(payload),
        }
    }

    /// Wrap a single-argument async handler, keeping its input and output types.
    pub fn wrap<A, F, Fut, T, E>(
        self,
        handler: F,
    ) -> impl Fn(A) -> BoxFuture<'static, Result<T, E>> + Clone + Send + Sync + 'static
    where
        A: Send + 'static,
        F: Fn(A) -> Fut + Clone + Send + Sync + 'static,
        Fut: Future<Output = Result<T, E>> + Send + 'static,
        T: ObservedStatus + Send + 'static,
        E: fmt::Display + Send + 'static,
    {
        move |input: A| {
            let monitor = self.clone();
            let fut = handler(input);
            Box::pin(async move { monitor.call(fut).await }) as BoxFuture<'static, Result<T, E>>
        }
    }

    fn observe_panic(&self, payload: Box<dyn Any + Send>) -> ! {
        let message = payload
            .downcast_ref::<&str>()
            .map(|s| s.to_string())
            .or_else(|| payload.downcast_ref::<String>().cloned())
            .unwrap_or_else(|| "handler panicked".to_string());
        self.client.record_error(PANIC_ERROR_TYPE, &message);
        panic::resume_unwind(payload)
    }

    fn observe<T, E>(&self, result: &Result<T, E>, start: Instant)
    where
        T: ObservedStatus,
        E: fmt::Display,
    {
        let duration_ms = start.elapsed().as_secs_f64() * 1000.0;
        match result {
            Ok(value) => {
                let status = value.observed_status().unwrap_or(self.success_status);
                self.client.record_request(
                    &self.endpoint,
                    self.method.as_str(),
                    status.as_u16(),
                    duration_ms,
                );
            }
            Err(err) => {
                self.client
                    .record_error(short_type_name::<E>(), &err.to_string());
            }
        }
    }
}
