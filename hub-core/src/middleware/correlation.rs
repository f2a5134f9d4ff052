use axum::http::HeaderValue;
use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};

use crate::observability::logging::{Fields, StructuredLogger};
use crate::observability::trace_context::{CLOUD_TRACE_CONTEXT_HEADER, CORRELATION_ID_HEADER};
use crate::observability::RequestContext;

/// Attach a correlation context to every request.
///
/// Reuses `X-Correlation-ID` when the caller sent one and mints a fresh id
/// otherwise, parses `X-Cloud-Trace-Context`, logs the inbound request and runs
/// the rest of the stack inside the context scope. The correlation id is
/// echoed on every response, error responses included.
///
/// ```ignore
/// Router::new()
///     .route("/", get(root))
///     .layer(from_fn_with_state(logger, correlation_middleware))
/// ```
pub async fn correlation_middleware(
    State(logger): State<StructuredLogger>,
    mut req: Request,
    next: Next,
) -> Response {
    let ctx = RequestContext::from_headers(req.headers());
    req.extensions_mut().insert(ctx.clone());

    let trace_header = ctx
        .trace()
        .and_then(|_| req.headers().get(CLOUD_TRACE_CONTEXT_HEADER).cloned());
    let method = req.method().to_string();
    let path = req.uri().path().to_string();

    let mut response = ctx
        .clone()
        .scope(async move {
            logger.info(
                format!("Incoming request: {} {}", method, path),
                Fields::new().with("method", &method).with("path", &path),
            );
            next.run(req).await
        })
        .await;

    if let Ok(header_value) = HeaderValue::from_bytes(ctx.correlation_id().as_bytes()) {
        response
            .headers_mut()
            .insert(CORRELATION_ID_HEADER, header_value);
    }
    if let Some(trace_header) = trace_header {
        response
            .headers_mut()
            .insert(CLOUD_TRACE_CONTEXT_HEADER, trace_header);
    }

    response
}
