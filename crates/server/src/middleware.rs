//! HTTP middleware stack
//!
//! Every request gets an `x-request-id` (generated unless the caller sent
//! one), an access-log span and request metrics.

use axum::{
    body::Body,
    extract::{MatchedPath, Request, State},
    http::HeaderName,
    middleware::{self, Next},
    response::Response,
    Router,
};
use observability::HttpMetrics;
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::trace::TraceLayer;
use tracing::Span;

/// Request id header
pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Route label for requests no route matched
const UNMATCHED_ROUTE: &str = "unmatched";

/// Wrap `router` with request ids, access logging and request metrics.
///
/// Apply after all routes are registered.
pub fn with_http_middleware(router: Router, metrics: HttpMetrics) -> Router {
    let request_id = HeaderName::from_static(REQUEST_ID_HEADER);

    router
        .layer(middleware::from_fn_with_state(metrics, record_request_metrics))
        .layer(PropagateRequestIdLayer::new(request_id.clone()))
        .layer(TraceLayer::new_for_http().make_span_with(make_request_span))
        .layer(SetRequestIdLayer::new(request_id, MakeRequestUuid))
}

fn make_request_span(request: &Request<Body>) -> Span {
    let request_id = request
        .headers()
        .get(REQUEST_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("-");

    tracing::info_span!(
        "http_request",
        method = %request.method(),
        uri = %request.uri(),
        request_id,
    )
}

async fn record_request_metrics(State(metrics): State<HttpMetrics>, request: Request, next: Next) -> Response {
    let route = request
        .extensions()
        .get::<MatchedPath>()
        .map(|path| path.as_str().to_string())
        .unwrap_or_else(|| UNMATCHED_ROUTE.to_string());

    let mut guard = metrics.start_request(request.method().as_str(), route);
    let response = next.run(request).await;
    guard.set_status(response.status().as_u16());
    response
}
