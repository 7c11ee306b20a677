//! Request counters and latency per route

use axum::{
    extract::{MatchedPath, Request},
    middleware::Next,
    response::Response,
};
use pactforge_common::metrics::RequestMetrics;

/// Records `requests_total` and `request_duration_seconds`, labelled with
/// the route template rather than the raw path
pub async fn track_requests(request: Request, next: Next) -> Response {
    let endpoint = request
        .extensions()
        .get::<MatchedPath>()
        .map(|path| path.as_str().to_owned())
        .unwrap_or_else(|| "unmatched".to_string());
    let metrics = RequestMetrics::start(request.method().as_str(), &endpoint);

    let response = next.run(request).await;
    metrics.finish(response.status().as_u16());
    response
}
