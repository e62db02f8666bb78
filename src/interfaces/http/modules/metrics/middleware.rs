//! HTTP request metrics middleware

use std::time::Instant;

use axum::{body::Body, extract::MatchedPath, http::Request, middleware::Next, response::Response};

const METRICS_PATH: &str = "/metrics";

/// Records per request:
///
/// - `http_requests_total`: counter labelled `method`, `route`, `status`
/// - `http_request_duration_seconds`: histogram labelled `method`, `route`
/// - `http_requests_in_flight`: gauge
///
/// `route` is the matched template (`/api/v1/properties/{id}`), so ids do
/// not create new series. Unmatched requests are labelled `unmatched`.
/// Prometheus scrapes of `/metrics` are not recorded.
pub async fn http_metrics_middleware(request: Request<Body>, next: Next) -> Response {
    let route = match request.extensions().get::<MatchedPath>() {
        Some(matched) if matched.as_str() == METRICS_PATH => return next.run(request).await,
        Some(matched) => matched.as_str().to_owned(),
        None => "unmatched".to_owned(),
    };
    let method = request.method().as_str().to_owned();

    let in_flight = metrics::gauge!("http_requests_in_flight");
    in_flight.increment(1.0);
    let started = Instant::now();
    let response = next.run(request).await;
    let elapsed = started.elapsed().as_secs_f64();
    in_flight.decrement(1.0);

    let status = response.status().as_u16().to_string();
    metrics::histogram!("http_request_duration_seconds", "method" => method.clone(), "route" => route.clone())
        .record(elapsed);
    metrics::counter!("http_requests_total", "method" => method, "route" => route, "status" => status)
        .increment(1);

    response
}
