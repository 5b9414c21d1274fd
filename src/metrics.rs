//! Prometheus wiring: recorder installation, registration of every series
//! the news client emits, and the `/metrics` route.

use axum::{routing::get, Router};
use metrics::{describe_counter, describe_gauge, gauge};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};

/// Install the recorder and describe the portal's series so they show up
/// on `/metrics` with help text even before the first increment. Call once
/// at startup, before any counter fires.
pub fn install(dispatch_interval_ms: u64) -> PrometheusHandle {
    let handle = PrometheusBuilder::new()
        .install_recorder()
        .expect("prometheus: install recorder");

    describe_counter!("news_fetch_total", "Bulk article fetches requested.");
    describe_counter!(
        "news_fetch_fallback_total",
        "Bulk fetches answered from the static fallback set."
    );
    describe_counter!("news_search_total", "Search requests received.");
    describe_counter!(
        "news_search_fallback_total",
        "Searches answered by client-side fallback filtering."
    );
    describe_counter!("overview_requests_total", "Overview generations requested.");
    describe_counter!(
        "overview_fallback_total",
        "Overviews answered with the deterministic fallback text."
    );
    describe_counter!(
        "overview_breaker_hits_total",
        "Overview requests short-circuited by the error-window breaker."
    );
    describe_counter!("quota_trips_total", "Rate-limit responses that tripped the quota.");
    describe_counter!(
        "model_fallback_total",
        "Requests retried against an alternate model identifier."
    );
    describe_gauge!("overview_queue_depth", "Overview units waiting for dispatch.");
    describe_gauge!(
        "overview_dispatch_interval_ms",
        "Configured minimum spacing between overview dispatches."
    );

    // The interval never changes at runtime; publish it once.
    gauge!("overview_dispatch_interval_ms").set(dispatch_interval_ms as f64);

    handle
}

/// Router exposing `/metrics` in the Prometheus exposition format.
pub fn exposition_router(handle: PrometheusHandle) -> Router {
    Router::new().route("/metrics", get(move || std::future::ready(handle.render())))
}
