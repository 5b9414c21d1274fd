// tests/api_http.rs
//
// HTTP-level tests for the public API Router without opening sockets.
// We exercise the router directly via tower::ServiceExt::oneshot.
//
// Covered:
// - GET /health
// - GET /news           (fallback content + X-Quota-Exhausted header)
// - GET /news/search
// - POST /news/overview
// - GET /news/quota
// - GET /stats

use std::sync::Arc;

use serde_json::Value as Json;
use shuttle_axum::axum::{
    body::{self, Body},
    http::{Request, StatusCode},
    Router,
};
use tower::ServiceExt as _; // for `oneshot`

use cyberaware_portal::api::{create_router, AppState};
use cyberaware_portal::clock::ManualClock;
use cyberaware_portal::config::NewsConfig;
use cyberaware_portal::entropy::FixedEntropy;
use cyberaware_portal::news::fallback::FALLBACK_LIST_LEN;
use cyberaware_portal::news::transport::DisabledTransport;
use cyberaware_portal::news::NewsService;
use cyberaware_portal::stats::ThreatStatsSimulator;

const BODY_LIMIT: usize = 1024 * 1024; // 1MB, safe for tests

/// Build the same Router the binary uses, with the network switched off so
/// every response comes from fallback content.
fn test_router() -> Router {
    let clock = ManualClock::at_millis(1_700_000_000_000);
    let news = NewsService::new(
        &NewsConfig::default(),
        Arc::new(DisabledTransport),
        clock.clone(),
        Arc::new(FixedEntropy(4_000)),
    );
    let state = AppState {
        news: Arc::new(news),
        stats: Arc::new(ThreatStatsSimulator::new(clock)),
    };
    create_router(state)
}

async fn get_json(app: Router, uri: &str) -> (StatusCode, Json) {
    let req = Request::builder()
        .method("GET")
        .uri(uri)
        .body(Body::empty())
        .expect("build request");
    let resp = app.oneshot(req).await.expect("oneshot");
    let status = resp.status();
    let bytes = body::to_bytes(resp.into_body(), BODY_LIMIT)
        .await
        .expect("read body")
        .to_vec();
    (status, serde_json::from_slice(&bytes).expect("parse json"))
}

#[tokio::test]
async fn api_health_returns_200_and_ok_body() {
    let app = test_router();

    let req = Request::builder()
        .method("GET")
        .uri("/health")
        .body(Body::empty())
        .expect("build GET /health");

    let resp = app.oneshot(req).await.expect("oneshot /health");
    assert_eq!(resp.status(), StatusCode::OK, "health should be 200");

    let bytes = body::to_bytes(resp.into_body(), BODY_LIMIT)
        .await
        .expect("read body")
        .to_vec();
    let body = String::from_utf8(bytes).expect("utf8");
    assert_eq!(body.trim(), "OK", "health body should be 'OK'");
}

#[tokio::test]
async fn api_news_serves_fallback_and_quota_header() {
    let app = test_router();

    let req = Request::builder()
        .method("GET")
        .uri("/news")
        .body(Body::empty())
        .expect("build GET /news");

    let resp = app.oneshot(req).await.expect("oneshot /news");
    assert!(resp.status().is_success());

    // Header: "1" while exhausted, "0" otherwise. Nothing tripped here.
    let exhausted = resp
        .headers()
        .get("X-Quota-Exhausted")
        .and_then(|h| h.to_str().ok())
        .unwrap_or("");
    assert_eq!(exhausted, "0");

    let bytes = body::to_bytes(resp.into_body(), BODY_LIMIT)
        .await
        .expect("read json")
        .to_vec();
    let v: Json = serde_json::from_slice(&bytes).expect("parse news json");
    let items = v.as_array().expect("news response must be an array");
    assert_eq!(items.len(), FALLBACK_LIST_LEN);

    // Contract checks for UI consumers
    let first = &items[0];
    for field in ["id", "title", "summary", "body", "category", "severity", "source", "url", "image_url", "published_at", "views"] {
        assert!(first.get(field).is_some(), "missing '{field}'");
    }
}

#[tokio::test]
async fn api_search_filters_fallback_content() {
    let app = test_router();
    let (status, v) = get_json(app, "/news/search?q=ransomware").await;
    assert_eq!(status, StatusCode::OK);
    let items = v.as_array().expect("search response must be an array");
    assert!(!items.is_empty());
    for item in items {
        let haystack = format!(
            "{} {} {}",
            item["title"].as_str().unwrap_or(""),
            item["summary"].as_str().unwrap_or(""),
            item["category"].as_str().unwrap_or("")
        )
        .to_ascii_lowercase();
        assert!(haystack.contains("ransomware"));
    }
}

#[tokio::test]
async fn api_overview_always_returns_text() {
    let app = test_router();

    // Grab an article from /news first, then ask for its overview.
    let (_, v) = get_json(app.clone(), "/news").await;
    let article = v.as_array().unwrap()[0].clone();

    let req = Request::builder()
        .method("POST")
        .uri("/news/overview")
        .header("content-type", "application/json")
        .body(Body::from(article.to_string()))
        .expect("build POST /news/overview");

    let resp = app.oneshot(req).await.expect("oneshot /news/overview");
    assert!(resp.status().is_success());

    let bytes = body::to_bytes(resp.into_body(), BODY_LIMIT)
        .await
        .expect("read json")
        .to_vec();
    let v: Json = serde_json::from_slice(&bytes).expect("parse overview json");
    let text = v["overview"].as_str().expect("overview must be a string");
    assert!(text.len() > 10, "overview should be a real sentence");
}

#[tokio::test]
async fn api_quota_reports_not_exhausted_by_default() {
    let app = test_router();
    let (status, v) = get_json(app, "/news/quota").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(v["exhausted"], Json::Bool(false));
}

#[tokio::test]
async fn api_stats_exposes_dashboard_fields() {
    let app = test_router();
    let (status, v) = get_json(app, "/stats").await;
    assert_eq!(status, StatusCode::OK);
    for field in [
        "threat_level",
        "attacks_blocked_today",
        "phishing_attempts_today",
        "malware_samples_today",
        "breaches_disclosed_this_month",
        "hourly_attack_trend",
        "updated_at",
    ] {
        assert!(v.get(field).is_some(), "missing '{field}'");
    }
    assert_eq!(v["hourly_attack_trend"].as_array().unwrap().len(), 24);
}
