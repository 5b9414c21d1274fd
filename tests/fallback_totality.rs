// tests/fallback_totality.rs
//
// Every expected failure mode — server errors, network faults, garbage
// payloads, empty arrays — must resolve to well-formed content. None of
// the three public operations is allowed to surface an error.

use std::sync::Arc;

use cyberaware_portal::clock::ManualClock;
use cyberaware_portal::config::NewsConfig;
use cyberaware_portal::entropy::FixedEntropy;
use cyberaware_portal::news::fallback::{FALLBACK_LIST_LEN, FALLBACK_SEARCH_MAX};
use cyberaware_portal::news::transport::{GenerationError, MockTransport};
use cyberaware_portal::news::NewsService;

fn service(transport: &Arc<MockTransport>) -> NewsService {
    NewsService::new(
        &NewsConfig::default(),
        transport.clone(),
        ManualClock::at_millis(1_700_000_000_000),
        Arc::new(FixedEntropy(2_500)),
    )
}

#[tokio::test]
async fn bulk_fetch_falls_back_after_primary_and_alternates_fail() {
    let transport = Arc::new(MockTransport::new());
    transport.push_err(GenerationError::Status(500));
    transport.push_err(GenerationError::Status(503));
    transport.push_err(GenerationError::Network("connection refused".into()));
    let svc = service(&transport);

    let items = svc.fetch_bulk().await;
    assert_eq!(items.len(), FALLBACK_LIST_LEN);
    assert!(items.iter().all(|a| !a.id.is_empty() && !a.title.is_empty()));
    // Primary + both default alternates were attempted before giving up.
    assert_eq!(transport.call_count(), 3);
    assert!(!svc.is_quota_exhausted(), "plain failures must not trip the quota");
}

#[tokio::test]
async fn bulk_fetch_falls_back_on_garbage_and_empty_payloads() {
    let transport = Arc::new(MockTransport::new());
    transport.push_ok("I cannot produce articles right now, sorry.");
    let svc = service(&transport);
    assert_eq!(svc.fetch_bulk().await.len(), FALLBACK_LIST_LEN);

    transport.push_ok("[]");
    assert_eq!(svc.fetch_bulk().await.len(), FALLBACK_LIST_LEN);

    // An array of records that all fail validation is just as unusable.
    transport.push_ok(r#"[{"severity":"high"},{"views":3}]"#);
    assert_eq!(svc.fetch_bulk().await.len(), FALLBACK_LIST_LEN);
}

#[tokio::test]
async fn bulk_fetch_uses_first_successful_alternate() {
    let transport = Arc::new(MockTransport::new());
    transport.push_err(GenerationError::Status(404));
    transport.push_ok(
        r#"[{"title":"Fresh Advisory","summary":"Patched this week.","category":"vulnerability","severity":"high"}]"#,
    );
    let svc = service(&transport);

    let items = svc.fetch_bulk().await;
    assert_eq!(items.len(), 1);
    assert_eq!(items[0].title, "Fresh Advisory");
    assert!(items[0].id.starts_with("news-"));
    assert_eq!(transport.call_count(), 2);

    let models: Vec<String> = transport.calls().into_iter().map(|c| c.model).collect();
    assert_eq!(models, vec!["gemini-2.0-flash", "gemini-1.5-flash"]);
}

#[tokio::test]
async fn search_falls_back_to_substring_filtering() {
    let transport = Arc::new(MockTransport::new());
    transport.push_err(GenerationError::Network("dns failure".into()));
    transport.push_err(GenerationError::Network("dns failure".into()));
    transport.push_err(GenerationError::Network("dns failure".into()));
    let svc = service(&transport);

    let hits = svc.search("phishing", None).await;
    assert!(!hits.is_empty());
    assert!(hits.len() <= FALLBACK_SEARCH_MAX);
    for hit in &hits {
        let text = format!("{} {} {}", hit.title, hit.summary, hit.category).to_ascii_lowercase();
        assert!(text.contains("phishing"));
    }
}

#[tokio::test(start_paused = true)]
async fn overview_falls_back_on_failure_and_degenerate_text() {
    let transport = Arc::new(MockTransport::new());
    let svc = service(&transport);
    let article = svc.fetch_bulk().await.remove(0); // fallback item (empty script)

    transport.push_err(GenerationError::Status(500));
    let text = svc.generate_overview(&article).await;
    assert!(text.len() > 10, "fallback overview is a real sentence");

    // Too-short output counts as a failed generation, not a success.
    transport.push_ok("ok");
    let text = svc.generate_overview(&article).await;
    assert!(text.len() > 10);
    assert!(!text.contains("ok"));
}
