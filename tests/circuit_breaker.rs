// tests/circuit_breaker.rs
//
// Three failures inside the trailing five-minute window force fallback
// overviews with no network attempt, independently of the quota flag. The
// window is measured on the injected manual clock.

use std::sync::Arc;

use cyberaware_portal::clock::ManualClock;
use cyberaware_portal::config::NewsConfig;
use cyberaware_portal::entropy::FixedEntropy;
use cyberaware_portal::news::fallback::fallback_articles;
use cyberaware_portal::news::transport::{GenerationError, MockTransport};
use cyberaware_portal::news::types::NewsArticle;
use cyberaware_portal::news::NewsService;

const GOOD_REPLY: &str = "Fresh overview: rotate credentials and enable MFA everywhere.";

fn setup() -> (Arc<MockTransport>, Arc<ManualClock>, NewsService, NewsArticle) {
    let transport = Arc::new(MockTransport::new());
    let clock = ManualClock::at_millis(1_700_000_000_000);
    let entropy = FixedEntropy(2_000);
    let article = fallback_articles(&*clock, &entropy).remove(0);
    let svc = NewsService::new(
        &NewsConfig::default(),
        transport.clone(),
        clock.clone(),
        Arc::new(entropy),
    );
    (transport, clock, svc, article)
}

#[tokio::test(start_paused = true)]
async fn three_recent_errors_open_the_breaker() {
    let (transport, _clock, svc, article) = setup();

    for _ in 0..3 {
        transport.push_err(GenerationError::Status(500));
        svc.generate_overview(&article).await;
    }
    assert_eq!(transport.call_count(), 3);
    assert!(!svc.is_quota_exhausted(), "breaker is independent of the quota flag");

    // Breaker open: the next overview never reaches the transport, even
    // though a successful reply is waiting.
    transport.push_ok(GOOD_REPLY);
    let text = svc.generate_overview(&article).await;
    assert_eq!(transport.call_count(), 3, "no network call while the breaker is open");
    assert_ne!(text, GOOD_REPLY);
    assert!(text.len() > 10);
}

#[tokio::test(start_paused = true)]
async fn breaker_closes_once_errors_age_out() {
    let (transport, clock, svc, article) = setup();

    for _ in 0..3 {
        transport.push_err(GenerationError::Status(500));
        svc.generate_overview(&article).await;
    }
    assert_eq!(transport.call_count(), 3);

    // Six manual-clock minutes later the window is empty again.
    clock.advance_secs(6 * 60);
    transport.push_ok(GOOD_REPLY);
    let text = svc.generate_overview(&article).await;
    assert_eq!(transport.call_count(), 4);
    assert_eq!(text, GOOD_REPLY);
}

#[tokio::test(start_paused = true)]
async fn degenerate_output_counts_toward_the_breaker() {
    let (transport, _clock, svc, article) = setup();

    // Two transport failures plus one too-short reply = three errors.
    transport.push_err(GenerationError::Status(500));
    svc.generate_overview(&article).await;
    transport.push_err(GenerationError::Network("reset".into()));
    svc.generate_overview(&article).await;
    transport.push_ok("meh");
    svc.generate_overview(&article).await;
    assert_eq!(transport.call_count(), 3);

    transport.push_ok(GOOD_REPLY);
    let text = svc.generate_overview(&article).await;
    assert_eq!(transport.call_count(), 3, "degenerate text opened the breaker too");
    assert_ne!(text, GOOD_REPLY);
}
