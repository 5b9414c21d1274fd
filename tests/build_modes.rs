// tests/build_modes.rs
// Run single-threaded because we mutate process env:
//   cargo test -- --test-threads=1
// (serial_test also guards these against each other.)

use std::env;

use serial_test::serial;

use cyberaware_portal::config::NewsConfig;
use cyberaware_portal::news::build_news_service;
use cyberaware_portal::news::fallback::FALLBACK_LIST_LEN;

/// Small RAII helper to snapshot & restore env vars in each test.
struct EnvSnapshot {
    saved: Vec<(String, Option<String>)>,
}
impl EnvSnapshot {
    /// Provide a list of (KEY, Some(VALUE)) to set, or (KEY, None) to remove.
    fn set(pairs: &[(&str, Option<&str>)]) -> Self {
        let mut saved = Vec::with_capacity(pairs.len());
        for (k, v) in pairs {
            let key = k.to_string();
            let prev = env::var(k).ok();
            saved.push((key.clone(), prev));
            match v {
                Some(val) => env::set_var(&key, val),
                None => env::remove_var(&key),
            }
        }
        Self { saved }
    }
}
impl Drop for EnvSnapshot {
    fn drop(&mut self) {
        for (k, maybe_v) in self.saved.drain(..) {
            match maybe_v {
                Some(v) => env::set_var(&k, v),
                None => env::remove_var(&k),
            }
        }
    }
}

/// NEWS_TEST_MODE=mock must win over a disabled config: the factory wires
/// a deterministic mock transport and real articles come back.
#[tokio::test]
#[serial]
async fn mock_mode_overrides_disabled_config() {
    let _env = EnvSnapshot::set(&[("NEWS_TEST_MODE", Some("mock"))]);

    let svc = build_news_service(&NewsConfig::default());
    let items = svc.fetch_bulk().await;
    assert_eq!(items.len(), 1);
    assert_eq!(items[0].title, "Mock Threat Briefing");
    assert_eq!(items[0].category, "phishing");
}

/// Without mock mode a disabled config never reaches the network and the
/// portal serves the full fallback set.
#[tokio::test]
#[serial]
async fn disabled_config_serves_fallback_only() {
    let _env = EnvSnapshot::set(&[("NEWS_TEST_MODE", None)]);

    let svc = build_news_service(&NewsConfig::default());
    let items = svc.fetch_bulk().await;
    assert_eq!(items.len(), FALLBACK_LIST_LEN);
    assert!(items.iter().all(|a| a.id.starts_with("fallback-")));
}
