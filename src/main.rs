//! CyberAware Portal — Binary Entrypoint
//! Boots the Axum HTTP server, wiring routes, shared state, and middleware.
//!
//! See `README.md` for quickstart and `DESIGN.md` for architecture notes.

use std::sync::Arc;

use shuttle_axum::ShuttleAxum;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use cyberaware_portal::api::{create_router, AppState};
use cyberaware_portal::bootstrap::NewsRuntime;
use cyberaware_portal::clock::SystemClock;
use cyberaware_portal::metrics::{exposition_router, install};
use cyberaware_portal::stats::ThreatStatsSimulator;

/// Enable compact tracing logs in development only.
/// Activation requires BOTH:
///   - dev environment (debug build OR SHUTTLE_ENV in {local, development, dev})
///   - NEWS_DEV_LOG=1
fn enable_dev_tracing() {
    let dev_flag = std::env::var("NEWS_DEV_LOG").ok().is_some_and(|v| v == "1");

    let is_dev_env = cfg!(debug_assertions)
        || matches!(
            std::env::var("SHUTTLE_ENV")
                .unwrap_or_default()
                .to_ascii_lowercase()
                .as_str(),
            "local" | "development" | "dev"
        );

    if !(dev_flag && is_dev_env) {
        return;
    }

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("cyberaware_portal=info,warn"));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().compact())
        .init();
}

#[shuttle_runtime::main]
async fn axum() -> ShuttleAxum {
    // Load .env in local/dev; no-op in prod environments.
    // This enables NEWS_CONFIG_PATH / GEMINI_API_KEY from .env
    // so the config loader can pick them up.
    let _ = dotenvy::dotenv();

    // Initialize dev tracing early (no-op in production).
    enable_dev_tracing();

    let runtime = NewsRuntime::from_env();

    // Install the Prometheus recorder before the first counter fires.
    let metrics_handle = install(runtime.cfg.dispatch_interval_secs * 1_000);

    // Startup smoke test; logs the outcome, no-op when disabled.
    runtime.quick_probe().await;

    let state = AppState {
        news: Arc::clone(&runtime.service),
        stats: Arc::new(ThreatStatsSimulator::new(Arc::new(SystemClock))),
    };

    let router = create_router(state).merge(exposition_router(metrics_handle));

    Ok(router.into())
}
