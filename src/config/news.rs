// src/config/news.rs
use serde::{Deserialize, Serialize};
use std::{env, fs, path::Path};

use tracing::info;

pub const DEFAULT_NEWS_CONFIG_PATH: &str = "config/news.toml";
pub const ENV_NEWS_CONFIG_PATH: &str = "NEWS_CONFIG_PATH";
pub const ENV_API_KEY: &str = "GEMINI_API_KEY";

fn default_api_key() -> String {
    "ENV".to_string()
}
fn default_model() -> String {
    "gemini-2.0-flash".to_string()
}
fn default_fallback_models() -> Vec<String> {
    vec!["gemini-1.5-flash".to_string(), "gemini-1.5-flash-8b".to_string()]
}
fn default_dispatch_interval_secs() -> u64 {
    10
}
fn default_quota_cooldown_secs() -> u64 {
    3_600
}
fn default_error_retention_secs() -> u64 {
    600
}
fn default_breaker_window_secs() -> u64 {
    300
}
fn default_breaker_threshold() -> usize {
    3
}
fn default_request_timeout_secs() -> u64 {
    30
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewsConfig {
    /// When false, the service never touches the network and serves the
    /// static fallback set.
    #[serde(default)]
    pub enabled: bool,
    /// "ENV" means: read from GEMINI_API_KEY.
    #[serde(default = "default_api_key")]
    pub api_key: String,
    #[serde(default = "default_model")]
    pub model: String,
    /// Tried in order when the primary model fails with a non-rate-limit
    /// error.
    #[serde(default = "default_fallback_models")]
    pub fallback_models: Vec<String>,
    /// Minimum spacing between queued overview dispatches.
    #[serde(default = "default_dispatch_interval_secs")]
    pub dispatch_interval_secs: u64,
    /// How long the quota stays marked exhausted after a 429.
    #[serde(default = "default_quota_cooldown_secs")]
    pub quota_cooldown_secs: u64,
    /// Retention of the upstream-failure log.
    #[serde(default = "default_error_retention_secs")]
    pub error_retention_secs: u64,
    /// Trailing window the circuit breaker inspects.
    #[serde(default = "default_breaker_window_secs")]
    pub breaker_window_secs: u64,
    /// Failures within the breaker window that force fallback overviews.
    #[serde(default = "default_breaker_threshold")]
    pub breaker_threshold: usize,
    /// Hard cap on each dispatched network unit.
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

impl Default for NewsConfig {
    fn default() -> Self {
        toml::from_str("").expect("defaults deserialize")
    }
}

impl NewsConfig {
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let data = fs::read_to_string(path)?;
        let mut cfg: NewsConfig = toml::from_str(&data)?;

        // Resolve api key if "ENV"
        if cfg.enabled && cfg.api_key.trim().eq_ignore_ascii_case("env") {
            cfg.api_key = env::var(ENV_API_KEY)
                .map_err(|_| anyhow::anyhow!("Missing {ENV_API_KEY} env var"))?;
        }

        // Sanitize tunables that would wedge the client if zeroed out.
        if cfg.request_timeout_secs == 0 {
            cfg.request_timeout_secs = default_request_timeout_secs();
        }
        if cfg.breaker_threshold == 0 {
            cfg.breaker_threshold = default_breaker_threshold();
        }
        if cfg.breaker_window_secs > cfg.error_retention_secs {
            cfg.error_retention_secs = cfg.breaker_window_secs;
        }

        Ok(cfg)
    }

    /// Load from `NEWS_CONFIG_PATH` (or the default path); any failure
    /// falls back to the disabled defaults so the portal still serves
    /// static content.
    pub fn load_or_default() -> Self {
        let path = env::var(ENV_NEWS_CONFIG_PATH)
            .unwrap_or_else(|_| DEFAULT_NEWS_CONFIG_PATH.to_string());
        match Self::load_from_file(&path) {
            Ok(cfg) => cfg,
            Err(e) => {
                info!(%path, error = %e, "news config not loaded; using disabled defaults");
                Self::default()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_keep_the_client_disabled() {
        let cfg = NewsConfig::default();
        assert!(!cfg.enabled);
        assert_eq!(cfg.api_key, "ENV");
        assert_eq!(cfg.dispatch_interval_secs, 10);
        assert_eq!(cfg.quota_cooldown_secs, 3_600);
        assert_eq!(cfg.breaker_threshold, 3);
        assert_eq!(cfg.fallback_models.len(), 2);
    }

    #[test]
    fn partial_toml_fills_missing_fields() {
        let cfg: NewsConfig = toml::from_str("enabled = false\nmodel = \"gemini-exp\"").unwrap();
        assert_eq!(cfg.model, "gemini-exp");
        assert_eq!(cfg.breaker_window_secs, 300);
    }
}
