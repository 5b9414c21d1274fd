// src/bootstrap.rs
use std::sync::Arc;

use tracing::{info, warn};

use crate::clock::SystemClock;
use crate::config::NewsConfig;
use crate::entropy::ThreadEntropy;
use crate::news::{build_news_service, fallback::fallback_articles, NewsService};

pub struct NewsRuntime {
    pub cfg: NewsConfig,
    pub service: Arc<NewsService>,
}

impl NewsRuntime {
    pub fn from_path(path: &str) -> anyhow::Result<Self> {
        let cfg = NewsConfig::load_from_file(path)?;
        Ok(Self::from_config(cfg))
    }

    /// Resolve config from `NEWS_CONFIG_PATH`/defaults; never fails, a
    /// missing or broken config file yields a disabled (fallback-only)
    /// runtime.
    pub fn from_env() -> Self {
        Self::from_config(NewsConfig::load_or_default())
    }

    fn from_config(cfg: NewsConfig) -> Self {
        // Safe diagnostics: never the key itself, only its length.
        info!(
            "news cfg loaded: model={}, enabled={}, key_len={}",
            cfg.model,
            cfg.enabled,
            cfg.api_key.len()
        );
        let service = Arc::new(build_news_service(&cfg));
        Self { cfg, service }
    }

    /// One best-effort overview call against a fallback article, logged
    /// and never panicking. Useful as a startup smoke test.
    pub async fn quick_probe(&self) {
        if !self.cfg.enabled {
            warn!("news quick_probe skipped: generation is disabled in config");
            return;
        }
        let sample = fallback_articles(&SystemClock, &ThreadEntropy)
            .into_iter()
            .next()
            .expect("fallback table is never empty");
        let out = self.service.generate_overview(&sample).await;
        info!(chars = out.len(), "news quick_probe finished");
    }
}
