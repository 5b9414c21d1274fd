//! AI-backed threat-news client: bulk fetch, search, and per-article
//! overviews, all total with respect to expected failures. The upstream
//! generation API is reached through an injected transport; every failure
//! mode degrades to the deterministic fallback content.

pub mod fallback;
pub mod parse;
pub mod queue;
pub mod quota;
pub mod transport;
pub mod types;

use std::sync::Arc;
use std::time::Duration;

use metrics::counter;
use tracing::{debug, warn};

use crate::clock::{Clock, SystemClock};
use crate::config::NewsConfig;
use crate::entropy::{Entropy, ThreadEntropy};
use crate::news::fallback::{fallback_articles, fallback_overview, search_fallback};
use crate::news::parse::{article_from_value, extract_json_array, sanitize_text};
use crate::news::queue::DispatchQueue;
use crate::news::quota::{ErrorWindow, QuotaGuard};
use crate::news::transport::{
    DisabledTransport, GeminiTransport, GenerationConfig, GenerationError, GenerationRequest,
    GenerationTransport, MockTransport,
};
use crate::news::types::{NewsArticle, RECOMMENDED_CATEGORIES};

/// Overviews shorter than this (after trimming) count as failed output.
const MIN_OVERVIEW_CHARS: usize = 10;

pub struct NewsService {
    transport: Arc<dyn GenerationTransport>,
    clock: Arc<dyn Clock>,
    entropy: Arc<dyn Entropy>,
    quota: QuotaGuard,
    errors: ErrorWindow,
    queue: Arc<DispatchQueue>,
    model: String,
    fallback_models: Vec<String>,
    breaker_window: Duration,
    breaker_threshold: usize,
}

impl NewsService {
    pub fn new(
        cfg: &NewsConfig,
        transport: Arc<dyn GenerationTransport>,
        clock: Arc<dyn Clock>,
        entropy: Arc<dyn Entropy>,
    ) -> Self {
        Self {
            quota: QuotaGuard::new(
                Arc::clone(&clock),
                Duration::from_secs(cfg.quota_cooldown_secs),
            ),
            errors: ErrorWindow::new(
                Arc::clone(&clock),
                Duration::from_secs(cfg.error_retention_secs),
            ),
            queue: DispatchQueue::new(
                Duration::from_secs(cfg.dispatch_interval_secs),
                Duration::from_secs(cfg.request_timeout_secs),
            ),
            model: cfg.model.clone(),
            fallback_models: cfg.fallback_models.clone(),
            breaker_window: Duration::from_secs(cfg.breaker_window_secs),
            breaker_threshold: cfg.breaker_threshold,
            transport,
            clock,
            entropy,
        }
    }

    /// True while the upstream quota cooldown is running. UI callers use
    /// this to disable refresh affordances without risking a doomed call.
    pub fn is_quota_exhausted(&self) -> bool {
        self.quota.is_exhausted()
    }

    /// Fetch the portal's news list. Always resolves to a non-empty set of
    /// well-formed articles; fallback content covers every failure mode.
    pub async fn fetch_bulk(&self) -> Vec<NewsArticle> {
        counter!("news_fetch_total").increment(1);
        if self.quota.is_exhausted() {
            counter!("news_fetch_fallback_total").increment(1);
            return fallback_articles(&*self.clock, &*self.entropy);
        }

        let token = self.entropy.session_token();
        match self.request_articles(bulk_prompt(&token)).await {
            Ok(items) => items,
            Err(e) => {
                debug!(error = %e, "bulk fetch degraded to fallback content");
                counter!("news_fetch_fallback_total").increment(1);
                fallback_articles(&*self.clock, &*self.entropy)
            }
        }
    }

    /// Keyword search. Falls back to substring filtering of the static set.
    pub async fn search(&self, query: &str, category: Option<&str>) -> Vec<NewsArticle> {
        counter!("news_search_total").increment(1);
        if self.quota.is_exhausted() {
            counter!("news_search_fallback_total").increment(1);
            return search_fallback(query, category, &*self.clock, &*self.entropy);
        }

        match self.request_articles(search_prompt(query, category)).await {
            Ok(items) => items,
            Err(e) => {
                debug!(error = %e, query, "search degraded to fallback filtering");
                counter!("news_search_fallback_total").increment(1);
                search_fallback(query, category, &*self.clock, &*self.entropy)
            }
        }
    }

    /// Generate a short overview for one article. Serialized through the
    /// dispatch queue; every failure resolves to the deterministic
    /// fallback text.
    pub async fn generate_overview(&self, article: &NewsArticle) -> String {
        counter!("overview_requests_total").increment(1);
        if self.quota.is_exhausted() {
            counter!("overview_fallback_total").increment(1);
            return fallback_overview(article);
        }
        if self.errors.count_within(self.breaker_window) >= self.breaker_threshold {
            counter!("overview_breaker_hits_total").increment(1);
            counter!("overview_fallback_total").increment(1);
            debug!("overview breaker open; skipping network call");
            return fallback_overview(article);
        }

        let transport = Arc::clone(&self.transport);
        let model = self.model.clone();
        let request = GenerationRequest {
            prompt: overview_prompt(article),
            config: GenerationConfig::overview(),
        };
        let result = self
            .queue
            .submit(move || Box::pin(async move { transport.generate(&model, &request).await }))
            .await;

        match result {
            Ok(text) => {
                let text = sanitize_text(&text, 1_200);
                if text.chars().count() <= MIN_OVERVIEW_CHARS {
                    self.errors.record();
                    counter!("overview_fallback_total").increment(1);
                    return fallback_overview(article);
                }
                text
            }
            Err(e) => {
                if e == GenerationError::RateLimited {
                    self.quota.trip();
                    counter!("quota_trips_total").increment(1);
                }
                self.errors.record();
                counter!("overview_fallback_total").increment(1);
                fallback_overview(article)
            }
        }
    }

    /// Shared request/parse pipeline for bulk fetch and search.
    async fn request_articles(&self, prompt: String) -> Result<Vec<NewsArticle>, GenerationError> {
        let request = GenerationRequest {
            prompt,
            config: GenerationConfig::bulk(),
        };
        let text = self.call_with_model_chain(&request).await?;

        let values = extract_json_array(&text).ok_or(GenerationError::Malformed)?;
        let now_ms = self.clock.now_millis();
        let items: Vec<NewsArticle> = values
            .iter()
            .enumerate()
            .filter_map(|(i, v)| article_from_value(v, now_ms, i, &*self.entropy))
            .collect();
        if items.is_empty() {
            return Err(GenerationError::Malformed);
        }
        Ok(items)
    }

    /// Primary model first; on a non-rate-limit failure walk the alternate
    /// list, first success wins. Any 429 along the way trips the quota.
    async fn call_with_model_chain(
        &self,
        request: &GenerationRequest,
    ) -> Result<String, GenerationError> {
        let mut outcome = self.transport.generate(&self.model, request).await;

        if matches!(
            outcome,
            Err(GenerationError::Status(_)) | Err(GenerationError::Network(_))
        ) {
            for alt in &self.fallback_models {
                counter!("model_fallback_total").increment(1);
                warn!(model = %alt, "retrying against alternate model");
                match self.transport.generate(alt, request).await {
                    Ok(text) => {
                        outcome = Ok(text);
                        break;
                    }
                    Err(GenerationError::RateLimited) => {
                        outcome = Err(GenerationError::RateLimited);
                        break;
                    }
                    Err(e) => outcome = Err(e),
                }
            }
        }

        if let Err(GenerationError::RateLimited) = &outcome {
            self.quota.trip();
            counter!("quota_trips_total").increment(1);
        }
        outcome
    }
}

/// Factory: build the service according to config and environment.
///
/// * `NEWS_TEST_MODE=mock` short-circuits to a deterministic mock
///   transport regardless of config.
/// * A disabled config gets a transport that fails every call, so the
///   portal serves fallback content only.
pub fn build_news_service(cfg: &NewsConfig) -> NewsService {
    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let entropy: Arc<dyn Entropy> = Arc::new(ThreadEntropy);

    let transport: Arc<dyn GenerationTransport> = if std::env::var("NEWS_TEST_MODE")
        .map(|v| v == "mock")
        .unwrap_or(false)
    {
        Arc::new(MockTransport::with_default_reply(
            r#"[{"title":"Mock Threat Briefing","summary":"Deterministic article served in mock mode.","category":"phishing","severity":"low"}]"#,
        ))
    } else if !cfg.enabled {
        Arc::new(DisabledTransport)
    } else {
        Arc::new(GeminiTransport::new(cfg.api_key.clone()))
    };

    NewsService::new(cfg, transport, clock, entropy)
}

fn bulk_prompt(session_token: &str) -> String {
    format!(
        "You are a cybersecurity news writer for a security-awareness training portal. \
         Generate exactly 10 realistic, fictional cybersecurity news articles as a JSON array. \
         Each element must be an object with fields: \"title\", \"summary\" (2-3 sentences), \
         \"body\" (two short paragraphs), \"category\" (one of: {categories}), \
         \"severity\" (one of: critical, high, medium, low), \"source\" (outlet name), \
         \"url\" (plausible https link), and \"views\" (integer). \
         Respond with the JSON array only, no markdown fences, no commentary. \
         Variation seed: {session_token}.",
        categories = RECOMMENDED_CATEGORIES.join(", "),
    )
}

fn search_prompt(query: &str, category: Option<&str>) -> String {
    let category_clause = match category {
        Some(c) => format!(" All articles must belong to the \"{c}\" category."),
        None => String::new(),
    };
    format!(
        "You are a cybersecurity news writer for a security-awareness training portal. \
         Generate up to 6 realistic, fictional cybersecurity news articles relevant to the \
         search query \"{query}\" as a JSON array.{category_clause} \
         Each element must be an object with fields: \"title\", \"summary\", \"body\", \
         \"category\" (one of: {categories}), \"severity\" (one of: critical, high, medium, low), \
         \"source\", \"url\", and \"views\". \
         Respond with the JSON array only, no markdown fences, no commentary.",
        categories = RECOMMENDED_CATEGORIES.join(", "),
    )
}

fn overview_prompt(article: &NewsArticle) -> String {
    format!(
        "Write a professional overview of the following cybersecurity news item for a \
         security-awareness audience. Use 2-3 sentences and at most 150 words. \
         Title: {title}. Summary: {summary}. Category: {category}. Severity: {severity}. \
         Respond with the overview text only.",
        title = article.title,
        summary = article.summary,
        category = article.category,
        severity = article.severity.as_str(),
    )
}
