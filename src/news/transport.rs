//! Transport layer for the generative text API.
//!
//! The client only ever talks to the upstream endpoint through
//! `GenerationTransport`, so tests and mock mode swap the network out
//! wholesale. The production implementation targets the Generative
//! Language `generateContent` shape: prompt under `contents[0].parts[0]`,
//! tuning under `generationConfig`, reply text under
//! `candidates[0].content.parts[0].text`, API key as a query parameter.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Failure taxonomy for one upstream call. Rate limiting is kept distinct
/// from generic failure so the caller can trip the quota state.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GenerationError {
    #[error("upstream rate limited")]
    RateLimited,
    #[error("upstream returned status {0}")]
    Status(u16),
    #[error("request failed: {0}")]
    Network(String),
    #[error("generation client disabled")]
    Disabled,
    #[error("no candidate text in response")]
    EmptyCandidate,
    #[error("unparsable model payload")]
    Malformed,
    #[error("generated text unusable")]
    Degenerate,
    #[error("request timed out")]
    TimedOut,
}

/// Tuning parameters forwarded to the model.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct GenerationConfig {
    pub temperature: f32,
    #[serde(rename = "topK")]
    pub top_k: u32,
    #[serde(rename = "topP")]
    pub top_p: f32,
    #[serde(rename = "maxOutputTokens")]
    pub max_output_tokens: u32,
}

impl GenerationConfig {
    /// Variety-favoring settings for bulk article generation, with the
    /// output size still bounded.
    pub fn bulk() -> Self {
        Self {
            temperature: 0.9,
            top_k: 40,
            top_p: 0.95,
            max_output_tokens: 4_096,
        }
    }

    /// Conservative settings for short single-item overviews.
    pub fn overview() -> Self {
        Self {
            temperature: 0.3,
            top_k: 20,
            top_p: 0.8,
            max_output_tokens: 220,
        }
    }
}

/// One prompt plus its tuning, independent of the target model.
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationRequest {
    pub prompt: String,
    pub config: GenerationConfig,
}

#[async_trait]
pub trait GenerationTransport: Send + Sync {
    /// Issue one generation call and return the raw candidate text.
    async fn generate(
        &self,
        model: &str,
        request: &GenerationRequest,
    ) -> Result<String, GenerationError>;

    /// Transport name for diagnostics.
    fn name(&self) -> &'static str;
}

// ------------------------------------------------------------
// Production transport (reqwest)
// ------------------------------------------------------------

pub struct GeminiTransport {
    http: reqwest::Client,
    api_key: String,
    base_url: String,
}

impl GeminiTransport {
    pub fn new(api_key: String) -> Self {
        let http = reqwest::Client::builder()
            .user_agent("cyberaware-portal/0.1 (+github.com/cyberaware/cyberaware-portal)")
            .connect_timeout(Duration::from_secs(4))
            .timeout(Duration::from_secs(30))
            .build()
            .expect("reqwest client");
        Self {
            http,
            api_key,
            base_url: DEFAULT_BASE_URL.to_string(),
        }
    }

    pub fn with_base_url(mut self, url: &str) -> Self {
        self.base_url = url.trim_end_matches('/').to_string();
        self
    }
}

#[async_trait]
impl GenerationTransport for GeminiTransport {
    async fn generate(
        &self,
        model: &str,
        request: &GenerationRequest,
    ) -> Result<String, GenerationError> {
        #[derive(Serialize)]
        struct Part<'a> {
            text: &'a str,
        }
        #[derive(Serialize)]
        struct Content<'a> {
            parts: Vec<Part<'a>>,
        }
        #[derive(Serialize)]
        struct Req<'a> {
            contents: Vec<Content<'a>>,
            #[serde(rename = "generationConfig")]
            generation_config: GenerationConfig,
        }
        #[derive(Deserialize)]
        struct Resp {
            #[serde(default)]
            candidates: Vec<Candidate>,
        }
        #[derive(Deserialize)]
        struct Candidate {
            content: Option<CandidateContent>,
        }
        #[derive(Deserialize)]
        struct CandidateContent {
            #[serde(default)]
            parts: Vec<CandidatePart>,
        }
        #[derive(Deserialize)]
        struct CandidatePart {
            #[serde(default)]
            text: String,
        }

        if self.api_key.is_empty() {
            return Err(GenerationError::Disabled);
        }

        let url = format!(
            "{}/models/{}:generateContent?key={}",
            self.base_url, model, self.api_key
        );
        let body = Req {
            contents: vec![Content {
                parts: vec![Part {
                    text: &request.prompt,
                }],
            }],
            generation_config: request.config,
        };

        debug!(model, "generation request");

        let resp = self
            .http
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(|e| GenerationError::Network(e.to_string()))?;

        let status = resp.status();
        if status.as_u16() == 429 {
            return Err(GenerationError::RateLimited);
        }
        if !status.is_success() {
            return Err(GenerationError::Status(status.as_u16()));
        }

        let parsed: Resp = resp
            .json()
            .await
            .map_err(|e| GenerationError::Network(e.to_string()))?;
        let text = parsed
            .candidates
            .first()
            .and_then(|c| c.content.as_ref())
            .and_then(|c| c.parts.first())
            .map(|p| p.text.clone())
            .unwrap_or_default();
        if text.trim().is_empty() {
            return Err(GenerationError::EmptyCandidate);
        }
        Ok(text)
    }

    fn name(&self) -> &'static str {
        "gemini"
    }
}

// ------------------------------------------------------------
// Disabled transport
// ------------------------------------------------------------

/// Fails every call; used when the feature is switched off so the service
/// serves fallback content only.
pub struct DisabledTransport;

#[async_trait]
impl GenerationTransport for DisabledTransport {
    async fn generate(
        &self,
        _model: &str,
        _request: &GenerationRequest,
    ) -> Result<String, GenerationError> {
        Err(GenerationError::Disabled)
    }

    fn name(&self) -> &'static str {
        "disabled"
    }
}

// ------------------------------------------------------------
// Scripted transport (mock mode + tests)
// ------------------------------------------------------------

/// Record of one call the mock received.
#[derive(Debug, Clone)]
pub struct MockCall {
    pub model: String,
    pub prompt: String,
}

/// Scripted transport backing `NEWS_TEST_MODE=mock` and the test suite.
/// Replies are consumed front-to-back; once the script is empty the
/// default reply (or `EmptyCandidate`) is served.
#[derive(Default)]
pub struct MockTransport {
    script: Mutex<VecDeque<Result<String, GenerationError>>>,
    calls: Mutex<Vec<MockCall>>,
    dispatch_times: Mutex<Vec<tokio::time::Instant>>,
    default_reply: Option<String>,
    call_delay: Option<Duration>,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mock-mode transport: always replies with a fixed text.
    pub fn with_default_reply(reply: impl Into<String>) -> Self {
        Self {
            default_reply: Some(reply.into()),
            ..Self::default()
        }
    }

    /// Hold each call open for `delay` (virtual time friendly) so tests
    /// can observe overlap.
    pub fn with_call_delay(mut self, delay: Duration) -> Self {
        self.call_delay = Some(delay);
        self
    }

    pub fn push_ok(&self, text: impl Into<String>) {
        self.script
            .lock()
            .expect("mock script mutex poisoned")
            .push_back(Ok(text.into()));
    }

    pub fn push_err(&self, err: GenerationError) {
        self.script
            .lock()
            .expect("mock script mutex poisoned")
            .push_back(Err(err));
    }

    pub fn calls(&self) -> Vec<MockCall> {
        self.calls.lock().expect("mock calls mutex poisoned").clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().expect("mock calls mutex poisoned").len()
    }

    /// Instants (tokio clock) at which calls were dispatched.
    pub fn dispatch_times(&self) -> Vec<tokio::time::Instant> {
        self.dispatch_times
            .lock()
            .expect("mock times mutex poisoned")
            .clone()
    }

    /// Highest number of calls ever simultaneously in flight.
    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl GenerationTransport for MockTransport {
    async fn generate(
        &self,
        model: &str,
        request: &GenerationRequest,
    ) -> Result<String, GenerationError> {
        let current = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(current, Ordering::SeqCst);
        self.dispatch_times
            .lock()
            .expect("mock times mutex poisoned")
            .push(tokio::time::Instant::now());
        self.calls
            .lock()
            .expect("mock calls mutex poisoned")
            .push(MockCall {
                model: model.to_string(),
                prompt: request.prompt.clone(),
            });

        if let Some(delay) = self.call_delay {
            tokio::time::sleep(delay).await;
        }

        let reply = self
            .script
            .lock()
            .expect("mock script mutex poisoned")
            .pop_front()
            .unwrap_or_else(|| match &self.default_reply {
                Some(text) => Ok(text.clone()),
                None => Err(GenerationError::EmptyCandidate),
            });

        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        reply
    }

    fn name(&self) -> &'static str {
        "mock"
    }
}
