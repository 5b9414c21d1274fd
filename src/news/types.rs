// src/news/types.rs
use serde::{Deserialize, Serialize};

/// Categories the generation prompt asks for and the image table covers.
/// The field itself stays an open string; anything outside this list maps
/// to the default illustration.
pub const RECOMMENDED_CATEGORIES: &[&str] = &[
    "phishing",
    "ransomware",
    "data-breach",
    "malware",
    "vulnerability",
    "social-engineering",
    "cloud-security",
    "mobile-security",
];

/// Severity of a reported threat.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Critical,
    High,
    Medium,
    Low,
}

impl Severity {
    /// Lenient parse for upstream-provided strings. Returns `None` for
    /// anything that is not one of the four levels.
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "critical" => Some(Self::Critical),
            "high" => Some(Self::High),
            "medium" | "moderate" => Some(Self::Medium),
            "low" => Some(Self::Low),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Critical => "critical",
            Self::High => "high",
            Self::Medium => "medium",
            Self::Low => "low",
        }
    }
}

/// One portal news article. This is the shape the UI consumes; fallback
/// and AI-generated items are indistinguishable by structure.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewsArticle {
    pub id: String,
    pub title: String,
    pub summary: String,
    pub body: String,
    /// AI-written overview, filled in lazily via `generate_overview`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub overview: Option<String>,
    pub category: String,
    pub severity: Severity,
    pub source: String,
    pub url: String,
    pub image_url: String,
    /// ISO 8601, e.g. "2025-08-16T10:00:00Z".
    #[serde(rename = "published_at")]
    pub published_at_iso: String,
    pub views: u32,
}
