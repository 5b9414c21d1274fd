//! Deterministic substitute content served whenever the generation API is
//! unavailable, exhausted, or returns unusable output.
//!
//! Five embedded template articles are cycled into a fixed-size list of 14.
//! Structure (titles, categories, severities, ordering) is stable
//! run-to-run; only ids and view counts vary.

use std::collections::HashMap;

use chrono::{DateTime, SecondsFormat};
use once_cell::sync::Lazy;
use serde::Deserialize;

use crate::clock::Clock;
use crate::entropy::Entropy;
use crate::news::types::{NewsArticle, Severity};

/// Number of items produced by `fallback_articles`.
pub const FALLBACK_LIST_LEN: usize = 14;

/// Maximum number of items returned by the client-side fallback search.
pub const FALLBACK_SEARCH_MAX: usize = 5;

/// Gap between consecutive fallback publication timestamps.
const ITEM_AGE_STEP_MS: u64 = 3 * 3_600 * 1_000;

/// Outlets attributed round-robin to fallback items.
const OUTLETS: &[&str] = &[
    "The Hacker News",
    "BleepingComputer",
    "Dark Reading",
    "Krebs on Security",
    "SecurityWeek",
];

#[derive(Debug, Clone, Deserialize)]
struct FallbackTemplate {
    title: String,
    summary: String,
    body: String,
    category: String,
    severity: Severity,
    url: String,
}

static TEMPLATES: Lazy<Vec<FallbackTemplate>> = Lazy::new(|| {
    let raw = include_str!("../../fallback_articles.json");
    serde_json::from_str::<Vec<FallbackTemplate>>(raw).expect("valid fallback article table")
});

pub static CATEGORY_IMAGES: Lazy<HashMap<&'static str, &'static str>> = Lazy::new(|| {
    HashMap::from([
        (
            "phishing",
            "https://images.unsplash.com/photo-1563013544-824ae1b704d3?auto=format&fit=crop&w=800&q=60",
        ),
        (
            "ransomware",
            "https://images.unsplash.com/photo-1614064641938-3bbee52942c7?auto=format&fit=crop&w=800&q=60",
        ),
        (
            "data-breach",
            "https://images.unsplash.com/photo-1504868584819-f8e8b4b6d7e3?auto=format&fit=crop&w=800&q=60",
        ),
        (
            "malware",
            "https://images.unsplash.com/photo-1526374965328-7f61d4dc18c5?auto=format&fit=crop&w=800&q=60",
        ),
        (
            "vulnerability",
            "https://images.unsplash.com/photo-1555949963-aa79dcee981c?auto=format&fit=crop&w=800&q=60",
        ),
        (
            "social-engineering",
            "https://images.unsplash.com/photo-1573164713988-8665fc963095?auto=format&fit=crop&w=800&q=60",
        ),
        (
            "cloud-security",
            "https://images.unsplash.com/photo-1544197150-b99a580bb7a8?auto=format&fit=crop&w=800&q=60",
        ),
        (
            "mobile-security",
            "https://images.unsplash.com/photo-1512941937669-90a1b58e7e9c?auto=format&fit=crop&w=800&q=60",
        ),
    ])
});

pub const DEFAULT_CATEGORY_IMAGE: &str =
    "https://images.unsplash.com/photo-1550751827-4bd374c3f58b?auto=format&fit=crop&w=800&q=60";

/// Illustration URL for a category; unknown categories get the default.
pub fn image_for_category(category: &str) -> &'static str {
    CATEGORY_IMAGES
        .get(category.trim().to_ascii_lowercase().as_str())
        .copied()
        .unwrap_or(DEFAULT_CATEGORY_IMAGE)
}

/// Build the 14-item fallback list. Newest first: item `i` is published
/// `i * 3h` before `now`.
pub fn fallback_articles(clock: &dyn Clock, entropy: &dyn Entropy) -> Vec<NewsArticle> {
    let now_ms = clock.now_millis();
    (0..FALLBACK_LIST_LEN)
        .map(|i| {
            let t = &TEMPLATES[i % TEMPLATES.len()];
            let published_ms = now_ms.saturating_sub(i as u64 * ITEM_AGE_STEP_MS);
            NewsArticle {
                id: format!("fallback-{now_ms}-{i}"),
                title: t.title.clone(),
                summary: t.summary.clone(),
                body: t.body.clone(),
                overview: None,
                category: t.category.clone(),
                severity: t.severity,
                source: OUTLETS[i % OUTLETS.len()].to_string(),
                url: t.url.clone(),
                image_url: image_for_category(&t.category).to_string(),
                published_at_iso: iso_from_millis(published_ms),
                views: entropy.pick(750, 15_000),
            }
        })
        .collect()
}

/// Client-side substitute for the search operation: case-insensitive
/// substring match of the query against title, summary, or category, plus
/// the optional category filter. Capped at `FALLBACK_SEARCH_MAX`.
pub fn search_fallback(
    query: &str,
    category: Option<&str>,
    clock: &dyn Clock,
    entropy: &dyn Entropy,
) -> Vec<NewsArticle> {
    let needle = query.trim().to_ascii_lowercase();
    fallback_articles(clock, entropy)
        .into_iter()
        .filter(|a| {
            let cat_ok = category
                .map(|c| a.category.eq_ignore_ascii_case(c.trim()))
                .unwrap_or(true);
            let text_ok = needle.is_empty()
                || a.title.to_ascii_lowercase().contains(&needle)
                || a.summary.to_ascii_lowercase().contains(&needle)
                || a.category.to_ascii_lowercase().contains(&needle);
            cat_ok && text_ok
        })
        .take(FALLBACK_SEARCH_MAX)
        .collect()
}

/// Deterministic overview text: a severity-keyed sentence joined with a
/// category-keyed sentence (generic sentence for unknown categories).
pub fn fallback_overview(article: &NewsArticle) -> String {
    let severity_part = match article.severity {
        Severity::Critical => {
            "This is a critical-severity threat that warrants immediate attention and remediation."
        }
        Severity::High => {
            "This high-severity issue should be reviewed promptly and addressed within days, not weeks."
        }
        Severity::Medium => {
            "This medium-severity issue is worth tracking and folding into routine security hygiene."
        }
        Severity::Low => {
            "This low-severity item is informational but still useful for building awareness."
        }
    };
    let category_part = match article.category.trim().to_ascii_lowercase().as_str() {
        "phishing" => {
            "Phishing defenses rest on user vigilance: verify senders, distrust urgency, and report suspicious messages."
        }
        "ransomware" => {
            "Ransomware resilience comes from tested offline backups, rapid patching, and rehearsed recovery plans."
        }
        "data-breach" => {
            "After a breach, rotate exposed credentials, watch for account-takeover attempts, and review data-retention practices."
        }
        "malware" => {
            "Limit malware exposure by installing software only from trusted sources and keeping endpoint protection current."
        }
        "vulnerability" => {
            "Prioritize patching internet-facing systems and track vendor advisories for actively exploited flaws."
        }
        "social-engineering" => {
            "Social-engineering attacks bypass technology by targeting people; verification callbacks defeat most of them."
        }
        "cloud-security" => {
            "Review cloud configurations regularly; most cloud incidents trace back to permissive defaults left unchanged."
        }
        "mobile-security" => {
            "Keep mobile devices updated and install apps only from official stores with scrutiny of requested permissions."
        }
        _ => "Staying informed about emerging threats is the foundation of good security awareness.",
    };
    format!("{severity_part} {category_part}")
}

fn iso_from_millis(ms: u64) -> String {
    DateTime::from_timestamp_millis(ms as i64)
        .unwrap_or_default()
        .to_rfc3339_opts(SecondsFormat::Secs, true)
}
