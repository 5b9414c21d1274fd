//! Defensive parsing of model output.
//!
//! Upstream text is prose that is *expected* to contain a JSON array but
//! may ship markdown fencing, leading commentary, or garbage. Extraction
//! tries, in order: the first bracketed array literal, the whole text as
//! JSON, and a fence-stripped retry. Every element is then type-checked
//! field by field before it becomes an article.

use chrono::{DateTime, SecondsFormat};
use once_cell::sync::OnceCell;
use regex::Regex;
use serde_json::Value;

use crate::entropy::Entropy;
use crate::news::fallback::image_for_category;
use crate::news::types::{NewsArticle, Severity};

const MAX_TITLE_CHARS: usize = 200;
const MAX_SUMMARY_CHARS: usize = 600;
const MAX_BODY_CHARS: usize = 4_000;

const DEFAULT_SOURCE: &str = "Cyber Threat Monitor";
const DEFAULT_URL: &str = "https://www.cisa.gov/news-events";

/// Pull a non-empty JSON array out of loosely structured text.
pub fn extract_json_array(text: &str) -> Option<Vec<Value>> {
    if let Some(items) = bracket_match(text) {
        return Some(items);
    }
    if let Some(items) = as_array(serde_json::from_str::<Value>(text).ok()?) {
        return Some(items);
    }
    let stripped = text.replace("```json", "").replace("```", "");
    bracket_match(&stripped)
}

fn bracket_match(text: &str) -> Option<Vec<Value>> {
    static RE: OnceCell<Regex> = OnceCell::new();
    let re = RE.get_or_init(|| Regex::new(r"(?s)\[.*\]").expect("array literal regex"));
    let m = re.find(text)?;
    as_array(serde_json::from_str::<Value>(m.as_str()).ok()?)
}

fn as_array(value: Value) -> Option<Vec<Value>> {
    match value {
        Value::Array(items) if !items.is_empty() => Some(items),
        _ => None,
    }
}

/// Validate and normalize one parsed element into an article.
///
/// Records without a usable title or summary are rejected; everything else
/// is coerced: severity normalized (unrecognized levels become `medium`),
/// the view counter forced to an integer with a randomized plausible
/// filler, the id synthesized from the fetch timestamp and position, and
/// the illustration attached from the category table.
pub fn article_from_value(
    value: &Value,
    now_ms: u64,
    index: usize,
    entropy: &dyn Entropy,
) -> Option<NewsArticle> {
    let title = sanitize_text(value.get("title")?.as_str()?, MAX_TITLE_CHARS);
    let summary = sanitize_text(value.get("summary")?.as_str()?, MAX_SUMMARY_CHARS);
    if title.is_empty() || summary.is_empty() {
        return None;
    }

    let body = value
        .get("body")
        .or_else(|| value.get("content"))
        .and_then(Value::as_str)
        .map(|s| sanitize_text(s, MAX_BODY_CHARS))
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| summary.clone());

    let category = value
        .get("category")
        .and_then(Value::as_str)
        .map(|s| s.trim().to_ascii_lowercase())
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| "general".to_string());

    let severity = value
        .get("severity")
        .and_then(Value::as_str)
        .and_then(Severity::parse)
        .unwrap_or(Severity::Medium);

    let source = value
        .get("source")
        .and_then(Value::as_str)
        .map(|s| sanitize_text(s, 80))
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| DEFAULT_SOURCE.to_string());

    let url = value
        .get("url")
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| s.starts_with("http://") || s.starts_with("https://"))
        .unwrap_or(DEFAULT_URL)
        .to_string();

    let published_at_iso = value
        .get("published_at")
        .or_else(|| value.get("publishedAt"))
        .and_then(Value::as_str)
        .filter(|s| DateTime::parse_from_rfc3339(s).is_ok())
        .map(str::to_string)
        .unwrap_or_else(|| {
            DateTime::from_timestamp_millis(now_ms as i64)
                .unwrap_or_default()
                .to_rfc3339_opts(SecondsFormat::Secs, true)
        });

    let views = coerce_views(value.get("views"), entropy);

    Some(NewsArticle {
        id: format!("news-{now_ms}-{index}"),
        title,
        summary,
        body,
        overview: None,
        image_url: image_for_category(&category).to_string(),
        category,
        severity,
        source,
        url,
        published_at_iso,
        views,
    })
}

fn coerce_views(value: Option<&Value>, entropy: &dyn Entropy) -> u32 {
    match value {
        Some(Value::Number(n)) => n
            .as_u64()
            .map(|v| v.min(u32::MAX as u64) as u32)
            .unwrap_or_else(|| entropy.pick(500, 15_000)),
        Some(Value::String(s)) => s
            .trim()
            .parse::<u32>()
            .unwrap_or_else(|_| entropy.pick(500, 15_000)),
        _ => entropy.pick(500, 15_000),
    }
}

/// Decode HTML entities, collapse whitespace, trim, and cap the length.
pub fn sanitize_text(input: &str, max_chars: usize) -> String {
    static RE_WS: OnceCell<Regex> = OnceCell::new();
    let re_ws = RE_WS.get_or_init(|| Regex::new(r"\s+").expect("whitespace regex"));

    let decoded = html_escape::decode_html_entities(input).to_string();
    let mut out = re_ws.replace_all(&decoded, " ").trim().to_string();
    if out.chars().count() > max_chars {
        out = out.chars().take(max_chars).collect();
    }
    out
}
