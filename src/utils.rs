//! Helpers for normalizing provider data into the common article shape.
//!
//! - Slugs for facet keys and facet matching
//! - Stable article identifiers from canonical URLs
//! - Publication timestamp parsing across provider formats
//! - Description excerpts and HTML-to-text reduction
//! - Log-safe truncation

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use scraper::Html;
use sha2::{Digest, Sha256};
use url::Url;

static WHITESPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").unwrap());

/// Length of the description excerpt cut from full body text.
pub const EXCERPT_CHARS: usize = 200;

/// Convert a display name to a facet key.
///
/// Lowercases the name and replaces every run of whitespace with one hyphen.
/// Punctuation is kept, so "U.S." slugs to "u.s.".
///
/// # Examples
///
/// ```ignore
/// assert_eq!(slugify("The Guardian"), "the-guardian");
/// assert_eq!(slugify("New  York\tTimes"), "new-york-times");
/// ```
pub fn slugify(name: &str) -> String {
    WHITESPACE.replace_all(&name.to_lowercase(), "-").into_owned()
}

/// Derive a stable article identifier from its URL.
///
/// The URL is parsed and its fragment dropped before hashing, so trivially
/// different spellings of the same link (host case, `#comments`) collide.
/// Unparseable URLs are hashed as given.
pub fn article_id(url: &str) -> String {
    let trimmed = url.trim();
    let canonical = match Url::parse(trimmed) {
        Ok(mut parsed) => {
            parsed.set_fragment(None);
            parsed.to_string()
        }
        Err(_) => trimmed.to_string(),
    };
    let digest = Sha256::digest(canonical.as_bytes());
    let mut hex = format!("{digest:x}");
    hex.truncate(16);
    hex
}

/// Parse a provider publication timestamp.
///
/// Accepts RFC 3339 (`2024-01-10T08:00:00Z`), offsets without a colon
/// (`2024-01-10T08:00:00+0000`, as the NYT sends them), naive date-times
/// (taken as UTC) and bare dates (midnight UTC).
pub fn parse_published_at(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(dt) = DateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f%z") {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f") {
        return Some(naive.and_utc());
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

/// Cut a description from full body text: the first [`EXCERPT_CHARS`]
/// characters followed by `...`.
pub fn excerpt(body: &str) -> String {
    let mut out: String = body.chars().take(EXCERPT_CHARS).collect();
    out.push_str("...");
    out
}

/// Reduce an HTML fragment to its text with whitespace collapsed.
///
/// Plain text passes through unchanged apart from trimming.
pub fn html_to_text(fragment: &str) -> String {
    if !fragment.contains('<') {
        return fragment.trim().to_string();
    }
    let document = Html::parse_fragment(fragment);
    let text = document.root_element().text().collect::<Vec<_>>().join(" ");
    WHITESPACE.replace_all(text.trim(), " ").into_owned()
}

/// Truncate a string for logging purposes.
///
/// Long strings are cut to `max` characters with an ellipsis and a count of
/// the dropped bytes appended.
pub fn truncate_for_log(s: &str, max: usize) -> String {
    match s.char_indices().nth(max) {
        None => s.to_string(),
        Some((cut, _)) => format!("{}…(+{} bytes)", &s[..cut], s.len() - cut),
    }
}
