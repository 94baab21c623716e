//! Fallback extraction from an embedded JSON payload
//!
//! Client-rendered pages ship their content as a serialized JSON blob in a
//! script tag (`__NEXT_DATA__` for Next.js sites). Text is harvested from
//! a fixed list of keys found anywhere in that tree.

use super::json_tree::collect_values;
use super::metadata::strip_artifacts;
use super::ExtractionRules;
use regex::Regex;
use scraper::Html;
use serde_json::Value;
use std::sync::OnceLock;

static RE_TAG: OnceLock<Regex> = OnceLock::new();

/// Removes every `<...>` span, keeping the text between tags
pub fn clean_html(text: &str) -> String {
    let re_tag = RE_TAG.get_or_init(|| Regex::new(r"<[^>]*>").unwrap());
    re_tag.replace_all(text, "").into_owned()
}

/// Parses the payload script of `document`, if present and valid JSON
fn parse_payload(document: &Html, rules: &ExtractionRules) -> Option<Value> {
    let Some(script) = document.select(&rules.payload_selector).next() else {
        tracing::debug!("No payload script on page");
        return None;
    };

    let raw: String = script.text().collect();
    match serde_json::from_str(&raw) {
        Ok(value) => Some(value),
        Err(e) => {
            tracing::debug!("Payload script is not valid JSON: {}", e);
            None
        }
    }
}

/// Harvests text from the payload keys, in key order then document order
///
/// Only string values are harvested. Each is trimmed and stripped of markup;
/// empty results are dropped and the rest joined with single spaces.
/// Returns `None` when the script is missing, unparsable, or yields nothing.
pub fn extract_payload_text(document: &Html, rules: &ExtractionRules) -> Option<String> {
    let payload = parse_payload(document, rules)?;

    let mut parts = Vec::new();
    for key in &rules.payload_keys {
        for value in collect_values(&payload, key) {
            let Value::String(text) = value else {
                continue;
            };
            let cleaned = clean_html(text.trim());
            if !cleaned.is_empty() {
                parts.push(cleaned);
            }
        }
    }

    let text = strip_artifacts(&parts.join(" "));
    if text.is_empty() {
        None
    } else {
        Some(text)
    }
}
