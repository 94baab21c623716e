//! Extraction Engine
//!
//! This module turns the raw HTML of a Page Capture into a Normalized
//! Record:
//! - title and description from metadata selectors
//! - body text from paragraph text nodes, falling back to an embedded JSON
//!   payload for client-rendered pages
//!
//! The batch driver in [`pipeline`] feeds every capture of a site through
//! [`extract_record`] and upserts the result.

pub mod json_tree;
pub mod metadata;
pub mod payload;
pub mod pipeline;

pub use crate::storage::{NormalizedRecord, PageCapture};
pub use metadata::{extract_attribute_text, extract_node_text};
pub use payload::{clean_html, extract_payload_text};
pub use pipeline::{is_invalid_page, Extractor};

use crate::config::ExtractionConfig;
use crate::ConfigError;
use chrono::Utc;
use scraper::{Html, Selector};

/// Attribute holding the value of title/description meta tags
const META_CONTENT_ATTR: &str = "content";

/// Compiled selectors and payload keys used for extraction
#[derive(Debug, Clone)]
pub struct ExtractionRules {
    pub title_selector: Selector,
    pub description_selector: Selector,
    pub text_selector: Selector,
    pub payload_selector: Selector,
    pub payload_keys: Vec<String>,
}

fn compile(selector: &str) -> Result<Selector, ConfigError> {
    Selector::parse(selector).map_err(|e| ConfigError::InvalidSelector {
        selector: selector.to_string(),
        message: e.to_string(),
    })
}

impl ExtractionRules {
    /// Compiles the configured selectors
    pub fn from_config(config: &ExtractionConfig) -> Result<Self, ConfigError> {
        Ok(Self {
            title_selector: compile(&config.title_selector)?,
            description_selector: compile(&config.description_selector)?,
            text_selector: compile(&config.text_selector)?,
            payload_selector: compile(&config.payload_selector)?,
            payload_keys: config.payload_keys.clone(),
        })
    }
}

/// Extracts a Normalized Record from one page's HTML
///
/// Never fails: every field that cannot be found is `None`.
pub fn extract_record(html: &str, url: &str, rules: &ExtractionRules) -> NormalizedRecord {
    let document = Html::parse_document(html);

    let title = extract_attribute_text(&document, &rules.title_selector, META_CONTENT_ATTR);
    let description =
        extract_attribute_text(&document, &rules.description_selector, META_CONTENT_ATTR);

    let texts = match extract_node_text(&document, &rules.text_selector) {
        Some(text) if !text.trim().is_empty() => Some(text),
        _ => {
            tracing::debug!("No paragraph text on {}, trying payload", url);
            extract_payload_text(&document, rules)
        }
    };

    NormalizedRecord {
        url: url.to_string(),
        title,
        description,
        texts,
        updated_at: Utc::now(),
    }
}
