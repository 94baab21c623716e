//! Selector-based extraction of metadata and paragraph text

use scraper::{Html, Selector};

/// Removes newline and non-breaking-space artifacts left in joined text
pub(crate) fn strip_artifacts(text: &str) -> String {
    text.replace('\n', "").replace("&nbsp;", "")
}

/// Joins an attribute of every matching element with single spaces
///
/// Elements lacking the attribute are skipped. Returns `None` when nothing
/// matches.
pub fn extract_attribute_text(document: &Html, selector: &Selector, attr: &str) -> Option<String> {
    let values: Vec<&str> = document
        .select(selector)
        .filter_map(|element| element.value().attr(attr))
        .collect();

    if values.is_empty() {
        return None;
    }
    Some(strip_artifacts(&values.join(" ")))
}

/// Joins every text node below each matching element with single spaces
///
/// Returns `None` when the selector matches no text at all.
pub fn extract_node_text(document: &Html, selector: &Selector) -> Option<String> {
    let nodes: Vec<&str> = document
        .select(selector)
        .flat_map(|element| element.text())
        .collect();

    if nodes.is_empty() {
        return None;
    }
    Some(strip_artifacts(&nodes.join(" ")))
}
