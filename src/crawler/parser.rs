//! HTML link extraction for the crawl frontier
//!
//! Only what the crawler needs to keep going is pulled out here: outbound
//! links and the page title for logging. Content extraction happens later,
//! in a separate pass over the stored captures.

use scraper::{ElementRef, Html, Selector};
use std::collections::HashSet;
use url::Url;

/// Links and title found on a fetched page
#[derive(Debug, Clone)]
pub struct ParsedPage {
    /// Trimmed `<title>` text
    pub title: Option<String>,

    /// Absolute http(s) links, first occurrence order, without duplicates
    pub links: Vec<Url>,
}

/// Parses HTML content and extracts links and the title
///
/// Links come from `<a href>` and `<link rel="canonical">`. Skipped:
/// `<a download>`, `javascript:`, `mailto:`, `tel:` and `data:` hrefs,
/// fragment-only anchors, and anything not http(s) after resolution.
/// `rel="nofollow"` links are followed.
pub fn parse_html(html: &str, base_url: &Url) -> ParsedPage {
    let document = Html::parse_document(html);

    ParsedPage {
        title: extract_title(&document),
        links: extract_links(&document, base_url),
    }
}

fn extract_title(document: &Html) -> Option<String> {
    let title_selector = Selector::parse("title").ok()?;

    document
        .select(&title_selector)
        .next()
        .map(|element| element.text().collect::<String>().trim().to_string())
        .filter(|s| !s.is_empty())
}

fn extract_links(document: &Html, base_url: &Url) -> Vec<Url> {
    let mut seen = HashSet::new();
    let mut links = Vec::new();

    let mut push = |element: ElementRef| {
        let Some(href) = element.value().attr("href") else {
            return;
        };
        if let Some(link) = resolve_link(href, base_url) {
            if seen.insert(link.to_string()) {
                links.push(link);
            }
        }
    };

    if let Ok(a_selector) = Selector::parse("a[href]") {
        document
            .select(&a_selector)
            .filter(|element| element.value().attr("download").is_none())
            .for_each(&mut push);
    }

    if let Ok(canonical_selector) = Selector::parse("link[rel='canonical'][href]") {
        document.select(&canonical_selector).for_each(&mut push);
    }

    links
}

/// Resolves an href against the page URL, or `None` if it is not followable
fn resolve_link(href: &str, base_url: &Url) -> Option<Url> {
    let href = href.trim();
    if href.is_empty() || href.starts_with('#') {
        return None;
    }

    let lower = href.to_ascii_lowercase();
    if ["javascript:", "mailto:", "tel:", "data:"]
        .iter()
        .any(|scheme| lower.starts_with(scheme))
    {
        return None;
    }

    let absolute = base_url.join(href).ok()?;
    match absolute.scheme() {
        "http" | "https" => Some(absolute),
        _ => None,
    }
}
