//! URL handling module for Site-Harvest
//!
//! This module provides URL normalization for the crawl visit set, domain
//! allow-list matching, and the URL-to-object-key sanitizing used for Page
//! Captures.

mod domain;
mod normalize;
mod sanitize;

pub use domain::{extract_domain, is_domain_allowed, matches_allowed};
pub use normalize::normalize_url;
pub use sanitize::{page_capture_key, sanitize_page_name, site_prefix, FILLER};
