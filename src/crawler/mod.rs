//! Crawl Policy Engine
//!
//! This module contains the core crawling logic, including:
//! - HTTP fetching and error classification
//! - HTML link extraction
//! - The accept/reject policy for discovered URLs
//! - Frontier queueing with per-domain politeness
//! - Overall crawl coordination and Page Capture writes

mod coordinator;
mod fetcher;
mod frontier;
mod parser;
pub mod policy;

pub use coordinator::{run_crawl, Coordinator};
pub use fetcher::{build_http_client, fetch_url, is_html_content_type, FetchResult};
pub use frontier::{Frontier, QueuedUrl};
pub use parser::{parse_html, ParsedPage};
pub use policy::{evaluate, Decision, PolicyContext};
