//! Robots.txt handling module
//!
//! This module provides functionality for fetching, parsing, and caching
//! robots.txt files. A disallowed URL is never fetched and never captured.

mod cache;
mod parser;

pub use cache::{CachedRobots, RobotsCache};
pub use parser::{group_agent, product_token, ParsedRobots};

use reqwest::Client;
use url::Url;

/// Origin key (`scheme://host[:port]`) used to cache robots rules
pub fn origin_key(url: &Url) -> String {
    url.origin().ascii_serialization()
}

/// Location of the robots.txt governing `url`
pub fn robots_url(url: &Url) -> Option<Url> {
    let mut robots = url.clone();
    robots.set_path("/robots.txt");
    robots.set_query(None);
    robots.set_fragment(None);
    if robots.cannot_be_a_base() {
        return None;
    }
    Some(robots)
}

/// Redirect hops followed when fetching robots.txt
const MAX_ROBOTS_REDIRECTS: usize = 5;

/// Fetches robots.txt for the origin of `url`
///
/// The request goes through the crawl client, so it carries the crawl user
/// agent and timeout. That client does not follow redirects, so up to five
/// hops are followed here.
///
/// | Outcome | Rules |
/// |---------|-------|
/// | 2xx | parsed body |
/// | 4xx / 5xx, too many redirects | allow all |
/// | network error, timeout | allow all (logged) |
pub async fn fetch_robots(client: &Client, url: &Url) -> ParsedRobots {
    let Some(mut target) = robots_url(url) else {
        return ParsedRobots::allow_all();
    };

    for _ in 0..=MAX_ROBOTS_REDIRECTS {
        let response = match client.get(target.clone()).send().await {
            Ok(response) => response,
            Err(e) => {
                tracing::warn!("Failed to fetch {}: {}; allowing all", target, e);
                return ParsedRobots::allow_all();
            }
        };

        let status = response.status();
        if status.is_redirection() {
            let next = response
                .headers()
                .get(reqwest::header::LOCATION)
                .and_then(|v| v.to_str().ok())
                .and_then(|location| target.join(location).ok());
            match next {
                Some(next) => {
                    tracing::debug!("{} redirected to {}", target, next);
                    target = next;
                    continue;
                }
                None => {
                    tracing::debug!("{} returned HTTP {}; allowing all", target, status);
                    return ParsedRobots::allow_all();
                }
            }
        }

        if !status.is_success() {
            tracing::debug!("{} returned HTTP {}; allowing all", target, status);
            return ParsedRobots::allow_all();
        }

        return match response.text().await {
            Ok(body) => {
                tracing::debug!("Loaded {} ({} bytes)", target, body.len());
                ParsedRobots::from_content(&body)
            }
            Err(e) => {
                tracing::warn!("Failed to read {}: {}; allowing all", target, e);
                ParsedRobots::allow_all()
            }
        };
    }

    tracing::warn!("Too many redirects fetching robots.txt for {}; allowing all", url);
    ParsedRobots::allow_all()
}
