//! HTTP fetcher implementation
//!
//! This module handles all HTTP requests for the crawler, including:
//! - Building the HTTP client with the configured user agent and timeouts
//! - GET requests to fetch page content
//! - Reporting redirects back to the coordinator instead of following them
//! - Error classification

use crate::config::CrawlerConfig;
use crate::state::RejectReason;
use reqwest::{redirect::Policy, Client};
use std::time::Duration;

/// Redirect hops the coordinator follows from one scheduled URL
pub const MAX_REDIRECTS: u32 = 10;

/// Connect timeout, capped by the request timeout
const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Result of a fetch operation
#[derive(Debug)]
pub enum FetchResult {
    /// Successfully fetched an HTML page
    Success {
        /// HTTP status code
        status_code: u16,
        /// Content-Type header value (empty if absent)
        content_type: String,
        /// Page body content
        body: String,
    },

    /// 3xx response; `location` is absolute, resolved against the request URL
    Redirect { status_code: u16, location: String },

    /// Non-2xx response (including a 3xx without a usable `Location`)
    HttpError { status_code: u16 },

    /// Timeout, connection failure or unreadable body
    NetworkError { error: String, timed_out: bool },

    /// Response is not HTML
    ContentMismatch { content_type: String },
}

impl FetchResult {
    /// Why this result yields no capture; `None` for `Success`
    pub fn reject_reason(&self) -> Option<RejectReason> {
        match self {
            Self::Success { .. } => None,
            Self::Redirect { location, .. } => Some(RejectReason::Redirected(location.clone())),
            Self::HttpError { status_code } => Some(RejectReason::HttpStatus(*status_code)),
            Self::NetworkError { error, .. } => Some(RejectReason::Network(error.clone())),
            Self::ContentMismatch { content_type } => {
                Some(RejectReason::ContentMismatch(content_type.clone()))
            }
        }
    }
}

/// Builds an HTTP client from the crawler configuration
///
/// The client never follows redirects; every hop has to pass the crawl
/// policy before it is requested.
pub fn build_http_client(config: &CrawlerConfig) -> Result<Client, reqwest::Error> {
    let timeout = Duration::from_secs(config.request_timeout_secs);

    Client::builder()
        .user_agent(config.user_agent.as_str())
        .timeout(timeout)
        .connect_timeout(CONNECT_TIMEOUT.min(timeout))
        .redirect(Policy::none())
        .gzip(true)
        .brotli(true)
        .build()
}

/// Returns true if a Content-Type header value denotes HTML
///
/// A missing header is treated as HTML.
pub fn is_html_content_type(content_type: &str) -> bool {
    let mime = content_type
        .split(';')
        .next()
        .unwrap_or("")
        .trim()
        .to_ascii_lowercase();

    mime.is_empty() || mime == "text/html" || mime == "application/xhtml+xml"
}

/// Fetches a URL and classifies the outcome
///
/// A redirect is returned as `FetchResult::Redirect`, not followed. No
/// retries are attempted; a failed fetch drops the URL from the run.
pub async fn fetch_url(client: &Client, url: &str) -> FetchResult {
    let response = match client.get(url).send().await {
        Ok(response) => response,
        Err(e) => return classify_error(&e),
    };

    let status = response.status();
    if status.is_redirection() {
        let location = response
            .headers()
            .get(reqwest::header::LOCATION)
            .and_then(|v| v.to_str().ok())
            .and_then(|location| response.url().join(location).ok());
        return match location {
            Some(location) => FetchResult::Redirect {
                status_code: status.as_u16(),
                location: location.to_string(),
            },
            None => FetchResult::HttpError {
                status_code: status.as_u16(),
            },
        };
    }

    if !status.is_success() {
        return FetchResult::HttpError {
            status_code: status.as_u16(),
        };
    }

    let content_type = response
        .headers()
        .get(reqwest::header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("")
        .to_string();

    if !is_html_content_type(&content_type) {
        return FetchResult::ContentMismatch { content_type };
    }

    match response.text().await {
        Ok(body) => FetchResult::Success {
            status_code: status.as_u16(),
            content_type,
            body,
        },
        Err(e) => classify_error(&e),
    }
}

fn classify_error(e: &reqwest::Error) -> FetchResult {
    if e.is_timeout() {
        FetchResult::NetworkError {
            error: "Request timeout".to_string(),
            timed_out: true,
        }
    } else if e.is_connect() {
        FetchResult::NetworkError {
            error: "Connection refused".to_string(),
            timed_out: false,
        }
    } else {
        FetchResult::NetworkError {
            error: e.to_string(),
            timed_out: false,
        }
    }
}
