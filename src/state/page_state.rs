/// Page state definitions for tracking crawl progress
///
/// A URL moves `Frontier -> Fetching -> Parsed -> Accepted` when its capture
/// is written, or ends in `Rejected` from any non-terminal state.
use std::fmt;

/// Represents the current state of a URL in the crawl
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PageState {
    /// Scheduled and waiting to be fetched
    Frontier,

    /// Request in flight
    Fetching,

    /// Response received and its HTML parsed
    Parsed,

    /// Capture written; links followed
    Accepted,

    /// Dropped by policy, robots, or a failed fetch
    Rejected,
}

impl PageState {
    /// Returns true if no further transition is possible
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Accepted | Self::Rejected)
    }

    /// Checks whether moving to `next` is a legal transition
    pub fn can_transition_to(&self, next: PageState) -> bool {
        matches!(
            (self, next),
            (Self::Frontier, Self::Fetching)
                | (Self::Frontier, Self::Rejected)
                | (Self::Fetching, Self::Parsed)
                | (Self::Fetching, Self::Rejected)
                | (Self::Parsed, Self::Accepted)
                | (Self::Parsed, Self::Rejected)
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Frontier => "frontier",
            Self::Fetching => "fetching",
            Self::Parsed => "parsed",
            Self::Accepted => "accepted",
            Self::Rejected => "rejected",
        }
    }
}

impl fmt::Display for PageState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Why a URL ended in `Rejected`
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum RejectReason {
    /// Host outside the domain allow-list
    OutsideAllowList,

    /// Deeper than the configured depth limit
    DepthExceeded,

    /// Already fetched or scheduled in this run
    AlreadyVisited,

    /// Disallowed by robots.txt
    RobotsDisallowed,

    /// Non-2xx response
    HttpStatus(u16),

    /// Timeout, connection failure, or unreadable body
    Network(String),

    /// Response is not HTML
    ContentMismatch(String),

    /// Not an absolute http(s) URL
    InvalidUrl,

    /// Capture could not be written
    StoreFailed(String),

    /// Answered with a redirect; the target is evaluated as a new URL
    Redirected(String),

    /// Redirect chain longer than the hop limit
    TooManyRedirects,
}

impl RejectReason {
    /// Stable label used in run statistics
    pub fn label(&self) -> &'static str {
        match self {
            Self::OutsideAllowList => "outside_allow_list",
            Self::DepthExceeded => "depth_exceeded",
            Self::AlreadyVisited => "already_visited",
            Self::RobotsDisallowed => "robots_disallowed",
            Self::HttpStatus(_) => "http_status",
            Self::Network(_) => "network",
            Self::ContentMismatch(_) => "content_mismatch",
            Self::InvalidUrl => "invalid_url",
            Self::StoreFailed(_) => "store_failed",
            Self::Redirected(_) => "redirected",
            Self::TooManyRedirects => "too_many_redirects",
        }
    }

    /// Returns true for fetch failures (as opposed to policy rejections)
    pub fn is_fetch_failure(&self) -> bool {
        matches!(
            self,
            Self::HttpStatus(_) | Self::Network(_) | Self::ContentMismatch(_)
        )
    }
}

impl fmt::Display for RejectReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::HttpStatus(code) => write!(f, "HTTP {}", code),
            Self::Network(error) => write!(f, "network error: {}", error),
            Self::ContentMismatch(content_type) => {
                write!(f, "expected HTML, got {}", content_type)
            }
            Self::StoreFailed(error) => write!(f, "store failed: {}", error),
            Self::Redirected(location) => write!(f, "redirected to {}", location),
            other => write!(f, "{}", other.label()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_terminal() {
        assert!(!PageState::Frontier.is_terminal());
        assert!(!PageState::Fetching.is_terminal());
        assert!(!PageState::Parsed.is_terminal());
        assert!(PageState::Accepted.is_terminal());
        assert!(PageState::Rejected.is_terminal());
    }

    #[test]
    fn test_happy_path_transitions() {
        assert!(PageState::Frontier.can_transition_to(PageState::Fetching));
        assert!(PageState::Fetching.can_transition_to(PageState::Parsed));
        assert!(PageState::Parsed.can_transition_to(PageState::Accepted));
    }

    #[test]
    fn test_rejection_from_every_active_state() {
        assert!(PageState::Frontier.can_transition_to(PageState::Rejected));
        assert!(PageState::Fetching.can_transition_to(PageState::Rejected));
        assert!(PageState::Parsed.can_transition_to(PageState::Rejected));
    }

    #[test]
    fn test_illegal_transitions() {
        assert!(!PageState::Frontier.can_transition_to(PageState::Accepted));
        assert!(!PageState::Frontier.can_transition_to(PageState::Parsed));
        assert!(!PageState::Accepted.can_transition_to(PageState::Fetching));
        assert!(!PageState::Rejected.can_transition_to(PageState::Frontier));
        assert!(!PageState::Accepted.can_transition_to(PageState::Rejected));
    }

    #[test]
    fn test_display() {
        assert_eq!(PageState::Frontier.to_string(), "frontier");
        assert_eq!(PageState::Accepted.to_string(), "accepted");
        assert_eq!(RejectReason::HttpStatus(404).to_string(), "HTTP 404");
        assert_eq!(
            RejectReason::RobotsDisallowed.to_string(),
            "robots_disallowed"
        );
        assert_eq!(
            RejectReason::Redirected("https://a.test/new".into()).to_string(),
            "redirected to https://a.test/new"
        );
        assert_eq!(RejectReason::TooManyRedirects.label(), "too_many_redirects");
    }

    #[test]
    fn test_fetch_failures() {
        assert!(RejectReason::HttpStatus(500).is_fetch_failure());
        assert!(RejectReason::Network("timeout".into()).is_fetch_failure());
        assert!(!RejectReason::RobotsDisallowed.is_fetch_failure());
        assert!(!RejectReason::DepthExceeded.is_fetch_failure());
    }
}
