use std::time::{Duration, Instant};

/// Tracks per-domain politeness during crawling
#[derive(Debug, Clone, Default)]
pub struct DomainState {
    /// Number of requests made to this domain in the current crawl
    pub request_count: u32,

    /// Timestamp of the last request to this domain
    pub last_request_time: Option<Instant>,

    /// Crawl-delay announced by the domain's robots.txt
    pub crawl_delay: Option<Duration>,
}

impl DomainState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Delay to keep between requests: the larger of the configured delay and
    /// the robots Crawl-delay
    pub fn effective_delay(&self, configured: Duration) -> Duration {
        match self.crawl_delay {
            Some(robots_delay) => configured.max(robots_delay),
            None => configured,
        }
    }

    /// Checks if a request can be made to this domain now
    pub fn can_request(&self, configured: Duration, now: Instant) -> bool {
        self.time_until_next_request(configured, now).is_none()
    }

    /// Records that a request was made to this domain
    pub fn record_request(&mut self, now: Instant) {
        self.request_count += 1;
        self.last_request_time = Some(now);
    }

    /// Time until the next request may go out, or None if one may go now
    pub fn time_until_next_request(&self, configured: Duration, now: Instant) -> Option<Duration> {
        let last = self.last_request_time?;
        let delay = self.effective_delay(configured);
        let elapsed = now.saturating_duration_since(last);
        if elapsed < delay {
            Some(delay - elapsed)
        } else {
            None
        }
    }
}
