//! Crawl frontier with per-domain politeness
//!
//! URLs are served first-in first-out, except that a URL whose domain is
//! still inside its politeness delay is passed over in favor of the next
//! URL whose domain is ready.

use crate::state::DomainState;
use std::collections::{HashMap, VecDeque};
use std::time::{Duration, Instant};
use url::Url;

/// A URL waiting to be fetched
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueuedUrl {
    /// Normalized URL
    pub url: Url,

    /// Lowercase host, the politeness key
    pub domain: String,

    /// Link distance from the nearest seed
    pub depth: u32,

    /// Redirect hops taken to reach this URL from a seed or link
    pub redirects: u32,
}

/// Queue of URLs to fetch plus per-domain request state
#[derive(Debug)]
pub struct Frontier {
    queue: VecDeque<QueuedUrl>,
    domain_states: HashMap<String, DomainState>,
    download_delay: Duration,
    respect_crawl_delay: bool,
}

impl Frontier {
    pub fn new(download_delay: Duration, respect_crawl_delay: bool) -> Self {
        Self {
            queue: VecDeque::new(),
            domain_states: HashMap::new(),
            download_delay,
            respect_crawl_delay,
        }
    }

    pub fn push(&mut self, queued: QueuedUrl) {
        self.queue.push_back(queued);
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    /// Records a robots Crawl-delay for a domain
    ///
    /// Ignored unless crawl-delay compliance is on.
    pub fn set_crawl_delay(&mut self, domain: &str, delay: Option<Duration>) {
        if !self.respect_crawl_delay {
            return;
        }
        self.domain_states
            .entry(domain.to_string())
            .or_default()
            .crawl_delay = delay;
    }

    pub fn domain_state(&self, domain: &str) -> Option<&DomainState> {
        self.domain_states.get(domain)
    }

    /// Removes and returns the first URL whose domain may be requested now
    ///
    /// The request is recorded against the domain before returning.
    pub fn next_ready(&mut self, now: Instant) -> Option<QueuedUrl> {
        let delay = self.download_delay;
        let states = &self.domain_states;
        let index = self.queue.iter().position(|queued| {
            states
                .get(&queued.domain)
                .map_or(true, |state| state.can_request(delay, now))
        })?;

        let queued = self.queue.remove(index)?;
        self.domain_states
            .entry(queued.domain.clone())
            .or_default()
            .record_request(now);

        tracing::trace!("Frontier yielded {} (depth {})", queued.url, queued.depth);
        Some(queued)
    }

    /// Shortest wait until some queued URL becomes ready
    ///
    /// `None` if the queue is empty or a URL is ready now.
    pub fn time_until_ready(&self, now: Instant) -> Option<Duration> {
        let mut shortest: Option<Duration> = None;
        for queued in &self.queue {
            let wait = self
                .domain_states
                .get(&queued.domain)
                .and_then(|state| state.time_until_next_request(self.download_delay, now));
            match wait {
                None => return None,
                Some(wait) => {
                    shortest = Some(shortest.map_or(wait, |current| current.min(wait)));
                }
            }
        }
        shortest
    }
}
