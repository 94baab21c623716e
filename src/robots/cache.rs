//! Per-origin robots.txt cache
//!
//! Rules are fetched once per origin per run and refreshed after 24 hours,
//! which only matters for very long crawls.

use crate::robots::ParsedRobots;
use chrono::{DateTime, Duration, Utc};
use std::collections::HashMap;

/// Cached robots.txt rules for one origin
#[derive(Debug, Clone)]
pub struct CachedRobots {
    /// The parsed robots.txt content
    pub content: ParsedRobots,

    /// When the robots.txt was fetched
    pub fetched_at: DateTime<Utc>,
}

impl CachedRobots {
    pub fn new(content: ParsedRobots) -> Self {
        Self {
            content,
            fetched_at: Utc::now(),
        }
    }

    /// Checks if the cached robots.txt is older than 24 hours
    pub fn is_stale(&self) -> bool {
        Utc::now() - self.fetched_at > Duration::hours(24)
    }
}

/// Robots rules keyed by origin (`scheme://host:port`)
#[derive(Debug, Default)]
pub struct RobotsCache {
    entries: HashMap<String, CachedRobots>,
}

impl RobotsCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns fresh rules for an origin, if cached
    pub fn get(&self, origin: &str) -> Option<&ParsedRobots> {
        self.entries
            .get(origin)
            .filter(|cached| !cached.is_stale())
            .map(|cached| &cached.content)
    }

    pub fn insert(&mut self, origin: &str, robots: ParsedRobots) {
        self.entries
            .insert(origin.to_string(), CachedRobots::new(robots));
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
