//! Crawler coordinator - main crawl orchestration logic
//!
//! This module contains the crawl loop that ties the pieces together:
//! - Seeding the frontier and the visit set
//! - Loading robots.txt once per origin
//! - Running up to `max-concurrent-requests` fetches on a `JoinSet`
//! - Writing one Page Capture per fetched page
//! - Evaluating discovered links and redirect targets, queueing the accepted ones

use crate::config::Config;
use crate::crawler::fetcher::{build_http_client, fetch_url, FetchResult, MAX_REDIRECTS};
use crate::crawler::frontier::{Frontier, QueuedUrl};
use crate::crawler::parser::parse_html;
use crate::crawler::policy::{evaluate, Decision, PolicyContext};
use crate::output::CrawlStats;
use crate::robots::{fetch_robots, origin_key, ParsedRobots, RobotsCache};
use crate::state::{PageState, RejectReason, VisitSet};
use crate::storage::{put_json, FsObjectStore, ObjectStore, PageCapture};
use crate::url::{extract_domain, is_domain_allowed, normalize_url, page_capture_key};
use crate::{ConfigError, HarvestError};
use reqwest::Client;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::task::JoinSet;
use url::Url;

/// Log a progress line every this many captures
const PROGRESS_EVERY: u64 = 25;

/// Main crawler coordinator structure
pub struct Coordinator {
    config: Arc<Config>,
    objects: Arc<dyn ObjectStore>,
    client: Client,
    frontier: Frontier,
    visited: VisitSet,
    robots: RobotsCache,
    states: HashMap<String, PageState>,
    stats: CrawlStats,
}

impl Coordinator {
    /// Creates a coordinator and seeds the frontier at depth 0
    ///
    /// Every seed must normalize and fall inside the allow-list; a seed
    /// that does not is a configuration error. Duplicate seeds collapse.
    pub fn new(config: Config, objects: Arc<dyn ObjectStore>) -> Result<Self, HarvestError> {
        let client = build_http_client(&config.crawler)?;
        let mut frontier = Frontier::new(
            Duration::from_millis(config.crawler.download_delay_ms),
            config.crawler.respect_crawl_delay,
        );
        let mut visited = VisitSet::new();
        let mut states = HashMap::new();

        for seed in &config.crawler.seeds {
            let url = normalize_url(seed)?;
            let domain = extract_domain(&url)
                .ok_or_else(|| ConfigError::InvalidUrl(format!("Seed '{}' has no host", seed)))?;

            if !is_domain_allowed(&domain, &config.crawler.allowed_domains) {
                return Err(ConfigError::Validation(format!(
                    "Seed URL '{}' is outside allowed-domains",
                    seed
                ))
                .into());
            }

            if !visited.insert(url.as_str()) {
                tracing::debug!("Duplicate seed {}", url);
                continue;
            }

            states.insert(url.to_string(), PageState::Frontier);
            frontier.push(QueuedUrl {
                url,
                domain,
                depth: 0,
                redirects: 0,
            });
        }

        tracing::info!("Seeded frontier with {} URLs", frontier.len());

        Ok(Self {
            config: Arc::new(config),
            objects,
            client,
            frontier,
            visited,
            robots: RobotsCache::new(),
            states,
            stats: CrawlStats::new(),
        })
    }

    /// Runs the crawl loop until the frontier drains or `max-pages` is hit
    pub async fn run(&mut self) -> Result<CrawlStats, HarvestError> {
        tracing::info!(
            "Starting crawl of {} (max depth {})",
            self.config.site.name,
            self.config.crawler.max_depth
        );

        let max_in_flight = self.config.crawler.max_concurrent_requests.max(1) as usize;
        let mut in_flight: JoinSet<(QueuedUrl, FetchResult)> = JoinSet::new();

        loop {
            // Fill free fetch slots with ready URLs
            while in_flight.len() < max_in_flight && !self.cap_reached(in_flight.len()) {
                let Some(queued) = self.frontier.next_ready(Instant::now()) else {
                    break;
                };
                if let Some(queued) = self.prepare_fetch(queued).await? {
                    let client = self.client.clone();
                    in_flight.spawn(async move {
                        let result = fetch_url(&client, queued.url.as_str()).await;
                        (queued, result)
                    });
                }
            }

            let can_schedule =
                in_flight.len() < max_in_flight && !self.cap_reached(in_flight.len());
            let wait = if can_schedule {
                self.frontier.time_until_ready(Instant::now())
            } else {
                None
            };

            if in_flight.is_empty() {
                match wait {
                    Some(wait) => {
                        tokio::time::sleep(wait).await;
                        continue;
                    }
                    None if can_schedule && !self.frontier.is_empty() => continue,
                    None => break,
                }
            }

            tokio::select! {
                joined = in_flight.join_next() => match joined {
                    Some(Ok((queued, result))) => self.handle_fetch(queued, result)?,
                    Some(Err(e)) => tracing::error!("Fetch task failed: {}", e),
                    None => {}
                },
                _ = tokio::time::sleep(wait.unwrap_or(Duration::ZERO)), if wait.is_some() => {}
            }
        }

        if self.cap_reached(0) && !self.frontier.is_empty() {
            tracing::info!(
                "max-pages reached; {} URLs left unfetched",
                self.frontier.len()
            );
        }

        self.stats.finish();
        for domain in &self.stats.domains {
            if let Some(state) = self.frontier.domain_state(domain) {
                tracing::debug!("{}: {} requests", domain, state.request_count);
            }
        }
        tracing::info!(
            "Crawl completed: {} pages captured, {} rejected, {} URLs visited",
            self.stats.pages_captured,
            self.stats.total_rejected(),
            self.visited.len()
        );

        Ok(self.stats.clone())
    }

    fn cap_reached(&self, in_flight: usize) -> bool {
        let max_pages = self.config.crawler.max_pages;
        max_pages > 0 && self.stats.pages_captured + in_flight as u64 >= max_pages
    }

    /// Applies the robots check to a URL leaving the frontier
    ///
    /// Returns the URL if it should be fetched, or `None` if it was rejected.
    async fn prepare_fetch(&mut self, queued: QueuedUrl) -> Result<Option<QueuedUrl>, HarvestError> {
        if self.config.crawler.obey_robots {
            let robots = self.robots_for(&queued.url, &queued.domain).await;
            if !robots.is_allowed(queued.url.as_str(), &self.config.crawler.user_agent) {
                self.reject(queued.url.as_str(), RejectReason::RobotsDisallowed)?;
                return Ok(None);
            }
        }

        self.transition(queued.url.as_str(), PageState::Fetching)?;
        self.stats.domains.insert(queued.domain.clone());
        tracing::debug!("Fetching {} (depth {})", queued.url, queued.depth);
        Ok(Some(queued))
    }

    /// Robots rules for the origin of `url`, fetched on first use
    async fn robots_for(&mut self, url: &Url, domain: &str) -> ParsedRobots {
        let origin = origin_key(url);
        if let Some(robots) = self.robots.get(&origin) {
            return robots.clone();
        }

        tracing::debug!("Fetching robots.txt for {}", origin);
        let robots = fetch_robots(&self.client, url).await;

        let delay = robots
            .crawl_delay(&self.config.crawler.user_agent)
            .map(Duration::from_secs_f64);
        if let Some(delay) = delay {
            tracing::info!("{} requests a crawl delay of {:?}", origin, delay);
        }
        self.frontier.set_crawl_delay(domain, delay);

        self.robots.insert(&origin, robots.clone());
        robots
    }

    /// Handles a completed fetch: capture, then follow links
    fn handle_fetch(&mut self, queued: QueuedUrl, result: FetchResult) -> Result<(), HarvestError> {
        let url = queued.url.as_str();

        let body = match result {
            FetchResult::Success { body, .. } => body,
            FetchResult::Redirect { location, .. } => {
                return self.follow_redirect(&queued, location);
            }
            other => {
                let reason = other
                    .reject_reason()
                    .unwrap_or_else(|| RejectReason::Network("unknown fetch failure".to_string()));
                return self.reject(url, reason);
            }
        };

        let parsed = parse_html(&body, &queued.url);
        self.transition(url, PageState::Parsed)?;

        let key = page_capture_key(&self.config.site.name, url);
        let capture = PageCapture {
            url: url.to_string(),
            content: body,
        };
        if let Err(e) = put_json(self.objects.as_ref(), &key, &capture) {
            tracing::error!("Failed to store capture of {} at {}: {}", url, key, e);
            return self.reject(url, RejectReason::StoreFailed(e.to_string()));
        }

        self.transition(url, PageState::Accepted)?;
        self.stats.pages_captured += 1;
        tracing::info!(
            "Captured {} -> {}{}",
            url,
            key,
            parsed
                .title
                .as_deref()
                .map(|t| format!(" ({})", t))
                .unwrap_or_default()
        );
        if self.stats.pages_captured % PROGRESS_EVERY == 0 {
            tracing::info!(
                "Progress: {} pages captured, {} in frontier",
                self.stats.pages_captured,
                self.frontier.len()
            );
        }

        self.follow_links(&parsed.links, queued.depth + 1);
        Ok(())
    }

    /// Ends a redirecting URL and submits its target to the crawl policy
    ///
    /// The target keeps the depth of the URL that redirected to it. It is
    /// queued like any discovered link, so the allow-list, the visit set
    /// and robots.txt all apply before it is requested.
    fn follow_redirect(&mut self, queued: &QueuedUrl, location: String) -> Result<(), HarvestError> {
        self.reject(queued.url.as_str(), RejectReason::Redirected(location.clone()))?;

        if queued.redirects >= MAX_REDIRECTS {
            tracing::warn!(
                "Not following {} -> {}: {} redirects already",
                queued.url,
                location,
                queued.redirects
            );
            self.stats.record_rejection(&RejectReason::TooManyRedirects);
            return Ok(());
        }

        let target = match normalize_url(&location) {
            Ok(target) => target,
            Err(e) => {
                tracing::debug!("Ignoring redirect target {}: {}", location, e);
                self.stats.record_rejection(&RejectReason::InvalidUrl);
                return Ok(());
            }
        };

        match self.consider(target, queued.depth, queued.redirects + 1) {
            Decision::Accept => {}
            Decision::Reject(RejectReason::AlreadyVisited) => {
                tracing::debug!("Redirect target of {} already seen", queued.url);
            }
            Decision::Reject(reason) => {
                tracing::info!("Not following redirect {} -> {}: {}", queued.url, location, reason);
                self.stats.record_rejection(&reason);
            }
        }
        Ok(())
    }

    /// Evaluates discovered links and queues the accepted ones at `depth`
    fn follow_links(&mut self, links: &[Url], depth: u32) {
        self.stats.links_discovered += links.len() as u64;

        for link in links {
            let normalized = match normalize_url(link.as_str()) {
                Ok(n) => n,
                Err(e) => {
                    tracing::trace!("Skipping link {}: {}", link, e);
                    continue;
                }
            };

            let shown = normalized.to_string();
            match self.consider(normalized, depth, 0) {
                Decision::Accept | Decision::Reject(RejectReason::AlreadyVisited) => {}
                Decision::Reject(reason) => {
                    tracing::trace!("Not following {}: {}", shown, reason);
                    self.stats.record_rejection(&reason);
                }
            }
        }
    }

    /// Runs the crawl policy on a normalized URL and queues it if accepted
    fn consider(&mut self, url: Url, depth: u32, redirects: u32) -> Decision {
        let robots = if self.config.crawler.obey_robots {
            self.robots.get(&origin_key(&url))
        } else {
            None
        };
        let ctx = PolicyContext {
            allowed_domains: &self.config.crawler.allowed_domains,
            max_depth: self.config.crawler.max_depth,
            visited: &self.visited,
            robots,
            user_agent: &self.config.crawler.user_agent,
        };

        let decision = evaluate(&url, depth, &ctx);
        if decision.is_accept() {
            let Some(domain) = extract_domain(&url) else {
                return Decision::Reject(RejectReason::InvalidUrl);
            };
            self.visited.insert(url.as_str());
            self.states.insert(url.to_string(), PageState::Frontier);
            self.frontier.push(QueuedUrl {
                url,
                domain,
                depth,
                redirects,
            });
        }
        decision
    }

    fn transition(&mut self, url: &str, next: PageState) -> Result<(), HarvestError> {
        let current = self
            .states
            .get(url)
            .copied()
            .unwrap_or(PageState::Frontier);
        if !current.can_transition_to(next) {
            return Err(HarvestError::InvalidTransition {
                from: current,
                to: next,
            });
        }
        self.states.insert(url.to_string(), next);
        Ok(())
    }

    fn reject(&mut self, url: &str, reason: RejectReason) -> Result<(), HarvestError> {
        if reason.is_fetch_failure() {
            tracing::warn!("Dropping {}: {}", url, reason);
        } else {
            tracing::info!("Rejected {}: {}", url, reason);
        }
        self.stats.record_rejection(&reason);
        self.transition(url, PageState::Rejected)
    }

    /// State of a URL seen in this run
    pub fn page_state(&self, url: &str) -> Option<PageState> {
        self.states.get(url).copied()
    }
}

/// Runs a complete crawl against the filesystem object store in `config`
pub async fn run_crawl(config: Config) -> Result<CrawlStats, HarvestError> {
    let objects = FsObjectStore::open(&config.storage.object_store_path)?;
    let mut coordinator = Coordinator::new(config, Arc::new(objects))?;
    coordinator.run().await
}
