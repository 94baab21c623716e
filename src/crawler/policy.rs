//! Accept/reject decision for candidate URLs
//!
//! `evaluate` is a pure function of the candidate, its depth, and a
//! snapshot of the crawl's policy inputs. It never touches the network;
//! robots rules must already be loaded for the candidate's origin.

use crate::robots::ParsedRobots;
use crate::state::{RejectReason, VisitSet};
use crate::url::{extract_domain, is_domain_allowed};
use url::Url;

/// Outcome of evaluating one candidate URL
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    Accept,
    Reject(RejectReason),
}

impl Decision {
    pub fn is_accept(&self) -> bool {
        matches!(self, Self::Accept)
    }
}

/// Policy inputs for one evaluation
#[derive(Debug, Clone, Copy)]
pub struct PolicyContext<'a> {
    pub allowed_domains: &'a [String],
    pub max_depth: u32,
    pub visited: &'a VisitSet,

    /// Rules for the candidate's origin; `None` skips the robots check
    pub robots: Option<&'a ParsedRobots>,
    pub user_agent: &'a str,
}

/// Decides whether a normalized candidate URL at `depth` should be fetched
///
/// Checks run in a fixed order, so the reason reported is the first that
/// applies: scheme/host, allow-list, depth, visit set, robots.
pub fn evaluate(candidate: &Url, depth: u32, ctx: &PolicyContext<'_>) -> Decision {
    if !matches!(candidate.scheme(), "http" | "https") {
        return Decision::Reject(RejectReason::InvalidUrl);
    }

    let Some(host) = extract_domain(candidate) else {
        return Decision::Reject(RejectReason::InvalidUrl);
    };

    if !is_domain_allowed(&host, ctx.allowed_domains) {
        return Decision::Reject(RejectReason::OutsideAllowList);
    }

    if depth > ctx.max_depth {
        return Decision::Reject(RejectReason::DepthExceeded);
    }

    if ctx.visited.contains(candidate.as_str()) {
        return Decision::Reject(RejectReason::AlreadyVisited);
    }

    if let Some(robots) = ctx.robots {
        if !robots.is_allowed(candidate.as_str(), ctx.user_agent) {
            return Decision::Reject(RejectReason::RobotsDisallowed);
        }
    }

    Decision::Accept
}
