//! State module for tracking crawl progress
//!
//! # Components
//!
//! - `PageState`: the per-URL state machine (frontier, fetching, parsed, accepted, rejected)
//! - `RejectReason`: why a URL was dropped
//! - `DomainState`: per-domain politeness tracking
//! - `VisitSet`: URLs fetched or scheduled in this run

mod domain_state;
mod page_state;
mod visit_set;

pub use domain_state::DomainState;
pub use page_state::{PageState, RejectReason};
pub use visit_set::VisitSet;
