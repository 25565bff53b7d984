//! State module for tracking crawl progress
//!
//! # Components
//!
//! - `CrawlPhase`: Where the orchestrator is within one target
//! - `PhaseTracker`: Validated transitions between phases
//! - `Deduplicator`: In-run URL set plus on-disk artifact checks

mod crawl_phase;
mod dedup;

pub use crawl_phase::{CrawlPhase, PhaseTracker};
pub use dedup::Deduplicator;
