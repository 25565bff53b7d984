//! Crawler module for page retrieval and harvest orchestration
//!
//! This module contains the core crawling logic, including:
//! - HTTP fetching with a politeness delay
//! - Browser-driven retrieval through headless Chrome, with bounded waits
//! - Overall harvest coordination

mod coordinator;
mod fetcher;
mod rendered;
pub mod wait;

pub use coordinator::{run_crawl, Coordinator, RunReport};
pub use fetcher::{build_http_client, HttpFetcher, PageSource, Politeness};
pub use rendered::{BrowserError, RenderedSource};
pub use wait::{poll_until, WaitOutcome};
