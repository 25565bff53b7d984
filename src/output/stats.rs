//! Run statistics
//!
//! Counters live in memory only and are reported once at the end of a run,
//! including runs that terminate with an error.

use chrono::{DateTime, Utc};
use std::fmt;

/// Counters for one harvest run
#[derive(Debug, Clone)]
pub struct RunStats {
    pub started_at: DateTime<Utc>,

    /// Targets whose listing was walked to the end
    pub targets_completed: u64,

    /// Listing pages fetched successfully
    pub pages_fetched: u64,

    /// Listing pages that could not be fetched
    pub pages_failed: u64,

    /// Document links handled, whatever the outcome
    pub processed: u64,

    /// Documents extracted and written
    pub succeeded: u64,

    /// Network and filesystem failures, listing pages included
    pub failed: u64,

    /// Documents skipped: already on disk or no extractable content
    pub skipped: u64,

    /// Links already seen earlier in this run
    pub duplicates: u64,

    /// Attachments written
    pub attachments_saved: u64,
}

impl RunStats {
    pub fn new() -> Self {
        Self {
            started_at: Utc::now(),
            targets_completed: 0,
            pages_fetched: 0,
            pages_failed: 0,
            processed: 0,
            succeeded: 0,
            failed: 0,
            skipped: 0,
            duplicates: 0,
            attachments_saved: 0,
        }
    }

    pub fn record_page_fetched(&mut self) {
        self.pages_fetched += 1;
    }

    pub fn record_page_failure(&mut self) {
        self.pages_failed += 1;
        self.failed += 1;
    }

    pub fn record_duplicate(&mut self) {
        self.duplicates += 1;
    }

    pub fn record_success(&mut self) {
        self.processed += 1;
        self.succeeded += 1;
    }

    pub fn record_failure(&mut self) {
        self.processed += 1;
        self.failed += 1;
    }

    pub fn record_skip(&mut self) {
        self.processed += 1;
        self.skipped += 1;
    }

    /// A write outside any document, such as a page snapshot
    pub fn record_write_failure(&mut self) {
        self.failed += 1;
    }

    pub fn record_attachment(&mut self) {
        self.attachments_saved += 1;
    }

    pub fn record_target_completed(&mut self) {
        self.targets_completed += 1;
    }

    /// Seconds since the run started
    pub fn elapsed_seconds(&self) -> i64 {
        (Utc::now() - self.started_at).num_seconds()
    }

    /// Emits the summary through tracing
    pub fn log_summary(&self) {
        tracing::info!(
            "Run finished in {}s: processed={} succeeded={} failed={} skipped={}",
            self.elapsed_seconds(),
            self.processed,
            self.succeeded,
            self.failed,
            self.skipped
        );
        tracing::info!(
            "Pages fetched={} failed={}, duplicates={}, attachments={}",
            self.pages_fetched,
            self.pages_failed,
            self.duplicates,
            self.attachments_saved
        );
    }
}

impl Default for RunStats {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for RunStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "=== Harvest Summary ===")?;
        writeln!(f, "  Started:     {}", self.started_at.to_rfc3339())?;
        writeln!(f, "  Targets:     {}", self.targets_completed)?;
        writeln!(
            f,
            "  Pages:       {} fetched, {} failed",
            self.pages_fetched, self.pages_failed
        )?;
        writeln!(f, "  Processed:   {}", self.processed)?;
        writeln!(f, "  Succeeded:   {}", self.succeeded)?;
        writeln!(f, "  Failed:      {}", self.failed)?;
        writeln!(f, "  Skipped:     {}", self.skipped)?;
        writeln!(f, "  Duplicates:  {}", self.duplicates)?;
        write!(f, "  Attachments: {}", self.attachments_saved)
    }
}
