/// Crawl phase definitions for one target
///
/// The orchestrator walks these phases for every target; per-item failures
/// return to the loop (next document, next page) rather than ending the run.
use crate::HarvestError;
use std::fmt;

/// Represents where the orchestrator is within one target
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CrawlPhase {
    /// Target accepted, nothing fetched yet
    Init,

    /// Seed page is being fetched and its pagination inferred
    ResolvingPagination,

    // ===== Loop States =====
    /// A listing page is being fetched
    FetchingPage,

    /// Links are being extracted from a listing page
    ExtractingLinks,

    /// A document page is being fetched
    FetchingDocument,

    /// Content is being extracted from a document page
    ExtractingContent,

    /// Artifacts of a document are being written
    Persisting,

    // ===== Terminal State =====
    /// Every page and link of the target has been attempted
    Done,
}

impl CrawlPhase {
    /// Returns true if the phase is inside the page/document loop
    pub fn is_looping(&self) -> bool {
        matches!(
            self,
            Self::FetchingPage
                | Self::ExtractingLinks
                | Self::FetchingDocument
                | Self::ExtractingContent
                | Self::Persisting
        )
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Done)
    }

    /// Returns true if the orchestrator may move from this phase to `next`
    ///
    /// Forward edges follow the pipeline; every loop phase may also fall
    /// back to the next document or page, or finish the target. Articles
    /// embedded in a listing go straight from links to content.
    pub fn can_transition_to(&self, next: CrawlPhase) -> bool {
        use CrawlPhase::*;

        match (*self, next) {
            (Init, ResolvingPagination) => true,
            (ResolvingPagination, ExtractingLinks | FetchingPage | Done) => true,
            (FetchingPage, ExtractingLinks) => true,
            (ExtractingLinks, FetchingDocument) => true,
            (FetchingDocument | ExtractingLinks | Persisting, ExtractingContent) => true,
            (ExtractingContent, Persisting) => true,
            (from, FetchingDocument | FetchingPage | Done) if from.is_looping() => true,
            _ => false,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Init => "init",
            Self::ResolvingPagination => "resolving_pagination",
            Self::FetchingPage => "fetching_page",
            Self::ExtractingLinks => "extracting_links",
            Self::FetchingDocument => "fetching_document",
            Self::ExtractingContent => "extracting_content",
            Self::Persisting => "persisting",
            Self::Done => "done",
        }
    }

    pub fn all_phases() -> Vec<Self> {
        vec![
            Self::Init,
            Self::ResolvingPagination,
            Self::FetchingPage,
            Self::ExtractingLinks,
            Self::FetchingDocument,
            Self::ExtractingContent,
            Self::Persisting,
            Self::Done,
        ]
    }
}

impl fmt::Display for CrawlPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Current phase of one target, with validated transitions
#[derive(Debug)]
pub struct PhaseTracker {
    group: String,
    phase: CrawlPhase,
}

impl PhaseTracker {
    pub fn new(group: impl Into<String>) -> Self {
        Self {
            group: group.into(),
            phase: CrawlPhase::Init,
        }
    }

    pub fn phase(&self) -> CrawlPhase {
        self.phase
    }

    /// Moves to `next`, rejecting edges the state machine does not have
    pub fn advance(&mut self, next: CrawlPhase) -> Result<(), HarvestError> {
        if !self.phase.can_transition_to(next) {
            return Err(HarvestError::InvalidTransition {
                from: self.phase,
                to: next,
            });
        }

        tracing::trace!("[{}] {} -> {}", self.group, self.phase, next);
        self.phase = next;
        Ok(())
    }
}
