//! Extraction module for listing and document pages
//!
//! This module contains the decision logic that turns parsed HTML into
//! crawl work and content:
//! - Pagination inference for listing pages
//! - Link discovery through an ordered fallback chain
//! - Content-root location and block normalization for documents
//! - Articles embedded inline on listing pages
//! - Attachment (PDF) discovery

mod attachments;
mod content;
mod embedded;
mod links;
mod pagination;
mod strategy;
mod text;

pub use attachments::find_attachments;
pub use content::{ContentExtractor, ExtractionMiss};
pub use embedded::{find_embedded, EmbeddedDocument};
pub use links::{LinkExtraction, LinkExtractor};
pub use pagination::{resolve_pagination, PaginationStyle, PaginationSummary, MAX_TOTAL_PAGES};
pub use strategy::{non_empty, ChainOutcome, Strategy, StrategyChain};

use std::hash::{Hash, Hasher};
use url::Url;

/// One listing page within a target's pagination
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageDescriptor {
    pub url: Url,

    /// 1 for the seed page, strictly increasing after that
    pub sequence_number: u32,
}

/// A discovered document link
///
/// The URL is the natural key: two candidates with the same URL are the
/// same link regardless of title text.
#[derive(Debug, Clone)]
pub struct LinkCandidate {
    pub url: Url,
    pub title: String,
    pub source_page_sequence: u32,
    pub date: Option<String>,
    pub category: Option<String>,
}

impl PartialEq for LinkCandidate {
    fn eq(&self, other: &Self) -> bool {
        self.url == other.url
    }
}

impl Eq for LinkCandidate {}

impl Hash for LinkCandidate {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.url.hash(state);
    }
}

/// A typed unit of normalized document content
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContentBlock {
    Heading { level: u8, text: String },
    Paragraph(String),
    /// `position` is 1-based within the item's own list, so a new list
    /// starts wherever it is 1
    ListItem {
        ordered: bool,
        position: u32,
        text: String,
    },
    Rule,
    Quote(String),
}

impl ContentBlock {
    /// Text carried by the block, if any
    pub fn text(&self) -> Option<&str> {
        match self {
            Self::Heading { text, .. } | Self::ListItem { text, .. } => Some(text),
            Self::Paragraph(text) | Self::Quote(text) => Some(text),
            Self::Rule => None,
        }
    }
}

/// Normalized content of one document page
#[derive(Debug, Clone, PartialEq)]
pub struct ExtractedDocument {
    pub source_url: Url,
    pub title: String,
    pub blocks: Vec<ContentBlock>,
}
