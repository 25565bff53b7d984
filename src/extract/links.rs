//! Link discovery on listing pages
//!
//! Four strategies are tried in order and the first one that finds any link
//! wins; results are never merged across strategies.
//!
//! 1. entry containers (`article` unless configured otherwise)
//! 2. headings that directly wrap a link
//! 3. anchors whose URL contains the document path (e.g. `/articles/`)
//! 4. anchors inside generic content containers, same origin only

use crate::config::{CrawlTarget, ExtractionConfig};
use crate::extract::strategy::{non_empty, StrategyChain};
use crate::extract::text::{element_text, selector};
use crate::extract::LinkCandidate;
use crate::url::{resolve_link, same_origin};
use scraper::{ElementRef, Html, Selector};
use std::collections::HashSet;
use url::Url;

const HEADING_LINKS: &str = "h1 a[href], h2 a[href], h3 a[href], h4 a[href]";
const DIRECT_HEADING_LINKS: &str = "h1 > a[href], h2 > a[href], h3 > a[href], h4 > a[href]";
const GENERIC_CONTAINER_LINKS: &str =
    ".post a[href], .entry a[href], .content a[href], .article a[href]";
const TITLE_IN_ANCHOR: &str = "h1, h2, h3, h4, h5, h6";
const DATE_MARKERS: &str = "time, .entry-date, .published, .date, .posted-on";
const CATEGORY_MARKERS: &str = ".cat-links a, .category, a[rel~='category'], a[rel~='tag']";

/// Positional marker tags some listings use for `date, category`
const POSITIONAL_MARKERS: &str = "p1";

/// Candidates found on one listing page
#[derive(Debug, Clone)]
pub struct LinkExtraction {
    pub candidates: Vec<LinkCandidate>,

    /// Strategy that produced the candidates
    pub strategy: Option<&'static str>,

    /// Strategies invoked, winner included
    pub attempts: usize,
}

impl LinkExtraction {
    pub fn is_miss(&self) -> bool {
        self.candidates.is_empty()
    }
}

/// Discovers document links on listing pages
#[derive(Debug, Clone)]
pub struct LinkExtractor {
    entry_container: String,
    document_path: Option<String>,
}

impl LinkExtractor {
    pub fn new(entry_container: impl Into<String>, document_path: Option<String>) -> Self {
        Self {
            entry_container: entry_container.into(),
            document_path,
        }
    }

    /// Builds an extractor for one target, honouring its overrides
    pub fn for_target(extraction: &ExtractionConfig, target: &CrawlTarget) -> Self {
        Self::new(
            extraction.entry_container.clone(),
            target.document_path(extraction).map(str::to_string),
        )
    }

    /// Extracts candidates from a parsed listing page
    ///
    /// # Arguments
    ///
    /// * `document` - The parsed listing page
    /// * `page_url` - URL the page was fetched from, for resolving hrefs
    /// * `sequence` - Sequence number of the page within its target
    pub fn extract(&self, document: &Html, page_url: &Url, sequence: u32) -> LinkExtraction {
        let outcome = self.chain(page_url, sequence).run(document);

        LinkExtraction {
            candidates: outcome.value.unwrap_or_default(),
            strategy: outcome.strategy,
            attempts: outcome.attempts,
        }
    }

    fn chain<'a>(
        &'a self,
        page_url: &'a Url,
        sequence: u32,
    ) -> StrategyChain<'a, Html, Vec<LinkCandidate>> {
        StrategyChain::new()
            .with("entry-container", move |doc: &Html| {
                entry_container_links(doc, &self.entry_container, page_url, sequence)
            })
            .with("heading-link", move |doc: &Html| {
                heading_links(doc, page_url, sequence)
            })
            .with("document-path", move |doc: &Html| {
                let pattern = self.document_path.as_deref()?;
                document_path_links(doc, pattern, page_url, sequence)
            })
            .with("content-container", move |doc: &Html| {
                generic_container_links(doc, page_url, sequence)
            })
    }
}

/// Keeps candidates unique by URL, in first-seen order
struct Collector<'u> {
    page_url: &'u Url,
    sequence: u32,
    seen: HashSet<Url>,
    candidates: Vec<LinkCandidate>,
}

impl<'u> Collector<'u> {
    fn new(page_url: &'u Url, sequence: u32) -> Self {
        Self {
            page_url,
            sequence,
            seen: HashSet::new(),
            candidates: Vec::new(),
        }
    }

    /// Resolves the anchor's href and records it; returns the URL if accepted
    fn push(&mut self, anchor: ElementRef<'_>, metadata: &Metadata) -> Option<Url> {
        let url = anchor
            .value()
            .attr("href")
            .and_then(|href| resolve_link(href, self.page_url))?;

        if !self.seen.insert(url.clone()) {
            return None;
        }

        self.candidates.push(LinkCandidate {
            url: url.clone(),
            title: anchor_title(anchor),
            source_page_sequence: self.sequence,
            date: metadata.date.clone(),
            category: metadata.category.clone(),
        });
        Some(url)
    }

    fn finish(self) -> Option<Vec<LinkCandidate>> {
        non_empty(self.candidates)
    }
}

fn entry_container_links(
    document: &Html,
    container_css: &str,
    page_url: &Url,
    sequence: u32,
) -> Option<Vec<LinkCandidate>> {
    let containers = selector(container_css)?;
    let heading_links = selector(HEADING_LINKS)?;
    let any_link = selector("a[href]")?;
    let mut collector = Collector::new(page_url, sequence);

    for container in document.select(&containers) {
        let metadata = Metadata::within(container);

        // A heading link is the entry's title link; the rest are tags,
        // author pages and "read more" duplicates.
        if let Some(anchor) = container.select(&heading_links).next() {
            collector.push(anchor, &metadata);
        } else {
            for anchor in container.select(&any_link) {
                collector.push(anchor, &metadata);
            }
        }
    }

    collector.finish()
}

fn heading_links(document: &Html, page_url: &Url, sequence: u32) -> Option<Vec<LinkCandidate>> {
    let links = selector(DIRECT_HEADING_LINKS)?;
    let mut collector = Collector::new(page_url, sequence);

    for anchor in document.select(&links) {
        let metadata = anchor
            .parent()
            .and_then(ElementRef::wrap)
            .and_then(|heading| heading.parent())
            .and_then(ElementRef::wrap)
            .map(Metadata::within)
            .unwrap_or_default();
        collector.push(anchor, &metadata);
    }

    collector.finish()
}

fn document_path_links(
    document: &Html,
    pattern: &str,
    page_url: &Url,
    sequence: u32,
) -> Option<Vec<LinkCandidate>> {
    let links = selector("a[href]")?;
    let mut collector = Collector::new(page_url, sequence);

    for anchor in document.select(&links) {
        let matches = anchor
            .value()
            .attr("href")
            .and_then(|href| resolve_link(href, page_url))
            .map(|url| url.as_str().contains(pattern))
            .unwrap_or(false);

        if matches {
            collector.push(anchor, &Metadata::within(anchor));
        }
    }

    collector.finish()
}

fn generic_container_links(
    document: &Html,
    page_url: &Url,
    sequence: u32,
) -> Option<Vec<LinkCandidate>> {
    let links = selector(GENERIC_CONTAINER_LINKS)?;
    let mut collector = Collector::new(page_url, sequence);

    for anchor in document.select(&links) {
        let same_site = anchor
            .value()
            .attr("href")
            .and_then(|href| resolve_link(href, page_url))
            .map(|url| same_origin(&url, page_url))
            .unwrap_or(false);

        if same_site {
            collector.push(anchor, &Metadata::within(anchor));
        }
    }

    collector.finish()
}

/// Title of a link: nested heading, then anchor text, then `title` attribute
fn anchor_title(anchor: ElementRef<'_>) -> String {
    let nested_heading = selector(TITLE_IN_ANCHOR)
        .and_then(|headings| anchor.select(&headings).next())
        .map(element_text)
        .filter(|text| !text.is_empty());

    nested_heading
        .or_else(|| Some(element_text(anchor)).filter(|text| !text.is_empty()))
        .or_else(|| anchor.value().attr("title").map(|t| t.trim().to_string()))
        .unwrap_or_default()
}

/// Date and category markers found next to a link
#[derive(Debug, Clone, Default, PartialEq, Eq)]
struct Metadata {
    date: Option<String>,
    category: Option<String>,
}

impl Metadata {
    fn within(scope: ElementRef<'_>) -> Self {
        let first_text = |css: &str| -> Option<String> {
            let sel: Selector = selector(css)?;
            scope
                .select(&sel)
                .map(element_text)
                .find(|text| !text.is_empty())
        };

        let mut metadata = Self {
            date: first_text(DATE_MARKERS),
            category: first_text(CATEGORY_MARKERS),
        };

        if metadata.date.is_none() || metadata.category.is_none() {
            let positional: Vec<String> = selector(POSITIONAL_MARKERS)
                .map(|sel| scope.select(&sel).map(element_text).collect())
                .unwrap_or_default();
            let mut positional = positional.into_iter().filter(|text| !text.is_empty());
            let date = positional.next();
            let category = positional.next();

            metadata.date = metadata.date.or(date);
            metadata.category = metadata.category.or(category);
        }

        metadata
    }
}
