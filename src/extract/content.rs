//! Content-root location and block normalization for document pages

use crate::config::ExtractionConfig;
use crate::extract::strategy::StrategyChain;
use crate::extract::text::{collapse_whitespace, element_text, selector};
use crate::extract::{ContentBlock, ExtractedDocument};
use crate::url::last_path_segment;
use scraper::{ElementRef, Html, Selector};
use std::collections::HashSet;
use thiserror::Error;
use url::Url;

/// Subtrees never walked, whatever the root
const ALWAYS_SKIPPED: &[&str] = &["script", "style", "template"];

/// Page chrome skipped when falling back to `<body>`
const FALLBACK_SKIPPED: &[&str] = &[
    "nav", "header", "footer", "aside", "form", "iframe", "noscript", "ins",
];

/// Elements whose text joins the surrounding run of loose text
const INLINE_TAGS: &[&str] = &[
    "a", "abbr", "b", "bdi", "bdo", "cite", "code", "em", "font", "i", "kbd", "label", "mark",
    "q", "s", "small", "span", "strong", "sub", "sup", "time", "u",
];

const TITLE_SELECTORS: &[&str] = &[
    "h1.entry-title",
    "h1.post-title",
    "h1.article-title",
    "h2.entry-title",
    "h1",
    "title",
];

const SECTION_HEADERS: &str = ".accordion-button, .accordion-header, .card-header";
const SECTION_BODIES: &str = ".accordion-desc, .accordion-body, .accordion-collapse, .card-body";

/// Attributes on a section header that point at its body by `#id`
const SECTION_TARGET_ATTRS: &[&str] = &["data-target", "data-bs-target", "href"];

/// Why a document produced no content
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExtractionMiss {
    #[error("No content root found")]
    NoRoot,

    #[error("Content root '{0}' yielded no blocks")]
    EmptyRoot(&'static str),
}

#[derive(Clone, Copy)]
struct ContentRoot<'a> {
    element: ElementRef<'a>,

    /// Root is `<body>`: page chrome is skipped and short text dropped
    fallback: bool,
}

/// Turns a document page into an [`ExtractedDocument`]
#[derive(Debug, Clone)]
pub struct ContentExtractor {
    content_selectors: Vec<String>,
    min_text_length: usize,
}

impl ContentExtractor {
    pub fn new(content_selectors: Vec<String>, min_text_length: usize) -> Self {
        Self {
            content_selectors,
            min_text_length,
        }
    }

    pub fn from_config(config: &ExtractionConfig) -> Self {
        Self::new(config.content_selectors.clone(), config.min_text_length)
    }

    /// Extracts the title and normalized blocks of a document
    ///
    /// `fallback_title` is the link text the document was discovered by; it
    /// is used when the page itself carries no title element.
    pub fn extract(
        &self,
        document: &Html,
        url: &Url,
        fallback_title: Option<&str>,
    ) -> Result<ExtractedDocument, ExtractionMiss> {
        let title_element = locate_title(document);

        let title = title_element
            .map(element_text)
            .or_else(|| {
                fallback_title
                    .map(str::trim)
                    .filter(|t| !t.is_empty())
                    .map(str::to_string)
            })
            .or_else(|| last_path_segment(url).map(str::to_string))
            .unwrap_or_else(|| url.to_string());

        let outcome = self.root_chain().run(document);
        let (root, strategy) = match (outcome.value, outcome.strategy) {
            (Some(root), Some(strategy)) => (root, strategy),
            _ => return Err(ExtractionMiss::NoRoot),
        };

        tracing::trace!("Content root for {} located by '{}'", url, strategy);

        let mut walk = Walk::new(document, root.fallback, self.min_text_length, title_element);
        walk.children(root.element);

        if walk.blocks.is_empty() {
            return Err(ExtractionMiss::EmptyRoot(strategy));
        }

        Ok(ExtractedDocument {
            source_url: url.clone(),
            title,
            blocks: walk.blocks,
        })
    }

    /// Extracts the blocks under a root the caller already located
    ///
    /// Used for documents embedded in a larger page; `title_element` is
    /// kept out of the blocks.
    pub fn extract_within<'a>(
        &self,
        document: &'a Html,
        root: ElementRef<'a>,
        url: &Url,
        title: &str,
        title_element: Option<ElementRef<'a>>,
    ) -> Result<ExtractedDocument, ExtractionMiss> {
        let mut walk = Walk::new(document, false, self.min_text_length, title_element);
        walk.children(root);

        if walk.blocks.is_empty() {
            return Err(ExtractionMiss::EmptyRoot("embedded"));
        }

        Ok(ExtractedDocument {
            source_url: url.clone(),
            title: title.to_string(),
            blocks: walk.blocks,
        })
    }

    fn root_chain<'a>(&'a self) -> StrategyChain<'a, Html, ContentRoot<'a>> {
        let specific = |element: ElementRef<'a>| ContentRoot {
            element,
            fallback: false,
        };

        StrategyChain::<'a, Html, ContentRoot<'a>>::new()
            .with("content-selector", move |doc| {
                self.content_selectors
                    .iter()
                    .filter_map(|css| selector(css))
                    .find_map(|sel| doc.select(&sel).next())
                    .map(specific)
            })
            .with("article", move |doc| first_match(doc, "article").map(specific))
            .with("main", move |doc| first_match(doc, "main").map(specific))
            .with("body", |doc| {
                first_match(doc, "body").map(|element| ContentRoot {
                    element,
                    fallback: true,
                })
            })
    }
}

fn first_match<'a>(document: &'a Html, css: &str) -> Option<ElementRef<'a>> {
    let sel = selector(css)?;
    let found = document.select(&sel).next();
    found
}

/// First title element with text, in priority order
fn locate_title<'a>(document: &'a Html) -> Option<ElementRef<'a>> {
    let chain = TITLE_SELECTORS.iter().fold(
        StrategyChain::<'a, Html, ElementRef<'a>>::new(),
        |chain, &css| {
            chain.with(css, move |doc| {
                let sel = selector(css)?;
                let found = doc.select(&sel).find(|e| !element_text(*e).is_empty());
                found
            })
        },
    );

    chain.run(document).value
}

/// Depth-first walk of a content root that emits blocks in document order
struct Walk<'a> {
    document: &'a Html,
    fallback: bool,
    min_text_length: usize,
    title_element: Option<ElementRef<'a>>,
    section_headers: Option<Selector>,
    section_bodies: Option<Selector>,

    /// Section bodies already emitted under their header
    consumed: Vec<ElementRef<'a>>,
    seen: HashSet<String>,
    blocks: Vec<ContentBlock>,
}

impl<'a> Walk<'a> {
    fn new(
        document: &'a Html,
        fallback: bool,
        min_text_length: usize,
        title_element: Option<ElementRef<'a>>,
    ) -> Self {
        Self {
            document,
            fallback,
            min_text_length,
            title_element,
            section_headers: selector(SECTION_HEADERS),
            section_bodies: selector(SECTION_BODIES),
            consumed: Vec::new(),
            seen: HashSet::new(),
            blocks: Vec::new(),
        }
    }

    /// Walks the child nodes of `element`
    ///
    /// Text outside any block element is gathered into runs: a run ends at
    /// `<br>` or at the next block and becomes one paragraph.
    fn children(&mut self, element: ElementRef<'a>) {
        let mut run = String::new();
        self.collect(element, &mut run);
        self.flush(&mut run);
    }

    fn collect(&mut self, element: ElementRef<'a>, run: &mut String) {
        for node in element.children() {
            if let Some(text) = node.value().as_text() {
                run.push_str(text);
                continue;
            }
            let Some(child) = ElementRef::wrap(node) else {
                continue;
            };

            if child.value().name() == "br" {
                self.flush(run);
            } else if self.is_inline(child) {
                self.collect(child, run);
            } else {
                self.flush(run);
                self.visit(child);
            }
        }
    }

    fn flush(&mut self, run: &mut String) {
        let text = collapse_whitespace(run);
        run.clear();
        self.push(ContentBlock::Paragraph(text));
    }

    fn is_inline(&self, element: ElementRef<'a>) -> bool {
        INLINE_TAGS.contains(&element.value().name())
            && !matches_selector(&self.section_headers, element)
    }

    fn visit(&mut self, element: ElementRef<'a>) {
        let name = element.value().name();

        if ALWAYS_SKIPPED.contains(&name)
            || (self.fallback && FALLBACK_SKIPPED.contains(&name))
            || self.is_consumed(element)
            || is_same(self.title_element, element)
        {
            return;
        }

        if matches_selector(&self.section_headers, element) {
            self.section(element);
            return;
        }

        match name {
            "h1" | "h2" | "h3" | "h4" | "h5" | "h6" => {
                let level = name[1..].parse::<u8>().unwrap_or(2);
                self.push(ContentBlock::Heading {
                    level,
                    text: element_text(element),
                });
            }
            "p" => self.push(ContentBlock::Paragraph(element_text(element))),
            "li" => {
                let list = element.parent().and_then(ElementRef::wrap);
                let ordered = list
                    .map(|parent| parent.value().name() == "ol")
                    .unwrap_or(false);
                let preceding = element
                    .prev_siblings()
                    .filter_map(ElementRef::wrap)
                    .filter(|sibling| sibling.value().name() == "li")
                    .count() as u32;

                self.push(ContentBlock::ListItem {
                    ordered,
                    position: preceding + 1,
                    text: element_text(element),
                });
            }
            "hr" => self.push(ContentBlock::Rule),
            "blockquote" => self.push(ContentBlock::Quote(element_text(element))),
            _ => self.children(element),
        }
    }

    /// Emits a section heading followed by the blocks of its body
    fn section(&mut self, header: ElementRef<'a>) {
        let title = element_text(header);
        if !title.is_empty() {
            self.push(ContentBlock::Heading { level: 2, text: title });
        }

        if let Some(body) = self.section_body(header) {
            self.children(body);
            self.consumed.push(body);
        }
    }

    fn section_body(&self, header: ElementRef<'a>) -> Option<ElementRef<'a>> {
        let by_reference = header
            .descendants()
            .filter_map(ElementRef::wrap)
            .find_map(target_id)
            .and_then(|id| self.element_by_id(id));

        let body = by_reference.or_else(|| header.next_siblings().find_map(ElementRef::wrap))?;

        // A collapse wrapper may hold the actual body further down
        if matches_selector(&self.section_bodies, body) {
            return Some(body);
        }
        let inner = self
            .section_bodies
            .as_ref()
            .and_then(|sel| body.select(sel).next());
        Some(inner.unwrap_or(body))
    }

    fn element_by_id(&self, id: &str) -> Option<ElementRef<'a>> {
        self.document
            .root_element()
            .descendants()
            .filter_map(ElementRef::wrap)
            .find(|element| element.value().id() == Some(id))
    }

    fn is_consumed(&self, element: ElementRef<'a>) -> bool {
        self.consumed.iter().any(|c| c.id() == element.id())
    }

    fn push(&mut self, block: ContentBlock) {
        let (length_checked, deduplicated) = match &block {
            ContentBlock::Paragraph(_) | ContentBlock::ListItem { .. } => (self.fallback, true),
            ContentBlock::Quote(_) => (self.fallback, false),
            ContentBlock::Heading { .. } | ContentBlock::Rule => (false, false),
        };

        if let Some(text) = block.text() {
            if text.is_empty() {
                return;
            }
            if length_checked && text.chars().count() < self.min_text_length {
                return;
            }
            if deduplicated && !self.seen.insert(text.to_string()) {
                return;
            }
        }

        self.blocks.push(block);
    }
}

fn is_same(a: Option<ElementRef<'_>>, b: ElementRef<'_>) -> bool {
    a.map(|a| a.id() == b.id()).unwrap_or(false)
}

fn matches_selector(selector: &Option<Selector>, element: ElementRef<'_>) -> bool {
    selector
        .as_ref()
        .map(|sel| sel.matches(&element))
        .unwrap_or(false)
}

/// `#id` a section header points at
fn target_id(element: ElementRef<'_>) -> Option<&str> {
    SECTION_TARGET_ATTRS
        .iter()
        .filter_map(|attr| element.value().attr(attr))
        .find_map(|value| value.trim().strip_prefix('#'))
        .filter(|id| !id.is_empty())
}
