//! Pagination inference for listing pages
//!
//! The total page count is inferred from two independent signals on the
//! seed page and the larger one wins:
//! - anchors whose text is a bare number (`1 2 3 … 17`)
//! - anchors whose URL carries a page number (`?page=17`, `/page/17/`)
//!
//! Only anchors inside a pagination container are read when the page has
//! one; otherwise every same-site anchor is. The total is capped at
//! [`MAX_TOTAL_PAGES`].

use crate::extract::text::{element_text, selector};
use crate::extract::PageDescriptor;
use crate::url::{resolve_link, same_origin};
use scraper::{ElementRef, Html};
use url::Url;

/// Query keys recognised as carrying a page number
const PAGE_QUERY_KEYS: &[&str] = &["page", "paged"];

/// Path marker that precedes a page number (`/page/<n>/`)
const PAGE_PATH_MARKER: &str = "page";

/// Elements that hold a site's page-number links
const PAGINATION_CONTAINERS: &str = ".pagination, .page-numbers, .nav-links, .wp-pagenavi";

/// Largest page count ever generated for one target
pub const MAX_TOTAL_PAGES: u32 = 2000;

/// How subsequent page URLs are built from the seed
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PaginationStyle {
    /// `?<key>=<n>`, or `&<key>=<n>` when the seed already has a query
    Query { key: String },
    /// `<seed>/page/<n>/`
    Path,
}

/// What the resolver saw and what it generated
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaginationSummary {
    /// Total page count, seed page included
    pub total_pages: u32,

    /// Largest purely numeric anchor text
    pub text_signal: u32,

    /// Largest page number found in anchor URLs
    pub url_signal: u32,

    /// Whether the caller-supplied default decided the total
    pub used_default: bool,

    /// Whether the total was cut down to [`MAX_TOTAL_PAGES`]
    pub capped: bool,

    pub style: PaginationStyle,

    /// Pages 2..=total; the seed itself is never included
    pub pages: Vec<PageDescriptor>,
}

#[derive(Debug, Default)]
struct Signals {
    text_max: u32,
    query_max: u32,
    query_hits: usize,
    query_key: Option<String>,
    path_max: u32,
    path_hits: usize,
}

/// Infers the page count of a listing and generates the remaining page URLs
///
/// `default_total` is used only when no signal on the page exceeds 1, for
/// sites whose pagination markup is missing but whose size is known.
///
/// # Example
///
/// ```
/// use folio_harvest::extract::resolve_pagination;
/// use scraper::Html;
/// use url::Url;
///
/// let seed = Url::parse("https://example.com/volume/01/").unwrap();
/// let html = Html::parse_document(r#"<a href="/volume/01/page/3/">3</a>"#);
/// let summary = resolve_pagination(&html, &seed, None);
///
/// assert_eq!(summary.total_pages, 3);
/// assert_eq!(summary.pages[0].url.as_str(), "https://example.com/volume/01/page/2/");
/// assert_eq!(summary.pages[0].sequence_number, 2);
/// ```
pub fn resolve_pagination(
    document: &Html,
    seed: &Url,
    default_total: Option<u32>,
) -> PaginationSummary {
    let signals = scan_signals(document, seed);

    let text_signal = signals.text_max;
    let url_signal = signals.query_max.max(signals.path_max);
    let detected = text_signal.max(url_signal);

    let (mut total_pages, used_default) = if detected > 1 {
        (detected, false)
    } else {
        (default_total.unwrap_or(1).max(1), default_total.is_some())
    };

    let capped = total_pages > MAX_TOTAL_PAGES;
    if capped {
        tracing::warn!(
            "Pagination for {} claims {} pages, capping at {}",
            seed,
            total_pages,
            MAX_TOTAL_PAGES
        );
        total_pages = MAX_TOTAL_PAGES;
    }

    let style = choose_style(&signals, seed);
    let pages = (2..=total_pages)
        .map(|n| PageDescriptor {
            url: page_url(seed, &style, n),
            sequence_number: n,
        })
        .collect::<Vec<_>>();

    tracing::debug!(
        "Pagination for {}: total={} (text={}, url={}, default={}), style={:?}",
        seed,
        total_pages,
        text_signal,
        url_signal,
        used_default,
        style
    );

    PaginationSummary {
        total_pages,
        text_signal,
        url_signal,
        used_default,
        capped,
        style,
        pages,
    }
}

fn scan_signals(document: &Html, seed: &Url) -> Signals {
    let mut signals = Signals::default();

    for anchor in pagination_anchors(document) {
        // Page links are always navigable links on the same site
        let Some(url) = anchor
            .value()
            .attr("href")
            .and_then(|href| resolve_link(href, seed))
            .filter(|url| same_origin(url, seed))
        else {
            continue;
        };

        let text = element_text(anchor);
        if !text.is_empty() && text.chars().all(|c| c.is_ascii_digit()) {
            if let Ok(n) = text.parse::<u32>() {
                signals.text_max = signals.text_max.max(n);
            }
        }

        if let Some((key, n)) = query_page_number(&url) {
            signals.query_hits += 1;
            signals.query_max = signals.query_max.max(n);
            signals.query_key.get_or_insert(key);
        }

        if let Some(n) = path_page_number(&url) {
            signals.path_hits += 1;
            signals.path_max = signals.path_max.max(n);
        }
    }

    signals
}

/// Anchors inside pagination containers, or every anchor when there are none
fn pagination_anchors(document: &Html) -> Vec<ElementRef<'_>> {
    let (Some(containers), Some(anchors)) = (selector(PAGINATION_CONTAINERS), selector("a")) else {
        return Vec::new();
    };

    let mut scoped: Vec<ElementRef<'_>> = Vec::new();
    for container in document.select(&containers) {
        let inside: Vec<ElementRef<'_>> = if container.value().name() == "a" {
            vec![container]
        } else {
            container.select(&anchors).collect()
        };
        for anchor in inside {
            if !scoped.iter().any(|seen| seen.id() == anchor.id()) {
                scoped.push(anchor);
            }
        }
    }

    if scoped.is_empty() {
        document.select(&anchors).collect()
    } else {
        scoped
    }
}

/// Page number carried in a recognised query parameter
fn query_page_number(url: &Url) -> Option<(String, u32)> {
    url.query_pairs().find_map(|(key, value)| {
        if PAGE_QUERY_KEYS.contains(&key.as_ref()) {
            value.parse::<u32>().ok().map(|n| (key.into_owned(), n))
        } else {
            None
        }
    })
}

/// Page number in the path component right after the `page` marker
fn path_page_number(url: &Url) -> Option<u32> {
    let segments: Vec<&str> = url.path_segments()?.collect();
    segments
        .windows(2)
        .find(|pair| pair[0] == PAGE_PATH_MARKER)
        .and_then(|pair| pair[1].parse::<u32>().ok())
}

fn choose_style(signals: &Signals, seed: &Url) -> PaginationStyle {
    let query_style = || PaginationStyle::Query {
        key: signals
            .query_key
            .clone()
            .unwrap_or_else(|| PAGE_QUERY_KEYS[0].to_string()),
    };

    if seed.query().is_some() {
        return query_style();
    }

    if signals.query_hits > signals.path_hits {
        query_style()
    } else if signals.path_hits > signals.query_hits {
        PaginationStyle::Path
    } else if seed.path().ends_with('/') {
        PaginationStyle::Path
    } else {
        query_style()
    }
}

fn page_url(seed: &Url, style: &PaginationStyle, n: u32) -> Url {
    let mut url = seed.clone();
    url.set_fragment(None);

    match style {
        PaginationStyle::Query { key } => {
            let kept: Vec<(String, String)> = url
                .query_pairs()
                .filter(|(k, _)| k != key)
                .map(|(k, v)| (k.into_owned(), v.into_owned()))
                .collect();

            if kept.len() == url.query_pairs().count() {
                // Seed carries no page key of its own, so append verbatim
                let query = match url.query() {
                    Some(existing) if !existing.is_empty() => format!("{}&{}={}", existing, key, n),
                    _ => format!("{}={}", key, n),
                };
                url.set_query(Some(&query));
            } else {
                url.query_pairs_mut()
                    .clear()
                    .extend_pairs(kept)
                    .append_pair(key, &n.to_string());
            }
        }
        PaginationStyle::Path => {
            let base = url.path().trim_end_matches('/').to_string();
            url.set_path(&format!("{}/{}/{}/", base, PAGE_PATH_MARKER, n));
        }
    }

    url
}
