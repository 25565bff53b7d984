//! Attachment (PDF) discovery on document pages

use crate::extract::strategy::{non_empty, StrategyChain};
use crate::extract::text::selector;
use crate::url::resolve_link;
use scraper::{ElementRef, Html};
use url::Url;

/// Finds downloadable PDF attachments linked from a document page
///
/// Tried in order, first hit wins:
/// - a dedicated download anchor (`a#pdf-download`)
/// - a hidden input carrying the file URL (`input#p_d`)
/// - any anchor whose URL path ends in `.pdf`
/// - the anchor wrapping a PDF icon (`img.img-pdf`)
///
/// URLs are resolved against `page_url` and returned in document order
/// without duplicates.
pub fn find_attachments(document: &Html, page_url: &Url) -> Vec<Url> {
    let outcome = StrategyChain::new()
        .with("download-anchor", |doc: &Html| {
            collect(doc, "a#pdf-download", "href", page_url)
        })
        .with("hidden-input", |doc: &Html| {
            collect(doc, "input#p_d", "value", page_url)
        })
        .with("pdf-extension", |doc: &Html| pdf_extension_links(doc, page_url))
        .with("pdf-icon", |doc: &Html| pdf_icon_links(doc, page_url))
        .run(document);

    outcome.value.unwrap_or_default()
}

fn collect(document: &Html, css: &str, attr: &str, page_url: &Url) -> Option<Vec<Url>> {
    let sel = selector(css)?;
    let urls = document
        .select(&sel)
        .filter_map(|element| element.value().attr(attr))
        .filter_map(|value| resolve_link(value, page_url));
    non_empty(unique(urls))
}

fn pdf_extension_links(document: &Html, page_url: &Url) -> Option<Vec<Url>> {
    let sel = selector("a[href]")?;
    let urls = document
        .select(&sel)
        .filter_map(|anchor| anchor.value().attr("href"))
        .filter_map(|href| resolve_link(href, page_url))
        .filter(|url| url.path().to_ascii_lowercase().ends_with(".pdf"));
    non_empty(unique(urls))
}

fn pdf_icon_links(document: &Html, page_url: &Url) -> Option<Vec<Url>> {
    let sel = selector("img.img-pdf")?;
    let urls = document
        .select(&sel)
        .filter_map(|icon| {
            icon.ancestors()
                .filter_map(ElementRef::wrap)
                .find(|ancestor| ancestor.value().name() == "a")
        })
        .filter_map(|anchor| anchor.value().attr("href"))
        .filter_map(|href| resolve_link(href, page_url));
    non_empty(unique(urls))
}

fn unique(urls: impl Iterator<Item = Url>) -> Vec<Url> {
    let mut out: Vec<Url> = Vec::new();
    for url in urls {
        if !out.contains(&url) {
            out.push(url);
        }
    }
    out
}
