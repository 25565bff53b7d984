//! Documents carried inline on listing pages
//!
//! Some listings embed whole articles as tab panes (`div.tab-pane` with an
//! id of `v-pills-<n>`) next to a pill navigation. Each non-empty pane is a
//! document of its own and needs no second fetch.

use crate::extract::text::{element_text, selector};
use crate::extract::{ContentExtractor, ExtractedDocument};
use scraper::Html;
use url::Url;

const PANE_SELECTOR: &str = "div.tab-pane[id^='v-pills-']";
const PANE_ID_PREFIX: &str = "v-pills-";

/// Panes with less visible text than this are placeholders
const MIN_PANE_TEXT: usize = 3;

/// One article found inside a listing page
#[derive(Debug, Clone)]
pub struct EmbeddedDocument {
    /// 1-based position among the page's panes, empty panes included
    pub index: usize,

    /// Pane markup, saved as the document's HTML artifact
    pub html: String,

    /// `source_url` is the listing URL with the pane id as fragment
    pub document: ExtractedDocument,
}

/// Extracts every embedded article on a listing page, in document order
pub fn find_embedded(
    document: &Html,
    page_url: &Url,
    extractor: &ContentExtractor,
) -> Vec<EmbeddedDocument> {
    let (Some(panes), Some(headings)) = (selector(PANE_SELECTOR), selector("h2")) else {
        return Vec::new();
    };

    document
        .select(&panes)
        .enumerate()
        .filter_map(|(i, pane)| {
            if element_text(pane).chars().count() < MIN_PANE_TEXT {
                return None;
            }

            let pane_id = pane.value().id().unwrap_or_default();
            let title_element = pane.select(&headings).find(|h| !element_text(*h).is_empty());
            let title = title_element
                .map(element_text)
                .unwrap_or_else(|| format!("Article {}", pane_id.trim_start_matches(PANE_ID_PREFIX)));

            let mut url = page_url.clone();
            url.set_fragment(Some(pane_id));

            match extractor.extract_within(document, pane, &url, &title, title_element) {
                Ok(extracted) => Some(EmbeddedDocument {
                    index: i + 1,
                    html: pane.html(),
                    document: extracted,
                }),
                Err(miss) => {
                    tracing::debug!("Embedded pane {} skipped: {}", url, miss);
                    None
                }
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ExtractionConfig;
    use crate::extract::ContentBlock;

    fn extractor() -> ContentExtractor {
        ContentExtractor::from_config(&ExtractionConfig::default())
    }

    fn page_url() -> Url {
        Url::parse("https://example.com/rasail/page/3/").unwrap()
    }

    #[test]
    fn test_panes_become_documents() {
        let html = Html::parse_document(
            r##"<div class="nav flex-column nav-pills">
                <a href="#v-pills-11">First</a><a href="#v-pills-12">Second</a>
            </div>
            <div class="tab-content">
                <div class="tab-pane fade show active" id="v-pills-11">
                    <h2>First Letter</h2>
                    <p>Opening of the first letter.</p>
                    <ul><li>Point one</li></ul>
                </div>
                <div class="tab-pane fade" id="v-pills-12">
                    <h2>Second Letter</h2>
                    <p>Body of the second letter.</p>
                </div>
            </div>"##,
        );

        let found = find_embedded(&html, &page_url(), &extractor());
        assert_eq!(found.len(), 2);

        let first = &found[0];
        assert_eq!(first.index, 1);
        assert_eq!(first.document.title, "First Letter");
        assert_eq!(
            first.document.source_url.as_str(),
            "https://example.com/rasail/page/3/#v-pills-11"
        );
        assert_eq!(
            first.document.blocks,
            vec![
                ContentBlock::Paragraph("Opening of the first letter.".to_string()),
                ContentBlock::ListItem {
                    ordered: false,
                    position: 1,
                    text: "Point one".to_string()
                },
            ]
        );
        assert!(first.html.contains("Opening of the first letter."));
        assert_eq!(found[1].index, 2);
    }

    #[test]
    fn test_empty_panes_skipped_but_counted() {
        let html = Html::parse_document(
            r#"<div class="tab-pane" id="v-pills-1"> </div>
               <div class="tab-pane" id="v-pills-2"><p>Untitled body text</p></div>"#,
        );

        let found = find_embedded(&html, &page_url(), &extractor());
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].index, 2);
        assert_eq!(found[0].document.title, "Article 2");
    }

    #[test]
    fn test_other_tab_panes_ignored() {
        let html = Html::parse_document(
            r#"<div class="tab-pane" id="profile"><p>Profile tab text</p></div>"#,
        );
        assert!(find_embedded(&html, &page_url(), &extractor()).is_empty());
    }
}
