//! Plain-text rendering of extracted documents
//!
//! This is the format consumed by the downstream document converters: one
//! document per file, UTF-8, header block first.

use crate::extract::{ContentBlock, ExtractedDocument};

const HEADER_RULE_WIDTH: usize = 50;
const RULE_WIDTH: usize = 30;

/// Listing metadata carried over from the link the document was found by
#[derive(Debug, Clone, Copy, Default)]
pub struct DocumentMeta<'a> {
    pub date: Option<&'a str>,
    pub category: Option<&'a str>,
}

/// Renders a document as plain text
///
/// ```text
/// Title
/// Date: 2021-03-04 | Category: Tafsir
///
/// ==================================================
///
/// Heading
///
/// Paragraph text
///
/// • unordered item
/// 1. ordered item
/// ```
pub fn render_text(document: &ExtractedDocument, meta: DocumentMeta<'_>) -> String {
    let mut out = String::new();

    out.push_str(&document.title);
    out.push('\n');

    let meta_parts: Vec<String> = [("Date", meta.date), ("Category", meta.category)]
        .into_iter()
        .filter_map(|(label, value)| value.map(|v| format!("{}: {}", label, v)))
        .collect();
    if !meta_parts.is_empty() {
        out.push_str(&meta_parts.join(" | "));
        out.push('\n');
    }

    out.push('\n');
    out.push_str(&"=".repeat(HEADER_RULE_WIDTH));
    out.push_str("\n\n");

    let mut in_list = false;

    for block in &document.blocks {
        let list_position = match block {
            ContentBlock::ListItem { position, .. } => Some(*position),
            _ => None,
        };

        // A run of items ends at any other block or where the next list begins
        if in_list && list_position.map_or(true, |position| position == 1) {
            out.push('\n');
        }

        match block {
            ContentBlock::Heading { text, .. } | ContentBlock::Paragraph(text) => {
                out.push_str(&format!("{}\n\n", text));
            }
            ContentBlock::ListItem {
                ordered: true,
                position,
                text,
            } => {
                out.push_str(&format!("{}. {}\n", position, text));
            }
            ContentBlock::ListItem {
                ordered: false,
                text,
                ..
            } => {
                out.push_str(&format!("• {}\n", text));
            }
            ContentBlock::Rule => {
                out.push_str(&"-".repeat(RULE_WIDTH));
                out.push_str("\n\n");
            }
            ContentBlock::Quote(text) => {
                out.push_str(&format!("> {}\n\n", text));
            }
        }

        in_list = list_position.is_some();
    }

    out
}
