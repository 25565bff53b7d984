//! Filesystem-safe names derived from document titles and URLs

use crate::url::last_path_segment;
use sha2::{Digest, Sha256};
use url::Url;

/// Highest code point treated as Latin script (end of Latin Extended-B)
const LATIN_LIMIT: char = '\u{024F}';

/// Hex characters of the URL hash used when nothing else is usable
const HASH_PREFIX_LEN: usize = 16;

const DOCUMENT_STEM: &str = "document";
const ATTACHMENT_STEM: &str = "attachment";

/// Derives a stable filename for a document
///
/// Latin-script titles are used directly; anything else (including
/// Arabic titles, which would otherwise be stripped to nothing) falls back to
/// the last segment of the URL. The result is at most `max_len` characters
/// before the extension, which is appended unless already present.
///
/// # Example
///
/// ```
/// use folio_harvest::output::sanitize_filename;
/// use url::Url;
///
/// let url = Url::parse("https://example.com/articles/42").unwrap();
/// assert_eq!(sanitize_filename(&url, Some("A/B: Test*?"), 20, ".html"), "AB_Test.html");
/// ```
pub fn sanitize_filename(url: &Url, title: Option<&str>, max_len: usize, extension: &str) -> String {
    derive(url, title, max_len, extension, DOCUMENT_STEM)
}

/// Filename for an attachment, always ending in `.pdf`
pub fn attachment_filename(url: &Url, max_len: usize) -> String {
    derive(url, None, max_len, ".pdf", ATTACHMENT_STEM)
}

/// Stem shared by all artifacts of one document
pub fn document_stem(page: u32, index: usize, slug: &str) -> String {
    format!("page{}_article{}_{}", page, index, slug)
}

fn derive(url: &Url, title: Option<&str>, max_len: usize, extension: &str, stem: &str) -> String {
    let from_title = title
        .map(str::trim)
        .filter(|t| !t.is_empty() && is_latin(t))
        .map(clean_title);

    let mut name = from_title
        .filter(|name| !name.is_empty())
        .or_else(|| last_path_segment(url).map(clean_segment))
        .unwrap_or_default();

    if name.is_empty() || name.starts_with('.') {
        name = format!("{}_{}", stem, url_hash(url));
    }

    let mut name = truncate(&name, max_len).to_string();
    if !extension.is_empty() && !name.to_ascii_lowercase().ends_with(&extension.to_ascii_lowercase()) {
        name.push_str(extension);
    }
    name
}

fn is_latin(text: &str) -> bool {
    text.chars().all(|c| c <= LATIN_LIMIT)
}

fn clean_title(title: &str) -> String {
    let kept: String = title
        .chars()
        .filter(|c| c.is_alphanumeric() || c.is_whitespace() || *c == '-' || *c == '_')
        .collect();
    kept.split_whitespace().collect::<Vec<_>>().join("_")
}

fn clean_segment(segment: &str) -> String {
    segment
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.' | '%'))
        .collect()
}

fn url_hash(url: &Url) -> String {
    let digest = Sha256::digest(url.as_str().as_bytes());
    let mut hash = hex::encode(digest);
    hash.truncate(HASH_PREFIX_LEN);
    hash
}

/// Cuts to at most `max_chars` characters, never inside a code point
fn truncate(name: &str, max_chars: usize) -> &str {
    match name.char_indices().nth(max_chars) {
        Some((byte_index, _)) => &name[..byte_index],
        None => name,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn url(s: &str) -> Url {
        Url::parse(s).unwrap()
    }

    fn is_safe(name: &str, max_len: usize, extension: &str) -> bool {
        let Some(stem) = name.strip_suffix(extension) else {
            return false;
        };
        let len = stem.chars().count();
        (1..=max_len).contains(&len)
            && stem
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, ' ' | '_' | '.' | '-'))
    }

    #[test]
    fn test_latin_title_sanitized() {
        let name = sanitize_filename(&url("https://example.com/a/42"), Some("A/B: Test*?"), 20, ".html");
        assert_eq!(name, "AB_Test.html");
        assert!(is_safe(&name, 20, ".html"));
    }

    #[test]
    fn test_whitespace_runs_collapse() {
        let name = sanitize_filename(&url("https://example.com/x"), Some("  The   Book -  Part_2 "), 100, ".txt");
        assert_eq!(name, "The_Book_-_Part_2.txt");
    }

    #[test]
    fn test_non_latin_title_uses_url_segment() {
        let name = sanitize_filename(
            &url("https://example.com/articles/usul-al-fiqh/"),
            Some("أصول الفقه"),
            100,
            ".html",
        );
        assert_eq!(name, "usul-al-fiqh.html");
    }

    #[test]
    fn test_percent_encoded_segment_kept() {
        let name = sanitize_filename(&url("https://example.com/%D8%A7"), None, 100, ".txt");
        assert_eq!(name, "%D8%A7.txt");
    }

    #[test]
    fn test_hash_fallback() {
        let target = url("https://example.com/");
        let name = sanitize_filename(&target, Some("!!!"), 100, ".html");
        assert!(name.starts_with("document_"));
        assert_eq!(name.len(), "document_".len() + HASH_PREFIX_LEN + ".html".len());

        // Deterministic
        assert_eq!(name, sanitize_filename(&target, Some("!!!"), 100, ".html"));
    }

    #[test]
    fn test_dot_prefixed_segment_falls_back() {
        let name = sanitize_filename(&url("https://example.com/.hidden"), None, 100, ".html");
        assert!(name.starts_with("document_"));
    }

    #[test]
    fn test_truncation_is_char_safe() {
        let title = "Étude ".repeat(20);
        let name = sanitize_filename(&url("https://example.com/x"), Some(&title), 9, ".txt");
        assert_eq!(name, "Étude_Étu.txt");
    }

    #[test]
    fn test_extension_not_doubled() {
        let name = attachment_filename(&url("https://example.com/files/Book.PDF"), 100);
        assert_eq!(name, "Book.PDF");

        let name = attachment_filename(&url("https://example.com/get"), 100);
        assert_eq!(name, "get.pdf");
    }

    #[test]
    fn test_document_stem() {
        assert_eq!(document_stem(3, 7, "intro"), "page3_article7_intro");
    }

    #[test]
    fn test_empty_extension() {
        let name = sanitize_filename(&url("https://example.com/x"), Some("Intro"), 100, "");
        assert_eq!(name, "Intro");
    }
}
