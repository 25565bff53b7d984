use url::Url;

/// Schemes that never point at a fetchable document
const SKIPPED_SCHEMES: &[&str] = &["javascript:", "mailto:", "tel:", "data:"];

/// Resolves an href against the page it was found on
///
/// Returns None if the link should be excluded:
/// - javascript:, mailto:, tel: schemes
/// - data: URIs
/// - fragment-only links (same page anchors)
/// - invalid URLs
/// - non-HTTP(S) URLs after resolution
///
/// The fragment of the resolved URL is dropped, so `/a#comments` and `/a`
/// resolve to the same document.
///
/// # Examples
///
/// ```
/// use folio_harvest::url::resolve_link;
/// use url::Url;
///
/// let base = Url::parse("https://example.com/volume/01/").unwrap();
/// let url = resolve_link("../../articles/intro#top", &base).unwrap();
/// assert_eq!(url.as_str(), "https://example.com/articles/intro");
/// ```
pub fn resolve_link(href: &str, base_url: &Url) -> Option<Url> {
    let href = href.trim();

    if href.is_empty() || href.starts_with('#') {
        return None;
    }

    let lowered = href.to_ascii_lowercase();
    if SKIPPED_SCHEMES
        .iter()
        .any(|scheme| lowered.starts_with(scheme))
    {
        return None;
    }

    let mut absolute = base_url.join(href).ok()?;
    if absolute.scheme() != "http" && absolute.scheme() != "https" {
        return None;
    }
    absolute.set_fragment(None);

    Some(absolute)
}

/// Returns the last non-empty path segment of a URL
///
/// Trailing slashes are ignored, so both `/articles/intro` and
/// `/articles/intro/` yield `intro`.
pub fn last_path_segment(url: &Url) -> Option<&str> {
    url.path_segments()?
        .filter(|segment| !segment.is_empty())
        .last()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_url() -> Url {
        Url::parse("https://example.com/page").unwrap()
    }

    #[test]
    fn test_resolve_relative_link() {
        let url = resolve_link("/other", &base_url()).unwrap();
        assert_eq!(url.as_str(), "https://example.com/other");
    }

    #[test]
    fn test_resolve_absolute_link() {
        let url = resolve_link("https://other.com/page", &base_url()).unwrap();
        assert_eq!(url.as_str(), "https://other.com/page");
    }

    #[test]
    fn test_strip_fragment() {
        let url = resolve_link("/article#comments", &base_url()).unwrap();
        assert_eq!(url.as_str(), "https://example.com/article");
    }

    #[test]
    fn test_skip_special_schemes() {
        assert!(resolve_link("javascript:void(0)", &base_url()).is_none());
        assert!(resolve_link("JavaScript:void(0)", &base_url()).is_none());
        assert!(resolve_link("mailto:test@example.com", &base_url()).is_none());
        assert!(resolve_link("tel:+1234567890", &base_url()).is_none());
        assert!(resolve_link("data:text/html,<h1>x</h1>", &base_url()).is_none());
    }

    #[test]
    fn test_skip_fragment_only_and_empty() {
        assert!(resolve_link("#section", &base_url()).is_none());
        assert!(resolve_link("   ", &base_url()).is_none());
    }

    #[test]
    fn test_skip_non_http_after_resolution() {
        assert!(resolve_link("ftp://example.com/file", &base_url()).is_none());
    }

    #[test]
    fn test_last_path_segment() {
        let url = Url::parse("https://example.com/articles/intro/").unwrap();
        assert_eq!(last_path_segment(&url), Some("intro"));

        let url = Url::parse("https://example.com/articles/intro").unwrap();
        assert_eq!(last_path_segment(&url), Some("intro"));

        let url = Url::parse("https://example.com/").unwrap();
        assert_eq!(last_path_segment(&url), None);
    }
}
