use scraper::{ElementRef, Selector};

/// Parses a CSS selector, logging instead of failing on invalid input
///
/// Built-in selectors are constants; configured ones were validated at load
/// time, so a failure here only ever drops one heuristic.
pub(crate) fn selector(css: &str) -> Option<Selector> {
    match Selector::parse(css) {
        Ok(selector) => Some(selector),
        Err(e) => {
            tracing::warn!("Ignoring invalid selector '{}': {}", css, e);
            None
        }
    }
}

/// Collapses every whitespace run to a single space and trims the ends
pub(crate) fn collapse_whitespace(raw: &str) -> String {
    raw.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Visible text of an element, whitespace-normalized
pub(crate) fn element_text(element: ElementRef<'_>) -> String {
    collapse_whitespace(&element.text().collect::<String>())
}

#[cfg(test)]
mod tests {
    use super::*;
    use scraper::Html;

    #[test]
    fn test_collapse_whitespace() {
        assert_eq!(collapse_whitespace("  a \n\t b  "), "a b");
        assert_eq!(collapse_whitespace("   "), "");
    }

    #[test]
    fn test_element_text_joins_children() {
        let html = Html::parse_fragment("<p>Hello <b>big</b>\n world</p>");
        let p = html.select(&selector("p").unwrap()).next().unwrap();
        assert_eq!(element_text(p), "Hello big world");
    }

    #[test]
    fn test_invalid_selector_is_none() {
        assert!(selector("div[").is_none());
    }
}
