use std::collections::HashSet;
use std::path::PathBuf;
use url::Url;

/// Tracks which documents need fetching
///
/// Two layers: URLs already handed out in this run, and artifacts already
/// present on disk from earlier runs.
#[derive(Debug, Default)]
pub struct Deduplicator {
    seen: HashSet<String>,
}

impl Deduplicator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns true the first time a URL is offered during this run
    pub fn first_visit(&mut self, url: &Url) -> bool {
        self.seen.insert(url.as_str().to_string())
    }

    pub fn seen_count(&self) -> usize {
        self.seen.len()
    }

    /// Returns true if every artifact path is already a regular file
    ///
    /// An empty list is never "complete": with nothing to check the document
    /// must be fetched.
    pub fn all_exist(paths: &[PathBuf]) -> bool {
        !paths.is_empty() && paths.iter().all(|path| path.is_file())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn url(s: &str) -> Url {
        Url::parse(s).unwrap()
    }

    #[test]
    fn test_first_visit() {
        let mut dedup = Deduplicator::new();
        let visits: Vec<bool> = ["a", "b", "a", "c"]
            .iter()
            .map(|p| dedup.first_visit(&url(&format!("https://example.com/{}", p))))
            .collect();

        assert_eq!(visits, vec![true, true, false, true]);
        assert_eq!(dedup.seen_count(), 3);
    }

    #[test]
    fn test_all_exist() {
        let dir = TempDir::new().unwrap();
        let html = dir.path().join("doc.html");
        let text = dir.path().join("doc.txt");
        std::fs::write(&html, "x").unwrap();

        assert!(Deduplicator::all_exist(&[html.clone()]));
        assert!(!Deduplicator::all_exist(&[html.clone(), text.clone()]));

        std::fs::write(&text, "x").unwrap();
        assert!(Deduplicator::all_exist(&[html, text]));
        assert!(!Deduplicator::all_exist(&[]));
    }

    #[test]
    fn test_directory_is_not_an_artifact() {
        let dir = TempDir::new().unwrap();
        let text = dir.path().join("doc.txt");
        std::fs::create_dir(&text).unwrap();

        assert!(!Deduplicator::all_exist(&[text]));
    }
}
