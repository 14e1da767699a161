//! Offline catalog store.
//!
//! The client browses pre-fetched catalog pages: each page is an OPDS 2.0
//! JSON document on disk, keyed by its `self` link. Navigation resolves a
//! page-link URL against this store instead of the network.
use std::collections::HashMap;
use std::path::Path;

use url::Url;

use super::feed::{FeedError, OpdsFeed};

/// A set of catalog pages addressable by URL.
#[derive(Debug, Default)]
pub struct CatalogStore {
    pages: HashMap<Url, OpdsFeed>,
    /// The page browsing starts on: the first loaded page without a
    /// previous link, falling back to the first loaded page.
    start: Option<Url>,
}

impl CatalogStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a parsed page. Pages without a `self` link cannot be addressed
    /// and are rejected with a warning.
    pub fn insert(&mut self, feed: OpdsFeed) -> bool {
        let Some(url) = feed.self_url.clone() else {
            tracing::warn!(title = %feed.title, "Dropping catalog page without a self link");
            return false;
        };
        let start_is_entry = self
            .start
            .as_ref()
            .and_then(|s| self.pages.get(s))
            .is_some_and(|s| s.links.previous.is_none());
        if self.start.is_none() || (!start_is_entry && feed.links.previous.is_none()) {
            self.start = Some(url.clone());
        }
        if self.pages.insert(url.clone(), feed).is_some() {
            tracing::debug!(url = %url, "Replaced catalog page");
        }
        true
    }

    /// Parse one JSON document and insert it. The page's own `self` URL
    /// serves as the base for its relative links.
    pub fn load_json(&mut self, json: &str) -> Result<bool, FeedError> {
        // Two-pass parse: the first pass only recovers the self link so the
        // second can resolve relative hrefs against it.
        let base = OpdsFeed::from_json(json, None)?.self_url;
        let feed = OpdsFeed::from_json(json, base.as_ref())?;
        Ok(self.insert(feed))
    }

    /// Load a page file, or every `*.json` file when `path` is a directory.
    pub fn load_path(&mut self, path: &Path) -> Result<usize, FeedError> {
        let mut loaded = 0;
        if path.is_dir() {
            let mut entries: Vec<_> = std::fs::read_dir(path)?
                .filter_map(|e| e.ok())
                .map(|e| e.path())
                .filter(|p| p.extension().is_some_and(|ext| ext == "json"))
                .collect();
            entries.sort();
            for entry in entries {
                let json = std::fs::read_to_string(&entry)?;
                match self.load_json(&json) {
                    Ok(true) => loaded += 1,
                    Ok(false) => {}
                    Err(error) => {
                        tracing::warn!(path = %entry.display(), %error, "Skipping unparseable catalog page");
                    }
                }
            }
        } else {
            let json = std::fs::read_to_string(path)?;
            if self.load_json(&json)? {
                loaded += 1;
            }
        }
        tracing::info!(path = %path.display(), pages = loaded, "Loaded catalog");
        Ok(loaded)
    }

    pub fn get(&self, url: &Url) -> Option<&OpdsFeed> {
        self.pages.get(url)
    }

    pub fn start_url(&self) -> Option<&Url> {
        self.start.as_ref()
    }

    pub fn len(&self) -> usize {
        self.pages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pages.is_empty()
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn page(n: u32, total: u32) -> String {
        let mut links = vec![format!(
            r#"{{"rel": "self", "href": "https://example.com/catalog?page={}"}}"#,
            n
        )];
        if n > 1 {
            links.push(format!(
                r#"{{"rel": "previous", "href": "https://example.com/catalog?page={}"}}"#,
                n - 1
            ));
        }
        if n < total {
            links.push(format!(
                r#"{{"rel": "next", "href": "https://example.com/catalog?page={}"}}"#,
                n + 1
            ));
        }
        format!(
            r#"{{"metadata": {{"title": "Page {}"}}, "links": [{}], "publications": []}}"#,
            n,
            links.join(",")
        )
    }

    fn url(n: u32) -> Url {
        Url::parse(&format!("https://example.com/catalog?page={}", n)).unwrap()
    }

    #[test]
    fn test_pages_addressable_by_self_url() {
        let mut store = CatalogStore::new();
        store.load_json(&page(1, 3)).unwrap();
        store.load_json(&page(2, 3)).unwrap();

        assert_eq!(store.len(), 2);
        assert_eq!(store.get(&url(2)).unwrap().title, "Page 2");
        assert!(store.get(&url(3)).is_none());
    }

    #[test]
    fn test_start_is_page_without_previous_link() {
        let mut store = CatalogStore::new();
        // Insert out of order: page 2 first
        store.load_json(&page(2, 3)).unwrap();
        store.load_json(&page(1, 3)).unwrap();
        store.load_json(&page(3, 3)).unwrap();

        assert_eq!(store.start_url(), Some(&url(1)));
    }

    #[test]
    fn test_page_without_self_link_is_dropped() {
        let mut store = CatalogStore::new();
        let inserted = store
            .load_json(r#"{"metadata": {"title": "Orphan"}, "links": [], "publications": []}"#)
            .unwrap();
        assert!(!inserted);
        assert!(store.is_empty());
    }

    #[test]
    fn test_relative_links_resolved_against_self() {
        let mut store = CatalogStore::new();
        let json = r#"{
            "metadata": {"title": "Page 1"},
            "links": [
                {"rel": "self", "href": "https://example.com/catalog?page=1"},
                {"rel": "next", "href": "?page=2"}
            ]
        }"#;
        store.load_json(json).unwrap();
        let feed = store.get(&url(1)).unwrap();
        assert_eq!(
            feed.links.next.as_ref().unwrap().url.as_str(),
            "https://example.com/catalog?page=2"
        );
    }

    #[test]
    fn test_load_directory_of_pages() {
        let dir = std::env::temp_dir().join("folio_store_test_dir");
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join("p1.json"), page(1, 2)).unwrap();
        std::fs::write(dir.join("p2.json"), page(2, 2)).unwrap();
        std::fs::write(dir.join("notes.txt"), "not a feed").unwrap();

        let mut store = CatalogStore::new();
        let loaded = store.load_path(&dir).unwrap();
        assert_eq!(loaded, 2);
        assert_eq!(store.start_url(), Some(&url(1)));

        std::fs::remove_dir_all(&dir).ok();
    }
}
