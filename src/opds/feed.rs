//! OPDS 2.0 feed model — the JSON shape the catalog browser consumes.
//!
//! Only the parts the client displays are modeled: feed metadata with page
//! counts, the pagination rel links, and per-publication metadata including
//! optional LCP information. Links with unparseable URLs are skipped with a
//! warning rather than failing the whole feed.
use serde::Deserialize;
use thiserror::Error;
use url::Url;

use crate::lcp::LcpInfo;

#[derive(Debug, Error)]
pub enum FeedError {
    #[error("Invalid OPDS JSON: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Failed to read feed: {0}")]
    Io(#[from] std::io::Error),
}

// ============================================================================
// Raw JSON Shape
// ============================================================================

/// `rel` may be a single string or an array of strings.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum OneOrMany {
    One(String),
    Many(Vec<String>),
}

impl OneOrMany {
    fn contains(&self, rel: &str) -> bool {
        match self {
            Self::One(s) => s == rel,
            Self::Many(v) => v.iter().any(|s| s == rel),
        }
    }
}

#[derive(Debug, Deserialize)]
struct RawLink {
    rel: OneOrMany,
    href: String,
    title: Option<String>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(default, rename_all = "camelCase")]
struct RawFeedMetadata {
    title: Option<String>,
    number_of_items: Option<u64>,
    items_per_page: Option<u64>,
    current_page: Option<u64>,
}

#[derive(Debug, Deserialize)]
struct RawPublicationMetadata {
    title: String,
    identifier: Option<String>,
    description: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawPublication {
    metadata: RawPublicationMetadata,
    lcp: Option<LcpInfo>,
}

#[derive(Debug, Deserialize)]
struct RawFeed {
    #[serde(default)]
    metadata: RawFeedMetadata,
    #[serde(default)]
    links: Vec<RawLink>,
    #[serde(default)]
    publications: Vec<RawPublication>,
}

// ============================================================================
// Public Model
// ============================================================================

/// A resolved catalog link: destination URL plus optional display title.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OpdsLink {
    pub url: Url,
    pub title: Option<String>,
}

/// The pagination rel links of one catalog page. Each is optionally absent;
/// an absent previous/next is the expected terminal condition on the
/// first/last page, not an error.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PageLinks {
    pub first: Option<OpdsLink>,
    pub previous: Option<OpdsLink>,
    pub next: Option<OpdsLink>,
    pub last: Option<OpdsLink>,
}

/// Find the link with `rel` and resolve its href, against `base` when the
/// href is relative. Unparseable hrefs are skipped with a warning.
fn resolve_rel(links: &[RawLink], rel: &str, base: Option<&Url>) -> Option<OpdsLink> {
    let raw = links.iter().find(|l| l.rel.contains(rel))?;
    let url = match base {
        Some(base) => base.join(&raw.href),
        None => Url::parse(&raw.href),
    };
    match url {
        Ok(url) => Some(OpdsLink {
            url,
            title: raw.title.clone(),
        }),
        Err(error) => {
            tracing::warn!(rel, href = %raw.href, %error, "Skipping unparseable page link");
            None
        }
    }
}

impl PageLinks {
    fn from_raw(links: &[RawLink], base: Option<&Url>) -> Self {
        Self {
            first: resolve_rel(links, "first", base),
            previous: resolve_rel(links, "previous", base),
            next: resolve_rel(links, "next", base),
            last: resolve_rel(links, "last", base),
        }
    }
}

/// Page-count metadata of a catalog page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PageInfo {
    pub current_page: Option<u64>,
    pub number_of_items: Option<u64>,
    pub items_per_page: Option<u64>,
}

impl PageInfo {
    /// Total page count, when the feed carries both item totals.
    /// Ceiling division: 92 items at 10 per page is 10 pages.
    pub fn total_pages(&self) -> Option<u64> {
        let items = self.number_of_items?;
        let per_page = self.items_per_page?;
        if per_page == 0 {
            return None;
        }
        Some(items.div_ceil(per_page))
    }

    /// "2 / 10" style indicator, when enough metadata is present.
    pub fn indicator(&self) -> Option<String> {
        Some(format!("{} / {}", self.current_page?, self.total_pages()?))
    }
}

/// One publication entry as displayed in the catalog.
#[derive(Debug, Clone, PartialEq)]
pub struct Publication {
    pub title: String,
    pub identifier: Option<String>,
    pub description: Option<String>,
    pub lcp: Option<LcpInfo>,
}

/// One parsed catalog page.
#[derive(Debug, Clone, Default)]
pub struct OpdsFeed {
    pub title: String,
    /// The page's own address (rel "self"), when the feed declares it.
    pub self_url: Option<Url>,
    pub page_info: PageInfo,
    pub links: PageLinks,
    pub publications: Vec<Publication>,
}

impl OpdsFeed {
    /// Parse an OPDS 2.0 JSON document. Relative link hrefs are resolved
    /// against `base` when given.
    pub fn from_json(json: &str, base: Option<&Url>) -> Result<Self, FeedError> {
        let raw: RawFeed = serde_json::from_str(json)?;
        let feed = Self {
            title: raw.metadata.title.unwrap_or_default(),
            self_url: resolve_rel(&raw.links, "self", base).map(|l| l.url),
            page_info: PageInfo {
                current_page: raw.metadata.current_page,
                number_of_items: raw.metadata.number_of_items,
                items_per_page: raw.metadata.items_per_page,
            },
            links: PageLinks::from_raw(&raw.links, base),
            publications: raw
                .publications
                .into_iter()
                .map(|p| Publication {
                    title: p.metadata.title,
                    identifier: p.metadata.identifier,
                    description: p.metadata.description,
                    lcp: p.lcp,
                })
                .collect(),
        };
        tracing::debug!(
            title = %feed.title,
            publications = feed.publications.len(),
            page = ?feed.page_info.current_page,
            "Parsed OPDS feed"
        );
        Ok(feed)
    }
}

// ============================================================================
// Tests
// ============================================================================
