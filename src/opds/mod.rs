//! OPDS catalog browsing: the feed model and page navigation.
//!
//! - `feed` - OPDS 2.0 JSON parsing into display models
//! - `pagination` - Directional shortcut consumer translating fires into
//!   route pushes
//! - `store` - Pre-fetched page set the client browses offline

mod feed;
mod pagination;
mod store;

pub use feed::{FeedError, OpdsFeed, OpdsLink, PageInfo, PageLinks, Publication};
pub use pagination::{resolve, PageDirection, PageNavigation};
pub use store::CatalogStore;
