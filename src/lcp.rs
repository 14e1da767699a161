//! LCP license-status (LSD) model and catalog control resolution.
//!
//! Loaned publications carry an LSD status document; the publication-info
//! dialog decides which controls to offer from it: reading is only offered
//! while the license is usable, renew/return only when the status document
//! links those interactions, and delete is always available.
use chrono::{DateTime, Utc};
use serde::Deserialize;
use url::Url;

/// Status values of an LSD status document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LsdStatus {
    Ready,
    Active,
    Revoked,
    Returned,
    Cancelled,
    Expired,
}

/// An interaction link from the status document (rel "renew", "return", ...).
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LsdLink {
    pub rel: String,
    pub href: Url,
}

/// LCP information attached to a publication.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Default)]
#[serde(default, rename_all = "camelCase")]
pub struct LcpInfo {
    pub status: Option<LsdStatus>,
    pub links: Vec<LsdLink>,
    pub rights_end: Option<DateTime<Utc>>,
}

impl LcpInfo {
    pub fn link_with_rel(&self, rel: &str) -> Option<&LsdLink> {
        self.links.iter().find(|l| l.rel == rel)
    }
}

// ============================================================================
// Catalog Controls
// ============================================================================

/// The controls the publication-info dialog offers for one publication.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CatalogControls<'a> {
    /// "Read" is offered when there is no LCP status at all, or the license
    /// is Ready/Active.
    pub can_read: bool,
    pub renew: Option<&'a LsdLink>,
    pub return_link: Option<&'a LsdLink>,
    /// Delete is always offered.
    pub can_delete: bool,
}

/// Resolve the control set for a publication's LCP info (absent for
/// non-protected publications).
pub fn catalog_controls(lcp: Option<&LcpInfo>) -> CatalogControls<'_> {
    let can_read = match lcp.and_then(|l| l.status) {
        None => true,
        Some(LsdStatus::Ready | LsdStatus::Active) => true,
        Some(_) => false,
    };
    CatalogControls {
        can_read,
        renew: lcp.and_then(|l| l.link_with_rel("renew")),
        return_link: lcp.and_then(|l| l.link_with_rel("return")),
        can_delete: true,
    }
}

// ============================================================================
// Tests
// ============================================================================
