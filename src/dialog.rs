//! Modal dialogs and the publication-info description panel.
//!
//! One dialog is visible at a time; opening a new one replaces the current.
//! The description panel tracks its own expand/collapse state: the toggle is
//! only offered when the measured content actually overflows the viewport.
use crate::lcp::{catalog_controls, CatalogControls};
use crate::opds::Publication;

// ============================================================================
// Description Panel
// ============================================================================

/// Expand/collapse state of the publication description.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DescriptionPanel {
    expanded: bool,
    needs_toggle: bool,
}

impl DescriptionPanel {
    /// Record the measured geometry of the rendered description. The toggle
    /// is offered only when the content overflows the collapsed viewport;
    /// when it no longer does, a stale expanded state is cleared.
    pub fn measure(&mut self, content_lines: usize, viewport_lines: usize) {
        self.needs_toggle = content_lines > viewport_lines;
        if !self.needs_toggle {
            self.expanded = false;
        }
    }

    /// Flip between collapsed and expanded. No-op while the toggle is not
    /// offered.
    pub fn toggle(&mut self) {
        if self.needs_toggle {
            self.expanded = !self.expanded;
        }
    }

    pub fn is_expanded(&self) -> bool {
        self.expanded
    }

    pub fn offers_toggle(&self) -> bool {
        self.needs_toggle
    }
}

// ============================================================================
// Dialogs
// ============================================================================

/// A modal dialog, carrying the publication it is about.
#[derive(Debug, Clone, PartialEq)]
pub enum Dialog {
    PublicationInfo {
        publication: Publication,
        description: DescriptionPanel,
    },
    DeleteConfirm(Publication),
    LcpRenewConfirm(Publication),
    LcpReturnConfirm(Publication),
}

impl Dialog {
    pub fn publication_info(publication: Publication) -> Self {
        Self::PublicationInfo {
            publication,
            description: DescriptionPanel::default(),
        }
    }

    pub fn publication(&self) -> &Publication {
        match self {
            Self::PublicationInfo { publication, .. } => publication,
            Self::DeleteConfirm(p) | Self::LcpRenewConfirm(p) | Self::LcpReturnConfirm(p) => p,
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            Self::PublicationInfo { .. } => "About this publication",
            Self::DeleteConfirm(_) => "Delete publication?",
            Self::LcpRenewConfirm(_) => "Renew loan?",
            Self::LcpReturnConfirm(_) => "Return loan?",
        }
    }

    /// Controls to render for this dialog's publication.
    pub fn controls(&self) -> CatalogControls<'_> {
        catalog_controls(self.publication().lcp.as_ref())
    }
}

/// The dialog layer: at most one open dialog.
#[derive(Debug, Default)]
pub struct DialogController {
    current: Option<Dialog>,
}

impl DialogController {
    pub fn open(&mut self, dialog: Dialog) {
        if self.current.is_some() {
            tracing::debug!(next = dialog.title(), "Replacing open dialog");
        }
        self.current = Some(dialog);
    }

    /// Close the open dialog. Returns whether one was open.
    pub fn close(&mut self) -> bool {
        self.current.take().is_some()
    }

    pub fn current(&self) -> Option<&Dialog> {
        self.current.as_ref()
    }

    pub fn current_mut(&mut self) -> Option<&mut Dialog> {
        self.current.as_mut()
    }

    pub fn is_open(&self) -> bool {
        self.current.is_some()
    }
}

// ============================================================================
// Tests
// ============================================================================
