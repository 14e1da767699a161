//! folio — a terminal OPDS catalog browser.
//!
//! The engineering core is the keyboard shortcut subsystem in [`keyboard`]:
//! a descriptor table built from defaults plus config overrides, an
//! install-once dispatcher, a handler registry with owner-scoped batch
//! removal, and an RAII binding session that resyncs when the map changes.
//! Everything else is its consumer: catalog page navigation, dialogs, and
//! the event loop.
//!
//! - [`keyboard`] - Shortcut descriptors, registry, dispatcher, bindings
//! - [`opds`] - OPDS 2.0 feed model, offline page store, page navigation
//! - [`lcp`] - LCP license status and catalog control resolution
//! - [`dialog`] - Modal dialogs and the description panel
//! - [`routing`] - Routes and navigation history
//! - [`settings`] - Locale settings
//! - [`config`] - config.toml parsing
//! - [`app`] - Application state and composition root
//! - [`ui`] - Event loop, input routing, renderer

pub mod app;
pub mod config;
pub mod dialog;
pub mod keyboard;
pub mod lcp;
pub mod opds;
pub mod routing;
pub mod settings;
pub mod ui;
