//! Application state.
//!
//! Shared state for all request handlers.

use tc_site::{ContentStore, ControllerRegistry, SiteId};

/// Application state shared across all handlers.
pub(crate) struct AppState {
    /// Sites, pages, redirects and blog posts.
    pub(crate) store: ContentStore,
    /// Controllers available to pages and sites.
    pub(crate) controllers: ControllerRegistry,
    /// Site served when the Host header matches no site.
    pub(crate) default_site: Option<SiteId>,
    /// Default menu depth when the request does not give one.
    pub(crate) menu_depth: usize,
    /// Length of automatic blog excerpts.
    pub(crate) excerpt_max_chars: usize,
    /// Application version for cache invalidation.
    pub(crate) version: String,
}
