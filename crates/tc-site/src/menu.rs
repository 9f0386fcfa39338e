//! Navigation menu building.
//!
//! Menus are built fresh per request from the page tree: visible children
//! of a parent, ordered by `order`, each with its own children down to a
//! bounded depth and an `active` flag relative to the requested URL.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::page::{PageId, SiteId};
use crate::tree::PageTree;

/// Default number of child levels below the top-level entries.
pub const DEFAULT_MENU_DEPTH: usize = 2;

/// Derived navigation node.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct MenuEntry {
    /// Whether the entry matches the requested URL.
    pub active: bool,
    /// Link target with leading slash.
    pub href: String,
    /// Display text.
    pub text: String,
    /// Child entries in menu order.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<MenuEntry>,
}

impl MenuEntry {
    /// CSS class for templates: `"active"` or empty.
    #[must_use]
    pub fn active_css(&self) -> &'static str {
        if self.active { "active" } else { "" }
    }
}

/// Parameters of one menu build.
#[derive(Clone, Debug)]
pub struct MenuQuery<'a> {
    /// Parent whose children form the top level (`None` for the site root).
    pub parent: Option<PageId>,
    /// Only pages with `visible_from <= at` are listed.
    pub at: DateTime<Utc>,
    /// Requested URL (with leading slash) used for the active flag.
    pub current_url: Option<&'a str>,
    /// Child levels below the top-level entries; 0 yields leaf entries only.
    pub depth: usize,
}

impl Default for MenuQuery<'_> {
    fn default() -> Self {
        Self::at(Utc::now())
    }
}

impl<'a> MenuQuery<'a> {
    /// Root menu as of `at` with the default depth.
    #[must_use]
    pub fn at(at: DateTime<Utc>) -> Self {
        Self {
            parent: None,
            at,
            current_url: None,
            depth: DEFAULT_MENU_DEPTH,
        }
    }

    #[must_use]
    pub fn parent(mut self, parent: PageId) -> Self {
        self.parent = Some(parent);
        self
    }

    #[must_use]
    pub fn current_url(mut self, url: &'a str) -> Self {
        self.current_url = Some(url);
        self
    }

    #[must_use]
    pub fn depth(mut self, depth: usize) -> Self {
        self.depth = depth;
        self
    }
}

impl PageTree {
    /// Build the navigation menu of a site.
    ///
    /// Recursion stops after `query.depth` child levels regardless of the
    /// tree's shape, so the result is finite even for corrupted trees.
    #[must_use]
    pub fn build_menu(&self, site: SiteId, query: &MenuQuery<'_>) -> Vec<MenuEntry> {
        self.menu_level(site, query.parent, query, query.depth)
    }

    fn menu_level(
        &self,
        site: SiteId,
        parent: Option<PageId>,
        query: &MenuQuery<'_>,
        child_levels: usize,
    ) -> Vec<MenuEntry> {
        self.visible_children_of(site, parent, query.at)
            .into_iter()
            .map(|page| {
                let children = if child_levels > 0 {
                    self.menu_level(site, Some(page.id), query, child_levels - 1)
                } else {
                    Vec::new()
                };

                let href = page.local_url();
                let active = match query.current_url {
                    Some(url) if children.is_empty() => url == href,
                    Some(url) => url.starts_with(&href),
                    None => false,
                };

                MenuEntry {
                    active,
                    href,
                    text: page.menu_text().to_owned(),
                    children,
                }
            })
            .collect()
    }
}
