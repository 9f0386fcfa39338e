//! Whole-content store with JSON snapshot persistence.
//!
//! [`ContentStore`] bundles the site registry, the page tree, redirects
//! and the blog. It is loaded from and saved to a single JSON document;
//! saves write a sibling temp file and rename it over the target so a
//! crash never leaves a half-written snapshot behind.

use std::fs;
use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::blog::{BlogCategory, BlogPost, BlogStore};
use crate::cascade::StalePath;
use crate::controller::{ControllerContext, ControllerRegistry, Vars};
use crate::error::ContentError;
use crate::menu::{MenuEntry, MenuQuery};
use crate::page::{FRONT_PAGE_SLUG, Page, SiteId};
use crate::redirect::{Redirect, Redirects};
use crate::settings::{SiteSettings, Sites};
use crate::tree::PageTree;

/// Current snapshot format version.
pub const SNAPSHOT_VERSION: u32 = 1;

/// Serialized form of a [`ContentStore`].
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct Snapshot {
    pub version: u32,
    #[serde(default)]
    pub sites: Vec<SiteSettings>,
    #[serde(default)]
    pub pages: Vec<Page>,
    #[serde(default)]
    pub redirects: Vec<Redirect>,
    #[serde(default)]
    pub blog_categories: Vec<BlogCategory>,
    #[serde(default)]
    pub blog_posts: Vec<BlogPost>,
}

/// Who is asking for a page.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Viewer {
    /// Sees only pages with `public_from <= now`.
    Anonymous,
    /// Sees every page regardless of publication time.
    Staff,
}

/// Outcome of resolving a request path.
#[derive(Debug, PartialEq, Eq)]
pub enum Resolution<'a> {
    /// Send the client to this target.
    Redirect(&'a str),
    /// Render this page.
    Page(&'a Page),
}

/// All content of all sites.
#[derive(Debug, Default)]
pub struct ContentStore {
    pub sites: Sites,
    pub pages: PageTree,
    pub redirects: Redirects,
    pub blog: BlogStore,
}

impl ContentStore {
    /// Load a snapshot file.
    pub fn load(path: &Path) -> Result<Self, ContentError> {
        let content = fs::read_to_string(path)?;
        let snapshot: Snapshot = serde_json::from_str(&content)?;
        let store = Self::from_snapshot(snapshot)?;

        tracing::info!(
            path = %path.display(),
            sites = store.sites.len(),
            pages = store.pages.len(),
            posts = store.blog.posts().len(),
            "Loaded content snapshot"
        );
        Ok(store)
    }

    /// Write a snapshot file atomically.
    pub fn save(&self, path: &Path) -> Result<(), ContentError> {
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent)?;
        }

        let json = serde_json::to_string_pretty(&self.to_snapshot())?;
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, json)?;
        fs::rename(&tmp, path)?;

        tracing::info!(path = %path.display(), pages = self.pages.len(), "Saved content snapshot");
        Ok(())
    }

    /// Rebuild a store, re-validating every index.
    ///
    /// Stored page paths are kept as-is; use [`ContentStore::check`] to find
    /// paths that disagree with their parent chain.
    pub fn from_snapshot(snapshot: Snapshot) -> Result<Self, ContentError> {
        if snapshot.version > SNAPSHOT_VERSION {
            return Err(ContentError::validation(
                "version",
                format!(
                    "snapshot version {} is newer than supported {SNAPSHOT_VERSION}",
                    snapshot.version
                ),
            ));
        }

        let mut sites = Sites::default();
        for site in snapshot.sites {
            sites.insert(site)?;
        }

        let pages = PageTree::from_pages(snapshot.pages)?;
        if let Some(page) = pages.pages().iter().find(|p| sites.get(p.site).is_err()) {
            return Err(ContentError::UnknownSite(page.site.to_string()));
        }

        let mut redirects = Redirects::default();
        for redirect in snapshot.redirects {
            redirects.insert(redirect)?;
        }

        let blog = BlogStore::from_parts(snapshot.blog_categories, snapshot.blog_posts)?;

        Ok(Self {
            sites,
            pages,
            redirects,
            blog,
        })
    }

    #[must_use]
    pub fn to_snapshot(&self) -> Snapshot {
        Snapshot {
            version: SNAPSHOT_VERSION,
            sites: self.sites.iter().cloned().collect(),
            pages: self.pages.pages().to_vec(),
            redirects: self.redirects.to_vec(),
            blog_categories: self.blog.categories().to_vec(),
            blog_posts: self.blog.posts().to_vec(),
        }
    }

    /// Resolve a request path within a site.
    ///
    /// Redirects win over pages. The empty path resolves to the front page.
    /// Anonymous viewers only see pages published at `at`; unpublished pages
    /// are reported as not found.
    pub fn resolve(
        &self,
        site: SiteId,
        path: &str,
        viewer: Viewer,
        at: DateTime<Utc>,
    ) -> Result<Resolution<'_>, ContentError> {
        let path = path.trim_matches('/');

        if let Some(target) = self.redirects.get(site, path) {
            if self.pages.get(site, path).is_ok() {
                tracing::warn!(site = %site, path, target, "Redirect shadows an existing page");
            }
            return Ok(Resolution::Redirect(target));
        }

        let lookup = if path.is_empty() { FRONT_PAGE_SLUG } else { path };
        let page = self.pages.get(site, lookup)?;
        if viewer == Viewer::Anonymous && !page.is_published(at) {
            return Err(ContentError::not_found("Page", lookup));
        }
        Ok(Resolution::Page(page))
    }

    /// Template variables of a page: the site controller's, then the page's.
    ///
    /// Page controller values replace site controller values on key clashes.
    pub fn page_vars(
        &self,
        registry: &ControllerRegistry,
        site: &SiteSettings,
        page: &Page,
        at: DateTime<Utc>,
        excerpt_max_chars: usize,
    ) -> Result<Vars, ContentError> {
        let ctx = ControllerContext {
            store: self,
            site,
            page,
            at,
            excerpt_max_chars,
        };

        let mut vars = Vars::new();
        for name in [&site.controller, &page.controller].into_iter().flatten() {
            vars.extend(registry.call(name, &ctx)?);
        }
        Ok(vars)
    }

    /// Menu of a site.
    pub fn menu(&self, site: SiteId, query: &MenuQuery<'_>) -> Result<Vec<MenuEntry>, ContentError> {
        self.sites.get(site)?;
        Ok(self.pages.build_menu(site, query))
    }

    /// Integrity check: pages whose stored path is stale.
    #[must_use]
    pub fn check(&self) -> Vec<StalePath> {
        self.pages.stale_paths()
    }
}
