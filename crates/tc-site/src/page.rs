//! Page data model and path grammar.
//!
//! Paths are stored without a leading slash (`"about"`, `"about/team"`);
//! the leading slash is only added at the presentation boundary by
//! [`Page::local_url`] and [`Page::absolute_url`].

use std::fmt;
use std::sync::LazyLock;

use chrono::{DateTime, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::ContentError;
use crate::settings::SiteSettings;
use crate::slug::MAX_SLUG_LEN;

/// Maximum stored path length.
pub const MAX_PATH_LEN: usize = 1023;

/// Maximum title and menu text length.
pub const MAX_TITLE_LEN: usize = 1023;

/// Slug of the root page served at `/`.
pub const FRONT_PAGE_SLUG: &str = "front-page";

static SLUG_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^[a-z0-9-]+$").unwrap());
static PATH_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-z0-9-]+(/[a-z0-9-]+)*$").unwrap());

/// Tenant identifier. All uniqueness and tree relationships are scoped per site.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SiteId(pub u32);

impl fmt::Display for SiteId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Page identifier: index into the page arena.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PageId(pub usize);

impl fmt::Display for PageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Stored content page.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Page {
    /// Arena identifier.
    pub id: PageId,
    /// Owning site.
    pub site: SiteId,
    /// Parent page in the same site, `None` for top-level pages.
    pub parent: Option<PageId>,
    /// URL segment, unique among siblings.
    pub slug: String,
    /// Derived full path (`parent.path/slug`), unique per site.
    pub path: String,
    /// Page title.
    pub title: String,
    /// Menu label; the title is used when empty.
    #[serde(default)]
    pub override_menu_text: String,
    /// Template name; the site's page template is used when empty.
    #[serde(default)]
    pub override_page_template: String,
    /// Name of a registered controller adding template variables.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub controller: Option<String>,
    /// Sibling sort key (ascending).
    #[serde(default)]
    pub order: i32,
    /// Rich-text body.
    #[serde(default)]
    pub body: String,
    /// Readable by anonymous visitors from this moment on.
    #[serde(default)]
    pub public_from: Option<DateTime<Utc>>,
    /// Listed in menus from this moment on.
    #[serde(default)]
    pub visible_from: Option<DateTime<Utc>>,
}

impl Page {
    /// Menu label: `override_menu_text` if set, otherwise the title.
    #[must_use]
    pub fn menu_text(&self) -> &str {
        if self.override_menu_text.is_empty() {
            &self.title
        } else {
            &self.override_menu_text
        }
    }

    /// Whether this is the site's front page (top-level `front-page`).
    #[must_use]
    pub fn is_front_page(&self) -> bool {
        self.parent.is_none() && self.slug == FRONT_PAGE_SLUG
    }

    /// Site-relative URL with leading slash; `/` for the front page.
    #[must_use]
    pub fn local_url(&self) -> String {
        if self.is_front_page() {
            "/".to_owned()
        } else {
            format!("/{}", self.path)
        }
    }

    /// Protocol-relative URL on the given domain.
    #[must_use]
    pub fn absolute_url(&self, domain: &str) -> String {
        let path = if self.is_front_page() { "" } else { &self.path };
        format!("//{domain}/{path}")
    }

    /// Path of the parent page (everything before the last segment).
    #[must_use]
    pub fn parent_path(&self) -> &str {
        self.path.rsplit_once('/').map_or("", |(parent, _)| parent)
    }

    /// Template used to render this page.
    #[must_use]
    pub fn template<'a>(&'a self, settings: &'a SiteSettings) -> &'a str {
        if self.override_page_template.is_empty() {
            &settings.page_template
        } else {
            &self.override_page_template
        }
    }

    /// Whether anonymous visitors may read this page at `t`.
    #[must_use]
    pub fn is_published(&self, t: DateTime<Utc>) -> bool {
        self.public_from.is_some_and(|from| from <= t)
    }

    /// Whether the page is listed in menus at `t`.
    #[must_use]
    pub fn is_visible(&self, t: DateTime<Utc>) -> bool {
        self.visible_from.is_some_and(|from| from <= t)
    }
}

/// Fields for a page that has not been stored yet.
///
/// Leave `slug` empty to derive it from the title.
#[derive(Clone, Debug, Default)]
pub struct PageDraft {
    pub site: Option<SiteId>,
    pub parent: Option<PageId>,
    pub slug: String,
    pub title: String,
    pub override_menu_text: String,
    pub override_page_template: String,
    pub controller: Option<String>,
    pub order: i32,
    pub body: String,
    pub public_from: Option<DateTime<Utc>>,
    pub visible_from: Option<DateTime<Utc>>,
}

impl PageDraft {
    /// Start a draft with a title in the given site.
    #[must_use]
    pub fn new(site: SiteId, title: impl Into<String>) -> Self {
        Self {
            site: Some(site),
            title: title.into(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn slug(mut self, slug: impl Into<String>) -> Self {
        self.slug = slug.into();
        self
    }

    #[must_use]
    pub fn parent(mut self, parent: PageId) -> Self {
        self.parent = Some(parent);
        self
    }

    #[must_use]
    pub fn order(mut self, order: i32) -> Self {
        self.order = order;
        self
    }

    #[must_use]
    pub fn menu_text(mut self, text: impl Into<String>) -> Self {
        self.override_menu_text = text.into();
        self
    }

    #[must_use]
    pub fn body(mut self, body: impl Into<String>) -> Self {
        self.body = body.into();
        self
    }

    #[must_use]
    pub fn controller(mut self, name: impl Into<String>) -> Self {
        self.controller = Some(name.into());
        self
    }

    /// Publish and show in menus from `t`.
    #[must_use]
    pub fn visible_from(mut self, t: DateTime<Utc>) -> Self {
        self.public_from = Some(t);
        self.visible_from = Some(t);
        self
    }

    pub(crate) fn into_page(self, id: PageId, site: SiteId) -> Page {
        Page {
            id,
            site,
            parent: self.parent,
            slug: self.slug,
            path: String::new(),
            title: self.title,
            override_menu_text: self.override_menu_text,
            override_page_template: self.override_page_template,
            controller: self.controller,
            order: self.order,
            body: self.body,
            public_from: self.public_from,
            visible_from: self.visible_from,
        }
    }
}

/// Join a parent path and a slug into a full path.
///
/// Top-level pages (no parent path) use the bare slug.
#[must_use]
pub fn build_path(parent_path: Option<&str>, slug: &str) -> String {
    match parent_path {
        Some(parent) => format!("{parent}/{slug}"),
        None => slug.to_owned(),
    }
}

/// Check a slug against `[a-z0-9-]+` and the length limit.
pub fn validate_slug(slug: &str) -> Result<(), ContentError> {
    if slug.is_empty() {
        return Err(ContentError::validation("slug", "cannot be empty"));
    }
    if slug.len() > MAX_SLUG_LEN {
        return Err(ContentError::validation(
            "slug",
            format!("cannot exceed {MAX_SLUG_LEN} characters"),
        ));
    }
    if !SLUG_RE.is_match(slug) {
        return Err(ContentError::validation(
            "slug",
            format!("'{slug}' may only contain lowercase letters, digits and hyphens"),
        ));
    }
    Ok(())
}

/// Check a path against `[a-z0-9-/]+` (non-empty segments) and the length limit.
pub fn validate_path(path: &str) -> Result<(), ContentError> {
    if path.len() > MAX_PATH_LEN {
        return Err(ContentError::validation(
            "path",
            format!("cannot exceed {MAX_PATH_LEN} characters"),
        ));
    }
    if !PATH_RE.is_match(path) {
        return Err(ContentError::validation(
            "path",
            format!("'{path}' may only contain lowercase letters, digits, hyphens and slashes"),
        ));
    }
    Ok(())
}

pub(crate) fn validate_title(title: &str) -> Result<(), ContentError> {
    if title.chars().count() > MAX_TITLE_LEN {
        return Err(ContentError::validation(
            "title",
            format!("cannot exceed {MAX_TITLE_LEN} characters"),
        ));
    }
    Ok(())
}
