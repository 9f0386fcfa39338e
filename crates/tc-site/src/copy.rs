//! Copying pages between sites.

use chrono::{DateTime, Utc};

use crate::error::ContentError;
use crate::page::{PageDraft, PageId, SiteId};
use crate::slug::MAX_SLUG_LEN;
use crate::tree::PageTree;

/// Field values that replace the copied ones.
#[derive(Clone, Debug, Default)]
pub struct PageOverrides {
    pub slug: Option<String>,
    pub title: Option<String>,
    pub override_menu_text: Option<String>,
    pub body: Option<String>,
    pub order: Option<i32>,
    pub public_from: Option<DateTime<Utc>>,
    pub visible_from: Option<DateTime<Utc>>,
}

impl PageTree {
    /// Copy a page into another site's tree.
    ///
    /// The copy goes under the page in `target_site` whose path equals the
    /// source's parent path. Only slug, title, menu text, body and order
    /// are copied; publication times start empty unless overridden. A taken
    /// slug gets a `-copy-N` suffix with the smallest free `N >= 1`.
    ///
    /// # Errors
    ///
    /// `ParentNotFound` when the target site lacks the parent path. Nothing
    /// is written on failure.
    pub fn copy_to_site(
        &mut self,
        source: PageId,
        target_site: SiteId,
        overrides: PageOverrides,
    ) -> Result<PageId, ContentError> {
        let page = self.require(source)?;

        let parent_path = page.parent_path();
        let parent = if parent_path.is_empty() {
            None
        } else {
            let parent = self.get(target_site, parent_path).map_err(|_| {
                ContentError::ParentNotFound {
                    site: target_site,
                    path: parent_path.to_owned(),
                }
            })?;
            Some(parent.id)
        };

        let mut draft = PageDraft {
            site: Some(target_site),
            parent,
            slug: overrides.slug.unwrap_or_else(|| page.slug.clone()),
            title: overrides.title.unwrap_or_else(|| page.title.clone()),
            override_menu_text: overrides
                .override_menu_text
                .unwrap_or_else(|| page.override_menu_text.clone()),
            body: overrides.body.unwrap_or_else(|| page.body.clone()),
            order: overrides.order.unwrap_or(page.order),
            public_from: overrides.public_from,
            visible_from: overrides.visible_from,
            ..PageDraft::default()
        };
        draft.slug = self.free_slug(target_site, parent, &draft.slug);

        let id = self.insert(draft)?;
        tracing::info!(
            source = %source,
            copy = %id,
            site = %target_site,
            path = %self.pages[id.0].path,
            "Copied page to site"
        );
        Ok(id)
    }

    /// First of `slug`, `slug-copy-1`, `slug-copy-2`, ... not taken under `parent`.
    ///
    /// The base is shortened so that every candidate fits in [`MAX_SLUG_LEN`].
    fn free_slug(&self, site: SiteId, parent: Option<PageId>, slug: &str) -> String {
        if !self.exists(site, parent, slug) {
            return slug.to_owned();
        }
        tracing::debug!(site = %site, slug, "Slug taken, probing for a free copy slug");
        (1..)
            .map(|n| copy_slug(slug, n))
            .find(|candidate| !self.exists(site, parent, candidate))
            .unwrap_or_default()
    }
}

fn copy_slug(slug: &str, n: u32) -> String {
    let suffix = format!("-copy-{n}");
    let keep = MAX_SLUG_LEN.saturating_sub(suffix.len());
    let base: String = slug.chars().take(keep).collect();
    format!("{}{suffix}", base.trim_end_matches('-'))
}
