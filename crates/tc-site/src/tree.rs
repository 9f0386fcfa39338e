//! Page tree store.
//!
//! Pages of every site live in one flat arena indexed by [`PageId`], with
//! parent links stored as optional ids rather than owning references.
//! Three indexes make the common lookups O(1):
//! - `(site, path)` for request resolution
//! - `(site, parent, slug)` for sibling uniqueness
//! - per-page child lists for menu and cascade traversal
//!
//! Writes go through [`PageTree::save`] and friends (see the `cascade`
//! module) so that the indexes always agree with the stored pages.

use std::collections::HashMap;

use chrono::{DateTime, Utc};

use crate::error::ContentError;
use crate::page::{Page, PageId, SiteId};

/// Key of the sibling-uniqueness index.
pub(crate) type SlugKey = (SiteId, Option<PageId>, String);

/// Arena-backed store of all pages of all sites.
#[derive(Debug, Default)]
pub struct PageTree {
    pub(crate) pages: Vec<Page>,
    pub(crate) children: Vec<Vec<PageId>>,
    pub(crate) roots: HashMap<SiteId, Vec<PageId>>,
    pub(crate) path_index: HashMap<(SiteId, String), PageId>,
    pub(crate) slug_index: HashMap<SlugKey, PageId>,
}

impl PageTree {
    /// Create an empty tree.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild a tree from stored pages.
    ///
    /// Page ids must match their position. Parents must exist in the same
    /// site, keys must be unique and the parent graph must be acyclic.
    /// Stored paths are indexed as-is; see [`PageTree::stale_paths`].
    pub fn from_pages(pages: Vec<Page>) -> Result<Self, ContentError> {
        let mut tree = Self::new();

        for (idx, page) in pages.iter().enumerate() {
            if page.id.0 != idx {
                return Err(ContentError::validation(
                    "id",
                    format!("page at position {idx} has id {}", page.id),
                ));
            }
            if let Some(parent) = page.parent {
                let parent_page = pages.get(parent.0).ok_or_else(|| {
                    ContentError::validation(
                        "parent",
                        format!("page {} refers to missing parent {parent}", page.id),
                    )
                })?;
                if parent_page.site != page.site {
                    return Err(ContentError::validation(
                        "parent",
                        format!("page {} and its parent {parent} are in different sites", page.id),
                    ));
                }
            }
        }

        tree.children = vec![Vec::new(); pages.len()];
        for page in &pages {
            tree.check_unique(page)?;
            tree.link(page);
            tree.index(page);
        }
        tree.pages = pages;

        for page in &tree.pages {
            if let Some(parent) = page.parent
                && tree.walks_into_cycle(page.id)
            {
                return Err(ContentError::CycleDetected {
                    page: page.id,
                    parent,
                });
            }
        }

        Ok(tree)
    }

    /// Number of pages across all sites.
    #[must_use]
    pub fn len(&self) -> usize {
        self.pages.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.pages.is_empty()
    }

    /// All pages in id order.
    #[must_use]
    pub fn pages(&self) -> &[Page] {
        &self.pages
    }

    /// Page by id.
    #[must_use]
    pub fn page(&self, id: PageId) -> Option<&Page> {
        self.pages.get(id.0)
    }

    pub(crate) fn require(&self, id: PageId) -> Result<&Page, ContentError> {
        self.page(id)
            .ok_or_else(|| ContentError::not_found("Page", format!("#{id}")))
    }

    /// Page by site and path.
    pub fn get(&self, site: SiteId, path: &str) -> Result<&Page, ContentError> {
        self.path_index
            .get(&(site, path.to_owned()))
            .map(|&id| &self.pages[id.0])
            .ok_or_else(|| ContentError::not_found("Page", path))
    }

    /// Page by site, parent and slug.
    pub fn get_by_slug(
        &self,
        site: SiteId,
        parent: Option<PageId>,
        slug: &str,
    ) -> Result<&Page, ContentError> {
        self.slug_index
            .get(&(site, parent, slug.to_owned()))
            .map(|&id| &self.pages[id.0])
            .ok_or_else(|| ContentError::not_found("Page", slug))
    }

    /// Whether a sibling with this slug exists.
    #[must_use]
    pub fn exists(&self, site: SiteId, parent: Option<PageId>, slug: &str) -> bool {
        self.slug_index
            .contains_key(&(site, parent, slug.to_owned()))
    }

    /// Children of `parent` (top-level pages when `None`), ordered by
    /// `order` ascending, ties broken by id.
    #[must_use]
    pub fn children_of(&self, site: SiteId, parent: Option<PageId>) -> Vec<&Page> {
        let ids = match parent {
            Some(parent) => self.children.get(parent.0).map(Vec::as_slice),
            None => self.roots.get(&site).map(Vec::as_slice),
        };

        let mut pages: Vec<&Page> = ids
            .unwrap_or_default()
            .iter()
            .map(|id| &self.pages[id.0])
            .filter(|page| page.site == site)
            .collect();
        pages.sort_by_key(|page| (page.order, page.id));
        pages
    }

    /// Children that are visible in menus at `t`.
    #[must_use]
    pub fn visible_children_of(
        &self,
        site: SiteId,
        parent: Option<PageId>,
        t: DateTime<Utc>,
    ) -> Vec<&Page> {
        let mut pages = self.children_of(site, parent);
        pages.retain(|page| page.is_visible(t));
        pages
    }

    /// Ancestors of a page, root first, excluding the page itself.
    #[must_use]
    pub fn ancestors(&self, id: PageId) -> Vec<&Page> {
        let mut ancestors = Vec::new();
        let mut current = self.page(id).and_then(|page| page.parent);
        while let Some(parent) = current {
            // Bounded walk: stored trees are acyclic, but never loop forever
            if ancestors.len() > self.pages.len() {
                break;
            }
            let page = &self.pages[parent.0];
            ancestors.push(page);
            current = page.parent;
        }
        ancestors.reverse();
        ancestors
    }

    /// Descendants of a page in pre-order, excluding the page itself.
    #[must_use]
    pub fn descendants(&self, id: PageId) -> Vec<PageId> {
        let mut result = Vec::new();
        let mut stack: Vec<PageId> = self
            .children
            .get(id.0)
            .map(|c| c.iter().rev().copied().collect())
            .unwrap_or_default();
        while let Some(current) = stack.pop() {
            if result.len() > self.pages.len() {
                break;
            }
            result.push(current);
            stack.extend(self.children[current.0].iter().rev().copied());
        }
        result
    }

    /// Whether `ancestor` is `id` itself or one of its ancestors.
    #[must_use]
    pub fn is_ancestor_or_self(&self, ancestor: PageId, id: PageId) -> bool {
        let mut current = Some(id);
        let mut steps = 0;
        while let Some(page) = current {
            if page == ancestor {
                return true;
            }
            steps += 1;
            if steps > self.pages.len() {
                return false;
            }
            current = self.pages.get(page.0).and_then(|p| p.parent);
        }
        false
    }

    /// Pages of one site in id order.
    pub fn site_pages(&self, site: SiteId) -> impl Iterator<Item = &Page> {
        self.pages.iter().filter(move |page| page.site == site)
    }

    fn walks_into_cycle(&self, id: PageId) -> bool {
        let mut current = self.pages[id.0].parent;
        let mut steps = 0;
        while let Some(parent) = current {
            if parent == id || steps > self.pages.len() {
                return true;
            }
            steps += 1;
            current = self.pages[parent.0].parent;
        }
        false
    }

    /// Fail if another page already holds this page's path or slug key.
    pub(crate) fn check_unique(&self, page: &Page) -> Result<(), ContentError> {
        if let Some(&other) = self.path_index.get(&(page.site, page.path.clone()))
            && other != page.id
        {
            return Err(ContentError::conflict(
                page.site,
                format!("path '{}'", page.path),
            ));
        }
        if let Some(&other) = self
            .slug_index
            .get(&(page.site, page.parent, page.slug.clone()))
            && other != page.id
        {
            return Err(ContentError::conflict(
                page.site,
                format!("slug '{}' under the same parent", page.slug),
            ));
        }
        Ok(())
    }

    pub(crate) fn index(&mut self, page: &Page) {
        self.path_index
            .insert((page.site, page.path.clone()), page.id);
        self.slug_index
            .insert((page.site, page.parent, page.slug.clone()), page.id);
    }

    pub(crate) fn unindex(&mut self, page: &Page) {
        let path_key = (page.site, page.path.clone());
        if self.path_index.get(&path_key) == Some(&page.id) {
            self.path_index.remove(&path_key);
        }
        let slug_key = (page.site, page.parent, page.slug.clone());
        if self.slug_index.get(&slug_key) == Some(&page.id) {
            self.slug_index.remove(&slug_key);
        }
    }

    pub(crate) fn link(&mut self, page: &Page) {
        match page.parent {
            Some(parent) => self.children[parent.0].push(page.id),
            None => self.roots.entry(page.site).or_default().push(page.id),
        }
    }

    pub(crate) fn unlink(&mut self, page: &Page) {
        let siblings = match page.parent {
            Some(parent) => self.children.get_mut(parent.0),
            None => self.roots.get_mut(&page.site),
        };
        if let Some(siblings) = siblings {
            siblings.retain(|&id| id != page.id);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::page::PageDraft;
    use chrono::Duration;

    const SITE: SiteId = SiteId(1);
    const OTHER: SiteId = SiteId(2);

    fn tree() -> (PageTree, PageId, PageId, PageId) {
        let mut tree = PageTree::new();
        let about = tree
            .insert(PageDraft::new(SITE, "About").order(2))
            .unwrap();
        let team = tree
            .insert(PageDraft::new(SITE, "Team").parent(about).order(1))
            .unwrap();
        let contact = tree
            .insert(PageDraft::new(SITE, "Contact").order(1))
            .unwrap();
        (tree, about, team, contact)
    }

    #[test]
    fn test_get_by_path() {
        let (tree, _, team, _) = tree();
        assert_eq!(tree.get(SITE, "about/team").unwrap().id, team);
        assert!(tree.get(SITE, "team").unwrap_err().is_not_found());
        assert!(tree.get(OTHER, "about/team").is_err());
    }

    #[test]
    fn test_get_by_slug() {
        let (tree, about, team, _) = tree();
        assert_eq!(tree.get_by_slug(SITE, Some(about), "team").unwrap().id, team);
        assert!(tree.get_by_slug(SITE, None, "team").is_err());
    }

    #[test]
    fn test_exists_is_scoped_to_parent_and_site() {
        let (tree, about, _, _) = tree();
        assert!(tree.exists(SITE, Some(about), "team"));
        assert!(!tree.exists(SITE, None, "team"));
        assert!(!tree.exists(OTHER, None, "about"));
    }

    #[test]
    fn test_children_of_orders_by_order_then_id() {
        let (mut tree, _, _, _) = tree();
        tree.insert(PageDraft::new(SITE, "News").order(1)).unwrap();

        let slugs: Vec<&str> = tree
            .children_of(SITE, None)
            .iter()
            .map(|p| p.slug.as_str())
            .collect();
        assert_eq!(slugs, ["contact", "news", "about"]);
    }

    #[test]
    fn test_children_of_is_scoped_to_site() {
        let (mut tree, _, _, _) = tree();
        tree.insert(PageDraft::new(OTHER, "Elsewhere")).unwrap();

        assert_eq!(tree.children_of(SITE, None).len(), 2);
        assert_eq!(tree.children_of(OTHER, None).len(), 1);
    }

    #[test]
    fn test_visible_children_filters_by_time() {
        let now = Utc::now();
        let mut tree = PageTree::new();
        tree.insert(PageDraft::new(SITE, "Shown").visible_from(now - Duration::days(1)))
            .unwrap();
        tree.insert(PageDraft::new(SITE, "Later").visible_from(now + Duration::days(1)))
            .unwrap();
        tree.insert(PageDraft::new(SITE, "Hidden")).unwrap();

        let visible = tree.visible_children_of(SITE, None, now);
        assert_eq!(visible.len(), 1);
        assert_eq!(visible[0].slug, "shown");
    }

    #[test]
    fn test_ancestors_and_descendants() {
        let (mut tree, about, team, _) = tree();
        let lead = tree
            .insert(PageDraft::new(SITE, "Lead").parent(team))
            .unwrap();

        let ancestors: Vec<PageId> = tree.ancestors(lead).iter().map(|p| p.id).collect();
        assert_eq!(ancestors, [about, team]);
        assert_eq!(tree.descendants(about), [team, lead]);
        assert!(tree.is_ancestor_or_self(about, lead));
        assert!(tree.is_ancestor_or_self(lead, lead));
        assert!(!tree.is_ancestor_or_self(lead, about));
    }

    #[test]
    fn test_from_pages_round_trip() {
        let (tree, _, team, _) = tree();
        let rebuilt = PageTree::from_pages(tree.pages().to_vec()).unwrap();

        assert_eq!(rebuilt.len(), 3);
        assert_eq!(rebuilt.get(SITE, "about/team").unwrap().id, team);
        assert_eq!(rebuilt.children_of(SITE, None).len(), 2);
    }

    #[test]
    fn test_from_pages_rejects_cycle() {
        let (tree, about, team, _) = tree();
        let mut pages = tree.pages().to_vec();
        pages[about.0].parent = Some(team);

        let err = PageTree::from_pages(pages).unwrap_err();
        assert!(matches!(err, ContentError::CycleDetected { .. }));
    }

    #[test]
    fn test_from_pages_rejects_duplicate_path() {
        let (tree, _, _, contact) = tree();
        let mut pages = tree.pages().to_vec();
        pages[contact.0].path = "about".to_owned();

        let err = PageTree::from_pages(pages).unwrap_err();
        assert!(matches!(err, ContentError::UniquenessConflict { .. }));
    }

    #[test]
    fn test_from_pages_rejects_cross_site_parent() {
        let (tree, _, team, _) = tree();
        let mut pages = tree.pages().to_vec();
        pages[team.0].site = OTHER;

        assert!(PageTree::from_pages(pages).is_err());
    }
}
