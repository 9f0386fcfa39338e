//! Page writes and cascading path updates.
//!
//! Saving a page derives its slug (when empty) and path, validates it,
//! persists it and then walks the subtree below it so that every
//! descendant path reflects the new ancestor prefix:
//!
//! ```text
//! save(page)
//!   ├─ prepare(page)        slug, path, validation
//!   ├─ plan_subtree(page)   derive and validate every descendant path
//!   ├─ commit(page)         indexes
//!   └─ apply_paths(plan)    write descendant paths
//! ```
//!
//! Nothing is written until the whole subtree has been validated, so a
//! failed save leaves the tree untouched. `store` and `repair_subtree` are
//! public so callers can batch several stores and repair once.

use std::collections::HashSet;

use crate::error::ContentError;
use crate::page::{
    Page, PageDraft, PageId, SiteId, build_path, validate_path, validate_slug, validate_title,
};
use crate::slug::slugify;
use crate::tree::PageTree;

/// A page whose stored path differs from the one derived from its parents.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StalePath {
    pub id: PageId,
    pub site: SiteId,
    pub stored: String,
    pub derived: String,
}

impl PageTree {
    /// Create a page from a draft.
    ///
    /// # Errors
    ///
    /// `Validation` for a missing site, an empty/invalid slug or a parent in
    /// another site; `NotFound` for an unknown parent; `UniquenessConflict`
    /// when the path or sibling slug is taken.
    pub fn insert(&mut self, draft: PageDraft) -> Result<PageId, ContentError> {
        let site = draft
            .site
            .ok_or_else(|| ContentError::validation("site", "is required"))?;
        let page = self.prepare(draft.into_page(PageId(self.pages.len()), site), true)?;
        Ok(self.commit(page, true))
    }

    /// Store an existing page and repair the paths below it.
    ///
    /// Returns the number of descendants whose path changed. On error
    /// neither the page nor any descendant has been written.
    pub fn save(&mut self, page: Page) -> Result<usize, ContentError> {
        self.check_same_site(&page)?;
        let page = self.prepare(page, false)?;
        let plan = self.plan_subtree(page.id, &page.path)?;
        let id = self.commit(page, false);
        Ok(self.apply_paths(id, plan))
    }

    /// Store an existing page without touching its descendants.
    ///
    /// Descendant paths stay stale until [`PageTree::repair_subtree`] runs.
    pub fn store(&mut self, page: Page) -> Result<PageId, ContentError> {
        self.check_same_site(&page)?;
        let page = self.prepare(page, false)?;
        Ok(self.commit(page, false))
    }

    /// Re-derive the paths of every descendant of `id`, parents first.
    ///
    /// Returns the number of pages whose path changed. Either every
    /// descendant is repaired or, on error, none is.
    pub fn repair_subtree(&mut self, id: PageId) -> Result<usize, ContentError> {
        let root_path = self.require(id)?.path.clone();
        let plan = self.plan_subtree(id, &root_path)?;
        Ok(self.apply_paths(id, plan))
    }

    /// Change a page's slug and cascade.
    pub fn rename(&mut self, id: PageId, slug: &str) -> Result<usize, ContentError> {
        let mut page = self.require(id)?.clone();
        slug.clone_into(&mut page.slug);
        self.save(page)
    }

    /// Move a page under another parent (or to the top level) and cascade.
    ///
    /// # Errors
    ///
    /// `CycleDetected` when `parent` is the page itself or one of its
    /// descendants.
    pub fn move_page(&mut self, id: PageId, parent: Option<PageId>) -> Result<usize, ContentError> {
        let mut page = self.require(id)?.clone();
        page.parent = parent;
        self.save(page)
    }

    /// Pages whose stored path disagrees with their parent chain.
    #[must_use]
    pub fn stale_paths(&self) -> Vec<StalePath> {
        let mut stale = Vec::new();
        let mut stack: Vec<(PageId, Option<String>)> = self
            .roots
            .values()
            .flatten()
            .map(|&id| (id, None))
            .collect();
        stack.sort_by_key(|(id, _)| std::cmp::Reverse(*id));

        while let Some((id, parent_path)) = stack.pop() {
            let page = &self.pages[id.0];
            let derived = build_path(parent_path.as_deref(), &page.slug);
            if derived != page.path {
                stale.push(StalePath {
                    id,
                    site: page.site,
                    stored: page.path.clone(),
                    derived: derived.clone(),
                });
            }
            for &child in self.children[id.0].iter().rev() {
                stack.push((child, Some(derived.clone())));
            }
        }

        stale
    }

    /// Re-derive every path in every site.
    ///
    /// Returns the number of pages whose path changed.
    pub fn repair_all(&mut self) -> Result<usize, ContentError> {
        let mut roots: Vec<PageId> = self.roots.values().flatten().copied().collect();
        roots.sort();

        let mut changed = 0;
        for root in roots {
            if self.refresh_path(root)? {
                changed += 1;
            }
            changed += self.repair_subtree(root)?;
        }
        Ok(changed)
    }

    fn check_same_site(&self, page: &Page) -> Result<(), ContentError> {
        if self.require(page.id)?.site != page.site {
            return Err(ContentError::validation(
                "site",
                "cannot move a page between sites; copy it instead",
            ));
        }
        Ok(())
    }

    /// Derive slug and path and validate the page against the current tree.
    fn prepare(&self, mut page: Page, is_new: bool) -> Result<Page, ContentError> {
        if page.slug.is_empty() && !page.title.is_empty() {
            page.slug = slugify(&page.title);
        }
        validate_title(&page.title)?;
        validate_slug(&page.slug)?;

        let parent_path = match page.parent {
            Some(parent) => {
                let parent_page = self.require(parent)?;
                if parent_page.site != page.site {
                    return Err(ContentError::validation(
                        "parent",
                        format!("page {parent} belongs to site {}", parent_page.site),
                    ));
                }
                if !is_new && self.is_ancestor_or_self(page.id, parent) {
                    return Err(ContentError::CycleDetected {
                        page: page.id,
                        parent,
                    });
                }
                Some(parent_page.path.as_str())
            }
            None => None,
        };
        page.path = build_path(parent_path, &page.slug);
        validate_path(&page.path)?;
        self.check_unique(&page)?;
        Ok(page)
    }

    fn commit(&mut self, page: Page, is_new: bool) -> PageId {
        let id = page.id;
        if is_new {
            self.children.push(Vec::new());
            self.link(&page);
            self.index(&page);
            tracing::debug!(site = %page.site, page = %id, path = %page.path, "Created page");
            self.pages.push(page);
        } else {
            let old = self.pages[id.0].clone();
            self.unindex(&old);
            if old.parent != page.parent {
                self.unlink(&old);
                self.link(&page);
            }
            self.index(&page);
            if old.path != page.path {
                tracing::debug!(page = %id, from = %old.path, to = %page.path, "Page path changed");
            }
            self.pages[id.0] = page;
        }
        id
    }

    /// New paths of the descendants of `id` once `id` sits at `root_path`.
    ///
    /// Only changed pages are listed, parents before children. Fails on the
    /// first path that is invalid or held by a page outside the subtree.
    fn plan_subtree(
        &self,
        id: PageId,
        root_path: &str,
    ) -> Result<Vec<(PageId, String)>, ContentError> {
        let site = self.pages[id.0].site;
        let moving: HashSet<PageId> = std::iter::once(id).chain(self.descendants(id)).collect();
        let mut taken: HashSet<String> = HashSet::from([root_path.to_owned()]);

        let mut plan = Vec::new();
        let mut stack: Vec<(PageId, String)> = self.children[id.0]
            .iter()
            .map(|&child| (child, root_path.to_owned()))
            .collect();
        while let Some((child, parent_path)) = stack.pop() {
            let page = &self.pages[child.0];
            let derived = build_path(Some(&parent_path), &page.slug);
            if !taken.insert(derived.clone()) {
                return Err(ContentError::conflict(site, format!("path '{derived}'")));
            }
            if derived != page.path {
                validate_path(&derived)?;
                if let Some(&other) = self.path_index.get(&(site, derived.clone()))
                    && !moving.contains(&other)
                {
                    return Err(ContentError::conflict(site, format!("path '{derived}'")));
                }
                plan.push((child, derived.clone()));
            }
            stack.extend(
                self.children[child.0]
                    .iter()
                    .map(|&grandchild| (grandchild, derived.clone())),
            );
        }
        Ok(plan)
    }

    fn apply_paths(&mut self, id: PageId, plan: Vec<(PageId, String)>) -> usize {
        let changed = plan.len();
        for (page, path) in plan {
            let site = self.pages[page.0].site;
            let old_path = std::mem::replace(&mut self.pages[page.0].path, path.clone());
            if self.path_index.get(&(site, old_path.clone())) == Some(&page) {
                self.path_index.remove(&(site, old_path));
            }
            self.path_index.insert((site, path), page);
        }

        if changed > 0 {
            tracing::debug!(page = %id, changed, "Repaired descendant paths");
        }
        changed
    }

    /// Re-derive one page's path from its parent's current path.
    fn refresh_path(&mut self, id: PageId) -> Result<bool, ContentError> {
        let page = &self.pages[id.0];
        let parent_path = page.parent.map(|parent| self.pages[parent.0].path.as_str());
        let derived = build_path(parent_path, &page.slug);
        if derived == page.path {
            return Ok(false);
        }

        validate_path(&derived)?;
        let site = page.site;
        if let Some(&other) = self.path_index.get(&(site, derived.clone()))
            && other != id
        {
            return Err(ContentError::conflict(site, format!("path '{derived}'")));
        }

        let old_path = std::mem::replace(&mut self.pages[id.0].path, derived.clone());
        if self.path_index.get(&(site, old_path.clone())) == Some(&id) {
            self.path_index.remove(&(site, old_path));
        }
        self.path_index.insert((site, derived), id);
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;

    const SITE: SiteId = SiteId(1);

    fn about_tree() -> (PageTree, PageId, PageId, PageId) {
        let mut tree = PageTree::new();
        let about = tree.insert(PageDraft::new(SITE, "About")).unwrap();
        let team = tree
            .insert(PageDraft::new(SITE, "Team").parent(about))
            .unwrap();
        let lead = tree
            .insert(PageDraft::new(SITE, "Lead Organizer").parent(team))
            .unwrap();
        (tree, about, team, lead)
    }

    fn path(tree: &PageTree, id: PageId) -> &str {
        &tree.page(id).unwrap().path
    }

    #[test]
    fn test_insert_derives_slug_and_path() {
        let (tree, about, team, lead) = about_tree();
        assert_eq!(path(&tree, about), "about");
        assert_eq!(path(&tree, team), "about/team");
        assert_eq!(path(&tree, lead), "about/team/lead-organizer");
    }

    #[test]
    fn test_insert_keeps_explicit_slug() {
        let mut tree = PageTree::new();
        let id = tree
            .insert(PageDraft::new(SITE, "Frequently Asked").slug("faq"))
            .unwrap();
        assert_eq!(path(&tree, id), "faq");
    }

    #[test]
    fn test_insert_without_convertible_title_fails() {
        let mut tree = PageTree::new();
        let err = tree.insert(PageDraft::new(SITE, "???")).unwrap_err();
        assert!(matches!(err, ContentError::Validation { field: "slug", .. }));
        assert!(tree.is_empty());
    }

    #[test]
    fn test_insert_rejects_invalid_slug() {
        let mut tree = PageTree::new();
        let err = tree
            .insert(PageDraft::new(SITE, "About").slug("About Us"))
            .unwrap_err();
        assert!(matches!(err, ContentError::Validation { .. }));
    }

    #[test]
    fn test_insert_rejects_duplicate_sibling_slug() {
        let (mut tree, about, _, _) = about_tree();
        let err = tree
            .insert(PageDraft::new(SITE, "Team").parent(about))
            .unwrap_err();
        assert!(matches!(err, ContentError::UniquenessConflict { .. }));
        assert_eq!(tree.len(), 3);
    }

    #[test]
    fn test_same_slug_allowed_in_other_site() {
        let (mut tree, _, _, _) = about_tree();
        assert!(tree.insert(PageDraft::new(SiteId(2), "About")).is_ok());
    }

    #[test]
    fn test_insert_rejects_parent_from_other_site() {
        let (mut tree, about, _, _) = about_tree();
        let err = tree
            .insert(PageDraft::new(SiteId(2), "Team").parent(about))
            .unwrap_err();
        assert!(matches!(err, ContentError::Validation { field: "parent", .. }));
    }

    #[test]
    fn test_insert_rejects_unknown_parent() {
        let mut tree = PageTree::new();
        let err = tree
            .insert(PageDraft::new(SITE, "Team").parent(PageId(7)))
            .unwrap_err();
        assert!(err.is_not_found());
    }

    #[test]
    fn test_rename_cascades_to_descendants() {
        let (mut tree, about, team, lead) = about_tree();

        let changed = tree.rename(about, "company").unwrap();

        assert_eq!(changed, 2);
        assert_eq!(path(&tree, about), "company");
        assert_eq!(path(&tree, team), "company/team");
        assert_eq!(path(&tree, lead), "company/team/lead-organizer");
        assert!(tree.get(SITE, "about/team").is_err());
        assert_eq!(tree.get(SITE, "company/team").unwrap().id, team);
    }

    #[test]
    fn test_move_page_cascades() {
        let (mut tree, _, team, lead) = about_tree();
        let org = tree.insert(PageDraft::new(SITE, "Organization")).unwrap();

        tree.move_page(team, Some(org)).unwrap();

        assert_eq!(path(&tree, team), "organization/team");
        assert_eq!(path(&tree, lead), "organization/team/lead-organizer");
        assert_eq!(tree.children_of(SITE, Some(org)).len(), 1);
    }

    #[test]
    fn test_move_page_to_top_level() {
        let (mut tree, about, team, _) = about_tree();

        tree.move_page(team, None).unwrap();

        assert_eq!(path(&tree, team), "team");
        assert!(tree.children_of(SITE, Some(about)).is_empty());
        assert_eq!(tree.children_of(SITE, None).len(), 2);
    }

    #[test]
    fn test_move_under_descendant_is_rejected() {
        let (mut tree, about, _, lead) = about_tree();

        let err = tree.move_page(about, Some(lead)).unwrap_err();

        assert!(matches!(err, ContentError::CycleDetected { .. }));
        assert_eq!(tree.page(about).unwrap().parent, None);
    }

    #[test]
    fn test_move_under_self_is_rejected() {
        let (mut tree, about, _, _) = about_tree();
        let err = tree.move_page(about, Some(about)).unwrap_err();
        assert!(matches!(err, ContentError::CycleDetected { .. }));
    }

    #[test]
    fn test_store_then_repair_subtree() {
        let (mut tree, about, team, lead) = about_tree();
        let mut page = tree.page(about).unwrap().clone();
        page.slug = "company".to_owned();

        tree.store(page).unwrap();
        assert_eq!(path(&tree, team), "about/team");
        assert_eq!(tree.stale_paths().len(), 2);

        assert_eq!(tree.repair_subtree(about).unwrap(), 2);
        assert_eq!(path(&tree, lead), "company/team/lead-organizer");
        assert!(tree.stale_paths().is_empty());
    }

    #[test]
    fn test_failed_cascade_leaves_tree_untouched() {
        let mut tree = PageTree::new();
        let root = tree.insert(PageDraft::new(SITE, "R").slug("r")).unwrap();
        let mut leaf = root;
        for level in 0..16 {
            let width = if level == 15 { 60 } else { 63 };
            leaf = tree
                .insert(PageDraft::new(SITE, "Level").slug("c".repeat(width)).parent(leaf))
                .unwrap();
        }
        assert_eq!(path(&tree, leaf).len(), 1022);

        let err = tree.rename(root, &"b".repeat(63)).unwrap_err();

        assert!(matches!(err, ContentError::Validation { .. }));
        assert_eq!(path(&tree, root), "r");
        assert_eq!(tree.get(SITE, "r").unwrap().id, root);
        assert!(tree.stale_paths().is_empty());
    }

    #[test]
    fn test_failed_repair_writes_nothing() {
        let (mut tree, about, team, lead) = about_tree();
        let squatter = tree.insert(PageDraft::new(SITE, "Squatter")).unwrap();
        let mut pages = tree.pages().to_vec();
        pages[squatter.0].path = "company/team".to_owned();
        let mut tree = PageTree::from_pages(pages).unwrap();

        let err = tree.rename(about, "company").unwrap_err();

        assert!(matches!(err, ContentError::UniquenessConflict { .. }));
        assert_eq!(path(&tree, about), "about");
        assert_eq!(path(&tree, team), "about/team");
        assert_eq!(path(&tree, lead), "about/team/lead-organizer");
        assert_eq!(tree.get(SITE, "about").unwrap().id, about);
    }

    #[test]
    fn test_store_rejects_site_change() {
        let (mut tree, about, _, _) = about_tree();
        let mut page = tree.page(about).unwrap().clone();
        page.site = SiteId(2);
        assert!(tree.store(page).is_err());
    }

    #[test]
    fn test_stale_paths_reports_derived_values() {
        let (tree, _, team, _) = about_tree();
        let mut pages = tree.pages().to_vec();
        pages[team.0].path = "old/team".to_owned();
        let tree = PageTree::from_pages(pages).unwrap();

        let stale = tree.stale_paths();

        assert_eq!(
            stale,
            vec![StalePath {
                id: team,
                site: SITE,
                stored: "old/team".to_owned(),
                derived: "about/team".to_owned(),
            }]
        );
    }

    #[test]
    fn test_repair_all_fixes_every_site() {
        let (tree, about, team, lead) = about_tree();
        let mut pages = tree.pages().to_vec();
        pages[about.0].path = "x".to_owned();
        pages[team.0].path = "x/y".to_owned();
        pages[lead.0].path = "x/y/z".to_owned();
        let mut tree = PageTree::from_pages(pages).unwrap();

        assert_eq!(tree.repair_all().unwrap(), 3);
        assert!(tree.stale_paths().is_empty());
        assert_eq!(tree.get(SITE, "about/team/lead-organizer").unwrap().id, lead);
    }

    proptest! {
        #[test]
        fn test_paths_follow_parent_chain(
            parents in prop::collection::vec(any::<prop::sample::Index>(), 1..40),
            renames in prop::collection::vec((any::<prop::sample::Index>(), "[a-z]{1,8}"), 0..10),
        ) {
            let mut tree = PageTree::new();
            for (i, parent) in parents.iter().enumerate() {
                let parent = (i > 0).then(|| PageId(parent.index(i)));
                let mut draft = PageDraft::new(SITE, format!("Page {i}"));
                draft.parent = parent;
                tree.insert(draft).unwrap();
            }
            for (idx, slug) in renames {
                let id = PageId(idx.index(tree.len()));
                // Sibling collisions are legitimate rejections
                let _ = tree.rename(id, &slug);
            }

            for page in tree.pages() {
                let expected = match page.parent {
                    Some(parent) => format!("{}/{}", tree.page(parent).unwrap().path, page.slug),
                    None => page.slug.clone(),
                };
                prop_assert_eq!(&page.path, &expected);
                prop_assert_eq!(tree.get(SITE, &page.path).unwrap().id, page.id);
            }
        }
    }
}
