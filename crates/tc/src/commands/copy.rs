//! `tc copy` command implementation.

use std::path::PathBuf;

use clap::Args;
use tc_site::{ContentStore, PageId, PageOverrides};

use crate::commands::{load_store, site_by_domain};
use crate::error::CliError;
use crate::output::Output;

/// Arguments for the copy command.
#[derive(Args)]
pub(crate) struct CopyArgs {
    /// Domain of the site to copy from.
    #[arg(long)]
    site: String,

    /// Path of the page to copy (e.g. about/team).
    #[arg(long)]
    path: String,

    /// Domain of the site to copy into.
    #[arg(long)]
    to: String,

    /// Slug of the copy (default: the source slug).
    #[arg(long)]
    slug: Option<String>,

    /// Title of the copy (default: the source title).
    #[arg(long)]
    title: Option<String>,

    /// Show what would be copied without writing the snapshot.
    #[arg(long)]
    dry_run: bool,

    /// Path to configuration file (default: auto-discover tracontent.toml).
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Content snapshot file (overrides config).
    #[arg(short, long)]
    data_file: Option<PathBuf>,
}

impl CopyArgs {
    /// Execute the copy command.
    ///
    /// # Errors
    ///
    /// Returns an error if the page, either site or the target parent is
    /// missing, or the snapshot cannot be written.
    pub(crate) fn execute(self) -> Result<(), CliError> {
        let output = Output::new();
        let (config, mut store) = load_store(self.config.as_deref(), self.data_file.clone())?;

        let copy = self.copy(&mut store)?;
        let page = store
            .pages
            .page(copy)
            .ok_or_else(|| CliError::Validation(format!("copied page {copy} vanished")))?;
        let target = store.sites.get(page.site)?;

        if self.dry_run {
            output.warning("Dry run: snapshot not written");
            output.result(&page.absolute_url(&target.domain));
            return Ok(());
        }

        store.save(&config.content_resolved.data_file)?;
        output.success(&format!(
            "Copied /{} to {}",
            self.path.trim_matches('/'),
            page.absolute_url(&target.domain)
        ));
        Ok(())
    }

    fn copy(&self, store: &mut ContentStore) -> Result<PageId, CliError> {
        let from = site_by_domain(store, &self.site)?;
        let to = site_by_domain(store, &self.to)?;
        let source = store.pages.get(from, self.path.trim_matches('/'))?.id;

        let overrides = PageOverrides {
            slug: self.slug.clone(),
            title: self.title.clone(),
            ..PageOverrides::default()
        };
        Ok(store.pages.copy_to_site(source, to, overrides)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::Workspace;
    use pretty_assertions::assert_eq;
    use tc_site::{PageDraft, SiteId, SiteSettings};

    fn store() -> ContentStore {
        let mut store = ContentStore::default();
        store
            .sites
            .insert(SiteSettings::new(SiteId(1), "tracon.fi", "Tracon"))
            .unwrap();
        store
            .sites
            .insert(SiteSettings::new(SiteId(2), "hitpoint.tracon.fi", "Hitpoint"))
            .unwrap();
        let about = store.pages.insert(PageDraft::new(SiteId(1), "About")).unwrap();
        store
            .pages
            .insert(PageDraft::new(SiteId(1), "Team").parent(about))
            .unwrap();
        store
    }

    fn args(path: &str) -> CopyArgs {
        CopyArgs {
            site: "tracon.fi".to_owned(),
            path: path.to_owned(),
            to: "hitpoint.tracon.fi".to_owned(),
            slug: None,
            title: None,
            dry_run: false,
            config: None,
            data_file: None,
        }
    }

    #[test]
    fn test_copy_into_other_site() {
        let mut store = store();
        let copy = args("/about/").copy(&mut store).unwrap();

        let page = store.pages.page(copy).unwrap();
        assert_eq!(page.site, SiteId(2));
        assert_eq!(page.path, "about");
    }

    #[test]
    fn test_copy_child_without_parent_fails() {
        let mut store = store();
        let err = args("about/team").copy(&mut store).unwrap_err();
        assert!(err.to_string().contains("Parent page not found"));
    }

    #[test]
    fn test_copy_unknown_site_fails() {
        let mut store = store();
        let mut args = args("about");
        args.to = "nope.fi".to_owned();
        assert!(matches!(
            args.copy(&mut store),
            Err(CliError::Content(tc_site::ContentError::UnknownSite(_)))
        ));
    }

    #[test]
    fn test_execute_writes_copy_to_snapshot() {
        let workspace = Workspace::with_store(&store());
        let mut args = args("about");
        args.config = Some(workspace.config.clone());

        args.execute().unwrap();

        let store = workspace.reload();
        let page = store.pages.get(SiteId(2), "about").unwrap();
        assert_eq!(page.title, "About");
        assert_eq!(store.pages.len(), 3);
    }

    #[test]
    fn test_dry_run_leaves_snapshot_untouched() {
        let workspace = Workspace::with_store(&store());
        let mut args = args("about");
        args.config = Some(workspace.config.clone());
        args.dry_run = true;

        args.execute().unwrap();

        let store = workspace.reload();
        assert!(store.pages.get(SiteId(2), "about").is_err());
        assert_eq!(store.pages.len(), 2);
    }
}
