//! `tc check` command implementation.

use std::path::PathBuf;

use clap::Args;
use tc_site::StalePath;

use crate::commands::load_store;
use crate::error::CliError;
use crate::output::Output;

/// Arguments for the check command.
#[derive(Args)]
pub(crate) struct CheckArgs {
    /// Re-derive stale paths and write the snapshot back.
    #[arg(long)]
    fix: bool,

    /// Path to configuration file (default: auto-discover tracontent.toml).
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Content snapshot file (overrides config).
    #[arg(short, long)]
    data_file: Option<PathBuf>,
}

impl CheckArgs {
    /// Execute the check command.
    ///
    /// # Errors
    ///
    /// Returns an error if stale paths remain (without `--fix`) or the
    /// snapshot cannot be read or written.
    pub(crate) fn execute(self) -> Result<(), CliError> {
        let output = Output::new();
        let (config, mut store) = load_store(self.config.as_deref(), self.data_file)?;

        let stale = store.check();
        if stale.is_empty() {
            output.success(&format!("All {} page paths are up to date", store.pages.len()));
            return Ok(());
        }

        for line in describe(&stale) {
            output.result(&line);
        }

        if !self.fix {
            return Err(CliError::Validation(format!(
                "{} stale page paths (run with --fix to repair)",
                stale.len()
            )));
        }

        let changed = store.pages.repair_all()?;
        tracing::info!(changed, "Repaired stale page paths");
        store.save(&config.content_resolved.data_file)?;
        output.success(&format!("Repaired {changed} page paths"));
        Ok(())
    }
}

fn describe(stale: &[StalePath]) -> Vec<String> {
    stale
        .iter()
        .map(|s| format!("site {} page {}: {} -> {}", s.site, s.id, s.stored, s.derived))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::Workspace;
    use pretty_assertions::assert_eq;
    use tc_site::{ContentStore, PageDraft, PageId, PageTree, SiteId, SiteSettings};

    fn stale_store() -> ContentStore {
        let mut store = ContentStore::default();
        store
            .sites
            .insert(SiteSettings::new(SiteId(1), "tracon.fi", "Tracon"))
            .unwrap();
        let about = store.pages.insert(PageDraft::new(SiteId(1), "About")).unwrap();
        let team = store
            .pages
            .insert(PageDraft::new(SiteId(1), "Team").parent(about))
            .unwrap();
        let mut pages = store.pages.pages().to_vec();
        pages[team.0].path = "old/team".to_owned();
        store.pages = PageTree::from_pages(pages).unwrap();
        store
    }

    fn args(workspace: &Workspace, fix: bool) -> CheckArgs {
        CheckArgs {
            fix,
            config: Some(workspace.config.clone()),
            data_file: None,
        }
    }

    #[test]
    fn test_describe_stale_paths() {
        let stale = [StalePath {
            id: PageId(4),
            site: SiteId(1),
            stored: "old/team".to_owned(),
            derived: "about/team".to_owned(),
        }];

        assert_eq!(describe(&stale), ["site 1 page 4: old/team -> about/team"]);
    }

    #[test]
    fn test_check_reports_without_writing() {
        let workspace = Workspace::with_store(&stale_store());

        let err = args(&workspace, false).execute().unwrap_err();

        assert!(matches!(err, CliError::Validation(_)));
        assert_eq!(workspace.reload().check().len(), 1);
    }

    #[test]
    fn test_check_fix_repairs_snapshot() {
        let workspace = Workspace::with_store(&stale_store());

        args(&workspace, true).execute().unwrap();

        let store = workspace.reload();
        assert!(store.check().is_empty());
        assert_eq!(store.pages.get(SiteId(1), "about/team").unwrap().title, "Team");
    }

    #[test]
    fn test_check_clean_snapshot_passes() {
        let mut store = stale_store();
        store.pages.repair_all().unwrap();
        let workspace = Workspace::with_store(&store);

        assert!(args(&workspace, false).execute().is_ok());
    }
}
