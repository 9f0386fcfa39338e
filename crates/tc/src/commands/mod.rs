//! CLI command implementations.

pub(crate) mod check;
pub(crate) mod copy;
pub(crate) mod menu;
pub(crate) mod serve;
pub(crate) mod slugify;

use std::path::{Path, PathBuf};

use tc_config::{CliSettings, Config};
use tc_site::{ContentStore, SiteId};

use crate::error::CliError;

pub(crate) use check::CheckArgs;
pub(crate) use copy::CopyArgs;
pub(crate) use menu::MenuArgs;
pub(crate) use serve::ServeArgs;
pub(crate) use slugify::SlugifyArgs;

/// Load configuration and the content snapshot it points to.
pub(crate) fn load_store(
    config_path: Option<&Path>,
    data_file: Option<PathBuf>,
) -> Result<(Config, ContentStore), CliError> {
    let cli_settings = CliSettings {
        data_file,
        ..Default::default()
    };
    let config = Config::load(config_path, Some(&cli_settings))?;
    let store = ContentStore::load(&config.content_resolved.data_file)?;
    Ok((config, store))
}

/// Site id for a domain given on the command line.
pub(crate) fn site_by_domain(store: &ContentStore, domain: &str) -> Result<SiteId, CliError> {
    Ok(store.sites.by_domain(domain)?.id)
}

/// Config and snapshot files in a temporary directory.
#[cfg(test)]
pub(crate) struct Workspace {
    pub(crate) dir: tempfile::TempDir,
    pub(crate) config: PathBuf,
    pub(crate) data_file: PathBuf,
}

#[cfg(test)]
impl Workspace {
    /// Write `store` as the snapshot next to a minimal `tracontent.toml`.
    pub(crate) fn with_store(store: &ContentStore) -> Self {
        let dir = tempfile::tempdir().unwrap();
        let config = dir.path().join(tc_config::CONFIG_FILENAME);
        std::fs::write(&config, "[content]\ndata_file = \"content.json\"\n").unwrap();
        let data_file = dir.path().join("content.json");
        store.save(&data_file).unwrap();
        Self {
            dir,
            config,
            data_file,
        }
    }

    pub(crate) fn reload(&self) -> ContentStore {
        ContentStore::load(&self.data_file).unwrap()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tc_site::{PageDraft, SiteSettings};

    #[test]
    fn test_load_store_resolves_data_file_from_config() {
        let mut store = ContentStore::default();
        store
            .sites
            .insert(SiteSettings::new(SiteId(1), "tracon.fi", "Tracon"))
            .unwrap();
        store.pages.insert(PageDraft::new(SiteId(1), "About")).unwrap();
        let workspace = Workspace::with_store(&store);

        let (config, loaded) = load_store(Some(&workspace.config), None).unwrap();

        assert_eq!(config.content_resolved.data_file, workspace.data_file);
        assert_eq!(loaded.pages.len(), 1);
        assert_eq!(site_by_domain(&loaded, "tracon.fi").unwrap(), SiteId(1));
    }

    #[test]
    fn test_load_store_missing_snapshot_fails() {
        let workspace = Workspace::with_store(&ContentStore::default());
        let missing = workspace.dir.path().join("missing.json");

        assert!(load_store(Some(&workspace.config), Some(missing)).is_err());
    }
}
