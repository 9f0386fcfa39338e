//! `tc menu` command implementation.

use std::path::PathBuf;

use clap::Args;
use tc_site::{MenuEntry, MenuQuery};

use crate::commands::{load_store, site_by_domain};
use crate::error::CliError;
use crate::output::Output;

/// Arguments for the menu command.
#[derive(Args)]
pub(crate) struct MenuArgs {
    /// Domain of the site.
    #[arg(short, long)]
    site: String,

    /// Current URL used to mark active entries (e.g. /about/team).
    #[arg(short, long)]
    url: Option<String>,

    /// Child levels below the top entries (default: from config).
    #[arg(long)]
    depth: Option<usize>,

    /// Print JSON instead of an indented tree.
    #[arg(long)]
    json: bool,

    /// Path to configuration file (default: auto-discover tracontent.toml).
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Content snapshot file (overrides config).
    #[arg(short, long)]
    data_file: Option<PathBuf>,
}

impl MenuArgs {
    /// Execute the menu command.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be loaded or the site is unknown.
    pub(crate) fn execute(self) -> Result<(), CliError> {
        let output = Output::new();
        let (config, store) = load_store(self.config.as_deref(), self.data_file)?;
        let site = site_by_domain(&store, &self.site)?;

        let mut query = MenuQuery::default().depth(self.depth.unwrap_or(config.menu.depth));
        if let Some(url) = self.url.as_deref() {
            query = query.current_url(url);
        }
        let menu = store.menu(site, &query)?;

        if self.json {
            let json = serde_json::to_string_pretty(&menu).map_err(tc_site::ContentError::from)?;
            output.result(&json);
            return Ok(());
        }

        if menu.is_empty() {
            output.warning("Menu is empty");
        }
        for line in render_tree(&menu) {
            if line.active {
                output.highlight(&line.text);
            } else {
                output.result(&line.text);
            }
        }
        Ok(())
    }
}

/// One printed line of a menu tree.
#[derive(Debug, PartialEq, Eq)]
struct TreeLine {
    text: String,
    active: bool,
}

/// Flatten a menu into indented lines, pre-order.
fn render_tree(entries: &[MenuEntry]) -> Vec<TreeLine> {
    fn walk(entries: &[MenuEntry], level: usize, lines: &mut Vec<TreeLine>) {
        for entry in entries {
            let marker = if entry.active { "*" } else { "-" };
            lines.push(TreeLine {
                text: format!("{}{marker} {} ({})", "  ".repeat(level), entry.text, entry.href),
                active: entry.active,
            });
            walk(&entry.children, level + 1, lines);
        }
    }

    let mut lines = Vec::new();
    walk(entries, 0, &mut lines);
    lines
}
