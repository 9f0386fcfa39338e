//! Per-site redirects consulted before page lookup.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::error::ContentError;
use crate::page::{SiteId, validate_path};

/// Redirect from a site path to an arbitrary target URL.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Redirect {
    pub site: SiteId,
    pub path: String,
    pub target: String,
}

/// Flat `(site, path) -> target` table.
#[derive(Debug, Default)]
pub struct Redirects {
    entries: HashMap<(SiteId, String), String>,
}

impl Redirects {
    /// Add a redirect. The path follows the page path grammar.
    pub fn insert(&mut self, redirect: Redirect) -> Result<(), ContentError> {
        validate_path(&redirect.path)?;
        if redirect.target.is_empty() {
            return Err(ContentError::validation("target", "cannot be empty"));
        }

        let key = (redirect.site, redirect.path);
        if self.entries.contains_key(&key) {
            return Err(ContentError::conflict(
                key.0,
                format!("redirect '{}'", key.1),
            ));
        }
        self.entries.insert(key, redirect.target);
        Ok(())
    }

    /// Redirect target for a path, if any.
    #[must_use]
    pub fn get(&self, site: SiteId, path: &str) -> Option<&str> {
        self.entries
            .get(&(site, path.to_owned()))
            .map(String::as_str)
    }

    /// All redirects, sorted by site and path.
    #[must_use]
    pub fn to_vec(&self) -> Vec<Redirect> {
        let mut redirects: Vec<Redirect> = self
            .entries
            .iter()
            .map(|((site, path), target)| Redirect {
                site: *site,
                path: path.clone(),
                target: target.clone(),
            })
            .collect();
        redirects.sort_by(|a, b| (a.site, &a.path).cmp(&(b.site, &b.path)));
        redirects
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
