//! Per-site settings and the site registry.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::error::ContentError;
use crate::page::SiteId;

/// Settings of one tenant site.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SiteSettings {
    pub id: SiteId,
    /// Host name the site is served on (e.g. "tracon.fi").
    pub domain: String,
    /// Site title.
    pub name: String,
    /// Shown to search engines and feed readers.
    #[serde(default)]
    pub description: String,
    /// Comma-separated keyword list.
    #[serde(default)]
    pub keywords: String,
    pub base_template: String,
    pub page_template: String,
    pub blog_index_template: String,
    pub blog_post_template: String,
    /// Controller run for every page of this site.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub controller: Option<String>,
}

impl SiteSettings {
    /// Settings with the default template names.
    #[must_use]
    pub fn new(id: SiteId, domain: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id,
            domain: domain.into(),
            name: name.into(),
            description: String::new(),
            keywords: String::new(),
            base_template: "base.html".to_owned(),
            page_template: "page.html".to_owned(),
            blog_index_template: "blog_index.html".to_owned(),
            blog_post_template: "blog_post.html".to_owned(),
            controller: None,
        }
    }

    /// Protocol-relative URL of the site root.
    #[must_use]
    pub fn absolute_url(&self) -> String {
        format!("//{}", self.domain)
    }
}

/// Registry of sites, addressable by id or domain.
#[derive(Debug, Default)]
pub struct Sites {
    sites: Vec<SiteSettings>,
    by_id: HashMap<SiteId, usize>,
    by_domain: HashMap<String, usize>,
}

impl Sites {
    /// Add a site. Ids and domains must be unique.
    pub fn insert(&mut self, settings: SiteSettings) -> Result<(), ContentError> {
        if self.by_id.contains_key(&settings.id) {
            return Err(ContentError::conflict(settings.id, "site id"));
        }
        let domain = settings.domain.to_ascii_lowercase();
        if domain.is_empty() {
            return Err(ContentError::validation("domain", "cannot be empty"));
        }
        if self.by_domain.contains_key(&domain) {
            return Err(ContentError::conflict(
                settings.id,
                format!("domain '{domain}'"),
            ));
        }

        let idx = self.sites.len();
        self.by_id.insert(settings.id, idx);
        self.by_domain.insert(domain, idx);
        self.sites.push(settings);
        Ok(())
    }

    /// Settings by id.
    pub fn get(&self, id: SiteId) -> Result<&SiteSettings, ContentError> {
        self.by_id
            .get(&id)
            .map(|&i| &self.sites[i])
            .ok_or_else(|| ContentError::UnknownSite(id.to_string()))
    }

    /// Settings by host name. A `:port` suffix is ignored.
    pub fn by_domain(&self, host: &str) -> Result<&SiteSettings, ContentError> {
        let domain = host
            .rsplit_once(':')
            .map_or(host, |(name, _)| name)
            .to_ascii_lowercase();
        self.by_domain
            .get(&domain)
            .map(|&i| &self.sites[i])
            .ok_or(ContentError::UnknownSite(domain))
    }

    pub fn iter(&self) -> impl Iterator<Item = &SiteSettings> {
        self.sites.iter()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.sites.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.sites.is_empty()
    }
}
