//! Error types for content operations.

use crate::page::{PageId, SiteId};

/// Error returned by page tree, blog and snapshot operations.
#[derive(Debug, thiserror::Error)]
pub enum ContentError {
    /// Lookup found no matching row.
    #[error("{kind} not found: {key}")]
    NotFound {
        /// What was looked up (e.g. "Page", "Blog post").
        kind: &'static str,
        /// Lookup key as displayed to the user.
        key: String,
    },

    /// Target site lacks the parent of a page being copied.
    #[error("Parent page not found in site {site}: {path}")]
    ParentNotFound {
        /// Site that was searched.
        site: SiteId,
        /// Parent path that was expected to exist.
        path: String,
    },

    /// Field fails its grammar or length constraints.
    #[error("Invalid {field}: {message}")]
    Validation {
        /// Field name (e.g. "slug", "path").
        field: &'static str,
        /// Human-readable reason.
        message: String,
    },

    /// Write violates a per-site uniqueness constraint.
    #[error("{key} already exists in site {site}")]
    UniquenessConflict {
        /// Site the constraint is scoped to.
        site: SiteId,
        /// Conflicting key (e.g. "path 'about/team'").
        key: String,
    },

    /// Re-parenting would make a page its own ancestor.
    #[error("Page {page} cannot be moved under {parent}: it would become its own ancestor")]
    CycleDetected {
        /// Page being re-parented.
        page: PageId,
        /// Requested new parent.
        parent: PageId,
    },

    /// No site matches the given id or domain.
    #[error("Unknown site: {0}")]
    UnknownSite(String),

    /// A page or site names a controller that was never registered.
    #[error("Unknown controller: {0}")]
    UnknownController(String),

    /// I/O error reading or writing a snapshot.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Snapshot (de)serialization error.
    #[error("Snapshot error: {0}")]
    Snapshot(#[from] serde_json::Error),
}

impl ContentError {
    pub(crate) fn not_found(kind: &'static str, key: impl Into<String>) -> Self {
        Self::NotFound {
            kind,
            key: key.into(),
        }
    }

    pub(crate) fn validation(field: &'static str, message: impl Into<String>) -> Self {
        Self::Validation {
            field,
            message: message.into(),
        }
    }

    pub(crate) fn conflict(site: SiteId, key: impl Into<String>) -> Self {
        Self::UniquenessConflict {
            site,
            key: key.into(),
        }
    }

    /// Whether this error means "nothing there" (404 at the HTTP boundary).
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. } | Self::ParentNotFound { .. })
    }
}
