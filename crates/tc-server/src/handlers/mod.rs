//! HTTP request handlers.

pub(crate) mod blog;
pub(crate) mod menu;
pub(crate) mod pages;

use axum::http::{HeaderMap, header};
use md5::{Digest, Md5};
use tc_site::SiteSettings;

use crate::error::ServerError;
use crate::state::AppState;

/// Site addressed by the request's Host header.
///
/// Falls back to the configured default site when the host is missing or
/// unknown.
pub(crate) fn request_site<'a>(
    state: &'a AppState,
    headers: &HeaderMap,
) -> Result<&'a SiteSettings, ServerError> {
    let host = headers
        .get(header::HOST)
        .and_then(|value| value.to_str().ok())
        .unwrap_or_default();

    if let Ok(site) = state.store.sites.by_domain(host) {
        return Ok(site);
    }
    match state.default_site {
        Some(id) => Ok(state.store.sites.get(id)?),
        None => Err(ServerError::UnknownSite(host.to_owned())),
    }
}

/// Compute `ETag` from version and response body.
///
/// MD5 truncated to 64 bits (16 hex chars).
pub(crate) fn compute_etag(version: &str, content: &str) -> String {
    let hash = Md5::digest(format!("{version}:{content}").as_bytes());
    format!("\"{}\"", &hex::encode(hash)[..16])
}

/// Whether the request's `If-None-Match` equals `etag`.
pub(crate) fn is_not_modified(headers: &HeaderMap, etag: &str) -> bool {
    headers
        .get(header::IF_NONE_MATCH)
        .is_some_and(|value| value.as_bytes() == etag.as_bytes())
}
