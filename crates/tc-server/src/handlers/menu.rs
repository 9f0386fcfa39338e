//! Menu API endpoint.
//!
//! Returns the navigation menu of the requested site.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Query, State};
use axum::http::HeaderMap;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use tc_config::MAX_MENU_DEPTH;
use tc_site::{MenuEntry, MenuQuery};

use crate::error::ServerError;
use crate::handlers::request_site;
use crate::state::AppState;

/// Query parameters for GET /api/menu.
#[derive(Debug, Default, Deserialize)]
pub(crate) struct MenuParams {
    /// Current URL (with leading slash) used to mark active entries.
    url: Option<String>,
    /// Child levels below the top entries.
    depth: Option<usize>,
    /// Path of the page whose children form the top level.
    parent: Option<String>,
}

/// Response for GET /api/menu.
#[derive(Serialize)]
pub(crate) struct MenuResponse {
    items: Vec<MenuEntry>,
}

/// Handle GET /api/menu.
pub(crate) async fn get_menu(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Query(params): Query<MenuParams>,
) -> Result<Json<MenuResponse>, ServerError> {
    let site = request_site(&state, &headers)?;

    let depth = params.depth.unwrap_or(state.menu_depth).min(MAX_MENU_DEPTH);
    let mut query = MenuQuery::at(Utc::now()).depth(depth);
    if let Some(url) = params.url.as_deref() {
        query = query.current_url(url);
    }
    if let Some(parent) = params.parent.as_deref() {
        let parent = state.store.pages.get(site.id, parent.trim_matches('/'))?;
        query = query.parent(parent.id);
    }

    let items = state.store.menu(site.id, &query)?;
    Ok(Json(MenuResponse { items }))
}
