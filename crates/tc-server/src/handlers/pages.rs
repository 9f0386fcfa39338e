//! Pages API endpoint.
//!
//! Resolves a request path against redirects and the page tree and returns
//! the template name, page fields, site menu and controller variables.

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode, header};
use axum::response::{IntoResponse, Redirect, Response};
use chrono::Utc;
use serde::Serialize;
use tc_site::{MenuEntry, MenuQuery, Page, Resolution, Vars, Viewer};

use crate::error::ServerError;
use crate::handlers::{compute_etag, is_not_modified, request_site};
use crate::state::AppState;

/// Response for GET /api/pages/{path}.
#[derive(Serialize)]
struct PageResponse<'a> {
    /// Template the page renders with.
    template: &'a str,
    page: PageView<'a>,
    /// Site menu with the page marked active.
    menu: Vec<MenuEntry>,
    /// Controller-provided variables.
    vars: Vars,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct PageView<'a> {
    title: &'a str,
    menu_text: &'a str,
    /// URL path with leading slash.
    path: String,
    absolute_url: String,
    body: &'a str,
}

impl<'a> PageView<'a> {
    fn new(page: &'a Page, domain: &str) -> Self {
        Self {
            title: &page.title,
            menu_text: page.menu_text(),
            path: page.local_url(),
            absolute_url: page.absolute_url(domain),
            body: &page.body,
        }
    }
}

/// Handle GET /api/pages/ (front page).
pub(crate) async fn get_root_page(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Response, ServerError> {
    get_page_impl("", &state, &headers)
}

/// Handle GET /api/pages/{path}.
pub(crate) async fn get_page(
    Path(path): Path<String>,
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Response, ServerError> {
    get_page_impl(&path, &state, &headers)
}

fn get_page_impl(
    path: &str,
    state: &AppState,
    headers: &HeaderMap,
) -> Result<Response, ServerError> {
    let site = request_site(state, headers)?;
    let now = Utc::now();

    let page = match state.store.resolve(site.id, path, Viewer::Anonymous, now)? {
        Resolution::Redirect(target) => {
            tracing::debug!(site = %site.id, path, target, "Redirecting");
            return Ok(Redirect::temporary(target).into_response());
        }
        Resolution::Page(page) => page,
    };

    let url = page.local_url();
    let menu = state.store.menu(
        site.id,
        &MenuQuery::at(now)
            .depth(state.menu_depth)
            .current_url(&url),
    )?;
    let vars = state.store.page_vars(
        &state.controllers,
        site,
        page,
        now,
        state.excerpt_max_chars,
    )?;

    let response = PageResponse {
        template: page.template(site),
        page: PageView::new(page, &site.domain),
        menu,
        vars,
    };
    let body = serde_json::to_string(&response).map_err(tc_site::ContentError::from)?;

    let etag = compute_etag(&state.version, &body);
    if is_not_modified(headers, &etag) {
        return Ok(StatusCode::NOT_MODIFIED.into_response());
    }

    Ok((
        [
            (header::ETAG, etag),
            (header::CONTENT_TYPE, "application/json".to_owned()),
            (header::CACHE_CONTROL, "private, max-age=60".to_owned()),
        ],
        body,
    )
        .into_response())
}
