//! Blog API endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, State};
use axum::http::HeaderMap;
use chrono::Utc;
use serde::Serialize;
use serde_json::Value;
use tc_site::{BlogPost, ContentError, post_summary};

use crate::error::ServerError;
use crate::handlers::request_site;
use crate::state::AppState;

/// Response for GET /api/blog.
#[derive(Serialize)]
pub(crate) struct BlogIndexResponse {
    template: String,
    posts: Vec<Value>,
}

/// Response for GET /api/blog/{year}/{month}/{day}/{slug}.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct BlogPostResponse {
    template: String,
    title: String,
    date: String,
    path: String,
    absolute_url: String,
    body: String,
    excerpt: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    author: Option<String>,
    categories: Vec<String>,
}

/// Handle GET /api/blog.
pub(crate) async fn get_index(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Json<BlogIndexResponse>, ServerError> {
    let site = request_site(&state, &headers)?;
    let posts = state
        .store
        .blog
        .visible_posts(site.id, Utc::now())
        .into_iter()
        .map(|post| post_summary(post, state.excerpt_max_chars))
        .collect();

    Ok(Json(BlogIndexResponse {
        template: site.blog_index_template.clone(),
        posts,
    }))
}

/// Handle GET /api/blog/{year}/{month}/{day}/{slug}.
pub(crate) async fn get_post(
    Path((year, month, day, slug)): Path<(i32, u32, u32, String)>,
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Json<BlogPostResponse>, ServerError> {
    let site = request_site(&state, &headers)?;
    let post = state.store.blog.get_post(site.id, year, month, day, &slug)?;
    if !post.is_published(Utc::now()) {
        return Err(ContentError::NotFound {
            kind: "Blog post",
            key: post.path.clone(),
        }
        .into());
    }

    Ok(Json(BlogPostResponse {
        template: site.blog_post_template.clone(),
        categories: category_slugs(&state, post),
        title: post.title.clone(),
        date: post.date.to_string(),
        path: post.local_url(),
        absolute_url: post.absolute_url(&site.domain),
        body: post.body.clone(),
        excerpt: post.excerpt(state.excerpt_max_chars),
        author: post.author.clone(),
    }))
}

fn category_slugs(state: &AppState, post: &BlogPost) -> Vec<String> {
    post.categories
        .iter()
        .filter_map(|id| state.store.blog.categories().get(id.0))
        .map(|category| category.slug.clone())
        .collect()
}
