//! Router construction.

use std::sync::Arc;

use axum::Router;
use axum::routing::get;
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;

use crate::handlers;
use crate::middleware::security;
use crate::state::AppState;

/// Create the application router.
pub(crate) fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/api/menu", get(handlers::menu::get_menu))
        .route("/api/pages/", get(handlers::pages::get_root_page))
        .route("/api/pages/{*path}", get(handlers::pages::get_page))
        .route("/api/blog", get(handlers::blog::get_index))
        .route(
            "/api/blog/{year}/{month}/{day}/{slug}",
            get(handlers::blog::get_post),
        )
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(security::csp_layer())
                .layer(security::content_type_options_layer())
                .layer(security::frame_options_layer()),
        )
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{Body, to_bytes};
    use axum::http::{Request, StatusCode, header};
    use chrono::{Duration, NaiveDate, Utc};
    use pretty_assertions::assert_eq;
    use serde_json::Value;
    use tc_site::{
        BlogPostDraft, ContentStore, ControllerRegistry, FRONT_PAGE_CONTROLLER, PageDraft,
        Redirect, SiteId, SiteSettings,
    };
    use tower::ServiceExt;

    const TRACON: SiteId = SiteId(1);
    const OTHER: SiteId = SiteId(2);

    fn state() -> Arc<AppState> {
        let shown = Utc::now() - Duration::days(1);
        let mut store = ContentStore::default();
        store
            .sites
            .insert(SiteSettings::new(TRACON, "tracon.fi", "Tracon"))
            .unwrap();
        store
            .sites
            .insert(SiteSettings::new(OTHER, "other.fi", "Other"))
            .unwrap();

        store
            .pages
            .insert(
                PageDraft::new(TRACON, "Tracon")
                    .slug("front-page")
                    .controller(FRONT_PAGE_CONTROLLER)
                    .visible_from(shown),
            )
            .unwrap();
        let about = store
            .pages
            .insert(PageDraft::new(TRACON, "About").order(1).visible_from(shown))
            .unwrap();
        store
            .pages
            .insert(PageDraft::new(TRACON, "Team").parent(about).visible_from(shown))
            .unwrap();
        store.pages.insert(PageDraft::new(TRACON, "Draft")).unwrap();
        store
            .pages
            .insert(PageDraft::new(OTHER, "Only here").visible_from(shown))
            .unwrap();

        store
            .redirects
            .insert(Redirect {
                site: TRACON,
                path: "old".to_owned(),
                target: "/about".to_owned(),
            })
            .unwrap();
        store
            .blog
            .insert_post(
                BlogPostDraft::new(TRACON, "Tickets on sale")
                    .date(NaiveDate::from_ymd_opt(2024, 3, 1).unwrap())
                    .body("<p>Get them now</p>")
                    .visible_from(shown),
            )
            .unwrap();
        store
            .blog
            .insert_post(
                BlogPostDraft::new(TRACON, "Unpublished")
                    .date(NaiveDate::from_ymd_opt(2024, 3, 2).unwrap()),
            )
            .unwrap();

        Arc::new(AppState {
            store,
            controllers: ControllerRegistry::with_builtins(),
            default_site: Some(TRACON),
            menu_depth: 2,
            excerpt_max_chars: 300,
            version: "test".to_owned(),
        })
    }

    fn get(uri: &str, host: &str) -> Request<Body> {
        Request::builder()
            .uri(uri)
            .header(header::HOST, host)
            .body(Body::empty())
            .unwrap()
    }

    async fn json(response: axum::response::Response) -> Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_menu_marks_active_branch() {
        let app = create_router(state());
        let response = app
            .oneshot(get("/api/menu?url=/about/team", "tracon.fi"))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = json(response).await;
        let items = body["items"].as_array().unwrap();
        assert_eq!(items.len(), 2);
        assert_eq!(items[1]["href"], "/about");
        assert_eq!(items[1]["active"], true);
        assert_eq!(items[1]["children"][0]["href"], "/about/team");
    }

    #[tokio::test]
    async fn test_menu_depth_zero() {
        let app = create_router(state());
        let response = app
            .oneshot(get("/api/menu?depth=0", "tracon.fi"))
            .await
            .unwrap();

        let body = json(response).await;
        assert!(body["items"][1].get("children").is_none());
    }

    #[tokio::test]
    async fn test_menu_uses_host_site() {
        let app = create_router(state());
        let response = app
            .oneshot(get("/api/menu", "other.fi:7979"))
            .await
            .unwrap();

        let body = json(response).await;
        assert_eq!(body["items"][0]["href"], "/only-here");
    }

    #[tokio::test]
    async fn test_unknown_host_falls_back_to_default_site() {
        let app = create_router(state());
        let response = app.oneshot(get("/api/menu", "localhost")).await.unwrap();

        let body = json(response).await;
        assert_eq!(body["items"][0]["href"], "/");
    }

    #[tokio::test]
    async fn test_get_page() {
        let app = create_router(state());
        let response = app
            .oneshot(get("/api/pages/about/team", "tracon.fi"))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert!(response.headers().contains_key(header::ETAG));
        assert_eq!(
            response.headers()["x-content-type-options"],
            "nosniff"
        );
        let body = json(response).await;
        assert_eq!(body["template"], "page.html");
        assert_eq!(body["page"]["title"], "Team");
        assert_eq!(body["page"]["path"], "/about/team");
        assert_eq!(body["menu"][1]["active"], true);
    }

    #[tokio::test]
    async fn test_front_page_has_news() {
        let app = create_router(state());
        let response = app.oneshot(get("/api/pages/", "tracon.fi")).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = json(response).await;
        assert_eq!(body["page"]["path"], "/");
        let news = body["vars"]["news_posts"].as_array().unwrap();
        assert_eq!(news.len(), 1);
        assert_eq!(news[0]["href"], "/blog/2024/03/01/tickets-on-sale");
    }

    #[tokio::test]
    async fn test_redirect_wins() {
        let app = create_router(state());
        let response = app
            .oneshot(get("/api/pages/old", "tracon.fi"))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::TEMPORARY_REDIRECT);
        assert_eq!(response.headers()[header::LOCATION], "/about");
    }

    #[tokio::test]
    async fn test_unpublished_page_is_not_found() {
        let app = create_router(state());
        let response = app
            .oneshot(get("/api/pages/draft", "tracon.fi"))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        let body = json(response).await;
        assert!(body["error"].as_str().unwrap().contains("draft"));
    }

    #[tokio::test]
    async fn test_etag_not_modified() {
        let state = state();
        let first = create_router(Arc::clone(&state))
            .oneshot(get("/api/pages/about", "tracon.fi"))
            .await
            .unwrap();
        let etag = first.headers()[header::ETAG].clone();

        let request = Request::builder()
            .uri("/api/pages/about")
            .header(header::HOST, "tracon.fi")
            .header(header::IF_NONE_MATCH, etag)
            .body(Body::empty())
            .unwrap();
        let second = create_router(state).oneshot(request).await.unwrap();

        assert_eq!(second.status(), StatusCode::NOT_MODIFIED);
    }

    #[tokio::test]
    async fn test_blog_index_lists_published_posts() {
        let app = create_router(state());
        let response = app.oneshot(get("/api/blog", "tracon.fi")).await.unwrap();

        let body = json(response).await;
        assert_eq!(body["template"], "blog_index.html");
        let posts = body["posts"].as_array().unwrap();
        assert_eq!(posts.len(), 1);
        assert_eq!(posts[0]["excerpt"], "Get them now");
    }

    #[tokio::test]
    async fn test_blog_post() {
        let app = create_router(state());
        let response = app
            .oneshot(get("/api/blog/2024/03/01/tickets-on-sale", "tracon.fi"))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = json(response).await;
        assert_eq!(body["title"], "Tickets on sale");
        assert_eq!(body["absoluteUrl"], "//tracon.fi/blog/2024/03/01/tickets-on-sale");
    }

    #[tokio::test]
    async fn test_blog_post_invalid_date_is_not_found() {
        let app = create_router(state());
        let response = app
            .oneshot(get("/api/blog/2024/02/30/tickets-on-sale", "tracon.fi"))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_unpublished_blog_post_is_not_found() {
        let app = create_router(state());
        let response = app
            .oneshot(get("/api/blog/2024/03/02/unpublished", "tracon.fi"))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
