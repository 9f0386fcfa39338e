//! Named page controllers.
//!
//! A page or site may name a controller; when the page is rendered the
//! controller contributes extra template variables. Controllers are
//! registered by name so that stored content never refers to code directly.

use std::collections::HashMap;
use std::fmt;

use chrono::{DateTime, Utc};
use serde_json::{Value, json};

use crate::blog::BlogPost;
use crate::error::ContentError;
use crate::page::Page;
use crate::settings::SiteSettings;
use crate::store::ContentStore;

/// Name of the built-in front page controller.
pub const FRONT_PAGE_CONTROLLER: &str = "front-page";

/// Number of posts listed by the front page controller.
pub const FRONT_PAGE_NEWS_COUNT: usize = 5;

/// Template variables produced by a controller.
pub type Vars = serde_json::Map<String, Value>;

/// Everything a controller may look at.
pub struct ControllerContext<'a> {
    pub store: &'a ContentStore,
    pub site: &'a SiteSettings,
    pub page: &'a Page,
    pub at: DateTime<Utc>,
    pub excerpt_max_chars: usize,
}

type ControllerFn = Box<dyn Fn(&ControllerContext<'_>) -> Vars + Send + Sync>;

/// Registry of controllers by name.
#[derive(Default)]
pub struct ControllerRegistry {
    controllers: HashMap<String, ControllerFn>,
}

impl fmt::Debug for ControllerRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<&String> = self.controllers.keys().collect();
        names.sort();
        f.debug_struct("ControllerRegistry")
            .field("controllers", &names)
            .finish()
    }
}

impl ControllerRegistry {
    /// Empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with the built-in controllers.
    #[must_use]
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        registry.register(FRONT_PAGE_CONTROLLER, front_page);
        registry
    }

    /// Register (or replace) a controller.
    pub fn register<F>(&mut self, name: impl Into<String>, controller: F)
    where
        F: Fn(&ControllerContext<'_>) -> Vars + Send + Sync + 'static,
    {
        self.controllers.insert(name.into(), Box::new(controller));
    }

    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.controllers.contains_key(name)
    }

    /// Run a controller by name.
    pub fn call(&self, name: &str, ctx: &ControllerContext<'_>) -> Result<Vars, ContentError> {
        let Some(controller) = self.controllers.get(name) else {
            tracing::warn!(
                controller = name,
                site = %ctx.site.id,
                path = %ctx.page.path,
                "Unknown controller"
            );
            return Err(ContentError::UnknownController(name.to_owned()));
        };
        Ok(controller(ctx))
    }
}

/// Latest listed blog posts as `news_posts`.
fn front_page(ctx: &ControllerContext<'_>) -> Vars {
    let posts: Vec<Value> = ctx
        .store
        .blog
        .visible_posts(ctx.site.id, ctx.at)
        .into_iter()
        .take(FRONT_PAGE_NEWS_COUNT)
        .map(|post| post_summary(post, ctx.excerpt_max_chars))
        .collect();

    let mut vars = Vars::new();
    vars.insert("news_posts".to_owned(), Value::Array(posts));
    vars
}

/// Listing representation of a post.
#[must_use]
pub fn post_summary(post: &BlogPost, excerpt_max_chars: usize) -> Value {
    json!({
        "title": post.title,
        "href": post.local_url(),
        "date": post.date.to_string(),
        "excerpt": post.excerpt(excerpt_max_chars),
    })
}
