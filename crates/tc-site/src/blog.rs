//! Blog posts and categories.
//!
//! Posts are addressed by date and slug; their stored path has the form
//! `blog/YYYY/MM/DD/slug` so that it shares the page path grammar.

use std::cmp::Reverse;
use std::collections::HashMap;
use std::sync::LazyLock;

use chrono::{DateTime, Datelike, NaiveDate, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::ContentError;
use crate::page::{SiteId, validate_path, validate_slug, validate_title};
use crate::slug::slugify;

/// Default length of automatic excerpts, in characters.
pub const DEFAULT_EXCERPT_MAX_CHARS: usize = 300;

static TAG_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<[^>]*>").unwrap());

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PostId(pub usize);

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CategoryId(pub usize);

/// Editorial state. Informational only; publication is driven by timestamps.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PostState {
    #[default]
    Draft,
    Review,
    Ready,
}

/// Blog category, unique per site by slug.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlogCategory {
    pub id: CategoryId,
    pub site: SiteId,
    pub slug: String,
    pub title: String,
}

/// Dated blog post.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlogPost {
    pub id: PostId,
    pub site: SiteId,
    pub date: NaiveDate,
    pub slug: String,
    /// Derived `blog/YYYY/MM/DD/slug`.
    pub path: String,
    pub title: String,
    #[serde(default)]
    pub body: String,
    /// Hand-written excerpt; derived from the body when empty.
    #[serde(default)]
    pub override_excerpt: String,
    #[serde(default)]
    pub state: PostState,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    #[serde(default)]
    pub public_from: Option<DateTime<Utc>>,
    #[serde(default)]
    pub visible_from: Option<DateTime<Utc>>,
    #[serde(default)]
    pub categories: Vec<CategoryId>,
}

impl BlogPost {
    /// Excerpt for listings.
    ///
    /// Uses `override_excerpt` when set, otherwise the body with HTML tags
    /// stripped, cut to `max_chars` characters with an ellipsis appended.
    #[must_use]
    pub fn excerpt(&self, max_chars: usize) -> String {
        if !self.override_excerpt.is_empty() {
            return self.override_excerpt.clone();
        }

        let plain = TAG_RE.replace_all(&self.body, "");
        let plain = plain.trim();
        if plain.chars().count() <= max_chars {
            plain.to_owned()
        } else {
            let mut cut: String = plain.chars().take(max_chars).collect();
            cut.push('…');
            cut
        }
    }

    /// Site-relative URL with leading slash.
    #[must_use]
    pub fn local_url(&self) -> String {
        format!("/{}", self.path)
    }

    /// Protocol-relative URL on the given domain.
    #[must_use]
    pub fn absolute_url(&self, domain: &str) -> String {
        format!("//{domain}/{}", self.path)
    }

    #[must_use]
    pub fn is_published(&self, t: DateTime<Utc>) -> bool {
        self.public_from.is_some_and(|from| from <= t)
    }

    #[must_use]
    pub fn is_visible(&self, t: DateTime<Utc>) -> bool {
        self.visible_from.is_some_and(|from| from <= t)
    }
}

/// Fields for a post that has not been stored yet.
///
/// An empty slug is derived from the title; a missing date defaults to today.
#[derive(Clone, Debug, Default)]
pub struct BlogPostDraft {
    pub site: Option<SiteId>,
    pub date: Option<NaiveDate>,
    pub slug: String,
    pub title: String,
    pub body: String,
    pub override_excerpt: String,
    pub state: PostState,
    pub author: Option<String>,
    pub public_from: Option<DateTime<Utc>>,
    pub visible_from: Option<DateTime<Utc>>,
    pub categories: Vec<CategoryId>,
}

impl BlogPostDraft {
    #[must_use]
    pub fn new(site: SiteId, title: impl Into<String>) -> Self {
        Self {
            site: Some(site),
            title: title.into(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn date(mut self, date: NaiveDate) -> Self {
        self.date = Some(date);
        self
    }

    #[must_use]
    pub fn body(mut self, body: impl Into<String>) -> Self {
        self.body = body.into();
        self
    }

    #[must_use]
    pub fn category(mut self, category: CategoryId) -> Self {
        self.categories.push(category);
        self
    }

    /// Publish and list from `t`.
    #[must_use]
    pub fn visible_from(mut self, t: DateTime<Utc>) -> Self {
        self.public_from = Some(t);
        self.visible_from = Some(t);
        self
    }
}

/// Build the stored path of a post.
#[must_use]
pub fn post_path(date: NaiveDate, slug: &str) -> String {
    format!(
        "blog/{:04}/{:02}/{:02}/{slug}",
        date.year(),
        date.month(),
        date.day()
    )
}

/// Posts and categories of all sites.
#[derive(Debug, Default)]
pub struct BlogStore {
    posts: Vec<BlogPost>,
    categories: Vec<BlogCategory>,
    path_index: HashMap<(SiteId, String), PostId>,
    date_slug_index: HashMap<(SiteId, NaiveDate, String), PostId>,
    category_index: HashMap<(SiteId, String), CategoryId>,
}

impl BlogStore {
    /// Rebuild a store from stored categories and posts.
    pub fn from_parts(
        categories: Vec<BlogCategory>,
        posts: Vec<BlogPost>,
    ) -> Result<Self, ContentError> {
        let mut store = Self::default();
        for category in categories {
            if category.id.0 != store.categories.len() {
                return Err(ContentError::validation(
                    "id",
                    format!("category at position {} has id {}", store.categories.len(), category.id.0),
                ));
            }
            store.put_category(category)?;
        }
        for post in posts {
            if post.id.0 != store.posts.len() {
                return Err(ContentError::validation(
                    "id",
                    format!("post at position {} has id {}", store.posts.len(), post.id.0),
                ));
            }
            store.check_post(&post)?;
            store.index_post(&post);
            store.posts.push(post);
        }
        Ok(store)
    }

    /// Add a category. An empty slug is derived from the title.
    pub fn insert_category(
        &mut self,
        site: SiteId,
        title: &str,
        slug: &str,
    ) -> Result<CategoryId, ContentError> {
        let slug = if slug.is_empty() {
            slugify(title)
        } else {
            slug.to_owned()
        };
        let category = BlogCategory {
            id: CategoryId(self.categories.len()),
            site,
            slug,
            title: title.to_owned(),
        };
        self.put_category(category)
    }

    fn put_category(&mut self, category: BlogCategory) -> Result<CategoryId, ContentError> {
        validate_slug(&category.slug)?;
        validate_title(&category.title)?;
        let key = (category.site, category.slug.clone());
        if self.category_index.contains_key(&key) {
            return Err(ContentError::conflict(
                category.site,
                format!("category '{}'", category.slug),
            ));
        }
        let id = category.id;
        self.category_index.insert(key, id);
        self.categories.push(category);
        Ok(id)
    }

    /// Category by site and slug.
    pub fn category(&self, site: SiteId, slug: &str) -> Result<&BlogCategory, ContentError> {
        self.category_index
            .get(&(site, slug.to_owned()))
            .map(|&id| &self.categories[id.0])
            .ok_or_else(|| ContentError::not_found("Blog category", slug))
    }

    /// Create a post from a draft.
    pub fn insert_post(&mut self, draft: BlogPostDraft) -> Result<PostId, ContentError> {
        let site = draft
            .site
            .ok_or_else(|| ContentError::validation("site", "is required"))?;
        let post = BlogPost {
            id: PostId(self.posts.len()),
            site,
            date: draft.date.unwrap_or_else(|| Utc::now().date_naive()),
            slug: draft.slug,
            path: String::new(),
            title: draft.title,
            body: draft.body,
            override_excerpt: draft.override_excerpt,
            state: draft.state,
            author: draft.author,
            public_from: draft.public_from,
            visible_from: draft.visible_from,
            categories: draft.categories,
        };
        let post = self.prepare(post)?;
        let id = post.id;
        self.index_post(&post);
        tracing::debug!(site = %site, path = %post.path, "Created blog post");
        self.posts.push(post);
        Ok(id)
    }

    /// Store an existing post, re-deriving its slug and path.
    pub fn save_post(&mut self, post: BlogPost) -> Result<(), ContentError> {
        let old = self
            .posts
            .get(post.id.0)
            .cloned()
            .ok_or_else(|| ContentError::not_found("Blog post", format!("#{}", post.id.0)))?;
        if old.site != post.site {
            return Err(ContentError::validation("site", "cannot move a post between sites"));
        }
        let post = self.prepare(post)?;
        self.unindex_post(&old);
        self.index_post(&post);
        let id = post.id;
        self.posts[id.0] = post;
        Ok(())
    }

    /// Post by id.
    #[must_use]
    pub fn post(&self, id: PostId) -> Option<&BlogPost> {
        self.posts.get(id.0)
    }

    /// Post by the date and slug of its URL.
    ///
    /// An impossible calendar date is reported as not found.
    pub fn get_post(
        &self,
        site: SiteId,
        year: i32,
        month: u32,
        day: u32,
        slug: &str,
    ) -> Result<&BlogPost, ContentError> {
        let not_found = || ContentError::not_found("Blog post", format!("{year}/{month}/{day}/{slug}"));
        let date = NaiveDate::from_ymd_opt(year, month, day).ok_or_else(not_found)?;
        self.date_slug_index
            .get(&(site, date, slug.to_owned()))
            .map(|&id| &self.posts[id.0])
            .ok_or_else(not_found)
    }

    /// Post by stored path.
    pub fn get_by_path(&self, site: SiteId, path: &str) -> Result<&BlogPost, ContentError> {
        self.path_index
            .get(&(site, path.to_owned()))
            .map(|&id| &self.posts[id.0])
            .ok_or_else(|| ContentError::not_found("Blog post", path))
    }

    /// Posts listed at `t`, newest first.
    #[must_use]
    pub fn visible_posts(&self, site: SiteId, t: DateTime<Utc>) -> Vec<&BlogPost> {
        self.listed(|post| post.site == site && post.is_visible(t))
    }

    /// Posts of one category listed at `t`, newest first.
    #[must_use]
    pub fn category_posts(
        &self,
        site: SiteId,
        category: CategoryId,
        t: DateTime<Utc>,
    ) -> Vec<&BlogPost> {
        self.listed(|post| {
            post.site == site && post.categories.contains(&category) && post.is_visible(t)
        })
    }

    pub fn posts(&self) -> &[BlogPost] {
        &self.posts
    }

    pub fn categories(&self) -> &[BlogCategory] {
        &self.categories
    }

    fn listed(&self, keep: impl Fn(&BlogPost) -> bool) -> Vec<&BlogPost> {
        let mut posts: Vec<&BlogPost> = self.posts.iter().filter(|post| keep(post)).collect();
        posts.sort_by_key(|post| (Reverse(post.date), Reverse(post.public_from), Reverse(post.id)));
        posts
    }

    fn prepare(&self, mut post: BlogPost) -> Result<BlogPost, ContentError> {
        if post.slug.is_empty() && !post.title.is_empty() {
            post.slug = slugify(&post.title);
        }
        validate_title(&post.title)?;
        validate_slug(&post.slug)?;
        post.path = post_path(post.date, &post.slug);
        self.check_post(&post)?;
        Ok(post)
    }

    fn check_post(&self, post: &BlogPost) -> Result<(), ContentError> {
        validate_path(&post.path)?;
        for category in &post.categories {
            match self.categories.get(category.0) {
                Some(c) if c.site == post.site => {}
                _ => {
                    return Err(ContentError::validation(
                        "categories",
                        format!("category {} is not in site {}", category.0, post.site),
                    ));
                }
            }
        }
        if let Some(&other) = self.path_index.get(&(post.site, post.path.clone()))
            && other != post.id
        {
            return Err(ContentError::conflict(post.site, format!("path '{}'", post.path)));
        }
        if let Some(&other) = self
            .date_slug_index
            .get(&(post.site, post.date, post.slug.clone()))
            && other != post.id
        {
            return Err(ContentError::conflict(
                post.site,
                format!("post '{}' on {}", post.slug, post.date),
            ));
        }
        Ok(())
    }

    fn index_post(&mut self, post: &BlogPost) {
        self.path_index.insert((post.site, post.path.clone()), post.id);
        self.date_slug_index
            .insert((post.site, post.date, post.slug.clone()), post.id);
    }

    fn unindex_post(&mut self, post: &BlogPost) {
        self.path_index.remove(&(post.site, post.path.clone()));
        self.date_slug_index
            .remove(&(post.site, post.date, post.slug.clone()));
    }
}
