//! Hierarchical page store and navigation for multi-site content.
//!
//! This crate provides:
//! - [`PageTree`]: per-site page hierarchy with derived paths and cascading
//!   path updates when a page is renamed or moved
//! - [`MenuEntry`] building from the visible part of the tree
//! - [`BlogStore`]: dated blog posts and categories
//! - [`ContentStore`]: everything above plus sites and redirects, persisted
//!   as a JSON snapshot
//!
//! # Quick Start
//!
//! ```
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! use chrono::Utc;
//! use tc_site::{MenuQuery, PageDraft, PageTree, SiteId};
//!
//! let site = SiteId(1);
//! let mut tree = PageTree::new();
//! let about = tree.insert(PageDraft::new(site, "About us").visible_from(Utc::now()))?;
//! let team = tree.insert(PageDraft::new(site, "Team").parent(about).visible_from(Utc::now()))?;
//!
//! tree.rename(about, "company")?;
//! assert_eq!(tree.page(team).unwrap().path, "company/team");
//!
//! let menu = tree.build_menu(site, &MenuQuery::default().current_url("/company/team"));
//! assert!(menu[0].active);
//! # Ok(())
//! # }
//! ```

mod blog;
mod cascade;
mod controller;
mod copy;
mod error;
mod menu;
mod page;
mod redirect;
mod settings;
mod slug;
mod store;
mod tree;

pub use blog::{
    BlogCategory, BlogPost, BlogPostDraft, BlogStore, CategoryId, DEFAULT_EXCERPT_MAX_CHARS,
    PostId, PostState, post_path,
};
pub use cascade::StalePath;
pub use controller::{
    ControllerContext, ControllerRegistry, FRONT_PAGE_CONTROLLER, FRONT_PAGE_NEWS_COUNT, Vars,
    post_summary,
};
pub use copy::PageOverrides;
pub use error::ContentError;
pub use menu::{DEFAULT_MENU_DEPTH, MenuEntry, MenuQuery};
pub use page::{
    FRONT_PAGE_SLUG, MAX_PATH_LEN, MAX_TITLE_LEN, Page, PageDraft, PageId, SiteId, build_path,
    validate_path, validate_slug,
};
pub use redirect::{Redirect, Redirects};
pub use settings::{SiteSettings, Sites};
pub use slug::{MAX_SLUG_LEN, slugify};
pub use store::{ContentStore, Resolution, SNAPSHOT_VERSION, Snapshot, Viewer};
pub use tree::PageTree;
