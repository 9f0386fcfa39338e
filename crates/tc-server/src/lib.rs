//! HTTP server for tracontent.
//!
//! Serves a JSON API over the content store:
//! - `GET /api/menu?url=&depth=&parent=` - site navigation menu
//! - `GET /api/pages/{path}` - page resolution (redirects, front page, pages)
//! - `GET /api/blog` and `GET /api/blog/{year}/{month}/{day}/{slug}` - blog
//!
//! The site is chosen by the request's Host header.
//!
//! # Architecture
//!
//! ```text
//! Client ──HTTP──► axum router (tc-server)
//!                      │
//!                      ├─► Host header ──► Sites::by_domain
//!                      │
//!                      └─► handlers ──► ContentStore (resolve, menu, blog)
//!                                           │
//!                                           └─► ControllerRegistry (page vars)
//! ```

mod app;
mod error;
mod handlers;
mod middleware;
mod state;

use std::net::SocketAddr;
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Arc;

use tc_site::{ContentStore, ControllerRegistry};

use state::AppState;

/// Server configuration.
#[derive(Clone, Debug)]
pub struct ServerConfig {
    /// Host address to bind to.
    pub host: String,
    /// Port to listen on.
    pub port: u16,
    /// Content snapshot to serve.
    pub data_file: PathBuf,
    /// Domain of the site served for unknown hosts.
    pub default_site: Option<String>,
    /// Default menu depth.
    pub menu_depth: usize,
    /// Length of automatic blog excerpts.
    pub excerpt_max_chars: usize,
    /// Application version (for cache invalidation).
    pub version: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_owned(),
            port: 7979,
            data_file: PathBuf::from("content.json"),
            default_site: None,
            menu_depth: tc_site::DEFAULT_MENU_DEPTH,
            excerpt_max_chars: tc_site::DEFAULT_EXCERPT_MAX_CHARS,
            version: String::new(),
        }
    }
}

/// Run the server until Ctrl-C.
///
/// # Errors
///
/// Returns an error if the content snapshot cannot be loaded, the default
/// site is unknown or the server fails to start.
pub async fn run_server(config: ServerConfig) -> Result<(), Box<dyn std::error::Error>> {
    let store = ContentStore::load(&config.data_file)?;

    let default_site = match &config.default_site {
        Some(domain) => Some(store.sites.by_domain(domain)?.id),
        None => None,
    };

    let state = Arc::new(AppState {
        store,
        controllers: ControllerRegistry::with_builtins(),
        default_site,
        menu_depth: config.menu_depth,
        excerpt_max_chars: config.excerpt_max_chars,
        version: config.version.clone(),
    });

    let app = app::create_router(state);

    let addr = SocketAddr::from_str(&format!("{}:{}", config.host, config.port))?;
    tracing::info!(address = %addr, "Starting server");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

/// Wait for shutdown signal (Ctrl-C).
async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for Ctrl-C");
        return;
    }
    tracing::info!("Shutdown signal received, stopping server...");
}

/// Create server configuration from the loaded configuration.
#[must_use]
pub fn server_config_from_config(config: &tc_config::Config, version: String) -> ServerConfig {
    ServerConfig {
        host: config.server.host.clone(),
        port: config.server.port,
        data_file: config.content_resolved.data_file.clone(),
        default_site: config.content_resolved.default_site.clone(),
        menu_depth: config.menu.depth,
        excerpt_max_chars: config.blog.excerpt_max_chars,
        version,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_server_config_from_config() {
        let config = tc_config::Config::default();
        let server = server_config_from_config(&config, "1.2.3".to_owned());

        assert_eq!(server.port, 7979);
        assert_eq!(server.menu_depth, 2);
        assert_eq!(server.excerpt_max_chars, 300);
        assert_eq!(server.version, "1.2.3");
        assert!(server.data_file.ends_with("content.json"));
    }
}
