//! Configuration management for tracontent.
//!
//! Parses `tracontent.toml` with serde and discovers it in the current
//! directory or any parent. CLI flags are applied on top via [`CliSettings`].
//!
//! ## Environment Variable Expansion
//!
//! - `${VAR}` - expands to the value of VAR, errors if unset
//! - `${VAR:-default}` - expands to VAR if set, otherwise uses default
//!
//! Expanded fields:
//! - `server.host`
//! - `content.data_file`
//! - `content.default_site`

mod expand;

use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Configuration filename to search for.
pub const CONFIG_FILENAME: &str = "tracontent.toml";

/// Deepest menu the configuration may request.
pub const MAX_MENU_DEPTH: usize = 16;

/// CLI settings that override configuration file values.
///
/// Only non-None values override the loaded config.
#[derive(Debug, Default)]
pub struct CliSettings {
    pub host: Option<String>,
    pub port: Option<u16>,
    pub data_file: Option<PathBuf>,
}

/// Application configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    #[serde(default)]
    content: ContentConfigRaw,
    pub menu: MenuConfig,
    pub blog: BlogConfig,

    /// Resolved content configuration (set after loading).
    #[serde(skip)]
    pub content_resolved: ContentConfig,
    /// Path to the config file (set after loading).
    #[serde(skip)]
    pub config_path: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self::default_with_base(Path::new("."))
    }
}

/// Server configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_owned(),
            port: 7979,
        }
    }
}

/// Raw content configuration as parsed from TOML.
#[derive(Debug, Deserialize, Default)]
#[serde(default)]
struct ContentConfigRaw {
    data_file: Option<String>,
    default_site: Option<String>,
}

/// Resolved content configuration with an absolute data file path.
#[derive(Debug, Default)]
pub struct ContentConfig {
    /// JSON snapshot holding all sites, pages and posts.
    pub data_file: PathBuf,
    /// Domain of the site served when the Host header matches no site.
    pub default_site: Option<String>,
}

/// Menu configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct MenuConfig {
    /// Child levels below the top-level entries.
    pub depth: usize,
}

impl Default for MenuConfig {
    fn default() -> Self {
        Self { depth: 2 }
    }
}

/// Blog configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct BlogConfig {
    /// Length of automatic excerpts, in characters.
    pub excerpt_max_chars: usize,
}

impl Default for BlogConfig {
    fn default() -> Self {
        Self {
            excerpt_max_chars: 300,
        }
    }
}

/// Configuration error.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Configuration file not found: {}", .0.display())]
    NotFound(PathBuf),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("Configuration error: {0}")]
    Validation(String),
    /// Environment variable error during expansion.
    #[error("Environment variable error in {field}: {message}")]
    EnvVar {
        /// Config field path (e.g., "`content.data_file`").
        field: String,
        /// Error message (e.g., "${`DATA_DIR`} not set").
        message: String,
    },
}

fn require_non_empty(value: &str, field: &str) -> Result<(), ConfigError> {
    if value.is_empty() {
        return Err(ConfigError::Validation(format!("{field} cannot be empty")));
    }
    Ok(())
}

impl Config {
    /// Load configuration from file with optional CLI settings.
    ///
    /// If `config_path` is provided, loads from that file. Otherwise,
    /// searches for `tracontent.toml` in the current directory and parents,
    /// falling back to defaults relative to the current directory.
    ///
    /// # Errors
    ///
    /// Returns error if explicit `config_path` doesn't exist, parsing fails
    /// or the result does not validate.
    pub fn load(
        config_path: Option<&Path>,
        cli_settings: Option<&CliSettings>,
    ) -> Result<Self, ConfigError> {
        let mut config = if let Some(path) = config_path {
            if !path.exists() {
                return Err(ConfigError::NotFound(path.to_path_buf()));
            }
            Self::load_from_file(path)?
        } else if let Some(discovered) = Self::discover_config() {
            Self::load_from_file(&discovered)?
        } else {
            Self::default_with_cwd()
        };

        if let Some(settings) = cli_settings {
            config.apply_cli_settings(settings);
            config.validate()?;
        }

        Ok(config)
    }

    fn apply_cli_settings(&mut self, settings: &CliSettings) {
        if let Some(host) = &settings.host {
            self.server.host.clone_from(host);
        }
        if let Some(port) = settings.port {
            self.server.port = port;
        }
        if let Some(data_file) = &settings.data_file {
            self.content_resolved.data_file.clone_from(data_file);
        }
    }

    fn discover_config() -> Option<PathBuf> {
        let mut current = std::env::current_dir().ok()?;
        loop {
            let candidate = current.join(CONFIG_FILENAME);
            if candidate.exists() {
                return Some(candidate);
            }
            if !current.pop() {
                return None;
            }
        }
    }

    fn default_with_cwd() -> Self {
        let cwd = std::env::current_dir().unwrap_or_default();
        Self::default_with_base(&cwd)
    }

    fn default_with_base(base: &Path) -> Self {
        Self {
            server: ServerConfig::default(),
            content: ContentConfigRaw::default(),
            menu: MenuConfig::default(),
            blog: BlogConfig::default(),
            content_resolved: ContentConfig {
                data_file: base.join("content.json"),
                default_site: None,
            },
            config_path: None,
        }
    }

    fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let mut config: Self = toml::from_str(&content)?;

        config.expand_env_vars()?;

        let config_dir = path.parent().unwrap_or(Path::new("."));
        config.resolve_paths(config_dir);
        config.config_path = Some(path.to_path_buf());

        config.validate()?;

        Ok(config)
    }

    /// Validate configuration values.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Validation` if any validation fails.
    pub fn validate(&self) -> Result<(), ConfigError> {
        require_non_empty(&self.server.host, "server.host")?;
        if self.server.port == 0 {
            return Err(ConfigError::Validation(
                "server.port cannot be 0".to_owned(),
            ));
        }

        if let Some(site) = &self.content_resolved.default_site {
            require_non_empty(site, "content.default_site")?;
        }

        if self.menu.depth > MAX_MENU_DEPTH {
            return Err(ConfigError::Validation(format!(
                "menu.depth cannot exceed {MAX_MENU_DEPTH}"
            )));
        }

        if self.blog.excerpt_max_chars == 0 {
            return Err(ConfigError::Validation(
                "blog.excerpt_max_chars must be greater than 0".to_owned(),
            ));
        }

        Ok(())
    }

    fn expand_env_vars(&mut self) -> Result<(), ConfigError> {
        self.server.host = expand::expand_env(&self.server.host, "server.host")?;

        if let Some(ref data_file) = self.content.data_file {
            self.content.data_file = Some(expand::expand_env(data_file, "content.data_file")?);
        }
        if let Some(ref site) = self.content.default_site {
            self.content.default_site = Some(expand::expand_env(site, "content.default_site")?);
        }

        Ok(())
    }

    /// Resolve the data file relative to the config directory.
    fn resolve_paths(&mut self, config_dir: &Path) {
        self.content_resolved = ContentConfig {
            data_file: config_dir.join(self.content.data_file.as_deref().unwrap_or("content.json")),
            default_site: self.content.default_site.clone(),
        };
    }
}
