//! Configuration loading and management
//!
//! Handles parsing of `.taskboard.toml` configuration files.

use std::path::{Path, PathBuf};

use directories::ProjectDirs;
use serde::{Deserialize, Serialize};

use crate::policy::Role;

/// File name looked up in the working directory.
pub const CONFIG_FILENAME: &str = ".taskboard.toml";

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// REST API configuration
    #[serde(default)]
    pub api: ApiConfig,

    /// Board presentation configuration
    #[serde(default)]
    pub board: BoardConfig,

    /// Actor configuration
    #[serde(default)]
    pub actor: ActorConfig,
}

/// REST API configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Base URL the collection paths (`/tasks`, `/users`, ...) hang off
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Environment variable holding the bearer token
    #[serde(default = "default_token_env")]
    pub token_env: String,

    /// Page size used when fetching the whole task collection
    #[serde(default = "default_fetch_page_size")]
    pub fetch_page_size: usize,
}

fn default_base_url() -> String {
    "http://localhost:3000/api".to_string()
}

fn default_token_env() -> String {
    "TASKBOARD_TOKEN".to_string()
}

fn default_fetch_page_size() -> usize {
    1000
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            token_env: default_token_env(),
            fetch_page_size: default_fetch_page_size(),
        }
    }
}

impl ApiConfig {
    /// Bearer token from the configured environment variable, if set.
    pub fn token(&self) -> Option<String> {
        std::env::var(&self.token_env)
            .ok()
            .map(|token| token.trim().to_string())
            .filter(|token| !token.is_empty())
    }
}

/// Board configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoardConfig {
    /// Items per column page when a board is opened
    #[serde(default = "default_items_per_page")]
    pub items_per_page: usize,

    /// Page sizes a column may be switched to
    #[serde(default = "default_page_size_options")]
    pub page_size_options: Vec<usize>,
}

fn default_items_per_page() -> usize {
    10
}

fn default_page_size_options() -> Vec<usize> {
    vec![5, 10, 20, 50]
}

impl Default for BoardConfig {
    fn default() -> Self {
        Self {
            items_per_page: default_items_per_page(),
            page_size_options: default_page_size_options(),
        }
    }
}

/// Actor-related configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActorConfig {
    /// Role used when none is given on the command line
    #[serde(default = "default_role")]
    pub role: Role,

    /// User id used to scope fetches for the user role
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
}

fn default_role() -> Role {
    Role::User
}

impl Default for ActorConfig {
    fn default() -> Self {
        Self {
            role: default_role(),
            user_id: None,
        }
    }
}

impl Config {
    /// Load configuration from a TOML file
    pub fn load(path: &Path) -> crate::error::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load `.taskboard.toml` from `dir`, then the per-user config, or return defaults
    pub fn discover(dir: &Path) -> crate::error::Result<Self> {
        let local = dir.join(CONFIG_FILENAME);
        if local.exists() {
            return Self::load(&local);
        }
        if let Some(user) = user_config_path() {
            if user.exists() {
                return Self::load(&user);
            }
        }
        Ok(Self::default())
    }

    /// Save configuration to a file
    pub fn save(&self, path: &Path) -> crate::error::Result<()> {
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Check every section; `load` calls this, overrides applied later should too.
    pub fn validate(&self) -> crate::error::Result<()> {
        self.api.validate()?;
        self.board.validate()?;
        Ok(())
    }
}

/// Per-user config file location (`<config dir>/taskboard/config.toml`).
pub fn user_config_path() -> Option<PathBuf> {
    ProjectDirs::from("", "", "taskboard").map(|dirs| dirs.config_dir().join("config.toml"))
}

impl ApiConfig {
    fn validate(&self) -> crate::error::Result<()> {
        let base = self.base_url.trim();
        if base.is_empty() {
            return Err(crate::error::Error::InvalidConfig(
                "api.base_url cannot be empty".to_string(),
            ));
        }
        if !(base.starts_with("http://") || base.starts_with("https://")) {
            return Err(crate::error::Error::InvalidConfig(format!(
                "api.base_url '{base}' must start with http:// or https://"
            )));
        }
        if self.token_env.trim().is_empty() {
            return Err(crate::error::Error::InvalidConfig(
                "api.token_env cannot be empty".to_string(),
            ));
        }
        if self.fetch_page_size == 0 {
            return Err(crate::error::Error::InvalidConfig(
                "api.fetch_page_size must be > 0".to_string(),
            ));
        }
        Ok(())
    }
}

impl BoardConfig {
    fn validate(&self) -> crate::error::Result<()> {
        if self.page_size_options.is_empty() {
            return Err(crate::error::Error::InvalidConfig(
                "board.page_size_options cannot be empty".to_string(),
            ));
        }
        if self.page_size_options.iter().any(|size| *size == 0) {
            return Err(crate::error::Error::InvalidConfig(
                "board.page_size_options entries must be > 0".to_string(),
            ));
        }
        if !self.page_size_options.contains(&self.items_per_page) {
            return Err(crate::error::Error::InvalidConfig(format!(
                "board.items_per_page {} not in board.page_size_options",
                self.items_per_page
            )));
        }
        Ok(())
    }
}
