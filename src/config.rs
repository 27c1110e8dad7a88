use serde::Deserialize;
use std::fs;
use std::path::Path;
use thiserror::Error;

pub const CONFIG_FILE: &str = ".pullreq.toml";
pub const DEFAULT_API_URL: &str = "https://api.github.com";
pub const DEFAULT_BASE_BRANCH: &str = "master";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    FileRead(#[from] std::io::Error),

    #[error("Failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Top-level configuration loaded from .pullreq.toml.
/// All fields are optional — the tool works with zero config.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    /// GitHub-specific settings
    #[serde(default)]
    pub github: GitHubConfig,

    /// Defaults for the pull-request command
    #[serde(default)]
    pub pull_request: PullRequestConfig,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct GitHubConfig {
    /// GitHub API token. If None, falls back to GITHUB_TOKEN env var.
    pub token: Option<String>,
    /// API root, for GitHub Enterprise installs.
    pub api_url: Option<String>,
    /// Overrides the owner derived from the origin remote.
    pub owner: Option<String>,
    /// Overrides the repository name derived from the origin remote.
    pub repo: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PullRequestConfig {
    /// Branch used for the default `-b` value
    pub default_base_branch: Option<String>,
    /// Editor command; takes precedence over git's configured editor
    pub editor: Option<String>,
}

impl Config {
    /// Load configuration from .pullreq.toml in the current directory.
    /// Returns default config if the file doesn't exist.
    pub fn load() -> Result<Config, ConfigError> {
        let path = Path::new(CONFIG_FILE);
        let mut config = if path.exists() {
            Self::load_from(path)?
        } else {
            Config::default()
        };

        if config.github.token.is_none() {
            if let Ok(token) = std::env::var("GITHUB_TOKEN") {
                config.github.token = Some(token);
            }
        }

        Ok(config)
    }

    /// Load from a specific path (useful for testing).
    pub fn load_from(path: &Path) -> Result<Config, ConfigError> {
        let contents = fs::read_to_string(path)?;
        let config = toml::from_str(&contents)?;
        Ok(config)
    }

    /// Resolve the GitHub token: config file value takes precedence,
    /// falls back to GITHUB_TOKEN env var.
    pub fn github_token(&self) -> Option<String> {
        self.github
            .token
            .clone()
            .or_else(|| std::env::var("GITHUB_TOKEN").ok())
    }

    pub fn api_url(&self) -> &str {
        self.github
            .api_url
            .as_deref()
            .filter(|url| !url.trim().is_empty())
            .unwrap_or(DEFAULT_API_URL)
    }

    pub fn default_base_branch(&self) -> &str {
        self.pull_request
            .default_base_branch
            .as_deref()
            .filter(|branch| !branch.trim().is_empty())
            .unwrap_or(DEFAULT_BASE_BRANCH)
    }
}
