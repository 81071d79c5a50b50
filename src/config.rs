use crate::error::{AppError, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};

/// Environment variable holding the GitHub token
pub const GITHUB_TOKEN_ENV: &str = "GITHUB_TOKEN";
/// Environment variable holding the language model API key
pub const OPENAI_API_KEY_ENV: &str = "OPENAI_API_KEY";
/// Environment variable holding the backend URL the UI talks to
pub const API_URL_ENV: &str = "REPO2RESUME_API_URL";
/// Environment variable holding the server bind address
pub const BIND_ENV: &str = "REPO2RESUME_BIND";

/// Application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// GitHub token (needs `repo` scope to see private repositories)
    pub github_token: Option<String>,

    /// API key for the language model provider
    pub openai_api_key: Option<String>,

    /// GitHub REST API root
    #[serde(default = "default_github_api_url")]
    pub github_api_url: String,

    /// Chat completions API root
    #[serde(default = "default_openai_api_url")]
    pub openai_api_url: String,

    /// Model used for summaries
    #[serde(default = "default_model")]
    pub model: String,

    /// Sampling temperature (high by default, resume prose benefits from variety)
    #[serde(default = "default_temperature")]
    pub temperature: f32,

    /// Timeout applied by the HTTP clients, in seconds
    #[serde(default = "default_timeout")]
    pub request_timeout_secs: u64,

    /// Address the backend listens on
    #[serde(default = "default_bind_address")]
    pub bind_address: String,

    /// Backend base URL used by the UI
    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,

    /// Origins allowed by CORS
    #[serde(default = "default_allowed_origins")]
    pub allowed_origins: Vec<String>,
}

impl Config {
    /// Load configuration from a specific path
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(AppError::config(format!(
                "Config file not found at: {}",
                path.display()
            )));
        }

        let contents = fs::read_to_string(path)?;
        let config: Config = toml::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Get the default config file path
    pub fn default_config_path() -> Result<PathBuf> {
        let home = dirs::home_dir()
            .ok_or_else(|| AppError::config("Could not determine home directory"))?;
        Ok(home.join(".config").join("repo2resume").join("config.toml"))
    }

    /// Get the default cache directory path (UI log lives here)
    pub fn default_cache_dir() -> Result<PathBuf> {
        let home = dirs::home_dir()
            .ok_or_else(|| AppError::config("Could not determine home directory"))?;
        Ok(home.join(".cache").join("repo2resume"))
    }

    /// Create a default configuration file at the given location
    pub fn create_default_at(path: &Path) -> Result<Self> {
        // Create parent directories if they don't exist
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let config = Self::default();
        let toml_string = toml::to_string_pretty(&config)?;
        fs::write(path, toml_string)?;

        Ok(config)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if !(0.0..=2.0).contains(&self.temperature) {
            return Err(AppError::config("temperature must be between 0.0 and 2.0"));
        }

        if self.request_timeout_secs == 0 {
            return Err(AppError::config("request_timeout_secs must be > 0"));
        }

        for (name, url) in [
            ("github_api_url", &self.github_api_url),
            ("openai_api_url", &self.openai_api_url),
            ("api_base_url", &self.api_base_url),
        ] {
            if url.trim().is_empty() {
                return Err(AppError::config(format!("{} must not be empty", name)));
            }
        }

        self.socket_addr()?;
        Ok(())
    }

    /// Load config from a path (or the default location), creating the default if missing
    pub fn load_or_create_default(path: Option<&Path>) -> Result<Self> {
        let path = match path {
            Some(p) => p.to_path_buf(),
            None => Self::default_config_path()?,
        };

        match Self::load_from(&path) {
            Ok(config) => Ok(config),
            Err(AppError::Config(_)) if !path.exists() => {
                tracing::info!(path = %path.display(), "config file not found, creating default");
                Self::create_default_at(&path)
            }
            Err(e) => Err(e),
        }
    }

    /// Overlay values from the process environment
    pub fn with_env(self) -> Self {
        self.with_env_from(|key| std::env::var(key).ok())
    }

    /// Overlay values from an arbitrary environment lookup
    pub fn with_env_from<F>(mut self, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(token) = non_empty(GITHUB_TOKEN_ENV) {
            self.github_token = Some(token);
        }
        if let Some(key) = non_empty(OPENAI_API_KEY_ENV) {
            self.openai_api_key = Some(key);
        }
        if let Some(url) = non_empty(API_URL_ENV) {
            self.api_base_url = url;
        }
        if let Some(bind) = non_empty(BIND_ENV) {
            self.bind_address = bind;
        }
        self
    }

    /// GitHub token, or an error naming where to put it
    pub fn github_token(&self) -> Result<&str> {
        self.github_token
            .as_deref()
            .filter(|t| !t.is_empty())
            .ok_or_else(|| {
                AppError::MissingConfig(format!(
                    "github_token (set {} or add it to the config file)",
                    GITHUB_TOKEN_ENV
                ))
            })
    }

    /// Language model API key, or an error naming where to put it
    pub fn openai_api_key(&self) -> Result<&str> {
        self.openai_api_key
            .as_deref()
            .filter(|k| !k.is_empty())
            .ok_or_else(|| {
                AppError::MissingConfig(format!(
                    "openai_api_key (set {} or add it to the config file)",
                    OPENAI_API_KEY_ENV
                ))
            })
    }

    /// Parsed bind address
    pub fn socket_addr(&self) -> Result<SocketAddr> {
        self.bind_address.parse().map_err(|_| {
            AppError::config(format!("Invalid bind_address: {}", self.bind_address))
        })
    }

    /// Copy with secrets masked, for display
    pub fn redacted(&self) -> Self {
        let mask = |s: &Option<String>| s.as_ref().map(|_| "********".to_string());
        Self {
            github_token: mask(&self.github_token),
            openai_api_key: mask(&self.openai_api_key),
            ..self.clone()
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            github_token: None,
            openai_api_key: None,
            github_api_url: default_github_api_url(),
            openai_api_url: default_openai_api_url(),
            model: default_model(),
            temperature: default_temperature(),
            request_timeout_secs: default_timeout(),
            bind_address: default_bind_address(),
            api_base_url: default_api_base_url(),
            allowed_origins: default_allowed_origins(),
        }
    }
}

// Serde default functions
fn default_github_api_url() -> String {
    "https://api.github.com".to_string()
}

fn default_openai_api_url() -> String {
    "https://api.openai.com/v1".to_string()
}

fn default_model() -> String {
    "gpt-4o-mini".to_string()
}

fn default_temperature() -> f32 {
    1.0
}

fn default_timeout() -> u64 {
    60
}

fn default_bind_address() -> String {
    "127.0.0.1:8000".to_string()
}

fn default_api_base_url() -> String {
    "http://localhost:8000".to_string()
}

fn default_allowed_origins() -> Vec<String> {
    vec!["http://localhost:3000".to_string()]
}
