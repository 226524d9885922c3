//! Configuration management for KhetSetu.
//!
//! Loads configuration from ${KHETSETU_HOME}/config.toml with sensible defaults.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// Default backend origin for local development.
pub const DEFAULT_API_URL: &str = "http://localhost:5000/api";

/// Main configuration structure.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    /// Base URL of the KhetSetu backend API.
    pub api_url: Option<String>,
}

impl Config {
    /// Loads configuration from the default path.
    ///
    /// # Errors
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn load() -> Result<Self> {
        Self::load_from(&paths::config_path())
    }

    /// Loads configuration from a specific path.
    /// Returns defaults if the file doesn't exist.
    ///
    /// # Errors
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config from {}", path.display()))?;

        toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config from {}", path.display()))
    }

    /// Resolves the backend base URL with precedence: env > config > default.
    /// Validates that the URL is well-formed.
    ///
    /// # Errors
    /// Returns an error if the resolved URL does not parse.
    pub fn resolve_api_url(&self) -> Result<String> {
        if let Ok(env_url) = std::env::var("KHETSETU_API_URL") {
            let trimmed = env_url.trim();
            if !trimmed.is_empty() {
                validate_url(trimmed)?;
                return Ok(trimmed.to_string());
            }
        }

        if let Some(config_url) = &self.api_url {
            let trimmed = config_url.trim();
            if !trimmed.is_empty() {
                validate_url(trimmed)?;
                return Ok(trimmed.to_string());
            }
        }

        Ok(DEFAULT_API_URL.to_string())
    }

    /// Creates a default config file at the given path.
    /// Returns an error if the file already exists.
    ///
    /// # Errors
    /// Returns an error if the operation fails.
    pub fn init(path: &Path) -> Result<()> {
        if path.exists() {
            anyhow::bail!("Config file already exists at {}", path.display());
        }

        Self::write_config(path, default_config_template())
    }

    /// Saves only the api_url field to the config file.
    ///
    /// Creates the file if it doesn't exist.
    /// Preserves existing fields and comments using toml_edit.
    ///
    /// # Errors
    /// Returns an error if the operation fails.
    pub fn save_api_url(api_url: &str) -> Result<()> {
        Self::save_api_url_to(&paths::config_path(), api_url)
    }

    /// Saves only the api_url field to a specific config file path.
    ///
    /// # Errors
    /// Returns an error if the operation fails.
    pub fn save_api_url_to(path: &Path, api_url: &str) -> Result<()> {
        use toml_edit::{value, DocumentMut};

        validate_url(api_url)?;

        let contents = if path.exists() {
            fs::read_to_string(path)
                .with_context(|| format!("Failed to read config from {}", path.display()))?
        } else {
            default_config_template().to_string()
        };

        let mut doc: DocumentMut = contents
            .parse()
            .with_context(|| format!("Failed to parse config from {}", path.display()))?;

        doc["api_url"] = value(api_url);

        Self::write_config(path, &doc.to_string())
    }

    /// Writes config content to a file, creating parent directories as needed.
    /// Uses atomic write (temp file + rename) to prevent corruption.
    fn write_config(path: &Path, content: &str) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory {}", parent.display()))?;
        }

        let tmp_path = path.with_extension("toml.tmp");
        fs::write(&tmp_path, content)
            .with_context(|| format!("Failed to write config to {}", tmp_path.display()))?;
        fs::rename(&tmp_path, path).with_context(|| {
            format!(
                "Failed to rename {} to {}",
                tmp_path.display(),
                path.display()
            )
        })?;

        Ok(())
    }
}

fn validate_url(raw: &str) -> Result<()> {
    url::Url::parse(raw).with_context(|| format!("Invalid KhetSetu API URL: {raw}"))?;
    Ok(())
}

/// Returns the embedded default config template.
fn default_config_template() -> &'static str {
    "# KhetSetu client configuration\n\
     #\n\
     # Base URL of the backend API. Overridden by KHETSETU_API_URL.\n\
     # api_url = \"http://localhost:5000/api\"\n"
}

pub mod paths {
    //! Path resolution for KhetSetu configuration and data directories.
    //!
    //! KHETSETU_HOME resolution order:
    //! 1. KHETSETU_HOME environment variable (if set)
    //! 2. ~/.config/khetsetu (default)

    use std::path::PathBuf;

    /// Returns the KhetSetu home directory.
    ///
    /// Checks KHETSETU_HOME env var first, falls back to ~/.config/khetsetu
    pub fn khetsetu_home() -> PathBuf {
        if let Ok(home) = std::env::var("KHETSETU_HOME") {
            return PathBuf::from(home);
        }

        dirs::home_dir()
            .map(|h| h.join(".config").join("khetsetu"))
            .expect("Could not determine home directory")
    }

    /// Returns the path to the config.toml file.
    pub fn config_path() -> PathBuf {
        khetsetu_home().join("config.toml")
    }

    /// Returns the path to the persisted session token file.
    pub fn session_path() -> PathBuf {
        khetsetu_home().join("session.json")
    }

    /// Returns the log directory.
    pub fn logs_dir() -> PathBuf {
        khetsetu_home().join("logs")
    }
}
