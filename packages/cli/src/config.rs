use lexdraft_client::ClientConfig;
use lexdraft_editor::EditorConfig;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

pub const DEFAULT_CONFIG_NAME: &str = "lexdraft.config.json";

/// Read when the config file has no token
pub const AUTH_TOKEN_ENV: &str = "LEXDRAFT_AUTH_TOKEN";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Invalid config in {path}: {source}")]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("Failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// lexdraft configuration file format
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    /// Base URL of the document service
    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,

    /// Bearer token attached to every request
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auth_token: Option<String>,

    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    #[serde(default)]
    pub editor: EditorConfig,
}

fn default_api_base_url() -> String {
    "http://localhost:8000/api".to_string()
}

fn default_timeout_secs() -> u64 {
    30
}

impl Config {
    pub fn path_in(dir: &Path) -> PathBuf {
        dir.join(DEFAULT_CONFIG_NAME)
    }

    /// Load config from a directory
    pub fn load(dir: &Path) -> Result<Self, ConfigError> {
        let path = Self::path_in(dir);

        if !path.exists() {
            // Return default config if none exists
            return Ok(Config::default());
        }

        let content = std::fs::read_to_string(&path).map_err(|source| ConfigError::Read {
            path: path.clone(),
            source,
        })?;
        serde_json::from_str(&content).map_err(|source| ConfigError::Parse { path, source })
    }

    pub fn save(&self, dir: &Path) -> Result<PathBuf, ConfigError> {
        let path = Self::path_in(dir);
        let json = serde_json::to_string_pretty(self).map_err(|source| ConfigError::Parse {
            path: path.clone(),
            source,
        })?;
        std::fs::write(&path, json).map_err(|source| ConfigError::Write {
            path: path.clone(),
            source,
        })?;
        Ok(path)
    }

    pub fn client_config(&self) -> ClientConfig {
        let mut client = ClientConfig::new(&self.api_base_url)
            .with_timeout(Duration::from_secs(self.timeout_secs));
        let token = self
            .auth_token
            .clone()
            .or_else(|| std::env::var(AUTH_TOKEN_ENV).ok());
        if let Some(token) = token {
            client = client.with_auth_token(token);
        }
        client
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_base_url: default_api_base_url(),
            auth_token: None,
            timeout_secs: default_timeout_secs(),
            editor: EditorConfig::default(),
        }
    }
}
