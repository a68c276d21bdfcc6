use anyhow::{Context as AnyhowContext, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const DEFAULT_CONFIG_FILE: &str = "qualstat.toml";

pub const ENV_SERVICE_URL: &str = "QUALSTAT_SERVICE_URL";
pub const ENV_SERVICE_TIMEOUT_MS: &str = "QUALSTAT_SERVICE_TIMEOUT_MS";
pub const ENV_PROJECTS_DIR: &str = "QUALSTAT_PROJECTS_DIR";
pub const ENV_BIND: &str = "QUALSTAT_BIND";

/// Runtime configuration: defaults, then the TOML file, then environment,
/// then command-line flags (applied by the caller).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub service: ServiceConfig,
    pub store: StoreConfig,
    pub server: ServerConfig,
}

/// Where the numeric computation service lives.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    pub endpoint: String,
    /// No timeout when unset.
    pub timeout_ms: Option<u64>,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            endpoint: "http://127.0.0.1:5001/".to_string(),
            timeout_ms: None,
        }
    }
}

/// Directory of `<projectId>.json` snapshots.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    pub root: PathBuf,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::from("projects"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub bind: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: "127.0.0.1:8080".to_string(),
        }
    }
}

impl AppConfig {
    /// Read `path`, or `qualstat.toml` in the working directory when it exists.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let path = match path {
            Some(path) => path.to_path_buf(),
            None => {
                let default = PathBuf::from(DEFAULT_CONFIG_FILE);
                if !default.exists() {
                    return Ok(Self::default());
                }
                default
            }
        };
        let raw = std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        Self::from_toml(&raw).with_context(|| format!("Invalid {}", path.display()))
    }

    pub fn from_toml(raw: &str) -> Result<Self> {
        toml::from_str(raw).map_err(Into::into)
    }

    pub fn apply_env(&mut self) -> Result<()> {
        self.apply_env_from(|key| std::env::var(key).ok())
    }

    pub fn apply_env_from(&mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<()> {
        if let Some(url) = lookup(ENV_SERVICE_URL) {
            self.service.endpoint = url;
        }
        if let Some(raw) = lookup(ENV_SERVICE_TIMEOUT_MS) {
            let ms = raw
                .trim()
                .parse::<u64>()
                .with_context(|| format!("{ENV_SERVICE_TIMEOUT_MS} must be an integer, got '{raw}'"))?;
            self.service.timeout_ms = Some(ms);
        }
        if let Some(dir) = lookup(ENV_PROJECTS_DIR) {
            self.store.root = PathBuf::from(dir);
        }
        if let Some(bind) = lookup(ENV_BIND) {
            self.server.bind = bind;
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<(), String> {
        let endpoint = self.service.endpoint.trim();
        if endpoint.is_empty() {
            return Err("service.endpoint must not be empty".to_string());
        }
        if !(endpoint.starts_with("http://") || endpoint.starts_with("https://")) {
            return Err(format!(
                "service.endpoint must start with http:// or https:// (got '{endpoint}')"
            ));
        }
        if self.service.timeout_ms == Some(0) {
            return Err("service.timeout_ms must be > 0".to_string());
        }
        if self.server.bind.trim().is_empty() {
            return Err("server.bind must not be empty".to_string());
        }
        Ok(())
    }
}
