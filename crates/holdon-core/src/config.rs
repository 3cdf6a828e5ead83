//! Configuration parsing and management.
//!
//! The daemon reads a small TOML file for paths and the intercept-surface
//! URL, with compiled-in defaults for everything. The blocked-domain list
//! may be overridden here (the full product feeds it from onboarding), but
//! it is fixed for the process lifetime either way.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::domain::{self, BlockedDomains};

/// Top-level configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct HoldonConfig {
    /// Daemon configuration.
    #[serde(default)]
    pub daemon: DaemonConfig,

    /// Override for the compiled-in blocked-domain list.
    #[serde(default)]
    pub blocked_domains: Option<Vec<String>>,
}

impl HoldonConfig {
    /// Load configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(ConfigError::Io)?;
        Self::from_toml(&content)
    }

    /// Parse configuration from a TOML string.
    ///
    /// # Errors
    ///
    /// Returns an error if the TOML is invalid or fails validation.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content).map_err(ConfigError::Parse)?;
        config.validate()?;
        Ok(config)
    }

    /// Serialize configuration to TOML.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(ConfigError::Serialize)
    }

    /// The effective blocked-domain set.
    #[must_use]
    pub fn blocked(&self) -> BlockedDomains {
        match &self.blocked_domains {
            Some(domains) => BlockedDomains::new(domains.clone()),
            None => BlockedDomains::default(),
        }
    }

    /// Validate the configuration.
    ///
    /// The intercept URL must parse, and its host must not itself fall in
    /// the blocked set: the redirect target being re-classified as blocked
    /// would loop every interception forever.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Validation`] on either violation.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let intercept = &self.daemon.intercept_url;
        if url::Url::parse(intercept).is_err() {
            return Err(ConfigError::Validation(format!(
                "intercept_url '{intercept}' is not a valid URL"
            )));
        }
        if let Some(host) = domain::host_of(intercept) {
            if self.blocked().is_blocked(&host) {
                return Err(ConfigError::Validation(format!(
                    "intercept_url host '{host}' overlaps the blocked-domain list"
                )));
            }
        }
        Ok(())
    }
}

/// Daemon configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DaemonConfig {
    /// Path to the Unix socket.
    #[serde(default = "default_socket")]
    pub socket: PathBuf,

    /// Directory holding the durable state files.
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,

    /// Path to the PID file.
    #[serde(default = "default_pid_file")]
    pub pid_file: PathBuf,

    /// URL of the interception surface; the redirect target for blocked
    /// navigations.
    #[serde(default = "default_intercept_url")]
    pub intercept_url: String,
}

impl Default for DaemonConfig {
    fn default() -> Self {
        Self {
            socket: default_socket(),
            data_dir: default_data_dir(),
            pid_file: default_pid_file(),
            intercept_url: default_intercept_url(),
        }
    }
}

fn default_socket() -> PathBuf {
    PathBuf::from("holdon.sock")
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("state")
}

fn default_pid_file() -> PathBuf {
    PathBuf::from("holdon.pid")
}

fn default_intercept_url() -> String {
    "holdon://intercept".to_string()
}

/// Resolve the holdon home directory: `$HOLDON_HOME`, else `~/.holdon`,
/// else the current directory.
#[must_use]
pub fn resolve_holdon_home() -> PathBuf {
    if let Ok(home) = std::env::var("HOLDON_HOME") {
        return PathBuf::from(home);
    }
    if let Ok(home) = std::env::var("HOME") {
        return PathBuf::from(home).join(".holdon");
    }
    PathBuf::from(".")
}

/// Expand a possibly-relative configured path against the holdon home.
#[must_use]
pub fn normalize_path(path: &Path, home: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        home.join(path)
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// File could not be read.
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    /// TOML parse failure.
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    /// TOML serialize failure.
    #[error("failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),

    /// Semantic validation failure.
    #[error("invalid config: {0}")]
    Validation(String),
}
