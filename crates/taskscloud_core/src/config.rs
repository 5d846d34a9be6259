//! Core runtime configuration.
//!
//! # Responsibility
//! - Describe database, logging and auth settings in one serde document.
//! - Load and validate the document from JSON.
//!
//! # Invariants
//! - Every section has defaults; an empty document `{}` is valid.
//! - Unknown keys are rejected so typos do not silently fall back.

use crate::logging::{default_log_level, normalize_level};
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::{Path, PathBuf};

/// Minimum password length enforced at registration.
pub const DEFAULT_MIN_PASSWORD_LEN: usize = 6;

/// Top-level configuration document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CoreConfig {
    pub database: DatabaseConfig,
    pub logging: LoggingConfig,
    pub auth: AuthConfig,
}

/// Storage location. `path = None` keeps the store in memory.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DatabaseConfig {
    pub path: Option<PathBuf>,
}

/// File logging settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LoggingConfig {
    /// One of `trace|debug|info|warn|error`.
    pub level: String,
    /// Absolute directory for rolling log files. Logging stays off when unset.
    pub dir: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level().to_string(),
            dir: None,
        }
    }
}

/// Authentication policy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AuthConfig {
    pub min_password_len: usize,
    /// Initial state of the "remember me" toggle on the login view.
    pub remember_me_default: bool,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            min_password_len: DEFAULT_MIN_PASSWORD_LEN,
            remember_me_default: true,
        }
    }
}

#[derive(Debug)]
pub enum ConfigError {
    Io { path: PathBuf, source: std::io::Error },
    Parse(serde_json::Error),
    Invalid(String),
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io { path, source } => {
                write!(f, "failed to read config `{}`: {source}", path.display())
            }
            Self::Parse(err) => write!(f, "invalid config document: {err}"),
            Self::Invalid(message) => write!(f, "invalid config value: {message}"),
        }
    }
}

impl Error for ConfigError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Io { source, .. } => Some(source),
            Self::Parse(err) => Some(err),
            Self::Invalid(_) => None,
        }
    }
}

impl CoreConfig {
    /// Parses and validates a JSON configuration document.
    pub fn from_json_str(text: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(text).map_err(ConfigError::Parse)?;
        config.validate()?;
        Ok(config)
    }

    /// Reads, parses and validates a JSON configuration file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&text)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        normalize_level(&self.logging.level).map_err(|err| ConfigError::Invalid(err.to_string()))?;
        if let Some(dir) = self.logging.dir.as_ref() {
            if !dir.is_absolute() {
                return Err(ConfigError::Invalid(format!(
                    "logging.dir must be an absolute path, got `{}`",
                    dir.display()
                )));
            }
        }
        if self.auth.min_password_len == 0 {
            return Err(ConfigError::Invalid(
                "auth.min_password_len must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}
