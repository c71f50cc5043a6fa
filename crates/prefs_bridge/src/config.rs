//! TOML-backed bridge configuration.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;

/// Channel name used when the configuration does not set one.
pub const DEFAULT_CHANNEL: &str = "prefs/user_defaults";

/// Bridge configuration.
///
/// ```toml
/// channel = "prefs/user_defaults"
/// app_identity = "com.example.app"
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BridgeConfig {
    /// IPC channel name the host registers the bridge under.
    pub channel: String,
    /// Application identity whose preference domain `clear` removes. When unset, `clear` only
    /// flushes the store.
    pub app_identity: Option<String>,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            channel: DEFAULT_CHANNEL.to_string(),
            app_identity: None,
        }
    }
}

#[derive(Debug, Error)]
/// Configuration loading failures.
pub enum ConfigError {
    /// The config file could not be read.
    #[error("failed to read {}: {source}", .path.display())]
    Read {
        /// Config file path.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: io::Error,
    },
    /// The config file is not valid TOML for [`BridgeConfig`].
    #[error("failed to parse {}: {source}", .path.display())]
    Parse {
        /// Config file path, or `<inline>` for string input.
        path: PathBuf,
        /// Underlying TOML error.
        #[source]
        source: toml::de::Error,
    },
    /// The config parsed but holds an unusable value.
    #[error("invalid bridge config {}: {message}", .path.display())]
    Invalid {
        /// Config file path, or `<inline>` for string input.
        path: PathBuf,
        /// What is wrong.
        message: String,
    },
    /// The configured identity names a different domain than the store writes into, so `clear`
    /// would miss every value the bridge stored.
    #[error("app identity `{configured}` does not match store domain `{store}`")]
    IdentityMismatch {
        /// Identity from the config.
        configured: String,
        /// Domain reported by the store.
        store: String,
    },
}

impl BridgeConfig {
    /// Parses and validates a TOML document.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] or [`ConfigError::Invalid`].
    pub fn from_toml_str(body: &str) -> Result<Self, ConfigError> {
        Self::parse(Path::new("<inline>"), body)
    }

    /// Reads, parses, and validates the config file at `path`.
    ///
    /// # Errors
    ///
    /// Missing or unreadable files, TOML failures, and invalid values are all errors.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let body = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(path, &body)
    }

    /// Like [`BridgeConfig::load`], but a missing file yields the defaults.
    ///
    /// # Errors
    ///
    /// Returns every error [`BridgeConfig::load`] does except a missing file.
    pub fn load_or_default(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        match Self::load(path) {
            Err(ConfigError::Read { source, .. }) if source.kind() == io::ErrorKind::NotFound => {
                Ok(Self::default())
            }
            other => other,
        }
    }

    /// Returns this config with `app_identity` filled in when it is unset.
    pub fn with_fallback_identity(mut self, identity: impl Into<String>) -> Self {
        if self.app_identity.is_none() {
            self.app_identity = Some(identity.into());
        }
        self
    }

    fn parse(path: &Path, body: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(body).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        config.validate(path)?;
        Ok(config)
    }

    fn validate(&self, path: &Path) -> Result<(), ConfigError> {
        let invalid = |message: &str| ConfigError::Invalid {
            path: path.to_path_buf(),
            message: message.to_string(),
        };
        if self.channel.trim().is_empty() {
            return Err(invalid("`channel` must not be empty"));
        }
        if matches!(&self.app_identity, Some(identity) if identity.trim().is_empty()) {
            return Err(invalid("`app_identity` must not be empty when set"));
        }
        Ok(())
    }
}
