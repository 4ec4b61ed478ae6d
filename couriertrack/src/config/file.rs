//! Configuration file handling for ~/.couriertrack/config.ini.
//!
//! Loads and saves user configuration with sensible defaults.
//! Settings structs live in [`super::settings`], constants in [`super::defaults`],
//! parsing in [`super::parser`], and serialization in [`super::writer`].

use std::path::{Path, PathBuf};
use std::time::Duration;

use ini::Ini;
use thiserror::Error;

use super::defaults::CONFIG_FILE_NAME;
use super::settings::{ConfigFile, RoutingBackend};
use crate::map::{PresenterConfig, ProviderStatus};
use crate::tracking::{ReconnectPolicy, TrackingConfig, DEFAULT_EVENT_CAPACITY};

/// Configuration file errors.
#[derive(Debug, Error)]
pub enum ConfigFileError {
    /// Failed to read config file
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] ini::Error),

    /// Failed to write config file
    #[error("Failed to write config file: {0}")]
    WriteError(String),

    /// Invalid configuration value
    #[error("Invalid configuration: {section}.{key} = '{value}' - {reason}")]
    InvalidValue {
        section: String,
        key: String,
        value: String,
        reason: String,
    },

    /// Failed to create config directory
    #[error("Failed to create config directory: {0}")]
    DirectoryError(std::io::Error),
}

impl ConfigFile {
    /// Load configuration from the default path (~/.couriertrack/config.ini).
    ///
    /// If the file doesn't exist, returns defaults.
    pub fn load() -> Result<Self, ConfigFileError> {
        let path = config_file_path();
        Self::load_from(&path)
    }

    /// Load configuration from a specific path.
    ///
    /// If the file doesn't exist, returns defaults.
    pub fn load_from(path: &Path) -> Result<Self, ConfigFileError> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let ini = Ini::load_from_file(path)?;
        super::parser::parse_ini(&ini)
    }

    /// Save configuration to the default path (~/.couriertrack/config.ini).
    pub fn save(&self) -> Result<(), ConfigFileError> {
        let path = config_file_path();
        self.save_to(&path)
    }

    /// Save configuration to a specific path.
    pub fn save_to(&self, path: &Path) -> Result<(), ConfigFileError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(ConfigFileError::DirectoryError)?;
        }

        let content = super::writer::to_config_string(self);
        std::fs::write(path, content).map_err(|e| ConfigFileError::WriteError(e.to_string()))
    }

    /// Create the default config file if it doesn't exist.
    ///
    /// Returns the path to the config file.
    pub fn ensure_exists() -> Result<PathBuf, ConfigFileError> {
        let path = config_file_path();
        if !path.exists() {
            let config = Self::default();
            config.save_to(&path)?;
        }
        Ok(path)
    }

    /// Connection manager configuration with `credential` as bearer token.
    pub fn tracking_config(&self, credential: Option<String>) -> TrackingConfig {
        TrackingConfig {
            endpoint: self.server.url.clone(),
            credential,
            connect_timeout: Duration::from_millis(self.server.connect_timeout_ms),
            reconnect: ReconnectPolicy {
                max_attempts: self.reconnect.max_attempts,
                initial_delay: Duration::from_millis(self.reconnect.initial_delay_ms),
                max_delay: Duration::from_millis(self.reconnect.max_delay_ms),
            },
            event_capacity: DEFAULT_EVENT_CAPACITY,
        }
    }

    /// Map presenter configuration.
    pub fn presenter_config(&self) -> PresenterConfig {
        PresenterConfig {
            zoom_debounce: Duration::from_millis(self.map.zoom_debounce_ms),
            travel_mode: self.map.travel_mode,
            ..Default::default()
        }
    }

    /// Initial provider status for the configured API key.
    pub fn provider_status(&self) -> ProviderStatus {
        ProviderStatus::from_credential(self.map.api_key.as_deref())
    }

    pub fn uses_osrm(&self) -> bool {
        self.map.routing == RoutingBackend::Osrm
    }
}

/// Get the path to the config directory (~/.couriertrack).
pub fn config_directory() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".couriertrack")
}

/// Get the path to the config file (~/.couriertrack/config.ini).
pub fn config_file_path() -> PathBuf {
    config_directory().join(CONFIG_FILE_NAME)
}

/// Expand ~ to home directory in paths.
pub(super) fn expand_tilde(path: &str) -> PathBuf {
    if let Some(stripped) = path.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return home.join(stripped);
        }
    }
    PathBuf::from(path)
}

/// Convert path to display string, collapsing home dir to ~.
pub(super) fn path_to_display(path: &Path) -> String {
    if let Some(home) = dirs::home_dir() {
        if let Ok(stripped) = path.strip_prefix(&home) {
            return format!("~/{}", stripped.display());
        }
    }
    path.display().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tracking::{DEFAULT_ENDPOINT, DEFAULT_MAX_RECONNECT_ATTEMPTS};
    use tempfile::TempDir;

    #[test]
    fn test_default_config() {
        let config = ConfigFile::default();

        assert_eq!(config.server.url, DEFAULT_ENDPOINT);
        assert_eq!(config.reconnect.max_attempts, DEFAULT_MAX_RECONNECT_ATTEMPTS);
        assert!(config.map.api_key.is_none());
        assert!(config.session.token_file.ends_with(".couriertrack/session"));
        assert!(!config.uses_osrm());
    }

    #[test]
    fn test_load_missing_file_returns_defaults() {
        let temp = TempDir::new().unwrap();
        let config = ConfigFile::load_from(&temp.path().join("missing.ini")).unwrap();
        assert_eq!(config, ConfigFile::default());
    }

    #[test]
    fn test_save_and_load() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("nested").join("config.ini");

        let mut config = ConfigFile::default();
        config.map.api_key = Some("secret".to_string());
        config.reconnect.initial_delay_ms = 1500;
        config.save_to(&path).unwrap();

        let loaded = ConfigFile::load_from(&path).unwrap();
        assert_eq!(loaded.map.api_key.as_deref(), Some("secret"));
        assert_eq!(loaded.reconnect.initial_delay_ms, 1500);
    }

    #[test]
    fn test_tracking_config_conversion() {
        let mut config = ConfigFile::default();
        config.reconnect.max_attempts = 3;
        config.reconnect.initial_delay_ms = 1000;
        config.reconnect.max_delay_ms = 3000;

        let tracking = config.tracking_config(Some("tok".to_string()));
        assert_eq!(tracking.credential.as_deref(), Some("tok"));
        assert_eq!(tracking.reconnect.max_attempts, 3);
        assert_eq!(tracking.reconnect.delay_for_attempt(3), Duration::from_millis(3000));
    }

    #[test]
    fn test_provider_status_follows_api_key() {
        let mut config = ConfigFile::default();
        assert_eq!(config.provider_status(), ProviderStatus::MissingCredential);
        config.map.api_key = Some("k".to_string());
        assert_eq!(config.provider_status(), ProviderStatus::Loading);
    }
}
