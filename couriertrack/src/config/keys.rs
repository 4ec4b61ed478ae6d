//! Configuration key access and validation.
//!
//! This module provides a type-safe interface for getting and setting
//! configuration values by key name, with validation via the Specification Pattern.

use std::str::FromStr;

use thiserror::Error;

use super::file::{expand_tilde, path_to_display};
use super::settings::ConfigFile;

/// Errors that can occur when getting or setting configuration values.
#[derive(Debug, Error)]
pub enum ConfigKeyError {
    /// Unknown configuration key.
    #[error("Unknown configuration key '{0}'")]
    UnknownKey(String),

    /// Validation failed for the value.
    #[error("Invalid value for {key}: {reason}")]
    ValidationFailed { key: String, reason: String },
}

/// Supported configuration keys.
///
/// Each key maps to a specific field in [`ConfigFile`] and knows how to
/// get and set its value with proper validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigKey {
    // Server settings
    ServerUrl,
    ServerConnectTimeoutMs,

    // Reconnect settings
    ReconnectMaxAttempts,
    ReconnectInitialDelayMs,
    ReconnectMaxDelayMs,

    // Session settings
    SessionTokenFile,

    // Map settings
    MapApiKey,
    MapTravelMode,
    MapRouting,
    MapOsrmUrl,
    MapZoomDebounceMs,
    MapCourierSpeedKmh,

    // Logging settings
    LoggingFile,
}

impl FromStr for ConfigKey {
    type Err = ConfigKeyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ConfigKey::all()
            .iter()
            .copied()
            .find(|key| key.name() == s.to_lowercase())
            .ok_or_else(|| ConfigKeyError::UnknownKey(s.to_string()))
    }
}

impl ConfigKey {
    /// Get the canonical key name (e.g., "reconnect.max_attempts").
    pub fn name(&self) -> &'static str {
        match self {
            ConfigKey::ServerUrl => "server.url",
            ConfigKey::ServerConnectTimeoutMs => "server.connect_timeout_ms",
            ConfigKey::ReconnectMaxAttempts => "reconnect.max_attempts",
            ConfigKey::ReconnectInitialDelayMs => "reconnect.initial_delay_ms",
            ConfigKey::ReconnectMaxDelayMs => "reconnect.max_delay_ms",
            ConfigKey::SessionTokenFile => "session.token_file",
            ConfigKey::MapApiKey => "map.api_key",
            ConfigKey::MapTravelMode => "map.travel_mode",
            ConfigKey::MapRouting => "map.routing",
            ConfigKey::MapOsrmUrl => "map.osrm_url",
            ConfigKey::MapZoomDebounceMs => "map.zoom_debounce_ms",
            ConfigKey::MapCourierSpeedKmh => "map.courier_speed_kmh",
            ConfigKey::LoggingFile => "logging.file",
        }
    }

    /// Get the section name (e.g., "reconnect").
    pub fn section(&self) -> &'static str {
        self.name().split('.').next().unwrap_or("")
    }

    /// Get the key name within the section (e.g., "max_attempts").
    pub fn key_name(&self) -> &'static str {
        self.name().split('.').nth(1).unwrap_or(self.name())
    }

    /// Get the value from a config file as a string.
    pub fn get(&self, config: &ConfigFile) -> String {
        match self {
            ConfigKey::ServerUrl => config.server.url.clone(),
            ConfigKey::ServerConnectTimeoutMs => config.server.connect_timeout_ms.to_string(),
            ConfigKey::ReconnectMaxAttempts => config.reconnect.max_attempts.to_string(),
            ConfigKey::ReconnectInitialDelayMs => config.reconnect.initial_delay_ms.to_string(),
            ConfigKey::ReconnectMaxDelayMs => config.reconnect.max_delay_ms.to_string(),
            ConfigKey::SessionTokenFile => path_to_display(&config.session.token_file),
            ConfigKey::MapApiKey => config.map.api_key.clone().unwrap_or_default(),
            ConfigKey::MapTravelMode => config.map.travel_mode.to_string(),
            ConfigKey::MapRouting => config.map.routing.to_string(),
            ConfigKey::MapOsrmUrl => config.map.osrm_url.clone(),
            ConfigKey::MapZoomDebounceMs => config.map.zoom_debounce_ms.to_string(),
            ConfigKey::MapCourierSpeedKmh => config.map.courier_speed_kmh.to_string(),
            ConfigKey::LoggingFile => path_to_display(&config.logging.file),
        }
    }

    /// Set the value in a config file.
    ///
    /// Validates the value according to the key's specification before setting.
    pub fn set(&self, config: &mut ConfigFile, value: &str) -> Result<(), ConfigKeyError> {
        let value = value.trim();
        self.validate(value)?;

        let mut next = config.clone();
        match self {
            ConfigKey::ServerUrl => next.server.url = value.to_string(),
            ConfigKey::ServerConnectTimeoutMs => {
                next.server.connect_timeout_ms = self.parse(value)?;
            }
            ConfigKey::ReconnectMaxAttempts => {
                next.reconnect.max_attempts = self.parse(value)?;
            }
            ConfigKey::ReconnectInitialDelayMs => {
                next.reconnect.initial_delay_ms = self.parse(value)?;
            }
            ConfigKey::ReconnectMaxDelayMs => {
                next.reconnect.max_delay_ms = self.parse(value)?;
            }
            ConfigKey::SessionTokenFile => next.session.token_file = expand_tilde(value),
            ConfigKey::MapApiKey => next.map.api_key = optional_string(value),
            ConfigKey::MapTravelMode => next.map.travel_mode = self.parse(value)?,
            ConfigKey::MapRouting => next.map.routing = self.parse(value)?,
            ConfigKey::MapOsrmUrl => next.map.osrm_url = value.to_string(),
            ConfigKey::MapZoomDebounceMs => {
                next.map.zoom_debounce_ms = self.parse(value)?;
            }
            ConfigKey::MapCourierSpeedKmh => {
                next.map.courier_speed_kmh = self.parse(value)?;
            }
            ConfigKey::LoggingFile => next.logging.file = expand_tilde(value),
        }

        if next.reconnect.max_delay_ms < next.reconnect.initial_delay_ms {
            return Err(ConfigKeyError::ValidationFailed {
                key: self.name().to_string(),
                reason: "reconnect.max_delay_ms must not be less than reconnect.initial_delay_ms"
                    .to_string(),
            });
        }
        *config = next;
        Ok(())
    }

    /// Validate a value according to this key's specification.
    pub fn validate(&self, value: &str) -> Result<(), ConfigKeyError> {
        self.specification()
            .is_satisfied_by(value)
            .map_err(|reason| ConfigKeyError::ValidationFailed {
                key: self.name().to_string(),
                reason,
            })
    }

    fn parse<T: FromStr>(&self, value: &str) -> Result<T, ConfigKeyError> {
        value.parse().map_err(|_| ConfigKeyError::ValidationFailed {
            key: self.name().to_string(),
            reason: format!("could not parse '{}'", value),
        })
    }

    /// Get the validation specification for this key.
    fn specification(&self) -> Box<dyn ValueSpecification> {
        match self {
            ConfigKey::ServerUrl => Box::new(EndpointSpec),
            ConfigKey::ServerConnectTimeoutMs => Box::new(PositiveIntegerSpec),
            ConfigKey::ReconnectMaxAttempts => Box::new(AttemptCountSpec),
            ConfigKey::ReconnectInitialDelayMs => Box::new(PositiveIntegerSpec),
            ConfigKey::ReconnectMaxDelayMs => Box::new(PositiveIntegerSpec),
            ConfigKey::SessionTokenFile => Box::new(PathSpec),
            ConfigKey::MapApiKey => Box::new(AnyStringSpec),
            ConfigKey::MapTravelMode => {
                Box::new(OneOfSpec::new(&["driving", "walking", "bicycling"]))
            }
            ConfigKey::MapRouting => Box::new(OneOfSpec::new(&["straight", "osrm"])),
            ConfigKey::MapOsrmUrl => Box::new(UrlSpec),
            ConfigKey::MapZoomDebounceMs => Box::new(NonNegativeIntegerSpec),
            ConfigKey::MapCourierSpeedKmh => Box::new(PositiveNumberSpec),
            ConfigKey::LoggingFile => Box::new(PathSpec),
        }
    }

    /// Get all supported configuration keys.
    pub fn all() -> &'static [ConfigKey] {
        &[
            ConfigKey::ServerUrl,
            ConfigKey::ServerConnectTimeoutMs,
            ConfigKey::ReconnectMaxAttempts,
            ConfigKey::ReconnectInitialDelayMs,
            ConfigKey::ReconnectMaxDelayMs,
            ConfigKey::SessionTokenFile,
            ConfigKey::MapApiKey,
            ConfigKey::MapTravelMode,
            ConfigKey::MapRouting,
            ConfigKey::MapOsrmUrl,
            ConfigKey::MapZoomDebounceMs,
            ConfigKey::MapCourierSpeedKmh,
            ConfigKey::LoggingFile,
        ]
    }
}

/// Check that `value` looks like `host:port`.
pub(super) fn validate_endpoint(value: &str) -> Result<(), String> {
    let (host, port) = value
        .rsplit_once(':')
        .ok_or_else(|| "must be host:port, e.g. 127.0.0.1:5050".to_string())?;
    if host.trim().is_empty() {
        return Err("host must not be empty".to_string());
    }
    match port.parse::<u16>() {
        Ok(p) if p > 0 => Ok(()),
        _ => Err("port must be a number between 1 and 65535".to_string()),
    }
}

// ============================================================================
// Value Specifications (Specification Pattern)
// ============================================================================

/// Trait for value validation specifications.
trait ValueSpecification {
    /// Returns Ok(()) if valid, Err(reason) if invalid.
    fn is_satisfied_by(&self, value: &str) -> Result<(), String>;
}

struct AnyStringSpec;

impl ValueSpecification for AnyStringSpec {
    fn is_satisfied_by(&self, _value: &str) -> Result<(), String> {
        Ok(())
    }
}

/// Specification that requires the value to be one of a set of options.
struct OneOfSpec {
    options: &'static [&'static str],
}

impl OneOfSpec {
    fn new(options: &'static [&'static str]) -> Self {
        Self { options }
    }
}

impl ValueSpecification for OneOfSpec {
    fn is_satisfied_by(&self, value: &str) -> Result<(), String> {
        let lower = value.to_lowercase();
        if self.options.iter().any(|opt| *opt == lower) {
            Ok(())
        } else {
            Err(format!("must be one of: {}", self.options.join(", ")))
        }
    }
}

/// Integers greater than zero.
struct PositiveIntegerSpec;

impl ValueSpecification for PositiveIntegerSpec {
    fn is_satisfied_by(&self, value: &str) -> Result<(), String> {
        match value.parse::<u64>() {
            Ok(n) if n > 0 => Ok(()),
            _ => Err("must be a positive integer".to_string()),
        }
    }
}

struct NonNegativeIntegerSpec;

impl ValueSpecification for NonNegativeIntegerSpec {
    fn is_satisfied_by(&self, value: &str) -> Result<(), String> {
        value
            .parse::<u64>()
            .map(|_| ())
            .map_err(|_| "must be a non-negative integer".to_string())
    }
}

/// Reconnect attempt counts (fit in `u32`).
struct AttemptCountSpec;

impl ValueSpecification for AttemptCountSpec {
    fn is_satisfied_by(&self, value: &str) -> Result<(), String> {
        value
            .parse::<u32>()
            .map(|_| ())
            .map_err(|_| "must be a non-negative integer".to_string())
    }
}

/// Specification for positive floating-point number values.
struct PositiveNumberSpec;

impl ValueSpecification for PositiveNumberSpec {
    fn is_satisfied_by(&self, value: &str) -> Result<(), String> {
        match value.parse::<f64>() {
            Ok(n) if n.is_finite() && n > 0.0 => Ok(()),
            _ => Err("must be a positive number".to_string()),
        }
    }
}

/// Specification for path values (non-empty).
struct PathSpec;

impl ValueSpecification for PathSpec {
    fn is_satisfied_by(&self, value: &str) -> Result<(), String> {
        if value.trim().is_empty() {
            Err("must be a valid path".to_string())
        } else {
            Ok(())
        }
    }
}

struct UrlSpec;

impl ValueSpecification for UrlSpec {
    fn is_satisfied_by(&self, value: &str) -> Result<(), String> {
        if value.starts_with("http://") || value.starts_with("https://") {
            Ok(())
        } else {
            Err("must be a URL starting with 'http://' or 'https://'".to_string())
        }
    }
}

struct EndpointSpec;

impl ValueSpecification for EndpointSpec {
    fn is_satisfied_by(&self, value: &str) -> Result<(), String> {
        validate_endpoint(value)
    }
}

/// Convert empty string to None, non-empty to Some.
fn optional_string(value: &str) -> Option<String> {
    if value.is_empty() {
        None
    } else {
        Some(value.to_string())
    }
}
