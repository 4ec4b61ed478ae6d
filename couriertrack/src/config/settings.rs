//! Settings structs for all configuration sections.
//!
//! Each struct represents one `[section]` of the INI config file.
//! These are pure data types with no parsing or serialization logic.

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use crate::map::TravelMode;

/// Complete application configuration loaded from config.ini.
#[derive(Debug, Clone, PartialEq)]
pub struct ConfigFile {
    /// Tracking server settings
    pub server: ServerSettings,
    /// Reconnection backoff settings
    pub reconnect: ReconnectSettings,
    /// Local session storage settings
    pub session: SessionSettings,
    /// Map and routing settings
    pub map: MapSettings,
    /// Logging settings
    pub logging: LoggingSettings,
}

/// Tracking server configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct ServerSettings {
    /// Endpoint as `host:port`
    pub url: String,
    /// Timeout for each connection attempt in milliseconds
    pub connect_timeout_ms: u64,
}

/// Reconnection configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct ReconnectSettings {
    /// Reconnect attempts before giving up
    pub max_attempts: u32,
    /// Delay before the first reconnect in milliseconds
    pub initial_delay_ms: u64,
    /// Ceiling for the doubling delay in milliseconds
    pub max_delay_ms: u64,
}

/// Session storage configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionSettings {
    /// File holding the bearer token
    pub token_file: PathBuf,
}

/// Map configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct MapSettings {
    /// Mapping provider API key. Without one the map shows a configuration warning.
    pub api_key: Option<String>,
    pub travel_mode: TravelMode,
    pub routing: RoutingBackend,
    /// Base URL of the OSRM server (routing = osrm)
    pub osrm_url: String,
    /// Zoom changes this soon after an automatic fit are not user interaction
    pub zoom_debounce_ms: u64,
    /// Courier speed for the straight-line estimate
    pub courier_speed_kmh: f64,
}

/// Logging configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct LoggingSettings {
    /// Log file path
    pub file: PathBuf,
}

/// Route computation backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RoutingBackend {
    /// Offline haversine estimate
    #[default]
    Straight,
    /// OSRM HTTP service
    Osrm,
}

impl RoutingBackend {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Straight => "straight",
            Self::Osrm => "osrm",
        }
    }
}

impl fmt::Display for RoutingBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RoutingBackend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "straight" => Ok(Self::Straight),
            "osrm" => Ok(Self::Osrm),
            _ => Err("must be one of: straight, osrm".to_string()),
        }
    }
}
