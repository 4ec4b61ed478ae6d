//! Default values and constants for all configuration settings.
//!
//! Contains all `DEFAULT_*` constants and the `ConfigFile::default()`
//! implementation.

use super::file::config_directory;
use super::settings::*;
use crate::map::{TravelMode, DEFAULT_COURIER_SPEED_KMH, DEFAULT_OSRM_URL, DEFAULT_ZOOM_DEBOUNCE_MS};
use crate::tracking::{
    DEFAULT_CONNECT_TIMEOUT_MS, DEFAULT_ENDPOINT, DEFAULT_MAX_RECONNECT_ATTEMPTS,
    DEFAULT_RECONNECT_DELAY_MAX_MS, DEFAULT_RECONNECT_DELAY_MS,
};

/// Config file name inside the config directory.
pub const CONFIG_FILE_NAME: &str = "config.ini";

/// Session token file name inside the config directory.
pub const DEFAULT_SESSION_FILE_NAME: &str = "session";

/// Log file name inside the config directory.
pub const DEFAULT_LOG_FILE_NAME: &str = "couriertrack.log";

impl Default for ConfigFile {
    fn default() -> Self {
        let dir = config_directory();
        Self {
            server: ServerSettings {
                url: DEFAULT_ENDPOINT.to_string(),
                connect_timeout_ms: DEFAULT_CONNECT_TIMEOUT_MS,
            },
            reconnect: ReconnectSettings {
                max_attempts: DEFAULT_MAX_RECONNECT_ATTEMPTS,
                initial_delay_ms: DEFAULT_RECONNECT_DELAY_MS,
                max_delay_ms: DEFAULT_RECONNECT_DELAY_MAX_MS,
            },
            session: SessionSettings {
                token_file: dir.join(DEFAULT_SESSION_FILE_NAME),
            },
            map: MapSettings {
                api_key: None,
                travel_mode: TravelMode::Driving,
                routing: RoutingBackend::Straight,
                osrm_url: DEFAULT_OSRM_URL.to_string(),
                zoom_debounce_ms: DEFAULT_ZOOM_DEBOUNCE_MS,
                courier_speed_kmh: DEFAULT_COURIER_SPEED_KMH,
            },
            logging: LoggingSettings {
                file: dir.join(DEFAULT_LOG_FILE_NAME),
            },
        }
    }
}
