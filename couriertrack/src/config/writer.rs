//! INI serialization logic for converting `ConfigFile` → INI string.
//!
//! This module contains the `to_config_string()` function that produces
//! the commented INI representation written to `config.ini`.

use super::file::path_to_display;
use super::settings::ConfigFile;

/// Convert a `ConfigFile` to a commented INI string for saving.
pub(super) fn to_config_string(config: &ConfigFile) -> String {
    let api_key = config.map.api_key.as_deref().unwrap_or("");

    format!(
        r#"[server]
; Tracking server endpoint as host:port
url = {}
; Timeout for each connection attempt, in milliseconds (default: 20000)
connect_timeout_ms = {}

[reconnect]
; Reconnect attempts after a lost connection before giving up (default: 5)
; Once exhausted, tracking stays failed until a manual reconnect
max_attempts = {}
; Delay before the first reconnect, in milliseconds (default: 2000)
; Each further attempt doubles the delay up to max_delay_ms
initial_delay_ms = {}
; Ceiling for the reconnect delay, in milliseconds (default: 10000)
max_delay_ms = {}

[session]
; File holding the bearer token sent when connecting
; Manage it with: couriertrack session set|show|clear
token_file = {}

[map]
; Mapping provider API key. Leave empty to run without a map
; (a configuration warning is shown instead)
api_key = {}
; Travel mode for routes: driving, walking, bicycling
travel_mode = {}
; Route backend:
;   straight - offline straight-line estimate (no network)
;   osrm     - OSRM routing service at osrm_url
routing = {}
osrm_url = {}
; Zoom changes this soon after the automatic initial fit are not
; treated as user interaction, in milliseconds (default: 300)
zoom_debounce_ms = {}
; Courier speed used by the straight-line estimate, in km/h (default: 25)
courier_speed_kmh = {}

[logging]
; Log file (cleared at the start of each session)
file = {}
"#,
        config.server.url,
        config.server.connect_timeout_ms,
        config.reconnect.max_attempts,
        config.reconnect.initial_delay_ms,
        config.reconnect.max_delay_ms,
        path_to_display(&config.session.token_file),
        api_key,
        config.map.travel_mode,
        config.map.routing,
        config.map.osrm_url,
        config.map.zoom_debounce_ms,
        config.map.courier_speed_kmh,
        path_to_display(&config.logging.file),
    )
}
