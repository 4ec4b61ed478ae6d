//! INI parsing logic for converting `Ini` → `ConfigFile`.
//!
//! This module contains the `parse_ini()` function and its helpers.
//! It is the single place where INI key names are mapped to struct fields.

use std::str::FromStr;

use ini::{Ini, Properties};

use super::file::{expand_tilde, ConfigFileError};
use super::settings::ConfigFile;

/// Parse an `Ini` object into a `ConfigFile`.
///
/// Starts from `ConfigFile::default()` and overlays any values found in the INI.
pub(super) fn parse_ini(ini: &Ini) -> Result<ConfigFile, ConfigFileError> {
    let mut config = ConfigFile::default();

    // [server] section
    if let Some(section) = ini.section(Some("server")) {
        if let Some(v) = section.get("url") {
            let v = v.trim();
            if let Err(reason) = super::keys::validate_endpoint(v) {
                return Err(invalid("server", "url", v, &reason));
            }
            config.server.url = v.to_string();
        }
        if let Some(v) = parse_field::<u64>(
            section,
            "server",
            "connect_timeout_ms",
            "must be a positive integer (milliseconds)",
        )? {
            if v == 0 {
                return Err(invalid(
                    "server",
                    "connect_timeout_ms",
                    "0",
                    "must be greater than zero",
                ));
            }
            config.server.connect_timeout_ms = v;
        }
    }

    // [reconnect] section
    if let Some(section) = ini.section(Some("reconnect")) {
        if let Some(v) = parse_field::<u32>(
            section,
            "reconnect",
            "max_attempts",
            "must be a non-negative integer",
        )? {
            config.reconnect.max_attempts = v;
        }
        if let Some(v) = parse_field::<u64>(
            section,
            "reconnect",
            "initial_delay_ms",
            "must be a positive integer (milliseconds)",
        )? {
            if v == 0 {
                return Err(invalid(
                    "reconnect",
                    "initial_delay_ms",
                    "0",
                    "must be greater than zero",
                ));
            }
            config.reconnect.initial_delay_ms = v;
        }
        if let Some(v) = parse_field::<u64>(
            section,
            "reconnect",
            "max_delay_ms",
            "must be a positive integer (milliseconds)",
        )? {
            config.reconnect.max_delay_ms = v;
        }
        if config.reconnect.max_delay_ms < config.reconnect.initial_delay_ms {
            return Err(invalid(
                "reconnect",
                "max_delay_ms",
                &config.reconnect.max_delay_ms.to_string(),
                "must not be less than initial_delay_ms",
            ));
        }
    }

    // [session] section
    if let Some(section) = ini.section(Some("session")) {
        if let Some(v) = section.get("token_file") {
            let v = v.trim();
            if !v.is_empty() {
                config.session.token_file = expand_tilde(v);
            }
        }
    }

    // [map] section
    if let Some(section) = ini.section(Some("map")) {
        if let Some(v) = section.get("api_key") {
            let v = v.trim();
            if !v.is_empty() {
                config.map.api_key = Some(v.to_string());
            }
        }
        if let Some(v) = parse_field(
            section,
            "map",
            "travel_mode",
            "must be one of: driving, walking, bicycling",
        )? {
            config.map.travel_mode = v;
        }
        if let Some(v) = parse_field(
            section,
            "map",
            "routing",
            "must be one of: straight, osrm",
        )? {
            config.map.routing = v;
        }
        if let Some(v) = section.get("osrm_url") {
            let v = v.trim();
            if !v.is_empty() {
                if !(v.starts_with("http://") || v.starts_with("https://")) {
                    return Err(invalid(
                        "map",
                        "osrm_url",
                        v,
                        "must be a URL starting with 'http://' or 'https://'",
                    ));
                }
                config.map.osrm_url = v.to_string();
            }
        }
        if let Some(v) = parse_field::<u64>(
            section,
            "map",
            "zoom_debounce_ms",
            "must be a positive integer (milliseconds)",
        )? {
            config.map.zoom_debounce_ms = v;
        }
        if let Some(v) = parse_field::<f64>(
            section,
            "map",
            "courier_speed_kmh",
            "must be a positive number",
        )? {
            if !(v.is_finite() && v > 0.0) {
                return Err(invalid(
                    "map",
                    "courier_speed_kmh",
                    &v.to_string(),
                    "must be a positive number",
                ));
            }
            config.map.courier_speed_kmh = v;
        }
    }

    // [logging] section
    if let Some(section) = ini.section(Some("logging")) {
        if let Some(v) = section.get("file") {
            let v = v.trim();
            if !v.is_empty() {
                config.logging.file = expand_tilde(v);
            }
        }
    }

    Ok(config)
}

/// Parse an optional field, mapping failures to `InvalidValue`.
fn parse_field<T: FromStr>(
    section: &Properties,
    section_name: &str,
    key: &str,
    reason: &str,
) -> Result<Option<T>, ConfigFileError> {
    match section.get(key) {
        None => Ok(None),
        Some(v) if v.trim().is_empty() => Ok(None),
        Some(v) => v
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| invalid(section_name, key, v, reason)),
    }
}

fn invalid(section: &str, key: &str, value: &str, reason: &str) -> ConfigFileError {
    ConfigFileError::InvalidValue {
        section: section.to_string(),
        key: key.to_string(),
        value: value.to_string(),
        reason: reason.to_string(),
    }
}
