//! User configuration for CourierTrack.
//!
//! Settings live in `~/.couriertrack/config.ini`:
//!
//! - [`settings`] - One struct per INI section
//! - [`defaults`] - `DEFAULT_*` constants and `ConfigFile::default()`
//! - [`file`] - Load/save and conversion into component configs
//! - [`keys`] - Typed get/set by key name for the `config` command
//!
//! # Example
//!
//! ```ignore
//! use couriertrack::config::ConfigFile;
//!
//! let config = ConfigFile::load()?;
//! let tracking = config.tracking_config(None);
//! ```

mod defaults;
mod file;
mod keys;
mod parser;
mod settings;
mod writer;

pub use defaults::{CONFIG_FILE_NAME, DEFAULT_LOG_FILE_NAME, DEFAULT_SESSION_FILE_NAME};
pub use file::{config_directory, config_file_path, ConfigFileError};
pub use keys::{ConfigKey, ConfigKeyError};
pub use settings::{
    ConfigFile, LoggingSettings, MapSettings, ReconnectSettings, RoutingBackend, ServerSettings,
    SessionSettings,
};
