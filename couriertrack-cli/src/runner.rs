//! CLI runner for common setup and operations.
//!
//! Encapsulates config loading and logging initialization so command
//! handlers start from the same place.

use tracing::info;

use couriertrack::config::ConfigFile;
use couriertrack::logging::{init_logging, LoggingGuard, LoggingOptions};
use couriertrack::session::SessionStore;

use crate::error::CliError;

/// Runner that manages CLI lifecycle and common operations.
pub struct CliRunner {
    /// Logging guard - keeps logging active while runner exists
    #[allow(dead_code)]
    logging_guard: LoggingGuard,
    /// Loaded configuration file
    config: ConfigFile,
}

impl CliRunner {
    /// Load config and initialize logging.
    ///
    /// # Arguments
    ///
    /// * `debug_mode` - When true, enables debug-level logging regardless of RUST_LOG
    /// * `console` - Mirror log output to stderr
    pub fn new(debug_mode: bool, console: bool) -> Result<Self, CliError> {
        // Load config file (or use defaults if not present)
        let config = ConfigFile::load()?;

        let options = LoggingOptions::new(config.logging.file.clone())
            .with_console(console)
            .with_verbose(debug_mode);
        let logging_guard =
            init_logging(&options).map_err(|e| CliError::LoggingInit(e.to_string()))?;

        Ok(Self {
            logging_guard,
            config,
        })
    }

    /// Get the loaded configuration.
    pub fn config(&self) -> &ConfigFile {
        &self.config
    }

    /// Session store at the configured token path.
    pub fn session_store(&self) -> SessionStore {
        SessionStore::new(self.config.session.token_file.clone())
    }

    /// Log startup information for a command.
    pub fn log_startup(&self, command: &str) {
        info!("CourierTrack v{}", couriertrack::VERSION);
        info!("CourierTrack CLI: {} command", command);
    }
}
