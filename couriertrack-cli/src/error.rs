//! CLI error handling with user-friendly messages.
//!
//! Centralizes error handling for the CLI, providing consistent formatting
//! and appropriate exit codes.

use std::fmt;
use std::process;

use couriertrack::config::ConfigFileError;
use couriertrack::map::{MapError, RouteError};
use couriertrack::session::SessionError;
use couriertrack::simulator::SimulatorError;
use couriertrack::tracking::TrackingError;

/// CLI-specific errors with user-friendly messages.
#[derive(Debug)]
pub enum CliError {
    /// Failed to initialize logging
    LoggingInit(String),
    /// Configuration error
    Config(String),
    /// Configuration file could not be read or written
    ConfigFile(ConfigFileError),
    /// Session token storage failed
    Session(SessionError),
    /// Command-line argument failed validation
    InvalidArgument(String),
    /// Tracking manager stopped unexpectedly
    Tracking(TrackingError),
    /// Map presenter stopped unexpectedly
    Map(MapError),
    /// Routing backend could not be created
    Routing(RouteError),
    /// Simulator failed to start
    Simulator(SimulatorError),
    /// Terminal input/output failed
    Io(std::io::Error),
    /// A background task panicked or was aborted
    Task(String),
}

impl CliError {
    /// Exit the process with an appropriate error message and code.
    pub fn exit(&self) -> ! {
        eprintln!("Error: {}", self);

        // Print additional help for specific errors
        match self {
            CliError::ConfigFile(ConfigFileError::InvalidValue { section, key, .. }) => {
                eprintln!();
                eprintln!("Fix the value with:");
                eprintln!("  couriertrack config set {}.{} <value>", section, key);
                eprintln!("or regenerate the file with 'couriertrack init --force'.");
            }
            CliError::Simulator(SimulatorError::Bind { addr, .. }) => {
                eprintln!();
                eprintln!("Common issues:");
                eprintln!("  1. Another simulator is already listening on {}", addr);
                eprintln!("  2. Use --bind 127.0.0.1:0 to pick a free port");
            }
            CliError::Routing(_) => {
                eprintln!();
                eprintln!("Check map.osrm_url, or switch back to the built-in estimator:");
                eprintln!("  couriertrack config set map.routing straight");
            }
            _ => {}
        }

        process::exit(1)
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CliError::LoggingInit(msg) => write!(f, "Failed to initialize logging: {}", msg),
            CliError::Config(msg) => write!(f, "Configuration error: {}", msg),
            CliError::ConfigFile(e) => write!(f, "{}", e),
            CliError::Session(e) => write!(f, "{}", e),
            CliError::InvalidArgument(msg) => write!(f, "Invalid argument: {}", msg),
            CliError::Tracking(e) => write!(f, "Tracking failed: {}", e),
            CliError::Map(e) => write!(f, "Map presenter failed: {}", e),
            CliError::Routing(e) => write!(f, "Failed to set up routing: {}", e),
            CliError::Simulator(e) => write!(f, "Simulator failed: {}", e),
            CliError::Io(e) => write!(f, "I/O error: {}", e),
            CliError::Task(msg) => write!(f, "Background task failed: {}", msg),
        }
    }
}

impl std::error::Error for CliError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CliError::ConfigFile(e) => Some(e),
            CliError::Session(e) => Some(e),
            CliError::Tracking(e) => Some(e),
            CliError::Map(e) => Some(e),
            CliError::Routing(e) => Some(e),
            CliError::Simulator(e) => Some(e),
            CliError::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<ConfigFileError> for CliError {
    fn from(e: ConfigFileError) -> Self {
        CliError::ConfigFile(e)
    }
}

impl From<SessionError> for CliError {
    fn from(e: SessionError) -> Self {
        CliError::Session(e)
    }
}

impl From<TrackingError> for CliError {
    fn from(e: TrackingError) -> Self {
        CliError::Tracking(e)
    }
}

impl From<MapError> for CliError {
    fn from(e: MapError) -> Self {
        CliError::Map(e)
    }
}

impl From<SimulatorError> for CliError {
    fn from(e: SimulatorError) -> Self {
        CliError::Simulator(e)
    }
}

impl From<std::io::Error> for CliError {
    fn from(e: std::io::Error) -> Self {
        CliError::Io(e)
    }
}
