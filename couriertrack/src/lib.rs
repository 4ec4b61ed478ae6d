//! CourierTrack - Real-time delivery tracking
//!
//! This library keeps a live connection to a tracking server for one delivery
//! order and turns the resulting position stream into map presentation
//! commands.
//!
//! # Components
//!
//! - [`tracking`] - Connection Manager: resilient channel with exponential backoff
//! - [`map`] - Live Map Presenter: bounds fit, follow, route and degraded states
//! - [`geo`] - Positions, bounds and distance math
//! - [`config`] - `~/.couriertrack/config.ini`
//! - [`session`] - Stored bearer credential
//! - [`simulator`] - Demo tracking server
//!
//! # Example
//!
//! ```ignore
//! use couriertrack::tracking::{ConnectionManager, TcpConnector, TrackingConfig};
//!
//! let manager = ConnectionManager::spawn(TcpConnector::new(), TrackingConfig::default());
//! manager.start("ORD-1")?;
//!
//! let mut events = manager.subscribe();
//! while let Ok(event) = events.recv().await {
//!     println!("{:?}", event);
//! }
//! ```

pub mod config;
pub mod geo;
pub mod logging;
pub mod map;
pub mod session;
pub mod simulator;
pub mod tracking;

/// Version of the CourierTrack library and CLI.
///
/// This is synchronized across all components in the workspace.
/// The version is defined in `Cargo.toml` and injected at compile time.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
