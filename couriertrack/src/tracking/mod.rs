//! Connection Manager for live delivery tracking.
//!
//! Maintains one channel to the tracking server for a delivery order,
//! survives transient failures with exponential backoff, and delivers a typed
//! event stream plus a reactive status snapshot.
//!
//! # Architecture
//!
//! ```text
//! ConnectionManager (handle)
//!     │ commands (mpsc)            ▲ TrackingStatus (watch)
//!     ▼                            │ TrackingEvent (broadcast)
//! manager task ── ConnectionMachine ── Effects
//!     │
//!     └── Connector ──▶ Channel instance (epoch n) ──▶ ChannelSink
//! ```
//!
//! - [`state`] - `ConnectionState`, `LocationUpdate`, `TrackingStatus`, `TrackingEvent`
//! - [`protocol`] - Wire messages and JSON envelope framing
//! - [`config`] - `TrackingConfig` and `ReconnectPolicy`
//! - [`channel`] - `Connector`/`Channel` traits and epoch-stamped events
//! - [`tcp`] - `TcpConnector` over newline-delimited JSON
//! - [`machine`] - Transport-free state machine
//! - [`manager`] - Tokio task and public handle
//!
//! # Reconnection
//!
//! The delay for attempt *n* is `min(max_delay, initial_delay * 2^(n-1))`.
//! Once `max_attempts` reconnects have failed the session is `Failed` and
//! stays there until [`ConnectionManager::manual_reconnect`].

pub mod channel;
mod config;
mod error;
mod logger;
pub mod machine;
mod manager;
pub mod protocol;
mod state;
pub mod tcp;

pub use channel::{Channel, ChannelEvent, ChannelSink, Connector};
pub use config::{
    ChannelParams, ReconnectPolicy, TrackingConfig, DEFAULT_CONNECT_TIMEOUT_MS, DEFAULT_ENDPOINT,
    DEFAULT_EVENT_CAPACITY, DEFAULT_MAX_RECONNECT_ATTEMPTS, DEFAULT_RECONNECT_DELAY_MAX_MS,
    DEFAULT_RECONNECT_DELAY_MS,
};
pub use error::{ChannelError, TrackingError};
pub use logger::{spawn_status_logger, DEFAULT_LOG_INTERVAL};
pub use machine::{ConnectionMachine, Effect, RECONNECT_EXHAUSTED_MESSAGE};
pub use manager::ConnectionManager;
pub use protocol::{ClientMessage, ProtocolError, ServerMessage};
pub use state::{ConnectionState, LocationUpdate, TrackingEvent, TrackingStatus};
pub use tcp::{TcpChannel, TcpConnector};
