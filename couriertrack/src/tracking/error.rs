//! Error types for the tracking channel.

use thiserror::Error;

/// Errors raised by a channel instance.
#[derive(Debug, Error)]
pub enum ChannelError {
    /// The channel has been closed or its transport task has exited.
    #[error("Channel closed")]
    Closed,

    /// Transport-level I/O failure.
    #[error("Transport error: {0}")]
    Transport(String),
}

/// Errors returned by the [`ConnectionManager`](super::ConnectionManager) handle.
///
/// Connection failures are never returned here; they are reported through
/// [`TrackingStatus`](super::TrackingStatus) and [`TrackingEvent`](super::TrackingEvent).
#[derive(Debug, Error)]
pub enum TrackingError {
    /// The manager task has shut down and can no longer accept commands.
    #[error("Tracking manager has shut down")]
    ManagerClosed,
}
