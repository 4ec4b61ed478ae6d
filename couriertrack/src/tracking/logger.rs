//! Periodic tracking status logging.
//!
//! Emits one DEBUG-level structured snapshot per interval, useful when
//! reviewing a delivery session after the fact.
//!
//! ```ignore
//! if tracing::enabled!(tracing::Level::DEBUG) {
//!     spawn_status_logger(manager.watch_status(), cancellation.clone(), DEFAULT_LOG_INTERVAL);
//! }
//! ```

use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use super::state::TrackingStatus;

/// Default logging interval (30 seconds).
pub const DEFAULT_LOG_INTERVAL: Duration = Duration::from_secs(30);

/// Spawns a background task that periodically logs the tracking status.
///
/// Stops when `cancellation` fires or the status sender is dropped.
pub fn spawn_status_logger(
    status: watch::Receiver<TrackingStatus>,
    cancellation: CancellationToken,
    interval: Duration,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    if status.has_changed().is_err() {
                        break;
                    }
                    log_status(&status.borrow());
                }
                _ = cancellation.cancelled() => {
                    tracing::debug!("Tracking status logger stopped");
                    break;
                }
            }
        }
    })
}

fn log_status(status: &TrackingStatus) {
    let order_id = status.order_id.as_deref().unwrap_or("-");

    match status.delivery_position {
        Some(position) => {
            tracing::debug!(
                order_id,
                state = %status.connection_state,
                attempt = status.reconnect_attempt,
                lat = format!("{:.5}", position.latitude),
                lon = format!("{:.5}", position.longitude),
                eta_min = format!("{:.0}", status.eta_minutes.unwrap_or_default()),
                distance_km = format!("{:.2}", status.distance_remaining.unwrap_or_default()),
                delivery = status.delivery_status.as_deref().unwrap_or("-"),
                last_error = ?status.last_error,
                "Tracking status"
            );
        }
        None => {
            tracing::debug!(
                order_id,
                state = %status.connection_state,
                attempt = status.reconnect_attempt,
                last_error = ?status.last_error,
                "Tracking status (no position yet)"
            );
        }
    }
}
