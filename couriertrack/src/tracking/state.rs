//! Core state types for delivery tracking.
//!
//! - [`ConnectionState`] - Where the tracking channel is in its lifecycle
//! - [`LocationUpdate`] - One server-pushed position event
//! - [`TrackingStatus`] - Reactive snapshot consumed by the presentation layer
//! - [`TrackingEvent`] - Typed event stream delivered to subscribers

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::geo::Position;

/// Lifecycle of the tracking channel for one order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConnectionState {
    /// No channel and no pending reconnect.
    #[default]
    Idle,
    /// A channel instance is opening.
    Connecting,
    /// Channel open and subscribed to the order.
    Connected,
    /// Channel lost; a reconnect is scheduled.
    Disconnected,
    /// Reconnect attempts exhausted. Terminal until a manual reconnect.
    Failed,
}

impl ConnectionState {
    /// Returns true if a channel instance exists or is scheduled.
    pub fn is_active(&self) -> bool {
        matches!(
            self,
            Self::Connecting | Self::Connected | Self::Disconnected
        )
    }
}

impl std::fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Idle => write!(f, "Idle"),
            Self::Connecting => write!(f, "Connecting"),
            Self::Connected => write!(f, "Connected"),
            Self::Disconnected => write!(f, "Disconnected"),
            Self::Failed => write!(f, "Failed"),
        }
    }
}

/// One position event pushed by the tracking server.
///
/// Updates are applied in arrival order; the latest one always wins.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LocationUpdate {
    pub order_id: String,
    pub position: Position,
    pub eta_minutes: f64,
    pub distance_remaining: f64,
    /// Delivery lifecycle label (e.g. "out_for_delivery"). Opaque here.
    pub status: String,
    #[serde(alias = "timestamp", default = "Utc::now")]
    pub server_timestamp: DateTime<Utc>,
}

/// Snapshot of one tracking session, published after every state change.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct TrackingStatus {
    /// Order being tracked, kept after `stop()` so a manual reconnect can reuse it.
    pub order_id: Option<String>,
    pub connection_state: ConnectionState,
    pub reconnect_attempt: u32,
    pub last_error: Option<String>,
    /// Server timestamp of the most recent accepted update.
    pub last_update_at: Option<DateTime<Utc>>,
    pub delivery_position: Option<Position>,
    pub eta_minutes: Option<f64>,
    pub distance_remaining: Option<f64>,
    pub delivery_status: Option<String>,
}

impl TrackingStatus {
    /// Fresh status for a newly requested order.
    pub fn for_order(order_id: &str) -> Self {
        Self {
            order_id: Some(order_id.to_string()),
            ..Default::default()
        }
    }

    pub fn is_connected(&self) -> bool {
        self.connection_state == ConnectionState::Connected
    }

    pub fn is_failed(&self) -> bool {
        self.connection_state == ConnectionState::Failed
    }

    /// Overwrite the displayed delivery fields with `update`.
    pub fn apply_update(&mut self, update: &LocationUpdate) {
        self.delivery_position = Some(update.position);
        self.eta_minutes = Some(update.eta_minutes);
        self.distance_remaining = Some(update.distance_remaining);
        self.delivery_status = Some(update.status.clone());
        self.last_update_at = Some(update.server_timestamp);
    }
}

/// Events delivered to tracking subscribers.
///
/// Subscribers never see raw transport events, only these.
#[derive(Debug, Clone, PartialEq)]
pub enum TrackingEvent {
    Connected,
    Disconnected { reason: String },
    LocationUpdate(LocationUpdate),
    Error(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_state_is_idle() {
        let status = TrackingStatus::default();
        assert_eq!(status.connection_state, ConnectionState::Idle);
        assert_eq!(status.reconnect_attempt, 0);
        assert!(status.order_id.is_none());
    }

    #[test]
    fn test_is_active() {
        assert!(!ConnectionState::Idle.is_active());
        assert!(ConnectionState::Connecting.is_active());
        assert!(ConnectionState::Connected.is_active());
        assert!(ConnectionState::Disconnected.is_active());
        assert!(!ConnectionState::Failed.is_active());
    }

    #[test]
    fn test_location_update_deserialize() {
        let json = r#"{
            "orderId": "ORD-1",
            "position": {"latitude": 21.15, "longitude": 79.65},
            "etaMinutes": 8,
            "distanceRemaining": 1.2,
            "status": "out_for_delivery",
            "serverTimestamp": "2026-03-01T10:15:00Z"
        }"#;

        let update: LocationUpdate = serde_json::from_str(json).unwrap();
        assert_eq!(update.order_id, "ORD-1");
        assert_eq!(update.position, Position::new(21.15, 79.65));
        assert_eq!(update.eta_minutes, 8.0);
        assert_eq!(update.distance_remaining, 1.2);
        assert_eq!(update.status, "out_for_delivery");
        assert_eq!(update.server_timestamp.to_rfc3339(), "2026-03-01T10:15:00+00:00");
    }

    #[test]
    fn test_location_update_timestamp_alias_and_default() {
        let with_alias = r#"{"orderId":"A","position":{"latitude":1.0,"longitude":2.0},
            "etaMinutes":1,"distanceRemaining":0.1,"status":"x","timestamp":"2026-01-01T00:00:00Z"}"#;
        let update: LocationUpdate = serde_json::from_str(with_alias).unwrap();
        assert_eq!(update.server_timestamp.to_rfc3339(), "2026-01-01T00:00:00+00:00");

        let without = r#"{"orderId":"A","position":{"latitude":1.0,"longitude":2.0},
            "etaMinutes":1,"distanceRemaining":0.1,"status":"x"}"#;
        let before = Utc::now();
        let update: LocationUpdate = serde_json::from_str(without).unwrap();
        assert!(update.server_timestamp >= before);
    }

    #[test]
    fn test_apply_update_overwrites_fields() {
        let mut status = TrackingStatus::for_order("ORD-1");
        let mut update = LocationUpdate {
            order_id: "ORD-1".to_string(),
            position: Position::new(21.15, 79.65),
            eta_minutes: 8.0,
            distance_remaining: 1.2,
            status: "out_for_delivery".to_string(),
            server_timestamp: Utc::now(),
        };
        status.apply_update(&update);
        assert_eq!(status.eta_minutes, Some(8.0));

        update.eta_minutes = 3.0;
        update.status = "arriving".to_string();
        status.apply_update(&update);
        assert_eq!(status.eta_minutes, Some(3.0));
        assert_eq!(status.delivery_status.as_deref(), Some("arriving"));
    }
}
