//! Wire protocol for the tracking channel.
//!
//! Each frame is one JSON envelope on its own line:
//!
//! ```text
//! {"event":"track-order","data":"ORD-1"}
//! {"event":"location-update","data":{"orderId":"ORD-1","position":{...},...}}
//! ```
//!
//! Outbound: `auth`, `track-order`, `stop-tracking`.
//! Inbound: `connect`, `tracking-started`, `location-update`, `disconnect`,
//! `connect_error`, `error`.
//!
//! A channel is open once the server answers the handshake with `connect`.
//! A rejected credential is answered with `connect_error` instead.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use super::state::LocationUpdate;

pub const EVENT_AUTH: &str = "auth";
pub const EVENT_TRACK_ORDER: &str = "track-order";
pub const EVENT_STOP_TRACKING: &str = "stop-tracking";
pub const EVENT_CONNECT: &str = "connect";
pub const EVENT_TRACKING_STARTED: &str = "tracking-started";
pub const EVENT_LOCATION_UPDATE: &str = "location-update";
pub const EVENT_DISCONNECT: &str = "disconnect";
pub const EVENT_CONNECT_ERROR: &str = "connect_error";
pub const EVENT_ERROR: &str = "error";

/// Errors decoding a frame.
#[derive(Debug, Error)]
pub enum ProtocolError {
    /// Frame is not a JSON envelope.
    #[error("Malformed frame: {0}")]
    Malformed(#[from] serde_json::Error),

    /// Envelope names an event we do not understand.
    #[error("Unknown event '{0}'")]
    UnknownEvent(String),

    /// Known event with a payload of the wrong shape.
    #[error("Invalid '{event}' payload: {reason}")]
    InvalidPayload { event: String, reason: String },
}

/// Messages sent from the client to the tracking server.
#[derive(Debug, Clone, PartialEq)]
pub enum ClientMessage {
    /// Bearer credential, sent once right after the socket opens.
    Auth { token: String },
    /// Subscribe to an order's location updates.
    TrackOrder(String),
    /// Unsubscribe from an order.
    StopTracking(String),
}

/// Messages received from the tracking server.
#[derive(Debug, Clone, PartialEq)]
pub enum ServerMessage {
    /// Handshake accepted.
    Connected,
    TrackingStarted { order_id: Option<String> },
    LocationUpdate(LocationUpdate),
    Disconnect { reason: String },
    ConnectError(String),
    Error(String),
}

#[derive(Serialize, Deserialize)]
struct Envelope {
    event: String,
    #[serde(default)]
    data: Value,
}

impl ClientMessage {
    pub fn event_name(&self) -> &'static str {
        match self {
            Self::Auth { .. } => EVENT_AUTH,
            Self::TrackOrder(_) => EVENT_TRACK_ORDER,
            Self::StopTracking(_) => EVENT_STOP_TRACKING,
        }
    }

    /// Encode as a single-line JSON frame (without the trailing newline).
    pub fn encode(&self) -> String {
        let data = match self {
            Self::Auth { token } => serde_json::json!({ "token": token }),
            Self::TrackOrder(id) | Self::StopTracking(id) => Value::String(id.clone()),
        };
        encode_envelope(self.event_name(), data)
    }

    /// Decode a client frame. Used by the server side of the channel.
    pub fn decode(frame: &str) -> Result<Self, ProtocolError> {
        let envelope: Envelope = serde_json::from_str(frame)?;
        match envelope.event.as_str() {
            EVENT_AUTH => {
                let token = envelope
                    .data
                    .get("token")
                    .and_then(Value::as_str)
                    .ok_or_else(|| invalid(EVENT_AUTH, "missing token"))?;
                Ok(Self::Auth {
                    token: token.to_string(),
                })
            }
            EVENT_TRACK_ORDER => Ok(Self::TrackOrder(order_id_payload(
                EVENT_TRACK_ORDER,
                &envelope.data,
            )?)),
            EVENT_STOP_TRACKING => Ok(Self::StopTracking(order_id_payload(
                EVENT_STOP_TRACKING,
                &envelope.data,
            )?)),
            other => Err(ProtocolError::UnknownEvent(other.to_string())),
        }
    }
}

impl ServerMessage {
    pub fn event_name(&self) -> &'static str {
        match self {
            Self::Connected => EVENT_CONNECT,
            Self::TrackingStarted { .. } => EVENT_TRACKING_STARTED,
            Self::LocationUpdate(_) => EVENT_LOCATION_UPDATE,
            Self::Disconnect { .. } => EVENT_DISCONNECT,
            Self::ConnectError(_) => EVENT_CONNECT_ERROR,
            Self::Error(_) => EVENT_ERROR,
        }
    }

    /// Decode a server frame.
    pub fn decode(frame: &str) -> Result<Self, ProtocolError> {
        let envelope: Envelope = serde_json::from_str(frame)?;
        match envelope.event.as_str() {
            EVENT_CONNECT => Ok(Self::Connected),
            EVENT_TRACKING_STARTED => {
                let order_id = match &envelope.data {
                    Value::String(s) => Some(s.clone()),
                    Value::Object(map) => map
                        .get("orderId")
                        .and_then(Value::as_str)
                        .map(str::to_string),
                    _ => None,
                };
                Ok(Self::TrackingStarted { order_id })
            }
            EVENT_LOCATION_UPDATE => serde_json::from_value(envelope.data)
                .map(Self::LocationUpdate)
                .map_err(|e| invalid(EVENT_LOCATION_UPDATE, &e.to_string())),
            EVENT_DISCONNECT => Ok(Self::Disconnect {
                reason: message_payload(&envelope.data),
            }),
            EVENT_CONNECT_ERROR => Ok(Self::ConnectError(message_payload(&envelope.data))),
            EVENT_ERROR => Ok(Self::Error(message_payload(&envelope.data))),
            other => Err(ProtocolError::UnknownEvent(other.to_string())),
        }
    }

    /// Encode as a single-line JSON frame. Used by the server side of the channel.
    pub fn encode(&self) -> String {
        let data = match self {
            Self::Connected => Value::Null,
            Self::TrackingStarted { order_id } => serde_json::json!({ "orderId": order_id }),
            Self::LocationUpdate(update) => {
                serde_json::to_value(update).unwrap_or(Value::Null)
            }
            Self::Disconnect { reason } => Value::String(reason.clone()),
            Self::ConnectError(msg) | Self::Error(msg) => {
                serde_json::json!({ "message": msg })
            }
        };
        encode_envelope(self.event_name(), data)
    }
}

fn encode_envelope(event: &str, data: Value) -> String {
    serde_json::json!({ "event": event, "data": data }).to_string()
}

fn invalid(event: &str, reason: &str) -> ProtocolError {
    ProtocolError::InvalidPayload {
        event: event.to_string(),
        reason: reason.to_string(),
    }
}

/// Order id payloads are a bare string or `{"orderId": "..."}`.
fn order_id_payload(event: &str, data: &Value) -> Result<String, ProtocolError> {
    let id = match data {
        Value::String(s) => Some(s.as_str()),
        Value::Object(map) => map.get("orderId").and_then(Value::as_str),
        _ => None,
    };
    id.filter(|s| !s.trim().is_empty())
        .map(str::to_string)
        .ok_or_else(|| invalid(event, "expected an order id"))
}

/// Error and reason payloads are a bare string or `{"message": "..."}`.
fn message_payload(data: &Value) -> String {
    match data {
        Value::String(s) => s.clone(),
        Value::Object(map) => map
            .get("message")
            .and_then(Value::as_str)
            .map(str::to_string)
            .unwrap_or_else(|| data.to_string()),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geo::Position;

    #[test]
    fn test_encode_track_order() {
        let frame = ClientMessage::TrackOrder("ORD-1".to_string()).encode();
        let value: Value = serde_json::from_str(&frame).unwrap();
        assert_eq!(value["event"], "track-order");
        assert_eq!(value["data"], "ORD-1");
        assert!(!frame.contains('\n'));
    }

    #[test]
    fn test_encode_auth_carries_token() {
        let frame = ClientMessage::Auth {
            token: "secret".to_string(),
        }
        .encode();
        let value: Value = serde_json::from_str(&frame).unwrap();
        assert_eq!(value["event"], "auth");
        assert_eq!(value["data"]["token"], "secret");
    }

    #[test]
    fn test_decode_client_stop_tracking_object_payload() {
        let msg = ClientMessage::decode(r#"{"event":"stop-tracking","data":{"orderId":"ORD-9"}}"#)
            .unwrap();
        assert_eq!(msg, ClientMessage::StopTracking("ORD-9".to_string()));
    }

    #[test]
    fn test_decode_client_rejects_empty_order() {
        let result = ClientMessage::decode(r#"{"event":"track-order","data":"  "}"#);
        assert!(matches!(result, Err(ProtocolError::InvalidPayload { .. })));
    }

    #[test]
    fn test_decode_location_update() {
        let frame = r#"{"event":"location-update","data":{
            "orderId":"ORD-1",
            "position":{"latitude":21.15,"longitude":79.65},
            "etaMinutes":8,"distanceRemaining":1.2,"status":"out_for_delivery"}}"#
            .replace('\n', "");

        match ServerMessage::decode(&frame).unwrap() {
            ServerMessage::LocationUpdate(update) => {
                assert_eq!(update.order_id, "ORD-1");
                assert_eq!(update.position, Position::new(21.15, 79.65));
                assert_eq!(update.eta_minutes, 8.0);
            }
            other => panic!("unexpected message: {other:?}"),
        }
    }

    #[test]
    fn test_decode_location_update_missing_latitude() {
        let frame = r#"{"event":"location-update","data":{"orderId":"ORD-1","position":{"longitude":79.65},"etaMinutes":8,"distanceRemaining":1.2,"status":"x"}}"#;
        let result = ServerMessage::decode(frame);
        assert!(matches!(
            result,
            Err(ProtocolError::InvalidPayload { ref event, .. }) if event == "location-update"
        ));
    }

    #[test]
    fn test_decode_disconnect_reason() {
        let msg = ServerMessage::decode(r#"{"event":"disconnect","data":"io server disconnect"}"#)
            .unwrap();
        assert_eq!(
            msg,
            ServerMessage::Disconnect {
                reason: "io server disconnect".to_string()
            }
        );
    }

    #[test]
    fn test_decode_error_payload_shapes() {
        let bare = ServerMessage::decode(r#"{"event":"error","data":"boom"}"#).unwrap();
        assert_eq!(bare, ServerMessage::Error("boom".to_string()));

        let object =
            ServerMessage::decode(r#"{"event":"connect_error","data":{"message":"Unauthorized"}}"#)
                .unwrap();
        assert_eq!(object, ServerMessage::ConnectError("Unauthorized".to_string()));
    }

    #[test]
    fn test_decode_tracking_started_without_data() {
        let msg = ServerMessage::decode(r#"{"event":"tracking-started"}"#).unwrap();
        assert_eq!(msg, ServerMessage::TrackingStarted { order_id: None });
    }

    #[test]
    fn test_handshake_ack_round_trip() {
        let frame = ServerMessage::Connected.encode();
        assert_eq!(ServerMessage::decode(&frame).unwrap(), ServerMessage::Connected);
        assert_eq!(
            ServerMessage::decode(r#"{"event":"connect"}"#).unwrap(),
            ServerMessage::Connected
        );
    }

    #[test]
    fn test_decode_unknown_event() {
        let result = ServerMessage::decode(r#"{"event":"order-cancelled","data":{}}"#);
        assert!(matches!(result, Err(ProtocolError::UnknownEvent(ref e)) if e == "order-cancelled"));
    }

    #[test]
    fn test_decode_malformed() {
        assert!(matches!(
            ServerMessage::decode("not json"),
            Err(ProtocolError::Malformed(_))
        ));
    }

    #[test]
    fn test_server_encode_is_decodable() {
        let msg = ServerMessage::Error("rate limited".to_string());
        assert_eq!(ServerMessage::decode(&msg.encode()).unwrap(), msg);
    }
}
