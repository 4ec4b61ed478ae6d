//! Transport-free connection state machine.
//!
//! [`ConnectionMachine`] holds the tracking status for one order and decides
//! what should happen next. Every input returns the [`Effect`]s the caller
//! must carry out, in order: open or close a channel, send a message, arm or
//! cancel the reconnect timer, or emit an event to subscribers.
//!
//! # State transitions
//!
//! ```text
//! Idle ──start──▶ Connecting ──open──▶ Connected
//!                     ▲                    │
//!                     │ timer              │ disconnect (unintentional) / connect error
//!                     │                    ▼
//!                     └────────────── Disconnected ──attempts exhausted──▶ Failed
//! ```
//!
//! An intentional disconnect (server or client initiated) returns to `Idle`.
//! `Failed` is left only through [`ConnectionMachine::manual_reconnect`].
//!
//! Each channel instance is identified by an epoch. The epoch is bumped
//! whenever an instance is discarded, and events carrying an older epoch are
//! dropped, so a replaced instance can never reach subscribers.

use std::time::Duration;

use tracing::{debug, info, warn};

use super::channel::{is_intentional_disconnect, ChannelEvent, REASON_CLIENT_DISCONNECT};
use super::config::ReconnectPolicy;
use super::protocol::{ClientMessage, ServerMessage};
use super::state::{ConnectionState, TrackingEvent, TrackingStatus};

/// User-facing message once reconnect attempts are exhausted.
pub const RECONNECT_EXHAUSTED_MESSAGE: &str = "Unable to connect. Please refresh the page.";

/// Side effect requested by the machine.
#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    /// Open a new channel instance stamped with `epoch`.
    OpenChannel { epoch: u64 },
    /// Send a message on the current channel instance.
    Send(ClientMessage),
    /// Close and discard the current channel instance.
    CloseChannel,
    /// Arm the reconnect timer, replacing any pending one.
    ScheduleReconnect { attempt: u32, delay: Duration },
    /// Cancel the pending reconnect timer.
    CancelReconnect,
    /// Deliver an event to subscribers.
    Emit(TrackingEvent),
}

/// Connection state machine for one tracked order at a time.
#[derive(Debug)]
pub struct ConnectionMachine {
    policy: ReconnectPolicy,
    status: TrackingStatus,
    epoch: u64,
    channel_open: bool,
    timer_pending: bool,
}

impl ConnectionMachine {
    pub fn new(policy: ReconnectPolicy) -> Self {
        Self {
            policy,
            status: TrackingStatus::default(),
            epoch: 0,
            channel_open: false,
            timer_pending: false,
        }
    }

    pub fn status(&self) -> &TrackingStatus {
        &self.status
    }

    /// Epoch of the current channel instance.
    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    pub fn has_channel(&self) -> bool {
        self.channel_open
    }

    pub fn has_pending_reconnect(&self) -> bool {
        self.timer_pending
    }

    /// Record a failure the caller hit while carrying out an effect.
    pub fn record_error(&mut self, message: String) -> Vec<Effect> {
        self.status.last_error = Some(message.clone());
        vec![Effect::Emit(TrackingEvent::Error(message))]
    }

    /// Begin tracking `order_id`.
    ///
    /// Repeating the current order is a no-op unless the machine is idle. A
    /// different order tears the previous channel down first.
    pub fn start(&mut self, order_id: &str) -> Vec<Effect> {
        let mut effects = Vec::new();
        let order_id = order_id.trim();

        if order_id.is_empty() {
            let message = "Order id is required".to_string();
            warn!("Rejected tracking start without an order id");
            self.status.last_error = Some(message.clone());
            effects.push(Effect::Emit(TrackingEvent::Error(message)));
            return effects;
        }

        if self.status.order_id.as_deref() == Some(order_id) {
            if self.status.connection_state != ConnectionState::Idle {
                debug!(order_id, state = %self.status.connection_state, "Already tracking order");
                return effects;
            }
        } else if self.status.order_id.is_some() {
            info!(
                previous = self.status.order_id.as_deref().unwrap_or_default(),
                order_id, "Switching tracked order"
            );
            self.teardown(&mut effects);
        }

        self.status = TrackingStatus::for_order(order_id);
        self.open(&mut effects);
        effects
    }

    /// Stop tracking. Safe from any state.
    ///
    /// The order id is kept so that a manual reconnect can resume it.
    pub fn stop(&mut self) -> Vec<Effect> {
        let mut effects = Vec::new();
        let was_connected = self.status.is_connected();
        self.teardown(&mut effects);
        if was_connected {
            effects.push(Effect::Emit(TrackingEvent::Disconnected {
                reason: REASON_CLIENT_DISCONNECT.to_string(),
            }));
        }
        effects
    }

    /// Reset the attempt counter and restart the held order from `Connecting`.
    pub fn manual_reconnect(&mut self) -> Vec<Effect> {
        let Some(order_id) = self.status.order_id.clone() else {
            let message = "No order to reconnect".to_string();
            self.status.last_error = Some(message.clone());
            return vec![Effect::Emit(TrackingEvent::Error(message))];
        };

        info!(order_id = %order_id, "Manual reconnect requested");
        let mut effects = self.stop();
        self.status.last_error = None;
        self.open(&mut effects);
        effects
    }

    /// The reconnect timer elapsed.
    pub fn reconnect_timer_fired(&mut self) -> Vec<Effect> {
        let mut effects = Vec::new();
        if !self.timer_pending || self.status.connection_state != ConnectionState::Disconnected {
            return effects;
        }
        self.timer_pending = false;
        debug!(attempt = self.status.reconnect_attempt, "Reconnect timer fired");
        self.open(&mut effects);
        effects
    }

    /// Handle an event from the channel instance stamped with `epoch`.
    pub fn channel_event(&mut self, epoch: u64, event: ChannelEvent) -> Vec<Effect> {
        let mut effects = Vec::new();
        if epoch != self.epoch || !self.channel_open {
            debug!(epoch, current = self.epoch, ?event, "Discarding stale channel event");
            return effects;
        }

        match event {
            ChannelEvent::Open => self.on_open(&mut effects),
            ChannelEvent::Message(message) => self.on_message(message, &mut effects),
            ChannelEvent::Disconnect(reason) => self.on_disconnect(reason, &mut effects),
            ChannelEvent::ConnectError(message) => {
                warn!(error = %message, "Tracking channel failed to connect");
                self.on_connect_error(message, &mut effects);
            }
            ChannelEvent::Error(message) => {
                warn!(error = %message, "Tracking channel error");
                self.status.last_error = Some(message.clone());
                effects.push(Effect::Emit(TrackingEvent::Error(message)));
            }
        }
        effects
    }

    fn on_open(&mut self, effects: &mut Vec<Effect>) {
        let Some(order_id) = self.status.order_id.clone() else {
            return;
        };
        info!(order_id = %order_id, "Tracking channel connected");
        self.status.connection_state = ConnectionState::Connected;
        self.status.reconnect_attempt = 0;
        self.status.last_error = None;
        if self.timer_pending {
            self.timer_pending = false;
            effects.push(Effect::CancelReconnect);
        }
        effects.push(Effect::Send(ClientMessage::TrackOrder(order_id)));
        effects.push(Effect::Emit(TrackingEvent::Connected));
    }

    fn on_message(&mut self, message: ServerMessage, effects: &mut Vec<Effect>) {
        match message {
            ServerMessage::Connected => debug!("Ignoring repeated handshake acknowledgement"),
            ServerMessage::TrackingStarted { order_id } => {
                debug!(?order_id, "Server acknowledged tracking");
            }
            ServerMessage::LocationUpdate(update) => {
                if self.status.order_id.as_deref() != Some(update.order_id.as_str()) {
                    warn!(
                        expected = self.status.order_id.as_deref().unwrap_or_default(),
                        received = %update.order_id,
                        "Discarding update for another order"
                    );
                    self.status.last_error =
                        Some(format!("Ignored update for order {}", update.order_id));
                    return;
                }
                self.status.apply_update(&update);
                effects.push(Effect::Emit(TrackingEvent::LocationUpdate(update)));
            }
            ServerMessage::Error(message) => {
                warn!(error = %message, "Tracking server reported an error");
                self.status.last_error = Some(message.clone());
                effects.push(Effect::Emit(TrackingEvent::Error(message)));
            }
            // The transport surfaces these as lifecycle events.
            ServerMessage::Disconnect { reason } => self.on_disconnect(reason, effects),
            ServerMessage::ConnectError(message) => {
                warn!(error = %message, "Tracking server rejected the connection");
                self.on_connect_error(message, effects);
            }
        }
    }

    /// A connect error on a connected session also ends it for subscribers.
    fn on_connect_error(&mut self, message: String, effects: &mut Vec<Effect>) {
        let was_connected = self.status.is_connected();
        self.status.last_error = Some(message.clone());
        self.close_channel(effects);
        if was_connected {
            effects.push(Effect::Emit(TrackingEvent::Disconnected {
                reason: message.clone(),
            }));
        }
        effects.push(Effect::Emit(TrackingEvent::Error(message)));
        self.schedule_reconnect(effects);
    }

    fn on_disconnect(&mut self, reason: String, effects: &mut Vec<Effect>) {
        self.close_channel(effects);
        effects.push(Effect::Emit(TrackingEvent::Disconnected {
            reason: reason.clone(),
        }));

        if is_intentional_disconnect(&reason) {
            info!(reason = %reason, "Tracking channel closed intentionally");
            self.epoch += 1;
            self.status.connection_state = ConnectionState::Idle;
            self.status.reconnect_attempt = 0;
        } else {
            warn!(reason = %reason, "Tracking channel lost");
            self.status.last_error = Some(format!("Connection lost: {}", reason));
            self.schedule_reconnect(effects);
        }
    }

    fn open(&mut self, effects: &mut Vec<Effect>) {
        self.epoch += 1;
        self.channel_open = true;
        self.status.connection_state = ConnectionState::Connecting;
        effects.push(Effect::OpenChannel { epoch: self.epoch });
    }

    fn close_channel(&mut self, effects: &mut Vec<Effect>) {
        if self.channel_open {
            self.channel_open = false;
            effects.push(Effect::CloseChannel);
        }
    }

    fn teardown(&mut self, effects: &mut Vec<Effect>) {
        if self.status.is_connected() {
            if let Some(order_id) = self.status.order_id.clone() {
                effects.push(Effect::Send(ClientMessage::StopTracking(order_id)));
            }
        }
        self.close_channel(effects);
        if self.timer_pending {
            self.timer_pending = false;
            effects.push(Effect::CancelReconnect);
        }
        self.epoch += 1;
        self.status.connection_state = ConnectionState::Idle;
        self.status.reconnect_attempt = 0;
    }

    fn schedule_reconnect(&mut self, effects: &mut Vec<Effect>) {
        self.epoch += 1;
        self.status.reconnect_attempt += 1;
        let attempt = self.status.reconnect_attempt;

        if attempt > self.policy.max_attempts {
            warn!(attempts = self.policy.max_attempts, "Reconnect attempts exhausted");
            self.status.connection_state = ConnectionState::Failed;
            self.status.reconnect_attempt = self.policy.max_attempts;
            self.status.last_error = Some(RECONNECT_EXHAUSTED_MESSAGE.to_string());
            if self.timer_pending {
                self.timer_pending = false;
                effects.push(Effect::CancelReconnect);
            }
            effects.push(Effect::Emit(TrackingEvent::Error(
                RECONNECT_EXHAUSTED_MESSAGE.to_string(),
            )));
            return;
        }

        let delay = self.policy.delay_for_attempt(attempt);
        debug!(attempt, delay_ms = delay.as_millis() as u64, "Scheduling reconnect");
        self.status.connection_state = ConnectionState::Disconnected;
        self.timer_pending = true;
        effects.push(Effect::ScheduleReconnect { attempt, delay });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geo::Position;
    use crate::tracking::channel::{REASON_SERVER_DISCONNECT, REASON_TRANSPORT_CLOSE};
    use crate::tracking::state::LocationUpdate;
    use chrono::Utc;

    fn machine() -> ConnectionMachine {
        ConnectionMachine::new(ReconnectPolicy::default())
    }

    fn update(order_id: &str, latitude: f64, longitude: f64) -> LocationUpdate {
        LocationUpdate {
            order_id: order_id.to_string(),
            position: Position::new(latitude, longitude),
            eta_minutes: 8.0,
            distance_remaining: 1.2,
            status: "out_for_delivery".to_string(),
            server_timestamp: Utc::now(),
        }
    }

    fn connected(order_id: &str) -> ConnectionMachine {
        let mut m = machine();
        m.start(order_id);
        let epoch = m.epoch();
        m.channel_event(epoch, ChannelEvent::Open);
        m
    }

    fn drop_connection(m: &mut ConnectionMachine) -> Vec<Effect> {
        let epoch = m.epoch();
        m.channel_event(epoch, ChannelEvent::Disconnect(REASON_TRANSPORT_CLOSE.into()))
    }

    fn scheduled_delay(effects: &[Effect]) -> Option<Duration> {
        effects.iter().find_map(|e| match e {
            Effect::ScheduleReconnect { delay, .. } => Some(*delay),
            _ => None,
        })
    }

    #[test]
    fn test_start_opens_channel() {
        let mut m = machine();
        let effects = m.start("ORD-1");
        assert_eq!(effects, vec![Effect::OpenChannel { epoch: 1 }]);
        assert_eq!(m.status().connection_state, ConnectionState::Connecting);
        assert_eq!(m.status().order_id.as_deref(), Some("ORD-1"));
    }

    #[test]
    fn test_start_rejects_empty_order() {
        let mut m = machine();
        let effects = m.start("   ");
        assert!(matches!(effects.as_slice(), [Effect::Emit(TrackingEvent::Error(_))]));
        assert_eq!(m.status().connection_state, ConnectionState::Idle);
        assert!(m.status().last_error.is_some());
        assert!(!m.has_channel());
    }

    #[test]
    fn test_start_same_order_is_idempotent() {
        let mut m = connected("ORD-1");
        assert!(m.start("ORD-1").is_empty());
        assert!(m.status().is_connected());
    }

    #[test]
    fn test_open_subscribes_and_emits_connected() {
        let mut m = machine();
        m.start("ORD-1");
        let effects = m.channel_event(1, ChannelEvent::Open);
        assert_eq!(
            effects,
            vec![
                Effect::Send(ClientMessage::TrackOrder("ORD-1".into())),
                Effect::Emit(TrackingEvent::Connected),
            ]
        );
        assert!(m.status().is_connected());
    }

    #[test]
    fn test_switching_order_tears_down_first() {
        let mut m = connected("ORD-A");
        let effects = m.start("ORD-B");
        assert_eq!(
            effects,
            vec![
                Effect::Send(ClientMessage::StopTracking("ORD-A".into())),
                Effect::CloseChannel,
                Effect::OpenChannel { epoch: 3 },
            ]
        );
        assert_eq!(m.status().order_id.as_deref(), Some("ORD-B"));
    }

    #[test]
    fn test_stale_epoch_events_are_discarded() {
        let mut m = connected("ORD-A");
        let old_epoch = m.epoch();
        m.start("ORD-B");

        let late = ServerMessage::LocationUpdate(update("ORD-A", 1.0, 2.0));
        assert!(m.channel_event(old_epoch, ChannelEvent::Message(late)).is_empty());
        assert!(m.status().delivery_position.is_none());
    }

    #[test]
    fn test_update_for_other_order_sets_last_error() {
        let mut m = connected("ORD-B");
        let epoch = m.epoch();
        let stray = ServerMessage::LocationUpdate(update("ORD-A", 1.0, 2.0));
        assert!(m.channel_event(epoch, ChannelEvent::Message(stray)).is_empty());
        assert!(m.status().last_error.as_deref().unwrap().contains("ORD-A"));
        assert!(m.status().delivery_position.is_none());
    }

    #[test]
    fn test_location_update_applied_and_emitted() {
        let mut m = connected("ORD-1");
        let epoch = m.epoch();
        let u = update("ORD-1", 21.15, 79.65);
        let effects = m.channel_event(
            epoch,
            ChannelEvent::Message(ServerMessage::LocationUpdate(u.clone())),
        );
        assert_eq!(effects, vec![Effect::Emit(TrackingEvent::LocationUpdate(u))]);

        let status = m.status();
        assert_eq!(status.eta_minutes, Some(8.0));
        assert_eq!(status.distance_remaining, Some(1.2));
        assert_eq!(status.delivery_position, Some(Position::new(21.15, 79.65)));
        assert_eq!(status.delivery_status.as_deref(), Some("out_for_delivery"));
    }

    #[test]
    fn test_latest_update_wins() {
        let mut m = connected("ORD-1");
        let epoch = m.epoch();
        for (lat, lon) in [(1.0, 1.0), (2.0, 2.0), (1.5, 1.5)] {
            m.channel_event(
                epoch,
                ChannelEvent::Message(ServerMessage::LocationUpdate(update("ORD-1", lat, lon))),
            );
        }
        assert_eq!(m.status().delivery_position, Some(Position::new(1.5, 1.5)));
    }

    #[test]
    fn test_server_disconnect_goes_idle_without_reconnect() {
        let mut m = connected("ORD-1");
        let epoch = m.epoch();
        let effects = m.channel_event(
            epoch,
            ChannelEvent::Disconnect(REASON_SERVER_DISCONNECT.into()),
        );
        assert_eq!(m.status().connection_state, ConnectionState::Idle);
        assert!(scheduled_delay(&effects).is_none());
        assert!(!m.has_pending_reconnect());
        assert!(effects.contains(&Effect::Emit(TrackingEvent::Disconnected {
            reason: REASON_SERVER_DISCONNECT.into()
        })));
    }

    #[test]
    fn test_connect_error_while_connected_emits_disconnected() {
        let mut m = connected("ORD-1");
        let epoch = m.epoch();
        let effects = m.channel_event(epoch, ChannelEvent::ConnectError("kicked".into()));
        assert_eq!(
            effects,
            vec![
                Effect::CloseChannel,
                Effect::Emit(TrackingEvent::Disconnected {
                    reason: "kicked".into()
                }),
                Effect::Emit(TrackingEvent::Error("kicked".into())),
                Effect::ScheduleReconnect {
                    attempt: 1,
                    delay: Duration::from_millis(2_000)
                },
            ]
        );
        assert_eq!(m.status().connection_state, ConnectionState::Disconnected);
        assert_eq!(m.status().last_error.as_deref(), Some("kicked"));
    }

    #[test]
    fn test_connect_error_message_while_connected_emits_disconnected() {
        let mut m = connected("ORD-1");
        let epoch = m.epoch();
        let effects = m.channel_event(
            epoch,
            ChannelEvent::Message(ServerMessage::ConnectError("Unauthorized".into())),
        );
        assert!(effects.contains(&Effect::Emit(TrackingEvent::Disconnected {
            reason: "Unauthorized".into()
        })));
        assert_eq!(scheduled_delay(&effects), Some(Duration::from_millis(2_000)));
    }

    #[test]
    fn test_connect_error_while_connecting_emits_only_error() {
        let mut m = machine();
        m.start("ORD-1");
        let epoch = m.epoch();
        let effects = m.channel_event(epoch, ChannelEvent::ConnectError("refused".into()));
        assert!(!effects
            .iter()
            .any(|e| matches!(e, Effect::Emit(TrackingEvent::Disconnected { .. }))));
        assert!(effects.contains(&Effect::Emit(TrackingEvent::Error("refused".into()))));
    }

    #[test]
    fn test_transport_close_schedules_first_reconnect() {
        let mut m = connected("ORD-1");
        let effects = drop_connection(&mut m);
        assert_eq!(scheduled_delay(&effects), Some(Duration::from_millis(2_000)));
        assert_eq!(m.status().connection_state, ConnectionState::Disconnected);
        assert_eq!(m.status().reconnect_attempt, 1);
        assert_eq!(
            m.status().last_error.as_deref(),
            Some("Connection lost: transport close")
        );
    }

    #[test]
    fn test_timer_reopens_with_new_epoch() {
        let mut m = connected("ORD-1");
        drop_connection(&mut m);
        let before = m.epoch();
        let effects = m.reconnect_timer_fired();
        assert_eq!(effects, vec![Effect::OpenChannel { epoch: before + 1 }]);
        assert_eq!(m.status().connection_state, ConnectionState::Connecting);
    }

    #[test]
    fn test_spurious_timer_is_ignored() {
        let mut m = connected("ORD-1");
        assert!(m.reconnect_timer_fired().is_empty());
        assert!(m.status().is_connected());
    }

    #[test]
    fn test_backoff_sequence_then_failed() {
        let mut m = machine();
        m.start("ORD-1");
        let mut delays = Vec::new();

        loop {
            let epoch = m.epoch();
            let effects = m.channel_event(epoch, ChannelEvent::ConnectError("refused".into()));
            match scheduled_delay(&effects) {
                Some(delay) => {
                    delays.push(delay.as_millis() as u64);
                    m.reconnect_timer_fired();
                }
                None => break,
            }
        }

        assert_eq!(delays, vec![2_000, 4_000, 8_000, 10_000, 10_000]);
        assert!(m.status().is_failed());
        assert_eq!(m.status().reconnect_attempt, 5);
        assert_eq!(m.status().last_error.as_deref(), Some(RECONNECT_EXHAUSTED_MESSAGE));
        assert!(!m.has_pending_reconnect());
        assert!(!m.has_channel());
    }

    #[test]
    fn test_failed_is_terminal_until_manual_reconnect() {
        let mut m = machine();
        m.start("ORD-1");
        for _ in 0..6 {
            let epoch = m.epoch();
            m.channel_event(epoch, ChannelEvent::ConnectError("refused".into()));
            m.reconnect_timer_fired();
        }
        assert!(m.status().is_failed());
        assert!(m.reconnect_timer_fired().is_empty());
        assert!(m.start("ORD-1").is_empty());

        let effects = m.manual_reconnect();
        assert!(matches!(effects.as_slice(), [Effect::OpenChannel { .. }]));
        assert_eq!(m.status().reconnect_attempt, 0);
        assert!(m.status().last_error.is_none());
        assert_eq!(m.status().connection_state, ConnectionState::Connecting);
    }

    #[test]
    fn test_successful_connect_resets_attempts() {
        let mut m = connected("ORD-1");
        drop_connection(&mut m);
        drop_connection(&mut m);
        m.reconnect_timer_fired();
        let epoch = m.epoch();
        m.channel_event(epoch, ChannelEvent::Open);
        assert_eq!(m.status().reconnect_attempt, 0);
        assert!(m.status().is_connected());
    }

    #[test]
    fn test_stop_when_connected() {
        let mut m = connected("ORD-1");
        let effects = m.stop();
        assert_eq!(
            effects,
            vec![
                Effect::Send(ClientMessage::StopTracking("ORD-1".into())),
                Effect::CloseChannel,
                Effect::Emit(TrackingEvent::Disconnected {
                    reason: REASON_CLIENT_DISCONNECT.into()
                }),
            ]
        );
        assert_eq!(m.status().connection_state, ConnectionState::Idle);
        assert_eq!(m.status().order_id.as_deref(), Some("ORD-1"));
    }

    #[test]
    fn test_stop_mid_reconnect_cancels_timer() {
        let mut m = connected("ORD-1");
        drop_connection(&mut m);
        let effects = m.stop();
        assert_eq!(effects, vec![Effect::CancelReconnect]);
        assert!(!m.has_pending_reconnect());
        assert_eq!(m.status().connection_state, ConnectionState::Idle);
        assert!(m.reconnect_timer_fired().is_empty());
    }

    #[test]
    fn test_stop_drops_late_events() {
        let mut m = connected("ORD-1");
        let epoch = m.epoch();
        m.stop();
        let late = ServerMessage::LocationUpdate(update("ORD-1", 1.0, 1.0));
        assert!(m.channel_event(epoch, ChannelEvent::Message(late)).is_empty());
    }

    #[test]
    fn test_stop_from_idle_is_noop() {
        let mut m = machine();
        assert!(m.stop().is_empty());
        assert_eq!(m.status().connection_state, ConnectionState::Idle);
    }

    #[test]
    fn test_start_after_stop_resumes_same_order() {
        let mut m = connected("ORD-1");
        m.stop();
        let effects = m.start("ORD-1");
        assert!(matches!(effects.as_slice(), [Effect::OpenChannel { .. }]));
    }

    #[test]
    fn test_manual_reconnect_without_order() {
        let mut m = machine();
        let effects = m.manual_reconnect();
        assert!(matches!(effects.as_slice(), [Effect::Emit(TrackingEvent::Error(_))]));
        assert_eq!(m.status().connection_state, ConnectionState::Idle);
    }

    #[test]
    fn test_manual_reconnect_while_connected() {
        let mut m = connected("ORD-1");
        let effects = m.manual_reconnect();
        assert_eq!(effects[0], Effect::Send(ClientMessage::StopTracking("ORD-1".into())));
        assert!(matches!(effects.last(), Some(Effect::OpenChannel { .. })));
    }

    #[test]
    fn test_non_fatal_error_keeps_connection() {
        let mut m = connected("ORD-1");
        let epoch = m.epoch();
        let effects = m.channel_event(epoch, ChannelEvent::Error("invalid message".into()));
        assert_eq!(effects, vec![Effect::Emit(TrackingEvent::Error("invalid message".into()))]);
        assert!(m.status().is_connected());
        assert_eq!(m.status().last_error.as_deref(), Some("invalid message"));
    }
}
