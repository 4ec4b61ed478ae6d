//! Channel abstraction between the connection manager and a transport.
//!
//! A [`Connector`] opens one [`Channel`] instance per connection attempt. The
//! instance reports its lifecycle through a [`ChannelSink`], which stamps every
//! event with the epoch the manager assigned when opening it. The manager bumps
//! its epoch whenever it discards an instance, so late events from an old
//! instance can never reach subscribers.

use tokio::sync::mpsc;

use super::config::ChannelParams;
use super::error::ChannelError;
use super::protocol::{ClientMessage, ServerMessage};

/// The server closed the channel on purpose.
pub const REASON_SERVER_DISCONNECT: &str = "io server disconnect";

/// The client closed the channel on purpose.
pub const REASON_CLIENT_DISCONNECT: &str = "io client disconnect";

/// The connection was closed by the peer or the network.
pub const REASON_TRANSPORT_CLOSE: &str = "transport close";

/// The connection failed mid-stream.
pub const REASON_TRANSPORT_ERROR: &str = "transport error";

/// Returns true if a disconnect with `reason` must not trigger a reconnect.
pub fn is_intentional_disconnect(reason: &str) -> bool {
    reason == REASON_SERVER_DISCONNECT || reason == REASON_CLIENT_DISCONNECT
}

/// Lifecycle and message events emitted by a channel instance.
#[derive(Debug, Clone, PartialEq)]
pub enum ChannelEvent {
    /// The channel is open and ready for messages.
    Open,
    /// A decoded server message.
    Message(ServerMessage),
    /// The open channel was lost.
    Disconnect(String),
    /// The channel could not be opened.
    ConnectError(String),
    /// A non-fatal error (e.g. an undecodable frame).
    Error(String),
}

/// Event sink handed to one channel instance.
#[derive(Debug, Clone)]
pub struct ChannelSink {
    epoch: u64,
    tx: mpsc::UnboundedSender<(u64, ChannelEvent)>,
}

impl ChannelSink {
    pub fn new(epoch: u64, tx: mpsc::UnboundedSender<(u64, ChannelEvent)>) -> Self {
        Self { epoch, tx }
    }

    /// Epoch assigned to this channel instance.
    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    /// Deliver an event. Returns false once the manager has gone away.
    pub fn emit(&self, event: ChannelEvent) -> bool {
        self.tx.send((self.epoch, event)).is_ok()
    }
}

/// One live channel instance.
pub trait Channel: Send {
    /// Queue a message for the server.
    fn send(&mut self, message: ClientMessage) -> Result<(), ChannelError>;

    /// Close the channel after flushing queued messages.
    ///
    /// A closed channel emits no further events that the manager will accept.
    fn close(&mut self);
}

/// Factory for channel instances.
pub trait Connector: Send + 'static {
    type Channel: Channel;

    /// Start opening a channel. Completion is reported through `sink`
    /// as [`ChannelEvent::Open`] or [`ChannelEvent::ConnectError`].
    fn open(&self, params: &ChannelParams, sink: ChannelSink) -> Self::Channel;
}
