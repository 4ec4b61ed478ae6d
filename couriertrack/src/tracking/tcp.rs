//! TCP transport for the tracking channel.
//!
//! Frames are newline-delimited JSON envelopes (see [`protocol`](super::protocol)).
//! Each [`TcpChannel`] owns a background task that connects, authenticates,
//! waits for the server's `connect` acknowledgement and then pumps frames in
//! both directions until either side closes.

use futures::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio_util::codec::{Framed, LinesCodec, LinesCodecError};
use tracing::{debug, trace, warn};

use super::channel::{
    Channel, ChannelEvent, ChannelSink, Connector, REASON_TRANSPORT_CLOSE, REASON_TRANSPORT_ERROR,
};
use super::config::ChannelParams;
use super::error::ChannelError;
use super::protocol::{ClientMessage, ServerMessage};

/// Longest accepted frame, in bytes.
pub const MAX_FRAME_LENGTH: usize = 64 * 1024;

/// Opens [`TcpChannel`]s against `host:port` endpoints.
#[derive(Debug, Clone, Default)]
pub struct TcpConnector;

impl TcpConnector {
    pub fn new() -> Self {
        Self
    }
}

impl Connector for TcpConnector {
    type Channel = TcpChannel;

    fn open(&self, params: &ChannelParams, sink: ChannelSink) -> TcpChannel {
        let (out_tx, out_rx) = mpsc::unbounded_channel();
        tokio::spawn(run_channel(params.clone(), sink, out_rx));
        TcpChannel {
            outbound: Some(out_tx),
        }
    }
}

/// Handle to a TCP channel task.
///
/// Messages sent before the connection opens are queued and flushed once
/// authentication has been written.
#[derive(Debug)]
pub struct TcpChannel {
    outbound: Option<mpsc::UnboundedSender<ClientMessage>>,
}

impl Channel for TcpChannel {
    fn send(&mut self, message: ClientMessage) -> Result<(), ChannelError> {
        let tx = self.outbound.as_ref().ok_or(ChannelError::Closed)?;
        tx.send(message).map_err(|_| ChannelError::Closed)
    }

    fn close(&mut self) {
        // Dropping the sender lets the task flush what is queued, then exit.
        self.outbound.take();
    }
}

impl Drop for TcpChannel {
    fn drop(&mut self) {
        self.close();
    }
}

async fn run_channel(
    params: ChannelParams,
    sink: ChannelSink,
    mut outbound: mpsc::UnboundedReceiver<ClientMessage>,
) {
    let epoch = sink.epoch();
    debug!(epoch, endpoint = %params.endpoint, "Opening tracking channel");

    let stream = match tokio::time::timeout(
        params.connect_timeout,
        TcpStream::connect(&params.endpoint),
    )
    .await
    {
        Ok(Ok(stream)) => stream,
        Ok(Err(e)) => {
            sink.emit(ChannelEvent::ConnectError(e.to_string()));
            return;
        }
        Err(_) => {
            sink.emit(ChannelEvent::ConnectError("timeout".to_string()));
            return;
        }
    };

    let _ = stream.set_nodelay(true);
    let mut framed = Framed::new(stream, LinesCodec::new_with_max_length(MAX_FRAME_LENGTH));

    if let Some(token) = params.credential.clone() {
        if let Err(e) = framed.send(ClientMessage::Auth { token }.encode()).await {
            sink.emit(ChannelEvent::ConnectError(e.to_string()));
            return;
        }
    }

    match tokio::time::timeout(params.connect_timeout, handshake(&mut framed)).await {
        Ok(Ok(())) => {}
        Ok(Err(reason)) => {
            debug!(epoch, reason = %reason, "Tracking channel handshake rejected");
            sink.emit(ChannelEvent::ConnectError(reason));
            return;
        }
        Err(_) => {
            sink.emit(ChannelEvent::ConnectError("timeout".to_string()));
            return;
        }
    }

    if !sink.emit(ChannelEvent::Open) {
        return;
    }

    loop {
        tokio::select! {
            biased;

            message = outbound.recv() => match message {
                Some(message) => {
                    trace!(epoch, event = message.event_name(), "Sending frame");
                    if let Err(e) = framed.send(message.encode()).await {
                        warn!(epoch, error = %e, "Failed to write frame");
                        sink.emit(ChannelEvent::Disconnect(REASON_TRANSPORT_ERROR.to_string()));
                        break;
                    }
                }
                None => {
                    // Handle closed by the client; nothing more is delivered.
                    let _ = SinkExt::<String>::close(&mut framed).await;
                    debug!(epoch, "Tracking channel closed by client");
                    break;
                }
            },

            frame = framed.next() => match frame {
                Some(Ok(line)) => {
                    if line.trim().is_empty() {
                        continue;
                    }
                    match ServerMessage::decode(&line) {
                        Ok(ServerMessage::Disconnect { reason }) => {
                            sink.emit(ChannelEvent::Disconnect(reason));
                            break;
                        }
                        Ok(ServerMessage::ConnectError(message)) => {
                            sink.emit(ChannelEvent::ConnectError(message));
                            break;
                        }
                        Ok(message) => {
                            if !sink.emit(ChannelEvent::Message(message)) {
                                break;
                            }
                        }
                        Err(e) => {
                            sink.emit(ChannelEvent::Error(format!("invalid message: {}", e)));
                        }
                    }
                }
                Some(Err(LinesCodecError::MaxLineLengthExceeded)) => {
                    sink.emit(ChannelEvent::Error("invalid message: frame too long".to_string()));
                }
                Some(Err(LinesCodecError::Io(e))) => {
                    debug!(epoch, error = %e, "Tracking channel transport error");
                    sink.emit(ChannelEvent::Disconnect(REASON_TRANSPORT_ERROR.to_string()));
                    break;
                }
                None => {
                    sink.emit(ChannelEvent::Disconnect(REASON_TRANSPORT_CLOSE.to_string()));
                    break;
                }
            },
        }
    }
}

/// Wait for the server to accept the connection.
///
/// Returns the rejection reason on `connect_error`, an early close or an
/// unexpected first frame.
async fn handshake(framed: &mut Framed<TcpStream, LinesCodec>) -> Result<(), String> {
    loop {
        let line = match framed.next().await {
            Some(Ok(line)) => line,
            Some(Err(e)) => return Err(e.to_string()),
            None => return Err(REASON_TRANSPORT_CLOSE.to_string()),
        };
        if line.trim().is_empty() {
            continue;
        }
        return match ServerMessage::decode(&line) {
            Ok(ServerMessage::Connected) => Ok(()),
            Ok(ServerMessage::ConnectError(message)) => Err(message),
            Ok(ServerMessage::Disconnect { reason }) => Err(reason),
            Ok(other) => Err(format!("unexpected '{}' before connect", other.event_name())),
            Err(e) => Err(format!("invalid handshake: {}", e)),
        };
    }
}
