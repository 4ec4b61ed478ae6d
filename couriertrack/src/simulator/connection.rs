//! One simulator client connection.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use futures::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio::time::{interval, timeout, MissedTickBehavior};
use tokio_util::codec::{Framed, LinesCodec};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::walk::DeliveryWalk;
use super::{SimulatorConfig, UNAUTHORIZED_MESSAGE};
use crate::tracking::channel::REASON_SERVER_DISCONNECT;
use crate::tracking::tcp::MAX_FRAME_LENGTH;
use crate::tracking::{ClientMessage, ServerMessage};

/// How long a client has to present its credential.
const AUTH_TIMEOUT: Duration = Duration::from_secs(10);

type Lines = Framed<TcpStream, LinesCodec>;

pub(super) async fn handle(
    stream: TcpStream,
    peer: SocketAddr,
    config: Arc<SimulatorConfig>,
    cancellation: CancellationToken,
) {
    let mut framed = Framed::new(stream, LinesCodec::new_with_max_length(MAX_FRAME_LENGTH));

    let accepted = tokio::select! {
        _ = cancellation.cancelled() => false,
        accepted = handshake(&mut framed, peer, &config) => accepted,
    };
    if !accepted {
        return;
    }

    let mut walk: Option<DeliveryWalk> = None;
    let mut ticker = interval(config.interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = cancellation.cancelled() => {
                let goodbye = ServerMessage::Disconnect {
                    reason: REASON_SERVER_DISCONNECT.to_string(),
                };
                send(&mut framed, goodbye).await;
                break;
            }

            frame = framed.next() => {
                let line = match frame {
                    Some(Ok(line)) => line,
                    Some(Err(e)) => {
                        debug!(%peer, error = %e, "Client transport error");
                        break;
                    }
                    None => break,
                };
                if line.trim().is_empty() {
                    continue;
                }

                match ClientMessage::decode(&line) {
                    Ok(ClientMessage::Auth { .. }) => {
                        debug!(%peer, "Ignoring auth after handshake");
                    }
                    Ok(ClientMessage::TrackOrder(order_id)) => {
                        info!(%peer, order_id = %order_id, "Tracking started");
                        let started = ServerMessage::TrackingStarted {
                            order_id: Some(order_id.clone()),
                        };
                        if !send(&mut framed, started).await {
                            break;
                        }
                        walk = Some(config.walk(&order_id));
                        ticker.reset_immediately();
                    }
                    Ok(ClientMessage::StopTracking(order_id)) => {
                        if walk.as_ref().is_some_and(|w| w.order_id() == order_id) {
                            info!(%peer, order_id = %order_id, "Tracking stopped by client");
                            walk = None;
                        }
                    }
                    Err(e) => {
                        let reply = ServerMessage::Error(format!("invalid message: {}", e));
                        if !send(&mut framed, reply).await {
                            break;
                        }
                    }
                }
            }

            _ = ticker.tick(), if walk.is_some() => {
                let Some(update) = walk.as_mut().and_then(|w| w.next()) else {
                    walk = None;
                    continue;
                };
                let delivered = walk.as_ref().is_some_and(DeliveryWalk::is_finished);
                if !send(&mut framed, ServerMessage::LocationUpdate(update)).await {
                    break;
                }
                if delivered {
                    info!(%peer, "Delivery complete");
                    walk = None;
                }
            }
        }
    }

    debug!(%peer, "Client connection closed");
}

/// Accept or reject a new client. Open servers accept immediately; otherwise
/// the first frame must be an `auth` carrying the configured token.
async fn handshake(framed: &mut Lines, peer: SocketAddr, config: &SimulatorConfig) -> bool {
    let Some(expected) = config.token.as_deref() else {
        return send(framed, ServerMessage::Connected).await;
    };

    let presented = match timeout(AUTH_TIMEOUT, framed.next()).await {
        Ok(Some(Ok(line))) => match ClientMessage::decode(&line) {
            Ok(ClientMessage::Auth { token }) => Some(token),
            _ => None,
        },
        Ok(_) => return false,
        Err(_) => None,
    };

    if presented.as_deref() == Some(expected) {
        send(framed, ServerMessage::Connected).await
    } else {
        warn!(%peer, "Rejected client without a valid token");
        let refusal = ServerMessage::ConnectError(UNAUTHORIZED_MESSAGE.to_string());
        send(framed, refusal).await;
        false
    }
}

/// Write one frame. Returns false once the client is gone.
async fn send(framed: &mut Lines, message: ServerMessage) -> bool {
    match framed.send(message.encode()).await {
        Ok(()) => true,
        Err(e) => {
            debug!(error = %e, "Failed to write frame");
            false
        }
    }
}
