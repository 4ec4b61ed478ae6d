//! Connection manager task.
//!
//! [`ConnectionManager`] is the public handle. It spawns one task that owns a
//! [`ConnectionMachine`], a [`Connector`] and at most one live channel, and
//! executes the machine's effects. All inputs (commands, channel events and
//! the reconnect timer) are handled by that single task, so no locking is
//! needed around the machine.
//!
//! # Usage
//!
//! ```ignore
//! use couriertrack::tracking::{ConnectionManager, TcpConnector, TrackingConfig};
//!
//! let manager = ConnectionManager::spawn(TcpConnector::new(), TrackingConfig::default());
//! let mut events = manager.subscribe();
//! manager.start("ORD-1")?;
//!
//! while let Ok(event) = events.recv().await {
//!     println!("{:?}", event);
//! }
//! ```

use std::pin::Pin;

use tokio::sync::{broadcast, mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::Sleep;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use super::channel::{Channel, ChannelEvent, ChannelSink, Connector};
use super::config::{ChannelParams, TrackingConfig};
use super::error::TrackingError;
use super::machine::{ConnectionMachine, Effect};
use super::state::{TrackingEvent, TrackingStatus};

type ReconnectTimer = Option<Pin<Box<Sleep>>>;

#[derive(Debug)]
enum Command {
    Start(String),
    Stop,
    Reconnect,
}

/// Handle to a running connection manager task.
///
/// Dropping the handle cancels the task, which stops tracking and closes
/// the channel.
pub struct ConnectionManager {
    commands: mpsc::UnboundedSender<Command>,
    status_rx: watch::Receiver<TrackingStatus>,
    events_tx: broadcast::Sender<TrackingEvent>,
    cancellation: CancellationToken,
    task: Option<JoinHandle<()>>,
}

impl ConnectionManager {
    /// Spawn the manager task on the current tokio runtime.
    pub fn spawn<C: Connector>(connector: C, config: TrackingConfig) -> Self {
        let (commands, command_rx) = mpsc::unbounded_channel();
        let (channel_tx, channel_rx) = mpsc::unbounded_channel();
        let (status_tx, status_rx) = watch::channel(TrackingStatus::default());
        let (events_tx, _) = broadcast::channel(config.event_capacity.max(1));
        let cancellation = CancellationToken::new();

        let task = ManagerTask {
            connector,
            params: config.channel_params(),
            machine: ConnectionMachine::new(config.reconnect),
            channel: None,
            channel_tx,
            events_tx: events_tx.clone(),
            status_tx,
        };
        let handle = tokio::spawn(task.run(command_rx, channel_rx, cancellation.clone()));

        Self {
            commands,
            status_rx,
            events_tx,
            cancellation,
            task: Some(handle),
        }
    }

    /// Begin tracking `order_id`. Switching orders tears the old channel down first.
    pub fn start(&self, order_id: impl Into<String>) -> Result<(), TrackingError> {
        self.send(Command::Start(order_id.into()))
    }

    /// Stop tracking and close the channel. Safe from any state.
    pub fn stop(&self) -> Result<(), TrackingError> {
        self.send(Command::Stop)
    }

    /// Reset the attempt counter and reconnect the held order.
    pub fn manual_reconnect(&self) -> Result<(), TrackingError> {
        self.send(Command::Reconnect)
    }

    /// Latest published status snapshot.
    pub fn status(&self) -> TrackingStatus {
        self.status_rx.borrow().clone()
    }

    /// Receiver notified after every status change.
    pub fn watch_status(&self) -> watch::Receiver<TrackingStatus> {
        self.status_rx.clone()
    }

    /// Subscribe to tracking events from this point on.
    pub fn subscribe(&self) -> broadcast::Receiver<TrackingEvent> {
        self.events_tx.subscribe()
    }

    /// Stop tracking and wait for the task to exit.
    pub async fn shutdown(mut self) {
        self.cancellation.cancel();
        if let Some(task) = self.task.take() {
            if let Err(e) = task.await {
                warn!(error = %e, "Tracking manager task failed");
            }
        }
    }

    fn send(&self, command: Command) -> Result<(), TrackingError> {
        self.commands
            .send(command)
            .map_err(|_| TrackingError::ManagerClosed)
    }
}

impl Drop for ConnectionManager {
    fn drop(&mut self) {
        self.cancellation.cancel();
    }
}

struct ManagerTask<C: Connector> {
    connector: C,
    params: ChannelParams,
    machine: ConnectionMachine,
    channel: Option<C::Channel>,
    channel_tx: mpsc::UnboundedSender<(u64, ChannelEvent)>,
    events_tx: broadcast::Sender<TrackingEvent>,
    status_tx: watch::Sender<TrackingStatus>,
}

impl<C: Connector> ManagerTask<C> {
    async fn run(
        mut self,
        mut commands: mpsc::UnboundedReceiver<Command>,
        mut channel_rx: mpsc::UnboundedReceiver<(u64, ChannelEvent)>,
        cancellation: CancellationToken,
    ) {
        let mut timer: ReconnectTimer = None;

        loop {
            let effects = tokio::select! {
                _ = cancellation.cancelled() => break,

                command = commands.recv() => match command {
                    Some(Command::Start(order_id)) => self.machine.start(&order_id),
                    Some(Command::Stop) => self.machine.stop(),
                    Some(Command::Reconnect) => self.machine.manual_reconnect(),
                    None => break,
                },

                Some((epoch, event)) = channel_rx.recv() => {
                    self.machine.channel_event(epoch, event)
                }

                _ = async {
                    if let Some(sleep) = timer.as_mut() {
                        sleep.await;
                    }
                }, if timer.is_some() => {
                    timer = None;
                    self.machine.reconnect_timer_fired()
                }
            };

            self.apply(effects, &mut timer);
        }

        let effects = self.machine.stop();
        self.apply(effects, &mut timer);
        debug!("Tracking manager stopped");
    }

    /// Execute `effects`, then publish the status before broadcasting events
    /// so subscribers never observe an event ahead of its status.
    fn apply(&mut self, effects: Vec<Effect>, timer: &mut ReconnectTimer) {
        let mut emitted = Vec::new();
        let mut pending = effects;
        while !pending.is_empty() {
            let mut follow_up = Vec::new();
            for effect in pending {
                match effect {
                    Effect::OpenChannel { epoch } => {
                        if let Some(mut old) = self.channel.take() {
                            old.close();
                        }
                        let sink = ChannelSink::new(epoch, self.channel_tx.clone());
                        self.channel = Some(self.connector.open(&self.params, sink));
                    }
                    Effect::Send(message) => {
                        let event = message.event_name();
                        let result = match self.channel.as_mut() {
                            Some(channel) => channel.send(message),
                            None => Err(super::error::ChannelError::Closed),
                        };
                        if let Err(e) = result {
                            warn!(event, error = %e, "Failed to send tracking message");
                            follow_up.extend(
                                self.machine.record_error(format!("Failed to send {}: {}", event, e)),
                            );
                        }
                    }
                    Effect::CloseChannel => {
                        if let Some(mut channel) = self.channel.take() {
                            channel.close();
                        }
                    }
                    Effect::ScheduleReconnect { attempt, delay } => {
                        debug!(attempt, delay_ms = delay.as_millis() as u64, "Reconnect timer armed");
                        *timer = Some(Box::pin(tokio::time::sleep(delay)));
                    }
                    Effect::CancelReconnect => {
                        *timer = None;
                    }
                    Effect::Emit(event) => emitted.push(event),
                }
            }
            pending = follow_up;
        }

        self.status_tx.send_replace(self.machine.status().clone());
        for event in emitted {
            // No subscribers is fine; status still carries the state.
            let _ = self.events_tx.send(event);
        }
    }
}
