//! Presenter task.
//!
//! Runs a [`LiveMapPresenter`] on its own tokio task, fed by the tracking
//! event stream and by [`PresenterCommand`]s from the host view. Route
//! requests run concurrently on the [`RouteService`]; their results come
//! back through the task, so the presenter itself is only ever touched from
//! one place.

use std::sync::Arc;

use tokio::sync::broadcast::error::RecvError;
use tokio::sync::{broadcast, mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use super::error::MapError;
use super::presenter::{LiveMapPresenter, RouteTicket};
use super::route::{RouteError, RouteResponse, RouteService};
use super::state::{MapInputs, MapView, ProviderStatus, RouteTarget};
use super::surface::{Interaction, MapSurface};
use crate::tracking::TrackingEvent;

type RouteResult = (u64, Result<RouteResponse, RouteError>);

/// Inputs from the host view.
#[derive(Debug)]
pub enum PresenterCommand<M> {
    /// The provider yielded a ready map surface.
    MapReady(M),
    ProviderStatus(ProviderStatus),
    Interaction(Interaction),
    SetInputs(MapInputs),
    SetRouteTarget(RouteTarget),
}

/// Handle to a running presenter task.
///
/// Dropping the handle tears the presenter down.
pub struct PresenterHandle<M> {
    commands: mpsc::UnboundedSender<PresenterCommand<M>>,
    view_rx: watch::Receiver<MapView>,
    cancellation: CancellationToken,
    task: Option<JoinHandle<()>>,
}

impl<M> PresenterHandle<M> {
    pub fn send(&self, command: PresenterCommand<M>) -> Result<(), MapError> {
        self.commands
            .send(command)
            .map_err(|_| MapError::PresenterClosed)
    }

    /// Latest rendered view.
    pub fn view(&self) -> MapView {
        self.view_rx.borrow().clone()
    }

    pub fn watch_view(&self) -> watch::Receiver<MapView> {
        self.view_rx.clone()
    }

    /// Tear the presenter down and wait for the task to exit.
    pub async fn shutdown(mut self) {
        self.cancellation.cancel();
        if let Some(task) = self.task.take() {
            if let Err(e) = task.await {
                warn!(error = %e, "Map presenter task failed");
            }
        }
    }
}

impl<M> Drop for PresenterHandle<M> {
    fn drop(&mut self) {
        self.cancellation.cancel();
    }
}

/// Spawn `presenter` on the current runtime.
pub fn spawn_presenter<M, S>(
    presenter: LiveMapPresenter<M>,
    routes: Arc<S>,
    events: broadcast::Receiver<TrackingEvent>,
) -> PresenterHandle<M>
where
    M: MapSurface + 'static,
    S: RouteService,
{
    let (commands, command_rx) = mpsc::unbounded_channel();
    let (view_tx, view_rx) = watch::channel(presenter.render());
    let cancellation = CancellationToken::new();

    let task = PresenterTask {
        presenter,
        routes,
        view_tx,
    };
    let handle = tokio::spawn(task.run(command_rx, events, cancellation.clone()));

    PresenterHandle {
        commands,
        view_rx,
        cancellation,
        task: Some(handle),
    }
}

struct PresenterTask<M: MapSurface, S> {
    presenter: LiveMapPresenter<M>,
    routes: Arc<S>,
    view_tx: watch::Sender<MapView>,
}

impl<M, S> PresenterTask<M, S>
where
    M: MapSurface + 'static,
    S: RouteService,
{
    async fn run(
        mut self,
        mut commands: mpsc::UnboundedReceiver<PresenterCommand<M>>,
        mut events: broadcast::Receiver<TrackingEvent>,
        cancellation: CancellationToken,
    ) {
        let (route_tx, mut route_rx) = mpsc::unbounded_channel::<RouteResult>();
        let mut events_open = true;

        loop {
            let ticket = tokio::select! {
                _ = cancellation.cancelled() => break,

                command = commands.recv() => match command {
                    Some(command) => self.handle_command(command),
                    None => break,
                },

                event = events.recv(), if events_open => match event {
                    Ok(event) => self.handle_event(event),
                    Err(RecvError::Lagged(skipped)) => {
                        warn!(skipped, "Map presenter lagged behind tracking events");
                        None
                    }
                    Err(RecvError::Closed) => {
                        debug!("Tracking event stream closed");
                        events_open = false;
                        None
                    }
                },

                Some((seq, result)) = route_rx.recv() => {
                    self.presenter.complete_route(seq, result);
                    None
                }
            };

            if let Some(ticket) = ticket {
                self.dispatch_route(ticket, route_tx.clone());
            }
            self.publish();
        }

        self.presenter.teardown();
        self.publish();
        debug!("Map presenter task stopped");
    }

    fn handle_command(&mut self, command: PresenterCommand<M>) -> Option<RouteTicket> {
        match command {
            PresenterCommand::MapReady(surface) => self.presenter.on_map_ready(surface, Instant::now()),
            PresenterCommand::ProviderStatus(status) => {
                self.presenter.set_provider_status(status);
                None
            }
            PresenterCommand::Interaction(interaction) => {
                self.presenter.on_interaction(interaction, Instant::now());
                None
            }
            PresenterCommand::SetInputs(inputs) => self.presenter.set_inputs(inputs),
            PresenterCommand::SetRouteTarget(target) => self.presenter.set_route_target(target),
        }
    }

    fn handle_event(&mut self, event: TrackingEvent) -> Option<RouteTicket> {
        match event {
            TrackingEvent::LocationUpdate(update) => self.presenter.on_location_update(update.position),
            TrackingEvent::Connected => self.set_tracking_active(true),
            TrackingEvent::Disconnected { .. } => self.set_tracking_active(false),
            TrackingEvent::Error(_) => None,
        }
    }

    fn set_tracking_active(&mut self, active: bool) -> Option<RouteTicket> {
        if self.presenter.inputs().tracking_active == active {
            return None;
        }
        let inputs = MapInputs {
            tracking_active: active,
            ..self.presenter.inputs().clone()
        };
        self.presenter.set_inputs(inputs)
    }

    fn dispatch_route(&self, ticket: RouteTicket, results: mpsc::UnboundedSender<RouteResult>) {
        let routes = Arc::clone(&self.routes);
        tokio::spawn(async move {
            let result = routes.route(ticket.request).await;
            // The presenter may be gone; late results are dropped.
            let _ = results.send((ticket.seq, result));
        });
    }

    fn publish(&self) {
        let view = self.presenter.render();
        self.view_tx.send_if_modified(|current| {
            if *current != view {
                *current = view;
                true
            } else {
                false
            }
        });
    }
}
