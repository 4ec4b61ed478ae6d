//! Track command - follow one delivery order live.
//!
//! Connects the tracking manager to a headless map presenter and prints a
//! running readout. Type `r` + Enter to reconnect, `q` + Enter to quit.

use std::sync::Arc;

use couriertrack::geo::Position;
use couriertrack::map::{
    spawn_presenter, LiveMapPresenter, MapInputs, MapView, OsrmRouteService, PresenterCommand,
    PresenterConfig, PresenterHandle, ProviderStatus, RouteTarget, StraightLineRouteService,
    TracingMapSurface,
};
use couriertrack::tracking::{
    spawn_status_logger, ConnectionManager, ConnectionState, LocationUpdate, TcpConnector,
    TrackingEvent, TrackingStatus, DEFAULT_LOG_INTERVAL,
};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::broadcast::error::RecvError;
use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::error::CliError;
use crate::runner::CliRunner;

/// Arguments for the track command.
pub struct TrackArgs {
    pub order_id: String,
    pub server: Option<String>,
    pub token: Option<String>,
    pub store: Option<Position>,
    pub customer: Option<Position>,
    pub route: bool,
    pub map_key: Option<String>,
    pub debug: bool,
}

/// Run the track command.
pub async fn run(args: TrackArgs) -> Result<(), CliError> {
    if args.order_id.trim().is_empty() {
        return Err(CliError::InvalidArgument(
            "order id must not be empty".to_string(),
        ));
    }

    let runner = CliRunner::new(args.debug, args.debug)?;
    runner.log_startup("track");
    let config = runner.config();

    let credential = match args.token {
        Some(token) => Some(token),
        None => runner.session_store().load()?,
    };
    let mut tracking = config.tracking_config(credential.clone());
    if let Some(server) = args.server {
        tracking.endpoint = server;
    }
    let provider = match args.map_key.as_deref() {
        Some(key) => ProviderStatus::from_credential(Some(key)),
        None => config.provider_status(),
    };

    println!("CourierTrack v{}", couriertrack::VERSION);
    println!("================");
    println!();
    println!("Order:   {}", args.order_id);
    println!("Server:  {}", tracking.endpoint);
    println!(
        "Session: {}",
        if credential.is_some() {
            "bearer token"
        } else {
            "none (use 'couriertrack session set')"
        }
    );
    println!();
    println!("Type 'r' + Enter to reconnect, 'q' + Enter or Ctrl+C to quit");
    println!();

    let manager = ConnectionManager::spawn(TcpConnector::new(), tracking);

    let presenter_config = PresenterConfig {
        route_origin_follows_delivery: args.route,
        ..config.presenter_config()
    };
    let presenter = LiveMapPresenter::new(presenter_config, provider);
    let map = if config.uses_osrm() {
        let routes = OsrmRouteService::new(&config.map.osrm_url).map_err(CliError::Routing)?;
        spawn_presenter(presenter, Arc::new(routes), manager.subscribe())
    } else {
        let routes = StraightLineRouteService::new(config.map.courier_speed_kmh);
        spawn_presenter(presenter, Arc::new(routes), manager.subscribe())
    };

    map.send(PresenterCommand::SetInputs(MapInputs {
        store: args.store,
        customer: args.customer,
        delivery: None,
        tracking_active: false,
        route: RouteTarget {
            origin: args.store,
            destination: args.customer,
            show_route: args.route,
        },
    }))?;
    map.send(PresenterCommand::MapReady(TracingMapSurface::new()))?;

    let logger_cancel = CancellationToken::new();
    let status_logger = args.debug.then(|| {
        spawn_status_logger(
            manager.watch_status(),
            logger_cancel.clone(),
            DEFAULT_LOG_INTERVAL,
        )
    });

    manager.start(args.order_id.clone())?;
    let outcome = readout_loop(&manager, &map).await;

    println!();
    println!("Stopping...");
    info!(order_id = %args.order_id, "Tracking stopped by user");
    logger_cancel.cancel();
    if let Some(handle) = status_logger {
        let _ = handle.await;
    }
    map.shutdown().await;
    manager.shutdown().await;

    outcome
}

async fn readout_loop(
    manager: &ConnectionManager,
    map: &PresenterHandle<TracingMapSurface>,
) -> Result<(), CliError> {
    let mut status_rx = manager.watch_status();
    let mut events = manager.subscribe();
    let mut view_rx = map.watch_view();
    let mut stdin = BufReader::new(tokio::io::stdin()).lines();
    let mut stdin_open = true;

    let mut last_state: Option<ConnectionState> = None;
    let initial = view_rx.borrow_and_update().clone();
    print_view(&initial);
    let mut last_view = ViewSummary::from(&initial);

    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    loop {
        tokio::select! {
            _ = &mut ctrl_c => return Ok(()),

            line = stdin.next_line(), if stdin_open => match line? {
                Some(line) => match line.trim() {
                    "r" | "R" => {
                        println!("Reconnecting...");
                        manager.manual_reconnect()?;
                    }
                    "q" | "Q" => return Ok(()),
                    "" => {}
                    other => println!("Unknown input '{}': type r to reconnect or q to quit", other),
                },
                None => stdin_open = false,
            },

            changed = status_rx.changed() => {
                if changed.is_err() {
                    return Ok(());
                }
                let status = status_rx.borrow_and_update().clone();
                print_status(&status, &mut last_state);
            }

            event = events.recv() => match event {
                Ok(TrackingEvent::LocationUpdate(update)) => print_update(&update),
                Ok(TrackingEvent::Error(message)) => println!("  ! {}", message),
                Ok(TrackingEvent::Connected) | Ok(TrackingEvent::Disconnected { .. }) => {}
                Err(RecvError::Lagged(skipped)) => println!("  ! skipped {} events", skipped),
                Err(RecvError::Closed) => return Ok(()),
            },

            changed = view_rx.changed() => {
                if changed.is_err() {
                    return Ok(());
                }
                let view = view_rx.borrow_and_update().clone();
                let summary = ViewSummary::from(&view);
                if summary != last_view {
                    print_view(&view);
                    last_view = summary;
                }
            }
        }
    }
}

fn print_status(status: &TrackingStatus, last_state: &mut Option<ConnectionState>) {
    if *last_state == Some(status.connection_state) {
        return;
    }
    *last_state = Some(status.connection_state);

    match status.connection_state {
        ConnectionState::Disconnected => println!(
            "[{}] reconnect attempt {}{}",
            status.connection_state,
            status.reconnect_attempt,
            error_suffix(status)
        ),
        state => println!("[{}]{}", state, error_suffix(status)),
    }
    if let Some(hint) = reconnect_hint(status.connection_state) {
        println!("  {}", hint);
    }
}

/// Hint shown once a session has no channel and nothing scheduled.
fn reconnect_hint(state: ConnectionState) -> Option<&'static str> {
    (!state.is_active()).then_some("Type 'r' + Enter to try again.")
}

fn error_suffix(status: &TrackingStatus) -> String {
    status
        .last_error
        .as_deref()
        .map(|e| format!(" - {}", e))
        .unwrap_or_default()
}

fn print_update(update: &LocationUpdate) {
    println!(
        "  {} {}  eta {:.0} min  {:.2} km  {}",
        update.server_timestamp.format("%H:%M:%S"),
        update.position,
        update.eta_minutes,
        update.distance_remaining,
        update.status
    );
}

fn print_view(view: &MapView) {
    match view {
        MapView::ConfigurationWarning => {
            println!("  map: not configured (set map.api_key or pass --map-key)")
        }
        MapView::LoadError(message) => println!("  map: failed to load - {}", message),
        MapView::Loading => println!("  map: loading"),
        MapView::Ready(frame) => match &frame.route {
            Some(route) => println!(
                "  map: ready, route {} / {}",
                route.distance_text, route.duration_text
            ),
            None => println!("  map: ready"),
        },
    }
}

/// The parts of a view worth reprinting when they change.
#[derive(Debug, PartialEq)]
struct ViewSummary {
    kind: &'static str,
    route: Option<(String, String)>,
}

impl From<&MapView> for ViewSummary {
    fn from(view: &MapView) -> Self {
        let kind = match view {
            MapView::ConfigurationWarning => "warning",
            MapView::LoadError(_) => "error",
            MapView::Loading => "loading",
            MapView::Ready(_) => "ready",
        };
        Self {
            kind,
            route: view
                .route_info()
                .map(|r| (r.distance_text.clone(), r.duration_text.clone())),
        }
    }
}
