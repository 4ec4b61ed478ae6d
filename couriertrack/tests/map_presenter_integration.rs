//! Integration tests for the Live Map Presenter task.
//!
//! Drives `spawn_presenter` with a hand-fed tracking event stream and a
//! recording map surface:
//! - Map ready → one-shot bounds fit
//! - Location updates → marker moves and camera follows
//! - Route requests → route info replaces the straight-line polyline
//! - Degraded provider states and teardown
//!
//! Run with: `cargo test --test map_presenter_integration`

use std::sync::{Arc, Mutex};
use std::time::Duration;

use chrono::Utc;
use tokio::sync::broadcast;

use couriertrack::geo::{Bounds, Position};
use couriertrack::map::{
    spawn_presenter, Interaction, LiveMapPresenter, MapError, MapInputs, MapSurface, MapView,
    MarkerIcon, MarkerKind, PolylineStyle, PresenterCommand, PresenterConfig, PresenterHandle,
    ProviderStatus, RouteResponse, RouteTarget, StraightLineRouteService,
};
use couriertrack::tracking::{LocationUpdate, TrackingEvent};

// ============================================================================
// Test Helpers
// ============================================================================

const STORE: Position = Position::new(21.1458, 79.0882);
const CUSTOMER: Position = Position::new(21.1219, 79.0510);

const WAIT: Duration = Duration::from_secs(5);

#[derive(Debug, Clone, PartialEq)]
enum Call {
    FitBounds(Bounds),
    PanTo(Position),
    SetMarker(MarkerKind, Position, MarkerIcon),
    RemoveMarker(MarkerKind),
    DrawPolyline(usize),
    ClearPolyline,
    RenderRoute,
    ClearRoute,
    ReleaseRenderer,
    Attach,
    Detach,
}

/// Surface that appends every call to a shared log.
#[derive(Clone, Default)]
struct RecordingSurface {
    calls: Arc<Mutex<Vec<Call>>>,
}

impl RecordingSurface {
    fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    fn count(&self, predicate: impl Fn(&Call) -> bool) -> usize {
        self.calls().iter().filter(|c| predicate(c)).count()
    }

    fn record(&self, call: Call) {
        self.calls.lock().unwrap().push(call);
    }
}

impl MapSurface for RecordingSurface {
    fn fit_bounds(&mut self, bounds: Bounds) -> Result<(), MapError> {
        self.record(Call::FitBounds(bounds));
        Ok(())
    }

    fn pan_to(&mut self, position: Position) -> Result<(), MapError> {
        self.record(Call::PanTo(position));
        Ok(())
    }

    fn set_marker(
        &mut self,
        kind: MarkerKind,
        position: Position,
        icon: MarkerIcon,
    ) -> Result<(), MapError> {
        self.record(Call::SetMarker(kind, position, icon));
        Ok(())
    }

    fn remove_marker(&mut self, kind: MarkerKind) -> Result<(), MapError> {
        self.record(Call::RemoveMarker(kind));
        Ok(())
    }

    fn draw_polyline(&mut self, path: &[Position], _style: &PolylineStyle) -> Result<(), MapError> {
        self.record(Call::DrawPolyline(path.len()));
        Ok(())
    }

    fn clear_polyline(&mut self) -> Result<(), MapError> {
        self.record(Call::ClearPolyline);
        Ok(())
    }

    fn render_route(&mut self, _route: &RouteResponse) -> Result<(), MapError> {
        self.record(Call::RenderRoute);
        Ok(())
    }

    fn clear_route(&mut self) -> Result<(), MapError> {
        self.record(Call::ClearRoute);
        Ok(())
    }

    fn release_route_renderer(&mut self) {
        self.record(Call::ReleaseRenderer);
    }

    fn attach_interaction_listeners(&mut self) -> Result<(), MapError> {
        self.record(Call::Attach);
        Ok(())
    }

    fn detach_interaction_listeners(&mut self) {
        self.record(Call::Detach);
    }
}

struct Harness {
    handle: PresenterHandle<RecordingSurface>,
    surface: RecordingSurface,
    events: broadcast::Sender<TrackingEvent>,
}

impl Harness {
    fn spawn(provider: ProviderStatus, config: PresenterConfig) -> Self {
        let (events, events_rx) = broadcast::channel(64);
        let presenter = LiveMapPresenter::new(config, provider);
        let routes = Arc::new(StraightLineRouteService::new(25.0));
        let handle = spawn_presenter(presenter, routes, events_rx);
        Self {
            handle,
            surface: RecordingSurface::default(),
            events,
        }
    }

    fn with_key() -> Self {
        Self::spawn(ProviderStatus::Loading, PresenterConfig::default())
    }

    fn send(&self, command: PresenterCommand<RecordingSurface>) {
        self.handle.send(command).unwrap();
    }

    fn map_ready(&self) {
        self.send(PresenterCommand::MapReady(self.surface.clone()));
    }

    fn emit(&self, event: TrackingEvent) {
        self.events.send(event).unwrap();
    }

    async fn wait_for_view(&self, predicate: impl FnMut(&MapView) -> bool) -> MapView {
        let mut rx = self.handle.watch_view();
        let view = tokio::time::timeout(WAIT, rx.wait_for(predicate))
            .await
            .expect("timed out waiting for view")
            .expect("presenter stopped")
            .clone();
        view
    }

    async fn wait_for_calls(&self, predicate: impl Fn(&[Call]) -> bool) {
        tokio::time::timeout(WAIT, async {
            while !predicate(&self.surface.calls()) {
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
        })
        .await
        .expect("timed out waiting for surface calls");
    }
}

fn inputs(show_route: bool) -> MapInputs {
    MapInputs {
        store: Some(STORE),
        customer: Some(CUSTOMER),
        delivery: None,
        tracking_active: false,
        route: RouteTarget {
            origin: Some(STORE),
            destination: Some(CUSTOMER),
            show_route,
        },
    }
}

fn location(latitude: f64, longitude: f64) -> TrackingEvent {
    TrackingEvent::LocationUpdate(LocationUpdate {
        order_id: "ORD-1".to_string(),
        position: Position::new(latitude, longitude),
        eta_minutes: 5.0,
        distance_remaining: 1.5,
        status: "out_for_delivery".to_string(),
        server_timestamp: Utc::now(),
    })
}

// ============================================================================
// Tests
// ============================================================================

#[tokio::test]
async fn test_map_ready_fits_bounds_once() {
    let h = Harness::with_key();
    h.send(PresenterCommand::SetInputs(inputs(false)));
    assert_eq!(h.handle.view(), MapView::Loading);

    h.map_ready();
    let view = h.wait_for_view(MapView::is_ready).await;

    let MapView::Ready(frame) = view else {
        unreachable!()
    };
    assert!(frame.view.has_fitted_initial_bounds);
    assert_eq!(frame.polyline, vec![STORE, CUSTOMER]);

    let expected = Bounds::from_points([STORE, CUSTOMER]).unwrap();
    assert_eq!(h.surface.count(|c| *c == Call::FitBounds(expected)), 1);
    assert_eq!(h.surface.count(|c| *c == Call::Attach), 1);

    // A later input change never refits.
    let mut moved = inputs(false);
    moved.customer = Some(Position::new(21.10, 79.02));
    h.send(PresenterCommand::SetInputs(moved));
    h.wait_for_view(|v| matches!(v, MapView::Ready(f) if f.customer == Some(Position::new(21.10, 79.02))))
        .await;
    assert_eq!(h.surface.count(|c| matches!(c, Call::FitBounds(_))), 1);

    h.handle.shutdown().await;
}

#[tokio::test]
async fn test_location_updates_move_marker_and_follow() {
    let h = Harness::with_key();
    h.send(PresenterCommand::SetInputs(inputs(false)));
    h.map_ready();
    h.wait_for_view(MapView::is_ready).await;

    h.emit(TrackingEvent::Connected);
    h.emit(location(21.14, 79.08));
    h.emit(location(21.13, 79.07));

    let last = Position::new(21.13, 79.07);
    h.wait_for_calls(|calls| calls.contains(&Call::PanTo(last))).await;

    let pans = h.surface.count(|c| matches!(c, Call::PanTo(_)));
    assert_eq!(pans, 2);
    assert!(h.surface.calls().contains(&Call::SetMarker(
        MarkerKind::Delivery,
        last,
        MarkerIcon::DeliveryActive
    )));

    let view = h.wait_for_view(|v| matches!(v, MapView::Ready(f) if f.delivery == Some(last))).await;
    let MapView::Ready(frame) = view else {
        unreachable!()
    };
    assert_eq!(frame.polyline, vec![STORE, last, CUSTOMER]);

    h.handle.shutdown().await;
}

#[tokio::test]
async fn test_lost_connection_switches_marker_to_idle() {
    let h = Harness::with_key();
    h.send(PresenterCommand::SetInputs(inputs(false)));
    h.map_ready();
    h.wait_for_view(MapView::is_ready).await;

    let position = Position::new(21.14, 79.08);
    h.emit(TrackingEvent::Connected);
    h.emit(location(position.latitude, position.longitude));
    h.wait_for_calls(|calls| {
        calls.contains(&Call::SetMarker(MarkerKind::Delivery, position, MarkerIcon::DeliveryActive))
    })
    .await;

    h.emit(TrackingEvent::Disconnected {
        reason: "Unauthorized".to_string(),
    });
    h.wait_for_calls(|calls| {
        calls.contains(&Call::SetMarker(MarkerKind::Delivery, position, MarkerIcon::DeliveryIdle))
    })
    .await;

    h.handle.shutdown().await;
}

#[tokio::test]
async fn test_interaction_is_recorded_and_follow_continues() {
    let h = Harness::with_key();
    h.send(PresenterCommand::SetInputs(inputs(false)));
    h.map_ready();
    h.wait_for_view(MapView::is_ready).await;

    h.send(PresenterCommand::Interaction(Interaction::DragStart));
    h.wait_for_view(|v| matches!(v, MapView::Ready(f) if f.view.user_has_interacted))
        .await;

    let position = Position::new(21.14, 79.08);
    h.emit(location(position.latitude, position.longitude));
    h.wait_for_calls(|calls| calls.contains(&Call::PanTo(position))).await;

    h.handle.shutdown().await;
}

#[tokio::test]
async fn test_route_replaces_polyline() {
    let h = Harness::with_key();
    h.send(PresenterCommand::SetInputs(inputs(true)));
    h.map_ready();

    let view = h.wait_for_view(|v| v.route_info().is_some()).await;
    let info = view.route_info().unwrap();
    assert!(info.distance_text.ends_with("km"));
    assert!(info.duration_text.contains("min"));

    let MapView::Ready(frame) = view else {
        unreachable!()
    };
    assert!(frame.polyline.is_empty());
    assert!(h.surface.calls().contains(&Call::RenderRoute));

    // Hiding the route brings the straight line back.
    h.send(PresenterCommand::SetRouteTarget(RouteTarget {
        show_route: false,
        ..inputs(true).route
    }));
    let view = h.wait_for_view(|v| v.is_ready() && v.route_info().is_none()).await;
    let MapView::Ready(frame) = view else {
        unreachable!()
    };
    assert_eq!(frame.polyline, vec![STORE, CUSTOMER]);

    h.handle.shutdown().await;
}

#[tokio::test]
async fn test_missing_credential_shows_configuration_warning() {
    let h = Harness::spawn(ProviderStatus::MissingCredential, PresenterConfig::default());
    h.send(PresenterCommand::SetInputs(inputs(true)));
    h.map_ready();
    h.emit(location(21.14, 79.08));

    h.wait_for_calls(|calls| calls.contains(&Call::ReleaseRenderer)).await;
    assert_eq!(h.handle.view(), MapView::ConfigurationWarning);
    assert_eq!(h.surface.count(|c| matches!(c, Call::FitBounds(_) | Call::PanTo(_))), 0);

    h.handle.shutdown().await;
}

#[tokio::test]
async fn test_load_failure_is_reported() {
    let h = Harness::with_key();
    h.send(PresenterCommand::ProviderStatus(ProviderStatus::LoadFailed(
        "script blocked".to_string(),
    )));

    let view = h.wait_for_view(|v| matches!(v, MapView::LoadError(_))).await;
    assert_eq!(view, MapView::LoadError("script blocked".to_string()));

    h.handle.shutdown().await;
}

#[tokio::test]
async fn test_shutdown_releases_surface() {
    let h = Harness::with_key();
    h.send(PresenterCommand::SetInputs(inputs(false)));
    h.map_ready();
    h.wait_for_view(MapView::is_ready).await;

    let surface = h.surface.clone();
    h.handle.shutdown().await;

    let calls = surface.calls();
    assert!(calls.contains(&Call::ReleaseRenderer));
    assert!(calls.contains(&Call::Detach));
}
