//! Live map presenter.
//!
//! [`LiveMapPresenter`] renders store, customer and courier positions on a
//! [`MapSurface`] and arbitrates the camera between automatic framing and
//! the user:
//!
//! - The initial bounds fit runs at most once, on the first map-ready signal,
//!   and only if the user has not interacted yet.
//! - A drag or zoom by the user sets `user_has_interacted` for good.
//! - Every accepted courier position pans the camera to it, whether or not the
//!   user has interacted. The interaction flag only suppresses the bounds fit.
//! - Routes are computed only when `show_route` is set and both endpoints are
//!   valid. The presenter hands out a [`RouteTicket`]; the caller runs the
//!   request and reports back through [`LiveMapPresenter::complete_route`].
//!   Results for anything but the latest ticket are ignored.
//! - While no route is displayed, a straight polyline store → courier →
//!   customer stands in for it.
//!
//! Invalid coordinates are rejected before they reach the surface.

use std::time::Duration;

use tokio::time::Instant;
use tracing::{debug, error, info, warn};

use super::error::MapError;
use super::route::{RouteError, RouteRequest, RouteResponse, TravelMode};
use super::state::{
    MapFrame, MapInputs, MapView, MapViewState, ProviderStatus, RouteInfo, RouteTarget,
};
use super::surface::{Interaction, MapSurface, MarkerIcon, MarkerKind, PolylineStyle};
use crate::geo::{Bounds, Position};

/// Default window after an automatic fit in which zoom changes are
/// attributed to the fit rather than the user.
pub const DEFAULT_ZOOM_DEBOUNCE_MS: u64 = 300;

/// Presenter behaviour settings.
#[derive(Debug, Clone)]
pub struct PresenterConfig {
    pub zoom_debounce: Duration,
    pub polyline_style: PolylineStyle,
    pub travel_mode: TravelMode,
    /// Use the live courier position as the route origin when known.
    pub route_origin_follows_delivery: bool,
}

impl Default for PresenterConfig {
    fn default() -> Self {
        Self {
            zoom_debounce: Duration::from_millis(DEFAULT_ZOOM_DEBOUNCE_MS),
            polyline_style: PolylineStyle::default(),
            travel_mode: TravelMode::default(),
            route_origin_follows_delivery: false,
        }
    }
}

/// A route computation the caller should run.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RouteTicket {
    pub seq: u64,
    pub request: RouteRequest,
}

/// Presenter for one tracked delivery on one map surface.
pub struct LiveMapPresenter<M: MapSurface> {
    config: PresenterConfig,
    provider: ProviderStatus,
    surface: Option<M>,
    inputs: MapInputs,
    view: MapViewState,
    listeners_attached: bool,
    last_auto_fit: Option<Instant>,
    route_seq: u64,
    route_request: Option<RouteRequest>,
    polyline: Vec<Position>,
    torn_down: bool,
}

impl<M: MapSurface> LiveMapPresenter<M> {
    pub fn new(config: PresenterConfig, provider: ProviderStatus) -> Self {
        Self {
            config,
            provider,
            surface: None,
            inputs: MapInputs::default(),
            view: MapViewState::default(),
            listeners_attached: false,
            last_auto_fit: None,
            route_seq: 0,
            route_request: None,
            polyline: Vec::new(),
            torn_down: false,
        }
    }

    pub fn view_state(&self) -> &MapViewState {
        &self.view
    }

    pub fn inputs(&self) -> &MapInputs {
        &self.inputs
    }

    pub fn provider_status(&self) -> &ProviderStatus {
        &self.provider
    }

    pub fn route_info(&self) -> Option<&RouteInfo> {
        self.view.current_route.as_ref()
    }

    /// True once a surface is attached and the provider is usable.
    pub fn is_ready(&self) -> bool {
        !self.torn_down && self.provider == ProviderStatus::Loaded && self.surface.is_some()
    }

    /// Update the provider load state. A load failure or missing credential
    /// is terminal for this instance.
    pub fn set_provider_status(&mut self, status: ProviderStatus) {
        if self.torn_down || matches!(self.provider, ProviderStatus::LoadFailed(_)) {
            return;
        }
        match status {
            ProviderStatus::LoadFailed(message) => {
                error!(error = %message, "Map provider failed to load");
                self.provider = ProviderStatus::LoadFailed(message);
                self.release_surface();
            }
            ProviderStatus::MissingCredential => {
                warn!("Map provider credential missing");
                self.provider = ProviderStatus::MissingCredential;
                self.release_surface();
            }
            ProviderStatus::Loading | ProviderStatus::Loaded => {
                if self.provider != ProviderStatus::MissingCredential {
                    self.provider = status;
                }
            }
        }
    }

    /// Handle the map-ready signal. Only the first surface is used.
    pub fn on_map_ready(&mut self, mut surface: M, now: Instant) -> Option<RouteTicket> {
        if self.torn_down {
            return None;
        }
        match self.provider {
            ProviderStatus::MissingCredential | ProviderStatus::LoadFailed(_) => {
                warn!("Ignoring map-ready signal while the provider is unavailable");
                surface.release_route_renderer();
                return None;
            }
            ProviderStatus::Loading => self.provider = ProviderStatus::Loaded,
            ProviderStatus::Loaded => {}
        }
        if self.surface.is_some() {
            debug!("Map already ready; ignoring repeated signal");
            return None;
        }

        match surface.attach_interaction_listeners() {
            Ok(()) => self.listeners_attached = true,
            Err(e) => warn!(error = %e, "Failed to attach map interaction listeners"),
        }
        self.surface = Some(surface);

        if !self.view.has_fitted_initial_bounds && !self.view.user_has_interacted {
            self.fit_initial_bounds(now);
        }
        self.redraw_markers();
        self.redraw_polyline();
        self.refresh_route()
    }

    /// Handle a user interaction reported by the surface.
    pub fn on_interaction(&mut self, interaction: Interaction, now: Instant) {
        if self.torn_down || self.view.user_has_interacted {
            return;
        }
        if interaction == Interaction::ZoomChanged {
            if let Some(fitted_at) = self.last_auto_fit {
                if now.saturating_duration_since(fitted_at) < self.config.zoom_debounce {
                    debug!("Zoom change attributed to automatic fit");
                    return;
                }
            }
        }
        info!(?interaction, "User took control of the map camera");
        self.view.user_has_interacted = true;
    }

    /// Accept a new courier position: move the marker and pan to it.
    pub fn on_location_update(&mut self, position: Position) -> Option<RouteTicket> {
        if self.torn_down {
            return None;
        }
        if let Err(e) = position.validate() {
            warn!(error = %e, "Rejected courier position");
            return None;
        }

        self.inputs.delivery = Some(position);
        if self.is_ready() {
            self.place_delivery_marker();
            self.pan_to(position);
            self.redraw_polyline();
        }

        if self.config.route_origin_follows_delivery {
            self.refresh_route()
        } else {
            None
        }
    }

    /// Replace all inputs. An invalid position is skipped with a warning and
    /// the previously accepted value is kept.
    pub fn set_inputs(&mut self, inputs: MapInputs) -> Option<RouteTicket> {
        if self.torn_down {
            return None;
        }
        let inputs = MapInputs {
            store: accept("store", inputs.store, self.inputs.store),
            customer: accept("customer", inputs.customer, self.inputs.customer),
            delivery: accept("delivery", inputs.delivery, self.inputs.delivery),
            tracking_active: inputs.tracking_active,
            route: inputs.route,
        };
        if inputs == self.inputs {
            return None;
        }

        let delivery_moved = inputs.delivery.is_some() && inputs.delivery != self.inputs.delivery;
        self.inputs = inputs;

        if self.is_ready() {
            self.redraw_markers();
            if delivery_moved {
                if let Some(position) = self.inputs.delivery {
                    self.pan_to(position);
                }
            }
            self.redraw_polyline();
        }
        self.refresh_route()
    }

    /// Replace the route target.
    pub fn set_route_target(&mut self, target: RouteTarget) -> Option<RouteTicket> {
        if self.torn_down {
            return None;
        }
        self.inputs.route = target;
        self.refresh_route()
    }

    /// Apply the result of a route computation.
    pub fn complete_route(&mut self, seq: u64, result: Result<RouteResponse, RouteError>) {
        if self.torn_down || seq != self.route_seq || self.route_request.is_none() {
            debug!(seq, latest = self.route_seq, "Discarding stale route result");
            return;
        }

        let summary = match &result {
            Ok(response) => response.summary(),
            Err(_) => None,
        };
        match (result, summary) {
            (Ok(response), Some(info)) => {
                info!(distance = %info.distance_text, duration = %info.duration_text, "Route computed");
                if let Some(surface) = self.surface.as_mut() {
                    log_surface("render_route", surface.render_route(&response));
                }
                self.view.current_route = Some(info);
            }
            (Ok(response), None) => {
                warn!(status = %response.status, "Routing provider returned no route");
                self.clear_route();
            }
            (Err(e), _) => {
                warn!(error = %e, "Route computation failed");
                self.clear_route();
            }
        }
        self.redraw_polyline();
    }

    /// Describe what should currently be displayed.
    pub fn render(&self) -> MapView {
        match &self.provider {
            ProviderStatus::MissingCredential => MapView::ConfigurationWarning,
            ProviderStatus::LoadFailed(message) => MapView::LoadError(message.clone()),
            ProviderStatus::Loading => MapView::Loading,
            ProviderStatus::Loaded if !self.is_ready() => MapView::Loading,
            ProviderStatus::Loaded => MapView::Ready(MapFrame {
                store: self.inputs.store,
                customer: self.inputs.customer,
                delivery: self.inputs.delivery,
                polyline: self.polyline.clone(),
                route: self.view.current_route.clone(),
                view: self.view.clone(),
            }),
        }
    }

    /// Release the route renderer and detach interaction listeners.
    ///
    /// Further inputs are ignored. Also runs on drop.
    pub fn teardown(&mut self) {
        if self.torn_down {
            return;
        }
        self.torn_down = true;
        self.route_seq += 1;
        self.release_surface();
        debug!("Map presenter torn down");
    }

    fn release_surface(&mut self) {
        if let Some(mut surface) = self.surface.take() {
            surface.release_route_renderer();
            if self.listeners_attached {
                surface.detach_interaction_listeners();
            }
        }
        self.listeners_attached = false;
        self.polyline.clear();
    }

    fn fit_initial_bounds(&mut self, now: Instant) {
        let points = [self.inputs.store, self.inputs.customer, self.inputs.delivery];
        self.view.has_fitted_initial_bounds = true;

        let Some(bounds) = Bounds::from_points(points.into_iter().flatten()) else {
            debug!("No positions to frame on map ready");
            return;
        };
        if let Some(surface) = self.surface.as_mut() {
            log_surface("fit_bounds", surface.fit_bounds(bounds));
            self.last_auto_fit = Some(now);
        }
    }

    fn pan_to(&mut self, position: Position) {
        if let Some(surface) = self.surface.as_mut() {
            log_surface("pan_to", surface.pan_to(position));
        }
    }

    fn redraw_markers(&mut self) {
        let store = self.inputs.store;
        let customer = self.inputs.customer;
        if let Some(surface) = self.surface.as_mut() {
            for (kind, position, icon) in [
                (MarkerKind::Store, store, MarkerIcon::Store),
                (MarkerKind::Customer, customer, MarkerIcon::Customer),
            ] {
                let result = match position {
                    Some(position) => surface.set_marker(kind, position, icon),
                    None => surface.remove_marker(kind),
                };
                log_surface("marker", result);
            }
        }
        self.place_delivery_marker();
    }

    fn place_delivery_marker(&mut self) {
        let icon = if self.inputs.tracking_active {
            MarkerIcon::DeliveryActive
        } else {
            MarkerIcon::DeliveryIdle
        };
        let delivery = self.inputs.delivery;
        if let Some(surface) = self.surface.as_mut() {
            let result = match delivery {
                Some(position) => surface.set_marker(MarkerKind::Delivery, position, icon),
                None => surface.remove_marker(MarkerKind::Delivery),
            };
            log_surface("marker", result);
        }
    }

    fn redraw_polyline(&mut self) {
        let path: Vec<Position> = if self.view.current_route.is_some() {
            Vec::new()
        } else {
            [self.inputs.store, self.inputs.delivery, self.inputs.customer]
                .into_iter()
                .flatten()
                .collect()
        };
        let path = if path.len() >= 2 { path } else { Vec::new() };

        if let Some(surface) = self.surface.as_mut() {
            let result = if path.is_empty() {
                surface.clear_polyline()
            } else {
                surface.draw_polyline(&path, &self.config.polyline_style)
            };
            log_surface("polyline", result);
        }
        self.polyline = path;
    }

    fn clear_route(&mut self) {
        if let Some(surface) = self.surface.as_mut() {
            log_surface("clear_route", surface.clear_route());
        }
        self.view.current_route = None;
    }

    fn desired_route(&self) -> Option<RouteRequest> {
        let target = &self.inputs.route;
        if !target.show_route {
            return None;
        }
        let origin = if self.config.route_origin_follows_delivery {
            self.inputs.delivery.or(target.origin)
        } else {
            target.origin
        };
        let origin = origin.filter(Position::is_valid)?;
        let destination = target.destination.filter(Position::is_valid)?;
        Some(RouteRequest {
            origin,
            destination,
            mode: self.config.travel_mode,
        })
    }

    fn refresh_route(&mut self) -> Option<RouteTicket> {
        if !self.is_ready() {
            return None;
        }
        let desired = self.desired_route();
        if desired == self.route_request {
            return None;
        }

        self.route_seq += 1;
        self.route_request = desired;
        match desired {
            Some(request) => {
                debug!(seq = self.route_seq, origin = %request.origin, destination = %request.destination, "Requesting route");
                Some(RouteTicket {
                    seq: self.route_seq,
                    request,
                })
            }
            None => {
                if self.view.current_route.is_some() {
                    self.clear_route();
                    self.redraw_polyline();
                }
                None
            }
        }
    }
}

impl<M: MapSurface> Drop for LiveMapPresenter<M> {
    fn drop(&mut self) {
        self.teardown();
    }
}

fn accept(label: &str, position: Option<Position>, previous: Option<Position>) -> Option<Position> {
    let position = position?;
    match position.validate() {
        Ok(()) => Some(position),
        Err(e) => {
            warn!(input = label, error = %e, "Rejected map input");
            previous
        }
    }
}

fn log_surface(operation: &str, result: Result<(), MapError>) {
    if let Err(e) = result {
        warn!(operation, error = %e, "Map surface operation failed");
    }
}
