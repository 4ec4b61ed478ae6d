//! Map surface abstraction.
//!
//! A [`MapSurface`] is the camera handle and renderer the mapping provider
//! yields once the map is ready. The presenter drives it and owns it
//! exclusively; the provider's internals stay behind this trait.

use std::collections::HashMap;

use tracing::{debug, info};

use super::error::MapError;
use super::route::RouteResponse;
use crate::geo::{Bounds, Position};

/// Marker slots on the map.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MarkerKind {
    Store,
    Customer,
    Delivery,
}

/// Marker icons.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MarkerIcon {
    Store,
    Customer,
    /// Courier while tracking is live.
    DeliveryActive,
    /// Courier position with tracking paused or finished.
    DeliveryIdle,
}

/// Stroke style for the fallback polyline.
#[derive(Debug, Clone, PartialEq)]
pub struct PolylineStyle {
    /// CSS-style colour, e.g. `#2563eb`.
    pub color: String,
    pub weight: f32,
    pub opacity: f32,
    pub geodesic: bool,
}

impl Default for PolylineStyle {
    fn default() -> Self {
        Self {
            color: "#2563eb".to_string(),
            weight: 4.0,
            opacity: 0.8,
            geodesic: true,
        }
    }
}

/// User-initiated camera interactions reported by the surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Interaction {
    DragStart,
    ZoomChanged,
}

/// Camera handle and renderer for one map instance.
pub trait MapSurface: Send {
    /// Frame `bounds` in the viewport.
    fn fit_bounds(&mut self, bounds: Bounds) -> Result<(), MapError>;

    /// Smoothly recenter on `position` without changing zoom.
    fn pan_to(&mut self, position: Position) -> Result<(), MapError>;

    fn set_marker(
        &mut self,
        kind: MarkerKind,
        position: Position,
        icon: MarkerIcon,
    ) -> Result<(), MapError>;

    fn remove_marker(&mut self, kind: MarkerKind) -> Result<(), MapError>;

    fn draw_polyline(&mut self, path: &[Position], style: &PolylineStyle) -> Result<(), MapError>;

    fn clear_polyline(&mut self) -> Result<(), MapError>;

    /// Draw a computed route. Must not move the camera.
    fn render_route(&mut self, route: &RouteResponse) -> Result<(), MapError>;

    fn clear_route(&mut self) -> Result<(), MapError>;

    /// Release the provider's route renderer handle.
    fn release_route_renderer(&mut self);

    /// Start reporting drag-start and zoom-changed interactions.
    fn attach_interaction_listeners(&mut self) -> Result<(), MapError>;

    fn detach_interaction_listeners(&mut self);
}

/// Headless surface that keeps camera and overlay state in memory and
/// reports every operation through `tracing`.
#[derive(Debug, Default)]
pub struct TracingMapSurface {
    center: Option<Position>,
    bounds: Option<Bounds>,
    markers: HashMap<MarkerKind, (Position, MarkerIcon)>,
    polyline: Vec<Position>,
    route_path: Vec<Position>,
    listeners_attached: bool,
    renderer_released: bool,
}

impl TracingMapSurface {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn center(&self) -> Option<Position> {
        self.center
    }

    pub fn bounds(&self) -> Option<Bounds> {
        self.bounds
    }

    pub fn marker(&self, kind: MarkerKind) -> Option<(Position, MarkerIcon)> {
        self.markers.get(&kind).copied()
    }

    pub fn polyline(&self) -> &[Position] {
        &self.polyline
    }

    pub fn route_path(&self) -> &[Position] {
        &self.route_path
    }

    pub fn listeners_attached(&self) -> bool {
        self.listeners_attached
    }

    pub fn renderer_released(&self) -> bool {
        self.renderer_released
    }
}

impl MapSurface for TracingMapSurface {
    fn fit_bounds(&mut self, bounds: Bounds) -> Result<(), MapError> {
        info!(
            south = bounds.south,
            west = bounds.west,
            north = bounds.north,
            east = bounds.east,
            "Map fit to bounds"
        );
        self.center = Some(bounds.center());
        self.bounds = Some(bounds);
        Ok(())
    }

    fn pan_to(&mut self, position: Position) -> Result<(), MapError> {
        debug!(
            lat = format!("{:.5}", position.latitude),
            lon = format!("{:.5}", position.longitude),
            "Map panned"
        );
        self.center = Some(position);
        Ok(())
    }

    fn set_marker(
        &mut self,
        kind: MarkerKind,
        position: Position,
        icon: MarkerIcon,
    ) -> Result<(), MapError> {
        debug!(?kind, ?icon, %position, "Marker placed");
        self.markers.insert(kind, (position, icon));
        Ok(())
    }

    fn remove_marker(&mut self, kind: MarkerKind) -> Result<(), MapError> {
        self.markers.remove(&kind);
        Ok(())
    }

    fn draw_polyline(&mut self, path: &[Position], style: &PolylineStyle) -> Result<(), MapError> {
        debug!(points = path.len(), color = %style.color, "Polyline drawn");
        self.polyline = path.to_vec();
        Ok(())
    }

    fn clear_polyline(&mut self) -> Result<(), MapError> {
        self.polyline.clear();
        Ok(())
    }

    fn render_route(&mut self, route: &RouteResponse) -> Result<(), MapError> {
        if self.renderer_released {
            return Err(MapError::Released);
        }
        debug!(points = route.path.len(), legs = route.legs.len(), "Route rendered");
        self.route_path = route.path.clone();
        Ok(())
    }

    fn clear_route(&mut self) -> Result<(), MapError> {
        self.route_path.clear();
        Ok(())
    }

    fn release_route_renderer(&mut self) {
        self.route_path.clear();
        self.renderer_released = true;
    }

    fn attach_interaction_listeners(&mut self) -> Result<(), MapError> {
        self.listeners_attached = true;
        Ok(())
    }

    fn detach_interaction_listeners(&mut self) {
        self.listeners_attached = false;
    }
}
