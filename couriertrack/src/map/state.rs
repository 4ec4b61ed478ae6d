//! Presenter-owned state and the rendered view description.

use crate::geo::Position;

/// Camera and interaction state for one presenter instance.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MapViewState {
    /// Set once the initial bounds fit has run. Never cleared.
    pub has_fitted_initial_bounds: bool,
    /// Set on the first user pan or zoom. Never cleared.
    pub user_has_interacted: bool,
    /// Summary of the currently displayed route, if any.
    pub current_route: Option<RouteInfo>,
}

/// Human-readable route summary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteInfo {
    pub distance_text: String,
    pub duration_text: String,
}

/// Load state of the mapping provider.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ProviderStatus {
    #[default]
    Loading,
    Loaded,
    LoadFailed(String),
    /// No API credential configured; loading is never attempted.
    MissingCredential,
}

impl ProviderStatus {
    /// Initial status for an optional provider credential.
    pub fn from_credential(credential: Option<&str>) -> Self {
        match credential {
            Some(key) if !key.trim().is_empty() => Self::Loading,
            _ => Self::MissingCredential,
        }
    }
}

/// Route request inputs.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RouteTarget {
    pub origin: Option<Position>,
    pub destination: Option<Position>,
    pub show_route: bool,
}

/// Everything the presenter renders from.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MapInputs {
    pub store: Option<Position>,
    pub customer: Option<Position>,
    pub delivery: Option<Position>,
    /// Whether the delivery is actively being tracked; selects the marker icon.
    pub tracking_active: bool,
    pub route: RouteTarget,
}

/// What the presentation layer should display.
#[derive(Debug, Clone, PartialEq)]
pub enum MapView {
    /// No provider credential; show a configuration warning.
    ConfigurationWarning,
    /// The provider failed to load; show an error.
    LoadError(String),
    /// Waiting for the provider or the map-ready signal.
    Loading,
    Ready(MapFrame),
}

impl MapView {
    pub fn is_ready(&self) -> bool {
        matches!(self, Self::Ready(_))
    }

    pub fn route_info(&self) -> Option<&RouteInfo> {
        match self {
            Self::Ready(frame) => frame.route.as_ref(),
            _ => None,
        }
    }
}

/// Snapshot of a ready map.
#[derive(Debug, Clone, PartialEq)]
pub struct MapFrame {
    pub store: Option<Position>,
    pub customer: Option<Position>,
    pub delivery: Option<Position>,
    /// Straight-line fallback path, empty while a route is shown.
    pub polyline: Vec<Position>,
    pub route: Option<RouteInfo>,
    pub view: MapViewState,
}
