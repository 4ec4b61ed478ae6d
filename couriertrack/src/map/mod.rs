//! Live Map Presenter.
//!
//! Renders store, customer and courier positions on a map surface, computes
//! routes on request and arbitrates the camera between automatic framing and
//! the user.
//!
//! - [`state`] - `MapViewState`, `MapInputs`, `MapView` and provider status
//! - [`surface`] - `MapSurface` trait and the headless `TracingMapSurface`
//! - [`route`] - `RouteService` trait and the straight-line estimator
//! - [`osrm`] - `OsrmRouteService` over HTTP
//! - [`presenter`] - `LiveMapPresenter`
//! - [`driver`] - `spawn_presenter` task wiring it to the tracking stream

mod driver;
mod error;
pub mod osrm;
mod presenter;
pub mod route;
mod state;
pub mod surface;

pub use driver::{spawn_presenter, PresenterCommand, PresenterHandle};
pub use error::MapError;
pub use osrm::{OsrmRouteService, DEFAULT_OSRM_URL};
pub use presenter::{LiveMapPresenter, PresenterConfig, RouteTicket, DEFAULT_ZOOM_DEBOUNCE_MS};
pub use route::{
    format_distance, format_duration, RouteError, RouteLeg, RouteRequest, RouteResponse,
    RouteService, RouteStatus, StraightLineRouteService, TravelMode, DEFAULT_COURIER_SPEED_KMH,
};
pub use state::{MapFrame, MapInputs, MapView, MapViewState, ProviderStatus, RouteInfo, RouteTarget};
pub use surface::{
    Interaction, MapSurface, MarkerIcon, MarkerKind, PolylineStyle, TracingMapSurface,
};
