//! Geographic primitives shared by the tracking channel and the map presenter.
//!
//! Positions arrive from the network and are fed straight into a mapping
//! provider, so everything here is about rejecting unusable coordinates early
//! and doing the small amount of spherical math the rest of the crate needs.

mod types;

pub use types::{Bounds, GeoError, Position, MAX_LAT, MAX_LON, MIN_LAT, MIN_LON};

use std::f64::consts::PI;

/// Mean Earth radius in kilometres.
const EARTH_RADIUS_KM: f64 = 6371.0088;

/// Degrees to radians conversion factor.
const DEG_TO_RAD: f64 = PI / 180.0;

/// Great-circle distance between two positions in kilometres.
///
/// # Example
///
/// ```
/// use couriertrack::geo::{distance_km, Position};
///
/// // One degree of latitude is roughly 111 km
/// let d = distance_km(Position::new(0.0, 0.0), Position::new(1.0, 0.0));
/// assert!((d - 111.2).abs() < 0.5);
/// ```
pub fn distance_km(from: Position, to: Position) -> f64 {
    let lat1_rad = from.latitude * DEG_TO_RAD;
    let lat2_rad = to.latitude * DEG_TO_RAD;
    let delta_lat = (to.latitude - from.latitude) * DEG_TO_RAD;
    let delta_lon = (to.longitude - from.longitude) * DEG_TO_RAD;

    // Haversine formula
    let a = (delta_lat / 2.0).sin().powi(2)
        + lat1_rad.cos() * lat2_rad.cos() * (delta_lon / 2.0).sin().powi(2);
    let c = 2.0 * a.sqrt().asin();

    EARTH_RADIUS_KM * c
}

/// Point at `fraction` (clamped to 0..=1) of the way from `from` to `to`.
///
/// Linear in degrees, which is indistinguishable from the geodesic at
/// city-delivery distances.
pub fn interpolate(from: Position, to: Position, fraction: f64) -> Position {
    let t = fraction.clamp(0.0, 1.0);
    Position::new(
        from.latitude + (to.latitude - from.latitude) * t,
        from.longitude + (to.longitude - from.longitude) * t,
    )
}
