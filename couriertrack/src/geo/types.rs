//! Geographic type definitions

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Valid latitude range
pub const MIN_LAT: f64 = -90.0;
pub const MAX_LAT: f64 = 90.0;

/// Valid longitude range
pub const MIN_LON: f64 = -180.0;
pub const MAX_LON: f64 = 180.0;

/// Errors produced when a coordinate cannot be used on a map.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum GeoError {
    /// Latitude or longitude is NaN or infinite.
    #[error("Non-finite coordinate ({latitude}, {longitude})")]
    NonFinite { latitude: f64, longitude: f64 },

    /// Latitude outside -90..=90.
    #[error("Invalid latitude: {0} (must be between -90 and 90)")]
    LatitudeOutOfRange(f64),

    /// Longitude outside -180..=180.
    #[error("Invalid longitude: {0} (must be between -180 and 180)")]
    LongitudeOutOfRange(f64),
}

/// A WGS-84 point in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub latitude: f64,
    pub longitude: f64,
}

impl Position {
    /// Create a position without validating it.
    pub const fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    /// Check that the position can be handed to a mapping provider.
    pub fn validate(&self) -> Result<(), GeoError> {
        if !self.latitude.is_finite() || !self.longitude.is_finite() {
            return Err(GeoError::NonFinite {
                latitude: self.latitude,
                longitude: self.longitude,
            });
        }
        if !(MIN_LAT..=MAX_LAT).contains(&self.latitude) {
            return Err(GeoError::LatitudeOutOfRange(self.latitude));
        }
        if !(MIN_LON..=MAX_LON).contains(&self.longitude) {
            return Err(GeoError::LongitudeOutOfRange(self.longitude));
        }
        Ok(())
    }

    #[inline]
    pub fn is_valid(&self) -> bool {
        self.validate().is_ok()
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({:.5}, {:.5})", self.latitude, self.longitude)
    }
}

/// Axis-aligned bounding box in degrees.
///
/// Does not handle boxes spanning the antimeridian; delivery areas never do.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
    pub south: f64,
    pub west: f64,
    pub north: f64,
    pub east: f64,
}

impl Bounds {
    /// Degenerate bounds covering a single point.
    pub fn from_point(position: Position) -> Self {
        Self {
            south: position.latitude,
            west: position.longitude,
            north: position.latitude,
            east: position.longitude,
        }
    }

    /// Smallest bounds covering every point, or `None` if there are none.
    pub fn from_points<I>(points: I) -> Option<Self>
    where
        I: IntoIterator<Item = Position>,
    {
        let mut iter = points.into_iter();
        let mut bounds = Self::from_point(iter.next()?);
        for point in iter {
            bounds.extend(point);
        }
        Some(bounds)
    }

    /// Grow the bounds to include `position`.
    pub fn extend(&mut self, position: Position) {
        self.south = self.south.min(position.latitude);
        self.north = self.north.max(position.latitude);
        self.west = self.west.min(position.longitude);
        self.east = self.east.max(position.longitude);
    }

    pub fn center(&self) -> Position {
        Position::new(
            (self.south + self.north) / 2.0,
            (self.west + self.east) / 2.0,
        )
    }

    pub fn contains(&self, position: Position) -> bool {
        (self.south..=self.north).contains(&position.latitude)
            && (self.west..=self.east).contains(&position.longitude)
    }
}
