//! Routing service abstraction.
//!
//! A [`RouteService`] answers `(origin, destination, mode)` with a
//! [`RouteResponse`] carrying a provider status and per-leg distance/duration
//! text. Provider-level failures (no route, denied, ...) come back as a
//! response with a non-OK [`RouteStatus`]; transport failures as
//! [`RouteError`]. The presenter treats both the same way.

use std::fmt;
use std::future::Future;
use std::str::FromStr;

use thiserror::Error;

use super::state::RouteInfo;
use crate::geo::{distance_km, Position};

/// Default courier speed for the straight-line estimate.
pub const DEFAULT_COURIER_SPEED_KMH: f64 = 25.0;

/// Travel mode for route requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TravelMode {
    #[default]
    Driving,
    Walking,
    Bicycling,
}

impl TravelMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Driving => "driving",
            Self::Walking => "walking",
            Self::Bicycling => "bicycling",
        }
    }
}

impl fmt::Display for TravelMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TravelMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "driving" | "car" => Ok(Self::Driving),
            "walking" | "foot" => Ok(Self::Walking),
            "bicycling" | "bike" | "cycling" => Ok(Self::Bicycling),
            other => Err(format!(
                "unknown travel mode '{}' (expected driving, walking or bicycling)",
                other
            )),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RouteRequest {
    pub origin: Position,
    pub destination: Position,
    pub mode: TravelMode,
}

/// Provider status of a route response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteStatus {
    Ok,
    NotFound,
    ZeroResults,
    OverQueryLimit,
    RequestDenied,
    InvalidRequest,
    UnknownError,
}

impl RouteStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Ok => "OK",
            Self::NotFound => "NOT_FOUND",
            Self::ZeroResults => "ZERO_RESULTS",
            Self::OverQueryLimit => "OVER_QUERY_LIMIT",
            Self::RequestDenied => "REQUEST_DENIED",
            Self::InvalidRequest => "INVALID_REQUEST",
            Self::UnknownError => "UNKNOWN_ERROR",
        }
    }
}

impl fmt::Display for RouteStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One leg of a computed route.
#[derive(Debug, Clone, PartialEq)]
pub struct RouteLeg {
    pub distance_meters: f64,
    pub duration_secs: f64,
    pub distance_text: String,
    pub duration_text: String,
}

impl RouteLeg {
    /// Leg with text formatted from the raw values.
    pub fn new(distance_meters: f64, duration_secs: f64) -> Self {
        Self {
            distance_meters,
            duration_secs,
            distance_text: format_distance(distance_meters),
            duration_text: format_duration(duration_secs),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RouteResponse {
    pub status: RouteStatus,
    pub legs: Vec<RouteLeg>,
    /// Route geometry for the renderer.
    pub path: Vec<Position>,
}

impl RouteResponse {
    /// Response with a non-OK status and no legs.
    pub fn failed(status: RouteStatus) -> Self {
        Self {
            status,
            legs: Vec::new(),
            path: Vec::new(),
        }
    }

    /// Summary of the first leg, only for OK responses.
    pub fn summary(&self) -> Option<RouteInfo> {
        if self.status != RouteStatus::Ok {
            return None;
        }
        self.legs.first().map(|leg| RouteInfo {
            distance_text: leg.distance_text.clone(),
            duration_text: leg.duration_text.clone(),
        })
    }
}

/// Errors raised by a [`RouteService`] before it has a provider status.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum RouteError {
    #[error("Invalid route request: {0}")]
    InvalidRequest(String),

    #[error("Routing request failed: {0}")]
    Http(String),

    #[error("Invalid routing response: {0}")]
    Decode(String),
}

/// Asynchronous route computation.
pub trait RouteService: Send + Sync + 'static {
    fn route(
        &self,
        request: RouteRequest,
    ) -> impl Future<Output = Result<RouteResponse, RouteError>> + Send;
}

/// Offline route estimate: one straight leg at a fixed courier speed.
#[derive(Debug, Clone)]
pub struct StraightLineRouteService {
    speed_kmh: f64,
}

impl StraightLineRouteService {
    pub fn new(speed_kmh: f64) -> Self {
        let speed_kmh = if speed_kmh.is_finite() && speed_kmh > 0.0 {
            speed_kmh
        } else {
            DEFAULT_COURIER_SPEED_KMH
        };
        Self { speed_kmh }
    }

    pub fn speed_kmh(&self) -> f64 {
        self.speed_kmh
    }

    fn compute(&self, request: &RouteRequest) -> RouteResponse {
        if !request.origin.is_valid() || !request.destination.is_valid() {
            return RouteResponse::failed(RouteStatus::InvalidRequest);
        }
        let km = distance_km(request.origin, request.destination);
        let hours = km / self.speed_kmh;
        RouteResponse {
            status: RouteStatus::Ok,
            legs: vec![RouteLeg::new(km * 1000.0, hours * 3600.0)],
            path: vec![request.origin, request.destination],
        }
    }
}

impl Default for StraightLineRouteService {
    fn default() -> Self {
        Self::new(DEFAULT_COURIER_SPEED_KMH)
    }
}

impl RouteService for StraightLineRouteService {
    async fn route(&self, request: RouteRequest) -> Result<RouteResponse, RouteError> {
        Ok(self.compute(&request))
    }
}

/// Format a distance the way routing providers display it ("850 m", "1.2 km").
pub fn format_distance(meters: f64) -> String {
    if !meters.is_finite() || meters < 0.0 {
        return "-".to_string();
    }
    if meters.round() < 1000.0 {
        format!("{:.0} m", meters)
    } else {
        format!("{:.1} km", meters / 1000.0)
    }
}

/// Format a duration the way routing providers display it ("1 min", "1 hour 5 mins").
pub fn format_duration(secs: f64) -> String {
    if !secs.is_finite() || secs < 0.0 {
        return "-".to_string();
    }
    let total_minutes = ((secs / 60.0).round() as u64).max(1);
    let hours = total_minutes / 60;
    let minutes = total_minutes % 60;

    let plural = |n: u64, unit: &str| {
        if n == 1 {
            format!("1 {}", unit)
        } else {
            format!("{} {}s", n, unit)
        }
    };

    match (hours, minutes) {
        (0, m) => plural(m, "min"),
        (h, 0) => plural(h, "hour"),
        (h, m) => format!("{} {}", plural(h, "hour"), plural(m, "min")),
    }
}
