//! OSRM-backed route service.
//!
//! Queries `{base}/route/v1/{profile}/{lon},{lat};{lon},{lat}` on an
//! OSRM-compatible server and maps the response onto [`RouteResponse`].

use std::time::Duration;

use serde::Deserialize;

use super::route::{
    RouteError, RouteLeg, RouteRequest, RouteResponse, RouteService, RouteStatus, TravelMode,
};
use crate::geo::Position;

/// Public OSRM demo server.
pub const DEFAULT_OSRM_URL: &str = "https://router.project-osrm.org";

/// Default HTTP timeout for route requests.
const DEFAULT_HTTP_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Deserialize)]
struct OsrmResponse {
    code: String,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    routes: Vec<OsrmRoute>,
}

#[derive(Deserialize)]
struct OsrmRoute {
    #[serde(default)]
    legs: Vec<OsrmLeg>,
    #[serde(default)]
    geometry: Option<OsrmGeometry>,
}

#[derive(Deserialize)]
struct OsrmLeg {
    distance: f64,
    duration: f64,
}

#[derive(Deserialize)]
struct OsrmGeometry {
    coordinates: Vec<[f64; 2]>,
}

/// Route service for an OSRM HTTP endpoint.
pub struct OsrmRouteService {
    http: reqwest::Client,
    base_url: String,
}

impl OsrmRouteService {
    /// Create a client for `base_url` (e.g. [`DEFAULT_OSRM_URL`]).
    pub fn new(base_url: impl Into<String>) -> Result<Self, RouteError> {
        let http = reqwest::Client::builder()
            .timeout(DEFAULT_HTTP_TIMEOUT)
            .build()
            .map_err(|e| RouteError::Http(e.to_string()))?;

        Ok(Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    fn url(&self, request: &RouteRequest) -> String {
        format!(
            "{}/route/v1/{}/{:.6},{:.6};{:.6},{:.6}?overview=full&geometries=geojson",
            self.base_url,
            profile(request.mode),
            request.origin.longitude,
            request.origin.latitude,
            request.destination.longitude,
            request.destination.latitude,
        )
    }
}

impl RouteService for OsrmRouteService {
    async fn route(&self, request: RouteRequest) -> Result<RouteResponse, RouteError> {
        request
            .origin
            .validate()
            .and_then(|_| request.destination.validate())
            .map_err(|e| RouteError::InvalidRequest(e.to_string()))?;

        let response = self
            .http
            .get(self.url(&request))
            .send()
            .await
            .map_err(|e| RouteError::Http(e.to_string()))?;

        let bytes = response
            .bytes()
            .await
            .map_err(|e| RouteError::Http(e.to_string()))?;

        let body: OsrmResponse =
            serde_json::from_slice(&bytes).map_err(|e| RouteError::Decode(e.to_string()))?;

        tracing::debug!(
            code = %body.code,
            routes = body.routes.len(),
            message = ?body.message,
            "OSRM route response"
        );

        Ok(into_response(body))
    }
}

fn profile(mode: TravelMode) -> &'static str {
    match mode {
        TravelMode::Driving => "driving",
        TravelMode::Walking => "foot",
        TravelMode::Bicycling => "bike",
    }
}

fn status_from_code(code: &str) -> RouteStatus {
    match code {
        "Ok" => RouteStatus::Ok,
        "NoRoute" => RouteStatus::ZeroResults,
        "NoSegment" => RouteStatus::NotFound,
        "InvalidQuery" | "InvalidValue" | "InvalidOptions" | "InvalidUrl" | "InvalidService"
        | "InvalidVersion" | "TooBig" => RouteStatus::InvalidRequest,
        "DisabledDataset" => RouteStatus::RequestDenied,
        _ => RouteStatus::UnknownError,
    }
}

fn into_response(body: OsrmResponse) -> RouteResponse {
    let status = status_from_code(&body.code);
    if status != RouteStatus::Ok {
        return RouteResponse::failed(status);
    }

    let Some(route) = body.routes.into_iter().next() else {
        return RouteResponse::failed(RouteStatus::ZeroResults);
    };

    RouteResponse {
        status,
        legs: route
            .legs
            .iter()
            .map(|leg| RouteLeg::new(leg.distance, leg.duration))
            .collect(),
        path: route
            .geometry
            .map(|g| {
                g.coordinates
                    .iter()
                    .map(|[lon, lat]| Position::new(*lat, *lon))
                    .collect()
            })
            .unwrap_or_default(),
    }
}
