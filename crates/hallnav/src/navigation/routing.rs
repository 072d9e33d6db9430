//! Road routing between two waypoints.

use async_trait::async_trait;
use hallnav_protocol::Coordinates;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, warn};

pub const ROUTE_FAILED_MESSAGE: &str =
    "Unable to calculate route right now. Please try again shortly.";

#[derive(Debug, Error)]
pub enum RoutingError {
    #[error("routing request failed: {0}")]
    Transport(String),

    #[error("routing service returned {code}: {message}")]
    Service { code: String, message: String },

    #[error("no route found")]
    NoRoute,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Route {
    pub distance_m: f64,
    pub duration_s: f64,
    pub geometry: Vec<Coordinates>,
    /// Turn instructions, possibly empty.
    pub steps: Vec<String>,
}

#[async_trait]
pub trait RoutingService: Send + Sync {
    async fn route(&self, from: Coordinates, to: Coordinates) -> Result<Route, RoutingError>;
}

/// OSRM v1 HTTP client.
#[derive(Debug, Clone)]
pub struct OsrmRouter {
    http: reqwest::Client,
    service_url: String,
    profile: String,
    timeout: Duration,
}

impl OsrmRouter {
    pub fn new(service_url: impl Into<String>, profile: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            service_url: service_url.into().trim_end_matches('/').to_string(),
            profile: profile.into(),
            timeout: Duration::from_secs(15),
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// `{service}/{profile}/{lon},{lat};{lon},{lat}`
    pub fn request_url(&self, from: Coordinates, to: Coordinates) -> String {
        format!(
            "{}/{}/{},{};{},{}?overview=full&geometries=geojson&steps=true",
            self.service_url, self.profile, from.lon, from.lat, to.lon, to.lat
        )
    }
}

#[async_trait]
impl RoutingService for OsrmRouter {
    async fn route(&self, from: Coordinates, to: Coordinates) -> Result<Route, RoutingError> {
        let url = self.request_url(from, to);
        debug!("GET {}", url);

        let response = self
            .http
            .get(&url)
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|e| RoutingError::Transport(e.to_string()))?;
        let status = response.status();
        let body: OsrmResponse = response
            .json()
            .await
            .map_err(|e| RoutingError::Transport(format!("HTTP {}: {}", status.as_u16(), e)))?;

        body.into_route().map_err(|e| {
            warn!("Routing failed: {}", e);
            e
        })
    }
}

#[derive(Debug, Deserialize)]
struct OsrmResponse {
    code: String,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    routes: Vec<OsrmRoute>,
}

#[derive(Debug, Deserialize)]
struct OsrmRoute {
    distance: f64,
    duration: f64,
    geometry: OsrmGeometry,
    #[serde(default)]
    legs: Vec<OsrmLeg>,
}

#[derive(Debug, Deserialize)]
struct OsrmGeometry {
    /// `[lon, lat]` pairs.
    coordinates: Vec<[f64; 2]>,
}

#[derive(Debug, Deserialize)]
struct OsrmLeg {
    #[serde(default)]
    steps: Vec<OsrmStep>,
}

#[derive(Debug, Deserialize)]
struct OsrmStep {
    #[serde(default)]
    name: String,
    #[serde(default)]
    distance: f64,
    maneuver: OsrmManeuver,
}

#[derive(Debug, Deserialize)]
struct OsrmManeuver {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    modifier: Option<String>,
}

impl OsrmResponse {
    fn into_route(self) -> Result<Route, RoutingError> {
        if self.code != "Ok" {
            return Err(RoutingError::Service {
                message: self.message.unwrap_or_default(),
                code: self.code,
            });
        }
        let route = self.routes.into_iter().next().ok_or(RoutingError::NoRoute)?;

        Ok(Route {
            distance_m: route.distance,
            duration_s: route.duration,
            geometry: route
                .geometry
                .coordinates
                .iter()
                .map(|[lon, lat]| Coordinates::new(*lat, *lon))
                .collect(),
            steps: route
                .legs
                .iter()
                .flat_map(|leg| leg.steps.iter())
                .map(describe_step)
                .collect(),
        })
    }
}

fn describe_step(step: &OsrmStep) -> String {
    let onto = if step.name.is_empty() {
        String::new()
    } else {
        format!(" onto {}", step.name)
    };
    let modifier = step.maneuver.modifier.as_deref().unwrap_or("straight");

    let text = match step.maneuver.kind.as_str() {
        "depart" => {
            let on = if step.name.is_empty() {
                String::new()
            } else {
                format!(" on {}", step.name)
            };
            format!("Head {modifier}{on}")
        }
        "arrive" => return "You have arrived at your destination.".to_string(),
        "turn" | "end of road" | "fork" => format!("Turn {modifier}{onto}"),
        "continue" | "new name" => format!("Continue {modifier}{onto}"),
        "roundabout" | "rotary" => format!("Enter the roundabout and exit{onto}"),
        other => format!("{} {modifier}{onto}", capitalize(other)),
    };

    if step.distance > 0.0 {
        format!("{text} ({:.0} m)", step.distance)
    } else {
        text
    }
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"{
        "code": "Ok",
        "routes": [{
            "distance": 1210.4,
            "duration": 870.2,
            "geometry": {"type": "LineString", "coordinates": [[-118.2437, 34.0522], [-118.24, 34.05], [-118.235, 34.045]]},
            "legs": [{"steps": [
                {"name": "Campus Way", "distance": 400.0, "maneuver": {"type": "depart", "modifier": "south"}},
                {"name": "Library Walk", "distance": 810.4, "maneuver": {"type": "turn", "modifier": "left"}},
                {"name": "", "distance": 0.0, "maneuver": {"type": "arrive"}}
            ]}]
        }]
    }"#;

    #[test]
    fn test_parse_osrm_route() {
        let body: OsrmResponse = serde_json::from_str(SAMPLE).unwrap();
        let route = body.into_route().unwrap();
        assert_eq!(route.geometry.len(), 3);
        assert_eq!(route.geometry[0], Coordinates::new(34.0522, -118.2437));
        assert_eq!(
            route.steps,
            vec![
                "Head south on Campus Way (400 m)".to_string(),
                "Turn left onto Library Walk (810 m)".to_string(),
                "You have arrived at your destination.".to_string(),
            ]
        );
    }

    #[test]
    fn test_osrm_error_codes() {
        let body: OsrmResponse =
            serde_json::from_str(r#"{"code":"NoRoute","message":"Impossible route"}"#).unwrap();
        assert!(matches!(body.into_route(), Err(RoutingError::Service { .. })));

        let body: OsrmResponse = serde_json::from_str(r#"{"code":"Ok","routes":[]}"#).unwrap();
        assert!(matches!(body.into_route(), Err(RoutingError::NoRoute)));
    }

    #[test]
    fn test_request_url_is_lon_lat() {
        let router = OsrmRouter::new("http://osrm.local/route/v1/", "foot");
        let url = router.request_url(Coordinates::new(1.5, 2.5), Coordinates::new(3.0, 4.0));
        assert_eq!(
            url,
            "http://osrm.local/route/v1/foot/2.5,1.5;4,3?overview=full&geometries=geojson&steps=true"
        );
    }
}
