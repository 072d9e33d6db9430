//! Navigation page state.
//!
//! The session is the source of truth. A map, once attached, is only a
//! projection of it: every state change is mirrored onto the map when one
//! exists, and [`NavigationSession::attach_map`] replays the current state
//! onto a freshly built map.

use super::geo::{bounds, format_km, great_circle_distance};
use super::geolocation::GeoError;
use super::map::{
    LayerId, MapSurface, MapToolkit, MarkerKind, BASE_LAYERS, PATH_STYLE, ROUTE_STYLE,
};
use super::routing::{Route, RoutingService, ROUTE_FAILED_MESSAGE};
use hallnav_protocol::defaults::DEFAULT_MAP_ZOOM;
use hallnav_protocol::{find_campus_location, CampusLocation, Coordinates};
use serde::Serialize;
use tracing::{debug, info, warn};

pub const STATUS_INITIALIZING: &str = "Initializing...";
pub const STATUS_LOCATED: &str = "You are here!";
pub const STATUS_ERROR: &str = "Error";
pub const DISTANCE_CALCULATING: &str = "Calculating distance...";
pub const DISTANCE_NO_DESTINATION: &str = "Search for a location to get started.";
pub const DISTANCE_WAITING: &str = "Waiting for your location...";
pub const DIRECTIONS_NOT_READY: &str = "Please wait for your location and select a destination first.";
pub const ABOUT_NO_DESTINATION: &str = "Please select a destination first.";

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "phase", content = "error", rename_all = "snake_case")]
pub enum LocationPhase {
    Initializing,
    Located,
    Failed(String),
}

/// Map handles owned by the session. Dropped with it.
struct MapView {
    surface: Box<dyn MapSurface>,
    user_marker: Option<LayerId>,
    destination_marker: Option<LayerId>,
    path_line: Option<LayerId>,
    route_line: Option<LayerId>,
}

impl MapView {
    fn replace(&mut self, slot: fn(&mut MapView) -> &mut Option<LayerId>, new: Option<LayerId>) {
        if let Some(old) = std::mem::replace(slot(self), new) {
            self.surface.remove_layer(old);
        }
    }
}

/// Serializable view of everything the page displays.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionView {
    pub status: String,
    pub distance: String,
    pub location: LocationPhase,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user: Option<Coordinates>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub destination: Option<CampusLocation>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub advisory: Option<String>,
    pub search_results: Vec<CampusLocation>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub route: Option<Route>,
    pub directions: Vec<String>,
    pub map_attached: bool,
}

pub struct NavigationSession {
    locations: Vec<CampusLocation>,
    destination: Option<CampusLocation>,
    user: Option<Coordinates>,
    phase: LocationPhase,
    status: String,
    distance: String,
    advisory: Option<String>,
    search_results: Vec<CampusLocation>,
    route: Option<Route>,
    directions: Vec<String>,
    map: Option<MapView>,
}

impl NavigationSession {
    pub fn new(locations: Vec<CampusLocation>) -> Self {
        Self {
            locations,
            destination: None,
            user: None,
            phase: LocationPhase::Initializing,
            status: STATUS_INITIALIZING.to_string(),
            distance: DISTANCE_CALCULATING.to_string(),
            advisory: None,
            search_results: Vec::new(),
            route: None,
            directions: Vec::new(),
            map: None,
        }
    }

    /// Preselect the destination for a hall handed over from the info page.
    pub fn with_hall(mut self, hall: Option<&str>) -> Self {
        if let Some(hall) = hall {
            if !self.select(hall) {
                debug!("Hall '{}' is not a campus destination", hall);
            }
        }
        self
    }

    // ------------------------------------------------------------------
    // Map
    // ------------------------------------------------------------------

    pub fn is_map_attached(&self) -> bool {
        self.map.is_some()
    }

    /// Build the map and replay the session onto it. Returns `false` when a
    /// map is already attached; it is never constructed twice.
    pub fn attach_map(&mut self, toolkit: &dyn MapToolkit) -> bool {
        if self.map.is_some() {
            return false;
        }

        let center = self
            .locations
            .first()
            .map(CampusLocation::coordinates)
            .or(self.user)
            .unwrap_or(Coordinates::new(0.0, 0.0));
        let mut surface = toolkit.create_map(center, DEFAULT_MAP_ZOOM);
        surface.add_base_layers(&BASE_LAYERS, 0);
        for location in &self.locations {
            surface.add_marker(location.coordinates(), MarkerKind::Campus, Some(&location.name));
        }
        surface.invalidate_size();

        self.map = Some(MapView {
            surface,
            user_marker: None,
            destination_marker: None,
            path_line: None,
            route_line: None,
        });
        info!("Map attached");

        if let Some(user) = self.user {
            self.render_user(user);
        }
        if self.destination.is_some() {
            self.render_destination();
        }
        if self.route.is_some() {
            self.render_route();
        }
        true
    }

    pub fn resize(&mut self) {
        if let Some(map) = self.map.as_mut() {
            map.surface.invalidate_size();
        }
    }

    // ------------------------------------------------------------------
    // Location
    // ------------------------------------------------------------------

    pub fn apply_fix(&mut self, coords: Coordinates) {
        self.user = Some(coords);
        self.phase = LocationPhase::Located;
        self.status = STATUS_LOCATED.to_string();
        self.distance = self.distance_text();
        self.render_user(coords);
        // Keep the straight line anchored at the latest position.
        self.render_path();
    }

    pub fn apply_geo_error(&mut self, err: &GeoError) {
        warn!("Location error: {}", err);
        self.phase = LocationPhase::Failed(err.to_string());
        self.status = STATUS_ERROR.to_string();
        self.distance = err.user_message().to_string();
    }

    // ------------------------------------------------------------------
    // Destination
    // ------------------------------------------------------------------

    /// Case-insensitive substring filter. An empty query clears the results.
    pub fn search(&mut self, query: &str) -> &[CampusLocation] {
        let needle = query.trim().to_lowercase();
        self.search_results = if needle.is_empty() {
            Vec::new()
        } else {
            self.locations
                .iter()
                .filter(|l| l.name.to_lowercase().contains(&needle))
                .cloned()
                .collect()
        };
        &self.search_results
    }

    /// Select by id or name. Returns `false` when nothing matches.
    pub fn select(&mut self, hall: &str) -> bool {
        match find_campus_location(&self.locations, hall).cloned() {
            Some(location) => {
                self.select_location(location);
                true
            }
            None => false,
        }
    }

    pub fn select_location(&mut self, location: CampusLocation) {
        info!("Destination: {}", location.name);
        self.destination = Some(location);
        self.search_results.clear();
        self.distance = self.distance_text();

        // A route to the previous destination no longer applies.
        self.route = None;
        self.directions.clear();
        if let Some(map) = self.map.as_mut() {
            map.replace(|m| &mut m.route_line, None);
        }

        self.render_destination();
    }

    // ------------------------------------------------------------------
    // Directions
    // ------------------------------------------------------------------

    pub async fn get_directions(&mut self, router: &dyn RoutingService) {
        let (Some(from), Some(to)) = (self.user, self.destination.clone()) else {
            self.advisory = Some(DIRECTIONS_NOT_READY.to_string());
            return;
        };

        self.route = None;
        self.directions.clear();
        if let Some(map) = self.map.as_mut() {
            map.replace(|m| &mut m.route_line, None);
        }

        match router.route(from, to.coordinates()).await {
            Ok(route) => {
                info!(
                    "Route to {}: {:.0} m, {} steps",
                    to.name,
                    route.distance_m,
                    route.steps.len()
                );
                self.directions = if route.steps.is_empty() {
                    turn_by_turn(&from.to_string(), &to.name, from == to.coordinates())
                } else {
                    route.steps.clone()
                };
                self.route = Some(route);
                self.advisory = None;
                self.render_route();
            }
            Err(e) => {
                warn!("Directions to {} failed: {}", to.name, e);
                self.advisory = Some(ROUTE_FAILED_MESSAGE.to_string());
            }
        }
    }

    pub fn set_advisory(&mut self, text: impl Into<String>) {
        self.advisory = Some(text.into());
    }

    pub fn learn_about(&mut self) {
        self.advisory = Some(match &self.destination {
            None => ABOUT_NO_DESTINATION.to_string(),
            Some(dest) => about_text(&dest.name),
        });
    }

    // ------------------------------------------------------------------
    // Accessors
    // ------------------------------------------------------------------

    pub fn status_text(&self) -> &str {
        &self.status
    }

    pub fn distance(&self) -> &str {
        &self.distance
    }

    pub fn advisory(&self) -> Option<&str> {
        self.advisory.as_deref()
    }

    pub fn location_phase(&self) -> &LocationPhase {
        &self.phase
    }

    pub fn user_position(&self) -> Option<Coordinates> {
        self.user
    }

    pub fn destination(&self) -> Option<&CampusLocation> {
        self.destination.as_ref()
    }

    pub fn route(&self) -> Option<&Route> {
        self.route.as_ref()
    }

    pub fn directions(&self) -> &[String] {
        &self.directions
    }

    pub fn view(&self) -> SessionView {
        SessionView {
            status: self.status.clone(),
            distance: self.distance.clone(),
            location: self.phase.clone(),
            user: self.user,
            destination: self.destination.clone(),
            advisory: self.advisory.clone(),
            search_results: self.search_results.clone(),
            route: self.route.clone(),
            directions: self.directions.clone(),
            map_attached: self.map.is_some(),
        }
    }

    // ------------------------------------------------------------------
    // Rendering
    // ------------------------------------------------------------------

    fn distance_text(&self) -> String {
        match (&self.destination, self.user) {
            (None, _) => DISTANCE_NO_DESTINATION.to_string(),
            (Some(_), None) => DISTANCE_WAITING.to_string(),
            (Some(dest), Some(user)) => format!(
                "Distance to {}: {} km",
                dest.name,
                format_km(great_circle_distance(user, dest.coordinates()))
            ),
        }
    }

    fn render_user(&mut self, coords: Coordinates) {
        let Some(map) = self.map.as_mut() else {
            return;
        };
        match map.user_marker {
            Some(id) => map.surface.move_marker(id, coords),
            None => {
                map.user_marker = Some(map.surface.add_marker(coords, MarkerKind::User, None));
            }
        }
        map.surface.set_view(coords, None);
    }

    fn render_destination(&mut self) {
        let (Some(map), Some(dest)) = (self.map.as_mut(), self.destination.as_ref()) else {
            return;
        };
        let at = dest.coordinates();
        let marker = map.surface.add_marker(at, MarkerKind::Destination, Some(&dest.name));
        map.replace(|m| &mut m.destination_marker, Some(marker));

        match self.user {
            Some(user) => {
                if let Some((sw, ne)) = bounds(&[user, at]) {
                    map.surface.fit_bounds(sw, ne);
                }
            }
            None => map.surface.set_view(at, Some(DEFAULT_MAP_ZOOM)),
        }
        self.render_path();
    }

    /// At most one straight line: the previous one is always removed first.
    fn render_path(&mut self) {
        let (Some(map), Some(user), Some(dest)) =
            (self.map.as_mut(), self.user, self.destination.as_ref())
        else {
            return;
        };
        let line = map
            .surface
            .add_polyline(&[user, dest.coordinates()], PATH_STYLE);
        map.replace(|m| &mut m.path_line, Some(line));
    }

    fn render_route(&mut self) {
        let (Some(map), Some(route)) = (self.map.as_mut(), self.route.as_ref()) else {
            return;
        };
        let line = map.surface.add_polyline(&route.geometry, ROUTE_STYLE);
        map.replace(|m| &mut m.route_line, Some(line));
        if let Some((sw, ne)) = bounds(&route.geometry) {
            map.surface.fit_bounds(sw, ne);
        }
    }
}

/// Fallback directions when the router gives no steps.
pub fn turn_by_turn(from: &str, to: &str, same_place: bool) -> Vec<String> {
    if same_place || from.eq_ignore_ascii_case(to) {
        return vec!["You are already at your destination.".to_string()];
    }
    vec![
        format!("Start at {from}."),
        format!("Proceed to {to}."),
        "You have arrived at your destination.".to_string(),
    ]
}

pub fn about_text(name: &str) -> String {
    format!(
        "About {name}: A key lecture theatre complex used for classes and examinations. \
         Expect modern facilities and student services nearby."
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::navigation::routing::RoutingError;
    use crate::navigation::scene::HeadlessToolkit;
    use async_trait::async_trait;
    use hallnav_protocol::campus_locations;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    const NEAR_LT3: Coordinates = Coordinates::new(34.046, -118.236);

    struct StubRouter {
        fail: bool,
        calls: AtomicUsize,
    }

    impl StubRouter {
        fn ok() -> Self {
            Self { fail: false, calls: AtomicUsize::new(0) }
        }
    }

    #[async_trait]
    impl RoutingService for StubRouter {
        async fn route(&self, from: Coordinates, to: Coordinates) -> Result<Route, RoutingError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                return Err(RoutingError::Transport("offline".into()));
            }
            Ok(Route {
                distance_m: 200.0,
                duration_s: 150.0,
                geometry: vec![from, Coordinates::new(34.0455, -118.2355), to],
                steps: Vec::new(),
            })
        }
    }

    fn toolkit() -> HeadlessToolkit {
        HeadlessToolkit::new(Arc::new(StubRouter::ok()))
    }

    #[test]
    fn test_initial_texts() {
        let session = NavigationSession::new(campus_locations());
        assert_eq!(session.status_text(), STATUS_INITIALIZING);
        assert_eq!(session.distance(), DISTANCE_CALCULATING);
        assert_eq!(session.location_phase(), &LocationPhase::Initializing);
    }

    #[test]
    fn test_fix_without_destination() {
        let mut session = NavigationSession::new(campus_locations());
        session.apply_fix(NEAR_LT3);
        assert_eq!(session.status_text(), STATUS_LOCATED);
        assert_eq!(session.distance(), DISTANCE_NO_DESTINATION);
    }

    #[test]
    fn test_permission_denied_then_recovers() {
        let mut session = NavigationSession::new(campus_locations());
        session.apply_geo_error(&GeoError::PermissionDenied);
        assert_eq!(session.status_text(), "Error");
        assert_eq!(
            session.distance(),
            "Permission to access location was denied. Please enable it in your browser settings."
        );

        session.apply_fix(NEAR_LT3);
        assert_eq!(session.location_phase(), &LocationPhase::Located);
    }

    #[test]
    fn test_select_before_fix_waits_for_location() {
        let mut session = NavigationSession::new(campus_locations()).with_hall(Some("LT3"));
        assert_eq!(session.destination().unwrap().id, "lt3");
        assert_eq!(session.distance(), DISTANCE_WAITING);

        session.apply_fix(NEAR_LT3);
        assert!(session.distance().starts_with("Distance to LT3 & 4: 0.1"));
    }

    #[test]
    fn test_search() {
        let mut session = NavigationSession::new(campus_locations());
        assert_eq!(session.search("lt").len(), 2);
        assert_eq!(session.search("3 & 4")[0].id, "lt3");
        assert!(session.search("  ").is_empty());
        assert!(session.search("library").is_empty());
    }

    #[test]
    fn test_one_path_line_and_one_destination_marker() {
        let toolkit = toolkit();
        let mut session = NavigationSession::new(campus_locations());
        assert!(session.attach_map(&toolkit));
        session.apply_fix(NEAR_LT3);

        session.select("lt1");
        session.select("lt3");
        session.apply_fix(Coordinates::new(34.047, -118.237));

        let scene = toolkit.scene().snapshot();
        assert_eq!(scene.polylines().len(), 1);
        assert_eq!(scene.markers(MarkerKind::Destination).len(), 1);
        assert_eq!(scene.markers(MarkerKind::User).len(), 1);
        assert_eq!(scene.markers(MarkerKind::Campus).len(), 2);
    }

    #[test]
    fn test_map_built_once_and_replays_state() {
        let toolkit = toolkit();
        let mut session = NavigationSession::new(campus_locations());
        session.apply_fix(NEAR_LT3);
        session.select("LT3 & 4");

        assert!(session.attach_map(&toolkit));
        assert!(!session.attach_map(&toolkit));
        assert_eq!(toolkit.maps_created(), 1);

        let scene = toolkit.scene().snapshot();
        assert_eq!(scene.base_layers, vec!["Campus Map", "Satellite View"]);
        assert_eq!(scene.size_invalidations, 1);
        assert_eq!(scene.markers(MarkerKind::User), vec![NEAR_LT3]);
        assert_eq!(scene.polylines().len(), 1);
        assert!(scene.bounds.is_some());
    }

    #[tokio::test]
    async fn test_directions_require_location_and_destination() {
        let router = StubRouter::ok();
        let mut session = NavigationSession::new(campus_locations());
        session.get_directions(&router).await;
        assert_eq!(session.advisory(), Some(DIRECTIONS_NOT_READY));

        session.select("lt1");
        session.get_directions(&router).await;
        assert_eq!(session.advisory(), Some(DIRECTIONS_NOT_READY));
        assert_eq!(router.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_directions_replace_previous_route() {
        let toolkit = toolkit();
        let router = StubRouter::ok();
        let mut session = NavigationSession::new(campus_locations());
        session.attach_map(&toolkit);
        session.apply_fix(NEAR_LT3);
        session.select("lt3");

        session.get_directions(&router).await;
        session.get_directions(&router).await;

        let scene = toolkit.scene().snapshot();
        let routes: Vec<_> = scene
            .polylines()
            .into_iter()
            .filter(|(_, style)| *style == ROUTE_STYLE)
            .collect();
        assert_eq!(routes.len(), 1);
        assert_eq!(routes[0].0.len(), 3);
        assert_eq!(session.directions().len(), 3);
        assert_eq!(session.directions()[1], "Proceed to LT3 & 4.");
        assert!(session.advisory().is_none());
    }

    #[tokio::test]
    async fn test_routing_failure_sets_advisory() {
        let router = StubRouter {
            fail: true,
            calls: AtomicUsize::new(0),
        };
        let mut session = NavigationSession::new(campus_locations());
        session.apply_fix(NEAR_LT3);
        session.select("lt1");
        session.get_directions(&router).await;

        assert_eq!(session.advisory(), Some(ROUTE_FAILED_MESSAGE));
        assert!(session.route().is_none());
    }

    #[test]
    fn test_learn_about() {
        let mut session = NavigationSession::new(campus_locations());
        session.learn_about();
        assert_eq!(session.advisory(), Some(ABOUT_NO_DESTINATION));

        session.select("lt1");
        session.learn_about();
        assert!(session.advisory().unwrap().starts_with("About LT1 & 2:"));
    }

    #[test]
    fn test_turn_by_turn() {
        assert_eq!(
            turn_by_turn("LT1 & 2", "lt1 & 2", false),
            vec!["You are already at your destination.".to_string()]
        );
        assert_eq!(turn_by_turn("Gate", "LT3 & 4", false).len(), 3);
    }
}
