//! Headless map toolkit.
//!
//! [`SceneMap`] records what a real map widget would draw into a shared
//! [`MapScene`], which can be inspected or exported as GeoJSON.

use super::loader::{LoadError, ToolkitLoader};
use super::map::{LayerId, LineStyle, MapSurface, MapToolkit, MarkerKind, TileLayer};
use super::routing::RoutingService;
use async_trait::async_trait;
use hallnav_protocol::Coordinates;
use serde::Serialize;
use serde_json::{json, Value};
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::debug;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SceneLayer {
    Marker {
        at: Coordinates,
        kind: MarkerKind,
        popup: Option<String>,
    },
    Polyline {
        points: Vec<Coordinates>,
        style: LineStyle,
    },
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct MapScene {
    pub center: Option<Coordinates>,
    pub zoom: Option<u8>,
    pub bounds: Option<(Coordinates, Coordinates)>,
    pub base_layers: Vec<String>,
    pub active_base_layer: Option<String>,
    pub layers: BTreeMap<LayerId, SceneLayer>,
    pub size_invalidations: u32,
    #[serde(skip)]
    next_id: u64,
}

impl MapScene {
    pub fn markers(&self, kind: MarkerKind) -> Vec<Coordinates> {
        self.layers
            .values()
            .filter_map(|layer| match layer {
                SceneLayer::Marker { at, kind: k, .. } if *k == kind => Some(*at),
                _ => None,
            })
            .collect()
    }

    pub fn polylines(&self) -> Vec<(&[Coordinates], LineStyle)> {
        self.layers
            .values()
            .filter_map(|layer| match layer {
                SceneLayer::Polyline { points, style } => Some((points.as_slice(), *style)),
                _ => None,
            })
            .collect()
    }

    /// Render markers and lines as a GeoJSON `FeatureCollection`.
    pub fn to_geojson(&self) -> Value {
        let features: Vec<Value> = self
            .layers
            .iter()
            .map(|(id, layer)| match layer {
                SceneLayer::Marker { at, kind, popup } => json!({
                    "type": "Feature",
                    "id": id.0,
                    "geometry": { "type": "Point", "coordinates": [at.lon, at.lat] },
                    "properties": { "kind": kind, "popup": popup },
                }),
                SceneLayer::Polyline { points, style } => json!({
                    "type": "Feature",
                    "id": id.0,
                    "geometry": {
                        "type": "LineString",
                        "coordinates": points.iter().map(|p| [p.lon, p.lat]).collect::<Vec<_>>(),
                    },
                    "properties": {
                        "stroke": style.color,
                        "stroke-width": style.weight,
                        "stroke-opacity": style.opacity,
                    },
                }),
            })
            .collect();

        json!({ "type": "FeatureCollection", "features": features })
    }
}

/// Handle to a scene shared between the map and its observers.
#[derive(Debug, Clone, Default)]
pub struct SharedScene(Arc<Mutex<MapScene>>);

impl SharedScene {
    /// Snapshot of the current scene.
    pub fn snapshot(&self) -> MapScene {
        self.lock().clone()
    }

    fn lock(&self) -> MutexGuard<'_, MapScene> {
        // A panic while drawing leaves a scene that is still safe to read.
        self.0.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

pub struct SceneMap {
    scene: SharedScene,
}

impl SceneMap {
    fn insert(&mut self, layer: SceneLayer) -> LayerId {
        let mut scene = self.scene.lock();
        scene.next_id += 1;
        let id = LayerId(scene.next_id);
        scene.layers.insert(id, layer);
        id
    }
}

impl MapSurface for SceneMap {
    fn set_view(&mut self, center: Coordinates, zoom: Option<u8>) {
        let mut scene = self.scene.lock();
        scene.center = Some(center);
        if zoom.is_some() {
            scene.zoom = zoom;
        }
        scene.bounds = None;
    }

    fn fit_bounds(&mut self, south_west: Coordinates, north_east: Coordinates) {
        let mut scene = self.scene.lock();
        scene.bounds = Some((south_west, north_east));
        scene.center = Some(Coordinates::new(
            (south_west.lat + north_east.lat) / 2.0,
            (south_west.lon + north_east.lon) / 2.0,
        ));
    }

    fn add_base_layers(&mut self, layers: &[TileLayer], active: usize) {
        let mut scene = self.scene.lock();
        scene.base_layers = layers.iter().map(|l| l.name.to_string()).collect();
        scene.active_base_layer = layers.get(active).map(|l| l.name.to_string());
    }

    fn add_marker(&mut self, at: Coordinates, kind: MarkerKind, popup: Option<&str>) -> LayerId {
        self.insert(SceneLayer::Marker {
            at,
            kind,
            popup: popup.map(str::to_string),
        })
    }

    fn move_marker(&mut self, id: LayerId, to: Coordinates) {
        if let Some(SceneLayer::Marker { at, .. }) = self.scene.lock().layers.get_mut(&id) {
            *at = to;
        }
    }

    fn add_polyline(&mut self, points: &[Coordinates], style: LineStyle) -> LayerId {
        self.insert(SceneLayer::Polyline {
            points: points.to_vec(),
            style,
        })
    }

    fn remove_layer(&mut self, id: LayerId) {
        self.scene.lock().layers.remove(&id);
    }

    fn invalidate_size(&mut self) {
        self.scene.lock().size_invalidations += 1;
    }
}

/// Toolkit whose maps draw into one [`SharedScene`].
pub struct HeadlessToolkit {
    scene: SharedScene,
    router: Arc<dyn RoutingService>,
    maps_created: AtomicUsize,
}

impl HeadlessToolkit {
    pub fn new(router: Arc<dyn RoutingService>) -> Self {
        Self {
            scene: SharedScene::default(),
            router,
            maps_created: AtomicUsize::new(0),
        }
    }

    pub fn scene(&self) -> SharedScene {
        self.scene.clone()
    }

    pub fn maps_created(&self) -> usize {
        self.maps_created.load(Ordering::SeqCst)
    }
}

impl MapToolkit for HeadlessToolkit {
    fn create_map(&self, center: Coordinates, zoom: u8) -> Box<dyn MapSurface> {
        self.maps_created.fetch_add(1, Ordering::SeqCst);
        let mut map = SceneMap {
            scene: self.scene.clone(),
        };
        map.set_view(center, Some(zoom));
        Box::new(map)
    }

    fn router(&self) -> Arc<dyn RoutingService> {
        Arc::clone(&self.router)
    }
}

/// Loader that hands out one prepared [`HeadlessToolkit`].
pub struct HeadlessLoader {
    toolkit: Arc<HeadlessToolkit>,
    loads: AtomicUsize,
}

impl HeadlessLoader {
    pub fn new(toolkit: Arc<HeadlessToolkit>) -> Self {
        Self {
            toolkit,
            loads: AtomicUsize::new(0),
        }
    }

    pub fn loads(&self) -> usize {
        self.loads.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ToolkitLoader for HeadlessLoader {
    async fn load(&self) -> Result<Arc<dyn MapToolkit>, LoadError> {
        let n = self.loads.fetch_add(1, Ordering::SeqCst) + 1;
        debug!("Loading headless map toolkit (load #{})", n);
        let toolkit: Arc<dyn MapToolkit> = self.toolkit.clone();
        Ok(toolkit)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::navigation::map::{PATH_STYLE, ROUTE_STYLE};
    use crate::navigation::routing::{Route, RoutingError};

    struct NoRouter;

    #[async_trait]
    impl RoutingService for NoRouter {
        async fn route(&self, _: Coordinates, _: Coordinates) -> Result<Route, RoutingError> {
            Err(RoutingError::NoRoute)
        }
    }

    #[test]
    fn test_scene_records_and_exports() {
        let toolkit = HeadlessToolkit::new(Arc::new(NoRouter));
        let mut map = toolkit.create_map(Coordinates::new(34.0522, -118.2437), 16);

        let pin = map.add_marker(Coordinates::new(34.0522, -118.2437), MarkerKind::Campus, Some("LT1 & 2"));
        let user = map.add_marker(Coordinates::new(34.05, -118.24), MarkerKind::User, None);
        map.move_marker(user, Coordinates::new(34.049, -118.239));
        let line = map.add_polyline(
            &[Coordinates::new(34.049, -118.239), Coordinates::new(34.0522, -118.2437)],
            PATH_STYLE,
        );

        let scene = toolkit.scene().snapshot();
        assert_eq!(scene.zoom, Some(16));
        assert_eq!(scene.markers(MarkerKind::User), vec![Coordinates::new(34.049, -118.239)]);

        let geojson = scene.to_geojson();
        assert_eq!(geojson["type"], "FeatureCollection");
        assert_eq!(geojson["features"].as_array().unwrap().len(), 3);
        assert_eq!(geojson["features"][0]["geometry"]["coordinates"][0], -118.2437);
        assert_eq!(geojson["features"][0]["properties"]["popup"], "LT1 & 2");

        map.remove_layer(line);
        map.remove_layer(pin);
        let scene = toolkit.scene().snapshot();
        assert!(scene.polylines().is_empty());
        assert_eq!(scene.layers.len(), 1);
    }

    #[test]
    fn test_route_style_exported() {
        let toolkit = HeadlessToolkit::new(Arc::new(NoRouter));
        let mut map = toolkit.create_map(Coordinates::new(0.0, 0.0), 16);
        map.add_polyline(&[Coordinates::new(0.0, 0.0), Coordinates::new(0.0, 0.001)], ROUTE_STYLE);

        let geojson = toolkit.scene().snapshot().to_geojson();
        assert_eq!(geojson["features"][0]["properties"]["stroke-width"], 6);
        assert_eq!(geojson["features"][0]["properties"]["stroke"], "#22c55e");
    }
}
