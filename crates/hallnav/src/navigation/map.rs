//! Map capability.
//!
//! The mapping toolkit is loaded at runtime (see [`super::loader`]) and is
//! only reachable through these traits. Layer handles are plain ids owned by
//! whoever added the layer.

use super::routing::RoutingService;
use hallnav_protocol::Coordinates;
use serde::Serialize;
use std::fmt;
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct LayerId(pub u64);

impl fmt::Display for LayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "layer-{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MarkerKind {
    /// Campus location pin.
    Campus,
    /// Selected destination.
    Destination,
    /// Current user position.
    User,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct LineStyle {
    pub color: &'static str,
    pub weight: u8,
    pub opacity: f32,
}

/// Straight user-to-destination line.
pub const PATH_STYLE: LineStyle = LineStyle {
    color: "#22c55e",
    weight: 5,
    opacity: 0.8,
};

/// Road route overlay.
pub const ROUTE_STYLE: LineStyle = LineStyle {
    color: "#22c55e",
    weight: 6,
    opacity: 1.0,
};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TileLayer {
    pub name: &'static str,
    pub url_template: &'static str,
    pub attribution: &'static str,
    pub max_zoom: u8,
}

/// The two selectable base layers. The first is active on construction.
pub const BASE_LAYERS: [TileLayer; 2] = [
    TileLayer {
        name: "Campus Map",
        url_template: "https://tiles.stadiamaps.com/tiles/alidade_smooth/{z}/{x}/{y}{r}.png",
        attribution: "&copy; Stadia Maps &copy; OpenMapTiles &copy; OpenStreetMap contributors",
        max_zoom: 20,
    },
    TileLayer {
        name: "Satellite View",
        url_template:
            "https://server.arcgisonline.com/ArcGIS/rest/services/World_Imagery/MapServer/tile/{z}/{y}/{x}",
        attribution: "Tiles &copy; Esri",
        max_zoom: 19,
    },
];

/// A constructed map instance.
pub trait MapSurface: Send {
    fn set_view(&mut self, center: Coordinates, zoom: Option<u8>);

    fn fit_bounds(&mut self, south_west: Coordinates, north_east: Coordinates);

    fn add_base_layers(&mut self, layers: &[TileLayer], active: usize);

    fn add_marker(&mut self, at: Coordinates, kind: MarkerKind, popup: Option<&str>) -> LayerId;

    fn move_marker(&mut self, id: LayerId, to: Coordinates);

    fn add_polyline(&mut self, points: &[Coordinates], style: LineStyle) -> LayerId;

    fn remove_layer(&mut self, id: LayerId);

    /// Recompute the viewport after the container changed size.
    fn invalidate_size(&mut self);
}

/// The loaded toolkit: map construction plus its road-routing companion.
pub trait MapToolkit: Send + Sync {
    fn create_map(&self, center: Coordinates, zoom: u8) -> Box<dyn MapSurface>;

    fn router(&self) -> Arc<dyn RoutingService>;
}
