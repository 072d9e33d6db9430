//! Campus navigation
//!
//! - [`geolocation`]: continuous position watch
//! - [`loader`]: memoized map toolkit loading
//! - [`map`] / [`scene`]: map capability and its headless implementation
//! - [`routing`]: road routing (OSRM)
//! - [`session`]: page state, the source of truth for the map
//! - [`page`]: the page event loop

pub mod geo;
pub mod geolocation;
pub mod loader;
pub mod map;
pub mod page;
pub mod routing;
pub mod scene;
pub mod session;

pub use geo::{format_km, great_circle_distance};
pub use geolocation::{
    FixedPosition, GeoError, GeoEvent, GeoFeed, GeoWatch, GeolocationProvider, PollingGeolocation,
    PositionSource, TrackReplay, Unavailable, WatchOptions,
};
pub use loader::{LoadError, MapRuntime, ToolkitLoader};
pub use map::{LayerId, MapSurface, MapToolkit, MarkerKind};
pub use page::{NavCommand, NavigationPage};
pub use routing::{OsrmRouter, Route, RoutingError, RoutingService};
pub use scene::{HeadlessLoader, HeadlessToolkit, MapScene, SharedScene};
pub use session::{LocationPhase, NavigationSession, SessionView};
