//! Navigation page loop: map loading, position events and commands.

use async_trait::async_trait;
use hallnav::navigation::map::{PATH_STYLE, ROUTE_STYLE};
use hallnav::navigation::page::{DIRECTIONS_DROPPED_MESSAGE, MAP_UNAVAILABLE_MESSAGE};
use hallnav::navigation::{
    GeoError, GeoFeed, GeoWatch, GeolocationProvider, HeadlessToolkit, LoadError, LocationPhase,
    MapRuntime, MapToolkit, MarkerKind, NavCommand, NavigationPage, Route, RoutingError,
    RoutingService, SessionView, ToolkitLoader, WatchOptions,
};
use hallnav_protocol::{campus_locations, Coordinates};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::{mpsc, watch, Notify};

const NEAR_LT3: Coordinates = Coordinates::new(34.0449, -118.2351);

/// Hands out one prepared watch.
struct ManualGeolocation(Mutex<Option<GeoWatch>>);

impl ManualGeolocation {
    fn new() -> (GeoFeed, Self) {
        let (feed, watch) = GeoWatch::channel();
        (feed, Self(Mutex::new(Some(watch))))
    }
}

impl GeolocationProvider for ManualGeolocation {
    fn watch(&self, _options: WatchOptions) -> GeoWatch {
        self.0
            .lock()
            .unwrap()
            .take()
            .unwrap_or_else(|| GeoWatch::channel().1)
    }
}

/// Loader that waits for a go-ahead, then succeeds or fails.
struct GatedLoader {
    toolkit: Option<Arc<HeadlessToolkit>>,
    gate: Arc<Notify>,
    loads: AtomicUsize,
}

#[async_trait]
impl ToolkitLoader for GatedLoader {
    async fn load(&self) -> Result<Arc<dyn MapToolkit>, LoadError> {
        self.loads.fetch_add(1, Ordering::SeqCst);
        self.gate.notified().await;
        match &self.toolkit {
            Some(toolkit) => {
                let toolkit: Arc<dyn MapToolkit> = toolkit.clone();
                Ok(toolkit)
            }
            None => Err(LoadError("script blocked".into())),
        }
    }
}

#[derive(Default)]
struct FakeRouter {
    calls: AtomicUsize,
}

#[async_trait]
impl RoutingService for FakeRouter {
    async fn route(&self, from: Coordinates, to: Coordinates) -> Result<Route, RoutingError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(Route {
            distance_m: 120.0,
            duration_s: 90.0,
            geometry: vec![from, to],
            steps: vec![
                "Head north on Campus Road (100 m)".into(),
                "You have arrived at your destination.".into(),
            ],
        })
    }
}

struct Harness {
    feed: GeoFeed,
    view: watch::Receiver<SessionView>,
    tx: mpsc::Sender<NavCommand>,
    handle: tokio::task::JoinHandle<hallnav::navigation::NavigationSession>,
    gate: Arc<Notify>,
    loader: Arc<GatedLoader>,
}

fn open(hall: Option<&str>, toolkit: Option<Arc<HeadlessToolkit>>) -> Harness {
    let gate = Arc::new(Notify::new());
    let loader = Arc::new(GatedLoader {
        toolkit,
        gate: Arc::clone(&gate),
        loads: AtomicUsize::new(0),
    });
    let runtime = Arc::new(MapRuntime::new(loader.clone()));
    let (feed, geolocation) = ManualGeolocation::new();

    let page = NavigationPage::open(hall, campus_locations(), runtime, &geolocation);
    let view = page.subscribe();
    let (tx, rx) = mpsc::channel(8);
    let handle = tokio::spawn(page.run(rx));
    Harness {
        feed,
        view,
        tx,
        handle,
        gate,
        loader,
    }
}

async fn wait_for(view: &mut watch::Receiver<SessionView>, f: impl FnMut(&SessionView) -> bool) {
    tokio::time::timeout(Duration::from_secs(5), view.wait_for(f))
        .await
        .expect("view should reach the expected state")
        .expect("page should still be running");
}

#[tokio::test]
async fn directions_wait_for_the_map() {
    let router = Arc::new(FakeRouter::default());
    let toolkit = Arc::new(HeadlessToolkit::new(router.clone()));
    let mut h = open(Some("LT3"), Some(Arc::clone(&toolkit)));

    {
        let initial = h.view.borrow();
        assert_eq!(initial.status, "Initializing...");
        assert_eq!(initial.destination.as_ref().unwrap().id, "lt3");
        assert_eq!(initial.distance, "Waiting for your location...");
        assert!(!initial.map_attached);
    }

    assert!(h.feed.push(Ok(NEAR_LT3)));
    wait_for(&mut h.view, |v| v.location == LocationPhase::Located).await;
    assert_eq!(h.view.borrow().status, "You are here!");
    assert!(h.view.borrow().distance.starts_with("Distance to LT3 & 4: 0.0"));

    h.tx.send(NavCommand::GetDirections).await.unwrap();
    h.tx.send(NavCommand::LearnAbout).await.unwrap();
    wait_for(&mut h.view, |v| v.advisory.is_some()).await;
    assert_eq!(router.calls.load(Ordering::SeqCst), 0);
    assert!(h.view.borrow().route.is_none());

    h.gate.notify_one();
    wait_for(&mut h.view, |v| v.route.is_some()).await;
    {
        let view = h.view.borrow();
        assert!(view.map_attached);
        assert_eq!(view.directions.len(), 2);
        assert_eq!(view.directions[0], "Head north on Campus Road (100 m)");
    }
    assert_eq!(router.calls.load(Ordering::SeqCst), 1);

    let scene = toolkit.scene().snapshot();
    assert_eq!(scene.markers(MarkerKind::Campus).len(), 2);
    assert_eq!(scene.markers(MarkerKind::User), vec![NEAR_LT3]);
    assert_eq!(scene.markers(MarkerKind::Destination).len(), 1);
    let styles: Vec<_> = scene.polylines().into_iter().map(|(_, style)| style).collect();
    assert_eq!(styles.iter().filter(|s| **s == PATH_STYLE).count(), 1);
    assert_eq!(styles.iter().filter(|s| **s == ROUTE_STYLE).count(), 1);

    // A second fix moves the marker and keeps a single straight line.
    assert!(h.feed.push(Ok(Coordinates::new(34.0452, -118.2352))));
    wait_for(&mut h.view, |v| v.user != Some(NEAR_LT3)).await;
    let scene = toolkit.scene().snapshot();
    assert_eq!(scene.markers(MarkerKind::User).len(), 1);
    assert_eq!(
        scene
            .polylines()
            .into_iter()
            .filter(|(_, s)| *s == PATH_STYLE)
            .count(),
        1
    );

    h.tx.send(NavCommand::Close).await.unwrap();
    let session = h.handle.await.unwrap();
    assert!(session.is_map_attached());
    assert_eq!(toolkit.maps_created(), 1);
    assert_eq!(h.loader.loads.load(Ordering::SeqCst), 1);
    assert!(h.feed.is_closed());
    assert!(h.tx.is_closed());
}

#[tokio::test]
async fn permission_denied_shows_error() {
    let toolkit = Arc::new(HeadlessToolkit::new(Arc::new(FakeRouter::default())));
    let mut h = open(None, Some(toolkit));
    h.gate.notify_one();

    assert!(h.feed.push(Err(GeoError::PermissionDenied)));
    wait_for(&mut h.view, |v| matches!(v.location, LocationPhase::Failed(_))).await;
    {
        let view = h.view.borrow();
        assert_eq!(view.status, "Error");
        assert_eq!(view.distance, GeoError::PermissionDenied.user_message());
    }

    h.tx.send(NavCommand::GetDirections).await.unwrap();
    wait_for(&mut h.view, |v| v.advisory.is_some()).await;
    assert_eq!(
        h.view.borrow().advisory.as_deref(),
        Some("Please wait for your location and select a destination first.")
    );

    drop(h.tx);
    h.handle.await.unwrap();
    assert!(h.feed.is_closed());
}

#[tokio::test]
async fn failed_map_load_still_tracks_position() {
    let mut h = open(Some("lt1"), None);
    h.tx.send(NavCommand::GetDirections).await.unwrap();
    h.gate.notify_one();

    wait_for(&mut h.view, |v| v.advisory.is_some()).await;
    assert_eq!(
        h.view.borrow().advisory.as_deref(),
        Some(MAP_UNAVAILABLE_MESSAGE)
    );
    assert!(!h.view.borrow().map_attached);

    assert!(h.feed.push(Ok(NEAR_LT3)));
    wait_for(&mut h.view, |v| v.location == LocationPhase::Located).await;
    assert!(h.view.borrow().distance.starts_with("Distance to LT1 & 2:"));

    h.tx.send(NavCommand::Search("lt".into())).await.unwrap();
    wait_for(&mut h.view, |v| !v.search_results.is_empty()).await;
    assert_eq!(h.view.borrow().search_results.len(), 2);

    h.tx.send(NavCommand::Close).await.unwrap();
    let session = h.handle.await.unwrap();
    assert!(!session.is_map_attached());
    assert!(session.route().is_none());
}

#[tokio::test]
async fn resize_invalidates_an_attached_map() {
    let toolkit = Arc::new(HeadlessToolkit::new(Arc::new(FakeRouter::default())));
    let mut h = open(None, Some(Arc::clone(&toolkit)));

    // No map yet: nothing to invalidate, and the loop keeps running.
    h.tx.send(NavCommand::Resize).await.unwrap();
    h.tx.send(NavCommand::LearnAbout).await.unwrap();
    wait_for(&mut h.view, |v| v.advisory.is_some()).await;
    assert_eq!(toolkit.maps_created(), 0);
    assert_eq!(toolkit.scene().snapshot().size_invalidations, 0);

    h.gate.notify_one();
    wait_for(&mut h.view, |v| v.map_attached).await;
    assert_eq!(toolkit.scene().snapshot().size_invalidations, 1);

    h.tx.send(NavCommand::Resize).await.unwrap();
    h.tx.send(NavCommand::Search("lt".into())).await.unwrap();
    wait_for(&mut h.view, |v| !v.search_results.is_empty()).await;
    assert_eq!(toolkit.scene().snapshot().size_invalidations, 2);

    h.tx.send(NavCommand::Close).await.unwrap();
    h.handle.await.unwrap();
}

#[tokio::test]
async fn close_before_map_ready_reports_dropped_directions() {
    let router = Arc::new(FakeRouter::default());
    let toolkit = Arc::new(HeadlessToolkit::new(router.clone()));
    let mut h = open(Some("lt1"), Some(toolkit));

    assert!(h.feed.push(Ok(NEAR_LT3)));
    wait_for(&mut h.view, |v| v.location == LocationPhase::Located).await;
    h.tx.send(NavCommand::GetDirections).await.unwrap();
    h.tx.send(NavCommand::Close).await.unwrap();

    let session = h.handle.await.unwrap();
    assert_eq!(session.advisory(), Some(DIRECTIONS_DROPPED_MESSAGE));
    assert!(session.route().is_none());
    assert_eq!(router.calls.load(Ordering::SeqCst), 0);
    assert_eq!(h.view.borrow().advisory.as_deref(), Some(DIRECTIONS_DROPPED_MESSAGE));
}
