//! Continuous position watch.
//!
//! A [`GeolocationProvider`] hands out a [`GeoWatch`]: a stream of fixes and
//! errors that only ends when the watch is dropped. Errors never end it.
//! Delivery is last-value-wins; a slow consumer sees the newest event.

use async_trait::async_trait;
use hallnav_protocol::Coordinates;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::{watch, Mutex};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, warn};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GeoError {
    #[error("permission denied")]
    PermissionDenied,
    #[error("position unavailable")]
    PositionUnavailable,
    #[error("timed out")]
    Timeout,
    #[error("geolocation unsupported")]
    Unsupported,
    #[error("{0}")]
    Unknown(String),
}

impl GeoError {
    pub fn user_message(&self) -> &'static str {
        match self {
            GeoError::PermissionDenied => {
                "Permission to access location was denied. Please enable it in your browser settings."
            }
            GeoError::PositionUnavailable => "Location information is unavailable.",
            GeoError::Timeout => "The request to get user location timed out.",
            GeoError::Unsupported => "Geolocation is not supported by your browser.",
            GeoError::Unknown(_) => "An unknown error occurred.",
        }
    }
}

pub type GeoEvent = Result<Coordinates, GeoError>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WatchOptions {
    pub high_accuracy: bool,
    pub timeout: Duration,
    /// Oldest cached fix accepted. Zero means always a fresh reading.
    pub maximum_age: Duration,
}

impl Default for WatchOptions {
    fn default() -> Self {
        Self {
            high_accuracy: true,
            timeout: Duration::from_millis(hallnav_protocol::defaults::GEOLOCATION_TIMEOUT_MS),
            maximum_age: Duration::ZERO,
        }
    }
}

pub trait GeolocationProvider: Send + Sync {
    fn watch(&self, options: WatchOptions) -> GeoWatch;
}

/// Live position stream. Dropping it tears the watch down.
#[derive(Debug)]
pub struct GeoWatch {
    rx: watch::Receiver<Option<GeoEvent>>,
    task: Option<JoinHandle<()>>,
}

impl GeoWatch {
    /// A watch fed by hand. Used by providers that push rather than poll.
    pub fn channel() -> (GeoFeed, GeoWatch) {
        let (tx, rx) = watch::channel(None);
        (GeoFeed { tx }, GeoWatch { rx, task: None })
    }

    /// Next event, or `None` once the feed is gone.
    pub async fn next(&mut self) -> Option<GeoEvent> {
        loop {
            self.rx.changed().await.ok()?;
            if let Some(event) = self.rx.borrow_and_update().clone() {
                return Some(event);
            }
        }
    }
}

impl Drop for GeoWatch {
    fn drop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

/// Sending half of [`GeoWatch::channel`].
#[derive(Debug, Clone)]
pub struct GeoFeed {
    tx: watch::Sender<Option<GeoEvent>>,
}

impl GeoFeed {
    /// Returns `false` once the watch has been torn down.
    pub fn push(&self, event: GeoEvent) -> bool {
        self.tx.send(Some(event)).is_ok()
    }

    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}

// ============================================================================
// Polling provider
// ============================================================================

#[async_trait]
pub trait PositionSource: Send {
    async fn read_position(&mut self, options: &WatchOptions) -> GeoEvent;
}

/// Polls a [`PositionSource`] on a fixed interval.
pub struct PollingGeolocation {
    source: Arc<Mutex<Box<dyn PositionSource>>>,
    interval: Duration,
}

impl PollingGeolocation {
    pub fn new(source: impl PositionSource + 'static, interval: Duration) -> Self {
        Self {
            source: Arc::new(Mutex::new(Box::new(source))),
            interval,
        }
    }
}

impl GeolocationProvider for PollingGeolocation {
    fn watch(&self, options: WatchOptions) -> GeoWatch {
        let (feed, mut watch) = GeoWatch::channel();
        let source = Arc::clone(&self.source);
        let interval = self.interval;

        let task = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
            loop {
                ticker.tick().await;
                let event = {
                    let mut source = source.lock().await;
                    match tokio::time::timeout(options.timeout, source.read_position(&options))
                        .await
                    {
                        Ok(event) => event,
                        Err(_) => Err(GeoError::Timeout),
                    }
                };
                if let Err(e) = &event {
                    warn!("Geolocation error: {}", e);
                }
                if !feed.push(event) {
                    debug!("Geolocation watch closed");
                    break;
                }
            }
        });

        watch.task = Some(task);
        watch
    }
}

/// Always reports the same position.
#[derive(Debug, Clone, Copy)]
pub struct FixedPosition(pub Coordinates);

#[async_trait]
impl PositionSource for FixedPosition {
    async fn read_position(&mut self, _options: &WatchOptions) -> GeoEvent {
        Ok(self.0)
    }
}

/// Always fails with the same error. Stands in for hosts without positioning.
#[derive(Debug, Clone)]
pub struct Unavailable(pub GeoError);

#[async_trait]
impl PositionSource for Unavailable {
    async fn read_position(&mut self, _options: &WatchOptions) -> GeoEvent {
        Err(self.0.clone())
    }
}

/// Replays a recorded track, then stays on its last point.
#[derive(Debug, Clone)]
pub struct TrackReplay {
    points: Vec<Coordinates>,
    next: usize,
}

impl TrackReplay {
    pub fn new(points: Vec<Coordinates>) -> Self {
        Self { points, next: 0 }
    }

    /// One `LAT,LON` per line; blank lines and `#` comments are skipped.
    pub fn parse(text: &str) -> Result<Self, String> {
        let mut points = Vec::new();
        for (idx, line) in text.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let point = line
                .parse::<Coordinates>()
                .map_err(|e| format!("line {}: {}", idx + 1, e))?;
            points.push(point);
        }
        Ok(Self::new(points))
    }

    pub fn load(path: &Path) -> Result<Self, String> {
        let text = std::fs::read_to_string(path)
            .map_err(|e| format!("failed to read {}: {}", path.display(), e))?;
        Self::parse(&text)
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}

#[async_trait]
impl PositionSource for TrackReplay {
    async fn read_position(&mut self, _options: &WatchOptions) -> GeoEvent {
        let Some(last) = self.points.len().checked_sub(1) else {
            return Err(GeoError::PositionUnavailable);
        };
        let point = self.points[self.next.min(last)];
        self.next = (self.next + 1).min(last);
        Ok(point)
    }
}
