//! Lazy, memoized map toolkit loading.

use super::map::MapToolkit;
use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::OnceCell;
use tracing::{info, warn};

#[derive(Debug, Clone, Error)]
#[error("map toolkit failed to load: {0}")]
pub struct LoadError(pub String);

#[async_trait]
pub trait ToolkitLoader: Send + Sync {
    async fn load(&self) -> Result<Arc<dyn MapToolkit>, LoadError>;
}

/// Loads the toolkit at most once per runtime.
///
/// Concurrent and repeated callers of [`ensure_ready`](Self::ensure_ready)
/// share one load. A failed load is not cached; the next caller retries.
pub struct MapRuntime {
    loader: Arc<dyn ToolkitLoader>,
    toolkit: OnceCell<Arc<dyn MapToolkit>>,
}

impl MapRuntime {
    pub fn new(loader: Arc<dyn ToolkitLoader>) -> Self {
        Self {
            loader,
            toolkit: OnceCell::new(),
        }
    }

    pub async fn ensure_ready(&self) -> Result<Arc<dyn MapToolkit>, LoadError> {
        let toolkit = self
            .toolkit
            .get_or_try_init(|| async {
                let toolkit = self.loader.load().await;
                match &toolkit {
                    Ok(_) => info!("Map toolkit ready"),
                    Err(e) => warn!("{}", e),
                }
                toolkit
            })
            .await?;
        Ok(Arc::clone(toolkit))
    }

    pub fn is_ready(&self) -> bool {
        self.toolkit.initialized()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::navigation::routing::{Route, RoutingError, RoutingService};
    use crate::navigation::scene::{HeadlessLoader, HeadlessToolkit};
    use hallnav_protocol::Coordinates;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    struct NoRouter;

    #[async_trait]
    impl RoutingService for NoRouter {
        async fn route(&self, _: Coordinates, _: Coordinates) -> Result<Route, RoutingError> {
            Err(RoutingError::NoRoute)
        }
    }

    #[tokio::test]
    async fn test_concurrent_callers_share_one_load() {
        let loader = Arc::new(HeadlessLoader::new(Arc::new(HeadlessToolkit::new(Arc::new(
            NoRouter,
        )))));
        let runtime = MapRuntime::new(loader.clone());

        let (a, b, c) = tokio::join!(
            runtime.ensure_ready(),
            runtime.ensure_ready(),
            runtime.ensure_ready()
        );
        assert!(a.is_ok() && b.is_ok() && c.is_ok());
        runtime.ensure_ready().await.unwrap();

        assert_eq!(loader.loads(), 1);
        assert!(runtime.is_ready());
    }

    /// Fails the first load, succeeds afterwards.
    struct Flaky {
        attempts: AtomicUsize,
        toolkit: Arc<HeadlessToolkit>,
    }

    #[async_trait]
    impl ToolkitLoader for Flaky {
        async fn load(&self) -> Result<Arc<dyn MapToolkit>, LoadError> {
            tokio::time::sleep(Duration::from_millis(10)).await;
            if self.attempts.fetch_add(1, Ordering::SeqCst) == 0 {
                return Err(LoadError("script blocked".into()));
            }
            let toolkit: Arc<dyn MapToolkit> = self.toolkit.clone();
            Ok(toolkit)
        }
    }

    #[tokio::test]
    async fn test_failed_load_is_retried() {
        let loader = Arc::new(Flaky {
            attempts: AtomicUsize::new(0),
            toolkit: Arc::new(HeadlessToolkit::new(Arc::new(NoRouter))),
        });
        let runtime = MapRuntime::new(loader.clone());

        assert!(runtime.ensure_ready().await.is_err());
        assert!(!runtime.is_ready());
        assert!(runtime.ensure_ready().await.is_ok());
        assert_eq!(loader.attempts.load(Ordering::SeqCst), 2);
    }
}
