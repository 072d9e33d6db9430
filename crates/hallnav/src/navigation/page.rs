//! Navigation page event loop.
//!
//! One task owns the [`NavigationSession`] and multiplexes three inputs:
//! the map toolkit load, geolocation events and UI commands. Commands that
//! need the toolkit are held until it is ready and then replayed in order.

use super::geolocation::{GeoWatch, GeolocationProvider, WatchOptions};
use super::loader::MapRuntime;
use super::map::MapToolkit;
use super::session::{NavigationSession, SessionView};
use hallnav_protocol::CampusLocation;
use std::sync::Arc;
use tokio::sync::{mpsc, watch};
use tracing::{debug, info, warn};

pub const MAP_UNAVAILABLE_MESSAGE: &str = "The map could not be loaded. Please try again later.";
pub const DIRECTIONS_DROPPED_MESSAGE: &str =
    "The map was still loading, so directions were not calculated. Please try again.";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NavCommand {
    Search(String),
    /// Select a destination by id or name.
    Select(String),
    GetDirections,
    LearnAbout,
    /// The viewport changed size.
    Resize,
    Close,
}

pub struct NavigationPage {
    session: NavigationSession,
    runtime: Arc<MapRuntime>,
    watch: GeoWatch,
    toolkit: Option<Arc<dyn MapToolkit>>,
    deferred: Vec<NavCommand>,
    map_failed: bool,
    view_tx: watch::Sender<SessionView>,
}

impl NavigationPage {
    /// Open the page: start the position watch and preselect `hall`.
    pub fn open(
        hall: Option<&str>,
        locations: Vec<CampusLocation>,
        runtime: Arc<MapRuntime>,
        geolocation: &dyn GeolocationProvider,
    ) -> Self {
        let session = NavigationSession::new(locations).with_hall(hall);
        let watch = geolocation.watch(WatchOptions::default());
        let (view_tx, _) = watch::channel(session.view());
        Self {
            session,
            runtime,
            watch,
            toolkit: None,
            deferred: Vec::new(),
            map_failed: false,
            view_tx,
        }
    }

    /// Follow what the page displays.
    pub fn subscribe(&self) -> watch::Receiver<SessionView> {
        self.view_tx.subscribe()
    }

    /// Run until [`NavCommand::Close`] or until every command sender is gone.
    /// The position watch and the command channel are torn down on return.
    pub async fn run(mut self, mut commands: mpsc::Receiver<NavCommand>) -> NavigationSession {
        let runtime = Arc::clone(&self.runtime);
        let load = runtime.ensure_ready();
        tokio::pin!(load);
        let mut loading = true;
        let mut watching = true;

        loop {
            tokio::select! {
                loaded = &mut load, if loading => {
                    loading = false;
                    match loaded {
                        Ok(toolkit) => {
                            self.session.attach_map(toolkit.as_ref());
                            self.toolkit = Some(toolkit);
                            for cmd in std::mem::take(&mut self.deferred) {
                                debug!("Replaying deferred {:?}", cmd);
                                self.handle(cmd).await;
                            }
                        }
                        Err(e) => {
                            warn!("Navigation without a map: {}", e);
                            self.deferred.clear();
                            self.map_failed = true;
                            self.session.set_advisory(MAP_UNAVAILABLE_MESSAGE);
                        }
                    }
                }
                event = self.watch.next(), if watching => match event {
                    Some(Ok(fix)) => self.session.apply_fix(fix),
                    Some(Err(e)) => self.session.apply_geo_error(&e),
                    None => {
                        debug!("Position watch ended");
                        watching = false;
                    }
                },
                cmd = commands.recv() => match cmd {
                    None | Some(NavCommand::Close) => break,
                    Some(cmd) => self.handle(cmd).await,
                },
            }
            self.view_tx.send_replace(self.session.view());
        }

        if !self.deferred.is_empty() {
            warn!(
                "Closing before the map was ready; dropping {} deferred command(s)",
                self.deferred.len()
            );
            self.deferred.clear();
            self.session.set_advisory(DIRECTIONS_DROPPED_MESSAGE);
            self.view_tx.send_replace(self.session.view());
        }

        info!("Navigation page closed");
        commands.close();
        let NavigationPage { session, .. } = self;
        session
    }

    async fn handle(&mut self, cmd: NavCommand) {
        match cmd {
            NavCommand::Search(query) => {
                let n = self.session.search(&query).len();
                debug!("Search '{}': {} results", query, n);
            }
            NavCommand::Select(hall) => {
                if !self.session.select(&hall) {
                    debug!("No campus location matches '{}'", hall);
                }
            }
            NavCommand::GetDirections => match &self.toolkit {
                Some(toolkit) => {
                    let router = toolkit.router();
                    self.session.get_directions(router.as_ref()).await;
                }
                None if self.map_failed => self.session.set_advisory(MAP_UNAVAILABLE_MESSAGE),
                None => self.deferred.push(NavCommand::GetDirections),
            },
            NavCommand::LearnAbout => self.session.learn_about(),
            NavCommand::Resize => self.session.resize(),
            NavCommand::Close => {}
        }
    }
}
