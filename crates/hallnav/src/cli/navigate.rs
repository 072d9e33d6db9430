//! Navigate command - locate, pick a destination, get directions

use crate::cli::error::HelpfulError;
use crate::cli::output::{format_duration, print_fields, print_json, print_table};
use hallnav::navigation::{
    FixedPosition, GeoError, HeadlessLoader, HeadlessToolkit, LocationPhase, MapRuntime,
    NavCommand, NavigationPage, OsrmRouter, PollingGeolocation, RoutingService, SessionView,
    TrackReplay, Unavailable,
};
use hallnav::AppConfig;
use hallnav_protocol::{campus_locations, Coordinates};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, info};

#[derive(Debug, Clone, Default)]
pub struct NavigateArgs {
    pub hall: Option<String>,
    pub from: Option<String>,
    pub track: Option<PathBuf>,
    pub search: Option<String>,
    pub directions: bool,
    pub about: bool,
    pub follow: bool,
    pub geojson: Option<PathBuf>,
    pub json: bool,
}

pub async fn run(args: NavigateArgs, config: &AppConfig) -> anyhow::Result<()> {
    let geolocation = match (&args.from, &args.track) {
        (Some(raw), _) => {
            let at: Coordinates = raw
                .parse()
                .map_err(|e| HelpfulError::invalid_coordinates(raw, e))?;
            PollingGeolocation::new(FixedPosition(at), config.poll_interval())
        }
        (None, Some(path)) => {
            let track = TrackReplay::load(path).map_err(|e| {
                HelpfulError::new(format!("Invalid track file: {}", path.display()))
                    .with_context(e)
                    .with_suggestion("TRY: One LAT,LON per line, '#' for comments")
            })?;
            debug!("Replaying {} positions from {}", track.len(), path.display());
            PollingGeolocation::new(track, config.poll_interval())
        }
        (None, None) => PollingGeolocation::new(
            Unavailable(GeoError::Unsupported),
            config.poll_interval(),
        ),
    };

    let router: Arc<dyn RoutingService> = Arc::new(
        OsrmRouter::new(&config.routing.service_url, &config.routing.profile)
            .with_timeout(config.recognition_timeout()),
    );
    let toolkit = Arc::new(HeadlessToolkit::new(router));
    let runtime = Arc::new(MapRuntime::new(Arc::new(HeadlessLoader::new(Arc::clone(
        &toolkit,
    )))));

    let page = NavigationPage::open(args.hall.as_deref(), campus_locations(), runtime, &geolocation);
    let mut view = page.subscribe();
    let (tx, rx) = mpsc::channel(16);
    let handle = tokio::spawn(page.run(rx));

    // First position event (fix or error), bounded by the geolocation timeout.
    let settle = config.geolocation_timeout() + config.poll_interval();
    let settled = matches!(
        tokio::time::timeout(
            settle,
            view.wait_for(|v| v.location != LocationPhase::Initializing && v.map_attached),
        )
        .await,
        Ok(Ok(_))
    );
    if !settled {
        info!("No position within {:?}", settle);
    }

    if let Some(query) = &args.search {
        tx.send(NavCommand::Search(query.clone())).await?;
        if args.hall.is_none() {
            // Pick the best match, as a user would from the result list.
            tx.send(NavCommand::Select(query.clone())).await?;
        }
    }
    if args.directions {
        tx.send(NavCommand::GetDirections).await?;
    }
    if args.about {
        tx.send(NavCommand::LearnAbout).await?;
    }

    if args.follow {
        follow(&mut view).await;
    }
    tx.send(NavCommand::Close).await?;
    let session = handle.await?;
    let final_view = session.view();

    if let Some(path) = &args.geojson {
        let geojson = toolkit.scene().snapshot().to_geojson();
        std::fs::write(path, serde_json::to_string_pretty(&geojson)?)?;
        info!("Wrote map scene to {}", path.display());
    }

    if args.json {
        return print_json(&final_view);
    }
    render_view(&final_view);
    Ok(())
}

/// Print every status change until Ctrl-C.
async fn follow(view: &mut tokio::sync::watch::Receiver<SessionView>) {
    println!("Following position. Press Ctrl-C to stop.");
    loop {
        tokio::select! {
            changed = view.changed() => {
                if changed.is_err() {
                    break;
                }
                let current = view.borrow_and_update().clone();
                println!("{} | {}", current.status, current.distance);
            }
            _ = tokio::signal::ctrl_c() => break,
        }
    }
}

fn render_view(view: &SessionView) {
    let mut rows = vec![("Status", view.status.clone()), ("Distance", view.distance.clone())];
    if let Some(user) = view.user {
        rows.push(("Position", user.to_string()));
    }
    if let Some(dest) = &view.destination {
        rows.push(("Destination", dest.name.clone()));
    }
    if let Some(route) = &view.route {
        rows.push((
            "Route",
            format!(
                "{:.2} km, about {}",
                route.distance_m / 1000.0,
                format_duration(route.duration_s)
            ),
        ));
    }
    print_fields(&rows);

    if !view.search_results.is_empty() {
        let rows = view
            .search_results
            .iter()
            .map(|l| vec![l.id.clone(), l.name.clone()])
            .collect();
        print_table(&["ID", "Location"], rows);
    }

    if !view.directions.is_empty() {
        println!("Route Details");
        for (i, step) in view.directions.iter().enumerate() {
            println!("  {}. {}", i + 1, step);
        }
    }

    if let Some(advisory) = &view.advisory {
        println!();
        println!("{}", advisory);
    }
}
