//! HallNav command-line client
//!
//! - **scan**: recognize a lecture hall from a photo and show its details
//! - **info**: look up a hall in the directory
//! - **navigate**: locate yourself on campus and get directions
//! - **admin**: maintain the hall directory

use anyhow::Result;
use clap::{Parser, Subcommand};
use hallnav::AppConfig;
use hallnav_logging::{init_logging, LogConfig};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::debug;

mod cli;

#[derive(Parser, Debug)]
#[command(name = "hallnav", about = "Lecture hall recognition and campus navigation")]
struct Cli {
    /// Enable verbose logging (info/debug to stderr)
    #[arg(short = 'v', long, global = true)]
    verbose: bool,

    /// Config file (default: ~/.hallnav/config.toml)
    #[arg(long, global = true, env = "HALLNAV_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Recognize a hall from a photo
    Scan {
        /// Photo of the hall (JPEG, PNG, WebP, GIF, BMP)
        image: PathBuf,

        /// Output as JSON
        #[arg(long)]
        json: bool,

        /// Continue to navigation after a successful scan
        #[arg(long)]
        navigate: bool,
    },

    /// Show details for a hall
    Info {
        /// Hall identifier, e.g. LT1
        #[arg(long)]
        hall: String,

        /// Schedule text to display, e.g. "Mon 10-12 CS101; Tue 14-16"
        #[arg(long)]
        schedule: Option<String>,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Find your way around campus
    Navigate {
        /// Preselect a destination by id or name
        #[arg(long)]
        hall: Option<String>,

        /// Current position as LAT,LON
        #[arg(long, conflicts_with = "track")]
        from: Option<String>,

        /// Replay positions from a file (one LAT,LON per line)
        #[arg(long)]
        track: Option<PathBuf>,

        /// Search campus locations
        #[arg(long)]
        search: Option<String>,

        /// Request walking directions to the destination
        #[arg(long)]
        directions: bool,

        /// Describe the destination
        #[arg(long)]
        about: bool,

        /// Keep printing position updates until Ctrl-C
        #[arg(long)]
        follow: bool,

        /// Write the rendered map layers as GeoJSON
        #[arg(long)]
        geojson: Option<PathBuf>,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Maintain the hall directory
    Admin {
        #[command(subcommand)]
        action: cli::admin::AdminAction,
    },

    /// Sign in (not enforced)
    Login {
        #[arg(long)]
        username: Option<String>,
    },

    /// Show the resolved configuration
    Config {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    if let Err(err) = init_logging(LogConfig {
        app_name: "hallnav",
        verbose: cli.verbose,
        log_dir: None,
    }) {
        eprintln!("Warning: failed to initialize logging: {:#}", err);
    }

    match run_command(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("{:?}", err);
            ExitCode::from(1)
        }
    }
}

async fn run_command(cli: Cli) -> Result<()> {
    let config = AppConfig::resolve(cli.config.as_deref())?;
    debug!("Recognition service at {}", config.api.base_url);

    match cli.command {
        Commands::Scan {
            image,
            json,
            navigate,
        } => {
            cli::scan::run(
                cli::scan::ScanArgs {
                    image,
                    json,
                    navigate,
                },
                &config,
            )
            .await
        }
        Commands::Info {
            hall,
            schedule,
            json,
        } => cli::info::run(cli::info::InfoArgs { hall, schedule, json }, &config).await,
        Commands::Navigate {
            hall,
            from,
            track,
            search,
            directions,
            about,
            follow,
            geojson,
            json,
        } => {
            cli::navigate::run(
                cli::navigate::NavigateArgs {
                    hall,
                    from,
                    track,
                    search,
                    directions,
                    about,
                    follow,
                    geojson,
                    json,
                },
                &config,
            )
            .await
        }
        Commands::Admin { action } => cli::admin::run(action, &config).await,
        Commands::Login { username } => cli::login::run(username),
        Commands::Config { json } => cli::config::run(&config, cli.config.as_deref(), json),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_from_conflicts_with_track() {
        let parsed = Cli::try_parse_from([
            "hallnav", "navigate", "--from", "6.67,-1.57", "--track", "walk.txt",
        ]);
        assert!(parsed.is_err());
    }

    #[test]
    fn test_no_camera_command() {
        assert!(Cli::try_parse_from(["hallnav", "camera"]).is_err());
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from(["hallnav", "login", "-v", "--config", "x.toml"]).unwrap();
        assert!(cli.verbose);
        assert_eq!(cli.config, Some(PathBuf::from("x.toml")));
    }
}
