//! Admin command - maintain the `halls` collection

use crate::cli::error::HelpfulError;
use crate::cli::output::{print_json, print_table};
use clap::Subcommand;
use hallnav::admin::SeedAction;
use hallnav::{AdminError, AdminPanel, AppConfig, FieldPrompt};
use hallnav_protocol::{HallId, HallRecord};
use std::io::{self, BufRead, Write};
use std::time::Duration;

/// Subcommands for hall maintenance
#[derive(Subcommand, Debug, Clone)]
pub enum AdminAction {
    /// List all halls
    List {
        #[arg(long)]
        json: bool,
    },
    /// Create a hall
    Add {
        #[arg(long)]
        name: String,
        #[arg(long)]
        location: String,
        #[arg(long)]
        description: String,
    },
    /// Edit a hall field by field (blank keeps the current value)
    Edit { id: String },
    /// Delete a hall
    Delete { id: String },
    /// Print the collection every time it changes
    Watch {
        /// How often to look for changes made by other clients
        #[arg(long, default_value = "2")]
        interval_secs: u64,
    },
    /// Create the halls the recognizer knows about
    Seed {
        #[arg(long)]
        json: bool,
    },
}

pub async fn run(action: AdminAction, config: &AppConfig) -> anyhow::Result<()> {
    let mut panel = AdminPanel::new(config.open_store()?);

    match action {
        AdminAction::List { json } => {
            if !panel.sync().await {
                return loading();
            }
            if json {
                return print_json(panel.halls());
            }
            print_halls(panel.halls());
        }
        AdminAction::Add {
            name,
            location,
            description,
        } => {
            let hall = panel
                .create(&name, &location, &description)
                .await
                .map_err(admin_error)?;
            println!("Created hall {} ({})", hall.name, hall.id);
        }
        AdminAction::Edit { id } => {
            panel.sync().await;
            let mut prompt = StdinPrompt;
            match panel
                .edit(&HallId::new(&id), &mut prompt)
                .await
                .map_err(admin_error)?
            {
                Some(hall) => println!("Saved hall {} ({})", hall.name, hall.id),
                None => return Err(HelpfulError::hall_not_found(&id).into()),
            }
        }
        AdminAction::Delete { id } => {
            if !panel.delete(&HallId::new(&id)).await.map_err(admin_error)? {
                return Err(HelpfulError::hall_not_found(&id).into());
            }
            println!("Deleted hall {}", id);
        }
        AdminAction::Watch { interval_secs } => {
            if !panel.sync().await {
                return loading();
            }
            print_halls(panel.halls());
            watch(&mut panel, Duration::from_secs(interval_secs.max(1))).await;
        }
        AdminAction::Seed { json } => {
            let outcomes = panel.seed().await.map_err(admin_error)?;
            if json {
                return print_json(&outcomes);
            }
            let rows = outcomes
                .iter()
                .map(|o| {
                    let action = match o.action {
                        SeedAction::Created => "created",
                        SeedAction::Updated => "updated",
                        SeedAction::Unchanged => "unchanged",
                    };
                    vec![
                        o.name.clone(),
                        o.capacity.to_string(),
                        action.to_string(),
                        o.id.to_string(),
                    ]
                })
                .collect();
            print_table(&["Hall", "Capacity", "Action", "ID"], rows);
        }
    }

    Ok(())
}

async fn watch(panel: &mut AdminPanel, interval: Duration) {
    println!("Watching for changes. Press Ctrl-C to stop.");
    let mut ticker = tokio::time::interval(interval);
    loop {
        tokio::select! {
            synced = panel.sync() => {
                if !synced {
                    break;
                }
                print_halls(panel.halls());
            }
            _ = ticker.tick() => panel.refresh().await,
            _ = tokio::signal::ctrl_c() => break,
        }
    }
}

/// The panel never errors without a store; it just never finishes loading.
fn loading() -> anyhow::Result<()> {
    println!("Loading...");
    eprint!("{}", HelpfulError::store_not_configured());
    Ok(())
}

fn admin_error(err: AdminError) -> anyhow::Error {
    match err {
        AdminError::NotConfigured => HelpfulError::store_not_configured().into(),
        AdminError::Invalid(e) => HelpfulError::new(e.to_string())
            .with_suggestion("TRY: Provide --name, --location and --description")
            .into(),
        AdminError::Store(e) => anyhow::Error::new(e).context("Hall store operation failed"),
    }
}

fn print_halls(halls: &[HallRecord]) {
    if halls.is_empty() {
        println!("No halls yet.");
        return;
    }
    let rows = halls
        .iter()
        .map(|h| {
            vec![
                h.id.to_string(),
                h.name.clone(),
                h.location.clone(),
                h.description.clone(),
                h.capacity.map(|c| c.to_string()).unwrap_or_default(),
            ]
        })
        .collect();
    print_table(&["ID", "Name", "Location", "Description", "Capacity"], rows);
}

/// Reads one line per field from stdin.
struct StdinPrompt;

impl FieldPrompt for StdinPrompt {
    fn prompt(&mut self, label: &str, current: &str) -> Option<String> {
        print!("{} [{}]: ", label, current);
        io::stdout().flush().ok()?;
        let mut line = String::new();
        io::stdin().lock().read_line(&mut line).ok()?;
        Some(line)
    }
}
