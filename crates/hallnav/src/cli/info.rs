//! Info command - show hall details

use crate::cli::output::{print_fields, print_json, print_table};
use hallnav::{AppConfig, HallDirectory, InfoPage, InfoState};
use hallnav_protocol::{RecognitionResult, RecognitionStatus};

#[derive(Debug, Clone)]
pub struct InfoArgs {
    pub hall: String,
    pub schedule: Option<String>,
    pub json: bool,
}

pub async fn run(args: InfoArgs, config: &AppConfig) -> anyhow::Result<()> {
    let state = InfoState {
        result: RecognitionResult {
            hall_id: args.hall,
            confidence: 1.0,
            schedule: args.schedule.unwrap_or_default(),
            status: RecognitionStatus::Success,
        },
        preview: None,
    };
    let directory = HallDirectory::new(config.open_store()?);
    if !directory.is_configured() {
        tracing::warn!("No hall store configured; showing defaults");
    }
    let page = InfoPage::open(Some(state), &directory).await;
    render_info(&page, args.json, false)
}

pub fn render_info(page: &InfoPage, json: bool, show_confidence: bool) -> anyhow::Result<()> {
    let details = page.details();
    if json {
        return print_json(details);
    }

    let mut rows = vec![
        ("Hall", details.name.clone()),
        ("Location", details.location.clone()),
    ];
    if let Some(description) = &details.description {
        rows.push(("Description", description.clone()));
    }
    rows.push(("Capacity", details.capacity.clone()));
    if show_confidence {
        if let Some(confidence) = details.confidence_text() {
            rows.push(("Confidence", confidence));
        }
    }
    rows.push(("Features", details.features.join(", ")));
    print_fields(&rows);

    if details.schedule_entries.is_empty() {
        println!("Schedule: {}", details.schedule);
    } else {
        let rows = details
            .schedule_entries
            .iter()
            .map(|e| vec![e.time_range.clone(), e.course.clone().unwrap_or_default()])
            .collect();
        print_table(&["Time", "Course"], rows);
    }
    Ok(())
}
