//! Config command - show the resolved configuration

use crate::cli::output::{print_fields, print_json};
use hallnav::AppConfig;
use hallnav_protocol::paths::{default_config_path, default_logs_dir, hallnav_home};
use std::path::Path;

pub fn run(config: &AppConfig, config_path: Option<&Path>, json: bool) -> anyhow::Result<()> {
    let path = config_path
        .map(Path::to_path_buf)
        .unwrap_or_else(default_config_path);

    if json {
        return print_json(&serde_json::json!({
            "config_path": path,
            "home": hallnav_home(),
            "logs_dir": default_logs_dir(),
            "config": config,
        }));
    }

    let store = match &config.store {
        Some(store) => {
            let root = store.path.clone().unwrap_or_else(hallnav_home);
            format!("{:?} ({})", store.backend, root.display())
        }
        None => "not configured".to_string(),
    };

    let file = if path.exists() {
        path.display().to_string()
    } else {
        format!("{} (missing, using defaults)", path.display())
    };

    print_fields(&[
        ("Config file", file),
        ("Home", hallnav_home().display().to_string()),
        ("Logs", default_logs_dir().display().to_string()),
        ("Recognition API", config.api.base_url.clone()),
        ("Timeout", format!("{} s", config.api.timeout_secs)),
        ("Hall store", store),
        ("Routing", format!("{} ({})", config.routing.service_url, config.routing.profile)),
        ("Position poll", format!("{} ms", config.geolocation.poll_interval_ms)),
    ]);
    Ok(())
}
