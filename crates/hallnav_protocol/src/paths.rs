use std::path::PathBuf;

/// Resolve the HallNav home directory.
///
/// Priority:
/// 1) HALLNAV_HOME
/// 2) ~/.hallnav
/// 3) ./.hallnav
pub fn hallnav_home() -> PathBuf {
    if let Ok(override_path) = std::env::var("HALLNAV_HOME") {
        return PathBuf::from(override_path);
    }
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".hallnav")
}

/// Default config file: ~/.hallnav/config.toml
pub fn default_config_path() -> PathBuf {
    hallnav_home().join("config.toml")
}

/// Default logs directory: ~/.hallnav/logs
pub fn default_logs_dir() -> PathBuf {
    hallnav_home().join("logs")
}
