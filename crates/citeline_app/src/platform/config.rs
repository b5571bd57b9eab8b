use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use citeline_core::SessionSettings;
use citeline_engine::ClientSettings;
use serde::{Deserialize, Serialize};

use super::logging::LogDestination;

pub const CONFIG_FILENAME: &str = "citeline.ron";
pub const BASE_URL_ENV: &str = "CITELINE_BASE_URL";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub base_url: String,
    /// Turns of history sent with each question.
    pub history_window: usize,
    pub search_max_results: usize,
    pub connect_timeout_secs: u64,
    pub request_timeout_secs: u64,
    pub log_destination: LogDestination,
}

impl Default for AppConfig {
    fn default() -> Self {
        let client = ClientSettings::default();
        Self {
            base_url: client.base_url,
            history_window: citeline_core::DEFAULT_HISTORY_WINDOW,
            search_max_results: client.search_max_results,
            connect_timeout_secs: client.connect_timeout.as_secs(),
            request_timeout_secs: client.request_timeout.as_secs(),
            log_destination: LogDestination::File,
        }
    }
}

impl AppConfig {
    pub fn client_settings(&self) -> ClientSettings {
        ClientSettings {
            base_url: self.base_url.clone(),
            connect_timeout: Duration::from_secs(self.connect_timeout_secs),
            request_timeout: Duration::from_secs(self.request_timeout_secs),
            search_max_results: self.search_max_results,
            ..ClientSettings::default()
        }
    }

    pub fn session_settings(&self) -> SessionSettings {
        SessionSettings {
            history_window: self.history_window,
        }
    }
}

/// The explicit path if given, else `citeline.ron` in the working directory.
pub fn config_path(explicit: Option<PathBuf>) -> PathBuf {
    explicit.unwrap_or_else(|| PathBuf::from(CONFIG_FILENAME))
}

/// Loads the config file. A missing file gives defaults; an unreadable or
/// invalid one is reported on stderr (logging is not up yet) and also gives
/// defaults.
pub(crate) fn load_config(path: &Path) -> AppConfig {
    let content = match fs::read_to_string(path) {
        Ok(text) => text,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            return AppConfig::default();
        }
        Err(err) => {
            eprintln!("Warning: Failed to read config from {:?}: {}", path, err);
            return AppConfig::default();
        }
    };

    ron::from_str(&content).unwrap_or_else(|err| {
        eprintln!("Warning: Failed to parse config from {:?}: {}", path, err);
        AppConfig::default()
    })
}

/// Applies the base-url environment override.
pub(crate) fn apply_env(mut config: AppConfig, base_url: Option<String>) -> AppConfig {
    if let Some(base_url) = base_url.filter(|url| !url.trim().is_empty()) {
        config.base_url = base_url.trim().to_string();
    }
    config
}

#[cfg(test)]
mod tests {
    use super::{apply_env, load_config, AppConfig};
    use crate::platform::logging::LogDestination;
    use pretty_assertions::assert_eq;

    #[test]
    fn missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = load_config(&dir.path().join("absent.ron"));
        assert_eq!(config, AppConfig::default());
        assert_eq!(config.history_window, 10);
    }

    #[test]
    fn partial_file_keeps_remaining_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("citeline.ron");
        std::fs::write(
            &path,
            r#"(base_url: "http://backend:9000", history_window: 4, log_destination: Both)"#,
        )
        .unwrap();

        let config = load_config(&path);
        assert_eq!(config.base_url, "http://backend:9000");
        assert_eq!(config.history_window, 4);
        assert_eq!(config.log_destination, LogDestination::Both);
        assert_eq!(config.search_max_results, AppConfig::default().search_max_results);
        assert_eq!(config.session_settings().history_window, 4);
    }

    #[test]
    fn invalid_file_falls_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("citeline.ron");
        std::fs::write(&path, "(history_window: \"many\"").unwrap();
        assert_eq!(load_config(&path), AppConfig::default());
    }

    #[test]
    fn env_override_replaces_base_url() {
        let config = apply_env(AppConfig::default(), Some(" http://other:1 ".to_string()));
        assert_eq!(config.base_url, "http://other:1");
        assert_eq!(config.client_settings().base_url, "http://other:1");

        let config = apply_env(AppConfig::default(), Some("  ".to_string()));
        assert_eq!(config.base_url, AppConfig::default().base_url);
    }
}
