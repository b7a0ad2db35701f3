use std::fs;
use std::path::Path;
use std::time::Duration;

use scout_core::DEFAULT_MODEL;
use scout_engine::{ClientSettings, DEFAULT_BASE_URL};
use scout_logging::{scout_info, scout_warn};
use serde::{Deserialize, Serialize};

pub const DEFAULT_CONFIG_FILE: &str = "scout.ron";

/// Contents of `scout.ron`. Every field is optional in the file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub base_url: String,
    pub connect_timeout_secs: u64,
    pub request_timeout_secs: u64,
    pub poll_interval_ms: u64,
    pub progress_interval_ms: u64,
    pub simulate_progress: bool,
    pub max_poll_errors: Option<u32>,
    pub default_model: String,
    pub api_key: Option<String>,
}

impl Default for AppConfig {
    fn default() -> Self {
        let settings = ClientSettings::default();
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            connect_timeout_secs: settings.connect_timeout.as_secs(),
            request_timeout_secs: settings.request_timeout.as_secs(),
            poll_interval_ms: millis(settings.poll_interval),
            progress_interval_ms: millis(settings.progress_interval),
            simulate_progress: settings.simulate_progress,
            max_poll_errors: settings.max_poll_errors,
            default_model: DEFAULT_MODEL.to_string(),
            api_key: None,
        }
    }
}

impl AppConfig {
    pub fn client_settings(&self) -> ClientSettings {
        ClientSettings {
            base_url: self.base_url.clone(),
            connect_timeout: Duration::from_secs(self.connect_timeout_secs),
            request_timeout: Duration::from_secs(self.request_timeout_secs),
            // A zero period would make the interval timers panic.
            poll_interval: Duration::from_millis(self.poll_interval_ms.max(1)),
            progress_interval: Duration::from_millis(self.progress_interval_ms.max(1)),
            simulate_progress: self.simulate_progress,
            max_poll_errors: self.max_poll_errors,
        }
    }
}

fn millis(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

/// Reads the config file. A missing file means defaults; a broken one is
/// reported and also yields defaults.
pub fn load_config(path: &Path) -> AppConfig {
    let content = match fs::read_to_string(path) {
        Ok(text) => text,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            return AppConfig::default();
        }
        Err(err) => {
            scout_warn!("Failed to read config from {:?}: {}", path, err);
            return AppConfig::default();
        }
    };

    match ron::from_str(&content) {
        Ok(config) => {
            scout_info!("Loaded config from {:?}", path);
            config
        }
        Err(err) => {
            scout_warn!("Failed to parse config from {:?}: {}", path, err);
            AppConfig::default()
        }
    }
}
