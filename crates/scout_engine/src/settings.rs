use std::time::Duration;

pub const DEFAULT_BASE_URL: &str = "http://127.0.0.1:8000/api/";

#[derive(Debug, Clone, PartialEq)]
pub struct ClientSettings {
    /// Root of the backend API; endpoint paths are joined onto it.
    pub base_url: String,
    pub connect_timeout: Duration,
    pub request_timeout: Duration,
    /// Delay between two status polls of the same job.
    pub poll_interval: Duration,
    /// Tick rate of the cosmetic progress estimate.
    pub progress_interval: Duration,
    /// Turns the cosmetic progress estimate on or off.
    pub simulate_progress: bool,
    /// Consecutive failed polls after which a job is given up.
    /// `None` keeps retrying until a terminal status or cancellation.
    pub max_poll_errors: Option<u32>,
}

impl Default for ClientSettings {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            connect_timeout: Duration::from_secs(10),
            request_timeout: Duration::from_secs(30),
            poll_interval: Duration::from_secs(2),
            progress_interval: Duration::from_millis(800),
            simulate_progress: true,
            max_poll_errors: None,
        }
    }
}

impl ClientSettings {
    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Self::default()
        }
    }
}
