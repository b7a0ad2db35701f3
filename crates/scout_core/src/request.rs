use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::source::SourceSelection;
use crate::template::DEFAULT_MODEL;

/// Rough per-page, per-source scrape cost used for the time estimate.
const SECONDS_PER_PAGE: u64 = 10;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("an API key is required")]
    MissingApiKey,
    #[error("max pages must be at least 1")]
    NoPages,
}

/// Parameters of one scrape job, serialized as the `POST start-scrape` body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScrapeRequest {
    pub target_companies: String,
    pub sources: SourceSelection,
    pub ai_model: String,
    pub api_key: String,
    #[serde(default)]
    pub system_prompt: String,
    pub min_year: i32,
    pub max_pages: u32,
    #[serde(default)]
    pub force_rescan: bool,
}

impl Default for ScrapeRequest {
    fn default() -> Self {
        Self {
            target_companies: "ICEYE".to_string(),
            sources: SourceSelection::default(),
            ai_model: DEFAULT_MODEL.to_string(),
            api_key: String::new(),
            system_prompt: String::new(),
            min_year: 2024,
            max_pages: 1,
            force_rescan: false,
        }
    }
}

impl ScrapeRequest {
    /// Local preconditions; checked before anything touches the network.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.api_key.trim().is_empty() {
            return Err(ValidationError::MissingApiKey);
        }
        if self.max_pages == 0 {
            return Err(ValidationError::NoPages);
        }
        Ok(())
    }

    pub fn estimated_duration(&self) -> Duration {
        Duration::from_secs(
            u64::from(self.max_pages) * SECONDS_PER_PAGE * self.sources.len() as u64,
        )
    }

    pub fn estimated_time_label(&self) -> String {
        format_duration(self.estimated_duration())
    }
}

pub fn format_duration(duration: Duration) -> String {
    let total = duration.as_secs();
    let mins = total / 60;
    if mins > 0 {
        format!("{} min {} sec", mins, total % 60)
    } else {
        format!("{} sec", total)
    }
}
