//! Process configuration.
//!
//! All environment and identity inputs are read once at startup into a
//! [`Config`] that is passed into each component's constructor, so tests can
//! substitute fixtures instead of touching the process environment.

use crate::error::{Result, TrackerError};
use std::path::PathBuf;

/// Default Google Scholar author identifier
pub const DEFAULT_AUTHOR_ID: &str = "R_1o4RIAAAAJ";

/// Default display name for the tracked author
pub const DEFAULT_AUTHOR_NAME: &str = "Negar Arabzadeh";

/// Fixed notification recipient
pub const DEFAULT_RECIPIENT: &str = "ngr.arabzadeh@gmail.com";

/// Affiliation recorded when the profile response carries none
pub const DEFAULT_AFFILIATION: &str = "UC Berkeley";

/// Default snapshot path, relative to the working directory
pub const DEFAULT_DATA_FILE: &str = "data/citations.json";

/// Default dashboard export path
pub const DEFAULT_DASHBOARD_FILE: &str = "docs/data.json";

/// Resolved process configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Google Scholar author identifier
    pub author_id: String,
    /// Display name used in notifications and the dashboard
    pub author_name: String,
    /// Notification recipient address
    pub recipient: String,
    /// SerpAPI key. Required: the run cannot fetch anything without it.
    pub serpapi_key: String,
    /// SMTP sender address; `None` disables email delivery
    pub sender_email: Option<String>,
    /// SMTP sender password; `None` disables email delivery
    pub sender_password: Option<String>,
    /// Snapshot file path
    pub data_file: PathBuf,
    /// Dashboard export file path
    pub dashboard_file: PathBuf,
    /// CI step-summary file (`GITHUB_STEP_SUMMARY`), appended to when set
    pub step_summary_file: Option<PathBuf>,
}

/// Path/identity overrides supplied by the CLI
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub author_id: Option<String>,
    pub data_file: Option<PathBuf>,
    pub dashboard_file: Option<PathBuf>,
}

impl Config {
    /// Build a config from the process environment plus CLI overrides.
    ///
    /// A missing `SERPAPI_KEY` is a fatal configuration error. Missing
    /// sender credentials are not: they only disable email delivery.
    pub fn from_env(overrides: Overrides) -> Result<Self> {
        Self::from_values(
            env_var("SERPAPI_KEY"),
            env_var("SENDER_EMAIL"),
            env_var("SENDER_PASSWORD"),
            env_var("GITHUB_STEP_SUMMARY"),
            overrides,
        )
    }

    /// Build a config from already-read values. `from_env` delegates here;
    /// tests call it directly.
    pub fn from_values(
        serpapi_key: Option<String>,
        sender_email: Option<String>,
        sender_password: Option<String>,
        step_summary: Option<String>,
        overrides: Overrides,
    ) -> Result<Self> {
        let serpapi_key = serpapi_key.ok_or_else(|| {
            TrackerError::Config("SERPAPI_KEY is not set. Cannot fetch scholar data.".to_string())
        })?;

        Ok(Self {
            author_id: overrides
                .author_id
                .unwrap_or_else(|| DEFAULT_AUTHOR_ID.to_string()),
            author_name: DEFAULT_AUTHOR_NAME.to_string(),
            recipient: DEFAULT_RECIPIENT.to_string(),
            serpapi_key,
            sender_email,
            sender_password,
            data_file: overrides
                .data_file
                .unwrap_or_else(|| PathBuf::from(DEFAULT_DATA_FILE)),
            dashboard_file: overrides
                .dashboard_file
                .unwrap_or_else(|| PathBuf::from(DEFAULT_DASHBOARD_FILE)),
            step_summary_file: step_summary.map(PathBuf::from),
        })
    }

    /// Public profile URL for the tracked author
    pub fn scholar_url(&self) -> String {
        format!(
            "https://scholar.google.com/citations?user={}&hl=en",
            self.author_id
        )
    }

    /// Whether both sender credentials are present
    pub fn mail_enabled(&self) -> bool {
        self.sender_email.is_some() && self.sender_password.is_some()
    }
}

/// Read an environment variable, treating empty values as unset
fn env_var(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.is_empty())
}
