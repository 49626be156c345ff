//! Error types for citewatch.
//!
//! Every fallible function returns `Result<T, TrackerError>`; errors
//! propagate with `?` and are only turned into an exit code in `main`.

use thiserror::Error;

/// Main error type for citewatch operations.
#[derive(Debug, Error)]
pub enum TrackerError {
    /// Missing or invalid process configuration (e.g. `SERPAPI_KEY` unset)
    #[error("Config error: {0}")]
    Config(String),

    /// Network/HTTP request error
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    /// SerpAPI returned an error payload or a non-success status
    #[error("SerpAPI error: {message}")]
    Api {
        /// HTTP status, when the failure surfaced at the transport layer
        status: Option<u16>,
        /// Error message reported by the API
        message: String,
    },

    /// File I/O error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Email message construction error
    #[error("Mail error: {0}")]
    Mail(#[from] lettre::error::Error),

    /// Malformed sender/recipient address
    #[error("Address error: {0}")]
    Address(#[from] lettre::address::AddressError),

    /// SMTP session or delivery error
    #[error("SMTP error: {0}")]
    Smtp(#[from] lettre::transport::smtp::Error),
}

/// Result type alias using `TrackerError`
pub type Result<T> = std::result::Result<T, TrackerError>;
