//! Error types for the relay directory fetch.
//!
//! Every variant is fatal for a run: without a candidate relay list there is
//! nothing to connect to.

use thiserror::Error;

/// Errors that can occur while fetching the relay directory.
#[derive(Debug, Error)]
pub enum DirectoryError {
    /// The HTTP request could not be made or completed.
    #[error("Directory request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The directory answered with a non-success status.
    #[error("Directory returned status {status} for {url}")]
    Status {
        /// The directory URL.
        url: String,
        /// The HTTP status code.
        status: u16,
    },

    /// The body is not a relay list.
    #[error("Invalid directory body: {0}")]
    Body(#[from] serde_json::Error),

    /// The directory listed no relays.
    #[error("Directory at {0} lists no relays")]
    Empty(String),
}

/// Result type for directory operations.
pub type Result<T> = std::result::Result<T, DirectoryError>;
