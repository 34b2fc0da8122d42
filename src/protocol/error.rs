//! Error types for Nostr identity and event operations.

use thiserror::Error;

/// Errors that can occur while decoding identities or building events.
#[derive(Error, Debug)]
pub enum NostrError {
    /// The target identity is not a valid npub or hex public key.
    #[error("Invalid identity: {0}")]
    InvalidIdentity(String),

    /// The signing credential is not a valid nsec or hex secret key.
    #[error("Invalid secret key: {0}")]
    InvalidSecretKey(String),

    /// Event signing failed.
    #[error("Event signing failed: {0}")]
    Signing(String),

    /// Serialization failed.
    #[error("Serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Invalid event structure or content.
    #[error("Invalid event: {0}")]
    InvalidEvent(String),

    /// Event signature verification failed.
    #[error("Invalid event signature")]
    InvalidSignature,

    /// Hex encoding/decoding error.
    #[error("Hex encoding error: {0}")]
    HexError(String),
}

/// Result type for Nostr operations.
pub type Result<T> = std::result::Result<T, NostrError>;

impl From<hex::FromHexError> for NostrError {
    fn from(e: hex::FromHexError) -> Self {
        Self::HexError(e.to_string())
    }
}
