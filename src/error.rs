//! Top-level error type for a recovery run.
//!
//! Only startup problems and local failures end a run; per-relay trouble is
//! logged inside the relay and recovery modules and never surfaces here.

use thiserror::Error;

use crate::directory::DirectoryError;
use crate::protocol::NostrError;
use crate::relay::RelayError;

/// Errors that abort a recovery run.
#[derive(Debug, Error)]
pub enum RecoveryError {
    /// Identity, key or event problem.
    #[error(transparent)]
    Nostr(#[from] NostrError),

    /// The relay connection set could not be used.
    #[error(transparent)]
    Relay(#[from] RelayError),

    /// The candidate relay list could not be fetched.
    #[error(transparent)]
    Directory(#[from] DirectoryError),

    /// The reconstructed event could not be written out.
    #[error("Failed to write event: {0}")]
    Output(#[from] std::io::Error),

    /// No candidate relay to connect to.
    #[error("No candidate relays configured")]
    NoRelays,
}

/// Result type for recovery runs.
pub type Result<T> = std::result::Result<T, RecoveryError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nostr_error_is_transparent() {
        let error = RecoveryError::from(NostrError::InvalidIdentity("npub1short".to_string()));
        assert_eq!(
            error.to_string(),
            NostrError::InvalidIdentity("npub1short".to_string()).to_string()
        );
    }

    #[test]
    fn relay_error_is_transparent() {
        let error = RecoveryError::from(RelayError::NotConnected("wss://a".to_string()));
        assert_eq!(error.to_string(), "Relay wss://a is not connected");
    }

    #[test]
    fn output_error_display() {
        let io = std::io::Error::new(std::io::ErrorKind::BrokenPipe, "pipe closed");
        let error = RecoveryError::from(io);
        assert_eq!(error.to_string(), "Failed to write event: pipe closed");
    }

    #[test]
    fn no_relays_display() {
        assert_eq!(
            RecoveryError::NoRelays.to_string(),
            "No candidate relays configured"
        );
    }
}
