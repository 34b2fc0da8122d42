//! Error types for relay operations.
//!
//! None of these abort a run: a relay that errors is logged and excluded.

use thiserror::Error;

/// Errors that can occur during relay communication.
#[derive(Debug, Error)]
pub enum RelayError {
    /// Connection to relay failed.
    #[error("Failed to connect to relay {url}: {reason}")]
    Connection {
        /// The relay URL that failed.
        url: String,
        /// The reason for the failure.
        reason: String,
    },

    /// Event publishing failed.
    #[error("Failed to publish event: {0}")]
    Publish(String),

    /// Invalid relay URL.
    #[error("Invalid relay URL: {0}")]
    InvalidUrl(String),

    /// Subscription failed.
    #[error("Subscription failed: {0}")]
    Subscription(String),

    /// Relay rejected the event.
    #[error("Relay {relay} rejected event: {reason}")]
    Rejected {
        /// The relay that rejected the event.
        relay: String,
        /// The rejection reason.
        reason: String,
    },

    /// The relay is not (or no longer) connected.
    #[error("Relay {0} is not connected")]
    NotConnected(String),
}

/// Result type for relay operations.
pub type RelayResult<T> = Result<T, RelayError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn connection_error_display() {
        let error = RelayError::Connection {
            url: "wss://relay.example.com".to_string(),
            reason: "connection refused".to_string(),
        };
        assert_eq!(
            error.to_string(),
            "Failed to connect to relay wss://relay.example.com: connection refused"
        );
    }

    #[test]
    fn publish_error_display() {
        let error = RelayError::Publish("rate limited".to_string());
        assert_eq!(error.to_string(), "Failed to publish event: rate limited");
    }

    #[test]
    fn invalid_url_error_display() {
        let error = RelayError::InvalidUrl("not-a-url".to_string());
        assert_eq!(error.to_string(), "Invalid relay URL: not-a-url");
    }

    #[test]
    fn subscription_error_display() {
        let error = RelayError::Subscription("filter too broad".to_string());
        assert_eq!(error.to_string(), "Subscription failed: filter too broad");
    }

    #[test]
    fn rejected_error_display() {
        let error = RelayError::Rejected {
            relay: "wss://relay.example.com".to_string(),
            reason: "blocked".to_string(),
        };
        assert_eq!(
            error.to_string(),
            "Relay wss://relay.example.com rejected event: blocked"
        );
    }

    #[test]
    fn not_connected_error_display() {
        let error = RelayError::NotConnected("wss://gone.example.com".to_string());
        assert_eq!(
            error.to_string(),
            "Relay wss://gone.example.com is not connected"
        );
    }
}
