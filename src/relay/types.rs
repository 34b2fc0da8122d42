//! Types for relay signals.

use nostr::Event;

/// Something that happened on one relay connection.
///
/// Signals from different relays interleave arbitrarily; signals from one
/// relay arrive in receipt order.
#[derive(Debug, Clone)]
pub enum RelaySignal {
    /// The connection is established and the subscription was issued.
    Opened {
        /// The relay URL.
        relay: String,
    },

    /// An event matching the subscription.
    Event {
        /// The relay that delivered the event.
        relay: String,
        /// The event as received.
        event: Box<Event>,
    },

    /// End of stored events. Not a reliable sign that the relay has sent
    /// every revision it holds.
    Eose {
        /// The relay URL.
        relay: String,
    },

    /// A human-readable message from the relay (`NOTICE`, `CLOSED`, `OK`).
    Notice {
        /// The relay URL.
        relay: String,
        /// The message text.
        message: String,
    },

    /// A connection, protocol or probe failure.
    Error {
        /// The relay URL.
        relay: String,
        /// Description of the failure.
        error: String,
    },

    /// The connection is gone and will not come back this run.
    Closed {
        /// The relay URL.
        relay: String,
    },
}

impl RelaySignal {
    /// The relay this signal came from.
    #[must_use]
    pub fn relay(&self) -> &str {
        match self {
            Self::Opened { relay }
            | Self::Event { relay, .. }
            | Self::Eose { relay }
            | Self::Notice { relay, .. }
            | Self::Error { relay, .. }
            | Self::Closed { relay } => relay,
        }
    }
}

/// Connection status for a relay.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RelayStatus {
    /// Connection attempt in flight.
    Connecting,

    /// Connected and subscribed.
    Connected,

    /// Connection failed or dropped.
    Failed {
        /// The reason for the failure.
        reason: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use nostr::{EventBuilder, Keys};

    #[test]
    fn relay_accessor_covers_every_variant() {
        let event = EventBuilder::text_note("hi")
            .sign_with_keys(&Keys::generate())
            .unwrap();
        let signals = vec![
            RelaySignal::Opened {
                relay: "wss://a".to_string(),
            },
            RelaySignal::Event {
                relay: "wss://a".to_string(),
                event: Box::new(event),
            },
            RelaySignal::Eose {
                relay: "wss://a".to_string(),
            },
            RelaySignal::Notice {
                relay: "wss://a".to_string(),
                message: "hello".to_string(),
            },
            RelaySignal::Error {
                relay: "wss://a".to_string(),
                error: "boom".to_string(),
            },
            RelaySignal::Closed {
                relay: "wss://a".to_string(),
            },
        ];

        for signal in &signals {
            assert_eq!(signal.relay(), "wss://a");
        }
    }

    #[test]
    fn relay_status_variants() {
        assert_eq!(RelayStatus::Connecting, RelayStatus::Connecting);
        assert_eq!(RelayStatus::Connected, RelayStatus::Connected);

        let failed = RelayStatus::Failed {
            reason: "test".to_string(),
        };
        if let RelayStatus::Failed { reason } = failed {
            assert_eq!(reason, "test");
        }
    }
}
