//! Concurrent connections to many independent relays.
//!
//! Each relay gets one connection attempt and one subscription. Failures are
//! per relay: a relay that refuses, drops or misbehaves is logged and left
//! out, the rest carry on.
//!
//! # Architecture
//!
//! ```text
//! Aggregator / Publisher
//!     │
//!     ▼
//! RelayTransport (trait)
//!     │
//!     ▼
//! RelayManager
//!     │
//!     ▼
//! nostr-sdk Client (reconnect disabled)
//!     │
//!     ▼
//! Nostr Relays
//! ```
//!
//! # Signals
//!
//! | Signal | Meaning |
//! |--------|---------|
//! | `Opened` | handshake done, subscription issued |
//! | `Event` | a matching event |
//! | `Eose` | end of stored events (informational only) |
//! | `Notice` | `NOTICE`, `CLOSED` or an accepted `OK` |
//! | `Error` | connection failure or rejected `OK` |
//! | `Closed` | connection dropped, relay is out for the run |

mod error;
mod manager;
mod transport;
mod types;

pub use error::{RelayError, RelayResult};
pub use manager::{RelayManager, DEFAULT_CONNECT_TIMEOUT, DEFAULT_PROBE_INTERVAL};
pub use transport::RelayTransport;
pub use types::{RelaySignal, RelayStatus};
