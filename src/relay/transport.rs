//! The capability a relay connection set must provide.

use nostr::{Event, Filter};
use tokio::sync::mpsc;

use super::error::RelayResult;
use super::types::RelaySignal;

/// A set of independent relay connections.
///
/// Implementations connect to each relay once (no reconnection), subscribe
/// with the given filter as soon as a connection opens, and report
/// everything that happens as [`RelaySignal`]s on one channel. A failing
/// relay never affects the others.
///
/// The aggregation loop is generic over this trait so it can run against
/// scripted connections in tests.
#[allow(async_fn_in_trait)]
pub trait RelayTransport {
    /// Starts one connection attempt per relay and returns the signal stream.
    ///
    /// Must not wait for connections to open.
    ///
    /// # Errors
    ///
    /// Returns an error only if the connection set itself cannot be set up;
    /// per-relay problems are reported as [`RelaySignal::Error`].
    async fn open(
        &self,
        relays: &[String],
        filter: Filter,
    ) -> RelayResult<mpsc::Receiver<RelaySignal>>;

    /// Whether the relay is currently connected.
    async fn is_open(&self, relay: &str) -> bool;

    /// Sends an event to one relay, best effort.
    ///
    /// # Errors
    ///
    /// Returns an error if the relay is not connected or refuses the event.
    async fn send(&self, relay: &str, event: &Event) -> RelayResult<()>;

    /// Disconnects every relay.
    async fn shutdown(&self);
}
