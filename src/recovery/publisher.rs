//! Selective republishing of the signed contact list.

use std::time::Duration;

use indexmap::IndexSet;
use nostr::Event;
use tokio::sync::mpsc;
use tokio::time::Instant;

use crate::merge::{normalize_relay_url, OpenedRelays, RelayDirectory};
use crate::relay::{RelaySignal, RelayTransport};

/// Relays the event should go to: declared writable and opened this run.
///
/// Follows the directory's declaration order. Spellings of one relay that
/// normalize to the same URL yield a single target, the first one declared.
#[must_use]
pub fn publish_targets(opened: &OpenedRelays, directory: &RelayDirectory) -> Vec<String> {
    let mut seen = IndexSet::new();

    directory
        .iter()
        .filter(|(relay, capability)| capability.write && opened.contains(relay))
        .filter(|(relay, _)| seen.insert(normalize_relay_url(relay)))
        .map(|(relay, _)| relay.to_string())
        .collect()
}

/// What happened to each publish target.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PublishReport {
    /// Every target, in send order.
    pub targets: Vec<String>,

    /// Targets the event was handed to.
    pub sent: Vec<String>,

    /// Targets no longer connected at send time.
    pub skipped: Vec<String>,

    /// Targets whose send failed, with the reason.
    pub failed: Vec<(String, String)>,
}

/// Sends one event to a fixed target list, best effort.
pub struct Publisher<'a, T> {
    transport: &'a T,
    grace: Duration,
}

impl<'a, T: RelayTransport> Publisher<'a, T> {
    /// Creates a publisher that waits `grace` after the last send.
    pub const fn new(transport: &'a T, grace: Duration) -> Self {
        Self { transport, grace }
    }

    /// Sends `event` once to each still-connected target, then listens to
    /// `signals` until the grace period ends. Nothing is retried and no
    /// acknowledgement is required.
    pub async fn publish(
        &self,
        event: &Event,
        targets: Vec<String>,
        signals: &mut mpsc::Receiver<RelaySignal>,
    ) -> PublishReport {
        let mut report = PublishReport {
            targets,
            ..PublishReport::default()
        };

        for relay in &report.targets {
            if !self.transport.is_open(relay).await {
                tracing::debug!(relay = %relay, "target no longer connected, skipping");
                report.skipped.push(relay.clone());
                continue;
            }

            tracing::info!("Sending to {relay}");
            match self.transport.send(relay, event).await {
                Ok(()) => report.sent.push(relay.clone()),
                Err(e) => {
                    tracing::warn!(relay = %relay, error = %e, "send failed");
                    report.failed.push((relay.clone(), e.to_string()));
                }
            }
        }

        drain_until(signals, Instant::now() + self.grace).await;
        tracing::info!("finished");

        report
    }
}

/// Logs relay responses until the deadline.
async fn drain_until(signals: &mut mpsc::Receiver<RelaySignal>, deadline: Instant) {
    let sleep = tokio::time::sleep_until(deadline);
    tokio::pin!(sleep);
    let mut channel_open = true;

    loop {
        tokio::select! {
            () = &mut sleep => break,
            signal = signals.recv(), if channel_open => match signal {
                Some(RelaySignal::Notice { relay, message }) => {
                    tracing::info!("Notice {relay}: {message}");
                }
                Some(RelaySignal::Error { relay, error }) => {
                    tracing::warn!("Error {relay}: {error}");
                }
                Some(other) => tracing::debug!(relay = %other.relay(), "ignoring late signal"),
                None => channel_open = false,
            },
        }
    }
}
