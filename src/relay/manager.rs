//! Relay connection set backed by `nostr-sdk`.
//!
//! Every relay gets exactly one connection attempt. A background task per
//! relay performs the handshake and subscription, a single forwarder turns
//! pool notifications into [`RelaySignal`]s, and a liveness sweep reports
//! connections that have silently dropped.
//!
//! ```text
//! connect task (×N) ──┐
//! pool notifications ─┼──▶ mpsc<RelaySignal> ──▶ aggregation loop
//! liveness sweep ─────┘
//! ```

use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;

use nostr::{Event, Filter, RelayMessage, RelayUrl};
use nostr_sdk::{Client, RelayOptions, RelayPoolNotification};
use tokio::sync::{broadcast, mpsc, Mutex, RwLock};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use super::error::{RelayError, RelayResult};
use super::transport::RelayTransport;
use super::types::{RelaySignal, RelayStatus};

/// Capacity of the signal channel feeding the aggregation loop.
const SIGNAL_CHANNEL_SIZE: usize = 4096;

/// Default time one relay gets to complete its handshake.
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(15);

/// Default interval between liveness sweeps.
pub const DEFAULT_PROBE_INTERVAL: Duration = Duration::from_secs(10);

/// Connections to many relays through one `nostr-sdk` client.
///
/// # Example
///
/// ```rust,ignore
/// use contacts_recovery::relay::{RelayManager, RelayTransport};
///
/// let manager = RelayManager::new();
/// let mut signals = manager.open(&relays, filter).await?;
/// while let Some(signal) = signals.recv().await {
///     println!("{}: {signal:?}", signal.relay());
/// }
/// ```
pub struct RelayManager {
    /// The nostr-sdk client; created without a signer since events are
    /// signed before they reach it.
    client: Client,

    /// Per-relay status, keyed by the parsed URL string.
    statuses: Arc<RwLock<HashMap<String, RelayStatus>>>,

    /// Background tasks, aborted on shutdown.
    tasks: Mutex<Vec<JoinHandle<()>>>,

    probe_interval: Duration,
    connect_timeout: Duration,
}

impl RelayManager {
    /// Creates a manager with default timeouts.
    #[must_use]
    pub fn new() -> Self {
        Self {
            client: Client::default(),
            statuses: Arc::new(RwLock::new(HashMap::new())),
            tasks: Mutex::new(Vec::new()),
            probe_interval: DEFAULT_PROBE_INTERVAL,
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
        }
    }

    /// Sets the interval between liveness sweeps.
    #[must_use]
    pub const fn with_probe_interval(mut self, interval: Duration) -> Self {
        self.probe_interval = interval;
        self
    }

    /// Sets the per-relay handshake timeout.
    #[must_use]
    pub const fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// Parses relay URLs, dropping duplicates.
    ///
    /// Unlike a fail-fast validation, one bad address never rejects the rest:
    /// invalid entries are returned separately so they can be reported.
    fn parse_relay_urls(relays: &[String]) -> (Vec<RelayUrl>, Vec<(String, RelayError)>) {
        let mut seen = HashSet::new();
        let mut urls = Vec::with_capacity(relays.len());
        let mut invalid = Vec::new();

        for relay in relays {
            match RelayUrl::parse(relay.trim()) {
                Ok(url) => {
                    if seen.insert(url.to_string()) {
                        urls.push(url);
                    }
                }
                Err(e) => invalid.push((
                    relay.clone(),
                    RelayError::InvalidUrl(format!("{relay}: {e}")),
                )),
            }
        }

        (urls, invalid)
    }

    fn status_key(relay: &str) -> String {
        RelayUrl::parse(relay.trim()).map_or_else(|_| relay.to_string(), |url| url.to_string())
    }
}

impl Default for RelayManager {
    fn default() -> Self {
        Self::new()
    }
}

impl RelayTransport for RelayManager {
    async fn open(
        &self,
        relays: &[String],
        filter: Filter,
    ) -> RelayResult<mpsc::Receiver<RelaySignal>> {
        let (tx, rx) = mpsc::channel(SIGNAL_CHANNEL_SIZE);
        let (urls, invalid) = Self::parse_relay_urls(relays);
        let mut tasks = Vec::with_capacity(urls.len() + 3);

        if !invalid.is_empty() {
            let tx = tx.clone();
            tasks.push(tokio::spawn(async move {
                for (relay, error) in invalid {
                    let signal = RelaySignal::Error {
                        relay,
                        error: error.to_string(),
                    };
                    if tx.send(signal).await.is_err() {
                        return;
                    }
                }
            }));
        }

        // Subscribe to notifications before any connection can deliver events
        let notifications = self.client.notifications();
        tasks.push(tokio::spawn(forward_notifications(
            notifications,
            tx.clone(),
        )));

        let opts = RelayOptions::new().reconnect(false);

        for url in urls {
            let name = url.to_string();

            if let Err(e) = self.client.pool().add_relay(url.clone(), opts.clone()).await {
                tracing::debug!(relay = %name, error = %e, "failed to add relay");
                let error = RelayError::Connection {
                    url: name.clone(),
                    reason: e.to_string(),
                };
                if tx
                    .send(RelaySignal::Error {
                        relay: name,
                        error: error.to_string(),
                    })
                    .await
                    .is_err()
                {
                    break;
                }
                continue;
            }

            self.statuses
                .write()
                .await
                .insert(name, RelayStatus::Connecting);

            tasks.push(tokio::spawn(connect_and_subscribe(
                self.client.clone(),
                url,
                filter.clone(),
                self.connect_timeout,
                Arc::clone(&self.statuses),
                tx.clone(),
            )));
        }

        tasks.push(tokio::spawn(probe_liveness(
            self.client.clone(),
            Arc::clone(&self.statuses),
            self.probe_interval,
            tx,
        )));

        self.tasks.lock().await.extend(tasks);

        Ok(rx)
    }

    async fn is_open(&self, relay: &str) -> bool {
        let key = Self::status_key(relay);
        matches!(
            self.statuses.read().await.get(&key),
            Some(RelayStatus::Connected)
        )
    }

    async fn send(&self, relay: &str, event: &Event) -> RelayResult<()> {
        let url = RelayUrl::parse(relay.trim())
            .map_err(|e| RelayError::InvalidUrl(format!("{relay}: {e}")))?;

        if !self.is_open(relay).await {
            return Err(RelayError::NotConnected(relay.to_string()));
        }

        let output = self
            .client
            .send_event_to([url], event)
            .await
            .map_err(|e| RelayError::Publish(e.to_string()))?;

        if let Some((url, reason)) = output.failed.into_iter().next() {
            return Err(RelayError::Rejected {
                relay: url.to_string(),
                reason,
            });
        }

        Ok(())
    }

    async fn shutdown(&self) {
        let tasks: Vec<JoinHandle<()>> = self.tasks.lock().await.drain(..).collect();
        for task in tasks {
            task.abort();
        }

        self.client.disconnect().await;
        self.statuses.write().await.clear();
    }
}

/// Performs the single handshake for one relay, then subscribes.
async fn connect_and_subscribe(
    client: Client,
    url: RelayUrl,
    filter: Filter,
    timeout: Duration,
    statuses: Arc<RwLock<HashMap<String, RelayStatus>>>,
    tx: mpsc::Sender<RelaySignal>,
) {
    let name = url.to_string();

    let connected = async {
        let relay = client.relay(url.clone()).await.map_err(|e| e.to_string())?;
        relay.try_connect(timeout).await.map_err(|e| e.to_string())
    }
    .await;

    if let Err(reason) = connected {
        let error = RelayError::Connection {
            url: name.clone(),
            reason: reason.clone(),
        };
        statuses
            .write()
            .await
            .insert(name.clone(), RelayStatus::Failed { reason });
        let _ = tx
            .send(RelaySignal::Error {
                relay: name,
                error: error.to_string(),
            })
            .await;
        return;
    }

    statuses
        .write()
        .await
        .insert(name.clone(), RelayStatus::Connected);
    if tx
        .send(RelaySignal::Opened {
            relay: name.clone(),
        })
        .await
        .is_err()
    {
        return;
    }

    if let Err(e) = client.subscribe_to([url], filter, None).await {
        let error = RelayError::Subscription(format!("{name}: {e}"));
        let _ = tx
            .send(RelaySignal::Error {
                relay: name,
                error: error.to_string(),
            })
            .await;
    }
}

/// Forwards pool notifications until the pool shuts down or the receiver
/// is dropped.
async fn forward_notifications(
    mut notifications: broadcast::Receiver<RelayPoolNotification>,
    tx: mpsc::Sender<RelaySignal>,
) {
    loop {
        let notification = match notifications.recv().await {
            Ok(notification) => notification,
            Err(broadcast::error::RecvError::Lagged(count)) => {
                tracing::warn!(count, "relay notification receiver lagged");
                continue;
            }
            Err(broadcast::error::RecvError::Closed) => break,
        };

        let signal = match notification {
            RelayPoolNotification::Event {
                relay_url, event, ..
            } => Some(RelaySignal::Event {
                relay: relay_url.to_string(),
                event: Box::new((*event).clone()),
            }),
            RelayPoolNotification::Message { relay_url, message } => {
                message_signal(relay_url.to_string(), message)
            }
            RelayPoolNotification::Shutdown => break,
        };

        if let Some(signal) = signal {
            if tx.send(signal).await.is_err() {
                break;
            }
        }
    }
}

/// Maps the relay messages the run cares about to signals.
fn message_signal(relay: String, message: RelayMessage) -> Option<RelaySignal> {
    match message {
        RelayMessage::Notice(text) => Some(RelaySignal::Notice {
            relay,
            message: text.to_string(),
        }),
        RelayMessage::Closed { message, .. } => Some(RelaySignal::Notice {
            relay,
            message: format!("subscription closed: {message}"),
        }),
        RelayMessage::EndOfStoredEvents(_) => Some(RelaySignal::Eose { relay }),
        RelayMessage::Ok {
            event_id,
            status: true,
            ..
        } => Some(RelaySignal::Notice {
            relay,
            message: format!("accepted {event_id}"),
        }),
        RelayMessage::Ok {
            event_id, message, ..
        } => Some(RelaySignal::Error {
            relay,
            error: format!("rejected {event_id}: {message}"),
        }),
        _ => None,
    }
}

/// Periodically checks every connected relay and reports the ones whose
/// connection has dropped. Each relay is reported at most once.
async fn probe_liveness(
    client: Client,
    statuses: Arc<RwLock<HashMap<String, RelayStatus>>>,
    interval: Duration,
    tx: mpsc::Sender<RelaySignal>,
) {
    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    // The first tick completes immediately
    ticker.tick().await;

    loop {
        ticker.tick().await;

        let relays = client.relays().await;
        let mut dropped = Vec::new();
        {
            let mut statuses = statuses.write().await;
            for (url, relay) in &relays {
                let name = url.to_string();
                if statuses.get(&name) == Some(&RelayStatus::Connected) && !relay.is_connected() {
                    statuses.insert(
                        name.clone(),
                        RelayStatus::Failed {
                            reason: "connection dropped".to_string(),
                        },
                    );
                    dropped.push(name);
                }
            }
        }

        for relay in dropped {
            if tx.send(RelaySignal::Closed { relay }).await.is_err() {
                return;
            }
        }
    }
}
