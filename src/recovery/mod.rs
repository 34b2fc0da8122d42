//! One recovery run, start to finish.
//!
//! # Architecture
//!
//! ```text
//! decode target ─▶ candidate relays ─▶ Aggregator (window) ─▶ MergedState
//!                  (config or directory)                           │
//!                                                                  ▼
//!                                              ContactListEvent::from_merged
//!                                                                  │
//!                                  no key ◀────────────────────────┴──▶ key
//!                                     │                                 │
//!                              print unsigned                  sign, print, Publisher
//!                                     │                                 │
//!                                     └──────────▶ shutdown ◀───────────┘
//! ```
//!
//! Startup failures (bad identity, bad key, directory fetch) happen before
//! any relay is contacted. Everything after that is best effort.

mod aggregator;
mod config;
mod publisher;

use std::io::Write;

use chrono::Utc;
use nostr::PublicKey;
use tokio::sync::mpsc;

pub use aggregator::{Aggregator, Collected};
pub use config::{RecoveryConfig, DEFAULT_GRACE, DEFAULT_PROBE_INTERVAL, DEFAULT_WINDOW};
pub use publisher::{publish_targets, PublishReport, Publisher};

use crate::directory::{dedup_relays, fetch_relays};
use crate::error::{RecoveryError, Result};
use crate::merge::MergedState;
use crate::protocol::{decode_identity, ContactListEvent, NostrError, SigningKey};
use crate::relay::{RelaySignal, RelayTransport};

/// The result of a completed run.
#[derive(Debug, Clone)]
pub struct RecoveryOutcome {
    /// The reconstructed event, signed when a key was given.
    pub event: ContactListEvent,

    /// The merged accumulators the event was built from.
    pub state: MergedState,

    /// Per-target publish results; `None` for a dry run.
    pub published: Option<PublishReport>,
}

/// Drives a recovery run over a relay transport.
///
/// # Example
///
/// ```rust,ignore
/// use contacts_recovery::recovery::{Recovery, RecoveryConfig};
/// use contacts_recovery::relay::RelayManager;
///
/// let recovery = Recovery::new(RelayManager::new(), RecoveryConfig::default());
/// let outcome = recovery.run("npub1…", None, &mut std::io::stdout()).await?;
/// assert!(!outcome.event.is_signed());
/// ```
pub struct Recovery<T> {
    transport: T,
    config: RecoveryConfig,
}

impl<T: RelayTransport> Recovery<T> {
    /// Creates a runner.
    pub const fn new(transport: T, config: RecoveryConfig) -> Self {
        Self { transport, config }
    }

    /// The underlying transport.
    pub const fn transport(&self) -> &T {
        &self.transport
    }

    /// Runs one collection window, writes the reconstructed event to `out`
    /// as a single JSON line and, when `secret` is given, republishes it.
    ///
    /// # Errors
    ///
    /// Returns an error if the target or secret does not decode, the secret
    /// belongs to someone else, no candidate relays are available, or the
    /// event cannot be built or written. Relay failures are not errors.
    pub async fn run<W: Write>(
        &self,
        target: &str,
        secret: Option<&str>,
        out: &mut W,
    ) -> Result<RecoveryOutcome> {
        let target = decode_identity(target)?;
        let signing_key = secret.map(SigningKey::parse).transpose()?;

        if let Some(key) = &signing_key {
            if key.pubkey_hex() != target.to_hex() {
                return Err(NostrError::Signing(format!(
                    "secret key belongs to {}, not {}",
                    key.pubkey_hex(),
                    target.to_hex()
                ))
                .into());
            }
        }

        let relays = self.candidate_relays().await?;

        tracing::info!("Finding follow lists for {}", target.to_hex());

        let Collected { state, mut signals } = Aggregator::new(target)
            .run(&self.transport, &relays, self.config.window)
            .await?;

        let result = self
            .reconstruct_and_publish(&target, &state, signing_key.as_ref(), &mut signals, out)
            .await;

        self.transport.shutdown().await;

        let (event, published) = result?;
        Ok(RecoveryOutcome {
            event,
            state,
            published,
        })
    }

    /// Builds the event, prints it and, with a key, signs and publishes it.
    async fn reconstruct_and_publish<W: Write>(
        &self,
        target: &PublicKey,
        state: &MergedState,
        signing_key: Option<&SigningKey>,
        signals: &mut mpsc::Receiver<RelaySignal>,
        out: &mut W,
    ) -> Result<(ContactListEvent, Option<PublishReport>)> {
        let event = ContactListEvent::from_merged(target, state, Utc::now().timestamp())?;

        let Some(key) = signing_key else {
            writeln!(out, "{}", event.to_json()?)?;
            return Ok((event, None));
        };

        let event = event.sign(key)?;
        event.verify()?;
        writeln!(out, "{}", event.to_json()?)?;

        let targets = publish_targets(&state.opened, &state.directory);
        let report = Publisher::new(&self.transport, self.config.grace)
            .publish(&event.to_nostr_event()?, targets, signals)
            .await;

        Ok((event, Some(report)))
    }

    async fn candidate_relays(&self) -> Result<Vec<String>> {
        let relays = match &self.config.relays {
            Some(relays) => dedup_relays(relays),
            None => fetch_relays(&self.config.directory_url).await?,
        };

        if relays.is_empty() {
            return Err(RecoveryError::NoRelays);
        }

        tracing::debug!(count = relays.len(), "candidate relays");
        Ok(relays)
    }
}
