//! The collection window.
//!
//! Signals from every relay are folded one at a time on a single task, so
//! the accumulators need no locking. The window ends on its deadline only;
//! `EOSE` markers and a quiet channel do not end it early.

use std::time::Duration;

use nostr::{Event, Filter, Kind, PublicKey};
use tokio::sync::mpsc;
use tokio::time::Instant;

use crate::merge::{ContactListSnapshot, MergeEngine, MergedState, OpenedRelays};
use crate::relay::{RelayResult, RelaySignal, RelayTransport};

/// Accumulated state plus the still-live signal stream, handed on to the
/// publisher so relay responses can be observed during the grace period.
#[derive(Debug)]
pub struct Collected {
    /// Accumulators frozen at the deadline.
    pub state: MergedState,

    /// Signals arriving after the deadline.
    pub signals: mpsc::Receiver<RelaySignal>,
}

/// Folds relay signals for one target identity.
#[derive(Debug)]
pub struct Aggregator {
    target: PublicKey,
    engine: MergeEngine,
    opened: OpenedRelays,
}

impl Aggregator {
    /// Creates an aggregator with empty accumulators.
    #[must_use]
    pub fn new(target: PublicKey) -> Self {
        Self {
            target,
            engine: MergeEngine::new(),
            opened: OpenedRelays::new(),
        }
    }

    /// The subscription filter: the target's contact lists.
    #[must_use]
    pub fn filter(&self) -> Filter {
        Filter::new().kind(Kind::ContactList).author(self.target)
    }

    /// Opens every relay and collects until `window` has elapsed.
    ///
    /// # Errors
    ///
    /// Returns an error only if the connection set cannot be opened at all.
    pub async fn run<T: RelayTransport>(
        mut self,
        transport: &T,
        relays: &[String],
        window: Duration,
    ) -> RelayResult<Collected> {
        let deadline = Instant::now() + window;
        let mut signals = transport.open(relays, self.filter()).await?;
        let mut channel_open = true;

        let sleep = tokio::time::sleep_until(deadline);
        tokio::pin!(sleep);

        loop {
            tokio::select! {
                () = &mut sleep => break,
                signal = signals.recv(), if channel_open => match signal {
                    Some(signal) => self.handle(signal),
                    None => channel_open = false,
                },
            }
        }

        Ok(Collected {
            state: self.finish(),
            signals,
        })
    }

    /// Folds one signal.
    pub fn handle(&mut self, signal: RelaySignal) {
        match signal {
            RelaySignal::Opened { relay } => {
                tracing::debug!(relay = %relay, "opened");
                self.opened.record(&relay);
            }
            RelaySignal::Event { relay, event } => self.handle_event(&relay, &event),
            RelaySignal::Eose { relay } => tracing::debug!(relay = %relay, "end of stored events"),
            RelaySignal::Notice { relay, message } => {
                tracing::warn!("Notice {relay}: {message}");
            }
            RelaySignal::Error { relay, error } => tracing::warn!("Error {relay}: {error}"),
            RelaySignal::Closed { relay } => tracing::debug!(relay = %relay, "closed"),
        }
    }

    fn handle_event(&mut self, relay: &str, event: &Event) {
        if event.pubkey != self.target {
            tracing::debug!(relay, author = %event.pubkey, "ignoring event from another author");
            return;
        }
        if event.verify().is_err() {
            tracing::warn!(relay, id = %event.id, "ignoring event with invalid signature");
            return;
        }
        let Some(snapshot) = ContactListSnapshot::from_event(event) else {
            tracing::debug!(relay, kind = %event.kind, "ignoring non contact-list event");
            return;
        };

        let outcome = self.engine.apply(&snapshot);
        tracing::info!(
            "Found {} tags on {relay}, added {}",
            outcome.tags_seen,
            outcome.added
        );
    }

    /// Relays opened so far.
    #[must_use]
    pub const fn opened(&self) -> &OpenedRelays {
        &self.opened
    }

    /// The merge engine, for inspecting progress.
    #[must_use]
    pub const fn engine(&self) -> &MergeEngine {
        &self.engine
    }

    /// Freezes the accumulators.
    #[must_use]
    pub fn finish(self) -> MergedState {
        let (follows, directory) = self.engine.into_parts();
        tracing::info!("Found {} tags", follows.len());
        tracing::info!("Found {} relays", directory.len());

        MergedState {
            follows,
            directory,
            opened: self.opened,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nostr::{EventBuilder, Keys, Tag, Timestamp};

    fn contact_list(author: &Keys, follows: &[PublicKey], content: &str, at: u64) -> Box<Event> {
        let tags = follows.iter().map(|pk| Tag::public_key(*pk));
        Box::new(
            EventBuilder::new(Kind::ContactList, content)
                .tags(tags)
                .custom_created_at(Timestamp::from(at))
                .sign_with_keys(author)
                .unwrap(),
        )
    }

    fn event_signal(relay: &str, event: Box<Event>) -> RelaySignal {
        RelaySignal::Event {
            relay: relay.to_string(),
            event,
        }
    }

    #[test]
    fn filter_targets_contact_lists_of_author() {
        let target = Keys::generate().public_key();
        let filter = Aggregator::new(target).filter();

        assert!(filter.kinds.as_ref().unwrap().contains(&Kind::ContactList));
        assert!(filter.authors.as_ref().unwrap().contains(&target));
    }

    #[test]
    fn opened_signals_are_recorded_once() {
        let mut aggregator = Aggregator::new(Keys::generate().public_key());
        for _ in 0..2 {
            aggregator.handle(RelaySignal::Opened {
                relay: "wss://a".to_string(),
            });
        }
        assert_eq!(aggregator.opened().len(), 1);
    }

    #[test]
    fn events_from_two_relays_are_merged() {
        let author = Keys::generate();
        let alice = Keys::generate().public_key();
        let bob = Keys::generate().public_key();
        let mut aggregator = Aggregator::new(author.public_key());

        aggregator.handle(event_signal("wss://a", contact_list(&author, &[alice], "", 10)));
        aggregator.handle(event_signal("wss://b", contact_list(&author, &[bob, alice], "", 20)));

        assert_eq!(aggregator.engine().follows().len(), 2);
    }

    #[test]
    fn foreign_author_is_ignored() {
        let author = Keys::generate();
        let stranger = Keys::generate();
        let mut aggregator = Aggregator::new(author.public_key());

        aggregator.handle(event_signal(
            "wss://a",
            contact_list(&stranger, &[Keys::generate().public_key()], "", 10),
        ));

        assert!(aggregator.engine().follows().is_empty());
    }

    #[test]
    fn other_kinds_are_ignored() {
        let author = Keys::generate();
        let mut aggregator = Aggregator::new(author.public_key());
        let note = EventBuilder::text_note("hello")
            .tag(Tag::public_key(Keys::generate().public_key()))
            .sign_with_keys(&author)
            .unwrap();

        aggregator.handle(event_signal("wss://a", Box::new(note)));

        assert!(aggregator.engine().follows().is_empty());
    }

    #[test]
    fn notices_errors_and_closes_leave_state_alone() {
        let mut aggregator = Aggregator::new(Keys::generate().public_key());
        aggregator.handle(RelaySignal::Notice {
            relay: "wss://a".to_string(),
            message: "rate limited".to_string(),
        });
        aggregator.handle(RelaySignal::Error {
            relay: "wss://a".to_string(),
            error: "refused".to_string(),
        });
        aggregator.handle(RelaySignal::Eose {
            relay: "wss://a".to_string(),
        });
        aggregator.handle(RelaySignal::Closed {
            relay: "wss://a".to_string(),
        });

        let state = aggregator.finish();
        assert_eq!(state, MergedState::default());
    }

    #[test]
    fn finish_carries_all_accumulators() {
        let author = Keys::generate();
        let alice = Keys::generate().public_key();
        let mut aggregator = Aggregator::new(author.public_key());

        aggregator.handle(RelaySignal::Opened {
            relay: "wss://a".to_string(),
        });
        aggregator.handle(event_signal(
            "wss://a",
            contact_list(
                &author,
                &[alice],
                r#"{"wss://a":{"read":true,"write":true}}"#,
                10,
            ),
        ));

        let state = aggregator.finish();
        assert_eq!(state.follows.len(), 1);
        assert_eq!(state.directory.len(), 1);
        assert!(state.opened.contains("wss://a"));
    }
}
