//! Folding of contact-list observations into the merged state.

use indexmap::IndexMap;
use nostr::PublicKey;

use super::types::{ContactListSnapshot, FollowEntry, FollowSet, RelayCapability, RelayDirectory};
use crate::protocol::TagBuilder;

/// What one observation contributed, for progress logging.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ApplyOutcome {
    /// `p` tags carrying a valid public key.
    pub tags_seen: usize,

    /// Identities not seen before this observation.
    pub added: usize,

    /// Relays declared for the first time by this observation.
    pub relays_added: usize,
}

/// Accumulates follows and relay declarations across every copy of a
/// contact list, in whatever order the copies arrive.
///
/// Two independent policies apply:
///
/// - relay hints: the hint from the newest event wins, except that an
///   identity without any hint adopts the first hint it is offered
///   regardless of timestamp;
/// - relay capabilities: the first declaration of a relay wins and is never
///   overwritten.
///
/// # Example
///
/// ```
/// use contacts_recovery::merge::{ContactListSnapshot, MergeEngine};
///
/// let followed = "7e7e9c42a91bfef19fa929e5fda1b72e0ebc1a4c1141673e2794234d86addf4e";
/// let mut engine = MergeEngine::new();
/// let outcome = engine.apply(&ContactListSnapshot {
///     created_at: 10,
///     tags: vec![vec!["p".into(), followed.into(), "wss://a".into()]],
///     content: String::new(),
/// });
///
/// assert_eq!(outcome.added, 1);
/// assert_eq!(engine.follows().len(), 1);
/// ```
#[derive(Debug, Clone, Default)]
pub struct MergeEngine {
    follows: FollowSet,
    directory: RelayDirectory,
}

impl MergeEngine {
    /// Creates an engine with empty accumulators.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Folds one observation into the accumulators.
    pub fn apply(&mut self, snapshot: &ContactListSnapshot) -> ApplyOutcome {
        let mut outcome = ApplyOutcome {
            relays_added: self.merge_content(&snapshot.content),
            ..ApplyOutcome::default()
        };

        for tag in &snapshot.tags {
            let Some((pubkey_hex, relay_hint)) = TagBuilder::parse_p_tag(tag) else {
                continue;
            };
            let Ok(pubkey) = PublicKey::from_hex(pubkey_hex) else {
                tracing::debug!(pubkey = pubkey_hex, "skipping p tag with invalid public key");
                continue;
            };

            outcome.tags_seen += 1;
            if self.merge_follow(pubkey, relay_hint, snapshot.created_at) {
                outcome.added += 1;
            }
        }

        outcome
    }

    /// Merged follows so far.
    #[must_use]
    pub const fn follows(&self) -> &FollowSet {
        &self.follows
    }

    /// Merged relay declarations so far.
    #[must_use]
    pub const fn directory(&self) -> &RelayDirectory {
        &self.directory
    }

    /// Consumes the engine, returning the accumulators.
    #[must_use]
    pub fn into_parts(self) -> (FollowSet, RelayDirectory) {
        (self.follows, self.directory)
    }

    /// Applies the relay-directory policy. Returns how many relays were new.
    fn merge_content(&mut self, content: &str) -> usize {
        if content.trim().is_empty() {
            return 0;
        }

        let declared: IndexMap<String, serde_json::Value> = match serde_json::from_str(content) {
            Ok(map) => map,
            Err(e) => {
                tracing::debug!(error = %e, "ignoring contact list content that is not a relay map");
                return 0;
            }
        };

        let mut added = 0;
        for (relay, value) in declared {
            let capability = match serde_json::from_value::<RelayCapability>(value) {
                Ok(capability) => capability,
                Err(e) => {
                    tracing::debug!(relay = %relay, error = %e, "ignoring malformed relay entry");
                    continue;
                }
            };
            if self.directory.declare(&relay, capability) {
                added += 1;
            }
        }
        added
    }

    /// Applies the relay-hint policy. Returns `true` if the identity is new.
    fn merge_follow(&mut self, pubkey: PublicKey, relay_hint: Option<&str>, created_at: u64) -> bool {
        let Some(entry) = self.follows.get_mut(&pubkey) else {
            self.follows
                .insert(FollowEntry::new(pubkey, relay_hint, created_at));
            return true;
        };

        let Some(hint) = relay_hint else {
            return false;
        };

        let newer = match (&entry.relay_hint, entry.hint_timestamp) {
            (None, _) => true,
            (Some(_), Some(stored)) => created_at > stored,
            (Some(_), None) => false,
        };

        if newer {
            entry.relay_hint = Some(hint.to_string());
            entry.hint_timestamp = Some(created_at);
        }

        false
    }
}
