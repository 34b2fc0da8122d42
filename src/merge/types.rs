//! Accumulator types for the contact-list merge.

use indexmap::{IndexMap, IndexSet};
use nostr::{Event, Kind, PublicKey};
use serde::{Deserialize, Serialize};

/// One followed identity and the best relay hint known for it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FollowEntry {
    /// The followed public key.
    pub pubkey: PublicKey,

    /// Preferred relay for reaching this identity, if any observation had one.
    pub relay_hint: Option<String>,

    /// `created_at` of the event that supplied the current hint.
    ///
    /// Only ever set together with `relay_hint`.
    pub hint_timestamp: Option<u64>,
}

impl FollowEntry {
    /// Creates an entry from a first observation.
    #[must_use]
    pub fn new(pubkey: PublicKey, relay_hint: Option<&str>, created_at: u64) -> Self {
        Self {
            pubkey,
            relay_hint: relay_hint.map(str::to_string),
            hint_timestamp: relay_hint.map(|_| created_at),
        }
    }
}

/// A relay's self-declared read/write policy, as found in contact-list content.
///
/// Missing flags deserialize as `false`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelayCapability {
    /// Relay may be read from.
    #[serde(default)]
    pub read: bool,

    /// Relay accepts writes.
    #[serde(default)]
    pub write: bool,
}

impl RelayCapability {
    /// Creates a capability from its two flags.
    #[must_use]
    pub const fn new(read: bool, write: bool) -> Self {
        Self { read, write }
    }
}

/// Followed identities in first-seen order, one entry per identity.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FollowSet {
    entries: IndexMap<PublicKey, FollowEntry>,
}

impl FollowSet {
    /// Creates an empty follow set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of distinct identities.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether no identity has been seen yet.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Looks up the entry for one identity.
    #[must_use]
    pub fn get(&self, pubkey: &PublicKey) -> Option<&FollowEntry> {
        self.entries.get(pubkey)
    }

    /// Iterates entries in first-seen order.
    pub fn iter(&self) -> impl Iterator<Item = &FollowEntry> {
        self.entries.values()
    }

    pub(crate) fn get_mut(&mut self, pubkey: &PublicKey) -> Option<&mut FollowEntry> {
        self.entries.get_mut(pubkey)
    }

    pub(crate) fn insert(&mut self, entry: FollowEntry) {
        self.entries.insert(entry.pubkey, entry);
    }
}

/// Relay address → declared capability, first declaration wins.
///
/// Serializes as a JSON object in first-seen order, which is the format
/// contact-list content uses.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RelayDirectory {
    relays: IndexMap<String, RelayCapability>,
}

impl RelayDirectory {
    /// Creates an empty directory.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of relays declared so far.
    #[must_use]
    pub fn len(&self) -> usize {
        self.relays.len()
    }

    /// Whether no relay has been declared.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.relays.is_empty()
    }

    /// Capability declared for a relay.
    #[must_use]
    pub fn get(&self, relay: &str) -> Option<&RelayCapability> {
        self.relays.get(relay)
    }

    /// Iterates `(relay, capability)` in first-seen order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &RelayCapability)> {
        self.relays.iter().map(|(url, cap)| (url.as_str(), cap))
    }

    /// Records a declaration unless the relay is already known.
    ///
    /// Returns `true` if the relay was new.
    pub fn declare(&mut self, relay: &str, capability: RelayCapability) -> bool {
        if self.relays.contains_key(relay) {
            return false;
        }
        self.relays.insert(relay.to_string(), capability);
        true
    }
}

impl<S: Into<String>> FromIterator<(S, RelayCapability)> for RelayDirectory {
    fn from_iter<I: IntoIterator<Item = (S, RelayCapability)>>(iter: I) -> Self {
        let mut directory = Self::new();
        for (relay, capability) in iter {
            directory.declare(&relay.into(), capability);
        }
        directory
    }
}

/// Relays that reached the connected state during this run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OpenedRelays {
    relays: IndexSet<String>,
}

impl OpenedRelays {
    /// Creates an empty set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a successful open. Returns `true` the first time.
    pub fn record(&mut self, relay: &str) -> bool {
        self.relays.insert(normalize_relay_url(relay))
    }

    /// Whether the relay was opened, ignoring cosmetic URL differences.
    #[must_use]
    pub fn contains(&self, relay: &str) -> bool {
        self.relays.contains(&normalize_relay_url(relay))
    }

    /// Number of opened relays.
    #[must_use]
    pub fn len(&self) -> usize {
        self.relays.len()
    }

    /// Whether nothing opened.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.relays.is_empty()
    }

    /// Iterates relays in open order.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.relays.iter().map(String::as_str)
    }
}

impl<S: AsRef<str>> FromIterator<S> for OpenedRelays {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        let mut opened = Self::new();
        for relay in iter {
            opened.record(relay.as_ref());
        }
        opened
    }
}

/// Normalizes a relay URL for comparison: trims whitespace and trailing
/// slashes, lowercases the scheme and host.
#[must_use]
pub fn normalize_relay_url(url: &str) -> String {
    let trimmed = url.trim().trim_end_matches('/');

    match trimmed.split_once("://") {
        Some((scheme, rest)) => {
            let (host, path) = rest.find('/').map_or((rest, ""), |i| rest.split_at(i));
            format!(
                "{}://{}{}",
                scheme.to_lowercase(),
                host.to_lowercase(),
                path
            )
        }
        None => trimmed.to_string(),
    }
}

/// The parts of a kind-3 event the merge consumes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContactListSnapshot {
    /// Publish time declared by the event author.
    pub created_at: u64,

    /// Raw tags, `p` tags among them.
    pub tags: Vec<Vec<String>>,

    /// Content, a JSON relay directory or empty.
    pub content: String,
}

impl ContactListSnapshot {
    /// Extracts a snapshot from a relay event if it is a contact list.
    #[must_use]
    pub fn from_event(event: &Event) -> Option<Self> {
        if event.kind != Kind::ContactList {
            return None;
        }

        Some(Self {
            created_at: event.created_at.as_secs(),
            tags: event.tags.iter().map(|tag| tag.as_slice().to_vec()).collect(),
            content: event.content.clone(),
        })
    }
}

/// Accumulators frozen at the end of the collection window.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MergedState {
    /// Merged follows.
    pub follows: FollowSet,

    /// Merged relay declarations.
    pub directory: RelayDirectory,

    /// Relays reachable during this run.
    pub opened: OpenedRelays,
}
