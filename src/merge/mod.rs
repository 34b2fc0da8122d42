//! Merge of contact-list copies collected from many relays.
//!
//! Relays do not coordinate, so the same user's contact list arrives as an
//! unordered, duplicated stream of possibly stale revisions. This module
//! folds that stream into one follow set and one relay directory.
//!
//! # Policies
//!
//! | Accumulator | Key | Conflict rule |
//! |-------------|-----|---------------|
//! | [`FollowSet`] | followed pubkey | newest `created_at` wins the relay hint; an entry with no hint adopts the first one offered |
//! | [`RelayDirectory`] | relay URL | first declaration wins |
//!
//! Both rules depend only on the data, never on which relay delivered it
//! first, so the merged result is independent of arrival order up to the
//! declared timestamps.

mod engine;
mod types;

pub use engine::{ApplyOutcome, MergeEngine};
pub use types::{
    normalize_relay_url, ContactListSnapshot, FollowEntry, FollowSet, MergedState, OpenedRelays,
    RelayCapability, RelayDirectory,
};
