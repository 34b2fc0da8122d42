//! Contacts Recovery Library
//!
//! Rebuilds a Nostr contact list (kind 3) from every copy the relays still
//! hold. Relays are queried concurrently for one fixed window, their copies
//! are merged into one follow set and one relay directory, and the result is
//! emitted as a single event, optionally signed and republished to the
//! writable relays that answered.
//!
//! # Modules
//!
//! | Module | Role |
//! |--------|------|
//! | [`protocol`] | identity decoding, signing key, the reconstructed event |
//! | [`merge`] | the merge policies and accumulators |
//! | [`relay`] | the relay connection set |
//! | [`directory`] | candidate relay discovery |
//! | [`recovery`] | the collection window and republishing |

#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![deny(unsafe_code)]

pub mod directory;
mod error;
pub mod merge;
pub mod protocol;
pub mod recovery;
pub mod relay;

pub use error::{RecoveryError, Result};
pub use recovery::{Recovery, RecoveryConfig, RecoveryOutcome};
