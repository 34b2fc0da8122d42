//! Nostr primitives the recovery needs: identity decoding, the signing key
//! and the reconstructed kind 3 event.
//!
//! # Architecture
//!
//! ```text
//! "npub1…" / hex ──decode_identity──▶ PublicKey
//!                                         │
//! MergedState ──ContactListEvent::from_merged──▶ unsigned event (id set)
//!                                         │
//!                  SigningKey ──sign──▶ signed event ──▶ relays
//! ```

mod error;
mod event;
mod identity;
mod keys;
mod tags;

pub use error::{NostrError, Result};
pub use event::{ContactListEvent, KIND_CONTACT_LIST};
pub use identity::{decode_identity, decode_npub, MIN_NPUB_LEN, NPUB_PREFIX};
pub use keys::SigningKey;
pub use tags::{TagBuilder, P_TAG};
