//! The reconstructed contact-list event.
//!
//! The merged follow set and relay directory are turned back into a single
//! NIP-02 kind 3 event. The id is computed locally per NIP-01; the signature
//! is added only when a signing key is configured.

use nostr::prelude::{JsonUtil, PublicKey};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;

use crate::merge::MergedState;
use crate::protocol::error::{NostrError, Result};
use crate::protocol::keys::{SigningKey, SECP};
use crate::protocol::tags::TagBuilder;

/// Event kind for contact lists (NIP-02).
pub const KIND_CONTACT_LIST: u16 = 3;

/// A reconstructed contact list in NIP-01 wire form.
///
/// # Structure
///
/// ```json
/// {
///   "id": "...",             // SHA256 of the serialized event
///   "pubkey": "...",         // target identity
///   "created_at": 123456,    // time of reconstruction
///   "kind": 3,
///   "tags": [["p", "...", "wss://..."], ["p", "..."]],
///   "content": "{\"wss://...\":{\"read\":true,\"write\":true}}",
///   "sig": "..."             // only when signed
/// }
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ContactListEvent {
    /// Event ID (32-byte SHA256 hash, hex-encoded).
    pub id: String,

    /// Author public key (hex).
    pub pubkey: String,

    /// Unix timestamp when the event was reconstructed.
    pub created_at: i64,

    /// Always [`KIND_CONTACT_LIST`].
    pub kind: u16,

    /// One `p` tag per followed identity, in first-seen order.
    pub tags: Vec<Vec<String>>,

    /// JSON-serialized relay directory.
    pub content: String,

    /// Schnorr signature (64 bytes, hex-encoded), absent in dry runs.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sig: Option<String>,
}

impl ContactListEvent {
    /// Builds the unsigned event from the merged state.
    ///
    /// # Errors
    ///
    /// Returns an error if the relay directory cannot be serialized.
    pub fn from_merged(pubkey: &PublicKey, state: &MergedState, created_at: i64) -> Result<Self> {
        let tags: Vec<Vec<String>> = state
            .follows
            .iter()
            .map(|entry| TagBuilder::p_tag(&entry.pubkey.to_hex(), entry.relay_hint.as_deref()))
            .collect();

        let content = serde_json::to_string(&state.directory)?;
        let pubkey = pubkey.to_hex();
        let id = Self::calculate_id(&pubkey, created_at, KIND_CONTACT_LIST, &tags, &content)?;

        Ok(Self {
            id,
            pubkey,
            created_at,
            kind: KIND_CONTACT_LIST,
            tags,
            content,
            sig: None,
        })
    }

    /// Signs the event id.
    ///
    /// # Errors
    ///
    /// Returns an error if the key does not belong to the event author or
    /// if signing fails.
    pub fn sign(mut self, key: &SigningKey) -> Result<Self> {
        if key.pubkey_hex() != self.pubkey {
            return Err(NostrError::Signing(format!(
                "key for {} cannot sign an event authored by {}",
                key.pubkey_hex(),
                self.pubkey
            )));
        }

        let id_bytes = Self::id_bytes(&self.id)?;
        self.sig = Some(key.sign(&id_bytes)?);
        Ok(self)
    }

    /// Whether a signature is attached.
    #[must_use]
    pub const fn is_signed(&self) -> bool {
        self.sig.is_some()
    }

    /// Calculates the event ID per NIP-01.
    ///
    /// The ID is the SHA256 hash of the serialized event array:
    /// `[0, pubkey, created_at, kind, tags, content]`
    fn calculate_id(
        pubkey: &str,
        created_at: i64,
        kind: u16,
        tags: &[Vec<String>],
        content: &str,
    ) -> Result<String> {
        let serialized = serde_json::to_string(&(0, pubkey, created_at, kind, tags, content))?;

        let mut hasher = Sha256::new();
        hasher.update(serialized.as_bytes());
        let result = hasher.finalize();

        Ok(hex::encode(result))
    }

    fn id_bytes(id: &str) -> Result<[u8; 32]> {
        hex::decode(id)?
            .try_into()
            .map_err(|_| NostrError::InvalidEvent("Invalid ID length".to_string()))
    }

    /// Serializes this event to JSON.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string(self).map_err(NostrError::from)
    }

    /// Verifies the id and signature.
    ///
    /// # Errors
    ///
    /// Returns an error if the event is unsigned, the id does not match the
    /// content, or the signature is invalid.
    pub fn verify(&self) -> Result<()> {
        use nostr::secp256k1::{schnorr::Signature, Message, XOnlyPublicKey};

        let sig = self
            .sig
            .as_deref()
            .ok_or_else(|| NostrError::InvalidEvent("Event is not signed".to_string()))?;

        let pubkey_bytes: [u8; 32] = hex::decode(&self.pubkey)?
            .try_into()
            .map_err(|_| NostrError::InvalidEvent("Invalid pubkey length".to_string()))?;
        let pubkey = XOnlyPublicKey::from_slice(&pubkey_bytes)
            .map_err(|e| NostrError::InvalidEvent(format!("Invalid pubkey: {e}")))?;

        let sig_bytes: [u8; 64] = hex::decode(sig)?
            .try_into()
            .map_err(|_| NostrError::InvalidEvent("Invalid signature length".to_string()))?;
        let signature = Signature::from_slice(&sig_bytes)
            .map_err(|e| NostrError::InvalidEvent(format!("Invalid signature: {e}")))?;

        let calculated_id = Self::calculate_id(
            &self.pubkey,
            self.created_at,
            self.kind,
            &self.tags,
            &self.content,
        )?;

        if !bool::from(calculated_id.as_bytes().ct_eq(self.id.as_bytes())) {
            return Err(NostrError::InvalidEvent("Event ID mismatch".to_string()));
        }

        let message = Message::from_digest(Self::id_bytes(&self.id)?);

        SECP.verify_schnorr(&signature, &message, &pubkey)
            .map_err(|_| NostrError::InvalidSignature)
    }

    /// Converts a signed event into the `nostr` type relays accept.
    ///
    /// # Errors
    ///
    /// Returns an error if the event is unsigned or does not parse.
    pub fn to_nostr_event(&self) -> Result<nostr::Event> {
        if !self.is_signed() {
            return Err(NostrError::InvalidEvent(
                "Only signed events can be published".to_string(),
            ));
        }

        nostr::Event::from_json(self.to_json()?)
            .map_err(|e| NostrError::InvalidEvent(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::merge::{ContactListSnapshot, MergeEngine, OpenedRelays};
    use nostr::Keys;

    const SECRET_HEX: &str = "0000000000000000000000000000000000000000000000000000000000000003";

    fn author() -> (SigningKey, PublicKey) {
        let key = SigningKey::parse(SECRET_HEX).unwrap();
        let pubkey = key.public_key().unwrap();
        (key, pubkey)
    }

    fn merged_with(follows: &[(PublicKey, Option<&str>)], content: &str) -> MergedState {
        let mut engine = MergeEngine::new();
        engine.apply(&ContactListSnapshot {
            created_at: 1,
            tags: follows
                .iter()
                .map(|(pk, hint)| TagBuilder::p_tag(&pk.to_hex(), *hint))
                .collect(),
            content: content.to_string(),
        });
        let (follows, directory) = engine.into_parts();
        MergedState {
            follows,
            directory,
            opened: OpenedRelays::new(),
        }
    }

    #[test]
    fn from_merged_builds_tags_in_order() {
        let (_, pubkey) = author();
        let alice = Keys::generate().public_key();
        let bob = Keys::generate().public_key();
        let state = merged_with(&[(alice, Some("wss://a")), (bob, None)], "");

        let event = ContactListEvent::from_merged(&pubkey, &state, 1_700_000_000).unwrap();

        assert_eq!(event.kind, KIND_CONTACT_LIST);
        assert_eq!(event.pubkey, pubkey.to_hex());
        assert_eq!(event.created_at, 1_700_000_000);
        assert_eq!(
            event.tags,
            vec![
                vec!["p".to_string(), alice.to_hex(), "wss://a".to_string()],
                vec!["p".to_string(), bob.to_hex()],
            ]
        );
        assert_eq!(event.content, "{}");
        assert!(!event.is_signed());
    }

    #[test]
    fn content_is_relay_directory_json() {
        let (_, pubkey) = author();
        let state = merged_with(&[], r#"{"wss://x":{"read":true,"write":false}}"#);
        let event = ContactListEvent::from_merged(&pubkey, &state, 1).unwrap();
        assert_eq!(event.content, r#"{"wss://x":{"read":true,"write":false}}"#);
    }

    #[test]
    fn id_is_deterministic() {
        let (_, pubkey) = author();
        let alice = Keys::generate().public_key();
        let state = merged_with(&[(alice, None)], "");

        let a = ContactListEvent::from_merged(&pubkey, &state, 42).unwrap();
        let b = ContactListEvent::from_merged(&pubkey, &state, 42).unwrap();
        let c = ContactListEvent::from_merged(&pubkey, &state, 43).unwrap();

        assert_eq!(a.id, b.id);
        assert_ne!(a.id, c.id);
        assert_eq!(a.id.len(), 64);
    }

    #[test]
    fn id_matches_nostr_crate() {
        let (key, pubkey) = author();
        let alice = Keys::generate().public_key();
        let state = merged_with(&[(alice, Some("wss://a"))], r#"{"wss://a":{"read":true,"write":true}}"#);

        let event = ContactListEvent::from_merged(&pubkey, &state, 1_700_000_000)
            .unwrap()
            .sign(&key)
            .unwrap();
        let parsed = event.to_nostr_event().unwrap();

        assert_eq!(parsed.id.to_hex(), event.id);
        assert!(parsed.verify().is_ok());
    }

    #[test]
    fn unsigned_json_omits_sig() {
        let (_, pubkey) = author();
        let event = ContactListEvent::from_merged(&pubkey, &MergedState::default(), 1).unwrap();
        let json = event.to_json().unwrap();
        assert!(json.contains("\"id\""));
        assert!(!json.contains("\"sig\""));
    }

    #[test]
    fn sign_then_verify() {
        let (key, pubkey) = author();
        let event = ContactListEvent::from_merged(&pubkey, &MergedState::default(), 1)
            .unwrap()
            .sign(&key)
            .unwrap();

        assert!(event.is_signed());
        assert_eq!(event.sig.as_ref().unwrap().len(), 128);
        assert!(event.verify().is_ok());
    }

    #[test]
    fn sign_rejects_foreign_key() {
        let (_, pubkey) = author();
        let other = SigningKey::parse(&Keys::generate().secret_key().to_secret_hex()).unwrap();
        let result = ContactListEvent::from_merged(&pubkey, &MergedState::default(), 1)
            .unwrap()
            .sign(&other);
        assert!(matches!(result, Err(NostrError::Signing(_))));
    }

    #[test]
    fn verify_detects_tampered_content() {
        let (key, pubkey) = author();
        let mut event = ContactListEvent::from_merged(&pubkey, &MergedState::default(), 1)
            .unwrap()
            .sign(&key)
            .unwrap();
        event.content = r#"{"wss://evil":{"read":true,"write":true}}"#.to_string();

        assert!(matches!(event.verify(), Err(NostrError::InvalidEvent(_))));
    }

    #[test]
    fn verify_rejects_unsigned() {
        let (_, pubkey) = author();
        let event = ContactListEvent::from_merged(&pubkey, &MergedState::default(), 1).unwrap();
        assert!(event.verify().is_err());
    }

    #[test]
    fn unsigned_event_cannot_become_nostr_event() {
        let (_, pubkey) = author();
        let event = ContactListEvent::from_merged(&pubkey, &MergedState::default(), 1).unwrap();
        assert!(event.to_nostr_event().is_err());
    }
}
