//! Signing credential for republishing the recovered contact list.
//!
//! The secret key is only needed when the run should publish. It is held as
//! raw bytes that are zeroized on drop, and the secp256k1 keypair is rebuilt
//! for each signature rather than kept around.

use std::sync::LazyLock;

use nostr::prelude::{Keys, PublicKey};
use nostr::secp256k1::{Keypair, Message, Secp256k1, SecretKey};
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::protocol::error::{NostrError, Result};

/// Global secp256k1 context for signing and verification.
///
/// Building a context precomputes tables, so one shared instance is reused.
pub static SECP: LazyLock<Secp256k1<nostr::secp256k1::All>> = LazyLock::new(Secp256k1::new);

/// The user's secret key, used to sign the reconstructed event.
///
/// # Example
///
/// ```
/// use contacts_recovery::protocol::SigningKey;
///
/// let key = SigningKey::parse(
///     "0000000000000000000000000000000000000000000000000000000000000003",
/// )
/// .unwrap();
/// assert_eq!(key.pubkey_hex().len(), 64);
/// ```
#[derive(ZeroizeOnDrop)]
pub struct SigningKey {
    /// The secret key bytes (zeroized on drop).
    secret_bytes: [u8; 32],

    /// Cached public key bytes.
    #[zeroize(skip)]
    pubkey_bytes: [u8; 32],
}

impl SigningKey {
    /// Parses a secret key given as `nsec1…` or 64-character hex.
    ///
    /// # Errors
    ///
    /// Returns [`NostrError::InvalidSecretKey`] if the input is neither.
    pub fn parse(secret: &str) -> Result<Self> {
        let keys =
            Keys::parse(secret.trim()).map_err(|e| NostrError::InvalidSecretKey(e.to_string()))?;

        Ok(Self {
            secret_bytes: keys.secret_key().secret_bytes(),
            pubkey_bytes: keys.public_key().to_bytes(),
        })
    }

    /// Returns the public key belonging to this secret key.
    ///
    /// # Errors
    ///
    /// Returns an error if the cached bytes are not a valid x-only key.
    pub fn public_key(&self) -> Result<PublicKey> {
        PublicKey::from_slice(&self.pubkey_bytes)
            .map_err(|e| NostrError::InvalidSecretKey(e.to_string()))
    }

    /// Returns the public key as a 64-character hex string.
    #[must_use]
    pub fn pubkey_hex(&self) -> String {
        hex::encode(self.pubkey_bytes)
    }

    /// Signs a 32-byte event id with a BIP-340 Schnorr signature.
    ///
    /// Returns the 64-byte signature hex-encoded.
    ///
    /// # Errors
    ///
    /// Returns an error if the stored secret cannot be rebuilt into a key.
    pub fn sign(&self, message_hash: &[u8; 32]) -> Result<String> {
        let mut secret_bytes_copy = self.secret_bytes;

        let result = (|| {
            let secret_key = SecretKey::from_slice(&secret_bytes_copy)
                .map_err(|e| NostrError::Signing(e.to_string()))?;
            let keypair = Keypair::from_secret_key(&SECP, &secret_key);
            let message = Message::from_digest(*message_hash);
            let signature = SECP.sign_schnorr(&message, &keypair);
            Ok(hex::encode(signature.serialize()))
        })();

        secret_bytes_copy.zeroize();

        result
    }
}

impl std::fmt::Debug for SigningKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Never print the secret key
        f.debug_struct("SigningKey")
            .field("pubkey", &self.pubkey_hex())
            .finish()
    }
}
