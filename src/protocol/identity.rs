//! Decoding of the target identity.
//!
//! The identity whose contact list is being recovered may be given either as
//! a NIP-19 `npub1…` string or as the 64-character hex form used on the wire.
//! Anything else is rejected before a single relay is contacted.

use nostr::prelude::{FromBech32, PublicKey};

use crate::protocol::error::{NostrError, Result};

/// Human-readable prefix of a bech32-encoded public key.
pub const NPUB_PREFIX: &str = "npub";

/// Shortest string that can be a complete npub (prefix, separator,
/// 32-byte payload and checksum).
pub const MIN_NPUB_LEN: usize = 60;

/// Decodes the target identity from npub or hex form.
///
/// # Errors
///
/// Returns [`NostrError::InvalidIdentity`] if the input is neither a
/// checksum-valid npub of at least [`MIN_NPUB_LEN`] characters nor a valid
/// hex public key.
///
/// # Example
///
/// ```
/// use contacts_recovery::protocol::decode_identity;
///
/// let pubkey = decode_identity(
///     "npub10elfcs4fr0l0r8af98jlmgdh9c8tcxjvz9qkw038js35mp4dma8qzvjptg",
/// )
/// .unwrap();
/// assert_eq!(
///     pubkey.to_hex(),
///     "7e7e9c42a91bfef19fa929e5fda1b72e0ebc1a4c1141673e2794234d86addf4e"
/// );
/// ```
pub fn decode_identity(input: &str) -> Result<PublicKey> {
    let input = input.trim();

    if input.starts_with(NPUB_PREFIX) {
        return decode_npub(input);
    }

    PublicKey::from_hex(input).map_err(|e| NostrError::InvalidIdentity(format!("{input}: {e}")))
}

/// Decodes a bech32 `npub` string into its public key.
///
/// # Errors
///
/// Returns an error if the prefix is missing, the string is shorter than
/// [`MIN_NPUB_LEN`], or the bech32 checksum does not verify.
pub fn decode_npub(npub: &str) -> Result<PublicKey> {
    if !npub.starts_with(NPUB_PREFIX) || npub.len() < MIN_NPUB_LEN {
        return Err(NostrError::InvalidIdentity(format!(
            "{npub}: not a complete npub"
        )));
    }

    PublicKey::from_bech32(npub).map_err(|e| NostrError::InvalidIdentity(format!("{npub}: {e}")))
}
