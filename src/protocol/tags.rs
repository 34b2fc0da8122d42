//! Tag helpers for contact-list events.
//!
//! A NIP-02 contact list carries one `p` tag per followed identity:
//! `["p", <pubkey hex>, <relay hint>?, <petname>?]`.

/// Name of the tag that references a followed public key.
pub const P_TAG: &str = "p";

/// Builder and reader for contact-list tags.
///
/// # Example
///
/// ```
/// use contacts_recovery::protocol::TagBuilder;
///
/// let tag = TagBuilder::p_tag("abc123", Some("wss://relay.example.com"));
/// assert_eq!(tag, vec!["p", "abc123", "wss://relay.example.com"]);
///
/// let bare = TagBuilder::p_tag("abc123", None);
/// assert_eq!(bare, vec!["p", "abc123"]);
/// ```
pub struct TagBuilder;

impl TagBuilder {
    /// Builds a `p` tag, appending the relay hint only when one is known.
    #[must_use]
    pub fn p_tag(pubkey_hex: &str, relay_hint: Option<&str>) -> Vec<String> {
        let mut tag = vec![P_TAG.to_string(), pubkey_hex.to_string()];
        if let Some(relay) = relay_hint {
            tag.push(relay.to_string());
        }
        tag
    }

    /// Reads a `p` tag into `(pubkey, relay hint)`.
    ///
    /// Returns `None` for tags of any other name and for `p` tags without a
    /// value. An empty relay hint is treated as absent.
    #[must_use]
    pub fn parse_p_tag(tag: &[String]) -> Option<(&str, Option<&str>)> {
        if tag.first().map(String::as_str) != Some(P_TAG) {
            return None;
        }

        let pubkey = tag.get(1).map(String::as_str).filter(|s| !s.is_empty())?;
        let relay_hint = tag.get(2).map(String::as_str).filter(|s| !s.is_empty());

        Some((pubkey, relay_hint))
    }
}
