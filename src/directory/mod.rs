//! Candidate relay discovery.
//!
//! One GET against a public relay directory. The body is either
//! `{"relays": ["wss://…", …]}` or a bare array of URLs. Any failure aborts
//! the run; there is no fallback list.

mod error;

use std::time::Duration;

use indexmap::IndexSet;
use serde::Deserialize;

pub use error::{DirectoryError, Result};

/// The public directory used when none is configured.
pub const DEFAULT_DIRECTORY_URL: &str = "https://nostr.watch/relays.json";

/// Upper bound on the whole directory request.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Deserialize)]
#[serde(untagged)]
enum DirectoryBody {
    Wrapped { relays: Vec<String> },
    Bare(Vec<String>),
}

impl DirectoryBody {
    fn into_relays(self) -> Vec<String> {
        match self {
            Self::Wrapped { relays } | Self::Bare(relays) => relays,
        }
    }
}

/// Fetches the candidate relay list.
///
/// Entries are trimmed, blanks dropped and duplicates removed, keeping the
/// directory's order.
///
/// # Errors
///
/// Returns an error if the request fails, the status is not a success, the
/// body is not a relay list or the list is empty.
pub async fn fetch_relays(url: &str) -> Result<Vec<String>> {
    let client = reqwest::Client::builder().timeout(REQUEST_TIMEOUT).build()?;

    let resp = client.get(url).send().await?;
    let status = resp.status();
    if !status.is_success() {
        return Err(DirectoryError::Status {
            url: url.to_string(),
            status: status.as_u16(),
        });
    }

    let bytes = resp.bytes().await?;
    let relays = parse_relays(&bytes)?;
    if relays.is_empty() {
        return Err(DirectoryError::Empty(url.to_string()));
    }

    tracing::debug!(url, count = relays.len(), "fetched relay directory");
    Ok(relays)
}

/// Parses a directory body into a clean relay list.
///
/// # Errors
///
/// Returns an error if the body is neither shape of relay list.
pub fn parse_relays(body: &[u8]) -> Result<Vec<String>> {
    let body: DirectoryBody = serde_json::from_slice(body)?;
    Ok(dedup_relays(body.into_relays()))
}

/// Trims entries, drops blanks and removes duplicates in order.
#[must_use]
pub fn dedup_relays<I, S>(relays: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    relays
        .into_iter()
        .map(|relay| relay.as_ref().trim().to_string())
        .filter(|relay| !relay.is_empty())
        .collect::<IndexSet<String>>()
        .into_iter()
        .collect()
}
