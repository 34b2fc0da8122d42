//! Contact list recovery tool.
//!
//! Collects every copy of a user's kind 3 contact list that the relays in a
//! public directory still hold, merges them and prints the result as one
//! event on stdout. With a secret key the event is signed and republished
//! to the writable relays that answered.
//!
//! # Usage
//!
//! ```bash
//! # Dry run: print the merged, unsigned event
//! contacts-recovery --pubkey npub1...
//!
//! # Sign and republish
//! PRIVKEY=nsec1... contacts-recovery --pubkey npub1...
//!
//! # Query a fixed relay list instead of the directory
//! contacts-recovery --pubkey npub1... --relays wss://relay.damus.io,wss://nos.lol
//! ```
//!
//! Logs go to stderr (`RUST_LOG` overrides the default `info` level), so
//! stdout can be redirected to a file holding only the event.

use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use contacts_recovery::directory::DEFAULT_DIRECTORY_URL;
use contacts_recovery::relay::RelayManager;
use contacts_recovery::{Recovery, RecoveryConfig};
use tracing_subscriber::EnvFilter;

/// Recover a Nostr contact list from many relays.
#[derive(Parser, Debug)]
#[command(name = "contacts-recovery")]
#[command(about = "Recover a Nostr contact list by merging every copy the relays still hold")]
#[command(version)]
struct Args {
    /// Identity whose contact list to recover (npub or hex)
    #[arg(long, env = "PUBKEY")]
    pubkey: String,

    /// Secret key (nsec or hex); when absent the event is only printed
    #[arg(long, env = "PRIVKEY", hide_env_values = true)]
    privkey: Option<String>,

    /// Relay directory returning {"relays": [...]}
    #[arg(long, env = "RELAY_DIRECTORY_URL", default_value = DEFAULT_DIRECTORY_URL)]
    directory_url: String,

    /// Relay URLs to query (comma-separated, skips the directory)
    #[arg(long, env = "RELAYS", value_delimiter = ',')]
    relays: Option<Vec<String>>,

    /// Collection window in seconds
    #[arg(long, default_value = "30")]
    window_secs: u64,

    /// Wait after publishing, in seconds
    #[arg(long, default_value = "10")]
    grace_secs: u64,

    /// Connection liveness check interval in seconds
    #[arg(long, default_value = "10")]
    probe_secs: u64,

    /// Time one relay gets to complete its handshake, in seconds
    #[arg(long, default_value = "15")]
    connect_timeout_secs: u64,
}

impl Args {
    fn config(&self) -> RecoveryConfig {
        let config = RecoveryConfig::new()
            .with_window(Duration::from_secs(self.window_secs))
            .with_grace(Duration::from_secs(self.grace_secs))
            .with_probe_interval(Duration::from_secs(self.probe_secs))
            .with_directory_url(self.directory_url.clone());

        match &self.relays {
            Some(relays) => config.with_relays(relays.clone()),
            None => config,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    let config = args.config();

    let transport = RelayManager::new()
        .with_probe_interval(config.probe_interval)
        .with_connect_timeout(Duration::from_secs(args.connect_timeout_secs));
    let recovery = Recovery::new(transport, config);

    let outcome = recovery
        .run(&args.pubkey, args.privkey.as_deref(), &mut std::io::stdout())
        .await
        .context("Contact list recovery failed")?;

    if let Some(report) = &outcome.published {
        tracing::debug!(
            targets = report.targets.len(),
            sent = report.sent.len(),
            skipped = report.skipped.len(),
            failed = report.failed.len(),
            "publish summary"
        );
    }

    Ok(())
}
