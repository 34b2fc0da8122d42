//! Run configuration.

use std::time::Duration;

use crate::directory::DEFAULT_DIRECTORY_URL;

/// How long relays get to deliver contact lists.
pub const DEFAULT_WINDOW: Duration = Duration::from_secs(30);

/// How long to keep listening for relay responses after publishing.
pub const DEFAULT_GRACE: Duration = Duration::from_secs(10);

/// Interval between connection liveness checks.
pub const DEFAULT_PROBE_INTERVAL: Duration = Duration::from_secs(10);

/// Settings for one recovery run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecoveryConfig {
    /// Length of the collection window. The window always runs to the end;
    /// end-of-stored-events markers do not shorten it.
    pub window: Duration,

    /// Wait after the last send before shutting down.
    pub grace: Duration,

    /// Liveness check interval handed to the relay connection set.
    pub probe_interval: Duration,

    /// Where to fetch the candidate relay list.
    pub directory_url: String,

    /// Explicit candidate relays. When set the directory is not fetched.
    pub relays: Option<Vec<String>>,
}

impl RecoveryConfig {
    /// Creates a configuration with the default timings and directory.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the collection window.
    #[must_use]
    pub const fn with_window(mut self, window: Duration) -> Self {
        self.window = window;
        self
    }

    /// Sets the post-publish grace period.
    #[must_use]
    pub const fn with_grace(mut self, grace: Duration) -> Self {
        self.grace = grace;
        self
    }

    /// Sets the liveness check interval.
    #[must_use]
    pub const fn with_probe_interval(mut self, interval: Duration) -> Self {
        self.probe_interval = interval;
        self
    }

    /// Sets the relay directory URL.
    #[must_use]
    pub fn with_directory_url(mut self, url: impl Into<String>) -> Self {
        self.directory_url = url.into();
        self
    }

    /// Uses a fixed candidate list instead of the directory.
    #[must_use]
    pub fn with_relays(mut self, relays: Vec<String>) -> Self {
        self.relays = Some(relays);
        self
    }
}

impl Default for RecoveryConfig {
    fn default() -> Self {
        Self {
            window: DEFAULT_WINDOW,
            grace: DEFAULT_GRACE,
            probe_interval: DEFAULT_PROBE_INTERVAL,
            directory_url: DEFAULT_DIRECTORY_URL.to_string(),
            relays: None,
        }
    }
}
