//! Reusable helpers for recovery integration tests.
//!
//! `ScriptedTransport` stands in for real relay connections: each call to
//! `open` replays a fixed script of signals and delays on a background task,
//! so tests run under a paused tokio clock and finish instantly.

#![allow(dead_code)]

use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use contacts_recovery::relay::{RelayError, RelayResult, RelaySignal, RelayTransport};
use nostr::{Event, EventBuilder, Filter, Keys, Kind, PublicKey, Tag, Timestamp};
use tokio::sync::mpsc;

/// One step of a relay script.
#[derive(Debug, Clone)]
pub enum Step {
    /// Deliver a signal.
    Signal(RelaySignal),
    /// Wait before the next step.
    Delay(Duration),
}

/// An in-memory relay connection set that replays a script.
#[derive(Default)]
pub struct ScriptedTransport {
    script: Mutex<Vec<Step>>,
    connected: Arc<Mutex<HashSet<String>>>,
    rejecting: HashSet<String>,
    opened_with: Mutex<Vec<String>>,
    sent: Mutex<Vec<(String, Event)>>,
    open_calls: AtomicUsize,
    shut_down: AtomicBool,
}

impl ScriptedTransport {
    pub fn new(script: Vec<Step>) -> Self {
        Self {
            script: Mutex::new(script),
            ..Self::default()
        }
    }

    /// Makes `send` to `relay` fail as if the relay refused the event.
    pub fn rejecting(mut self, relay: &str) -> Self {
        self.rejecting.insert(relay.to_string());
        self
    }

    pub fn open_calls(&self) -> usize {
        self.open_calls.load(Ordering::SeqCst)
    }

    pub fn opened_with(&self) -> Vec<String> {
        self.opened_with.lock().unwrap().clone()
    }

    pub fn sent_to(&self) -> Vec<String> {
        self.sent
            .lock()
            .unwrap()
            .iter()
            .map(|(relay, _)| relay.clone())
            .collect()
    }

    pub fn sent_events(&self) -> Vec<Event> {
        self.sent
            .lock()
            .unwrap()
            .iter()
            .map(|(_, event)| event.clone())
            .collect()
    }

    pub fn was_shut_down(&self) -> bool {
        self.shut_down.load(Ordering::SeqCst)
    }
}

impl RelayTransport for ScriptedTransport {
    async fn open(
        &self,
        relays: &[String],
        _filter: Filter,
    ) -> RelayResult<mpsc::Receiver<RelaySignal>> {
        self.open_calls.fetch_add(1, Ordering::SeqCst);
        self.opened_with.lock().unwrap().extend(relays.iter().cloned());

        let (tx, rx) = mpsc::channel(256);
        let script = std::mem::take(&mut *self.script.lock().unwrap());
        let connected = Arc::clone(&self.connected);

        tokio::spawn(async move {
            for step in script {
                match step {
                    Step::Delay(duration) => tokio::time::sleep(duration).await,
                    Step::Signal(signal) => {
                        match &signal {
                            RelaySignal::Opened { relay } => {
                                connected.lock().unwrap().insert(relay.clone());
                            }
                            RelaySignal::Closed { relay } => {
                                connected.lock().unwrap().remove(relay);
                            }
                            _ => {}
                        }
                        if tx.send(signal).await.is_err() {
                            return;
                        }
                    }
                }
            }
        });

        Ok(rx)
    }

    async fn is_open(&self, relay: &str) -> bool {
        self.connected.lock().unwrap().contains(relay)
    }

    async fn send(&self, relay: &str, event: &Event) -> RelayResult<()> {
        if !self.is_open(relay).await {
            return Err(RelayError::NotConnected(relay.to_string()));
        }
        if self.rejecting.contains(relay) {
            return Err(RelayError::Rejected {
                relay: relay.to_string(),
                reason: "blocked: not on allow list".to_string(),
            });
        }
        self.sent
            .lock()
            .unwrap()
            .push((relay.to_string(), event.clone()));
        Ok(())
    }

    async fn shutdown(&self) {
        self.shut_down.store(true, Ordering::SeqCst);
        self.connected.lock().unwrap().clear();
    }
}

/// Builds a signed kind 3 event with the given follows, content and time.
pub fn contact_list(
    author: &Keys,
    follows: &[(PublicKey, Option<&str>)],
    content: &str,
    created_at: u64,
) -> Event {
    let tags: Vec<Tag> = follows
        .iter()
        .map(|(pubkey, hint)| {
            let mut parts = vec!["p".to_string(), pubkey.to_hex()];
            if let Some(hint) = hint {
                parts.push((*hint).to_string());
            }
            Tag::parse(parts).expect("should parse p tag")
        })
        .collect();

    EventBuilder::new(Kind::ContactList, content)
        .tags(tags)
        .custom_created_at(Timestamp::from(created_at))
        .sign_with_keys(author)
        .expect("should sign contact list")
}

pub fn opened(relay: &str) -> Step {
    Step::Signal(RelaySignal::Opened {
        relay: relay.to_string(),
    })
}

pub fn event(relay: &str, event: Event) -> Step {
    Step::Signal(RelaySignal::Event {
        relay: relay.to_string(),
        event: Box::new(event),
    })
}

pub fn eose(relay: &str) -> Step {
    Step::Signal(RelaySignal::Eose {
        relay: relay.to_string(),
    })
}

pub fn closed(relay: &str) -> Step {
    Step::Signal(RelaySignal::Closed {
        relay: relay.to_string(),
    })
}

pub fn delay(secs: u64) -> Step {
    Step::Delay(Duration::from_secs(secs))
}

pub fn relays(urls: &[&str]) -> Vec<String> {
    urls.iter().map(|url| (*url).to_string()).collect()
}
