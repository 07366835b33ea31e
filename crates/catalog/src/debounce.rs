//! Input gates.
//!
//! Two independent gates sit between the UI and the fetchers: a debounce
//! gate that turns bursts of keystrokes into one committed query, and a
//! cooldown gate that thins out repeated next-page triggers from scrolling.

use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{sleep, Instant};
use tracing::debug;

/// Suppresses triggers that arrive within `interval` of the last accepted one
#[derive(Debug, Clone)]
pub struct CooldownGate {
    interval: Duration,
    last_pass: Option<Instant>,
}

impl CooldownGate {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            last_pass: None,
        }
    }

    /// Accept the trigger if the gate is open, closing it for `interval`
    pub fn try_pass(&mut self, now: Instant) -> bool {
        match self.last_pass {
            Some(last) if now.saturating_duration_since(last) < self.interval => false,
            _ => {
                self.last_pass = Some(now);
                true
            }
        }
    }

    /// Forget the last trigger, e.g. when a new query starts
    pub fn reset(&mut self) {
        self.last_pass = None;
    }
}

/// Turns raw text input into committed queries after a quiet period
///
/// Dropping the controller stops its background task.
pub struct DebouncedQueryController {
    input: mpsc::UnboundedSender<String>,
    task: JoinHandle<()>,
}

impl DebouncedQueryController {
    /// Start the debounce task
    ///
    /// Committed queries arrive on the returned receiver, already trimmed.
    /// Whether a commit actually changes anything is up to the consumer,
    /// which knows the query currently in effect.
    pub fn spawn(quiet: Duration) -> (Self, mpsc::UnboundedReceiver<String>) {
        let (input, inbox) = mpsc::unbounded_channel();
        let (outbox, commits) = mpsc::unbounded_channel();
        let task = tokio::spawn(debounce_loop(inbox, outbox, quiet));

        (Self { input, task }, commits)
    }

    /// Feed the latest raw input value
    pub fn push(&self, raw: impl Into<String>) {
        // The task only stops when the controller is dropped
        let _ = self.input.send(raw.into());
    }
}

impl Drop for DebouncedQueryController {
    fn drop(&mut self) {
        self.task.abort();
    }
}

async fn debounce_loop(
    mut inbox: mpsc::UnboundedReceiver<String>,
    outbox: mpsc::UnboundedSender<String>,
    quiet: Duration,
) {
    let mut pending: Option<String> = None;

    loop {
        let Some(candidate) = pending.take() else {
            match inbox.recv().await {
                Some(raw) => pending = Some(raw),
                None => break,
            }
            continue;
        };

        tokio::select! {
            next = inbox.recv() => match next {
                Some(raw) => pending = Some(raw),
                None => {
                    commit(&outbox, &candidate);
                    break;
                }
            },
            _ = sleep(quiet) => {
                if !commit(&outbox, &candidate) {
                    break;
                }
            }
        }
    }
}

/// Returns false once nobody listens for commits anymore
fn commit(outbox: &mpsc::UnboundedSender<String>, candidate: &str) -> bool {
    let candidate = candidate.trim();
    debug!(query = candidate, "Committing query");
    outbox.send(candidate.to_string()).is_ok()
}
