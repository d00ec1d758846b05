//! Cancellable scheduled polling for the interactive front end.
//!
//! [`PollTask::spawn`] runs the handshake and then, after every `interval`,
//! one poll cycle, reporting each step as a [`PollEvent`] over an `mpsc`
//! channel. [`PollTaskHandle::cancel`] clears a liveness flag and wakes the
//! pending wait. A cycle that is already fetching is allowed to finish, but
//! its result is dropped instead of being dispatched or reported.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use beacon_core::formatting::DatapointView;
use beacon_core::models::StatusCode;
use beacon_data::client::{SessionClient, Transport};
use beacon_data::parser::parse_datapoint;
use tokio::sync::{mpsc, Notify};
use tracing::{debug, info, warn};

use crate::dispatcher::OutputDispatcher;

// ── Public types ──────────────────────────────────────────────────────────────

/// Progress reported by a running [`PollTask`].
#[derive(Debug, Clone, PartialEq)]
pub enum PollEvent {
    /// The handshake succeeded; the first cycle runs after one interval.
    Started,
    /// The handshake did not return HTTP 200.
    Aborted,
    /// A cycle finished and its datapoint was written to every sink.
    Datapoint(DatapointView),
    /// The Beacon left the continuation set.
    Stopped(StatusCode),
    /// A fatal error ended the task.
    Failed(String),
}

// ── PollTask ──────────────────────────────────────────────────────────────────

pub struct PollTask<T: Transport> {
    client: SessionClient<T>,
    dispatcher: OutputDispatcher,
    interval: Duration,
}

impl<T: Transport + 'static> PollTask<T> {
    pub fn new(client: SessionClient<T>, dispatcher: OutputDispatcher, interval: Duration) -> Self {
        Self {
            client,
            dispatcher,
            interval,
        }
    }

    /// Spawn the task on the current tokio runtime.
    pub fn spawn(self) -> (mpsc::Receiver<PollEvent>, PollTaskHandle) {
        let (tx, rx) = mpsc::channel(16);
        let alive = Arc::new(AtomicBool::new(true));
        let wake = Arc::new(Notify::new());

        tokio::spawn(self.run(tx, Arc::clone(&alive), Arc::clone(&wake)));

        (rx, PollTaskHandle { alive, wake })
    }

    async fn run(mut self, tx: mpsc::Sender<PollEvent>, alive: Arc<AtomicBool>, wake: Arc<Notify>) {
        let live = match self.client.initialize().await {
            Ok(live) => live,
            Err(e) => {
                report(&tx, &alive, PollEvent::Failed(e.to_string())).await;
                return;
            }
        };
        if !live {
            info!(url = %self.client.url(), "Beacon is not live; not scheduling");
            report(&tx, &alive, PollEvent::Aborted).await;
            return;
        }
        if !report(&tx, &alive, PollEvent::Started).await {
            return;
        }

        let mut status = StatusCode::default();
        while status.should_continue() {
            tokio::select! {
                _ = tokio::time::sleep(self.interval) => {}
                _ = wake.notified() => {}
            }
            if !alive.load(Ordering::SeqCst) {
                debug!("poll task cancelled while waiting");
                return;
            }

            let raw = match self.client.fetch_datapoint().await {
                Ok(raw) => raw,
                Err(e) => {
                    report(&tx, &alive, PollEvent::Failed(e.to_string())).await;
                    return;
                }
            };
            if !alive.load(Ordering::SeqCst) {
                debug!("poll task cancelled during fetch; dropping result");
                return;
            }

            let datapoint = parse_datapoint(&raw);
            status = datapoint.status();
            match self.dispatcher.dispatch(&datapoint) {
                Ok(view) => {
                    if !report(&tx, &alive, PollEvent::Datapoint(view)).await {
                        return;
                    }
                }
                Err(e) => {
                    warn!(error = %e, "dispatch failed; stopping poll task");
                    report(&tx, &alive, PollEvent::Failed(e.to_string())).await;
                    return;
                }
            }
        }

        info!(%status, "Beacon no longer active; poll task finished");
        report(&tx, &alive, PollEvent::Stopped(status)).await;
    }
}

/// Send `event` if the task is still wanted. Returns `false` once it is not.
async fn report(tx: &mpsc::Sender<PollEvent>, alive: &AtomicBool, event: PollEvent) -> bool {
    if !alive.load(Ordering::SeqCst) {
        return false;
    }
    tx.send(event).await.is_ok()
}

// ── PollTaskHandle ────────────────────────────────────────────────────────────

/// Control handle for a spawned [`PollTask`]. Dropping it cancels the task.
pub struct PollTaskHandle {
    alive: Arc<AtomicBool>,
    wake: Arc<Notify>,
}

impl PollTaskHandle {
    /// Stop scheduling further cycles.
    pub fn cancel(&self) {
        self.alive.store(false, Ordering::SeqCst);
        self.wake.notify_one();
    }

    pub fn is_alive(&self) -> bool {
        self.alive.load(Ordering::SeqCst)
    }
}

impl Drop for PollTaskHandle {
    fn drop(&mut self) {
        self.cancel();
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
