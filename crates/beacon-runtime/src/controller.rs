//! Sequential poll loop for the command-line form.
//!
//! Handshake first; if the Beacon is live, repeat fetch → parse → dispatch
//! and wait `interval` between cycles for as long as the reported status is
//! in the continuation set. Nothing overlaps: each step finishes before the
//! next begins.

use std::time::Duration;

use beacon_core::models::StatusCode;
use beacon_core::Result;
use beacon_data::client::{SessionClient, Transport};
use beacon_data::parser::parse_datapoint;
use tracing::{debug, info};

use crate::dispatcher::OutputDispatcher;

// ── Public types ──────────────────────────────────────────────────────────────

/// Lifecycle of a [`PollController`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopState {
    /// Not yet initialized.
    Idle,
    /// Handshake succeeded; cycles are running.
    Polling,
    /// The handshake did not return HTTP 200. Nothing was polled.
    Aborted,
    /// The Beacon reported a status outside the continuation set.
    Stopped,
}

/// How a completed run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunOutcome {
    Aborted,
    Stopped {
        last_status: StatusCode,
        cycles: u64,
    },
}

// ── PollController ────────────────────────────────────────────────────────────

pub struct PollController<T: Transport> {
    client: SessionClient<T>,
    dispatcher: OutputDispatcher,
    interval: Duration,
    state: LoopState,
}

impl<T: Transport> PollController<T> {
    pub fn new(client: SessionClient<T>, dispatcher: OutputDispatcher, interval: Duration) -> Self {
        Self {
            client,
            dispatcher,
            interval,
            state: LoopState::Idle,
        }
    }

    pub fn state(&self) -> LoopState {
        self.state
    }

    /// Run until the Beacon stops or the handshake fails.
    ///
    /// Transport, label and file errors end the run immediately.
    pub async fn run(&mut self) -> Result<RunOutcome> {
        if !self.client.initialize().await? {
            self.state = LoopState::Aborted;
            info!(url = %self.client.url(), "Beacon is not live; nothing to poll");
            return Ok(RunOutcome::Aborted);
        }

        self.state = LoopState::Polling;
        info!(url = %self.client.url(), interval = ?self.interval, "polling Beacon");

        let mut status = StatusCode::default();
        let mut cycles = 0;
        while status.should_continue() {
            status = self.run_cycle().await?;
            cycles += 1;
            if status.should_continue() {
                tokio::time::sleep(self.interval).await;
            }
        }

        self.state = LoopState::Stopped;
        info!(%status, cycles, "Beacon no longer active; stopping");
        Ok(RunOutcome::Stopped {
            last_status: status,
            cycles,
        })
    }

    /// One fetch → parse → dispatch pass. Returns the reported status.
    pub async fn run_cycle(&mut self) -> Result<StatusCode> {
        let raw = self.client.fetch_datapoint().await?;
        let datapoint = parse_datapoint(&raw);
        let view = self.dispatcher.dispatch(&datapoint)?;
        debug!(status = %view.status, label = %view.status_label, "cycle complete");
        Ok(view.status)
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
