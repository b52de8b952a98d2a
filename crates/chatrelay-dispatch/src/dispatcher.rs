// SPDX-FileCopyrightText: 2026 Chatrelay Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Single-flight sequential dispatcher.
//!
//! The dispatcher is split in two halves: a [`DispatchLoop`] that owns the
//! drain task and is consumed by [`DispatchLoop::run`], and a cloneable
//! [`DispatcherHandle`] for observing it.
//!
//! ```text
//!            drain signal, queue non-empty
//!   Idle ─────────────────────────────────▶ Draining
//!    ▲                                        │ pop, complete, deliver
//!    │        queue empty                     │ queue non-empty: cool-down, pop
//!    └────────────────────────────────────────┘
//! ```

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use chatrelay_core::CompletionError;
use chatrelay_core::types::{Job, Message};
use serde::Serialize;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::backoff::Sleeper;
use crate::client::CompletionClient;
use crate::outlet::Outlet;
use crate::queue::OutboundQueue;

/// Sent instead of a reply when every attempt was rate limited.
pub const RATE_LIMIT_FALLBACK: &str =
    "The AI is receiving too many requests right now. Please try again in a moment.";

/// Sent instead of a reply when the completion endpoint failed outright.
pub const UNAVAILABLE_FALLBACK: &str = "The AI is temporarily unavailable. Please try again later.";

/// Default pause between two consecutive jobs.
pub const DEFAULT_COOLDOWN: Duration = Duration::from_secs(2);

/// Fixed notice for a terminal completion failure.
pub fn fallback_text(err: &CompletionError) -> &'static str {
    match err {
        CompletionError::RateLimited { .. } | CompletionError::ExhaustedRetries { .. } => {
            RATE_LIMIT_FALLBACK
        }
        CompletionError::Transport { .. } => UNAVAILABLE_FALLBACK,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DispatcherState {
    /// No job in flight; waiting for the drain signal.
    Idle,
    /// Processing jobs until the queue is empty.
    Draining,
}

impl std::fmt::Display for DispatcherState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Idle => write!(f, "idle"),
            Self::Draining => write!(f, "draining"),
        }
    }
}

/// Counters since startup.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DispatcherStats {
    /// Jobs whose outcome (reply or fallback) has been delivered.
    pub jobs_completed: u64,
    /// Of those, how many got a fallback notice.
    pub fallbacks_sent: u64,
}

#[derive(Debug, Default)]
struct Counters {
    jobs_completed: AtomicU64,
    fallbacks_sent: AtomicU64,
}

/// Build a dispatcher over `queue`.
///
/// The returned loop must be spawned (once) for jobs to be processed.
pub fn dispatcher(
    queue: Arc<OutboundQueue>,
    client: CompletionClient,
    outlet: Arc<Outlet>,
    sleeper: Arc<dyn Sleeper>,
    cooldown: Duration,
) -> (DispatcherHandle, DispatchLoop) {
    let (state_tx, state_rx) = watch::channel(DispatcherState::Idle);
    let counters = Arc::new(Counters::default());

    let handle = DispatcherHandle {
        state_rx,
        counters: counters.clone(),
        queue: queue.clone(),
    };
    let drain_loop = DispatchLoop {
        queue,
        client,
        outlet,
        sleeper,
        cooldown,
        state_tx,
        counters,
    };
    (handle, drain_loop)
}

/// Read-only view of a running dispatcher.
#[derive(Debug, Clone)]
pub struct DispatcherHandle {
    state_rx: watch::Receiver<DispatcherState>,
    counters: Arc<Counters>,
    queue: Arc<OutboundQueue>,
}

impl DispatcherHandle {
    pub fn state(&self) -> DispatcherState {
        *self.state_rx.borrow()
    }

    pub fn stats(&self) -> DispatcherStats {
        DispatcherStats {
            jobs_completed: self.counters.jobs_completed.load(Ordering::Relaxed),
            fallbacks_sent: self.counters.fallbacks_sent.load(Ordering::Relaxed),
        }
    }

    /// Jobs waiting behind the one in flight.
    pub async fn queued(&self) -> usize {
        self.queue.len().await
    }

    /// Resolves once the dispatcher is idle with an empty queue.
    ///
    /// Also resolves if the drain loop has been dropped.
    pub async fn wait_until_drained(&self) {
        let mut rx = self.state_rx.clone();
        loop {
            // Queue first: a job popped after this check shows up as Draining.
            let empty = self.queue.is_empty().await;
            let state = *rx.borrow_and_update();
            if empty && state == DispatcherState::Idle {
                return;
            }
            if rx.changed().await.is_err() {
                return;
            }
        }
    }

    /// Resolves at the next state transition to `target` (or immediately if
    /// already there).
    pub async fn wait_for_state(&self, target: DispatcherState) {
        let mut rx = self.state_rx.clone();
        // An error means the loop is gone; nothing left to wait for.
        let _ = rx.wait_for(|state| *state == target).await;
    }
}

/// The drain task. Consumed by [`run`](Self::run).
pub struct DispatchLoop {
    queue: Arc<OutboundQueue>,
    client: CompletionClient,
    outlet: Arc<Outlet>,
    sleeper: Arc<dyn Sleeper>,
    cooldown: Duration,
    state_tx: watch::Sender<DispatcherState>,
    counters: Arc<Counters>,
}

impl DispatchLoop {
    /// Processes jobs until `cancel` fires.
    ///
    /// A job already in flight is finished and delivered before the loop
    /// returns. Jobs still queued at that point are not processed.
    pub async fn run(self, cancel: CancellationToken) {
        info!(cooldown_ms = self.cooldown.as_millis() as u64, "dispatcher running");

        loop {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    info!("shutdown signal received, stopping dispatcher");
                    break;
                }
                _ = self.queue.notified() => {
                    self.drain(&cancel).await;
                }
            }
        }

        let remaining = self.queue.len().await;
        if remaining > 0 {
            warn!(queued = remaining, "dispatcher stopped with unprocessed jobs");
        }
        info!("dispatcher stopped");
    }

    /// One Idle -> Draining -> Idle cycle.
    async fn drain(&self, cancel: &CancellationToken) {
        // Draining before the pop: observers must never see an empty queue
        // and Idle while a job is in hand.
        self.state_tx.send_replace(DispatcherState::Draining);
        let Some(mut job) = self.queue.dequeue_front().await else {
            // Signal from a job already drained in the previous cycle.
            self.state_tx.send_replace(DispatcherState::Idle);
            return;
        };

        loop {
            self.process(job).await;

            if cancel.is_cancelled() || self.queue.is_empty().await {
                break;
            }

            debug!(cooldown_ms = self.cooldown.as_millis() as u64, "cooling down");
            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = self.sleeper.sleep(self.cooldown) => {}
            }

            match self.queue.dequeue_front().await {
                Some(next) => job = next,
                None => break,
            }
        }

        self.state_tx.send_replace(DispatcherState::Idle);
    }

    async fn process(&self, job: Job) {
        let seq = job.enqueued_at;
        debug!(seq, "dispatching job");

        let text = match self.client.complete(&job.payload).await {
            Ok(reply) => {
                info!(seq, "reply generated");
                reply
            }
            Err(err) => {
                warn!(seq, error = %err, "completion failed, sending fallback");
                self.counters.fallbacks_sent.fetch_add(1, Ordering::Relaxed);
                fallback_text(&err).to_string()
            }
        };

        let message = Message::system(text).with_session(job.session_id);
        self.outlet.deliver(&message).await;
        self.counters.jobs_completed.fetch_add(1, Ordering::Relaxed);
    }
}
