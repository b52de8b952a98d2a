// SPDX-FileCopyrightText: 2026 Chatrelay Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! A [`Sleeper`] for tests that records every requested delay.

use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::{Semaphore, watch};

use chatrelay_dispatch::Sleeper;

/// Records requested delays instead of (or before) waiting them out.
///
/// [`ManualSleeper::new`] returns from `sleep` immediately.
/// [`ManualSleeper::gated`] blocks each `sleep` until the test calls
/// [`release`](ManualSleeper::release), which makes "what happens while the
/// dispatcher sleeps" observable.
pub struct ManualSleeper {
    requests: Mutex<Vec<Duration>>,
    count: watch::Sender<usize>,
    gate: Option<Semaphore>,
}

impl ManualSleeper {
    pub fn new() -> Self {
        Self::build(None)
    }

    pub fn gated() -> Self {
        Self::build(Some(Semaphore::new(0)))
    }

    fn build(gate: Option<Semaphore>) -> Self {
        let (count, _) = watch::channel(0);
        Self {
            requests: Mutex::new(Vec::new()),
            count,
            gate,
        }
    }

    /// Delays requested so far, in order.
    pub fn requests(&self) -> Vec<Duration> {
        self.requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn total(&self) -> Duration {
        self.requests().into_iter().sum()
    }

    /// Lets `n` blocked (or future) sleeps return. No-op when not gated.
    pub fn release(&self, n: usize) {
        if let Some(gate) = &self.gate {
            gate.add_permits(n);
        }
    }

    /// Resolves once at least `n` sleeps have been requested.
    pub async fn wait_for_requests(&self, n: usize) {
        let mut rx = self.count.subscribe();
        // The sender lives in `self`, so the channel cannot close here.
        let _ = rx.wait_for(|count| *count >= n).await;
    }
}

impl Default for ManualSleeper {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Sleeper for ManualSleeper {
    async fn sleep(&self, duration: Duration) {
        self.requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(duration);
        self.count.send_modify(|count| *count += 1);

        if let Some(gate) = &self.gate
            && let Ok(permit) = gate.acquire().await
        {
            permit.forget();
        }
    }
}
