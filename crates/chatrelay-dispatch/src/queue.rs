// SPDX-FileCopyrightText: 2026 Chatrelay Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Unbounded FIFO of jobs awaiting a generated reply.

use std::collections::VecDeque;

use chatrelay_core::types::{Job, SessionId};
use tokio::sync::{Mutex, Notify};
use tracing::debug;

/// Outbound job queue shared between intake (producers) and the dispatcher
/// (the only consumer).
///
/// Every `enqueue` raises the drain signal. Sequence numbers are handed out
/// under the queue lock, so they increase in tail order.
#[derive(Debug, Default)]
pub struct OutboundQueue {
    inner: Mutex<QueueInner>,
    signal: Notify,
}

#[derive(Debug, Default)]
struct QueueInner {
    jobs: VecDeque<Job>,
    next_seq: u64,
}

impl OutboundQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a job at the tail and returns its sequence number.
    pub async fn enqueue(&self, payload: impl Into<String>, session_id: Option<SessionId>) -> u64 {
        let (seq, queued) = {
            let mut inner = self.inner.lock().await;
            let seq = inner.next_seq;
            inner.next_seq += 1;
            inner.jobs.push_back(Job {
                payload: payload.into(),
                enqueued_at: seq,
                session_id,
            });
            (seq, inner.jobs.len())
        };
        debug!(seq, queued, "job enqueued");
        self.signal.notify_one();
        seq
    }

    /// Removes and returns the oldest job.
    pub(crate) async fn dequeue_front(&self) -> Option<Job> {
        self.inner.lock().await.jobs.pop_front()
    }

    /// Waits for the drain signal.
    ///
    /// A signal raised while nobody waits is kept, so an enqueue racing with
    /// the end of a drain is never lost. A wake-up may find the queue empty.
    pub(crate) async fn notified(&self) {
        self.signal.notified().await;
    }

    pub async fn len(&self) -> usize {
        self.inner.lock().await.jobs.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.inner.lock().await.jobs.is_empty()
    }

    /// Payloads of the queued jobs, oldest first.
    pub async fn pending(&self) -> Vec<String> {
        self.inner
            .lock()
            .await
            .jobs
            .iter()
            .map(|job| job.payload.clone())
            .collect()
    }
}
