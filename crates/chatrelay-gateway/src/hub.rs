// SPDX-FileCopyrightText: 2026 Chatrelay Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! In-process fan-out of delivered messages to connected clients.

use futures::stream;
use tokio::sync::broadcast;
use tokio::sync::broadcast::error::RecvError;
use tracing::warn;

use chatrelay_core::traits::{BroadcastChannel, MessageStream};
use chatrelay_core::types::Message;

/// Default per-subscriber buffer before a slow client starts losing messages.
pub const DEFAULT_CAPACITY: usize = 256;

/// [`BroadcastChannel`] backed by `tokio::sync::broadcast`.
///
/// A subscriber that falls more than `capacity` messages behind skips the
/// ones it missed. Publishers never wait on subscribers.
#[derive(Debug, Clone)]
pub struct BroadcastHub {
    tx: broadcast::Sender<Message>,
}

impl BroadcastHub {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity.max(1));
        Self { tx }
    }
}

impl Default for BroadcastHub {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

impl BroadcastChannel for BroadcastHub {
    fn publish(&self, message: &Message) -> usize {
        // Err only means nobody is listening.
        self.tx.send(message.clone()).unwrap_or(0)
    }

    fn subscribe(&self) -> MessageStream {
        let rx = self.tx.subscribe();
        Box::pin(stream::unfold(rx, |mut rx| async move {
            loop {
                match rx.recv().await {
                    Ok(message) => return Some((message, rx)),
                    Err(RecvError::Lagged(skipped)) => {
                        warn!(skipped, "subscriber lagged, dropping missed messages");
                    }
                    Err(RecvError::Closed) => return None,
                }
            }
        }))
    }

    fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }
}
