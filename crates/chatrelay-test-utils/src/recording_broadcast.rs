// SPDX-FileCopyrightText: 2026 Chatrelay Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Broadcast channel that records every publish.

use std::sync::{Mutex, PoisonError};

use futures::stream;
use tokio::sync::broadcast;
use tokio::sync::broadcast::error::RecvError;
use tokio::time::Instant;

use chatrelay_core::traits::{BroadcastChannel, MessageStream};
use chatrelay_core::types::Message;

/// A published message and when it was published.
#[derive(Debug, Clone)]
pub struct Published {
    pub at: Instant,
    pub message: Message,
}

/// A [`BroadcastChannel`] that keeps a timeline of everything published and
/// still fans out to real subscribers.
pub struct RecordingBroadcast {
    tx: broadcast::Sender<Message>,
    timeline: Mutex<Vec<Published>>,
}

impl RecordingBroadcast {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(1024);
        Self {
            tx,
            timeline: Mutex::new(Vec::new()),
        }
    }

    pub fn timeline(&self) -> Vec<Published> {
        self.timeline
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn messages(&self) -> Vec<Message> {
        self.timeline().into_iter().map(|p| p.message).collect()
    }

    /// `(sender, text)` pairs in publish order.
    pub fn entries(&self) -> Vec<(String, String)> {
        self.messages()
            .into_iter()
            .map(|m| (m.sender, m.text))
            .collect()
    }
}

impl Default for RecordingBroadcast {
    fn default() -> Self {
        Self::new()
    }
}

impl BroadcastChannel for RecordingBroadcast {
    fn publish(&self, message: &Message) -> usize {
        self.timeline
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(Published {
                at: Instant::now(),
                message: message.clone(),
            });
        self.tx.send(message.clone()).unwrap_or(0)
    }

    fn subscribe(&self) -> MessageStream {
        let rx = self.tx.subscribe();
        Box::pin(stream::unfold(rx, |mut rx| async move {
            loop {
                match rx.recv().await {
                    Ok(message) => return Some((message, rx)),
                    Err(RecvError::Lagged(_)) => continue,
                    Err(RecvError::Closed) => return None,
                }
            }
        }))
    }

    fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }
}
