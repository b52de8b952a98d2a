// SPDX-FileCopyrightText: 2026 Chatrelay Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Serialized persist-then-publish path shared by intake and the dispatcher.

use std::sync::Arc;

use chatrelay_core::traits::{BroadcastChannel, MessageLog, MessageStream};
use chatrelay_core::types::Message;
use chatrelay_core::RelayError;
use tokio::sync::Mutex;
use tracing::{debug, error};

/// The single writer to the message log and the broadcast channel.
///
/// The lock is held across "append then publish", so the log order and the
/// broadcast order are the same sequence.
pub struct Outlet {
    log: Arc<dyn MessageLog>,
    broadcast: Arc<dyn BroadcastChannel>,
    lock: Mutex<()>,
}

/// History snapshot plus the live stream that continues right after it.
pub struct Subscription {
    pub history: Vec<Message>,
    pub stream: MessageStream,
}

impl Outlet {
    pub fn new(log: Arc<dyn MessageLog>, broadcast: Arc<dyn BroadcastChannel>) -> Self {
        Self {
            log,
            broadcast,
            lock: Mutex::new(()),
        }
    }

    /// Persists `message`, then publishes it. Returns the number of
    /// subscribers reached.
    ///
    /// A failed append is logged and the message is published anyway.
    pub async fn deliver(&self, message: &Message) -> usize {
        let _guard = self.lock.lock().await;

        if let Err(e) = self.log.append(message).await {
            error!(
                error = %e,
                sender = %message.sender,
                "failed to persist message, broadcasting anyway"
            );
        }

        let reached = self.broadcast.publish(message);
        debug!(sender = %message.sender, reached, "message delivered");
        reached
    }

    /// The newest `limit` persisted messages (oldest first) and a
    /// subscription that starts exactly after them.
    pub async fn subscribe_with_history(&self, limit: usize) -> Result<Subscription, RelayError> {
        let _guard = self.lock.lock().await;
        let history = self.log.recent(limit).await?;
        let stream = self.broadcast.subscribe();
        Ok(Subscription { history, stream })
    }

    /// Live stream only, without a history snapshot.
    pub fn subscribe(&self) -> MessageStream {
        self.broadcast.subscribe()
    }

    pub fn subscriber_count(&self) -> usize {
        self.broadcast.subscriber_count()
    }

    pub fn log(&self) -> &Arc<dyn MessageLog> {
        &self.log
    }
}
