// SPDX-FileCopyrightText: 2026 Chatrelay Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Broadcast channel trait for fan-out to connected subscribers.

use std::pin::Pin;

use futures_core::Stream;

use crate::types::Message;

/// Live stream of messages published after the subscription was created.
pub type MessageStream = Pin<Box<dyn Stream<Item = Message> + Send>>;

/// Delivers each published message to every current subscriber.
///
/// There is no replay: a subscriber only sees messages published after
/// [`subscribe`](BroadcastChannel::subscribe) returned.
pub trait BroadcastChannel: Send + Sync + 'static {
    /// Publishes a message and returns how many subscribers it reached.
    fn publish(&self, message: &Message) -> usize;

    /// Opens a new subscription.
    fn subscribe(&self) -> MessageStream;

    /// Number of currently open subscriptions.
    fn subscriber_count(&self) -> usize;
}
