// SPDX-FileCopyrightText: 2026 Chatrelay Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Inbound message intake: validate, echo, and queue for a reply.

use std::collections::HashSet;
use std::sync::Arc;

use chatrelay_config::{DispatcherConfig, ReplyPolicyKind};
use chatrelay_core::RelayError;
use chatrelay_core::types::{Message, SYSTEM_SENDER, SessionId, now_timestamp};
use tracing::{debug, info};

use crate::outlet::Outlet;
use crate::queue::OutboundQueue;

/// Which human messages get a generated reply.
///
/// Messages from the reserved system identity never do, whatever the policy.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum ReplyPolicy {
    #[default]
    All,
    Senders(HashSet<String>),
    None,
}

impl ReplyPolicy {
    pub fn from_config(config: &DispatcherConfig) -> Self {
        match config.reply_policy {
            ReplyPolicyKind::All => Self::All,
            ReplyPolicyKind::Senders => {
                Self::Senders(config.reply_senders.iter().cloned().collect())
            }
            ReplyPolicyKind::None => Self::None,
        }
    }

    pub fn wants_reply(&self, message: &Message) -> bool {
        if message.is_from_system() {
            return false;
        }
        match self {
            Self::All => true,
            Self::Senders(senders) => senders.contains(&message.sender),
            Self::None => false,
        }
    }
}

/// A message as received from a client, before intake assigns defaults.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InboundMessage {
    pub text: String,
    pub sender: String,
    /// Client-side creation time. Replaced when missing or not RFC 3339.
    pub timestamp: Option<String>,
    pub session_id: Option<SessionId>,
}

impl InboundMessage {
    pub fn new(text: impl Into<String>, sender: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            sender: sender.into(),
            ..Self::default()
        }
    }
}

/// What intake did with an accepted message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Accepted {
    /// The message as persisted and broadcast.
    pub message: Message,
    /// Sequence number of the reply job, if one was queued.
    pub job: Option<u64>,
}

pub struct Intake {
    outlet: Arc<Outlet>,
    queue: Arc<OutboundQueue>,
    policy: ReplyPolicy,
}

impl Intake {
    pub fn new(outlet: Arc<Outlet>, queue: Arc<OutboundQueue>, policy: ReplyPolicy) -> Self {
        Self {
            outlet,
            queue,
            policy,
        }
    }

    pub fn policy(&self) -> &ReplyPolicy {
        &self.policy
    }

    /// Persists and broadcasts `inbound`, then queues a reply job if the
    /// policy asks for one.
    ///
    /// The echo never waits on the completion endpoint: enqueueing only
    /// touches the queue lock.
    pub async fn accept(&self, inbound: InboundMessage) -> Result<Accepted, RelayError> {
        if inbound.text.trim().is_empty() {
            return Err(RelayError::InvalidMessage(
                "message text must not be empty".into(),
            ));
        }
        if inbound.sender.trim().is_empty() {
            return Err(RelayError::InvalidMessage(
                "message sender must not be empty".into(),
            ));
        }
        if inbound.sender.trim() == SYSTEM_SENDER {
            return Err(RelayError::InvalidMessage(format!(
                "sender `{SYSTEM_SENDER}` is reserved for generated replies"
            )));
        }

        let timestamp = inbound
            .timestamp
            .filter(|ts| chrono::DateTime::parse_from_rfc3339(ts).is_ok())
            .unwrap_or_else(now_timestamp);
        let message = Message {
            text: inbound.text,
            sender: inbound.sender,
            timestamp,
            session_id: inbound.session_id,
        };

        let reached = self.outlet.deliver(&message).await;
        info!(sender = %message.sender, reached, "message received");

        let job = if self.policy.wants_reply(&message) {
            Some(
                self.queue
                    .enqueue(message.text.clone(), message.session_id.clone())
                    .await,
            )
        } else {
            debug!(sender = %message.sender, "no reply requested for message");
            None
        };

        Ok(Accepted { message, job })
    }
}
