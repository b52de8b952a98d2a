// SPDX-FileCopyrightText: 2026 Chatrelay Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Common types used across adapter traits and the chatrelay server.

use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Reserved sender identity for generated replies and fallback notices.
pub const SYSTEM_SENDER: &str = "AI";

/// Opaque session tag attached by an upstream collaborator.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(pub String);

impl std::fmt::Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

/// A chat message. Immutable once created.
///
/// The JSON shape matches what browser clients send and render:
/// `{"text": "...", "sender": "...", "timestamp": "...", "session_id": "..."}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    /// Body content.
    pub text: String,
    /// User identifier or email, or [`SYSTEM_SENDER`].
    pub sender: String,
    /// RFC 3339 creation time in UTC.
    pub timestamp: String,
    /// Upstream session tag, carried through untouched.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_id: Option<SessionId>,
}

impl Message {
    /// Create a message stamped with the current time.
    pub fn new(text: impl Into<String>, sender: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            sender: sender.into(),
            timestamp: now_timestamp(),
            session_id: None,
        }
    }

    /// Create a message authored by the reserved system identity.
    pub fn system(text: impl Into<String>) -> Self {
        Self::new(text, SYSTEM_SENDER)
    }

    /// Attach (or clear) the session tag.
    pub fn with_session(mut self, session_id: Option<SessionId>) -> Self {
        self.session_id = session_id;
        self
    }

    /// Whether the message was authored by the reserved system identity.
    pub fn is_from_system(&self) -> bool {
        self.sender == SYSTEM_SENDER
    }
}

/// One pending request for a generated reply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Job {
    /// Text of the inbound message that triggered the job.
    pub payload: String,
    /// Logical arrival order. Only used for FIFO ordering.
    pub enqueued_at: u64,
    /// Session tag copied from the triggering message.
    pub session_id: Option<SessionId>,
}

/// A single request to the completion endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompletionRequest {
    /// Fixed system instruction sent with every request.
    pub system: String,
    /// User text the reply is generated for.
    pub prompt: String,
    /// Output-length cap.
    pub max_tokens: u32,
}

/// Health status reported by adapter health checks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HealthStatus {
    /// Adapter is fully operational.
    Healthy,
    /// Adapter is operational but experiencing issues.
    Degraded(String),
    /// Adapter is not operational.
    Unhealthy(String),
}

impl HealthStatus {
    pub fn is_healthy(&self) -> bool {
        matches!(self, Self::Healthy)
    }
}

/// Identifies the kind of adapter behind a [`crate::PluginAdapter`].
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
pub enum AdapterType {
    Completion,
    Storage,
    Broadcast,
}

/// Current time formatted like JavaScript's `Date.toISOString()`.
pub fn now_timestamp() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}
