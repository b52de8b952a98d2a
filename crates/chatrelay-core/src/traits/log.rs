// SPDX-FileCopyrightText: 2026 Chatrelay Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Persistence sink trait for the append-only message log.

use async_trait::async_trait;

use crate::error::RelayError;
use crate::traits::adapter::PluginAdapter;
use crate::types::Message;

/// Durable, append-only, arrival-ordered message log.
///
/// Each `append` is atomic from the perspective of readers.
#[async_trait]
pub trait MessageLog: PluginAdapter {
    /// Appends a message at the tail of the log.
    async fn append(&self, message: &Message) -> Result<(), RelayError>;

    /// Returns up to `limit` of the most recent messages, oldest first.
    async fn recent(&self, limit: usize) -> Result<Vec<Message>, RelayError>;
}
