// SPDX-FileCopyrightText: 2026 Chatrelay Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! In-memory message log with failure injection.

use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use tokio::sync::Mutex;

use chatrelay_core::traits::{MessageLog, PluginAdapter};
use chatrelay_core::types::{AdapterType, HealthStatus, Message};
use chatrelay_core::RelayError;

/// A [`MessageLog`] backed by a `Vec`.
///
/// While [`set_failing`](MemoryLog::set_failing) is on, appends fail with a
/// storage error and nothing is recorded.
#[derive(Default)]
pub struct MemoryLog {
    messages: Mutex<Vec<Message>>,
    failing: AtomicBool,
}

impl MemoryLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Log pre-filled with `messages`, oldest first.
    pub fn with_messages(messages: Vec<Message>) -> Self {
        Self {
            messages: Mutex::new(messages),
            failing: AtomicBool::new(false),
        }
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub async fn messages(&self) -> Vec<Message> {
        self.messages.lock().await.clone()
    }

    pub async fn texts(&self) -> Vec<String> {
        self.messages
            .lock()
            .await
            .iter()
            .map(|m| m.text.clone())
            .collect()
    }
}

#[async_trait]
impl PluginAdapter for MemoryLog {
    fn name(&self) -> &str {
        "memory-log"
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Storage
    }

    async fn health_check(&self) -> Result<HealthStatus, RelayError> {
        if self.failing.load(Ordering::SeqCst) {
            Ok(HealthStatus::Degraded("append failures injected".into()))
        } else {
            Ok(HealthStatus::Healthy)
        }
    }
}

#[async_trait]
impl MessageLog for MemoryLog {
    async fn append(&self, message: &Message) -> Result<(), RelayError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(RelayError::storage(std::io::Error::other(
                "injected append failure",
            )));
        }
        self.messages.lock().await.push(message.clone());
        Ok(())
    }

    async fn recent(&self, limit: usize) -> Result<Vec<Message>, RelayError> {
        let messages = self.messages.lock().await;
        let start = messages.len().saturating_sub(limit);
        Ok(messages[start..].to_vec())
    }
}
