// SPDX-FileCopyrightText: 2026 Chatrelay Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Completion endpoint trait for language-model API integrations.

use async_trait::async_trait;

use crate::error::CompletionError;
use crate::traits::adapter::PluginAdapter;
use crate::types::CompletionRequest;

/// A request/response completion API.
///
/// Each call is exactly one attempt. Implementations must map rate-limit
/// responses to [`CompletionError::RateLimited`] and every other failure to
/// [`CompletionError::Transport`]; retrying is the caller's business.
#[async_trait]
pub trait CompletionEndpoint: PluginAdapter {
    /// Sends one request and returns the generated text.
    async fn send(&self, request: &CompletionRequest) -> Result<String, CompletionError>;
}
