// SPDX-FileCopyrightText: 2026 Chatrelay Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! OpenAI-compatible completion endpoint for chatrelay.
//!
//! Implements [`CompletionEndpoint`] on top of the chat-completions HTTP API:
//! one request per call, system instruction first, then the user text.

pub mod client;
pub mod types;

use async_trait::async_trait;
use chatrelay_config::CompletionConfig;
use chatrelay_core::traits::{CompletionEndpoint, PluginAdapter};
use chatrelay_core::types::{AdapterType, CompletionRequest, HealthStatus};
use chatrelay_core::{CompletionError, RelayError};
use tracing::{debug, info};

use crate::client::OpenAiClient;
use crate::types::{ChatMessage, ChatRequest};

/// Chat-completions endpoint.
///
/// API key resolution order: config, then `OPENAI_API_KEY`, then error.
pub struct OpenAiEndpoint {
    client: OpenAiClient,
    model: String,
}

impl OpenAiEndpoint {
    pub fn new(config: &CompletionConfig) -> Result<Self, RelayError> {
        let api_key = resolve_api_key(config.api_key.as_deref())?;
        let client = OpenAiClient::new(
            &api_key,
            config.base_url.clone(),
            config.request_timeout(),
        )?;

        info!(
            model = %config.model,
            url = %config.base_url,
            "completion endpoint initialized"
        );

        Ok(Self {
            client,
            model: config.model.clone(),
        })
    }

    pub fn model(&self) -> &str {
        &self.model
    }
}

#[async_trait]
impl PluginAdapter for OpenAiEndpoint {
    fn name(&self) -> &str {
        "openai"
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Completion
    }

    async fn health_check(&self) -> Result<HealthStatus, RelayError> {
        // Probing the API would spend tokens; a constructed client is healthy.
        Ok(HealthStatus::Healthy)
    }
}

#[async_trait]
impl CompletionEndpoint for OpenAiEndpoint {
    async fn send(&self, request: &CompletionRequest) -> Result<String, CompletionError> {
        let api_request = ChatRequest {
            model: self.model.clone(),
            messages: vec![
                ChatMessage::system(&request.system),
                ChatMessage::user(&request.prompt),
            ],
            max_tokens: request.max_tokens,
        };

        let response = self.client.chat(&api_request).await?;
        if let Some(usage) = &response.usage {
            debug!(
                prompt_tokens = usage.prompt_tokens,
                completion_tokens = usage.completion_tokens,
                "completion usage"
            );
        }

        response
            .first_text()
            .map(|text| text.trim().to_string())
            .ok_or_else(|| CompletionError::transport("completion response contained no text"))
    }
}

fn resolve_api_key(config_key: Option<&str>) -> Result<String, RelayError> {
    if let Some(key) = config_key
        && !key.is_empty()
    {
        return Ok(key.to_string());
    }

    std::env::var("OPENAI_API_KEY")
        .ok()
        .filter(|key| !key.is_empty())
        .ok_or_else(|| {
            RelayError::Config(
                "OpenAI API key not found. Set completion.api_key in config or the OPENAI_API_KEY environment variable.".into(),
            )
        })
}
