// SPDX-FileCopyrightText: 2026 Chatrelay Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Scripted completion endpoint for deterministic testing.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::Mutex;
use tokio::time::Instant;

use chatrelay_core::traits::{CompletionEndpoint, PluginAdapter};
use chatrelay_core::types::{AdapterType, CompletionRequest, HealthStatus};
use chatrelay_core::{CompletionError, RelayError};

/// One scripted outcome of a `send` call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Scripted {
    Reply(String),
    RateLimited,
    Transport(String),
}

impl Scripted {
    fn into_result(self) -> Result<String, CompletionError> {
        match self {
            Self::Reply(text) => Ok(text),
            Self::RateLimited => Err(CompletionError::RateLimited { retry_after: None }),
            Self::Transport(message) => Err(CompletionError::transport(message)),
        }
    }
}

/// A completion endpoint that returns scripted outcomes in order.
///
/// Once the script runs out every call gets the `otherwise` outcome
/// (`Reply("mock reply")` unless overridden). Every call is recorded along
/// with the peak number of overlapping calls.
pub struct ScriptedEndpoint {
    script: Mutex<VecDeque<Scripted>>,
    otherwise: Scripted,
    latency: Duration,
    prompts: Mutex<Vec<String>>,
    call_times: Mutex<Vec<Instant>>,
    calls: AtomicUsize,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

impl ScriptedEndpoint {
    pub fn new() -> Self {
        Self {
            script: Mutex::new(VecDeque::new()),
            otherwise: Scripted::Reply("mock reply".to_string()),
            latency: Duration::ZERO,
            prompts: Mutex::new(Vec::new()),
            call_times: Mutex::new(Vec::new()),
            calls: AtomicUsize::new(0),
            in_flight: AtomicUsize::new(0),
            max_in_flight: AtomicUsize::new(0),
        }
    }

    /// Endpoint that replies with each text in turn.
    pub fn with_replies<I, S>(replies: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        replies
            .into_iter()
            .fold(Self::new(), |endpoint, reply| endpoint.then_reply(reply))
    }

    /// Endpoint on which every call is rate limited.
    pub fn always_rate_limited() -> Self {
        Self::new().otherwise(Scripted::RateLimited)
    }

    pub fn then(mut self, outcome: Scripted) -> Self {
        self.script.get_mut().push_back(outcome);
        self
    }

    pub fn then_reply(self, text: impl Into<String>) -> Self {
        self.then(Scripted::Reply(text.into()))
    }

    pub fn then_rate_limited(self, times: usize) -> Self {
        (0..times).fold(self, |endpoint, _| endpoint.then(Scripted::RateLimited))
    }

    pub fn then_transport(self, message: impl Into<String>) -> Self {
        self.then(Scripted::Transport(message.into()))
    }

    /// Outcome once the script is exhausted.
    pub fn otherwise(mut self, outcome: Scripted) -> Self {
        self.otherwise = outcome;
        self
    }

    /// Simulated time each call takes before resolving.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Highest number of calls that were in progress at the same time.
    pub fn max_concurrency(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    /// Prompts in call order.
    pub async fn prompts(&self) -> Vec<String> {
        self.prompts.lock().await.clone()
    }

    /// Start time of each call, in call order.
    pub async fn call_times(&self) -> Vec<Instant> {
        self.call_times.lock().await.clone()
    }
}

impl Default for ScriptedEndpoint {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PluginAdapter for ScriptedEndpoint {
    fn name(&self) -> &str {
        "scripted-endpoint"
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Completion
    }

    async fn health_check(&self) -> Result<HealthStatus, RelayError> {
        Ok(HealthStatus::Healthy)
    }
}

#[async_trait]
impl CompletionEndpoint for ScriptedEndpoint {
    async fn send(&self, request: &CompletionRequest) -> Result<String, CompletionError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);

        self.prompts.lock().await.push(request.prompt.clone());
        self.call_times.lock().await.push(Instant::now());

        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }

        let outcome = self
            .script
            .lock()
            .await
            .pop_front()
            .unwrap_or_else(|| self.otherwise.clone());

        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        outcome.into_result()
    }
}
