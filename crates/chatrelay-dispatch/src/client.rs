// SPDX-FileCopyrightText: 2026 Chatrelay Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Retrying completion client.
//!
//! Wraps a single-attempt [`CompletionEndpoint`] with the bounded
//! exponential backoff loop for rate-limit responses.

use std::sync::Arc;

use chatrelay_core::traits::CompletionEndpoint;
use chatrelay_core::types::CompletionRequest;
use chatrelay_core::CompletionError;
use tracing::{debug, warn};

use crate::backoff::{BackoffPolicy, Sleeper};

/// Default instruction sent as the system message of every request.
pub const DEFAULT_SYSTEM_PROMPT: &str =
    "Respond as if you are talking to a software professional with around 2 years of experience.";

/// Default output-length cap.
pub const DEFAULT_MAX_TOKENS: u32 = 150;

/// Turns one text into a reply, retrying while the endpoint rate limits.
#[derive(Clone)]
pub struct CompletionClient {
    endpoint: Arc<dyn CompletionEndpoint>,
    sleeper: Arc<dyn Sleeper>,
    policy: BackoffPolicy,
    system_prompt: String,
    max_tokens: u32,
}

impl CompletionClient {
    pub fn new(endpoint: Arc<dyn CompletionEndpoint>, sleeper: Arc<dyn Sleeper>) -> Self {
        Self {
            endpoint,
            sleeper,
            policy: BackoffPolicy::default(),
            system_prompt: DEFAULT_SYSTEM_PROMPT.to_string(),
            max_tokens: DEFAULT_MAX_TOKENS,
        }
    }

    pub fn with_policy(mut self, policy: BackoffPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn with_system_prompt(mut self, system_prompt: impl Into<String>) -> Self {
        self.system_prompt = system_prompt.into();
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    pub fn policy(&self) -> BackoffPolicy {
        self.policy
    }

    /// Requests a reply for `text`.
    ///
    /// A rate-limited attempt `n` is followed by a sleep of
    /// `policy.delay_for(n)` and another attempt, up to
    /// `policy.max_attempts()` attempts in total. The sleep also follows the
    /// last attempt, after which [`CompletionError::ExhaustedRetries`] is
    /// returned. Any other failure is returned at once.
    pub async fn complete(&self, text: &str) -> Result<String, CompletionError> {
        let request = CompletionRequest {
            system: self.system_prompt.clone(),
            prompt: text.to_string(),
            max_tokens: self.max_tokens,
        };
        let max_attempts = self.policy.max_attempts();

        for attempt in 0..max_attempts {
            match self.endpoint.send(&request).await {
                Ok(reply) => {
                    debug!(attempt, "completion succeeded");
                    return Ok(reply);
                }
                Err(CompletionError::RateLimited { retry_after }) => {
                    let delay = self.policy.delay_for(attempt);
                    warn!(
                        attempt,
                        delay_ms = delay.as_millis() as u64,
                        retry_after_secs = retry_after.map(|d| d.as_secs()),
                        "completion rate limited, backing off"
                    );
                    self.sleeper.sleep(delay).await;
                }
                Err(err) => {
                    debug!(attempt, error = %err, "completion failed without retry");
                    return Err(err);
                }
            }
        }

        Err(CompletionError::ExhaustedRetries {
            attempts: max_attempts,
        })
    }
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;
    use std::sync::Mutex;
    use std::time::Duration;

    use async_trait::async_trait;
    use chatrelay_core::traits::PluginAdapter;
    use chatrelay_core::types::{AdapterType, HealthStatus};
    use chatrelay_core::RelayError;
    use tracing_test::traced_test;

    use super::*;
    use crate::backoff::TokioSleeper;

    /// Pops one canned result per call and records the request it saw.
    struct Canned {
        results: Mutex<VecDeque<Result<String, CompletionError>>>,
        seen: Mutex<Vec<CompletionRequest>>,
    }

    impl Canned {
        fn new(results: Vec<Result<String, CompletionError>>) -> Arc<Self> {
            Arc::new(Self {
                results: Mutex::new(results.into()),
                seen: Mutex::new(Vec::new()),
            })
        }
    }

    #[async_trait]
    impl PluginAdapter for Canned {
        fn name(&self) -> &str {
            "canned"
        }
        fn adapter_type(&self) -> AdapterType {
            AdapterType::Completion
        }
        async fn health_check(&self) -> Result<HealthStatus, RelayError> {
            Ok(HealthStatus::Healthy)
        }
    }

    #[async_trait]
    impl CompletionEndpoint for Canned {
        async fn send(&self, request: &CompletionRequest) -> Result<String, CompletionError> {
            self.seen.lock().unwrap().push(request.clone());
            self.results
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Ok("default".into()))
        }
    }

    fn rate_limited() -> Result<String, CompletionError> {
        Err(CompletionError::RateLimited { retry_after: None })
    }

    #[tokio::test(start_paused = true)]
    async fn request_carries_system_prompt_and_cap() {
        let endpoint = Canned::new(vec![Ok("Hi!".into())]);
        let client = CompletionClient::new(endpoint.clone(), Arc::new(TokioSleeper))
            .with_system_prompt("be terse")
            .with_max_tokens(42);

        assert_eq!(client.complete("hello").await.unwrap(), "Hi!");
        let seen = endpoint.seen.lock().unwrap();
        assert_eq!(
            seen[0],
            CompletionRequest {
                system: "be terse".into(),
                prompt: "hello".into(),
                max_tokens: 42,
            }
        );
    }

    #[tokio::test(start_paused = true)]
    async fn recovers_after_two_rate_limits() {
        let endpoint = Canned::new(vec![rate_limited(), rate_limited(), Ok("late".into())]);
        let client = CompletionClient::new(endpoint.clone(), Arc::new(TokioSleeper));

        let start = tokio::time::Instant::now();
        assert_eq!(client.complete("hello").await.unwrap(), "late");
        assert!(start.elapsed() >= Duration::from_secs(3));
        assert_eq!(endpoint.seen.lock().unwrap().len(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn transport_error_is_not_retried() {
        let endpoint = Canned::new(vec![Err(CompletionError::transport("down"))]);
        let client = CompletionClient::new(endpoint.clone(), Arc::new(TokioSleeper));

        let start = tokio::time::Instant::now();
        let err = client.complete("hello").await.unwrap_err();
        assert!(matches!(err, CompletionError::Transport { .. }));
        assert_eq!(start.elapsed(), Duration::ZERO);
        assert_eq!(endpoint.seen.lock().unwrap().len(), 1);
    }

    #[traced_test]
    #[tokio::test(start_paused = true)]
    async fn rate_limit_is_logged_with_delay() {
        let endpoint = Canned::new(vec![rate_limited(), Ok("ok".into())]);
        let client = CompletionClient::new(endpoint, Arc::new(TokioSleeper));

        client.complete("hello").await.unwrap();
        assert!(logs_contain("completion rate limited, backing off"));
        assert!(logs_contain("delay_ms=1000"));
    }

    #[tokio::test(start_paused = true)]
    async fn custom_policy_bounds_attempts() {
        let endpoint = Canned::new(vec![rate_limited(), rate_limited(), rate_limited()]);
        let client = CompletionClient::new(endpoint.clone(), Arc::new(TokioSleeper))
            .with_policy(BackoffPolicy::new(Duration::from_millis(10), 2));

        let err = client.complete("hello").await.unwrap_err();
        assert!(matches!(err, CompletionError::ExhaustedRetries { attempts: 2 }));
        assert_eq!(endpoint.seen.lock().unwrap().len(), 2);
    }
}
