// SPDX-FileCopyrightText: 2026 Chatrelay Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error types for the chatrelay server.

use std::time::Duration;

use thiserror::Error;

/// Failure classes of a call to the completion endpoint.
///
/// `RateLimited` and `Transport` are produced by a single endpoint attempt.
/// `ExhaustedRetries` is produced only by the retrying completion client once
/// its attempt budget is spent.
#[derive(Debug, Error)]
pub enum CompletionError {
    /// The endpoint signalled rate limiting (HTTP 429 or equivalent).
    #[error("completion endpoint rate limited the request")]
    RateLimited {
        /// Server-suggested wait, when the endpoint provided one.
        retry_after: Option<Duration>,
    },

    /// Any non-rate-limit failure: network, auth, malformed response.
    #[error("completion transport error: {message}")]
    Transport {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Every attempt in the retry budget was rate limited.
    #[error("completion retries exhausted after {attempts} attempts")]
    ExhaustedRetries { attempts: u32 },
}

impl CompletionError {
    /// Shorthand for a transport error without an underlying source.
    pub fn transport(message: impl Into<String>) -> Self {
        Self::Transport {
            message: message.into(),
            source: None,
        }
    }

    /// Whether the caller may retry this error after a delay.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::RateLimited { .. })
    }
}

/// The primary error type used across chatrelay adapters and core operations.
#[derive(Debug, Error)]
pub enum RelayError {
    /// Configuration errors (missing API key, invalid header values, bad origins).
    #[error("configuration error: {0}")]
    Config(String),

    /// Durable-write or read failure in the message log.
    #[error("storage error: {source}")]
    Storage {
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Transport errors on the subscriber side (bind failure, socket errors).
    #[error("channel error: {message}")]
    Channel {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// A completion call failed.
    #[error(transparent)]
    Completion(#[from] CompletionError),

    /// An inbound message was rejected at intake.
    #[error("invalid message: {0}")]
    InvalidMessage(String),

    /// Internal or unexpected errors.
    #[error("internal error: {0}")]
    Internal(String),
}

impl RelayError {
    /// Wrap any error as a storage failure.
    pub fn storage<E>(err: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::Storage {
            source: Box::new(err),
        }
    }
}
