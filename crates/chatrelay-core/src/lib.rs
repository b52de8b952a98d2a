// SPDX-FileCopyrightText: 2026 Chatrelay Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Core library for the chatrelay server.
//!
//! This crate provides the message and job types, the error taxonomy, and the
//! adapter traits for the relay's external collaborators: the completion
//! endpoint, the persistent message log, and the broadcast channel.

pub mod error;
pub mod traits;
pub mod types;

pub use error::{CompletionError, RelayError};
pub use types::{
    AdapterType, CompletionRequest, HealthStatus, Job, Message, SYSTEM_SENDER, SessionId,
};

pub use traits::{BroadcastChannel, CompletionEndpoint, MessageLog, MessageStream, PluginAdapter};
