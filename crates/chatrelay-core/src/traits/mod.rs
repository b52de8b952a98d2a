// SPDX-FileCopyrightText: 2026 Chatrelay Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Adapter trait definitions for the relay's external collaborators.

pub mod adapter;
pub mod broadcast;
pub mod completion;
pub mod log;

pub use adapter::PluginAdapter;
pub use broadcast::{BroadcastChannel, MessageStream};
pub use completion::CompletionEndpoint;
pub use log::MessageLog;
