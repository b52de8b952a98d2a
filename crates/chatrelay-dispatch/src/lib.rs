// SPDX-FileCopyrightText: 2026 Chatrelay Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Outbound completion pipeline for the chatrelay server.
//!
//! Inbound messages enter through [`Intake`], are persisted and broadcast by
//! the [`Outlet`], and (policy permitting) become jobs on the
//! [`OutboundQueue`]. A single [`DispatchLoop`] drains that queue one job at
//! a time through the retrying [`CompletionClient`] and delivers each reply,
//! or a fallback notice, through the same outlet.

pub mod backoff;
pub mod client;
pub mod dispatcher;
pub mod intake;
pub mod outlet;
pub mod queue;
pub mod relay;

pub use backoff::{BackoffPolicy, Sleeper, TokioSleeper};
pub use client::CompletionClient;
pub use dispatcher::{
    DispatchLoop, DispatcherHandle, DispatcherState, DispatcherStats, RATE_LIMIT_FALLBACK,
    UNAVAILABLE_FALLBACK, dispatcher, fallback_text,
};
pub use intake::{Accepted, InboundMessage, Intake, ReplyPolicy};
pub use outlet::{Outlet, Subscription};
pub use queue::OutboundQueue;
pub use relay::{Relay, RelaySettings};
