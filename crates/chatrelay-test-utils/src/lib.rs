// SPDX-FileCopyrightText: 2026 Chatrelay Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test utilities for chatrelay integration tests.
//!
//! Provides in-process stand-ins for every external collaborator of the
//! relay, so the dispatcher can be tested without network or disk.
//!
//! # Components
//!
//! - [`ScriptedEndpoint`] - completion endpoint that plays back a script
//! - [`MemoryLog`] - in-memory message log with failure injection
//! - [`RecordingBroadcast`] - broadcast channel that records every publish
//! - [`ManualSleeper`] - sleeper that records delays, optionally gated
//! - [`RelayHarness`] - a running relay wired to all of the above

pub mod harness;
pub mod memory_log;
pub mod mock_endpoint;
pub mod recording_broadcast;
pub mod sleeper;

pub use harness::{RelayHarness, RelayHarnessBuilder};
pub use memory_log::MemoryLog;
pub use mock_endpoint::{Scripted, ScriptedEndpoint};
pub use recording_broadcast::{Published, RecordingBroadcast};
pub use sleeper::ManualSleeper;
