// SPDX-FileCopyrightText: 2026 Chatrelay Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! A running relay wired to in-memory collaborators.

use std::sync::Arc;

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use chatrelay_core::types::Message;
use chatrelay_core::RelayError;
use chatrelay_dispatch::{
    Accepted, InboundMessage, Relay, RelaySettings, Sleeper, TokioSleeper,
};

use crate::memory_log::MemoryLog;
use crate::mock_endpoint::ScriptedEndpoint;
use crate::recording_broadcast::RecordingBroadcast;

/// Builder for [`RelayHarness`].
pub struct RelayHarnessBuilder {
    endpoint: ScriptedEndpoint,
    log: MemoryLog,
    settings: RelaySettings,
    sleeper: Arc<dyn Sleeper>,
}

impl Default for RelayHarnessBuilder {
    fn default() -> Self {
        Self {
            endpoint: ScriptedEndpoint::new(),
            log: MemoryLog::new(),
            settings: RelaySettings::default(),
            sleeper: Arc::new(TokioSleeper),
        }
    }
}

impl RelayHarnessBuilder {
    pub fn with_endpoint(mut self, endpoint: ScriptedEndpoint) -> Self {
        self.endpoint = endpoint;
        self
    }

    pub fn with_log(mut self, log: MemoryLog) -> Self {
        self.log = log;
        self
    }

    pub fn with_settings(mut self, settings: RelaySettings) -> Self {
        self.settings = settings;
        self
    }

    /// Sleeper for both backoff and cool-down. Defaults to tokio time, which
    /// pairs with `#[tokio::test(start_paused = true)]`.
    pub fn with_sleeper(mut self, sleeper: Arc<dyn Sleeper>) -> Self {
        self.sleeper = sleeper;
        self
    }

    /// Assemble the relay and spawn its dispatch loop.
    pub fn start(self) -> RelayHarness {
        let endpoint = Arc::new(self.endpoint);
        let log = Arc::new(self.log);
        let broadcast = Arc::new(RecordingBroadcast::new());

        let (relay, drain_loop) = Relay::new(
            self.settings,
            endpoint.clone(),
            log.clone(),
            broadcast.clone(),
            self.sleeper,
        );

        let cancel = CancellationToken::new();
        let task = tokio::spawn(drain_loop.run(cancel.clone()));

        RelayHarness {
            relay,
            endpoint,
            log,
            broadcast,
            cancel,
            task,
        }
    }
}

/// A relay with a spawned dispatcher, for end-to-end tests of the pipeline.
pub struct RelayHarness {
    pub relay: Relay,
    pub endpoint: Arc<ScriptedEndpoint>,
    pub log: Arc<MemoryLog>,
    pub broadcast: Arc<RecordingBroadcast>,
    cancel: CancellationToken,
    task: JoinHandle<()>,
}

impl RelayHarness {
    pub fn builder() -> RelayHarnessBuilder {
        RelayHarnessBuilder::default()
    }

    /// Harness whose endpoint replies with `replies` in order.
    pub fn with_replies<I, S>(replies: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::builder()
            .with_endpoint(ScriptedEndpoint::with_replies(replies))
            .start()
    }

    /// Feed one message through intake.
    pub async fn send(&self, text: &str, sender: &str) -> Result<Accepted, RelayError> {
        self.relay
            .intake()
            .accept(InboundMessage::new(text, sender))
            .await
    }

    /// Wait until every queued job has been answered.
    pub async fn drained(&self) {
        self.relay.dispatcher().wait_until_drained().await;
    }

    /// Everything broadcast so far, in order.
    pub fn published(&self) -> Vec<Message> {
        self.broadcast.messages()
    }

    /// `(sender, text)` pairs broadcast so far, in order.
    pub fn entries(&self) -> Vec<(String, String)> {
        self.broadcast.entries()
    }

    /// Stop the dispatcher and wait for it to exit.
    pub async fn shutdown(self) {
        self.cancel.cancel();
        let _ = self.task.await;
    }
}
