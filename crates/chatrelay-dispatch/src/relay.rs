// SPDX-FileCopyrightText: 2026 Chatrelay Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Wiring of queue, outlet, intake and dispatcher into one relay.

use std::sync::Arc;
use std::time::Duration;

use chatrelay_config::ChatrelayConfig;
use chatrelay_core::traits::{BroadcastChannel, CompletionEndpoint, MessageLog};

use crate::backoff::{BackoffPolicy, Sleeper};
use crate::client::{CompletionClient, DEFAULT_MAX_TOKENS, DEFAULT_SYSTEM_PROMPT};
use crate::dispatcher::{DEFAULT_COOLDOWN, DispatchLoop, DispatcherHandle, dispatcher};
use crate::intake::{Intake, ReplyPolicy};
use crate::outlet::Outlet;
use crate::queue::OutboundQueue;

/// Tunables of a relay.
#[derive(Debug, Clone)]
pub struct RelaySettings {
    pub system_prompt: String,
    pub max_tokens: u32,
    pub backoff: BackoffPolicy,
    pub cooldown: Duration,
    pub reply_policy: ReplyPolicy,
}

impl Default for RelaySettings {
    fn default() -> Self {
        Self {
            system_prompt: DEFAULT_SYSTEM_PROMPT.to_string(),
            max_tokens: DEFAULT_MAX_TOKENS,
            backoff: BackoffPolicy::default(),
            cooldown: DEFAULT_COOLDOWN,
            reply_policy: ReplyPolicy::All,
        }
    }
}

impl RelaySettings {
    pub fn from_config(config: &ChatrelayConfig) -> Self {
        Self {
            system_prompt: config.completion.system_prompt.clone(),
            max_tokens: config.completion.max_tokens,
            backoff: BackoffPolicy::new(
                config.dispatcher.backoff_base(),
                config.dispatcher.max_attempts,
            ),
            cooldown: config.dispatcher.cooldown(),
            reply_policy: ReplyPolicy::from_config(&config.dispatcher),
        }
    }
}

/// The relay's front side: intake for inbound messages, the outlet for
/// subscribers, and a handle on the dispatcher.
#[derive(Clone)]
pub struct Relay {
    intake: Arc<Intake>,
    outlet: Arc<Outlet>,
    handle: DispatcherHandle,
}

impl Relay {
    /// Assemble a relay. The returned [`DispatchLoop`] must be spawned.
    pub fn new(
        settings: RelaySettings,
        endpoint: Arc<dyn CompletionEndpoint>,
        log: Arc<dyn MessageLog>,
        broadcast: Arc<dyn BroadcastChannel>,
        sleeper: Arc<dyn Sleeper>,
    ) -> (Self, DispatchLoop) {
        let queue = Arc::new(OutboundQueue::new());
        let outlet = Arc::new(Outlet::new(log, broadcast));

        let client = CompletionClient::new(endpoint, sleeper.clone())
            .with_policy(settings.backoff)
            .with_system_prompt(settings.system_prompt)
            .with_max_tokens(settings.max_tokens);

        let (handle, drain_loop) = dispatcher(
            queue.clone(),
            client,
            outlet.clone(),
            sleeper,
            settings.cooldown,
        );
        let intake = Arc::new(Intake::new(outlet.clone(), queue, settings.reply_policy));

        (
            Self {
                intake,
                outlet,
                handle,
            },
            drain_loop,
        )
    }

    pub fn intake(&self) -> &Arc<Intake> {
        &self.intake
    }

    pub fn outlet(&self) -> &Arc<Outlet> {
        &self.outlet
    }

    pub fn dispatcher(&self) -> &DispatcherHandle {
        &self.handle
    }
}
