// SPDX-FileCopyrightText: 2026 Chatrelay Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `chatrelay serve` command implementation.
//!
//! Opens the SQLite message log, builds the OpenAI completion endpoint,
//! assembles the relay and serves the gateway until a shutdown signal.

use std::sync::Arc;
use std::time::Duration;

use chatrelay_config::ChatrelayConfig;
use chatrelay_core::RelayError;
use chatrelay_core::traits::{BroadcastChannel, CompletionEndpoint, MessageLog};
use chatrelay_dispatch::{DispatchLoop, Relay, RelaySettings, TokioSleeper};
use chatrelay_gateway::{BroadcastHub, GatewayState};
use chatrelay_openai::OpenAiEndpoint;
use chatrelay_storage::SqliteMessageLog;
use tracing::{error, info, warn};

use crate::shutdown;

/// Upper bound on waiting for the in-flight job after shutdown is requested.
///
/// Covers a full backoff schedule (31 s) plus one request timeout.
const DISPATCH_GRACE: Duration = Duration::from_secs(65);

/// Everything `serve` needs, assembled but not yet running.
pub(crate) struct Assembled {
    pub relay: Relay,
    pub drain_loop: DispatchLoop,
    pub log: Arc<SqliteMessageLog>,
}

/// Open storage and wire the relay against `endpoint`.
pub(crate) async fn assemble(
    config: &ChatrelayConfig,
    endpoint: Arc<dyn CompletionEndpoint>,
) -> Result<Assembled, RelayError> {
    let log = Arc::new(SqliteMessageLog::open(&config.storage).await?);
    let hub: Arc<dyn BroadcastChannel> = Arc::new(BroadcastHub::default());
    let message_log: Arc<dyn MessageLog> = log.clone();

    let (relay, drain_loop) = Relay::new(
        RelaySettings::from_config(config),
        endpoint,
        message_log,
        hub,
        Arc::new(TokioSleeper),
    );

    Ok(Assembled {
        relay,
        drain_loop,
        log,
    })
}

/// Runs the `chatrelay serve` command.
pub async fn run_serve(config: ChatrelayConfig) -> Result<(), RelayError> {
    init_tracing(&config.server.log_level);

    let endpoint = OpenAiEndpoint::new(&config.completion)?;
    info!(model = endpoint.model(), "completion endpoint ready");

    let Assembled {
        relay,
        drain_loop,
        log,
    } = assemble(&config, Arc::new(endpoint)).await?;

    let cancel = shutdown::install_signal_handler();
    let dispatch_task = tokio::spawn(drain_loop.run(cancel.child_token()));

    let state = GatewayState::new(relay, config.server.history_limit, cancel.clone());
    let served = chatrelay_gateway::start_server(&config.server, state).await;
    if let Err(e) = &served {
        error!(error = %e, "gateway stopped with an error");
    }
    // A bind failure returns before any signal; stop the dispatcher too.
    cancel.cancel();

    drain_dispatcher(dispatch_task).await;

    if let Err(e) = log.close().await {
        warn!(error = %e, "failed to checkpoint message log on shutdown");
    }
    info!("chatrelay stopped");
    served
}

async fn drain_dispatcher(task: tokio::task::JoinHandle<()>) {
    match tokio::time::timeout(DISPATCH_GRACE, task).await {
        Ok(Ok(())) => {}
        Ok(Err(e)) => error!(error = %e, "dispatcher task failed"),
        Err(_) => warn!(
            grace_secs = DISPATCH_GRACE.as_secs(),
            "dispatcher did not finish in time, abandoning in-flight job"
        ),
    }
}

/// Initialize the tracing subscriber with an env filter.
fn init_tracing(log_level: &str) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("chatrelay={log_level},warn")));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_names(false)
        .init();
}
