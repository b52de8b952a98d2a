// SPDX-FileCopyrightText: 2026 Chatrelay Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP request handlers.

use axum::{Json, extract::State};
use serde::Serialize;

use chatrelay_core::traits::PluginAdapter;
use chatrelay_dispatch::DispatcherState;

use crate::server::GatewayState;

/// Response body for GET /health.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// `ok`, or `degraded` when the message log is unhealthy.
    pub status: &'static str,
    pub uptime_secs: u64,
    pub dispatcher: DispatcherSnapshot,
    /// Connected WebSocket clients.
    pub subscribers: usize,
}

#[derive(Debug, Serialize)]
pub struct DispatcherSnapshot {
    pub state: DispatcherState,
    pub queued: usize,
    pub jobs_completed: u64,
    pub fallbacks_sent: u64,
}

/// GET /health
pub async fn get_health(State(state): State<GatewayState>) -> Json<HealthResponse> {
    let handle = state.relay.dispatcher();
    let stats = handle.stats();
    let outlet = state.relay.outlet();

    let status = match outlet.log().health_check().await {
        Ok(health) if health.is_healthy() => "ok",
        _ => "degraded",
    };

    Json(HealthResponse {
        status,
        uptime_secs: state.start_time.elapsed().as_secs(),
        dispatcher: DispatcherSnapshot {
            state: handle.state(),
            queued: handle.queued().await,
            jobs_completed: stats.jobs_completed,
            fallbacks_sent: stats.fallbacks_sent,
        },
        subscribers: outlet.subscriber_count(),
    })
}
