// SPDX-FileCopyrightText: 2026 Chatrelay Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Gateway HTTP server built on axum.
//!
//! Sets up routes, middleware, and shared state for the gateway.

use std::time::Instant;

use axum::{
    Router,
    http::{HeaderValue, Method},
    routing::get,
};
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use chatrelay_config::ServerConfig;
use chatrelay_core::RelayError;
use chatrelay_dispatch::Relay;

use crate::handlers;
use crate::ws;

/// Shared state for axum request handlers.
#[derive(Clone)]
pub struct GatewayState {
    pub relay: Relay,
    /// Messages sent in the `load_messages` snapshot.
    pub history_limit: usize,
    /// Process start time for uptime calculation.
    pub start_time: Instant,
    /// Cancelled on shutdown; open sockets close when it fires.
    pub shutdown: CancellationToken,
}

impl GatewayState {
    pub fn new(relay: Relay, history_limit: usize, shutdown: CancellationToken) -> Self {
        Self {
            relay,
            history_limit,
            start_time: Instant::now(),
            shutdown,
        }
    }
}

/// Build the gateway router:
/// - GET /health
/// - GET /ws
pub fn router(state: GatewayState, cors_origin: &str) -> Result<Router, RelayError> {
    let origin = HeaderValue::from_str(cors_origin)
        .map_err(|e| RelayError::Config(format!("invalid cors_origin {cors_origin:?}: {e}")))?;
    let cors = CorsLayer::new()
        .allow_origin(origin)
        .allow_methods([Method::GET, Method::POST]);

    Ok(Router::new()
        .route("/health", get(handlers::get_health))
        .route("/ws", get(ws::ws_handler))
        .with_state(state)
        .layer(cors)
        .layer(TraceLayer::new_for_http()))
}

/// Serve `app` on an already bound listener until `shutdown` is cancelled.
pub async fn serve(
    listener: TcpListener,
    app: Router,
    shutdown: CancellationToken,
) -> Result<(), RelayError> {
    axum::serve(listener, app)
        .with_graceful_shutdown(async move { shutdown.cancelled().await })
        .await
        .map_err(|e| RelayError::Channel {
            message: format!("gateway server error: {e}"),
            source: Some(Box::new(e)),
        })
}

/// Bind to the configured host:port and serve until the state's shutdown
/// token is cancelled.
pub async fn start_server(config: &ServerConfig, state: GatewayState) -> Result<(), RelayError> {
    let shutdown = state.shutdown.clone();
    let app = router(state, &config.cors_origin)?;

    let addr = config.bind_addr();
    let listener = TcpListener::bind(&addr)
        .await
        .map_err(|e| RelayError::Channel {
            message: format!("failed to bind gateway to {addr}: {e}"),
            source: Some(Box::new(e)),
        })?;

    tracing::info!("gateway listening on {addr}");
    serve(listener, app, shutdown).await
}
