// SPDX-FileCopyrightText: 2026 Chatrelay Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP/WebSocket gateway for the chatrelay server.
//!
//! Exposes the shared chat room over `GET /ws` and a status endpoint at
//! `GET /health`. [`BroadcastHub`] is the in-process broadcast channel the
//! relay publishes into.

pub mod handlers;
pub mod hub;
pub mod server;
pub mod ws;

pub use hub::BroadcastHub;
pub use server::{GatewayState, router, serve, start_server};
pub use ws::{ClientFrame, ServerFrame};
