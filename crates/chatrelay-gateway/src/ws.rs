// SPDX-FileCopyrightText: 2026 Chatrelay Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! WebSocket handler for the shared chat room.
//!
//! Client -> Server (JSON):
//! ```json
//! {"text": "hello", "sender": "ana@example.com", "timestamp": "2026-01-01T00:00:00.000Z"}
//! ```
//!
//! Server -> Client (JSON):
//! ```json
//! {"type": "load_messages", "messages": [...]}
//! {"type": "message", "message": {"text": "...", "sender": "AI", "timestamp": "..."}}
//! ```

use axum::{
    extract::{
        State,
        ws::{Message as WsMessage, WebSocket, WebSocketUpgrade},
    },
    response::Response,
};
use futures::{SinkExt, StreamExt};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use chatrelay_core::types::{Message, SessionId};
use chatrelay_dispatch::{InboundMessage, Subscription};

use crate::server::GatewayState;

/// Frame sent from the server to a client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerFrame {
    /// History snapshot, oldest first. Always the first frame on a socket.
    LoadMessages { messages: Vec<Message> },
    /// One live message.
    Message { message: Message },
}

impl ServerFrame {
    fn to_ws(&self) -> Option<WsMessage> {
        match serde_json::to_string(self) {
            Ok(json) => Some(WsMessage::Text(json.into())),
            Err(e) => {
                warn!(error = %e, "failed to encode server frame");
                None
            }
        }
    }
}

/// Frame sent from a client.
#[derive(Debug, Deserialize)]
pub struct ClientFrame {
    pub text: String,
    pub sender: String,
    #[serde(default)]
    pub timestamp: Option<String>,
    #[serde(default)]
    pub session_id: Option<SessionId>,
}

impl From<ClientFrame> for InboundMessage {
    fn from(frame: ClientFrame) -> Self {
        Self {
            text: frame.text,
            sender: frame.sender,
            timestamp: frame.timestamp,
            session_id: frame.session_id,
        }
    }
}

/// WebSocket upgrade handler.
pub async fn ws_handler(ws: WebSocketUpgrade, State(state): State<GatewayState>) -> Response {
    ws.on_upgrade(|socket| handle_socket(socket, state))
}

async fn handle_socket(socket: WebSocket, state: GatewayState) {
    let ws_id = uuid::Uuid::new_v4().to_string();
    let (mut ws_sender, mut ws_receiver) = socket.split();
    let outlet = state.relay.outlet();

    let Subscription {
        history,
        mut stream,
    } = match outlet.subscribe_with_history(state.history_limit).await {
        Ok(subscription) => subscription,
        Err(e) => {
            warn!(ws_id = %ws_id, error = %e, "history unavailable, sending empty snapshot");
            Subscription {
                history: Vec::new(),
                stream: outlet.subscribe(),
            }
        }
    };

    info!(ws_id = %ws_id, history = history.len(), "client connected");

    if let Some(frame) = (ServerFrame::LoadMessages { messages: history }).to_ws()
        && ws_sender.send(frame).await.is_err()
    {
        info!(ws_id = %ws_id, "client disconnected before history was sent");
        return;
    }

    // Forward live messages to this client.
    let sender_ws_id = ws_id.clone();
    let mut sender_task = tokio::spawn(async move {
        while let Some(message) = stream.next().await {
            let Some(frame) = (ServerFrame::Message { message }).to_ws() else {
                continue;
            };
            if ws_sender.send(frame).await.is_err() {
                debug!(ws_id = %sender_ws_id, "socket closed while forwarding");
                break;
            }
        }
        let _ = ws_sender.close().await;
    });

    loop {
        let frame = tokio::select! {
            _ = state.shutdown.cancelled() => break,
            _ = &mut sender_task => break,
            frame = ws_receiver.next() => frame,
        };
        let Some(Ok(frame)) = frame else { break };

        match frame {
            WsMessage::Text(text) => {
                let incoming: ClientFrame = match serde_json::from_str(text.as_str()) {
                    Ok(v) => v,
                    Err(e) => {
                        warn!(ws_id = %ws_id, error = %e, "invalid WebSocket frame");
                        continue;
                    }
                };
                if let Err(e) = state.relay.intake().accept(incoming.into()).await {
                    warn!(ws_id = %ws_id, error = %e, "message rejected");
                }
            }
            WsMessage::Close(_) => break,
            _ => {} // Binary is ignored; ping/pong is answered by the protocol layer.
        }
    }

    sender_task.abort();
    info!(ws_id = %ws_id, "client disconnected");
}
