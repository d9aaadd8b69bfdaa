// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Realtime websocket endpoint.
//!
//! One socket per client. Events are JSON `{"event": ..., "data": ...}`:
//! `addUser` registers the connection in the presence registry (answered
//! with a `getUsers` roster broadcast to everyone), `send message` goes
//! through the delivery engine, and disconnect unconditionally unregisters
//! the connection and rebroadcasts the roster.

use crate::services::presence::ConnectionHandle;
use crate::services::{ClientEvent, ServerEvent};
use crate::AppState;
use axum::{
    extract::{
        ws::{Message as WsMessage, WebSocket, WebSocketUpgrade},
        State,
    },
    response::IntoResponse,
    routing::get,
    Router,
};
use futures_util::{SinkExt, StreamExt};
use std::sync::Arc;
use tokio::sync::mpsc;
use uuid::Uuid;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new().route("/ws", get(ws_handler))
}

async fn ws_handler(State(state): State<Arc<AppState>>, ws: WebSocketUpgrade) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(state, socket))
}

async fn handle_socket(state: Arc<AppState>, socket: WebSocket) {
    let connection_id = Uuid::new_v4();
    let (tx, mut rx) = mpsc::unbounded_channel::<ServerEvent>();
    let (mut sink, mut stream) = socket.split();

    // Forward queued server events to the socket until either side goes away.
    let forward_task = tokio::spawn(async move {
        while let Some(event) = rx.recv().await {
            let Ok(text) = serde_json::to_string(&event) else {
                continue;
            };
            if sink.send(WsMessage::Text(text.into())).await.is_err() {
                break;
            }
        }
    });

    tracing::debug!(connection_id = %connection_id, "Websocket connected");

    while let Some(Ok(message)) = stream.next().await {
        let text = match message {
            WsMessage::Text(text) => text,
            WsMessage::Close(_) => break,
            _ => continue,
        };

        let event = match serde_json::from_str::<ClientEvent>(&text) {
            Ok(event) => event,
            Err(e) => {
                tracing::debug!(connection_id = %connection_id, error = %e, "Ignoring malformed event");
                continue;
            }
        };

        match event {
            ClientEvent::AddUser { user_id } => {
                state
                    .presence
                    .register(&user_id, ConnectionHandle::new(connection_id, tx.clone()));
                state
                    .presence
                    .broadcast(&ServerEvent::GetUsers(state.presence.roster()));
            }
            ClientEvent::SendMessage(request) => {
                if let Err(e) = state.delivery.send_message(request).await {
                    // Surfaced to the sender only; the message is not durable.
                    let _ = tx.send(ServerEvent::Error {
                        message: e.to_string(),
                    });
                }
            }
        }
    }

    // Unconditional cleanup: in-flight sends referencing this connection
    // drop silently once the channel closes.
    state.presence.unregister(connection_id);
    state
        .presence
        .broadcast(&ServerEvent::GetUsers(state.presence.roster()));
    forward_task.abort();

    tracing::debug!(connection_id = %connection_id, "Websocket disconnected");
}
