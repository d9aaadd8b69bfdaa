// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Realtime delivery engine.
//!
//! Routes a message to live participant connections, falling back to the
//! receiver's unread counter when they are offline. The persisted message is
//! the durability point: a failed write aborts delivery entirely, while
//! failures after the write (presence push, counter bump) are logged and
//! never rolled back.

use crate::db::FirestoreDb;
use crate::error::AppError;
use crate::models::Message;
use crate::services::presence::{PresenceInfo, PresenceRegistry};
use async_trait::async_trait;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Events pushed from the server to realtime connections.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "event", content = "data")]
pub enum ServerEvent {
    /// Full roster broadcast after a connect or disconnect
    #[serde(rename = "getUsers")]
    GetUsers(Vec<PresenceInfo>),
    /// A delivered chat message
    #[serde(rename = "get message")]
    GetMessage(Message),
    /// Send failure surfaced to the sender only
    #[serde(rename = "error")]
    Error { message: String },
}

/// Events received from realtime clients.
#[derive(Debug, Deserialize)]
#[serde(tag = "event", content = "data")]
pub enum ClientEvent {
    #[serde(rename = "addUser")]
    AddUser {
        #[serde(rename = "userId")]
        user_id: String,
    },
    #[serde(rename = "send message")]
    SendMessage(SendMessageRequest),
}

/// Payload of a `send message` event.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SendMessageRequest {
    pub sender_id: String,
    pub receiver_id: String,
    pub content: String,
    pub chatroom_id: String,
}

/// Conversation-store operations the delivery engine depends on.
#[async_trait]
pub trait ConversationStore: Send + Sync {
    /// Append-only message write (the durability point).
    async fn append_message(&self, message: &Message) -> Result<(), AppError>;

    /// Atomic single-counter increment; false when no entry matched.
    async fn increment_unread(&self, chatroom_id: &str, user_id: &str) -> Result<bool, AppError>;
}

#[async_trait]
impl ConversationStore for FirestoreDb {
    async fn append_message(&self, message: &Message) -> Result<(), AppError> {
        FirestoreDb::append_message(self, message).await
    }

    async fn increment_unread(&self, chatroom_id: &str, user_id: &str) -> Result<bool, AppError> {
        FirestoreDb::increment_unread(self, chatroom_id, user_id).await
    }
}

/// Routes messages between live connections and the conversation store.
pub struct DeliveryEngine<S = FirestoreDb> {
    store: S,
    presence: Arc<PresenceRegistry>,
}

impl<S: ConversationStore> DeliveryEngine<S> {
    pub fn new(store: S, presence: Arc<PresenceRegistry>) -> Self {
        Self { store, presence }
    }

    /// Send a message: persist, then route.
    ///
    /// Exactly one unread increment per call when the receiver is offline
    /// (at-least-once across caller retries; each call is one logically new
    /// message). Errors from this method mean the message is NOT durable.
    pub async fn send_message(&self, request: SendMessageRequest) -> Result<Message, AppError> {
        if request.content.trim().is_empty() {
            return Err(AppError::Validation("message content is required".to_string()));
        }

        let message = Message::new(
            &request.sender_id,
            &request.chatroom_id,
            &request.content,
            Utc::now(),
        );

        // 1. Durability point. Failure aborts delivery.
        self.store.append_message(&message).await?;

        // 2. Resolve both participants' connections.
        let sender_conn = self.presence.lookup(&request.sender_id);
        let receiver_conn = self.presence.lookup(&request.receiver_id);

        // 3./4. Push to the live side(s); count for the offline receiver.
        let event = ServerEvent::GetMessage(message.clone());
        if let Some(conn) = &sender_conn {
            conn.push(event.clone());
        }

        match &receiver_conn {
            Some(conn) => conn.push(event),
            None => {
                match self
                    .store
                    .increment_unread(&request.chatroom_id, &request.receiver_id)
                    .await
                {
                    Ok(true) => {}
                    Ok(false) => tracing::warn!(
                        chatroom_id = %request.chatroom_id,
                        receiver_id = %request.receiver_id,
                        "No unread counter entry matched; increment skipped"
                    ),
                    // Message is already durable; the counter catches up on
                    // the next offline send at worst.
                    Err(e) => tracing::warn!(
                        error = %e,
                        chatroom_id = %request.chatroom_id,
                        "Failed to increment unread counter"
                    ),
                }
            }
        }

        tracing::debug!(
            message_id = %message.id,
            chatroom_id = %message.chatroom_id,
            receiver_live = receiver_conn.is_some(),
            "Message routed"
        );

        Ok(message)
    }
}
