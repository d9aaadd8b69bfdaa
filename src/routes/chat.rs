// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Chat HTTP routes: chatrooms, conversation history, unread counters.

use crate::error::{AppError, Result};
use crate::models::{Chatroom, Message, PublicUser, UnreadCount};
use crate::AppState;
use axum::{
    extract::{Query, State},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;

/// Chat routes (require authentication; layered in routes/mod.rs).
pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/v1/chat/chatroom/create", post(create_chatroom))
        .route("/api/v1/chat/conversations/get", get(get_conversations))
        .route("/api/v1/chat/users/list", get(list_users))
        .route("/api/v1/chat/unread-counts/get", post(get_unread_counts))
        .route("/api/v1/chat/unread-counts/inc", post(inc_unread_count))
        .route("/api/v1/chat/unread-counts/dec", post(dec_unread_count))
}

// ─── Chatrooms ───────────────────────────────────────────────

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct CreateChatroomRequest {
    sender_id: String,
    receiver_id: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateChatroomResponse {
    pub message: String,
    pub chatroom_id: String,
}

/// Find or create the chatroom for a participant pair.
///
/// Idempotent: the pair resolves to one identity regardless of argument
/// order, and repeated calls return the existing id.
async fn create_chatroom(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<CreateChatroomRequest>,
) -> Result<Json<CreateChatroomResponse>> {
    if payload.sender_id.is_empty() || payload.receiver_id.is_empty() {
        return Err(AppError::Validation(
            "sender and receiver ids are both required".to_string(),
        ));
    }
    if payload.sender_id == payload.receiver_id {
        return Err(AppError::Validation(
            "a chatroom needs two distinct participants".to_string(),
        ));
    }

    let chatroom = state
        .db
        .find_or_create_chatroom(&payload.sender_id, &payload.receiver_id)
        .await?;

    Ok(Json(CreateChatroomResponse {
        message: "chatroom ready".to_string(),
        chatroom_id: chatroom.id,
    }))
}

// ─── Conversations ───────────────────────────────────────────

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ConversationsQuery {
    user_id: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConversationsResponse {
    pub success: bool,
    pub chatroom_list: Vec<Chatroom>,
    /// Full ordered message history per chatroom id
    pub user_conversations: HashMap<String, Vec<Message>>,
}

/// Every chatroom of a user plus its full message history.
async fn get_conversations(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ConversationsQuery>,
) -> Result<Json<ConversationsResponse>> {
    if query.user_id.is_empty() {
        return Err(AppError::Validation("userId is required".to_string()));
    }

    let chatroom_list = state.db.chatrooms_for_user(&query.user_id).await?;

    let mut user_conversations = HashMap::new();
    for chatroom in &chatroom_list {
        let messages = state.db.messages_for_chatroom(&chatroom.id).await?;
        user_conversations.insert(chatroom.id.clone(), messages);
    }

    Ok(Json(ConversationsResponse {
        success: true,
        chatroom_list,
        user_conversations,
    }))
}

/// Contact list for starting conversations.
async fn list_users(State(state): State<Arc<AppState>>) -> Result<Json<Vec<PublicUser>>> {
    let users = state.db.list_users().await?;
    Ok(Json(users.iter().map(PublicUser::from).collect()))
}

// ─── Unread Counters ─────────────────────────────────────────

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct UnreadCountsRequest {
    sender_id: String,
}

/// For each chatroom of the requester, the counterpart's unread entry.
async fn get_unread_counts(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<UnreadCountsRequest>,
) -> Result<Json<Vec<UnreadCount>>> {
    if payload.sender_id.is_empty() {
        return Err(AppError::Validation("sender id is required".to_string()));
    }

    let chatrooms = state.db.chatrooms_for_user(&payload.sender_id).await?;

    let counts = chatrooms
        .iter()
        .filter_map(|room| room.counterpart_unread(&payload.sender_id).cloned())
        .collect();

    Ok(Json(counts))
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct CounterRequest {
    user: String,
    chatroom_id: String,
}

#[derive(Serialize)]
pub struct CounterResponse {
    pub success: bool,
    pub message: String,
}

/// Increment one participant's unread counter. Silent no-op when no entry
/// matches the (chatroom, user) pair.
async fn inc_unread_count(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<CounterRequest>,
) -> Result<Json<CounterResponse>> {
    if payload.user.is_empty() || payload.chatroom_id.is_empty() {
        return Err(AppError::Validation(
            "user and chatroom id are required".to_string(),
        ));
    }

    state
        .db
        .increment_unread(&payload.chatroom_id, &payload.user)
        .await?;

    Ok(Json(CounterResponse {
        success: true,
        message: "count has been increased".to_string(),
    }))
}

/// Reset one participant's unread counter to zero ("mark read"). Despite the
/// route name this is a reset, not a decrement.
async fn dec_unread_count(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<CounterRequest>,
) -> Result<Json<CounterResponse>> {
    if payload.user.is_empty() || payload.chatroom_id.is_empty() {
        return Err(AppError::Validation(
            "user and chatroom id are required".to_string(),
        ));
    }

    state
        .db
        .reset_unread(&payload.chatroom_id, &payload.user)
        .await?;

    Ok(Json(CounterResponse {
        success: true,
        message: "count has been reset".to_string(),
    }))
}
