// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Wire-format tests for the realtime event protocol.
//!
//! Clients depend on the exact event names (`addUser`, `getUsers`,
//! `send message`, `get message`) and camelCase payload keys.

use chrono::{TimeZone, Utc};
use learnhub::models::Message;
use learnhub::services::{ClientEvent, ServerEvent};
use serde_json::json;

#[test]
fn test_add_user_event_parses() {
    let raw = json!({"event": "addUser", "data": {"userId": "u1"}});

    let event: ClientEvent = serde_json::from_value(raw).unwrap();
    let ClientEvent::AddUser { user_id } = event else {
        panic!("expected addUser event");
    };
    assert_eq!(user_id, "u1");
}

#[test]
fn test_send_message_event_parses() {
    let raw = json!({
        "event": "send message",
        "data": {
            "senderId": "a",
            "receiverId": "b",
            "content": "hi",
            "chatroomId": "C123"
        }
    });

    let event: ClientEvent = serde_json::from_value(raw).unwrap();
    let ClientEvent::SendMessage(request) = event else {
        panic!("expected send message event");
    };
    assert_eq!(request.sender_id, "a");
    assert_eq!(request.receiver_id, "b");
    assert_eq!(request.chatroom_id, "C123");
}

#[test]
fn test_unknown_event_is_rejected() {
    let raw = json!({"event": "selfDestruct", "data": {}});
    assert!(serde_json::from_value::<ClientEvent>(raw).is_err());
}

#[test]
fn test_get_message_event_shape() {
    let message = Message {
        id: "m1".to_string(),
        sender: "a".to_string(),
        chatroom_id: "C123".to_string(),
        content: "hi".to_string(),
        created_at: Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap(),
    };

    let value = serde_json::to_value(ServerEvent::GetMessage(message)).unwrap();

    assert_eq!(value["event"], "get message");
    assert_eq!(value["data"]["sender"], "a");
    assert_eq!(value["data"]["chatroom_id"], "C123");
}

#[test]
fn test_get_users_event_shape() {
    let value = serde_json::to_value(ServerEvent::GetUsers(vec![])).unwrap();
    assert_eq!(value["event"], "getUsers");
    assert!(value["data"].as_array().unwrap().is_empty());
}
