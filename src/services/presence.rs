// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! In-process presence registry: logical user identity -> live connection.
//!
//! Ephemeral by design; rebuilt from scratch on restart. The registry is an
//! owned object created at startup and injected into the delivery engine.
//! Each mutation is a single dashmap operation, so no extra locking is
//! needed around register/unregister/lookup.

use crate::services::delivery::ServerEvent;
use dashmap::DashMap;
use serde::Serialize;
use tokio::sync::mpsc;
use uuid::Uuid;

/// Handle to one live connection: an id plus the outbound event channel.
///
/// Pushing to a handle is fire-and-forget; once the connection task is gone
/// the send fails and the event is dropped silently.
#[derive(Debug, Clone)]
pub struct ConnectionHandle {
    pub connection_id: Uuid,
    sender: mpsc::UnboundedSender<ServerEvent>,
}

impl ConnectionHandle {
    pub fn new(connection_id: Uuid, sender: mpsc::UnboundedSender<ServerEvent>) -> Self {
        Self {
            connection_id,
            sender,
        }
    }

    /// Push an event to the connection, dropping it if the task is gone.
    pub fn push(&self, event: ServerEvent) {
        let _ = self.sender.send(event);
    }
}

/// Roster entry visible to clients.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PresenceInfo {
    pub user_id: String,
    pub connection_id: Uuid,
}

/// Maps user ids to their live connection handle.
///
/// Reconnect policy: a second `register` for the same user REPLACES the
/// previous entry, so at most one connection per user is ever addressed.
/// The replaced socket keeps draining until it disconnects, and its
/// `unregister` will not evict the newer entry.
#[derive(Debug, Default)]
pub struct PresenceRegistry {
    entries: DashMap<String, ConnectionHandle>,
}

impl PresenceRegistry {
    pub fn new() -> Self {
        Self {
            entries: DashMap::new(),
        }
    }

    /// Insert or replace the entry for `user_id`.
    pub fn register(&self, user_id: &str, handle: ConnectionHandle) {
        let replaced = self.entries.insert(user_id.to_string(), handle);
        if let Some(old) = replaced {
            tracing::debug!(
                user_id,
                old_connection = %old.connection_id,
                "Presence entry replaced on reconnect"
            );
        }
    }

    /// Remove the entry whose connection id matches.
    ///
    /// A stale connection (already replaced by a reconnect) matches nothing
    /// and removes nothing.
    pub fn unregister(&self, connection_id: Uuid) {
        self.entries
            .retain(|_, handle| handle.connection_id != connection_id);
    }

    pub fn lookup(&self, user_id: &str) -> Option<ConnectionHandle> {
        self.entries.get(user_id).map(|entry| entry.value().clone())
    }

    /// Full current mapping, for roster broadcasts.
    pub fn roster(&self) -> Vec<PresenceInfo> {
        self.entries
            .iter()
            .map(|entry| PresenceInfo {
                user_id: entry.key().clone(),
                connection_id: entry.value().connection_id,
            })
            .collect()
    }

    /// Push an event to every live connection.
    pub fn broadcast(&self, event: &ServerEvent) {
        for entry in self.entries.iter() {
            entry.value().push(event.clone());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn handle() -> (ConnectionHandle, mpsc::UnboundedReceiver<ServerEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (ConnectionHandle::new(Uuid::new_v4(), tx), rx)
    }

    #[test]
    fn test_register_and_lookup() {
        let registry = PresenceRegistry::new();
        let (conn, _rx) = handle();
        let id = conn.connection_id;

        registry.register("alice", conn);

        assert_eq!(registry.lookup("alice").unwrap().connection_id, id);
        assert!(registry.lookup("bob").is_none());
    }

    #[test]
    fn test_reconnect_replaces_entry() {
        let registry = PresenceRegistry::new();
        let (first, _rx1) = handle();
        let (second, _rx2) = handle();
        let second_id = second.connection_id;

        registry.register("alice", first);
        registry.register("alice", second);

        assert_eq!(registry.roster().len(), 1);
        assert_eq!(registry.lookup("alice").unwrap().connection_id, second_id);
    }

    #[test]
    fn test_stale_disconnect_does_not_evict_replacement() {
        let registry = PresenceRegistry::new();
        let (first, _rx1) = handle();
        let first_id = first.connection_id;
        let (second, _rx2) = handle();

        registry.register("alice", first);
        registry.register("alice", second);

        // the replaced socket disconnects late
        registry.unregister(first_id);

        assert!(registry.lookup("alice").is_some());
    }

    #[test]
    fn test_unregister_removes_current_entry() {
        let registry = PresenceRegistry::new();
        let (conn, _rx) = handle();
        let id = conn.connection_id;

        registry.register("alice", conn);
        registry.unregister(id);

        assert!(registry.lookup("alice").is_none());
        assert!(registry.roster().is_empty());
    }

    #[test]
    fn test_broadcast_reaches_all_live_connections() {
        let registry = PresenceRegistry::new();
        let (a, mut rx_a) = handle();
        let (b, mut rx_b) = handle();
        registry.register("alice", a);
        registry.register("bob", b);

        registry.broadcast(&ServerEvent::GetUsers(registry.roster()));

        assert!(matches!(rx_a.try_recv().unwrap(), ServerEvent::GetUsers(_)));
        assert!(matches!(rx_b.try_recv().unwrap(), ServerEvent::GetUsers(_)));
    }

    #[test]
    fn test_push_to_dead_connection_is_silent() {
        let registry = PresenceRegistry::new();
        let (conn, rx) = handle();
        registry.register("alice", conn);
        drop(rx);

        // no panic, no error surfaced
        registry.broadcast(&ServerEvent::GetUsers(vec![]));
    }
}
