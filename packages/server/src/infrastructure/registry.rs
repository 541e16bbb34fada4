//! Connection registry.
//!
//! The one structure mutated from many connection tasks concurrently. All
//! mutation goes through a mutex-guarded map; the raw collection is never
//! exposed to connection tasks. Broadcasts iterate over a point-in-time
//! snapshot (cloned per-connection senders), so the lock is never held across
//! a network write and a half-removed entry can never receive a delivery.

use std::collections::HashMap;

use tokio::sync::{Mutex, mpsc};

use crate::domain::{ChannelScope, ConnectionId, IdentityClaim, RegistryError};

/// Lifecycle state of a connection.
///
/// Entries are only ever inserted into the registry in `Active` state, which
/// requires a verified identity claim by construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Connecting,
    Authenticated,
    Active,
    Closing,
    Closed,
}

/// One open transport session and its attached identity.
pub struct ConnectionEntry {
    pub id: ConnectionId,
    pub claim: IdentityClaim,
    pub scope: Option<ChannelScope>,
    /// Non-blocking send queue for this connection's outbound frames. A slow
    /// reader fills its own queue; it cannot stall deliveries to its peers.
    pub sender: mpsc::UnboundedSender<String>,
    pub state: ConnectionState,
}

impl ConnectionEntry {
    /// Build an entry for a connection that has passed the handshake.
    pub fn new(
        id: ConnectionId,
        claim: IdentityClaim,
        scope: Option<ChannelScope>,
        sender: mpsc::UnboundedSender<String>,
    ) -> Self {
        Self {
            id,
            claim,
            scope,
            sender,
            state: ConnectionState::Authenticated,
        }
    }
}

/// Point-in-time view of one registry entry, safe to iterate after the
/// registry lock has been released.
#[derive(Clone)]
pub struct ConnectionSnapshot {
    pub id: ConnectionId,
    pub username: String,
    pub sender: mpsc::UnboundedSender<String>,
    pub state: ConnectionState,
}

/// Concurrency-safe set of open connections, keyed by connection id.
pub struct ConnectionRegistry {
    connections: Mutex<HashMap<ConnectionId, ConnectionEntry>>,
}

impl ConnectionRegistry {
    pub fn new() -> Self {
        Self {
            connections: Mutex::new(HashMap::new()),
        }
    }

    /// Register an authenticated connection, promoting it to `Active`.
    ///
    /// Fails if the id is already present. Ids come from a monotonic counter,
    /// so a duplicate here means a caller bug, not a race to paper over.
    pub async fn add(&self, mut entry: ConnectionEntry) -> Result<(), RegistryError> {
        let mut connections = self.connections.lock().await;
        if connections.contains_key(&entry.id) {
            return Err(RegistryError::DuplicateId(entry.id));
        }
        entry.state = ConnectionState::Active;
        connections.insert(entry.id, entry);
        Ok(())
    }

    /// Deregister a connection. Removing an absent id is a no-op so that
    /// double-close races stay harmless.
    pub async fn remove(&self, id: ConnectionId) {
        let mut connections = self.connections.lock().await;
        connections.remove(&id);
    }

    /// Copy-on-read view of the `Active` connections in the given scope,
    /// ordered by connection id. `None` selects the global room.
    pub async fn snapshot(&self, scope: Option<&ChannelScope>) -> Vec<ConnectionSnapshot> {
        let connections = self.connections.lock().await;
        let mut entries: Vec<ConnectionSnapshot> = connections
            .values()
            .filter(|entry| entry.state == ConnectionState::Active)
            .filter(|entry| entry.scope.as_ref() == scope)
            .map(|entry| ConnectionSnapshot {
                id: entry.id,
                username: entry.claim.username.clone(),
                sender: entry.sender.clone(),
                state: entry.state,
            })
            .collect();
        entries.sort_by_key(|entry| entry.id);
        entries
    }

    /// Number of currently registered connections.
    pub async fn len(&self) -> usize {
        let connections = self.connections.lock().await;
        connections.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

impl Default for ConnectionRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    fn claim(username: &str) -> IdentityClaim {
        IdentityClaim {
            user_id: format!("u-{username}"),
            username: username.to_string(),
            avatar_color: None,
        }
    }

    fn entry(id: u64, username: &str, scope: Option<ChannelScope>) -> ConnectionEntry {
        let (tx, _rx) = mpsc::unbounded_channel();
        ConnectionEntry::new(ConnectionId::new(id), claim(username), scope, tx)
    }

    #[tokio::test]
    async fn test_add_promotes_entry_to_active() {
        // given:
        let registry = ConnectionRegistry::new();

        // when:
        registry.add(entry(1, "alice", None)).await.unwrap();

        // then:
        let snapshot = registry.snapshot(None).await;
        assert_eq!(snapshot.len(), 1);
        assert_eq!(snapshot[0].state, ConnectionState::Active);
        assert_eq!(snapshot[0].username, "alice");
    }

    #[tokio::test]
    async fn test_add_rejects_duplicate_id() {
        // given:
        let registry = ConnectionRegistry::new();
        registry.add(entry(1, "alice", None)).await.unwrap();

        // when:
        let result = registry.add(entry(1, "impostor", None)).await;

        // then:
        assert_eq!(result, Err(RegistryError::DuplicateId(ConnectionId::new(1))));
        assert_eq!(registry.len().await, 1);
    }

    #[tokio::test]
    async fn test_remove_is_idempotent() {
        // given:
        let registry = ConnectionRegistry::new();
        registry.add(entry(1, "alice", None)).await.unwrap();

        // when: remove twice in a row
        registry.remove(ConnectionId::new(1)).await;
        registry.remove(ConnectionId::new(1)).await;

        // then: same observable effect as removing once
        assert!(registry.is_empty().await);
    }

    #[tokio::test]
    async fn test_snapshot_is_ordered_by_connection_id() {
        // given:
        let registry = ConnectionRegistry::new();
        registry.add(entry(3, "charlie", None)).await.unwrap();
        registry.add(entry(1, "alice", None)).await.unwrap();
        registry.add(entry(2, "bob", None)).await.unwrap();

        // when:
        let snapshot = registry.snapshot(None).await;

        // then:
        let usernames: Vec<&str> = snapshot.iter().map(|e| e.username.as_str()).collect();
        assert_eq!(usernames, vec!["alice", "bob", "charlie"]);
    }

    #[tokio::test]
    async fn test_snapshot_filters_by_scope() {
        // given:
        let registry = ConnectionRegistry::new();
        let tomatoes = ChannelScope::new("garden-1".to_string(), "tomatoes".to_string()).unwrap();
        let herbs = ChannelScope::new("garden-1".to_string(), "herbs".to_string()).unwrap();
        registry.add(entry(1, "alice", Some(tomatoes.clone()))).await.unwrap();
        registry.add(entry(2, "bob", Some(herbs))).await.unwrap();
        registry.add(entry(3, "charlie", None)).await.unwrap();

        // when:
        let scoped = registry.snapshot(Some(&tomatoes)).await;
        let global = registry.snapshot(None).await;

        // then:
        assert_eq!(scoped.len(), 1);
        assert_eq!(scoped[0].username, "alice");
        assert_eq!(global.len(), 1);
        assert_eq!(global[0].username, "charlie");
    }

    #[tokio::test]
    async fn test_snapshot_is_stable_against_concurrent_removal() {
        // given:
        let registry = ConnectionRegistry::new();
        registry.add(entry(1, "alice", None)).await.unwrap();
        registry.add(entry(2, "bob", None)).await.unwrap();

        // when: snapshot taken, then an entry removed before iteration
        let snapshot = registry.snapshot(None).await;
        registry.remove(ConnectionId::new(2)).await;

        // then: the snapshot still holds both entries; sends to the removed
        // one go to its queue, which its task drains or drops on close
        assert_eq!(snapshot.len(), 2);
        assert_eq!(registry.len().await, 1);
    }

    #[tokio::test]
    async fn test_concurrent_add_and_remove_burst() {
        // given: 100 tasks each register and deregister one connection
        let registry = Arc::new(ConnectionRegistry::new());

        // when:
        let mut handles = Vec::new();
        for i in 0..100u64 {
            let registry = registry.clone();
            handles.push(tokio::spawn(async move {
                registry
                    .add(entry(i + 1, &format!("user{i}"), None))
                    .await
                    .unwrap();
                let len = registry.len().await;
                registry.remove(ConnectionId::new(i + 1)).await;
                len
            }));
        }
        let mut max_seen = 0;
        for handle in handles {
            max_seen = max_seen.max(handle.await.unwrap());
        }

        // then: never more than 100 entries, and the burst drains cleanly
        assert!(max_seen <= 100);
        assert!(registry.is_empty().await);
    }
}
