//! Authoritative mapping from live connections to player state
//!
//! Every accepted connection owns exactly one entry, created when the
//! connection becomes active and removed when it closes for any reason.
//! The registry itself is plain data; handlers share it as a
//! [`SharedRegistry`] and keep each lock for a single operation only, never
//! across a socket read or write.

use crate::client::{Client, ConnectionId};
use log::{info, warn};
use shared::Player;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

/// Registry handle cloned into every connection task.
pub type SharedRegistry = Arc<RwLock<PlayerRegistry>>;

pub fn shared_registry() -> SharedRegistry {
    Arc::new(RwLock::new(PlayerRegistry::new()))
}

/// Point-in-time copy of the registry, ordered by player identity.
pub type Snapshot = Vec<(Client, Player)>;

#[derive(Debug)]
struct Entry {
    client: Client,
    player: Player,
}

/// Players indexed by the connection they arrived on
#[derive(Debug, Default)]
pub struct PlayerRegistry {
    entries: HashMap<ConnectionId, Entry>,
}

impl PlayerRegistry {
    pub fn new() -> Self {
        Self {
            entries: HashMap::new(),
        }
    }

    /// Creates the player for a new connection
    ///
    /// The identity is one above the highest live identity, or 0 when the
    /// registry is empty. Identities of departed players are therefore handed
    /// out again once nobody above them remains. Registering a connection
    /// twice returns its existing player unchanged.
    ///
    /// Returns `None` when the highest live identity is already `u32::MAX`.
    pub fn register(&mut self, client: Client) -> Option<Player> {
        if let Some(entry) = self.entries.get(&client.id) {
            return Some(entry.player.clone());
        }

        let id = match self.entries.values().map(|entry| entry.player.id).max() {
            None => 0,
            Some(highest) => match highest.checked_add(1) {
                Some(id) => id,
                None => {
                    warn!(
                        "Refusing connection {} from {}: no player identity left above {}",
                        client.id, client.addr, highest
                    );
                    return None;
                }
            },
        };

        let player = Player::new(id);
        info!(
            "Player {} joined on connection {} from {}",
            id, client.id, client.addr
        );
        self.entries.insert(
            client.id,
            Entry {
                client,
                player: player.clone(),
            },
        );

        Some(player)
    }

    pub fn get(&self, connection: &ConnectionId) -> Option<Player> {
        self.entries
            .get(connection)
            .map(|entry| entry.player.clone())
    }

    /// Applies `change` to the connection's player and returns the result.
    ///
    /// Returns `None` without calling `change` when the connection is not
    /// registered.
    pub fn update<F>(&mut self, connection: &ConnectionId, change: F) -> Option<Player>
    where
        F: FnOnce(&mut Player),
    {
        let entry = self.entries.get_mut(connection)?;
        change(&mut entry.player);
        Some(entry.player.clone())
    }

    /// Removes the connection's player. Removing twice is harmless.
    pub fn remove(&mut self, connection: &ConnectionId) -> Option<Player> {
        let entry = self.entries.remove(connection)?;
        info!(
            "Player {} ({}) left from connection {}",
            entry.player.id, entry.player.name, connection
        );
        Some(entry.player)
    }

    pub fn snapshot(&self) -> Snapshot {
        let mut snapshot: Snapshot = self
            .entries
            .values()
            .map(|entry| (entry.client.clone(), entry.player.clone()))
            .collect();
        snapshot.sort_by_key(|(_, player)| player.id);
        snapshot
    }

    pub fn contains(&self, connection: &ConnectionId) -> bool {
        self.entries.contains_key(connection)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_approx_eq::assert_approx_eq;
    use std::net::SocketAddr;

    fn test_client(id: u64) -> Client {
        let addr: SocketAddr = "127.0.0.1:2525".parse().unwrap();
        Client::new(ConnectionId(id), addr).0
    }

    #[test]
    fn test_registry_creation() {
        let registry = PlayerRegistry::new();
        assert!(registry.is_empty());
        assert_eq!(registry.len(), 0);
        assert!(registry.snapshot().is_empty());
    }

    #[test]
    fn test_register_assigns_sequential_ids() {
        let mut registry = PlayerRegistry::new();

        let ids: Vec<u32> = (0..5)
            .map(|connection| registry.register(test_client(connection)).unwrap().id)
            .collect();

        assert_eq!(ids, vec![0, 1, 2, 3, 4]);
        assert_eq!(registry.len(), 5);
    }

    #[test]
    fn test_register_uses_defaults() {
        let mut registry = PlayerRegistry::new();
        let player = registry.register(test_client(10)).unwrap();

        assert_eq!(player.name, "UNASSIGNED");
        assert_eq!(player.color, "UNASSIGNED");
        assert_eq!(player.team, "UNASSIGNED");
        assert_eq!(registry.get(&ConnectionId(10)), Some(player));
    }

    #[test]
    fn test_register_twice_keeps_single_entry() {
        let mut registry = PlayerRegistry::new();
        let first = registry.register(test_client(1));
        let second = registry.register(test_client(1));

        assert_eq!(first, second);
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_identity_reused_after_highest_leaves() {
        let mut registry = PlayerRegistry::new();
        registry.register(test_client(1));
        registry.register(test_client(2));
        registry.register(test_client(3));

        registry.remove(&ConnectionId(3));
        assert_eq!(registry.register(test_client(4)).unwrap().id, 2);

        // A gap below the maximum is not filled.
        registry.remove(&ConnectionId(1));
        assert_eq!(registry.register(test_client(5)).unwrap().id, 3);
    }

    #[test]
    fn test_identity_restarts_when_empty() {
        let mut registry = PlayerRegistry::new();
        registry.register(test_client(1));
        registry.register(test_client(2));
        registry.remove(&ConnectionId(1));
        registry.remove(&ConnectionId(2));

        assert_eq!(registry.register(test_client(3)).unwrap().id, 0);
    }

    #[test]
    fn test_register_refuses_when_identities_run_out() {
        let mut registry = PlayerRegistry::new();
        registry.register(test_client(1));
        registry.update(&ConnectionId(1), |player| player.id = u32::MAX);

        assert_eq!(registry.register(test_client(2)), None);
        assert_eq!(registry.len(), 1);
        assert!(!registry.contains(&ConnectionId(2)));

        // Identities become available again once the top one leaves
        registry.remove(&ConnectionId(1));
        assert_eq!(registry.register(test_client(3)).unwrap().id, 0);
    }

    #[test]
    fn test_get_unknown_connection() {
        let registry = PlayerRegistry::new();
        assert_eq!(registry.get(&ConnectionId(99)), None);
    }

    #[test]
    fn test_update_player() {
        let mut registry = PlayerRegistry::new();
        registry.register(test_client(1));

        let updated = registry
            .update(&ConnectionId(1), |player| {
                player.name = "Alice".to_string();
                player.position.apply(Some(1.5), None, Some(-3.0));
            })
            .unwrap();

        assert_eq!(updated.name, "Alice");
        assert_approx_eq!(updated.position.x, 1.5);
        assert_approx_eq!(updated.position.y, 0.0);
        assert_approx_eq!(updated.position.z, -3.0);
        assert_eq!(registry.get(&ConnectionId(1)), Some(updated));
    }

    #[test]
    fn test_update_unknown_connection() {
        let mut registry = PlayerRegistry::new();
        let mut called = false;

        let updated = registry.update(&ConnectionId(7), |_| called = true);

        assert!(updated.is_none());
        assert!(!called);
    }

    #[test]
    fn test_remove_is_idempotent() {
        let mut registry = PlayerRegistry::new();
        registry.register(test_client(1));

        assert!(registry.remove(&ConnectionId(1)).is_some());
        assert!(registry.remove(&ConnectionId(1)).is_none());
        assert!(registry.is_empty());
        assert!(!registry.contains(&ConnectionId(1)));
    }

    #[test]
    fn test_snapshot_is_ordered_and_detached() {
        let mut registry = PlayerRegistry::new();
        for connection in [30, 10, 20] {
            registry.register(test_client(connection));
        }

        let snapshot = registry.snapshot();
        registry.remove(&ConnectionId(10));
        registry.update(&ConnectionId(20), |player| player.team = "red".to_string());

        let ids: Vec<u32> = snapshot.iter().map(|(_, player)| player.id).collect();
        let connections: Vec<ConnectionId> =
            snapshot.iter().map(|(client, _)| client.id).collect();
        assert_eq!(ids, vec![0, 1, 2]);
        assert_eq!(
            connections,
            vec![ConnectionId(30), ConnectionId(10), ConnectionId(20)]
        );
        assert_eq!(snapshot[2].1.team, "UNASSIGNED");
        assert_eq!(registry.len(), 2);
    }
}
