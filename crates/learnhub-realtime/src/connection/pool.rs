//! Connection pool: tracks all active connections indexed by user ID.

use std::sync::Arc;

use dashmap::DashMap;
use uuid::Uuid;

use super::handle::{ConnectionHandle, ConnectionId};

/// Thread-safe pool of all active WebSocket connections.
#[derive(Debug, Default)]
pub struct ConnectionPool {
    /// User ID → connection handles, oldest first.
    by_user: DashMap<Uuid, Vec<Arc<ConnectionHandle>>>,
    /// Connection ID → connection handle for direct lookup.
    by_id: DashMap<ConnectionId, Arc<ConnectionHandle>>,
}

impl ConnectionPool {
    /// Creates a new empty connection pool.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a connection. Returns `true` when it is the user's first.
    ///
    /// The check and the insert happen under the same shard lock, so two
    /// simultaneous first connections cannot both report `true`.
    pub fn add(&self, handle: Arc<ConnectionHandle>) -> bool {
        self.by_id.insert(handle.id, handle.clone());
        let mut connections = self.by_user.entry(handle.user_id).or_default();
        let first = connections.is_empty();
        connections.push(handle);
        first
    }

    /// Removes a connection. The flag is `true` when it was the user's last.
    pub fn remove(&self, conn_id: &ConnectionId) -> Option<(Arc<ConnectionHandle>, bool)> {
        let (_, handle) = self.by_id.remove(conn_id)?;
        let last = match self.by_user.get_mut(&handle.user_id) {
            Some(mut connections) => {
                connections.retain(|c| c.id != *conn_id);
                let empty = connections.is_empty();
                drop(connections);
                if empty {
                    self.by_user.remove_if(&handle.user_id, |_, c| c.is_empty());
                }
                empty
            }
            None => true,
        };
        Some((handle, last))
    }

    /// Gets all connections for a user.
    pub fn get_user_connections(&self, user_id: &Uuid) -> Vec<Arc<ConnectionHandle>> {
        self.by_user
            .get(user_id)
            .map(|entry| entry.value().clone())
            .unwrap_or_default()
    }

    /// Gets a specific connection by ID.
    pub fn get(&self, conn_id: &ConnectionId) -> Option<Arc<ConnectionHandle>> {
        self.by_id.get(conn_id).map(|entry| entry.value().clone())
    }

    /// Returns total number of active connections.
    pub fn connection_count(&self) -> usize {
        self.by_id.len()
    }

    /// Returns number of unique connected users.
    pub fn user_count(&self) -> usize {
        self.by_user.len()
    }

    /// Returns all connection handles.
    pub fn all_connections(&self) -> Vec<Arc<ConnectionHandle>> {
        self.by_id
            .iter()
            .map(|entry| entry.value().clone())
            .collect()
    }
}
