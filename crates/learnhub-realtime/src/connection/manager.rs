//! Connection manager: connection lifecycle, subscriptions and fan-out.

use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::{debug, info, warn};
use uuid::Uuid;

use learnhub_core::config::RealtimeConfig;
use learnhub_entity::user::UserRole;

use crate::channel::{ChannelError, ChannelRegistry, ChannelType};

use super::handle::{ConnectionHandle, ConnectionId};
use super::pool::ConnectionPool;

/// Result of registering a connection.
#[derive(Debug)]
pub struct Registration {
    /// The new connection.
    pub handle: Arc<ConnectionHandle>,
    /// Frames to write to the socket.
    pub receiver: mpsc::Receiver<String>,
    /// Whether the user had no other connection.
    pub first_connection: bool,
}

/// Result of unregistering a connection.
#[derive(Debug)]
pub struct Departure {
    /// The removed connection.
    pub handle: Arc<ConnectionHandle>,
    /// Whether the user has no connection left.
    pub last_connection: bool,
}

/// Manages all active WebSocket connections.
#[derive(Debug)]
pub struct ConnectionManager {
    /// Connection pool.
    pool: ConnectionPool,
    /// Channel registry.
    channels: Arc<ChannelRegistry>,
    /// Configuration.
    config: RealtimeConfig,
}

impl ConnectionManager {
    /// Creates a new connection manager.
    pub fn new(config: RealtimeConfig, channels: Arc<ChannelRegistry>) -> Self {
        Self {
            pool: ConnectionPool::new(),
            channels,
            config,
        }
    }

    /// Registers a new authenticated connection.
    ///
    /// The connection is subscribed to its personal channel and to the
    /// global presence channel. When the user is already at the connection
    /// cap, the oldest connection is closed first.
    pub fn register(&self, user_id: Uuid, role: UserRole, username: String) -> Registration {
        let (tx, rx) = mpsc::channel(self.config.channel_buffer_size.max(1));
        let handle = Arc::new(ConnectionHandle::new(user_id, role, username, tx));

        let existing = self.pool.get_user_connections(&user_id);
        if existing.len() >= self.config.max_connections_per_user {
            warn!(
                user_id = %user_id,
                count = existing.len(),
                max = self.config.max_connections_per_user,
                "User at max connections, oldest will be replaced"
            );
            if let Some(oldest) = existing.first() {
                self.evict(&oldest.id);
            }
        }

        let first_connection = self.pool.add(handle.clone());
        self.channels.subscribe(ChannelType::User(user_id), handle.id);
        self.channels.subscribe(ChannelType::PresenceGlobal, handle.id);

        info!(
            conn_id = %handle.id,
            user_id = %user_id,
            first_connection,
            "WebSocket connection registered"
        );

        Registration {
            handle,
            receiver: rx,
            first_connection,
        }
    }

    /// Closes a connection without reporting a departure. The new
    /// connection that caused the eviction keeps the user online.
    fn evict(&self, conn_id: &ConnectionId) {
        if let Some((handle, _)) = self.pool.remove(conn_id) {
            handle.mark_closed();
            self.channels.unsubscribe_all(*conn_id);
        }
    }

    /// Unregisters a connection and cleans up subscriptions.
    ///
    /// Returns `None` when the connection was already gone, for example
    /// after an eviction.
    pub fn unregister(&self, conn_id: &ConnectionId) -> Option<Departure> {
        let (handle, last_connection) = self.pool.remove(conn_id)?;
        handle.mark_closed();
        self.channels.unsubscribe_all(*conn_id);

        info!(
            conn_id = %conn_id,
            user_id = %handle.user_id,
            last_connection,
            "WebSocket connection unregistered"
        );

        Some(Departure {
            handle,
            last_connection,
        })
    }

    /// Gets a live connection.
    pub fn get(&self, conn_id: &ConnectionId) -> Option<Arc<ConnectionHandle>> {
        self.pool.get(conn_id)
    }

    /// Subscribes a connection, enforcing the per-connection cap.
    ///
    /// Permission checks are the caller's job. Returns `false` when the
    /// connection was already subscribed.
    pub fn subscribe(
        &self,
        handle: &ConnectionHandle,
        channel: ChannelType,
    ) -> Result<bool, ChannelError> {
        let current = self.channels.subscription_count(handle.id);
        if current >= self.config.max_subscriptions_per_connection {
            return Err(ChannelError::LimitReached(
                self.config.max_subscriptions_per_connection,
            ));
        }
        let added = self.channels.subscribe(channel, handle.id);
        debug!(conn_id = %handle.id, channel = %channel, "Subscribed to channel");
        Ok(added)
    }

    /// Unsubscribes a connection. The personal channel is pinned.
    pub fn unsubscribe(
        &self,
        handle: &ConnectionHandle,
        channel: ChannelType,
    ) -> Result<bool, ChannelError> {
        if channel.is_pinned() {
            return Err(ChannelError::Pinned(channel.to_string()));
        }
        let removed = self.channels.unsubscribe(&channel, handle.id);
        debug!(conn_id = %handle.id, channel = %channel, "Unsubscribed from channel");
        Ok(removed)
    }

    /// Channels a connection is subscribed to.
    pub fn subscriptions(&self, conn_id: &ConnectionId) -> Vec<String> {
        self.channels.channels_of(*conn_id)
    }

    /// Sends a frame to every connection of a user.
    pub fn send_to_user(&self, user_id: &Uuid, frame: &str) -> usize {
        self.pool
            .get_user_connections(user_id)
            .iter()
            .filter(|conn| conn.send(frame.to_string()))
            .count()
    }

    /// Sends a frame to every subscriber of a channel.
    pub fn broadcast_to_channel(&self, channel: &ChannelType, frame: &str) -> usize {
        self.channels
            .get_subscribers(channel)
            .iter()
            .filter_map(|conn_id| self.pool.get(conn_id))
            .filter(|conn| conn.send(frame.to_string()))
            .count()
    }

    /// Closes all connections.
    pub fn close_all(&self) {
        let all = self.pool.all_connections();
        for conn in &all {
            self.evict(&conn.id);
        }
        info!(count = all.len(), "All connections closed");
    }

    /// Returns the total connection count.
    pub fn connection_count(&self) -> usize {
        self.pool.connection_count()
    }

    /// Returns the number of unique connected users.
    pub fn user_count(&self) -> usize {
        self.pool.user_count()
    }

    /// Checks if a user is currently connected.
    pub fn is_user_connected(&self, user_id: &Uuid) -> bool {
        !self.pool.get_user_connections(user_id).is_empty()
    }

    /// Returns the realtime configuration.
    pub fn config(&self) -> &RealtimeConfig {
        &self.config
    }
}
