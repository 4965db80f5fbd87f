//! Subscription tracking: which connections are subscribed to which channels.

use std::collections::HashSet;

use dashmap::DashMap;

use crate::connection::handle::ConnectionId;

use super::types::ChannelType;

/// Tracks connection-to-channel subscription mappings (reverse index).
#[derive(Debug, Default)]
pub struct SubscriptionTracker {
    /// Connection ID → set of channels.
    conn_to_channels: DashMap<ConnectionId, HashSet<ChannelType>>,
}

impl SubscriptionTracker {
    /// Creates a new subscription tracker.
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a subscription. Returns `false` when it already existed.
    pub fn add(&self, conn_id: ConnectionId, channel: ChannelType) -> bool {
        self.conn_to_channels
            .entry(conn_id)
            .or_default()
            .insert(channel)
    }

    /// Removes a subscription. Returns `false` when there was none.
    pub fn remove(&self, conn_id: ConnectionId, channel: &ChannelType) -> bool {
        self.conn_to_channels
            .get_mut(&conn_id)
            .map(|mut channels| channels.remove(channel))
            .unwrap_or(false)
    }

    /// Gets all channels a connection is subscribed to.
    pub fn get_channels(&self, conn_id: ConnectionId) -> HashSet<ChannelType> {
        self.conn_to_channels
            .get(&conn_id)
            .map(|entry| entry.value().clone())
            .unwrap_or_default()
    }

    /// Returns the number of subscriptions for a connection.
    pub fn count(&self, conn_id: ConnectionId) -> usize {
        self.conn_to_channels
            .get(&conn_id)
            .map(|entry| entry.value().len())
            .unwrap_or(0)
    }

    /// Removes all subscriptions for a connection.
    pub fn remove_all(&self, conn_id: ConnectionId) -> HashSet<ChannelType> {
        self.conn_to_channels
            .remove(&conn_id)
            .map(|(_, channels)| channels)
            .unwrap_or_default()
    }
}
