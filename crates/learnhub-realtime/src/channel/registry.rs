//! Channel registry: subscriber sets per channel plus the reverse index.

use std::collections::HashSet;

use dashmap::DashMap;

use crate::connection::handle::ConnectionId;

use super::subscription::SubscriptionTracker;
use super::types::ChannelType;

/// Registry of all active pub/sub channels.
///
/// A channel exists only while it has subscribers.
#[derive(Debug, Default)]
pub struct ChannelRegistry {
    /// Channel → subscribed connections.
    channels: DashMap<ChannelType, HashSet<ConnectionId>>,
    /// Reverse index.
    subscriptions: SubscriptionTracker,
}

impl ChannelRegistry {
    /// Creates a new channel registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Subscribes a connection to a channel. Returns `false` if already subscribed.
    pub fn subscribe(&self, channel: ChannelType, conn_id: ConnectionId) -> bool {
        self.channels.entry(channel).or_default().insert(conn_id);
        self.subscriptions.add(conn_id, channel)
    }

    /// Unsubscribes a connection from a channel. Returns `false` if it was not subscribed.
    pub fn unsubscribe(&self, channel: &ChannelType, conn_id: ConnectionId) -> bool {
        self.detach(channel, conn_id);
        self.subscriptions.remove(conn_id, channel)
    }

    /// Unsubscribes a connection from all channels.
    pub fn unsubscribe_all(&self, conn_id: ConnectionId) {
        for channel in self.subscriptions.remove_all(conn_id) {
            self.detach(&channel, conn_id);
        }
    }

    fn detach(&self, channel: &ChannelType, conn_id: ConnectionId) {
        if let Some(mut subscribers) = self.channels.get_mut(channel) {
            subscribers.remove(&conn_id);
            if subscribers.is_empty() {
                drop(subscribers);
                self.channels.remove_if(channel, |_, s| s.is_empty());
            }
        }
    }

    /// Returns all subscriber connection IDs for a channel.
    pub fn get_subscribers(&self, channel: &ChannelType) -> Vec<ConnectionId> {
        self.channels
            .get(channel)
            .map(|subscribers| subscribers.iter().copied().collect())
            .unwrap_or_default()
    }

    /// Channels a connection is subscribed to, as wire names.
    pub fn channels_of(&self, conn_id: ConnectionId) -> Vec<String> {
        let mut names: Vec<String> = self
            .subscriptions
            .get_channels(conn_id)
            .iter()
            .map(ToString::to_string)
            .collect();
        names.sort();
        names
    }

    /// Returns the subscription count for a connection.
    pub fn subscription_count(&self, conn_id: ConnectionId) -> usize {
        self.subscriptions.count(conn_id)
    }

    /// Returns subscriber count for a channel.
    pub fn channel_subscriber_count(&self, channel: &ChannelType) -> usize {
        self.channels.get(channel).map(|s| s.len()).unwrap_or(0)
    }

    /// Returns total number of active channels.
    pub fn channel_count(&self) -> usize {
        self.channels.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    #[test]
    fn test_empty_channels_are_dropped() {
        let registry = ChannelRegistry::new();
        let conn = Uuid::new_v4();
        let room = ChannelType::LiveSession(Uuid::new_v4());

        assert!(registry.subscribe(room, conn));
        assert!(!registry.subscribe(room, conn));
        assert_eq!(registry.channel_subscriber_count(&room), 1);

        assert!(registry.unsubscribe(&room, conn));
        assert!(!registry.unsubscribe(&room, conn));
        assert_eq!(registry.channel_count(), 0);
    }

    #[test]
    fn test_unsubscribe_all_clears_both_indexes() {
        let registry = ChannelRegistry::new();
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        registry.subscribe(ChannelType::PresenceGlobal, a);
        registry.subscribe(ChannelType::PresenceGlobal, b);
        registry.subscribe(ChannelType::User(a), a);

        registry.unsubscribe_all(a);

        assert_eq!(registry.subscription_count(a), 0);
        assert_eq!(registry.get_subscribers(&ChannelType::PresenceGlobal), vec![b]);
        assert_eq!(registry.channel_count(), 1);
    }
}
