//! Real-time WebSocket engine configuration.

use serde::{Deserialize, Serialize};

/// Real-time (WebSocket) engine configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RealtimeConfig {
    /// Maximum WebSocket connections per user. The oldest is dropped beyond it.
    #[serde(default = "default_max_connections_per_user")]
    pub max_connections_per_user: usize,
    /// Per-connection outbound buffer size.
    #[serde(default = "default_channel_buffer")]
    pub channel_buffer_size: usize,
    /// Server ping interval in seconds.
    #[serde(default = "default_ping_interval")]
    pub ping_interval_seconds: u64,
    /// Maximum channel subscriptions per connection.
    #[serde(default = "default_max_subscriptions")]
    pub max_subscriptions_per_connection: usize,
}

impl Default for RealtimeConfig {
    fn default() -> Self {
        Self {
            max_connections_per_user: default_max_connections_per_user(),
            channel_buffer_size: default_channel_buffer(),
            ping_interval_seconds: default_ping_interval(),
            max_subscriptions_per_connection: default_max_subscriptions(),
        }
    }
}

fn default_max_connections_per_user() -> usize {
    5
}

fn default_channel_buffer() -> usize {
    256
}

fn default_ping_interval() -> u64 {
    30
}

fn default_max_subscriptions() -> usize {
    50
}
