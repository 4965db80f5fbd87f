//! Response DTOs.

use serde::{Deserialize, Serialize};

/// Standard success response wrapper.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiResponse<T: Serialize> {
    /// Whether the request was successful.
    pub success: bool,
    /// Response data.
    pub data: T,
}

impl<T: Serialize> ApiResponse<T> {
    /// Creates a successful response.
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data,
        }
    }
}

/// Simple message response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageResponse {
    /// Message.
    pub message: String,
}

impl MessageResponse {
    /// Wraps a message.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Count response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CountResponse {
    /// Count value.
    pub count: u64,
}

/// Queue position.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PositionResponse {
    /// 1-based FIFO position.
    pub position: u32,
}

/// Health check response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    /// Status.
    pub status: String,
    /// Version.
    pub version: String,
    /// Uptime.
    pub uptime_seconds: u64,
}

/// Detailed health response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DetailedHealthResponse {
    /// Overall status.
    pub status: String,
    /// Active storage backend.
    pub backend: String,
    /// Database status.
    pub database: String,
    /// WebSocket connections.
    pub ws_connections: usize,
    /// Users with at least one connection.
    pub connected_users: usize,
    /// Channels with at least one subscriber.
    pub channels: usize,
    /// Registered sweeps.
    pub sweeps: Vec<String>,
}
