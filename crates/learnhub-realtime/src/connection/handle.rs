//! Individual WebSocket connection handle.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::{RwLock, mpsc};
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use learnhub_entity::user::UserRole;

/// Unique connection identifier
pub type ConnectionId = Uuid;

/// A handle to a single WebSocket connection.
///
/// Holds the sender for pushing serialized frames to the socket task,
/// plus metadata about the connected user. Closing the handle cancels
/// its token, which ends the socket task.
#[derive(Debug)]
pub struct ConnectionHandle {
    /// Unique connection ID
    pub id: ConnectionId,
    /// User who owns this connection
    pub user_id: Uuid,
    /// User's role (cached for permission checks)
    pub user_role: UserRole,
    /// Username (cached for logs)
    pub username: String,
    /// Sender for outbound frames
    sender: mpsc::Sender<String>,
    /// When the connection was established
    pub connected_at: DateTime<Utc>,
    /// Last inbound frame
    last_activity: RwLock<DateTime<Utc>>,
    /// Last pong received
    last_pong: RwLock<DateTime<Utc>>,
    /// Cancelled once the connection is closed or found dead
    closed: CancellationToken,
}

impl ConnectionHandle {
    /// Create a new connection handle
    pub fn new(
        user_id: Uuid,
        user_role: UserRole,
        username: String,
        sender: mpsc::Sender<String>,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            user_id,
            user_role,
            username,
            sender,
            connected_at: now,
            last_activity: RwLock::new(now),
            last_pong: RwLock::new(now),
            closed: CancellationToken::new(),
        }
    }

    /// Queue a frame for this connection.
    ///
    /// Never blocks: a full buffer drops the frame, a closed receiver
    /// marks the connection dead.
    pub fn send(&self, frame: String) -> bool {
        if !self.is_alive() {
            return false;
        }
        match self.sender.try_send(frame) {
            Ok(()) => true,
            Err(mpsc::error::TrySendError::Full(_)) => {
                tracing::warn!(conn_id = %self.id, "Send buffer full, dropping frame");
                false
            }
            Err(mpsc::error::TrySendError::Closed(_)) => {
                self.mark_closed();
                false
            }
        }
    }

    /// Check if connection is alive
    pub fn is_alive(&self) -> bool {
        !self.closed.is_cancelled()
    }

    /// Mark connection as closed; the socket task exits.
    pub fn mark_closed(&self) {
        self.closed.cancel();
    }

    /// Resolves once the connection has been closed.
    pub async fn closed(&self) {
        self.closed.cancelled().await;
    }

    /// Update last activity timestamp
    pub async fn touch(&self) {
        *self.last_activity.write().await = Utc::now();
    }

    /// Record a pong response
    pub async fn record_pong(&self) {
        *self.last_pong.write().await = Utc::now();
    }

    /// Last pong, or the connect time if none arrived yet.
    pub async fn last_pong(&self) -> DateTime<Utc> {
        *self.last_pong.read().await
    }

    /// Get a snapshot of connection info
    pub async fn info(&self, subscriptions: Vec<String>) -> ConnectionInfo {
        ConnectionInfo {
            id: self.id,
            user_id: self.user_id,
            username: self.username.clone(),
            role: self.user_role,
            connected_at: self.connected_at,
            last_activity: *self.last_activity.read().await,
            subscriptions,
            alive: self.is_alive(),
        }
    }
}

/// Snapshot of connection info (serializable)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConnectionInfo {
    /// Connection ID
    pub id: ConnectionId,
    /// User ID
    pub user_id: Uuid,
    /// Username
    pub username: String,
    /// Role
    pub role: UserRole,
    /// Connected at
    pub connected_at: DateTime<Utc>,
    /// Last activity
    pub last_activity: DateTime<Utc>,
    /// Subscriptions
    pub subscriptions: Vec<String>,
    /// Is alive
    pub alive: bool,
}
