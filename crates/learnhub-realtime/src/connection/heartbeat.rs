//! Ping/pong heartbeat for WebSocket keepalive.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::time;

use learnhub_core::config::RealtimeConfig;

use crate::message::types::OutboundMessage;

use super::handle::ConnectionHandle;

/// Heartbeat configuration
#[derive(Debug, Clone)]
pub struct HeartbeatConfig {
    /// Interval between pings
    pub ping_interval: Duration,
    /// Silence after which the connection is considered dead
    pub ping_timeout: Duration,
}

impl From<&RealtimeConfig> for HeartbeatConfig {
    fn from(config: &RealtimeConfig) -> Self {
        let interval = Duration::from_secs(config.ping_interval_seconds.max(1));
        Self {
            ping_interval: interval,
            ping_timeout: interval * 2,
        }
    }
}

/// Run heartbeat loop for a connection.
///
/// Sends periodic pings and closes the handle if no pong arrives within
/// the timeout. Ends as soon as the connection closes for any reason.
pub async fn run_heartbeat(handle: Arc<ConnectionHandle>, config: HeartbeatConfig) {
    let mut interval = time::interval(config.ping_interval);
    // The first tick completes immediately.
    interval.tick().await;

    loop {
        tokio::select! {
            _ = handle.closed() => break,
            _ = interval.tick() => {}
        }

        let silent_for = Utc::now() - handle.last_pong().await;
        if silent_for.to_std().is_ok_and(|d| d > config.ping_timeout) {
            tracing::warn!(
                conn_id = %handle.id,
                silent_seconds = silent_for.num_seconds(),
                "Heartbeat timeout, closing connection"
            );
            handle.mark_closed();
            break;
        }

        let ping = OutboundMessage::Ping {
            timestamp: Utc::now().timestamp(),
        };
        if !handle.send(ping.to_text()) && !handle.is_alive() {
            tracing::debug!(conn_id = %handle.id, "Ping send failed, connection closed");
            break;
        }
    }

    tracing::debug!(conn_id = %handle.id, "Heartbeat loop ended");
}

#[cfg(test)]
mod tests {
    use super::*;
    use learnhub_entity::user::UserRole;
    use tokio::sync::mpsc;
    use uuid::Uuid;

    #[tokio::test(start_paused = true)]
    async fn test_pings_until_pong_silence_closes_connection() {
        let (tx, mut rx) = mpsc::channel(16);
        let handle = Arc::new(ConnectionHandle::new(
            Uuid::new_v4(),
            UserRole::Student,
            "ada".into(),
            tx,
        ));
        let config = HeartbeatConfig {
            ping_interval: Duration::from_secs(30),
            ping_timeout: Duration::from_secs(60),
        };

        let task = tokio::spawn(run_heartbeat(handle.clone(), config));
        time::sleep(Duration::from_secs(31)).await;
        let frame = rx.recv().await.unwrap();
        assert!(frame.contains("\"ping\""));

        handle.mark_closed();
        task.await.unwrap();
        assert!(!handle.is_alive());
    }
}
