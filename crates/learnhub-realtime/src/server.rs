//! Top-level real-time engine and its event publisher.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::broadcast;
use tracing::{debug, info};

use learnhub_core::config::RealtimeConfig;
use learnhub_core::error::{AppError, ErrorKind};
use learnhub_core::events::{Audience, DomainEvent};
use learnhub_core::result::AppResult;
use learnhub_core::traits::EventPublisher;

use crate::channel::{ChannelRegistry, ChannelType};
use crate::connection::ConnectionManager;
use crate::message::OutboundMessage;

/// Central real-time engine that coordinates the WebSocket subsystems.
#[derive(Clone)]
pub struct RealtimeEngine {
    /// Connection manager.
    pub connections: Arc<ConnectionManager>,
    /// Channel registry.
    pub channels: Arc<ChannelRegistry>,
    /// Shutdown signal sender.
    shutdown_tx: broadcast::Sender<()>,
}

impl std::fmt::Debug for RealtimeEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RealtimeEngine")
            .field("connections", &self.connections.connection_count())
            .finish()
    }
}

impl RealtimeEngine {
    /// Creates a new real-time engine.
    pub fn new(config: RealtimeConfig) -> Self {
        let (shutdown_tx, _) = broadcast::channel(1);
        let channels = Arc::new(ChannelRegistry::new());
        let connections = Arc::new(ConnectionManager::new(config, channels.clone()));

        info!("Real-time engine initialized");

        Self {
            connections,
            channels,
            shutdown_tx,
        }
    }

    /// Returns a shutdown receiver for graceful shutdown coordination.
    pub fn shutdown_receiver(&self) -> broadcast::Receiver<()> {
        self.shutdown_tx.subscribe()
    }

    /// Signals socket tasks to stop and closes every connection.
    pub fn shutdown(&self) {
        info!("Shutting down real-time engine");
        let _ = self.shutdown_tx.send(());
        self.connections.close_all();
    }
}

#[async_trait]
impl EventPublisher for RealtimeEngine {
    /// Serializes the event once and queues it on every subscriber of the
    /// audience's channel. Queueing never blocks, so per-channel order is
    /// the order in which publishers call this method.
    async fn publish(&self, audience: Audience, event: DomainEvent) -> AppResult<()> {
        let channel = ChannelType::from(audience);
        let name = event.name();
        let frame = serde_json::to_string(&OutboundMessage::Event {
            channel: channel.to_string(),
            event: name.to_string(),
            data: event,
        })
        .map_err(|e| AppError::with_source(ErrorKind::Serialization, "Failed to encode event", e))?;

        let delivered = self.connections.broadcast_to_channel(&channel, &frame);
        debug!(event = name, channel = %channel, delivered, "Event published");
        Ok(())
    }
}
