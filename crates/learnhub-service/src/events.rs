//! Post-commit event emission.

use std::sync::Arc;

use tracing::warn;
use uuid::Uuid;

use learnhub_core::events::{Audience, DomainEvent, EventPayload};
use learnhub_core::traits::EventPublisher;

/// Wraps the publisher so that a failed broadcast is logged and dropped.
///
/// Events are awaited one at a time in the order their writes committed,
/// which keeps per-user delivery order aligned with commit order.
#[derive(Debug, Clone)]
pub struct EventSink {
    publisher: Arc<dyn EventPublisher>,
}

impl EventSink {
    /// Creates a sink over the given publisher.
    pub fn new(publisher: Arc<dyn EventPublisher>) -> Self {
        Self { publisher }
    }

    /// Publish one event; errors never reach the caller.
    pub async fn emit(&self, audience: Audience, actor_id: Option<Uuid>, payload: EventPayload) {
        let event = DomainEvent::new(actor_id, payload);
        let name = event.name();
        if let Err(e) = self.publisher.publish(audience, event).await {
            warn!(event = name, audience = ?audience, error = %e, "Dropped event broadcast");
        }
    }
}
