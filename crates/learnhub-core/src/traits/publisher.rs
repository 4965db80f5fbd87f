//! Event publisher seam between services and the real-time transport.

use async_trait::async_trait;

use crate::events::{Audience, DomainEvent};
use crate::result::AppResult;

/// Pushes committed domain events to connected observers.
///
/// Services receive an implementation at construction time. Callers invoke
/// it only after the triggering write has committed, and treat an error as
/// a logged, dropped delivery: it never undoes the write.
#[async_trait]
pub trait EventPublisher: Send + Sync + std::fmt::Debug + 'static {
    /// Deliver one event to an audience.
    async fn publish(&self, audience: Audience, event: DomainEvent) -> AppResult<()>;
}

/// Publisher that discards everything. Used when no transport is attached.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullPublisher;

#[async_trait]
impl EventPublisher for NullPublisher {
    async fn publish(&self, _audience: Audience, _event: DomainEvent) -> AppResult<()> {
        Ok(())
    }
}
