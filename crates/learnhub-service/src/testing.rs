//! Test doubles shared by the service tests.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use uuid::Uuid;

use learnhub_core::AppResult;
use learnhub_core::error::AppError;
use learnhub_core::events::{Audience, DomainEvent};
use learnhub_core::traits::EventPublisher;
use learnhub_entity::user::UserRole;

use crate::context::RequestContext;
use crate::email::{EmailContent, EmailSender};
use crate::events::EventSink;

#[derive(Debug, Default)]
pub struct RecordingPublisher {
    events: Mutex<Vec<(Audience, DomainEvent)>>,
}

impl RecordingPublisher {
    pub fn sink() -> (Arc<Self>, EventSink) {
        let publisher = Arc::new(Self::default());
        (publisher.clone(), EventSink::new(publisher))
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.events.lock().unwrap().iter().map(|(_, e)| e.name()).collect()
    }

    pub fn sent_to(&self, audience: Audience) -> Vec<&'static str> {
        self.events
            .lock()
            .unwrap()
            .iter()
            .filter(|(a, _)| *a == audience)
            .map(|(_, e)| e.name())
            .collect()
    }

    pub fn events_to(&self, audience: Audience) -> Vec<DomainEvent> {
        self.events
            .lock()
            .unwrap()
            .iter()
            .filter(|(a, _)| *a == audience)
            .map(|(_, e)| e.clone())
            .collect()
    }

    pub fn clear(&self) {
        self.events.lock().unwrap().clear();
    }
}

#[async_trait]
impl EventPublisher for RecordingPublisher {
    async fn publish(&self, audience: Audience, event: DomainEvent) -> AppResult<()> {
        self.events.lock().unwrap().push((audience, event));
        Ok(())
    }
}

#[derive(Debug, Default)]
pub struct FailingPublisher;

#[async_trait]
impl EventPublisher for FailingPublisher {
    async fn publish(&self, _audience: Audience, _event: DomainEvent) -> AppResult<()> {
        Err(AppError::service_unavailable("transport down"))
    }
}

#[derive(Debug, Default)]
pub struct RecordingEmail {
    pub sent: Mutex<Vec<(Uuid, EmailContent)>>,
    pub fail: bool,
}

#[async_trait]
impl EmailSender for RecordingEmail {
    async fn send(&self, user_id: Uuid, content: &EmailContent) -> AppResult<()> {
        if self.fail {
            return Err(AppError::service_unavailable("relay down"));
        }
        self.sent.lock().unwrap().push((user_id, content.clone()));
        Ok(())
    }
}

pub fn ctx(role: UserRole) -> RequestContext {
    RequestContext::new(Uuid::new_v4(), role, role.as_str())
}
