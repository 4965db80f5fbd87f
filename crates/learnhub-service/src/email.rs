//! Outbound email collaborator.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use learnhub_core::AppResult;
use learnhub_entity::notification::DigestFrequency;

/// Rendered content handed to the email relay.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmailContent {
    /// Subject line.
    pub subject: String,
    /// Plain-text body.
    pub body: String,
    /// Optional link appended by the template.
    pub action_url: Option<String>,
    /// How the recipient wants mail batched. The relay owns the batching.
    pub digest: DigestFrequency,
}

/// Accepts a message for a user and reports success or failure.
///
/// Retries and templating belong to the implementation.
#[async_trait]
pub trait EmailSender: Send + Sync + std::fmt::Debug {
    /// Hand one message to the relay.
    async fn send(&self, user_id: Uuid, content: &EmailContent) -> AppResult<()>;
}

/// Sender that only logs. The default until a relay is configured.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogEmailSender;

#[async_trait]
impl EmailSender for LogEmailSender {
    async fn send(&self, user_id: Uuid, content: &EmailContent) -> AppResult<()> {
        info!(
            user_id = %user_id,
            subject = %content.subject,
            digest = ?content.digest,
            "Email handed to log relay"
        );
        Ok(())
    }
}
