//! Socket gateway: what a connection does besides moving frames.
//!
//! Connection lifecycle drives presence (first connection online, last
//! disconnect offline) and inbound frames are dispatched to the presence
//! service or to the channel registry after a permission check.
//!
//! Lifecycle presence writes for one user are serialized with the
//! register/unregister they follow, so the stored status always matches
//! the latest connection count.

use std::sync::Arc;

use tracing::{debug, warn};

use learnhub_core::AppError;
use learnhub_core::error::ErrorKind;
use learnhub_database::admission::KeyedLocks;
use learnhub_entity::presence::PresenceStatus;
use learnhub_service::{AccessDirectory, LiveSessionService, PresenceService};

use crate::channel::{ChannelError, ChannelType};
use crate::connection::{AuthenticatedConnection, ConnectionHandle, ConnectionId, Registration};
use crate::message::{InboundMessage, OutboundMessage};
use crate::server::RealtimeEngine;

/// Per-connection behaviour on top of the engine.
#[derive(Debug, Clone)]
pub struct SocketGateway {
    engine: Arc<RealtimeEngine>,
    presence: Arc<PresenceService>,
    live_sessions: Arc<LiveSessionService>,
    directory: Arc<dyn AccessDirectory>,
    lifecycle: Arc<KeyedLocks>,
}

impl SocketGateway {
    /// Creates a gateway over an engine and the services it calls.
    pub fn new(
        engine: Arc<RealtimeEngine>,
        presence: Arc<PresenceService>,
        live_sessions: Arc<LiveSessionService>,
        directory: Arc<dyn AccessDirectory>,
    ) -> Self {
        Self {
            engine,
            presence,
            live_sessions,
            directory,
            lifecycle: Arc::new(KeyedLocks::new()),
        }
    }

    /// The engine this gateway registers connections with.
    pub fn engine(&self) -> &Arc<RealtimeEngine> {
        &self.engine
    }

    /// Registers a connection, greets it, and marks the user online if
    /// this is their first connection.
    pub async fn connect(&self, auth: &AuthenticatedConnection) -> Registration {
        let _lifecycle = self.lifecycle.lock(auth.user_id).await;
        let registration =
            self.engine
                .connections
                .register(auth.user_id, auth.role, auth.username.clone());

        let hello = OutboundMessage::Connected {
            connection_id: registration.handle.id,
            user_id: auth.user_id,
            channels: self.engine.connections.subscriptions(&registration.handle.id),
        };
        registration.handle.send(hello.to_text());

        if registration.first_connection {
            if let Err(e) = self
                .presence
                .set_status(auth.user_id, PresenceStatus::Online, None)
                .await
            {
                warn!(user_id = %auth.user_id, error = %e, "Failed to mark user online");
            }
        }
        registration
    }

    /// Unregisters a connection and marks the user offline when it was
    /// their last.
    pub async fn disconnect(&self, conn_id: &ConnectionId) {
        let Some(handle) = self.engine.connections.get(conn_id) else {
            return;
        };
        let _lifecycle = self.lifecycle.lock(handle.user_id).await;
        let Some(departure) = self.engine.connections.unregister(conn_id) else {
            return;
        };
        if departure.last_connection {
            let user_id = departure.handle.user_id;
            if let Err(e) = self
                .presence
                .set_status(user_id, PresenceStatus::Offline, None)
                .await
            {
                warn!(user_id = %user_id, error = %e, "Failed to mark user offline");
            }
        }
    }

    /// Processes one inbound text frame.
    pub async fn handle_inbound(&self, conn_id: &ConnectionId, raw: &str) {
        let Some(handle) = self.engine.connections.get(conn_id) else {
            warn!(conn_id = %conn_id, "Message from unknown connection");
            return;
        };
        handle.touch().await;

        let msg: InboundMessage = match serde_json::from_str(raw) {
            Ok(m) => m,
            Err(e) => {
                handle.send(
                    OutboundMessage::error("INVALID_MESSAGE", format!("Failed to parse message: {e}"))
                        .to_text(),
                );
                return;
            }
        };

        let reply = match msg {
            InboundMessage::Subscribe { channel } => self
                .subscribe(&handle, &channel)
                .await
                .map(|()| OutboundMessage::Subscribed { channel })
                .map_err(channel_error_frame),
            InboundMessage::Unsubscribe { channel } => self
                .unsubscribe(&handle, &channel)
                .map(|()| OutboundMessage::Unsubscribed { channel })
                .map_err(channel_error_frame),
            InboundMessage::Heartbeat => {
                if let Err(e) = self.presence.heartbeat(handle.user_id).await {
                    warn!(user_id = %handle.user_id, error = %e, "Heartbeat write failed");
                }
                return;
            }
            InboundMessage::SetStatus { status, activity } => {
                match self.set_status(&handle, &status, activity).await {
                    Ok(()) => return,
                    Err(e) => Err(app_error_frame(&e)),
                }
            }
            InboundMessage::Pong { .. } => {
                handle.record_pong().await;
                return;
            }
        };

        let frame = match reply {
            Ok(ok) | Err(ok) => ok,
        };
        handle.send(frame.to_text());
    }

    async fn set_status(
        &self,
        handle: &ConnectionHandle,
        status: &str,
        activity: Option<String>,
    ) -> Result<(), AppError> {
        let status: PresenceStatus = status.parse()?;
        self.presence
            .set_status(handle.user_id, status, activity)
            .await?;
        Ok(())
    }

    async fn subscribe(&self, handle: &ConnectionHandle, raw: &str) -> Result<(), ChannelError> {
        let channel =
            ChannelType::parse(raw).ok_or_else(|| ChannelError::Unknown(raw.to_string()))?;
        if !self.can_observe(handle, channel).await? {
            debug!(conn_id = %handle.id, channel = %channel, "Subscription refused");
            return Err(ChannelError::Forbidden(channel.to_string()));
        }
        self.engine.connections.subscribe(handle, channel)?;
        Ok(())
    }

    fn unsubscribe(&self, handle: &ConnectionHandle, raw: &str) -> Result<(), ChannelError> {
        let channel =
            ChannelType::parse(raw).ok_or_else(|| ChannelError::Unknown(raw.to_string()))?;
        self.engine.connections.unsubscribe(handle, channel)?;
        Ok(())
    }

    /// Whether the connection's user may observe a channel.
    ///
    /// Queue rooms carry student identities, so only the instructor sees
    /// them. Session rooms tied to a course need course access; course
    /// rooms always do. Admins may observe any room.
    pub async fn can_observe(
        &self,
        handle: &ConnectionHandle,
        channel: ChannelType,
    ) -> Result<bool, AppError> {
        let user_id = handle.user_id;
        let admin = handle.user_role.is_admin();
        match channel {
            ChannelType::User(id) => Ok(id == user_id),
            ChannelType::PresenceGlobal => Ok(true),
            ChannelType::OfficeHours(instructor_id) => Ok(admin || instructor_id == user_id),
            ChannelType::LiveSession(session_id) => {
                if admin {
                    return Ok(true);
                }
                let session = match self.live_sessions.get(session_id).await {
                    Ok(session) => session,
                    Err(e) if e.kind == ErrorKind::NotFound => {
                        return Ok(false);
                    }
                    Err(e) => return Err(e),
                };
                if session.owner_id == user_id {
                    return Ok(true);
                }
                match session.course_id {
                    Some(course_id) => self.directory.can_view_course(user_id, course_id).await,
                    None => Ok(true),
                }
            }
            ChannelType::Course(course_id) => {
                Ok(admin || self.directory.can_view_course(user_id, course_id).await?)
            }
        }
    }
}

fn channel_error_frame(e: ChannelError) -> OutboundMessage {
    OutboundMessage::error(e.code(), e.to_string())
}

fn app_error_frame(e: &AppError) -> OutboundMessage {
    OutboundMessage::error(e.kind.to_string(), e.message.clone())
}
