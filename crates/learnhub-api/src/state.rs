//! Application state shared across all handlers and middleware.

use std::sync::Arc;

use chrono::{DateTime, Utc};

use learnhub_auth::JwtDecoder;
use learnhub_core::config::AppConfig;
use learnhub_database::Stores;
use learnhub_realtime::{RealtimeEngine, SocketGateway};
use learnhub_service::{
    AccessDirectory, AllowAllDirectory, EmailSender, EventSink, LiveSessionService,
    LogEmailSender, NotificationFanout, NotificationService, OfficeHoursService,
    PreferenceService, PresenceService,
};
use learnhub_worker::SweepExecutor;
use learnhub_worker::jobs::{NotificationQueueSweepHandler, PresenceSweepHandler};

/// Application state containing all shared dependencies.
///
/// Passed to every Axum handler via `State<AppState>`.
/// All fields are `Arc`-wrapped for cheap cloning across tasks.
#[derive(Debug, Clone)]
pub struct AppState {
    // ── Configuration ────────────────────────────────────────
    /// Application configuration
    pub config: Arc<AppConfig>,
    /// When the process started serving
    pub started_at: DateTime<Utc>,

    // ── Infrastructure ───────────────────────────────────────
    /// Store implementations for the configured backend
    pub stores: Stores,
    /// Bearer token verifier
    pub jwt_decoder: Arc<JwtDecoder>,

    // ── Real-time ────────────────────────────────────────────
    /// Connection pool, channels, and the event publisher
    pub realtime: Arc<RealtimeEngine>,
    /// Socket lifecycle and inbound message handling
    pub gateway: Arc<SocketGateway>,

    // ── Services ─────────────────────────────────────────────
    /// Presence
    pub presence_service: Arc<PresenceService>,
    /// Office-hours queue
    pub office_hours_service: Arc<OfficeHoursService>,
    /// Live sessions
    pub live_session_service: Arc<LiveSessionService>,
    /// Notification inbox
    pub notification_service: Arc<NotificationService>,
    /// Notification preferences
    pub preference_service: Arc<PreferenceService>,
    /// Notification delivery
    pub notification_fanout: Arc<NotificationFanout>,

    // ── Worker ───────────────────────────────────────────────
    /// Sweep dispatch shared by the cron scheduler and the trigger endpoint
    pub sweeps: Arc<SweepExecutor>,
}

impl AppState {
    /// Wires the services over `stores` with the default email relay and
    /// access directory.
    pub fn new(config: AppConfig, stores: Stores) -> Self {
        Self::with_collaborators(
            config,
            stores,
            Arc::new(LogEmailSender),
            Arc::new(AllowAllDirectory),
        )
    }

    /// Wires the services over `stores` with explicit collaborators.
    ///
    /// The engine is built first because every service publishes through it;
    /// the gateway comes last because it calls back into the services.
    pub fn with_collaborators(
        config: AppConfig,
        stores: Stores,
        email: Arc<dyn EmailSender>,
        directory: Arc<dyn AccessDirectory>,
    ) -> Self {
        let jwt_decoder = Arc::new(JwtDecoder::new(&config.auth));
        let realtime = Arc::new(RealtimeEngine::new(config.realtime.clone()));
        let sink = EventSink::new(realtime.clone());

        let presence_service = Arc::new(PresenceService::new(
            stores.presence.clone(),
            sink.clone(),
            config.presence.clone(),
        ));
        let office_hours_service = Arc::new(OfficeHoursService::new(
            stores.office_hours.clone(),
            sink.clone(),
        ));
        let live_session_service = Arc::new(LiveSessionService::new(
            stores.live_sessions.clone(),
            sink.clone(),
        ));
        let notification_service = Arc::new(NotificationService::new(
            stores.notifications.clone(),
            sink.clone(),
        ));
        let preferences = PreferenceService::new(stores.preferences.clone());
        let notification_fanout = Arc::new(NotificationFanout::new(
            stores.notifications.clone(),
            preferences.clone(),
            email,
            sink,
            config.notifications.clone(),
        ));

        let gateway = Arc::new(SocketGateway::new(
            realtime.clone(),
            presence_service.clone(),
            live_session_service.clone(),
            directory,
        ));

        let mut sweeps = SweepExecutor::new();
        sweeps.register(Arc::new(PresenceSweepHandler::new(presence_service.clone())));
        sweeps.register(Arc::new(NotificationQueueSweepHandler::new(
            notification_fanout.clone(),
        )));

        Self {
            config: Arc::new(config),
            started_at: Utc::now(),
            stores,
            jwt_decoder,
            realtime,
            gateway,
            presence_service,
            office_hours_service,
            live_session_service,
            notification_service,
            preference_service: Arc::new(preferences),
            notification_fanout,
            sweeps: Arc::new(sweeps),
        }
    }
}
