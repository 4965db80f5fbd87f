//! Route definitions for the LearnHub HTTP API.
//!
//! All REST routes are organized by domain and mounted under `/api`; the
//! WebSocket upgrade lives at `/ws`. The router receives `AppState` and
//! passes it to all handlers via Axum's `State` extractor.

use axum::{
    Router, middleware as axum_middleware,
    routing::{delete, get, post, put},
};

use crate::handlers;
use crate::middleware;
use crate::state::AppState;

/// Build the router with every route and the request-logging middleware.
pub fn build_router(state: AppState) -> Router {
    let api_routes = Router::new()
        .merge(health_routes())
        .merge(presence_routes())
        .merge(office_hours_routes())
        .merge(session_routes())
        .merge(notification_routes())
        .merge(admin_routes());

    let ws_routes = Router::new().route("/ws", get(handlers::ws::ws_handler));

    Router::new()
        .nest("/api", api_routes)
        .merge(ws_routes)
        .layer(axum_middleware::from_fn(middleware::logging::request_logging))
        .with_state(state)
}

/// Liveness and dependency checks; no token needed
fn health_routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(handlers::health::health))
        .route("/health/detailed", get(handlers::health::health_detailed))
}

/// Presence reads and writes
fn presence_routes() -> Router<AppState> {
    Router::new()
        .route("/presence/me", get(handlers::presence::get_my_status))
        .route("/presence/status", put(handlers::presence::set_status))
        .route("/presence/heartbeat", post(handlers::presence::heartbeat))
        .route("/presence/users/{id}", get(handlers::presence::get_status))
        .route("/presence/batch", post(handlers::presence::get_many))
        .route("/presence/online", get(handlers::presence::list_online))
}

/// Office-hours schedules and queue transitions
fn office_hours_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/office-hours/schedules",
            post(handlers::office_hours::create_schedule),
        )
        .route(
            "/office-hours/schedules/{id}/open",
            put(handlers::office_hours::open_schedule),
        )
        .route(
            "/office-hours/schedules/{id}/close",
            put(handlers::office_hours::close_schedule),
        )
        .route(
            "/office-hours/schedules/{id}/queue",
            post(handlers::office_hours::join_queue),
        )
        .route(
            "/office-hours/instructors/{id}/queue",
            get(handlers::office_hours::list_queue),
        )
        .route(
            "/office-hours/me/entries",
            get(handlers::office_hours::my_entries),
        )
        .route(
            "/office-hours/entries/{id}/position",
            get(handlers::office_hours::position),
        )
        .route(
            "/office-hours/entries/{id}/admit",
            post(handlers::office_hours::admit),
        )
        .route(
            "/office-hours/entries/{id}/complete",
            post(handlers::office_hours::complete),
        )
        .route(
            "/office-hours/entries/{id}/cancel",
            post(handlers::office_hours::cancel),
        )
}

/// Live-session lifecycle and membership
fn session_routes() -> Router<AppState> {
    Router::new()
        .route("/sessions", post(handlers::live_session::create))
        .route("/sessions/{id}", get(handlers::live_session::get))
        .route("/sessions/{id}/start", post(handlers::live_session::start))
        .route("/sessions/{id}/end", post(handlers::live_session::end))
        .route("/sessions/{id}/cancel", post(handlers::live_session::cancel))
        .route(
            "/sessions/{id}/capacity",
            put(handlers::live_session::update_capacity),
        )
        .route("/sessions/{id}/join", post(handlers::live_session::join))
        .route("/sessions/{id}/leave", post(handlers::live_session::leave))
        .route(
            "/sessions/{id}/attendees",
            get(handlers::live_session::list_attendees),
        )
}

/// Inbox, preferences, and producer publish
fn notification_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/notifications",
            get(handlers::notification::list_notifications),
        )
        .route(
            "/notifications/unread-count",
            get(handlers::notification::unread_count),
        )
        .route(
            "/notifications/read-all",
            put(handlers::notification::mark_all_read),
        )
        .route(
            "/notifications/preferences",
            get(handlers::notification::get_preferences)
                .put(handlers::notification::update_preferences),
        )
        .route(
            "/notifications/publish",
            post(handlers::notification::publish),
        )
        .route(
            "/notifications/{id}",
            delete(handlers::notification::delete_notification),
        )
        .route(
            "/notifications/{id}/read",
            put(handlers::notification::mark_read),
        )
        .route(
            "/notifications/{id}/unread",
            put(handlers::notification::mark_unread),
        )
}

/// Admin-only operations
fn admin_routes() -> Router<AppState> {
    Router::new()
        .route("/admin/sweeps", get(handlers::admin::list_sweeps))
        .route("/admin/sweeps/{name}", post(handlers::admin::run_sweep))
}
