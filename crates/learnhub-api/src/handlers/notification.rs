//! Notification inbox, preference, and publish handlers.

use axum::Json;
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum_extra::extract::WithRejection;
use serde_json::json;
use validator::Validate;

use learnhub_core::types::PageResponse;
use learnhub_entity::notification::{Notification, NotificationPreferences, PreferenceSettings};
use learnhub_service::notification::PublishOutcome;

use crate::dto::request::PublishNotificationRequest;
use crate::dto::response::{ApiResponse, CountResponse, MessageResponse};
use crate::error::{ApiError, ApiResult};
use crate::extractors::{AuthUser, IdPath, PaginationParams};
use crate::state::AppState;

/// GET /api/notifications
pub async fn list_notifications(
    State(state): State<AppState>,
    auth: AuthUser,
    WithRejection(Query(params), _): WithRejection<Query<PaginationParams>, ApiError>,
) -> ApiResult<Json<ApiResponse<PageResponse<Notification>>>> {
    let page = state
        .notification_service
        .list(&auth, params.unread_only, params.page_request())
        .await?;
    Ok(Json(ApiResponse::ok(page)))
}

/// GET /api/notifications/unread-count
pub async fn unread_count(
    State(state): State<AppState>,
    auth: AuthUser,
) -> ApiResult<Json<ApiResponse<CountResponse>>> {
    let count = state.notification_service.unread_count(&auth).await?;
    Ok(Json(ApiResponse::ok(CountResponse { count })))
}

/// PUT /api/notifications/{id}/read
pub async fn mark_read(
    State(state): State<AppState>,
    auth: AuthUser,
    IdPath(id): IdPath,
) -> ApiResult<Json<ApiResponse<Notification>>> {
    let n = state.notification_service.mark_read(&auth, id).await?;
    Ok(Json(ApiResponse::ok(n)))
}

/// PUT /api/notifications/{id}/unread
pub async fn mark_unread(
    State(state): State<AppState>,
    auth: AuthUser,
    IdPath(id): IdPath,
) -> ApiResult<Json<ApiResponse<Notification>>> {
    let n = state.notification_service.mark_unread(&auth, id).await?;
    Ok(Json(ApiResponse::ok(n)))
}

/// PUT /api/notifications/read-all
pub async fn mark_all_read(
    State(state): State<AppState>,
    auth: AuthUser,
) -> ApiResult<Json<serde_json::Value>> {
    let count = state.notification_service.mark_all_read(&auth).await?;
    Ok(Json(json!({ "success": true, "data": { "marked": count } })))
}

/// DELETE /api/notifications/{id}
pub async fn delete_notification(
    State(state): State<AppState>,
    auth: AuthUser,
    IdPath(id): IdPath,
) -> ApiResult<Json<ApiResponse<MessageResponse>>> {
    state.notification_service.delete(&auth, id).await?;
    Ok(Json(ApiResponse::ok(MessageResponse::new("Deleted"))))
}

/// GET /api/notifications/preferences
pub async fn get_preferences(
    State(state): State<AppState>,
    auth: AuthUser,
) -> ApiResult<Json<ApiResponse<NotificationPreferences>>> {
    let prefs = state.preference_service.get(auth.user_id).await?;
    Ok(Json(ApiResponse::ok(prefs)))
}

/// PUT /api/notifications/preferences
///
/// Replaces the whole document.
pub async fn update_preferences(
    State(state): State<AppState>,
    auth: AuthUser,
    WithRejection(Json(settings), _): WithRejection<Json<PreferenceSettings>, ApiError>,
) -> ApiResult<Json<ApiResponse<NotificationPreferences>>> {
    let prefs = state
        .preference_service
        .update(auth.user_id, settings)
        .await?;
    Ok(Json(ApiResponse::ok(prefs)))
}

/// POST /api/notifications/publish
pub async fn publish(
    State(state): State<AppState>,
    auth: AuthUser,
    WithRejection(Json(req), _): WithRejection<Json<PublishNotificationRequest>, ApiError>,
) -> ApiResult<(StatusCode, Json<ApiResponse<PublishOutcome>>)> {
    auth.require_host()?;
    req.validate()?;
    let outcome = state.notification_fanout.publish(req.into()).await?;
    tracing::debug!(
        producer = %auth.user_id,
        emailed = outcome.emailed,
        "Notification published over HTTP"
    );
    Ok((StatusCode::ACCEPTED, Json(ApiResponse::ok(outcome))))
}
