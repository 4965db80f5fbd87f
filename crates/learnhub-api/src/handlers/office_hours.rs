//! Office-hours schedule and queue handlers.

use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use axum_extra::extract::WithRejection;
use validator::Validate;

use learnhub_core::error::AppError;
use learnhub_entity::office_hours::{OfficeHoursSchedule, QueueEntry};
use learnhub_service::office_hours::{QueueJoin, QueueView};

use crate::dto::request::{CreateScheduleRequest, JoinQueueRequest};
use crate::dto::response::{ApiResponse, PositionResponse};
use crate::error::{ApiError, ApiResult};
use crate::extractors::{AuthUser, IdPath};
use crate::state::AppState;

/// POST /api/office-hours/schedules
pub async fn create_schedule(
    State(state): State<AppState>,
    auth: AuthUser,
    WithRejection(Json(req), _): WithRejection<Json<CreateScheduleRequest>, ApiError>,
) -> ApiResult<(StatusCode, Json<ApiResponse<OfficeHoursSchedule>>)> {
    req.validate()?;
    let schedule = state
        .office_hours_service
        .create_schedule(&auth, req.into())
        .await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::ok(schedule))))
}

/// PUT /api/office-hours/schedules/{id}/open
pub async fn open_schedule(
    State(state): State<AppState>,
    auth: AuthUser,
    IdPath(id): IdPath,
) -> ApiResult<Json<ApiResponse<OfficeHoursSchedule>>> {
    let schedule = state.office_hours_service.set_open(&auth, id, true).await?;
    Ok(Json(ApiResponse::ok(schedule)))
}

/// PUT /api/office-hours/schedules/{id}/close
pub async fn close_schedule(
    State(state): State<AppState>,
    auth: AuthUser,
    IdPath(id): IdPath,
) -> ApiResult<Json<ApiResponse<OfficeHoursSchedule>>> {
    let schedule = state.office_hours_service.set_open(&auth, id, false).await?;
    Ok(Json(ApiResponse::ok(schedule)))
}

/// POST /api/office-hours/schedules/{id}/queue
pub async fn join_queue(
    State(state): State<AppState>,
    auth: AuthUser,
    IdPath(schedule_id): IdPath,
    WithRejection(Json(req), _): WithRejection<Json<JoinQueueRequest>, ApiError>,
) -> ApiResult<(StatusCode, Json<ApiResponse<QueueJoin>>)> {
    req.validate()?;
    let joined = state
        .office_hours_service
        .join(&auth, schedule_id, req.question)
        .await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::ok(joined))))
}

/// GET /api/office-hours/instructors/{id}/queue
///
/// The queue lists students, so only its instructor (or an admin) reads it.
pub async fn list_queue(
    State(state): State<AppState>,
    auth: AuthUser,
    IdPath(instructor_id): IdPath,
) -> ApiResult<Json<ApiResponse<Vec<QueueView>>>> {
    if auth.user_id != instructor_id && !auth.is_admin() {
        return Err(AppError::authorization("Only the instructor can view this queue").into());
    }
    let queue = state.office_hours_service.list_queue(instructor_id).await?;
    Ok(Json(ApiResponse::ok(queue)))
}

/// GET /api/office-hours/me/entries
pub async fn my_entries(
    State(state): State<AppState>,
    auth: AuthUser,
) -> ApiResult<Json<ApiResponse<Vec<QueueView>>>> {
    let entries = state.office_hours_service.my_entries(&auth).await?;
    Ok(Json(ApiResponse::ok(entries)))
}

/// GET /api/office-hours/entries/{id}/position
pub async fn position(
    State(state): State<AppState>,
    auth: AuthUser,
    IdPath(entry_id): IdPath,
) -> ApiResult<Json<ApiResponse<PositionResponse>>> {
    let position = state.office_hours_service.position(&auth, entry_id).await?;
    Ok(Json(ApiResponse::ok(PositionResponse { position })))
}

/// POST /api/office-hours/entries/{id}/admit
pub async fn admit(
    State(state): State<AppState>,
    auth: AuthUser,
    IdPath(entry_id): IdPath,
) -> ApiResult<Json<ApiResponse<QueueEntry>>> {
    let entry = state.office_hours_service.admit(&auth, entry_id).await?;
    Ok(Json(ApiResponse::ok(entry)))
}

/// POST /api/office-hours/entries/{id}/complete
pub async fn complete(
    State(state): State<AppState>,
    auth: AuthUser,
    IdPath(entry_id): IdPath,
) -> ApiResult<Json<ApiResponse<QueueEntry>>> {
    let entry = state.office_hours_service.complete(&auth, entry_id).await?;
    Ok(Json(ApiResponse::ok(entry)))
}

/// POST /api/office-hours/entries/{id}/cancel
pub async fn cancel(
    State(state): State<AppState>,
    auth: AuthUser,
    IdPath(entry_id): IdPath,
) -> ApiResult<Json<ApiResponse<QueueEntry>>> {
    let entry = state.office_hours_service.cancel(&auth, entry_id).await?;
    Ok(Json(ApiResponse::ok(entry)))
}
