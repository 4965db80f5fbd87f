//! Live-session handlers.

use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use axum_extra::extract::WithRejection;
use validator::Validate;

use learnhub_entity::live_session::{LiveSession, SessionMembership};
use learnhub_service::live_session::SessionJoin;

use crate::dto::request::{CreateSessionRequest, UpdateCapacityRequest};
use crate::dto::response::ApiResponse;
use crate::error::{ApiError, ApiResult};
use crate::extractors::{AuthUser, IdPath};
use crate::state::AppState;

/// POST /api/sessions
pub async fn create(
    State(state): State<AppState>,
    auth: AuthUser,
    WithRejection(Json(req), _): WithRejection<Json<CreateSessionRequest>, ApiError>,
) -> ApiResult<(StatusCode, Json<ApiResponse<LiveSession>>)> {
    req.validate()?;
    let session = state.live_session_service.create(&auth, req.into()).await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::ok(session))))
}

/// GET /api/sessions/{id}
pub async fn get(
    State(state): State<AppState>,
    _auth: AuthUser,
    IdPath(id): IdPath,
) -> ApiResult<Json<ApiResponse<LiveSession>>> {
    let session = state.live_session_service.get(id).await?;
    Ok(Json(ApiResponse::ok(session)))
}

/// POST /api/sessions/{id}/start
pub async fn start(
    State(state): State<AppState>,
    auth: AuthUser,
    IdPath(id): IdPath,
) -> ApiResult<Json<ApiResponse<LiveSession>>> {
    let session = state.live_session_service.start(&auth, id).await?;
    Ok(Json(ApiResponse::ok(session)))
}

/// POST /api/sessions/{id}/end
pub async fn end(
    State(state): State<AppState>,
    auth: AuthUser,
    IdPath(id): IdPath,
) -> ApiResult<Json<ApiResponse<LiveSession>>> {
    let session = state.live_session_service.end(&auth, id).await?;
    Ok(Json(ApiResponse::ok(session)))
}

/// POST /api/sessions/{id}/cancel
pub async fn cancel(
    State(state): State<AppState>,
    auth: AuthUser,
    IdPath(id): IdPath,
) -> ApiResult<Json<ApiResponse<LiveSession>>> {
    let session = state.live_session_service.cancel(&auth, id).await?;
    Ok(Json(ApiResponse::ok(session)))
}

/// PUT /api/sessions/{id}/capacity
pub async fn update_capacity(
    State(state): State<AppState>,
    auth: AuthUser,
    IdPath(id): IdPath,
    WithRejection(Json(req), _): WithRejection<Json<UpdateCapacityRequest>, ApiError>,
) -> ApiResult<Json<ApiResponse<LiveSession>>> {
    req.validate()?;
    let session = state
        .live_session_service
        .update_capacity(&auth, id, req.capacity)
        .await?;
    Ok(Json(ApiResponse::ok(session)))
}

/// POST /api/sessions/{id}/join
pub async fn join(
    State(state): State<AppState>,
    auth: AuthUser,
    IdPath(id): IdPath,
) -> ApiResult<Json<ApiResponse<SessionJoin>>> {
    let joined = state.live_session_service.join(&auth, id).await?;
    Ok(Json(ApiResponse::ok(joined)))
}

/// POST /api/sessions/{id}/leave
pub async fn leave(
    State(state): State<AppState>,
    auth: AuthUser,
    IdPath(id): IdPath,
) -> ApiResult<Json<ApiResponse<SessionMembership>>> {
    let membership = state.live_session_service.leave(&auth, id).await?;
    Ok(Json(ApiResponse::ok(membership)))
}

/// GET /api/sessions/{id}/attendees
pub async fn list_attendees(
    State(state): State<AppState>,
    _auth: AuthUser,
    IdPath(id): IdPath,
) -> ApiResult<Json<ApiResponse<Vec<SessionMembership>>>> {
    let attendees = state.live_session_service.list_attendees(id).await?;
    Ok(Json(ApiResponse::ok(attendees)))
}
