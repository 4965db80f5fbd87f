//! Presence handlers.

use axum::Json;
use axum::extract::{Query, State};
use axum_extra::extract::WithRejection;
use validator::Validate;

use learnhub_entity::presence::PresenceRecord;

use crate::dto::request::{BatchPresenceRequest, OnlineQuery, SetStatusRequest};
use crate::dto::response::ApiResponse;
use crate::error::{ApiError, ApiResult};
use crate::extractors::{AuthUser, IdPath};
use crate::state::AppState;

/// GET /api/presence/me
pub async fn get_my_status(
    State(state): State<AppState>,
    auth: AuthUser,
) -> ApiResult<Json<ApiResponse<PresenceRecord>>> {
    let record = state.presence_service.get_status(auth.user_id).await?;
    Ok(Json(ApiResponse::ok(record)))
}

/// PUT /api/presence/status
pub async fn set_status(
    State(state): State<AppState>,
    auth: AuthUser,
    WithRejection(Json(req), _): WithRejection<Json<SetStatusRequest>, ApiError>,
) -> ApiResult<Json<ApiResponse<PresenceRecord>>> {
    req.validate()?;
    let record = state
        .presence_service
        .set_status(auth.user_id, req.status, req.activity)
        .await?;
    Ok(Json(ApiResponse::ok(record)))
}

/// POST /api/presence/heartbeat
pub async fn heartbeat(
    State(state): State<AppState>,
    auth: AuthUser,
) -> ApiResult<Json<ApiResponse<PresenceRecord>>> {
    let record = state.presence_service.heartbeat(auth.user_id).await?;
    Ok(Json(ApiResponse::ok(record)))
}

/// GET /api/presence/users/{id}
pub async fn get_status(
    State(state): State<AppState>,
    _auth: AuthUser,
    IdPath(user_id): IdPath,
) -> ApiResult<Json<ApiResponse<PresenceRecord>>> {
    let record = state.presence_service.get_status(user_id).await?;
    Ok(Json(ApiResponse::ok(record)))
}

/// POST /api/presence/batch
pub async fn get_many(
    State(state): State<AppState>,
    _auth: AuthUser,
    WithRejection(Json(req), _): WithRejection<Json<BatchPresenceRequest>, ApiError>,
) -> ApiResult<Json<ApiResponse<Vec<PresenceRecord>>>> {
    req.validate()?;
    let records = state.presence_service.get_many(&req.user_ids).await?;
    Ok(Json(ApiResponse::ok(records)))
}

/// GET /api/presence/online?limit=
pub async fn list_online(
    State(state): State<AppState>,
    _auth: AuthUser,
    WithRejection(Query(query), _): WithRejection<Query<OnlineQuery>, ApiError>,
) -> ApiResult<Json<ApiResponse<Vec<PresenceRecord>>>> {
    let records = state.presence_service.list_online(query.limit).await?;
    Ok(Json(ApiResponse::ok(records)))
}
