//! Sweep trigger handlers (admin only).

use axum::Json;
use axum::extract::{Path, State};
use axum_extra::extract::WithRejection;

use learnhub_core::error::AppError;
use learnhub_worker::{SweepError, SweepRun};

use crate::dto::response::ApiResponse;
use crate::error::{ApiError, ApiResult};
use crate::extractors::AuthUser;
use crate::state::AppState;

impl From<SweepError> for ApiError {
    fn from(e: SweepError) -> Self {
        let app = match e {
            SweepError::Unknown(name) => AppError::not_found(format!("Unknown sweep '{name}'")),
            SweepError::AlreadyRunning(name) => {
                AppError::conflict(format!("Sweep '{name}' is already running"))
            }
            SweepError::Transient(msg) => AppError::service_unavailable(msg),
            SweepError::Internal(e) => e,
        };
        Self(app)
    }
}

/// GET /api/admin/sweeps
pub async fn list_sweeps(
    State(state): State<AppState>,
    auth: AuthUser,
) -> ApiResult<Json<ApiResponse<Vec<String>>>> {
    auth.require_admin()?;
    Ok(Json(ApiResponse::ok(state.sweeps.registered_names())))
}

/// POST /api/admin/sweeps/{name}
pub async fn run_sweep(
    State(state): State<AppState>,
    auth: AuthUser,
    WithRejection(Path(name), _): WithRejection<Path<String>, ApiError>,
) -> ApiResult<Json<ApiResponse<SweepRun>>> {
    auth.require_admin()?;
    tracing::info!(sweep = %name, admin_id = %auth.user_id, "Manual sweep triggered");
    let run = state.sweeps.run(&name).await?;
    Ok(Json(ApiResponse::ok(run)))
}
