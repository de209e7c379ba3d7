use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};

use crate::api::errors::ApiError;
use crate::api::guards::CurrentUser;
use crate::core::state::AppState;
use crate::db::types::UserRole;
use crate::repositories;
use crate::schemas::submission::SubmissionResponse;

pub(crate) fn router() -> Router<AppState> {
    Router::new().route("/:submission_id", get(detail).delete(remove))
}

/// Students see only their own submissions; admins see all.
async fn detail(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(submission_id): Path<String>,
) -> Result<Json<SubmissionResponse>, ApiError> {
    let submission = repositories::submissions::find_by_id(state.db(), &submission_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to load submission"))?
        .ok_or_else(|| ApiError::NotFound("Submission not found".to_string()))?;

    if submission.student_id != user.id && user.role != UserRole::Admin {
        // Hide the existence of other students' submissions.
        return Err(ApiError::NotFound("Submission not found".to_string()));
    }

    Ok(Json(SubmissionResponse::from_db(submission)))
}

async fn remove(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(submission_id): Path<String>,
) -> Result<StatusCode, ApiError> {
    if user.role != UserRole::Admin {
        return Err(ApiError::Forbidden("Admin access required"));
    }

    let deleted = repositories::submissions::delete(state.db(), &submission_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to delete submission"))?;

    if deleted {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ApiError::NotFound("Submission not found".to_string()))
    }
}
