use axum::{
    extract::State,
    http::StatusCode,
    routing::get,
    Json, Router,
};
use validator::Validate;

use crate::api::errors::ApiError;
use crate::api::guards::{CurrentAdmin, CurrentUser};
use crate::core::state::AppState;
use crate::core::time::primitive_now_utc;
use crate::repositories;
use crate::schemas::badge::{BadgeCreate, BadgeResponse};

pub(crate) fn router() -> Router<AppState> {
    Router::new().route("/", get(list).post(create))
}

/// All badges with an earned flag for the current student.
async fn list(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> Result<Json<Vec<BadgeResponse>>, ApiError> {
    let badges = repositories::badges::list_all(state.db())
        .await
        .map_err(|e| ApiError::internal(e, "Failed to list badges"))?;
    let held = repositories::badges::held_badge_ids(state.db(), &user.id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to load earned badges"))?;

    Ok(Json(
        badges
            .into_iter()
            .map(|badge| {
                let earned = held.contains(&badge.id);
                BadgeResponse::from_db(badge, earned)
            })
            .collect(),
    ))
}

async fn create(
    State(state): State<AppState>,
    CurrentAdmin(_admin): CurrentAdmin,
    Json(payload): Json<BadgeCreate>,
) -> Result<(StatusCode, Json<BadgeResponse>), ApiError> {
    payload.validate().map_err(|e| ApiError::BadRequest(e.to_string()))?;

    let existing = repositories::badges::exists_by_title(state.db(), &payload.title)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to check existing badge"))?;
    if existing.is_some() {
        return Err(ApiError::Conflict("Badge with this title already exists".to_string()));
    }

    let badge = repositories::badges::create(
        state.db(),
        repositories::badges::CreateBadge {
            title: &payload.title,
            description: &payload.description,
            icon: &payload.icon,
            category: payload.category,
            threshold: payload.threshold,
            created_at: primitive_now_utc(),
        },
    )
    .await
    .map_err(|e| ApiError::internal(e, "Failed to create badge"))?;

    Ok((StatusCode::CREATED, Json(BadgeResponse::from_db(badge, false))))
}
