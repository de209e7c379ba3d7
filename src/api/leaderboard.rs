use axum::{extract::State, routing::get, Json, Router};

use crate::api::errors::ApiError;
use crate::api::guards::CurrentUser;
use crate::core::state::AppState;
use crate::repositories;
use crate::repositories::users::LeaderboardRow;

const CACHE_KEY: &str = "cache:leaderboard";

pub(crate) fn router() -> Router<AppState> {
    Router::new().route("/", get(leaderboard))
}

/// Top students by score. Served from a short-lived Redis cache; the
/// database is the fallback whenever the cache misses or Redis is down.
async fn leaderboard(
    State(state): State<AppState>,
    CurrentUser(_user): CurrentUser,
) -> Result<Json<Vec<LeaderboardRow>>, ApiError> {
    if let Ok(Some(cached)) = state.redis().cache_get(CACHE_KEY).await {
        if let Ok(rows) = serde_json::from_str::<Vec<LeaderboardRow>>(&cached) {
            return Ok(Json(rows));
        }
    }

    let limit = state.settings().gamification().leaderboard_limit;
    let rows = repositories::users::leaderboard(state.db(), limit)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to load leaderboard"))?;

    if let Ok(serialized) = serde_json::to_string(&rows) {
        let ttl = state.settings().gamification().leaderboard_cache_seconds;
        if let Err(err) = state.redis().cache_set_ex(CACHE_KEY, &serialized, ttl).await {
            tracing::warn!(error = %err, "Failed to cache leaderboard");
        }
    }

    Ok(Json(rows))
}
