use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::post,
    Json, Router,
};
use validator::Validate;

use crate::api::errors::ApiError;
use crate::api::guards::{CurrentAdmin, CurrentUser};
use crate::core::state::AppState;
use crate::core::time::primitive_now_utc;
use crate::repositories;
use crate::schemas::course::{QuizCreate, QuizResponse, QuizResultCreate};
use crate::services::events::ProgressEvent;

pub(crate) fn router() -> Router<AppState> {
    Router::new().route("/", post(create)).route("/:quiz_id/result", post(submit_result))
}

async fn create(
    State(state): State<AppState>,
    CurrentAdmin(_admin): CurrentAdmin,
    Json(payload): Json<QuizCreate>,
) -> Result<(StatusCode, Json<QuizResponse>), ApiError> {
    payload.validate().map_err(|e| ApiError::BadRequest(e.to_string()))?;

    let course = repositories::courses::find_by_id(state.db(), &payload.course_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to load course"))?;
    if course.is_none() {
        return Err(ApiError::NotFound("Course not found".to_string()));
    }

    let quiz = repositories::quizzes::create(state.db(), &payload.course_id, &payload.title)
        .await
        .map_err(|e| match &e {
            sqlx::Error::Database(db) if db.is_unique_violation() => {
                ApiError::Conflict("Quiz with this title already exists in the course".to_string())
            }
            _ => ApiError::internal(e, "Failed to create quiz"),
        })?;

    Ok((StatusCode::CREATED, Json(QuizResponse::from_db(quiz))))
}

/// Only the first result per quiz counts; a retake is a conflict so the
/// client can tell the score was not recorded.
async fn submit_result(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(quiz_id): Path<String>,
    Json(payload): Json<QuizResultCreate>,
) -> Result<StatusCode, ApiError> {
    payload.validate().map_err(|e| ApiError::BadRequest(e.to_string()))?;

    let quiz = repositories::quizzes::find_by_id(state.db(), &quiz_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to load quiz"))?
        .ok_or_else(|| ApiError::NotFound("Quiz not found".to_string()))?;

    let result = repositories::quizzes::insert_result(
        state.db(),
        &user.id,
        &quiz.id,
        payload.score,
        primitive_now_utc(),
    )
    .await
    .map_err(|e| ApiError::internal(e, "Failed to record quiz result"))?;

    let Some(result) = result else {
        return Err(ApiError::Conflict("Quiz already taken".to_string()));
    };

    metrics::counter!("quizzes_taken_total").increment(1);
    state.events().emit(ProgressEvent::QuizCompleted {
        student_id: user.id,
        quiz_id: quiz.id,
        score: result.score,
    });

    Ok(StatusCode::CREATED)
}
