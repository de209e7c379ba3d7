use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use validator::Validate;

use crate::api::errors::ApiError;
use crate::api::guards::{CurrentAdmin, CurrentUser};
use crate::api::pagination::{PageParams, PaginatedResponse};
use crate::api::validation::validate_code;
use crate::core::state::AppState;
use crate::core::time::primitive_now_utc;
use crate::db::types::DifficultyLevel;
use crate::repositories;
use crate::schemas::problem::{ProblemCreate, ProblemDetail, ProblemSummary};
use crate::schemas::submission::{SubmissionCreate, SubmissionResponse};

/// Max submissions per student per window.
const SUBMIT_RATE_LIMIT: u64 = 20;
const SUBMIT_RATE_WINDOW_SECONDS: u64 = 60;

pub(crate) fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list).post(create))
        .route("/:problem_id", get(detail).delete(remove))
        .route("/:problem_id/submissions", post(submit).get(history))
}

#[derive(Debug, serde::Deserialize)]
struct ProblemFilter {
    difficulty: Option<DifficultyLevel>,
}

async fn list(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Query(page): Query<PageParams>,
    Query(filter): Query<ProblemFilter>,
) -> Result<Json<PaginatedResponse<ProblemSummary>>, ApiError> {
    let (skip, limit) = page.clamped();

    let rows = repositories::problems::list_for_student(
        state.db(),
        &user.id,
        filter.difficulty,
        limit,
        skip,
    )
    .await
    .map_err(|e| ApiError::internal(e, "Failed to list problems"))?;
    let total_count = repositories::problems::count(state.db(), filter.difficulty)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to count problems"))?;

    Ok(Json(PaginatedResponse {
        items: rows.into_iter().map(ProblemSummary::from_row).collect(),
        total_count,
        skip,
        limit,
    }))
}

async fn detail(
    State(state): State<AppState>,
    CurrentUser(_user): CurrentUser,
    Path(problem_id): Path<String>,
) -> Result<Json<ProblemDetail>, ApiError> {
    let problem = repositories::problems::find_by_id(state.db(), &problem_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to load problem"))?
        .ok_or_else(|| ApiError::NotFound("Problem not found".to_string()))?;

    let cases = repositories::problems::list_cases(state.db(), &problem_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to load test cases"))?;

    Ok(Json(ProblemDetail::from_db(problem, &cases)))
}

async fn create(
    State(state): State<AppState>,
    CurrentAdmin(_admin): CurrentAdmin,
    Json(payload): Json<ProblemCreate>,
) -> Result<(StatusCode, Json<ProblemDetail>), ApiError> {
    payload.validate().map_err(|e| ApiError::BadRequest(e.to_string()))?;

    let existing = repositories::problems::exists_by_title(state.db(), &payload.title)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to check existing problem"))?;
    if existing.is_some() {
        return Err(ApiError::Conflict("Problem with this title already exists".to_string()));
    }

    let problem = repositories::problems::create(
        state.db(),
        repositories::problems::CreateProblem {
            title: &payload.title,
            description: &payload.description,
            difficulty: payload.difficulty,
            points: payload.points,
            cases: payload
                .cases
                .into_iter()
                .map(|case| repositories::problems::CreateTestCase {
                    input_data: case.input_data,
                    expected_output: case.expected_output,
                })
                .collect(),
            created_at: primitive_now_utc(),
        },
    )
    .await
    .map_err(|e| ApiError::internal(e, "Failed to create problem"))?;

    let cases = repositories::problems::list_cases(state.db(), &problem.id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to load test cases"))?;

    Ok((StatusCode::CREATED, Json(ProblemDetail::from_db(problem, &cases))))
}

async fn remove(
    State(state): State<AppState>,
    CurrentAdmin(_admin): CurrentAdmin,
    Path(problem_id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let deleted = repositories::problems::delete(state.db(), &problem_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to delete problem"))?;

    if deleted {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ApiError::NotFound("Problem not found".to_string()))
    }
}

/// Records the attempt as a pending submission; the worker pool judges
/// it asynchronously. The response carries the pending row so clients
/// can poll its status.
async fn submit(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(problem_id): Path<String>,
    Json(payload): Json<SubmissionCreate>,
) -> Result<(StatusCode, Json<SubmissionResponse>), ApiError> {
    validate_code(&payload.code, state.settings().judge().max_code_bytes)?;

    let rate_key = format!("rl:submit:{}", user.id);
    let allowed = state
        .redis()
        .rate_limit(&rate_key, SUBMIT_RATE_LIMIT, SUBMIT_RATE_WINDOW_SECONDS)
        .await
        .unwrap_or(true);
    if !allowed {
        return Err(ApiError::TooManyRequests("Too many submissions, try again later"));
    }

    let problem = repositories::problems::find_by_id(state.db(), &problem_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to load problem"))?
        .ok_or_else(|| ApiError::NotFound("Problem not found".to_string()))?;

    let case_count = repositories::problems::count_cases(state.db(), &problem.id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to count test cases"))?;
    if case_count == 0 {
        return Err(ApiError::BadRequest(
            "Problem has no test cases and cannot be judged".to_string(),
        ));
    }

    let submission = repositories::submissions::insert_pending(
        state.db(),
        &problem.id,
        &user.id,
        &payload.code,
        primitive_now_utc(),
    )
    .await
    .map_err(|e| ApiError::internal(e, "Failed to record submission"))?;

    metrics::counter!("submissions_received_total").increment(1);

    Ok((StatusCode::ACCEPTED, Json(SubmissionResponse::from_db(submission))))
}

async fn history(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(problem_id): Path<String>,
    Query(page): Query<PageParams>,
) -> Result<Json<Vec<SubmissionResponse>>, ApiError> {
    let (skip, limit) = page.clamped();

    let submissions = repositories::submissions::list_by_student_and_problem(
        state.db(),
        &user.id,
        &problem_id,
        limit,
        skip,
    )
    .await
    .map_err(|e| ApiError::internal(e, "Failed to list submissions"))?;

    Ok(Json(submissions.into_iter().map(SubmissionResponse::from_db).collect()))
}
