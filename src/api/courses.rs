use std::collections::{HashMap, HashSet};

use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use validator::Validate;

use crate::api::errors::ApiError;
use crate::api::guards::{CurrentAdmin, CurrentUser};
use crate::core::state::AppState;
use crate::core::time::primitive_now_utc;
use crate::repositories;
use crate::schemas::course::{
    CourseCreate, CourseResponse, LessonCreate, LessonResponse, QuizResponse,
};
use crate::services::events::ProgressEvent;

pub(crate) fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list).post(create))
        .route("/:course_id/lessons", get(list_lessons).post(create_lesson))
        .route("/:course_id/quizzes", get(list_quizzes))
}

/// Lesson routes addressed by lesson id rather than course.
pub(crate) fn lessons_router() -> Router<AppState> {
    Router::new().route("/:lesson_id/complete", post(complete_lesson))
}

/// Course catalogue with each course's lessons inlined, flagged with the
/// caller's completion state. Three queries total regardless of course count.
async fn list(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> Result<Json<Vec<CourseResponse>>, ApiError> {
    let courses = repositories::courses::list(state.db())
        .await
        .map_err(|e| ApiError::internal(e, "Failed to list courses"))?;
    let lessons = repositories::courses::list_all_lessons(state.db())
        .await
        .map_err(|e| ApiError::internal(e, "Failed to list lessons"))?;
    let completed: HashSet<String> =
        repositories::courses::all_completed_lesson_ids(state.db(), &user.id)
            .await
            .map_err(|e| ApiError::internal(e, "Failed to load lesson progress"))?
            .into_iter()
            .collect();

    let mut by_course: HashMap<String, Vec<LessonResponse>> = HashMap::new();
    for lesson in lessons {
        let done = completed.contains(&lesson.id);
        by_course
            .entry(lesson.course_id.clone())
            .or_default()
            .push(LessonResponse::from_db(lesson, done));
    }

    Ok(Json(
        courses
            .into_iter()
            .map(|course| {
                let lessons = by_course.remove(&course.id).unwrap_or_default();
                CourseResponse::from_db(course, lessons)
            })
            .collect(),
    ))
}

async fn create(
    State(state): State<AppState>,
    CurrentAdmin(_admin): CurrentAdmin,
    Json(payload): Json<CourseCreate>,
) -> Result<(StatusCode, Json<CourseResponse>), ApiError> {
    payload.validate().map_err(|e| ApiError::BadRequest(e.to_string()))?;

    let course = repositories::courses::create(
        state.db(),
        &payload.title,
        &payload.description,
        payload.position,
    )
    .await
    .map_err(|e| match &e {
        sqlx::Error::Database(db) if db.is_unique_violation() => {
            ApiError::Conflict("Course with this title already exists".to_string())
        }
        _ => ApiError::internal(e, "Failed to create course"),
    })?;

    Ok((StatusCode::CREATED, Json(CourseResponse::from_db(course, Vec::new()))))
}

async fn list_quizzes(
    State(state): State<AppState>,
    CurrentUser(_user): CurrentUser,
    Path(course_id): Path<String>,
) -> Result<Json<Vec<QuizResponse>>, ApiError> {
    let course = repositories::courses::find_by_id(state.db(), &course_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to load course"))?;
    if course.is_none() {
        return Err(ApiError::NotFound("Course not found".to_string()));
    }

    let quizzes = repositories::quizzes::list_by_course(state.db(), &course_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to list quizzes"))?;

    Ok(Json(quizzes.into_iter().map(QuizResponse::from_db).collect()))
}

async fn list_lessons(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(course_id): Path<String>,
) -> Result<Json<Vec<LessonResponse>>, ApiError> {
    let course = repositories::courses::find_by_id(state.db(), &course_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to load course"))?;
    if course.is_none() {
        return Err(ApiError::NotFound("Course not found".to_string()));
    }

    let lessons = repositories::courses::list_lessons(state.db(), &course_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to list lessons"))?;
    let completed = repositories::courses::completed_lesson_ids(state.db(), &user.id, &course_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to load lesson progress"))?;

    Ok(Json(
        lessons
            .into_iter()
            .map(|lesson| {
                let done = completed.contains(&lesson.id);
                LessonResponse::from_db(lesson, done)
            })
            .collect(),
    ))
}

async fn create_lesson(
    State(state): State<AppState>,
    CurrentAdmin(_admin): CurrentAdmin,
    Path(course_id): Path<String>,
    Json(payload): Json<LessonCreate>,
) -> Result<(StatusCode, Json<LessonResponse>), ApiError> {
    payload.validate().map_err(|e| ApiError::BadRequest(e.to_string()))?;

    let course = repositories::courses::find_by_id(state.db(), &course_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to load course"))?;
    if course.is_none() {
        return Err(ApiError::NotFound("Course not found".to_string()));
    }

    let lesson = repositories::courses::create_lesson(
        state.db(),
        repositories::courses::CreateLesson {
            course_id: &course_id,
            title: &payload.title,
            content: &payload.content,
            position: payload.position,
            points: payload.points,
        },
    )
    .await
    .map_err(|e| match &e {
        sqlx::Error::Database(db) if db.is_unique_violation() => {
            ApiError::Conflict("Lesson with this title already exists in the course".to_string())
        }
        _ => ApiError::internal(e, "Failed to create lesson"),
    })?;

    Ok((StatusCode::CREATED, Json(LessonResponse::from_db(lesson, false))))
}

/// First completion awards the lesson's points through the event bus;
/// repeat completions return the same shape with no side effects.
async fn complete_lesson(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(lesson_id): Path<String>,
) -> Result<Json<LessonResponse>, ApiError> {
    let lesson = repositories::courses::find_lesson(state.db(), &lesson_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to load lesson"))?
        .ok_or_else(|| ApiError::NotFound("Lesson not found".to_string()))?;

    let first_time = repositories::courses::complete_lesson(
        state.db(),
        &user.id,
        &lesson.id,
        primitive_now_utc(),
    )
    .await
    .map_err(|e| ApiError::internal(e, "Failed to record lesson completion"))?;

    if first_time {
        metrics::counter!("lessons_completed_total").increment(1);
        state.events().emit(ProgressEvent::LessonCompleted {
            student_id: user.id.clone(),
            lesson_id: lesson.id.clone(),
            points: lesson.points,
        });
    }

    Ok(Json(LessonResponse::from_db(lesson, true)))
}
