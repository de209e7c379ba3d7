use sqlx::PgPool;
use time::PrimitiveDateTime;
use uuid::Uuid;

use crate::db::models::{Course, Lesson};

const COURSE_COLUMNS: &str = "id, title, description, position";

const LESSON_COLUMNS: &str = "id, course_id, title, content, position, points";

pub(crate) async fn list(pool: &PgPool) -> Result<Vec<Course>, sqlx::Error> {
    sqlx::query_as::<_, Course>(&format!(
        "SELECT {COURSE_COLUMNS} FROM courses ORDER BY position, title",
    ))
    .fetch_all(pool)
    .await
}

pub(crate) async fn find_by_id(pool: &PgPool, id: &str) -> Result<Option<Course>, sqlx::Error> {
    sqlx::query_as::<_, Course>(&format!("SELECT {COURSE_COLUMNS} FROM courses WHERE id = $1"))
        .bind(id)
        .fetch_optional(pool)
        .await
}

pub(crate) async fn create(
    pool: &PgPool,
    title: &str,
    description: &str,
    position: i32,
) -> Result<Course, sqlx::Error> {
    sqlx::query_as::<_, Course>(&format!(
        "INSERT INTO courses (id, title, description, position)
         VALUES ($1,$2,$3,$4)
         RETURNING {COURSE_COLUMNS}",
    ))
    .bind(Uuid::new_v4().to_string())
    .bind(title)
    .bind(description)
    .bind(position)
    .fetch_one(pool)
    .await
}

pub(crate) async fn list_lessons(
    pool: &PgPool,
    course_id: &str,
) -> Result<Vec<Lesson>, sqlx::Error> {
    sqlx::query_as::<_, Lesson>(&format!(
        "SELECT {LESSON_COLUMNS} FROM lessons WHERE course_id = $1 ORDER BY position, title",
    ))
    .bind(course_id)
    .fetch_all(pool)
    .await
}

/// Every lesson across all courses, ordered so the rows group naturally
/// by course when assembling the catalogue response.
pub(crate) async fn list_all_lessons(pool: &PgPool) -> Result<Vec<Lesson>, sqlx::Error> {
    sqlx::query_as::<_, Lesson>(&format!(
        "SELECT {LESSON_COLUMNS} FROM lessons ORDER BY course_id, position, title",
    ))
    .fetch_all(pool)
    .await
}

pub(crate) async fn find_lesson(pool: &PgPool, id: &str) -> Result<Option<Lesson>, sqlx::Error> {
    sqlx::query_as::<_, Lesson>(&format!("SELECT {LESSON_COLUMNS} FROM lessons WHERE id = $1"))
        .bind(id)
        .fetch_optional(pool)
        .await
}

pub(crate) struct CreateLesson<'a> {
    pub course_id: &'a str,
    pub title: &'a str,
    pub content: &'a str,
    pub position: i32,
    pub points: i32,
}

pub(crate) async fn create_lesson(
    pool: &PgPool,
    params: CreateLesson<'_>,
) -> Result<Lesson, sqlx::Error> {
    sqlx::query_as::<_, Lesson>(&format!(
        "INSERT INTO lessons (id, course_id, title, content, position, points)
         VALUES ($1,$2,$3,$4,$5,$6)
         RETURNING {LESSON_COLUMNS}",
    ))
    .bind(Uuid::new_v4().to_string())
    .bind(params.course_id)
    .bind(params.title)
    .bind(params.content)
    .bind(params.position)
    .bind(params.points)
    .fetch_one(pool)
    .await
}

/// Marks a lesson complete. Returns `false` when the student had already
/// completed it (the completion is first-time only).
pub(crate) async fn complete_lesson(
    pool: &PgPool,
    student_id: &str,
    lesson_id: &str,
    now: PrimitiveDateTime,
) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(
        "INSERT INTO lesson_progress (student_id, lesson_id, completed_at)
         VALUES ($1,$2,$3)
         ON CONFLICT (student_id, lesson_id) DO NOTHING",
    )
    .bind(student_id)
    .bind(lesson_id)
    .bind(now)
    .execute(pool)
    .await?;

    Ok(result.rows_affected() > 0)
}

pub(crate) async fn count_completed_lessons(
    pool: &PgPool,
    student_id: &str,
) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM lesson_progress WHERE student_id = $1")
        .bind(student_id)
        .fetch_one(pool)
        .await
}

pub(crate) async fn completed_lesson_ids(
    pool: &PgPool,
    student_id: &str,
    course_id: &str,
) -> Result<Vec<String>, sqlx::Error> {
    sqlx::query_scalar::<_, String>(
        "SELECT lp.lesson_id
         FROM lesson_progress lp
         JOIN lessons l ON l.id = lp.lesson_id
         WHERE lp.student_id = $1 AND l.course_id = $2",
    )
    .bind(student_id)
    .bind(course_id)
    .fetch_all(pool)
    .await
}

pub(crate) async fn all_completed_lesson_ids(
    pool: &PgPool,
    student_id: &str,
) -> Result<Vec<String>, sqlx::Error> {
    sqlx::query_scalar::<_, String>(
        "SELECT lesson_id FROM lesson_progress WHERE student_id = $1",
    )
    .bind(student_id)
    .fetch_all(pool)
    .await
}
