use sqlx::PgPool;
use time::PrimitiveDateTime;
use uuid::Uuid;

use crate::db::models::{Quiz, QuizResult};

const QUIZ_COLUMNS: &str = "id, course_id, title";

const RESULT_COLUMNS: &str = "id, student_id, quiz_id, score, submitted_at";

pub(crate) async fn find_by_id(pool: &PgPool, id: &str) -> Result<Option<Quiz>, sqlx::Error> {
    sqlx::query_as::<_, Quiz>(&format!("SELECT {QUIZ_COLUMNS} FROM quizzes WHERE id = $1"))
        .bind(id)
        .fetch_optional(pool)
        .await
}

pub(crate) async fn list_by_course(
    pool: &PgPool,
    course_id: &str,
) -> Result<Vec<Quiz>, sqlx::Error> {
    sqlx::query_as::<_, Quiz>(&format!(
        "SELECT {QUIZ_COLUMNS} FROM quizzes WHERE course_id = $1 ORDER BY title",
    ))
    .bind(course_id)
    .fetch_all(pool)
    .await
}

pub(crate) async fn create(
    pool: &PgPool,
    course_id: &str,
    title: &str,
) -> Result<Quiz, sqlx::Error> {
    sqlx::query_as::<_, Quiz>(&format!(
        "INSERT INTO quizzes (id, course_id, title)
         VALUES ($1,$2,$3)
         RETURNING {QUIZ_COLUMNS}",
    ))
    .bind(Uuid::new_v4().to_string())
    .bind(course_id)
    .bind(title)
    .fetch_one(pool)
    .await
}

/// Records a quiz result. The unique (student, quiz) pair makes the first
/// result the one that counts; a retake returns `None`.
pub(crate) async fn insert_result(
    pool: &PgPool,
    student_id: &str,
    quiz_id: &str,
    score: f64,
    now: PrimitiveDateTime,
) -> Result<Option<QuizResult>, sqlx::Error> {
    sqlx::query_as::<_, QuizResult>(&format!(
        "INSERT INTO quiz_results (id, student_id, quiz_id, score, submitted_at)
         VALUES ($1,$2,$3,$4,$5)
         ON CONFLICT (student_id, quiz_id) DO NOTHING
         RETURNING {RESULT_COLUMNS}",
    ))
    .bind(Uuid::new_v4().to_string())
    .bind(student_id)
    .bind(quiz_id)
    .bind(score)
    .bind(now)
    .fetch_optional(pool)
    .await
}

pub(crate) async fn count_results(pool: &PgPool, student_id: &str) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM quiz_results WHERE student_id = $1")
        .bind(student_id)
        .fetch_one(pool)
        .await
}
