use sqlx::PgPool;
use time::PrimitiveDateTime;
use uuid::Uuid;

use crate::db::models::{Problem, TestCase};
use crate::db::types::DifficultyLevel;

const COLUMNS: &str = "id, title, description, difficulty, points, created_at, updated_at";

const CASE_COLUMNS: &str = "id, problem_id, input_data, expected_output, position";

pub(crate) async fn find_by_id(pool: &PgPool, id: &str) -> Result<Option<Problem>, sqlx::Error> {
    sqlx::query_as::<_, Problem>(&format!("SELECT {COLUMNS} FROM problems WHERE id = $1"))
        .bind(id)
        .fetch_optional(pool)
        .await
}

pub(crate) async fn exists_by_title(
    pool: &PgPool,
    title: &str,
) -> Result<Option<String>, sqlx::Error> {
    sqlx::query_scalar::<_, String>("SELECT id FROM problems WHERE title = $1")
        .bind(title)
        .fetch_optional(pool)
        .await
}

#[derive(Debug, Clone, sqlx::FromRow, serde::Serialize)]
pub(crate) struct ProblemListRow {
    pub(crate) id: String,
    pub(crate) title: String,
    pub(crate) difficulty: DifficultyLevel,
    pub(crate) points: i32,
    pub(crate) is_solved: bool,
}

/// Problem catalogue with a per-student solved flag, computed in one
/// query instead of an N+1 over submissions.
pub(crate) async fn list_for_student(
    pool: &PgPool,
    student_id: &str,
    difficulty: Option<DifficultyLevel>,
    limit: i64,
    offset: i64,
) -> Result<Vec<ProblemListRow>, sqlx::Error> {
    sqlx::query_as::<_, ProblemListRow>(
        "SELECT p.id, p.title, p.difficulty, p.points,
                EXISTS (
                    SELECT 1 FROM submissions s
                    WHERE s.problem_id = p.id
                      AND s.student_id = $1
                      AND s.status = 'correct'
                ) AS is_solved
         FROM problems p
         WHERE $2::difficultylevel IS NULL OR p.difficulty = $2
         ORDER BY p.created_at, p.id
         LIMIT $3 OFFSET $4",
    )
    .bind(student_id)
    .bind(difficulty)
    .bind(limit)
    .bind(offset)
    .fetch_all(pool)
    .await
}

pub(crate) async fn count(
    pool: &PgPool,
    difficulty: Option<DifficultyLevel>,
) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar::<_, i64>(
        "SELECT COUNT(*) FROM problems WHERE $1::difficultylevel IS NULL OR difficulty = $1",
    )
    .bind(difficulty)
    .fetch_one(pool)
    .await
}

/// Test cases in judging order: explicit position first, insertion id as
/// the tiebreak, so two cases sharing a position still judge deterministically.
pub(crate) async fn list_cases(
    pool: &PgPool,
    problem_id: &str,
) -> Result<Vec<TestCase>, sqlx::Error> {
    sqlx::query_as::<_, TestCase>(&format!(
        "SELECT {CASE_COLUMNS}
         FROM test_cases
         WHERE problem_id = $1
         ORDER BY position, id",
    ))
    .bind(problem_id)
    .fetch_all(pool)
    .await
}

pub(crate) async fn count_cases(pool: &PgPool, problem_id: &str) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM test_cases WHERE problem_id = $1")
        .bind(problem_id)
        .fetch_one(pool)
        .await
}

pub(crate) struct CreateProblem<'a> {
    pub title: &'a str,
    pub description: &'a str,
    pub difficulty: DifficultyLevel,
    pub points: i32,
    pub cases: Vec<CreateTestCase>,
    pub created_at: PrimitiveDateTime,
}

pub(crate) struct CreateTestCase {
    pub input_data: String,
    pub expected_output: String,
}

/// Inserts the problem and its cases atomically.
pub(crate) async fn create(
    pool: &PgPool,
    params: CreateProblem<'_>,
) -> Result<Problem, sqlx::Error> {
    let mut tx = pool.begin().await?;

    let problem = sqlx::query_as::<_, Problem>(&format!(
        "INSERT INTO problems (id, title, description, difficulty, points, created_at, updated_at)
         VALUES ($1,$2,$3,$4,$5,$6,$6)
         RETURNING {COLUMNS}",
    ))
    .bind(Uuid::new_v4().to_string())
    .bind(params.title)
    .bind(params.description)
    .bind(params.difficulty)
    .bind(params.points)
    .bind(params.created_at)
    .fetch_one(&mut *tx)
    .await?;

    for (position, case) in params.cases.into_iter().enumerate() {
        sqlx::query(
            "INSERT INTO test_cases (id, problem_id, input_data, expected_output, position)
             VALUES ($1,$2,$3,$4,$5)",
        )
        .bind(Uuid::new_v4().to_string())
        .bind(&problem.id)
        .bind(case.input_data)
        .bind(case.expected_output)
        .bind(position as i32)
        .execute(&mut *tx)
        .await?;
    }

    tx.commit().await?;
    Ok(problem)
}

pub(crate) async fn delete(pool: &PgPool, id: &str) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("DELETE FROM problems WHERE id = $1").bind(id).execute(pool).await?;
    Ok(result.rows_affected() > 0)
}
