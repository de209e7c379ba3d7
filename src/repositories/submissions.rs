use sqlx::PgPool;
use time::PrimitiveDateTime;
use uuid::Uuid;

use crate::db::models::Submission;
use crate::db::types::SubmissionStatus;

const COLUMNS: &str = "\
    id, problem_id, student_id, submitted_code, status, verdict_detail, \
    cases_passed, judging_started_at, judged_at, submitted_at";

pub(crate) async fn find_by_id(
    pool: &PgPool,
    id: &str,
) -> Result<Option<Submission>, sqlx::Error> {
    sqlx::query_as::<_, Submission>(&format!("SELECT {COLUMNS} FROM submissions WHERE id = $1"))
        .bind(id)
        .fetch_optional(pool)
        .await
}

pub(crate) async fn insert_pending(
    pool: &PgPool,
    problem_id: &str,
    student_id: &str,
    submitted_code: &str,
    now: PrimitiveDateTime,
) -> Result<Submission, sqlx::Error> {
    sqlx::query_as::<_, Submission>(&format!(
        "INSERT INTO submissions (id, problem_id, student_id, submitted_code, status, submitted_at)
         VALUES ($1,$2,$3,$4,$5,$6)
         RETURNING {COLUMNS}",
    ))
    .bind(Uuid::new_v4().to_string())
    .bind(problem_id)
    .bind(student_id)
    .bind(submitted_code)
    .bind(SubmissionStatus::Pending)
    .bind(now)
    .fetch_one(pool)
    .await
}

/// Claims the oldest pending submission for judging. `FOR UPDATE SKIP
/// LOCKED` lets concurrent workers drain the queue without contending on
/// the same row; the claim marker is what the stale-requeue loop keys on.
pub(crate) async fn claim_next_pending(
    pool: &PgPool,
    now: PrimitiveDateTime,
) -> Result<Option<Submission>, sqlx::Error> {
    sqlx::query_as::<_, Submission>(&format!(
        "WITH candidate AS (
            SELECT id
            FROM submissions
            WHERE status = $1
              AND judging_started_at IS NULL
            ORDER BY submitted_at
            FOR UPDATE SKIP LOCKED
            LIMIT 1
        )
        UPDATE submissions
        SET judging_started_at = $2
        FROM candidate
        WHERE submissions.id = candidate.id
        RETURNING {COLUMNS}",
    ))
    .bind(SubmissionStatus::Pending)
    .bind(now)
    .fetch_optional(pool)
    .await
}

pub(crate) struct Verdict {
    pub status: SubmissionStatus,
    pub detail: Option<String>,
    pub cases_passed: i32,
}

/// Records the verdict. The status guard makes finalization
/// idempotent: a submission already judged by another worker is left
/// untouched and the call reports `false`.
pub(crate) async fn finalize(
    pool: &PgPool,
    submission_id: &str,
    verdict: Verdict,
    now: PrimitiveDateTime,
) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(
        "UPDATE submissions
         SET status = $1,
             verdict_detail = $2,
             cases_passed = $3,
             judged_at = $4
         WHERE id = $5 AND status = $6",
    )
    .bind(verdict.status)
    .bind(verdict.detail)
    .bind(verdict.cases_passed)
    .bind(now)
    .bind(submission_id)
    .bind(SubmissionStatus::Pending)
    .execute(pool)
    .await?;

    Ok(result.rows_affected() > 0)
}

/// Returns claimed-but-unjudged submissions to the queue after a worker
/// crash. Pending is never terminal: anything stuck longer than the
/// threshold becomes claimable again.
pub(crate) async fn requeue_stale_claims(
    pool: &PgPool,
    claimed_before: PrimitiveDateTime,
) -> Result<u64, sqlx::Error> {
    let result = sqlx::query(
        "UPDATE submissions
         SET judging_started_at = NULL
         WHERE status = $1
           AND judging_started_at IS NOT NULL
           AND judging_started_at < $2",
    )
    .bind(SubmissionStatus::Pending)
    .bind(claimed_before)
    .execute(pool)
    .await?;

    Ok(result.rows_affected())
}

/// Whether the student already has a correct submission for this problem
/// other than the one just judged. Used to decide first-solve awards.
pub(crate) async fn has_earlier_correct(
    pool: &PgPool,
    student_id: &str,
    problem_id: &str,
    excluding_submission_id: &str,
) -> Result<bool, sqlx::Error> {
    sqlx::query_scalar::<_, bool>(
        "SELECT EXISTS (
            SELECT 1 FROM submissions
            WHERE student_id = $1
              AND problem_id = $2
              AND status = $3
              AND id <> $4
        )",
    )
    .bind(student_id)
    .bind(problem_id)
    .bind(SubmissionStatus::Correct)
    .bind(excluding_submission_id)
    .fetch_one(pool)
    .await
}

pub(crate) async fn count_solved_problems(
    pool: &PgPool,
    student_id: &str,
) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar::<_, i64>(
        "SELECT COUNT(DISTINCT problem_id) FROM submissions
         WHERE student_id = $1 AND status = $2",
    )
    .bind(student_id)
    .bind(SubmissionStatus::Correct)
    .fetch_one(pool)
    .await
}

pub(crate) async fn list_by_student_and_problem(
    pool: &PgPool,
    student_id: &str,
    problem_id: &str,
    limit: i64,
    offset: i64,
) -> Result<Vec<Submission>, sqlx::Error> {
    sqlx::query_as::<_, Submission>(&format!(
        "SELECT {COLUMNS}
         FROM submissions
         WHERE student_id = $1 AND problem_id = $2
         ORDER BY submitted_at DESC
         LIMIT $3 OFFSET $4",
    ))
    .bind(student_id)
    .bind(problem_id)
    .bind(limit)
    .bind(offset)
    .fetch_all(pool)
    .await
}

pub(crate) async fn delete(pool: &PgPool, id: &str) -> Result<bool, sqlx::Error> {
    let result =
        sqlx::query("DELETE FROM submissions WHERE id = $1").bind(id).execute(pool).await?;
    Ok(result.rows_affected() > 0)
}
