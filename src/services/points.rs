use sqlx::PgPool;

use crate::repositories;

/// Credits points to a student's score.
///
/// Preconditions make the call a silent no-op: a non-positive amount or
/// an unknown student changes nothing. Database failures are logged and
/// swallowed; the caller's operation has already committed and a lost
/// award must not undo it.
pub(crate) async fn award_points(pool: &PgPool, student_id: &str, points: i64) {
    if points <= 0 {
        return;
    }

    match repositories::scores::increment_score(pool, student_id, points).await {
        Ok(Some(new_score)) => {
            tracing::info!(student_id, points, new_score, "points awarded");
            metrics::counter!("points_awarded_total").increment(points as u64);
        }
        Ok(None) => {
            tracing::warn!(student_id, points, "points award skipped: unknown student");
        }
        Err(err) => {
            tracing::error!(error = %err, student_id, points, "points award failed");
            metrics::counter!("points_award_errors_total").increment(1);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::lazy_pool;

    // The lazy pool never connects; reaching the database would fail the
    // test, so these prove the preconditions short-circuit.

    #[tokio::test]
    async fn zero_points_is_a_noop() {
        let pool = lazy_pool();
        award_points(&pool, "student-1", 0).await;
    }

    #[tokio::test]
    async fn negative_points_is_a_noop() {
        let pool = lazy_pool();
        award_points(&pool, "student-1", -25).await;
    }
}
