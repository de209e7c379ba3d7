use sqlx::PgPool;

/// Adds `points` to the student's score inside its own transaction.
///
/// The row is locked with `FOR UPDATE` and the increment happens in the
/// database (`score = score + $n`), so concurrent awards serialize on the
/// lock and every award lands exactly once. Returns the new score, or
/// `None` when no such user exists.
pub(crate) async fn increment_score(
    pool: &PgPool,
    student_id: &str,
    points: i64,
) -> Result<Option<i64>, sqlx::Error> {
    let mut tx = pool.begin().await?;

    let locked = sqlx::query_scalar::<_, i64>("SELECT score FROM users WHERE id = $1 FOR UPDATE")
        .bind(student_id)
        .fetch_optional(&mut *tx)
        .await?;

    if locked.is_none() {
        tx.rollback().await?;
        return Ok(None);
    }

    let new_score = sqlx::query_scalar::<_, i64>(
        "UPDATE users SET score = score + $1 WHERE id = $2 RETURNING score",
    )
    .bind(points)
    .bind(student_id)
    .fetch_one(&mut *tx)
    .await?;

    tx.commit().await?;
    Ok(Some(new_score))
}

#[cfg(test)]
mod tests {
    use uuid::Uuid;

    use super::increment_score;
    use crate::test_support;

    #[tokio::test]
    async fn concurrent_awards_all_land() {
        let Some(pool) = test_support::database().await else {
            return;
        };

        let student_id = test_support::insert_student(&pool).await.expect("student");

        let mut handles = Vec::new();
        for _ in 0..20 {
            let pool = pool.clone();
            let student_id = student_id.clone();
            handles.push(tokio::spawn(
                async move { increment_score(&pool, &student_id, 5).await },
            ));
        }
        for handle in handles {
            handle.await.expect("join").expect("award").expect("known student");
        }

        let score: i64 = sqlx::query_scalar("SELECT score FROM users WHERE id = $1")
            .bind(&student_id)
            .fetch_one(&pool)
            .await
            .expect("score");

        assert_eq!(score, 100, "every concurrent award must land exactly once");
    }

    #[tokio::test]
    async fn unknown_student_is_a_noop() {
        let Some(pool) = test_support::database().await else {
            return;
        };

        let result = increment_score(&pool, &Uuid::new_v4().to_string(), 5).await.expect("query");
        assert!(result.is_none());
    }

    #[tokio::test]
    async fn negative_balance_is_rejected_by_schema() {
        let Some(pool) = test_support::database().await else {
            return;
        };

        let student_id = test_support::insert_student(&pool).await.expect("student");

        let result = increment_score(&pool, &student_id, -1).await;
        assert!(result.is_err(), "score below zero must violate the check constraint");
    }
}
