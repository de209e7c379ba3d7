use sqlx::PgPool;
use time::PrimitiveDateTime;
use uuid::Uuid;

use crate::db::models::Badge;
use crate::db::types::BadgeCategory;

const COLUMNS: &str = "id, title, description, icon, category, threshold, created_at";

pub(crate) async fn list_all(pool: &PgPool) -> Result<Vec<Badge>, sqlx::Error> {
    sqlx::query_as::<_, Badge>(&format!(
        "SELECT {COLUMNS} FROM badges ORDER BY category, threshold",
    ))
    .fetch_all(pool)
    .await
}

pub(crate) async fn held_badge_ids(
    pool: &PgPool,
    student_id: &str,
) -> Result<Vec<String>, sqlx::Error> {
    sqlx::query_scalar::<_, String>("SELECT badge_id FROM student_badges WHERE student_id = $1")
        .bind(student_id)
        .fetch_all(pool)
        .await
}

/// Grants a badge. `ON CONFLICT DO NOTHING` makes concurrent duplicate
/// grants collapse to one row; returns whether this call inserted it.
pub(crate) async fn grant(
    pool: &PgPool,
    student_id: &str,
    badge_id: &str,
    now: PrimitiveDateTime,
) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(
        "INSERT INTO student_badges (student_id, badge_id, awarded_at)
         VALUES ($1,$2,$3)
         ON CONFLICT (student_id, badge_id) DO NOTHING",
    )
    .bind(student_id)
    .bind(badge_id)
    .bind(now)
    .execute(pool)
    .await?;

    Ok(result.rows_affected() > 0)
}

pub(crate) struct CreateBadge<'a> {
    pub title: &'a str,
    pub description: &'a str,
    pub icon: &'a str,
    pub category: BadgeCategory,
    pub threshold: i32,
    pub created_at: PrimitiveDateTime,
}

pub(crate) async fn create(pool: &PgPool, params: CreateBadge<'_>) -> Result<Badge, sqlx::Error> {
    sqlx::query_as::<_, Badge>(&format!(
        "INSERT INTO badges (id, title, description, icon, category, threshold, created_at)
         VALUES ($1,$2,$3,$4,$5,$6,$7)
         RETURNING {COLUMNS}",
    ))
    .bind(Uuid::new_v4().to_string())
    .bind(params.title)
    .bind(params.description)
    .bind(params.icon)
    .bind(params.category)
    .bind(params.threshold)
    .bind(params.created_at)
    .fetch_one(pool)
    .await
}

pub(crate) async fn exists_by_title(
    pool: &PgPool,
    title: &str,
) -> Result<Option<String>, sqlx::Error> {
    sqlx::query_scalar::<_, String>("SELECT id FROM badges WHERE title = $1")
        .bind(title)
        .fetch_optional(pool)
        .await
}

#[cfg(test)]
mod tests {
    use sqlx::PgPool;
    use uuid::Uuid;

    use super::grant;
    use crate::core::time::primitive_now_utc;
    use crate::test_support;

    async fn insert_badge(pool: &PgPool) -> Result<String, sqlx::Error> {
        let id = Uuid::new_v4().to_string();
        sqlx::query(
            "INSERT INTO badges (id, title, description, icon, category, threshold, created_at)
             VALUES ($1, $2, '', '', 'problems', 1, $3)",
        )
        .bind(&id)
        .bind(format!("badge_{}", &id[..8]))
        .bind(primitive_now_utc())
        .execute(pool)
        .await?;
        Ok(id)
    }

    #[tokio::test]
    async fn duplicate_grants_collapse_to_one_row() {
        let Some(pool) = test_support::database().await else {
            return;
        };

        let student_id = test_support::insert_student(&pool).await.expect("student");
        let badge_id = insert_badge(&pool).await.expect("badge");

        let mut handles = Vec::new();
        for _ in 0..8 {
            let pool = pool.clone();
            let student_id = student_id.clone();
            let badge_id = badge_id.clone();
            handles.push(tokio::spawn(async move {
                grant(&pool, &student_id, &badge_id, primitive_now_utc()).await
            }));
        }

        let mut inserted = 0;
        for handle in handles {
            if handle.await.expect("join").expect("grant") {
                inserted += 1;
            }
        }

        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM student_badges WHERE student_id = $1 AND badge_id = $2",
        )
        .bind(&student_id)
        .bind(&badge_id)
        .fetch_one(&pool)
        .await
        .expect("count");

        assert_eq!(inserted, 1, "exactly one concurrent grant must report the insert");
        assert_eq!(count, 1, "duplicate grants must collapse to one row");
    }
}
