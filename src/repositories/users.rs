use sqlx::PgPool;

use crate::db::models::User;
use crate::db::types::UserRole;

const COLUMNS: &str = "\
    id, username, hashed_password, full_name, role, is_active, score, \
    created_at, updated_at";

pub(crate) async fn find_by_id(pool: &PgPool, id: &str) -> Result<Option<User>, sqlx::Error> {
    sqlx::query_as::<_, User>(&format!("SELECT {COLUMNS} FROM users WHERE id = $1"))
        .bind(id)
        .fetch_optional(pool)
        .await
}

pub(crate) async fn find_by_username(
    pool: &PgPool,
    username: &str,
) -> Result<Option<User>, sqlx::Error> {
    sqlx::query_as::<_, User>(&format!("SELECT {COLUMNS} FROM users WHERE username = $1"))
        .bind(username)
        .fetch_optional(pool)
        .await
}

pub(crate) async fn exists_by_username(
    pool: &PgPool,
    username: &str,
) -> Result<Option<String>, sqlx::Error> {
    sqlx::query_scalar::<_, String>("SELECT id FROM users WHERE username = $1")
        .bind(username)
        .fetch_optional(pool)
        .await
}

pub(crate) struct CreateUser<'a> {
    pub id: &'a str,
    pub username: &'a str,
    pub hashed_password: String,
    pub full_name: &'a str,
    pub role: UserRole,
    pub created_at: time::PrimitiveDateTime,
}

pub(crate) async fn create(pool: &PgPool, params: CreateUser<'_>) -> Result<User, sqlx::Error> {
    sqlx::query_as::<_, User>(&format!(
        "INSERT INTO users (
            id, username, hashed_password, full_name, role, is_active, score,
            created_at, updated_at
        ) VALUES ($1,$2,$3,$4,$5,TRUE,0,$6,$6)
        RETURNING {COLUMNS}",
    ))
    .bind(params.id)
    .bind(params.username)
    .bind(params.hashed_password)
    .bind(params.full_name)
    .bind(params.role)
    .bind(params.created_at)
    .fetch_one(pool)
    .await
}

// Deserialize as well: cached leaderboard payloads come back out of
// Redis as JSON.
#[derive(Debug, Clone, sqlx::FromRow, serde::Serialize, serde::Deserialize)]
pub(crate) struct LeaderboardRow {
    pub(crate) id: String,
    pub(crate) username: String,
    pub(crate) full_name: String,
    pub(crate) score: i64,
}

/// Top scorers, ties broken by username so the ordering is stable.
pub(crate) async fn leaderboard(
    pool: &PgPool,
    limit: i64,
) -> Result<Vec<LeaderboardRow>, sqlx::Error> {
    sqlx::query_as::<_, LeaderboardRow>(
        "SELECT id, username, full_name, score
         FROM users
         WHERE is_active AND role = $1
         ORDER BY score DESC, username
         LIMIT $2",
    )
    .bind(UserRole::Student)
    .bind(limit)
    .fetch_all(pool)
    .await
}

#[cfg(test)]
mod tests {
    use super::LeaderboardRow;

    #[test]
    fn leaderboard_rows_decode_from_cached_json() {
        let rows = vec![LeaderboardRow {
            id: "u1".to_string(),
            username: "ada".to_string(),
            full_name: "Ada Lovelace".to_string(),
            score: 420,
        }];

        let payload = serde_json::to_string(&rows).expect("encode");
        let decoded: Vec<LeaderboardRow> = serde_json::from_str(&payload).expect("decode");

        assert_eq!(decoded.len(), 1);
        assert_eq!(decoded[0].username, "ada");
        assert_eq!(decoded[0].score, 420);
    }
}
