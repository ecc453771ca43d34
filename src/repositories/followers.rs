use sqlx::SqlitePool;

use crate::core::errors::StorageResult;
use crate::models::models::User;

/// Follow edges. `user_id` is the followed user, `follower_id` the one
/// following.
#[derive(Clone)]
pub struct FollowerRepository {
    pool: SqlitePool,
}

impl FollowerRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Idempotent: following twice keeps a single edge.
    pub async fn follow(&self, user_id: i64, follower_id: i64) -> StorageResult<()> {
        sqlx::query("INSERT OR IGNORE INTO followers (user_id, follower_id) VALUES (?, ?)")
            .bind(user_id)
            .bind(follower_id)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    pub async fn unfollow(&self, user_id: i64, follower_id: i64) -> StorageResult<()> {
        sqlx::query("DELETE FROM followers WHERE user_id = ? AND follower_id = ?")
            .bind(user_id)
            .bind(follower_id)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    /// Users following `user_id`.
    pub async fn followers(&self, user_id: i64) -> StorageResult<Vec<User>> {
        let users = sqlx::query_as::<_, User>(
            r#"
            SELECT u.id, u.name, u.username, u.email, u.created_at FROM users u
            INNER JOIN followers f ON u.id = f.follower_id
            WHERE f.user_id = ?
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(users)
    }

    /// Users that `user_id` follows.
    pub async fn following(&self, user_id: i64) -> StorageResult<Vec<User>> {
        let users = sqlx::query_as::<_, User>(
            r#"
            SELECT u.id, u.name, u.username, u.email, u.created_at FROM users u
            INNER JOIN followers f ON u.id = f.user_id
            WHERE f.follower_id = ?
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(users)
    }
}
