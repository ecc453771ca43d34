use chrono::Utc;
use sqlx::SqlitePool;
use uuid::Uuid;

use crate::core::errors::StorageResult;
use crate::models::models::Session;

/// Opaque bearer tokens issued at login.
#[derive(Clone)]
pub struct SessionRepository {
    pool: SqlitePool,
}

impl SessionRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn issue(&self, user_id: i64) -> StorageResult<String> {
        let token = Uuid::new_v4().to_string();
        sqlx::query("INSERT INTO sessions (token, user_id, created_at) VALUES (?, ?, ?)")
            .bind(&token)
            .bind(user_id)
            .bind(Utc::now().naive_utc())
            .execute(&self.pool)
            .await?;

        Ok(token)
    }

    pub async fn lookup(&self, token: &str) -> StorageResult<Option<Session>> {
        let session = sqlx::query_as::<_, Session>(
            "SELECT user_id, created_at FROM sessions WHERE token = ?",
        )
        .bind(token)
        .fetch_optional(&self.pool)
        .await?;

        Ok(session)
    }

    pub async fn revoke(&self, token: &str) -> StorageResult<()> {
        sqlx::query("DELETE FROM sessions WHERE token = ?")
            .bind(token)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    pub async fn revoke_all(&self, user_id: i64) -> StorageResult<()> {
        sqlx::query("DELETE FROM sessions WHERE user_id = ?")
            .bind(user_id)
            .execute(&self.pool)
            .await?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::db::memory_pool;
    use crate::models::models::NewUser;
    use crate::repositories::users::UserRepository;

    #[tokio::test]
    async fn test_issue_lookup_revoke() {
        let pool = memory_pool().await.unwrap();
        let user_id = UserRepository::new(pool.clone())
            .create(&NewUser {
                name: "Alice".to_string(),
                username: "alice".to_string(),
                email: "alice@example.com".to_string(),
                password: "hash".to_string(),
            })
            .await
            .unwrap();
        let repo = SessionRepository::new(pool);

        let first = repo.issue(user_id).await.unwrap();
        let second = repo.issue(user_id).await.unwrap();
        assert_ne!(first, second);

        let session = repo.lookup(&first).await.unwrap().unwrap();
        assert_eq!(session.user_id, user_id);

        repo.revoke(&first).await.unwrap();
        assert!(repo.lookup(&first).await.unwrap().is_none());
        assert!(repo.lookup(&second).await.unwrap().is_some());

        repo.revoke_all(user_id).await.unwrap();
        assert!(repo.lookup(&second).await.unwrap().is_none());
    }
}
