use sqlx::SqlitePool;

use crate::core::errors::StorageResult;
use crate::models::models::{Credentials, NewUser, User, UserChanges};

#[derive(Clone)]
pub struct UserRepository {
    pool: SqlitePool,
}

impl UserRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Insert a user. `user.password` must already be hashed.
    pub async fn create(&self, user: &NewUser) -> StorageResult<i64> {
        let result = sqlx::query(
            "INSERT INTO users (name, username, email, password) VALUES (?, ?, ?, ?)",
        )
        .bind(&user.name)
        .bind(&user.username)
        .bind(&user.email)
        .bind(&user.password)
        .execute(&self.pool)
        .await?;

        Ok(result.last_insert_rowid())
    }

    /// Users whose name or username contains `filter`; an empty filter
    /// matches everyone.
    pub async fn search(&self, filter: &str) -> StorageResult<Vec<User>> {
        let escaped = filter
            .replace('\\', "\\\\")
            .replace('%', "\\%")
            .replace('_', "\\_");
        let pattern = format!("%{}%", escaped);
        let users = sqlx::query_as::<_, User>(
            r#"
            SELECT id, name, username, email, created_at FROM users
            WHERE name LIKE ? ESCAPE '\' OR username LIKE ? ESCAPE '\'
            ORDER BY id
            "#,
        )
        .bind(&pattern)
        .bind(&pattern)
        .fetch_all(&self.pool)
        .await?;

        Ok(users)
    }

    pub async fn get_by_id(&self, user_id: i64) -> StorageResult<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            "SELECT id, name, username, email, created_at FROM users WHERE id = ?",
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    pub async fn get_credentials(&self, username: &str) -> StorageResult<Option<Credentials>> {
        let credentials =
            sqlx::query_as::<_, Credentials>("SELECT id, password FROM users WHERE username = ?")
                .bind(username)
                .fetch_optional(&self.pool)
                .await?;

        Ok(credentials)
    }

    pub async fn update(&self, user_id: i64, changes: &UserChanges) -> StorageResult<()> {
        sqlx::query("UPDATE users SET name = ?, username = ?, email = ? WHERE id = ?")
            .bind(&changes.name)
            .bind(&changes.username)
            .bind(&changes.email)
            .bind(user_id)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    /// Removes the user; posts, follow edges and sessions cascade.
    pub async fn delete(&self, user_id: i64) -> StorageResult<()> {
        sqlx::query("DELETE FROM users WHERE id = ?")
            .bind(user_id)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    pub async fn get_password_hash(&self, user_id: i64) -> StorageResult<Option<String>> {
        let hash = sqlx::query_scalar::<_, String>("SELECT password FROM users WHERE id = ?")
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(hash)
    }

    pub async fn update_password(&self, user_id: i64, hash: &str) -> StorageResult<()> {
        sqlx::query("UPDATE users SET password = ? WHERE id = ?")
            .bind(hash)
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

    fn new_user(username: &str) -> NewUser {
        NewUser {
            name: format!("{} Example", username),
            username: username.to_string(),
            email: format!("{}@example.com", username),
            password: "hash".to_string(),
        }
    }

    #[tokio::test]
    async fn test_create_and_get() {
        let repo = UserRepository::new(memory_pool().await.unwrap());
        let id = repo.create(&new_user("alice")).await.unwrap();

        let user = repo.get_by_id(id).await.unwrap().unwrap();
        assert_eq!(user.username, "alice");
        assert_eq!(user.email, "alice@example.com");
        assert!(repo.get_by_id(id + 1).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_duplicate_username_is_unique_violation() {
        let repo = UserRepository::new(memory_pool().await.unwrap());
        repo.create(&new_user("alice")).await.unwrap();

        let mut dup = new_user("alice");
        dup.email = "other@example.com".to_string();
        let err = repo.create(&dup).await.unwrap_err();
        assert!(err.is_unique_violation());
    }

    #[tokio::test]
    async fn test_search_matches_name_or_username() {
        let repo = UserRepository::new(memory_pool().await.unwrap());
        repo.create(&new_user("alice")).await.unwrap();
        repo.create(&new_user("bob")).await.unwrap();

        let found = repo.search("ali").await.unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].username, "alice");

        assert_eq!(repo.search("").await.unwrap().len(), 2);
        assert!(repo.search("zed").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_search_treats_wildcards_literally() {
        let repo = UserRepository::new(memory_pool().await.unwrap());
        repo.create(&new_user("alice")).await.unwrap();
        repo.create(&new_user("bob_builder")).await.unwrap();

        assert!(repo.search("%").await.unwrap().is_empty());
        let found = repo.search("b_b").await.unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].username, "bob_builder");
        assert!(repo.search("a_i").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_update_and_password() {
        let repo = UserRepository::new(memory_pool().await.unwrap());
        let id = repo.create(&new_user("alice")).await.unwrap();

        repo.update(
            id,
            &UserChanges {
                name: "Alice A.".to_string(),
                username: "alicia".to_string(),
                email: "alicia@example.com".to_string(),
            },
        )
        .await
        .unwrap();
        repo.update_password(id, "new-hash").await.unwrap();

        let user = repo.get_by_id(id).await.unwrap().unwrap();
        assert_eq!(user.username, "alicia");
        assert_eq!(repo.get_password_hash(id).await.unwrap().as_deref(), Some("new-hash"));

        let creds = repo.get_credentials("alicia").await.unwrap().unwrap();
        assert_eq!(creds.id, id);
        assert!(repo.get_credentials("alice").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_delete_cascades_to_posts() {
        let pool = memory_pool().await.unwrap();
        let repo = UserRepository::new(pool.clone());
        let id = repo.create(&new_user("alice")).await.unwrap();
        sqlx::query("INSERT INTO posts (title, content, author_id) VALUES ('t', 'c', ?)")
            .bind(id)
            .execute(&pool)
            .await
            .unwrap();

        repo.delete(id).await.unwrap();

        assert!(repo.get_by_id(id).await.unwrap().is_none());
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM posts")
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(count, 0);
    }
}
