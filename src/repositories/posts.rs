use sqlx::SqlitePool;

use crate::core::errors::StorageResult;
use crate::models::models::{NewPost, Post, PostChanges};

/// Repository for post rows, joined with `users` for the author's username.
#[derive(Clone)]
pub struct PostRepository {
    pool: SqlitePool,
}

impl PostRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Insert a post and return its assigned id. Likes start at the
    /// column default.
    pub async fn create(&self, post: &NewPost) -> StorageResult<i64> {
        let result = sqlx::query("INSERT INTO posts (title, content, author_id) VALUES (?, ?, ?)")
            .bind(&post.title)
            .bind(&post.content)
            .bind(post.author_id)
            .execute(&self.pool)
            .await?;

        Ok(result.last_insert_rowid())
    }

    pub async fn get_by_id(&self, post_id: i64) -> StorageResult<Option<Post>> {
        let post = sqlx::query_as::<_, Post>(
            r#"
            SELECT p.id, p.title, p.content, p.author_id, p.likes, p.created_at,
                   u.username AS author_username
            FROM posts p
            INNER JOIN users u ON u.id = p.author_id
            WHERE p.id = ?
            "#,
        )
        .bind(post_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(post)
    }

    /// Posts written by the user or by anyone they follow, newest id first.
    pub async fn get_feed(&self, user_id: i64) -> StorageResult<Vec<Post>> {
        // LEFT JOIN keeps the user's own posts when nobody follows them;
        // DISTINCT folds the one-row-per-follower fan out.
        let posts = sqlx::query_as::<_, Post>(
            r#"
            SELECT DISTINCT p.id, p.title, p.content, p.author_id, p.likes, p.created_at,
                   u.username AS author_username
            FROM posts p
            INNER JOIN users u ON u.id = p.author_id
            LEFT JOIN followers f ON p.author_id = f.user_id
            WHERE p.author_id = ? OR f.follower_id = ?
            ORDER BY p.id DESC
            "#,
        )
        .bind(user_id)
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(posts)
    }

    /// Posts by exactly one author. Row order is whatever storage returns.
    pub async fn get_by_author(&self, user_id: i64) -> StorageResult<Vec<Post>> {
        let posts = sqlx::query_as::<_, Post>(
            r#"
            SELECT p.id, p.title, p.content, p.author_id, p.likes, p.created_at,
                   u.username AS author_username
            FROM posts p
            INNER JOIN users u ON u.id = p.author_id
            WHERE p.author_id = ?
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(posts)
    }

    pub async fn update(&self, post_id: i64, changes: &PostChanges) -> StorageResult<()> {
        sqlx::query("UPDATE posts SET title = ?, content = ? WHERE id = ?")
            .bind(&changes.title)
            .bind(&changes.content)
            .bind(post_id)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    pub async fn delete(&self, post_id: i64) -> StorageResult<()> {
        sqlx::query("DELETE FROM posts WHERE id = ?")
            .bind(post_id)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    /// Increment the like counter in a single statement.
    pub async fn like(&self, post_id: i64) -> StorageResult<()> {
        sqlx::query("UPDATE posts SET likes = likes + 1 WHERE id = ?")
            .bind(post_id)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    /// Decrement the like counter in a single statement, never below zero.
    pub async fn dislike(&self, post_id: i64) -> StorageResult<()> {
        sqlx::query(
            r#"
            UPDATE posts SET likes = CASE
                WHEN likes > 0 THEN likes - 1
                ELSE likes
            END
            WHERE id = ?
            "#,
        )
        .bind(post_id)
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}
