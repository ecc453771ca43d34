use actix_web::HttpResponse;
use tracing::info;

use crate::config::*;
use crate::core::errors::{ApiError, ApiResult};
use crate::core::helpers::sanitize_html;
use crate::models::models::{NewPost, Post, PostChanges};
use crate::repositories::PostRepository;
use crate::routes::RequestContext;

/// Cleans first, so markup-only or escape-inflated text is judged by
/// what would actually be stored.
fn prepare_post(body: &PostChanges) -> ApiResult<PostChanges> {
    let title = sanitize_html(body.title.trim()).trim().to_string();
    let content = sanitize_html(body.content.trim()).trim().to_string();

    if title.is_empty() {
        return Err(ApiError::BadRequest("Title is required".to_string()));
    }
    if title.len() > MAX_POST_TITLE_LENGTH {
        return Err(ApiError::BadRequest("Title too long".to_string()));
    }
    if content.is_empty() || content.len() > MAX_POST_LENGTH {
        return Err(ApiError::BadRequest("Invalid content".to_string()));
    }

    Ok(PostChanges { title, content })
}

async fn load_post(repo: &PostRepository, post_id: i64) -> ApiResult<Post> {
    repo.get_by_id(post_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Post not found".to_string()))
}

/// Loads the post and checks the caller wrote it.
async fn load_own_post(ctx: &RequestContext, repo: &PostRepository) -> ApiResult<i64> {
    let post_id = ctx.path_id("postID")?;
    let post = load_post(repo, post_id).await?;

    if post.author_id != ctx.current_user()? {
        return Err(ApiError::Forbidden(
            "Cannot change a post that is not yours".to_string(),
        ));
    }
    Ok(post_id)
}

pub async fn create_post(ctx: RequestContext) -> ApiResult<HttpResponse> {
    let author_id = ctx.current_user()?;
    let body: PostChanges = ctx.json()?;
    let post = prepare_post(&body)?;

    let repo = PostRepository::new(ctx.pool());
    let id = repo
        .create(&NewPost {
            title: post.title,
            content: post.content,
            author_id,
        })
        .await?;
    info!(post_id = id, author_id, "post created");

    let created = load_post(&repo, id).await?;
    Ok(HttpResponse::Created().json(created))
}

pub async fn get_feed(ctx: RequestContext) -> ApiResult<HttpResponse> {
    let user_id = ctx.current_user()?;
    let posts = PostRepository::new(ctx.pool()).get_feed(user_id).await?;

    Ok(HttpResponse::Ok().json(posts))
}

pub async fn get_post(ctx: RequestContext) -> ApiResult<HttpResponse> {
    let post_id = ctx.path_id("postID")?;
    let post = load_post(&PostRepository::new(ctx.pool()), post_id).await?;

    Ok(HttpResponse::Ok().json(post))
}

pub async fn get_user_posts(ctx: RequestContext) -> ApiResult<HttpResponse> {
    let user_id = ctx.path_id("userID")?;
    let posts = PostRepository::new(ctx.pool()).get_by_author(user_id).await?;

    Ok(HttpResponse::Ok().json(posts))
}

pub async fn update_post(ctx: RequestContext) -> ApiResult<HttpResponse> {
    let repo = PostRepository::new(ctx.pool());
    let post_id = load_own_post(&ctx, &repo).await?;

    let body: PostChanges = ctx.json()?;
    let changes = prepare_post(&body)?;
    repo.update(post_id, &changes).await?;

    Ok(HttpResponse::NoContent().finish())
}

pub async fn delete_post(ctx: RequestContext) -> ApiResult<HttpResponse> {
    let repo = PostRepository::new(ctx.pool());
    let post_id = load_own_post(&ctx, &repo).await?;

    repo.delete(post_id).await?;
    info!(post_id, "post deleted");

    Ok(HttpResponse::NoContent().finish())
}

pub async fn like_post(ctx: RequestContext) -> ApiResult<HttpResponse> {
    let post_id = ctx.path_id("postID")?;
    PostRepository::new(ctx.pool()).like(post_id).await?;

    Ok(HttpResponse::NoContent().finish())
}

pub async fn dislike_post(ctx: RequestContext) -> ApiResult<HttpResponse> {
    let post_id = ctx.path_id("postID")?;
    PostRepository::new(ctx.pool()).dislike(post_id).await?;

    Ok(HttpResponse::NoContent().finish())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn body(title: &str, content: &str) -> PostChanges {
        PostChanges {
            title: title.to_string(),
            content: content.to_string(),
        }
    }

    #[test]
    fn test_prepare_post_requires_title_and_content() {
        assert!(prepare_post(&body("  ", "text")).is_err());
        assert!(prepare_post(&body("title", "")).is_err());
        assert!(prepare_post(&body("title", &"a".repeat(MAX_POST_LENGTH + 1))).is_err());
    }

    #[test]
    fn test_prepare_post_strips_scripts() {
        let post = prepare_post(&body(" Hello ", "World<script>alert(1)</script>")).unwrap();
        assert_eq!(post.title, "Hello");
        assert_eq!(post.content, "World");
    }

    #[test]
    fn test_prepare_post_rejects_markup_only_fields() {
        assert!(prepare_post(&body("<script>x</script>", "text")).is_err());
        assert!(prepare_post(&body("title", "<style>y</style>")).is_err());
    }

    #[test]
    fn test_prepare_post_measures_escaped_length() {
        // each '&' is stored as "&amp;"
        let content = "&".repeat(MAX_POST_LENGTH / 2);
        assert!(prepare_post(&body("title", &content)).is_err());
    }
}
