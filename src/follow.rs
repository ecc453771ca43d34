use actix_web::HttpResponse;
use tracing::info;

use crate::core::errors::{ApiError, ApiResult};
use crate::repositories::{FollowerRepository, UserRepository};
use crate::routes::RequestContext;

/// Path target and caller for follow/unfollow, rejecting self-targets.
fn follow_pair(ctx: &RequestContext) -> ApiResult<(i64, i64)> {
    let target_id = ctx.path_id("userID")?;
    let follower_id = ctx.current_user()?;

    if target_id == follower_id {
        return Err(ApiError::Forbidden("Cannot follow yourself".to_string()));
    }
    Ok((target_id, follower_id))
}

pub async fn follow_user(ctx: RequestContext) -> ApiResult<HttpResponse> {
    let (target_id, follower_id) = follow_pair(&ctx)?;

    if UserRepository::new(ctx.pool()).get_by_id(target_id).await?.is_none() {
        return Err(ApiError::NotFound("Target user not found".to_string()));
    }

    FollowerRepository::new(ctx.pool())
        .follow(target_id, follower_id)
        .await?;
    info!(user_id = target_id, follower_id, "followed");

    Ok(HttpResponse::NoContent().finish())
}

pub async fn unfollow_user(ctx: RequestContext) -> ApiResult<HttpResponse> {
    let (target_id, follower_id) = follow_pair(&ctx)?;

    FollowerRepository::new(ctx.pool())
        .unfollow(target_id, follower_id)
        .await?;
    info!(user_id = target_id, follower_id, "unfollowed");

    Ok(HttpResponse::NoContent().finish())
}

pub async fn get_followers(ctx: RequestContext) -> ApiResult<HttpResponse> {
    let user_id = ctx.path_id("userID")?;
    let followers = FollowerRepository::new(ctx.pool()).followers(user_id).await?;

    Ok(HttpResponse::Ok().json(followers))
}

pub async fn get_following(ctx: RequestContext) -> ApiResult<HttpResponse> {
    let user_id = ctx.path_id("userID")?;
    let following = FollowerRepository::new(ctx.pool()).following(user_id).await?;

    Ok(HttpResponse::Ok().json(following))
}
