use actix_web::{web, HttpResponse};
use serde::Deserialize;
use tracing::info;

use crate::config::*;
use crate::core::errors::{ApiError, ApiResult, StorageError};
use crate::core::helpers::{hash_password, sanitize_text, validate_email, verify_password};
use crate::models::models::{NewUser, PasswordChange, UserChanges};
use crate::repositories::{SessionRepository, UserRepository};
use crate::routes::RequestContext;

#[derive(Deserialize)]
struct UserSearch {
    #[serde(default)]
    user: String,
}

/// Trims, sanitizes and validates the profile fields shared by signup
/// and profile edits.
fn prepare_profile(name: &str, username: &str, email: &str) -> ApiResult<UserChanges> {
    let name = sanitize_text(name.trim());
    let username = username.trim().to_string();
    let email = email.trim().to_string();

    if name.is_empty() {
        return Err(ApiError::BadRequest("Name is required".to_string()));
    }
    if username.is_empty() {
        return Err(ApiError::BadRequest("Username is required".to_string()));
    }
    // stored verbatim and matched verbatim at login
    if sanitize_text(&username) != username {
        return Err(ApiError::BadRequest(
            "Username contains invalid characters".to_string(),
        ));
    }
    if username.len() < MIN_USERNAME_LENGTH || username.len() > MAX_USERNAME_LENGTH {
        return Err(ApiError::BadRequest("Username must be 3-50 characters".to_string()));
    }
    if email.is_empty() {
        return Err(ApiError::BadRequest("Email is required".to_string()));
    }
    if !validate_email(&email) {
        return Err(ApiError::BadRequest("Invalid email".to_string()));
    }

    Ok(UserChanges {
        name,
        username,
        email,
    })
}

fn conflict_or_storage(err: StorageError) -> ApiError {
    if err.is_unique_violation() {
        ApiError::Conflict("Username or email already in use".to_string())
    } else {
        err.into()
    }
}

/// Only the account owner may modify it.
fn require_self(ctx: &RequestContext, user_id: i64) -> ApiResult<()> {
    if ctx.current_user()? != user_id {
        return Err(ApiError::Forbidden(
            "Cannot modify a user other than yourself".to_string(),
        ));
    }
    Ok(())
}

pub async fn create_user(ctx: RequestContext) -> ApiResult<HttpResponse> {
    let new_user: NewUser = ctx.json()?;
    let profile = prepare_profile(&new_user.name, &new_user.username, &new_user.email)?;

    if new_user.password.is_empty() {
        return Err(ApiError::BadRequest("Password is required".to_string()));
    }
    if new_user.password.len() < MIN_PASSWORD_LENGTH {
        return Err(ApiError::BadRequest(
            "Password must be at least 3 characters".to_string(),
        ));
    }

    let repo = UserRepository::new(ctx.pool());
    let id = repo
        .create(&NewUser {
            name: profile.name,
            username: profile.username,
            email: profile.email,
            password: hash_password(&new_user.password)?,
        })
        .await
        .map_err(conflict_or_storage)?;

    let user = repo
        .get_by_id(id)
        .await?
        .ok_or_else(|| ApiError::InternalError("created user vanished".to_string()))?;
    info!(user_id = id, username = user.username.as_str(), "user created");

    Ok(HttpResponse::Created().json(user))
}

pub async fn search_users(ctx: RequestContext) -> ApiResult<HttpResponse> {
    let search = web::Query::<UserSearch>::from_query(ctx.req.query_string())
        .map_err(|e| ApiError::BadRequest(e.to_string()))?;

    let users = UserRepository::new(ctx.pool())
        .search(search.user.trim())
        .await?;

    Ok(HttpResponse::Ok().json(users))
}

pub async fn get_user(ctx: RequestContext) -> ApiResult<HttpResponse> {
    let user_id = ctx.path_id("userID")?;

    match UserRepository::new(ctx.pool()).get_by_id(user_id).await? {
        Some(user) => Ok(HttpResponse::Ok().json(user)),
        None => Err(ApiError::NotFound("User not found".to_string())),
    }
}

pub async fn update_user(ctx: RequestContext) -> ApiResult<HttpResponse> {
    let user_id = ctx.path_id("userID")?;
    require_self(&ctx, user_id)?;

    let body: UserChanges = ctx.json()?;
    let changes = prepare_profile(&body.name, &body.username, &body.email)?;

    UserRepository::new(ctx.pool())
        .update(user_id, &changes)
        .await
        .map_err(conflict_or_storage)?;

    Ok(HttpResponse::NoContent().finish())
}

pub async fn delete_user(ctx: RequestContext) -> ApiResult<HttpResponse> {
    let user_id = ctx.path_id("userID")?;
    require_self(&ctx, user_id)?;

    UserRepository::new(ctx.pool()).delete(user_id).await?;
    info!(user_id, "user deleted");

    Ok(HttpResponse::NoContent().finish())
}

/// Verifies the current password, stores the new hash, and rotates the
/// caller's sessions. The response carries the only valid token left.
pub async fn update_password(ctx: RequestContext) -> ApiResult<HttpResponse> {
    let user_id = ctx.path_id("userID")?;
    require_self(&ctx, user_id)?;

    let change: PasswordChange = ctx.json()?;
    if change.new.len() < MIN_PASSWORD_LENGTH {
        return Err(ApiError::BadRequest(
            "Password must be at least 3 characters".to_string(),
        ));
    }

    let repo = UserRepository::new(ctx.pool());
    let stored = repo
        .get_password_hash(user_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;

    if !verify_password(&change.current, &stored) {
        return Err(ApiError::Unauthorized);
    }

    repo.update_password(user_id, &hash_password(&change.new)?)
        .await?;

    let sessions = SessionRepository::new(ctx.pool());
    sessions.revoke_all(user_id).await?;
    let token = sessions.issue(user_id).await?;
    info!(user_id, "password changed, sessions rotated");

    Ok(HttpResponse::Ok().json(serde_json::json!({ "token": token })))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prepare_profile_trims_and_sanitizes() {
        let profile =
            prepare_profile("  <b>Alice</b> ", " alice ", " alice@example.com ").unwrap();
        assert_eq!(profile.name, "Alice");
        assert_eq!(profile.username, "alice");
        assert_eq!(profile.email, "alice@example.com");
    }

    #[test]
    fn test_prepare_profile_rejects_bad_input() {
        assert!(matches!(
            prepare_profile("", "alice", "alice@example.com"),
            Err(ApiError::BadRequest(_))
        ));
        assert!(matches!(
            prepare_profile("Alice", "al", "alice@example.com"),
            Err(ApiError::BadRequest(_))
        ));
        assert!(matches!(
            prepare_profile("Alice", "alice", "not-an-email"),
            Err(ApiError::BadRequest(_))
        ));
    }

    #[test]
    fn test_prepare_profile_rejects_markup_in_username() {
        for username in ["tom&jerry", "<b>bob</b>", "a<b"] {
            assert!(
                matches!(
                    prepare_profile("Tom", username, "tom@example.com"),
                    Err(ApiError::BadRequest(_))
                ),
                "accepted {}",
                username
            );
        }
    }
}
