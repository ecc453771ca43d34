use actix_web::{HttpRequest, HttpResponse};
use chrono::{Duration, Utc};
use tracing::{info, warn};

use crate::core::errors::{ApiError, ApiResult};
use crate::core::helpers::verify_password;
use crate::models::models::LoginRequest;
use crate::repositories::{SessionRepository, UserRepository};
use crate::routes::RequestContext;
use crate::AppState;

pub fn bearer_token(req: &HttpRequest) -> Option<&str> {
    req.headers()
        .get("Authorization")?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
}

/// Resolve the caller's user id from the bearer token, rejecting
/// unknown and expired sessions.
pub async fn authenticate(req: &HttpRequest, state: &AppState) -> ApiResult<i64> {
    let token = bearer_token(req).ok_or(ApiError::Unauthorized)?;

    let sessions = SessionRepository::new(state.pool.clone());
    let session = match sessions.lookup(token).await? {
        Some(s) => s,
        None => {
            warn!(path = req.path(), "rejected unknown token");
            return Err(ApiError::Unauthorized);
        }
    };

    let age = Utc::now().naive_utc() - session.created_at;
    if age > Duration::hours(state.token_expiration_hours) {
        warn!(user_id = session.user_id, "rejected expired token");
        sessions.revoke(token).await?;
        return Err(ApiError::Unauthorized);
    }

    Ok(session.user_id)
}

pub async fn login(ctx: RequestContext) -> ApiResult<HttpResponse> {
    let creds: LoginRequest = ctx.json()?;

    let users = UserRepository::new(ctx.pool());
    let account = match users.get_credentials(creds.username.trim()).await? {
        Some(c) if verify_password(&creds.password, &c.password) => c,
        _ => {
            warn!(username = creds.username.as_str(), "failed login");
            return Err(ApiError::Unauthorized);
        }
    };

    let token = SessionRepository::new(ctx.pool()).issue(account.id).await?;
    info!(user_id = account.id, "user logged in");

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "token": token,
        "user_id": account.id
    })))
}

pub async fn logout(ctx: RequestContext) -> ApiResult<HttpResponse> {
    let token = bearer_token(&ctx.req).ok_or(ApiError::Unauthorized)?;
    SessionRepository::new(ctx.pool()).revoke(token).await?;

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "message": "Logged out successfully"
    })))
}
