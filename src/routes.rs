//! Static route table and the single dispatcher that serves it.
//!
//! Every endpoint is one [`Route`] record. [`configure`] registers the
//! whole table with actix-web; authentication is enforced by
//! [`dispatch`] from the record's flag, before the handler runs.

use std::future::Future;
use std::pin::Pin;

use actix_web::http::Method;
use actix_web::{web, HttpRequest, HttpResponse};
use serde::de::DeserializeOwned;
use sqlx::SqlitePool;

use crate::core::errors::{ApiError, ApiResult};
use crate::{auth, follow, posts, users, AppState};

pub type HandlerFuture = Pin<Box<dyn Future<Output = ApiResult<HttpResponse>>>>;
pub type Handler = fn(RequestContext) -> HandlerFuture;

#[derive(Clone)]
pub struct Route {
    pub uri: &'static str,
    pub method: Method,
    pub handler: Handler,
    pub requires_auth: bool,
}

/// Everything a handler gets: the raw request, its body, shared state,
/// and the caller's id when the route is authenticated.
pub struct RequestContext {
    pub req: HttpRequest,
    pub body: web::Bytes,
    pub state: web::Data<AppState>,
    pub user_id: Option<i64>,
}

impl RequestContext {
    pub fn pool(&self) -> SqlitePool {
        self.state.pool.clone()
    }

    /// Numeric path parameter such as `{userID}`.
    pub fn path_id(&self, name: &str) -> ApiResult<i64> {
        self.req
            .match_info()
            .get(name)
            .and_then(|v| v.parse::<i64>().ok())
            .ok_or_else(|| ApiError::BadRequest(format!("{} must be a number", name)))
    }

    pub fn json<T: DeserializeOwned>(&self) -> ApiResult<T> {
        serde_json::from_slice(&self.body)
            .map_err(|e| ApiError::BadRequest(format!("Invalid request body: {}", e)))
    }

    pub fn current_user(&self) -> ApiResult<i64> {
        self.user_id.ok_or(ApiError::Unauthorized)
    }
}

pub fn login_routes() -> Vec<Route> {
    vec![
        Route {
            uri: "/login",
            method: Method::POST,
            handler: |ctx| Box::pin(auth::login(ctx)) as HandlerFuture,
            requires_auth: false,
        },
        Route {
            uri: "/logout",
            method: Method::POST,
            handler: |ctx| Box::pin(auth::logout(ctx)) as HandlerFuture,
            requires_auth: true,
        },
    ]
}

pub fn users_routes() -> Vec<Route> {
    vec![
        Route {
            uri: "/users",
            method: Method::POST,
            handler: |ctx| Box::pin(users::create_user(ctx)) as HandlerFuture,
            requires_auth: false,
        },
        Route {
            uri: "/users",
            method: Method::GET,
            handler: |ctx| Box::pin(users::search_users(ctx)) as HandlerFuture,
            requires_auth: true,
        },
        Route {
            uri: "/users/{userID}",
            method: Method::GET,
            handler: |ctx| Box::pin(users::get_user(ctx)) as HandlerFuture,
            requires_auth: true,
        },
        Route {
            uri: "/users/{userID}",
            method: Method::PUT,
            handler: |ctx| Box::pin(users::update_user(ctx)) as HandlerFuture,
            requires_auth: true,
        },
        Route {
            uri: "/users/{userID}",
            method: Method::DELETE,
            handler: |ctx| Box::pin(users::delete_user(ctx)) as HandlerFuture,
            requires_auth: true,
        },
        Route {
            uri: "/users/{userID}/follow",
            method: Method::POST,
            handler: |ctx| Box::pin(follow::follow_user(ctx)) as HandlerFuture,
            requires_auth: true,
        },
        Route {
            uri: "/users/{userID}/unfollow",
            method: Method::DELETE,
            handler: |ctx| Box::pin(follow::unfollow_user(ctx)) as HandlerFuture,
            requires_auth: true,
        },
        Route {
            uri: "/users/{userID}/followers",
            method: Method::GET,
            handler: |ctx| Box::pin(follow::get_followers(ctx)) as HandlerFuture,
            requires_auth: true,
        },
        Route {
            uri: "/users/{userID}/following",
            method: Method::GET,
            handler: |ctx| Box::pin(follow::get_following(ctx)) as HandlerFuture,
            requires_auth: true,
        },
        Route {
            uri: "/users/{userID}/update-password",
            method: Method::POST,
            handler: |ctx| Box::pin(users::update_password(ctx)) as HandlerFuture,
            requires_auth: true,
        },
        Route {
            uri: "/users/{userID}/posts",
            method: Method::GET,
            handler: |ctx| Box::pin(posts::get_user_posts(ctx)) as HandlerFuture,
            requires_auth: true,
        },
    ]
}

pub fn posts_routes() -> Vec<Route> {
    vec![
        Route {
            uri: "/posts",
            method: Method::POST,
            handler: |ctx| Box::pin(posts::create_post(ctx)) as HandlerFuture,
            requires_auth: true,
        },
        Route {
            uri: "/posts",
            method: Method::GET,
            handler: |ctx| Box::pin(posts::get_feed(ctx)) as HandlerFuture,
            requires_auth: true,
        },
        Route {
            uri: "/posts/{postID}",
            method: Method::GET,
            handler: |ctx| Box::pin(posts::get_post(ctx)) as HandlerFuture,
            requires_auth: true,
        },
        Route {
            uri: "/posts/{postID}",
            method: Method::PUT,
            handler: |ctx| Box::pin(posts::update_post(ctx)) as HandlerFuture,
            requires_auth: true,
        },
        Route {
            uri: "/posts/{postID}",
            method: Method::DELETE,
            handler: |ctx| Box::pin(posts::delete_post(ctx)) as HandlerFuture,
            requires_auth: true,
        },
        Route {
            uri: "/posts/{postID}/like",
            method: Method::POST,
            handler: |ctx| Box::pin(posts::like_post(ctx)) as HandlerFuture,
            requires_auth: true,
        },
        Route {
            uri: "/posts/{postID}/dislike",
            method: Method::POST,
            handler: |ctx| Box::pin(posts::dislike_post(ctx)) as HandlerFuture,
            requires_auth: true,
        },
    ]
}

pub fn all_routes() -> Vec<Route> {
    let mut routes = login_routes();
    routes.extend(users_routes());
    routes.extend(posts_routes());
    routes
}

/// Register every route of the table.
pub fn configure(cfg: &mut web::ServiceConfig) {
    for route in all_routes() {
        let uri = route.uri;
        let method = route.method.clone();
        cfg.route(
            uri,
            web::method(method).to(
                move |req: HttpRequest, body: web::Bytes, state: web::Data<AppState>| {
                    dispatch(route.clone(), req, body, state)
                },
            ),
        );
    }
}

async fn dispatch(
    route: Route,
    req: HttpRequest,
    body: web::Bytes,
    state: web::Data<AppState>,
) -> ApiResult<HttpResponse> {
    let user_id = if route.requires_auth {
        Some(auth::authenticate(&req, &state).await?)
    } else {
        None
    };

    let ctx = RequestContext {
        req,
        body,
        state,
        user_id,
    };
    (route.handler)(ctx).await
}

pub async fn not_found() -> HttpResponse {
    HttpResponse::NotFound().json(serde_json::json!({"error": "No route found"}))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_each_route_declared_once() {
        let routes = all_routes();
        let mut seen = HashSet::new();
        for route in &routes {
            assert!(
                seen.insert((route.method.clone(), route.uri)),
                "duplicate route {} {}",
                route.method,
                route.uri
            );
        }
        assert_eq!(routes.len(), 20);
    }

    #[test]
    fn test_only_signup_and_login_are_public() {
        let public: Vec<(String, &str)> = all_routes()
            .into_iter()
            .filter(|r| !r.requires_auth)
            .map(|r| (r.method.to_string(), r.uri))
            .collect();

        assert_eq!(
            public,
            vec![
                ("POST".to_string(), "/login"),
                ("POST".to_string(), "/users"),
            ]
        );
    }

    #[test]
    fn test_user_routes_match_declared_surface() {
        let declared: Vec<(String, &str)> = users_routes()
            .into_iter()
            .map(|r| (r.method.to_string(), r.uri))
            .collect();

        let expected = [
            ("POST", "/users"),
            ("GET", "/users"),
            ("GET", "/users/{userID}"),
            ("PUT", "/users/{userID}"),
            ("DELETE", "/users/{userID}"),
            ("POST", "/users/{userID}/follow"),
            ("DELETE", "/users/{userID}/unfollow"),
            ("GET", "/users/{userID}/followers"),
            ("GET", "/users/{userID}/following"),
            ("POST", "/users/{userID}/update-password"),
            ("GET", "/users/{userID}/posts"),
        ];
        let expected: Vec<(String, &str)> =
            expected.iter().map(|(m, u)| (m.to_string(), *u)).collect();
        assert_eq!(declared, expected);
    }
}
