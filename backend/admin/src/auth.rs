//! Admin guard for the back-office routes.
//!
//! Authentication happens upstream: the proxy in front of the service puts
//! the signed-in user's id in the [`USER_ID_HEADER`] header. This layer
//! resolves that id against the `users` table and lets the request through
//! only when the user holds [`Role::Admin`]. Everyone else is redirected to
//! the configured login path.

use std::sync::Arc;

use axum::{
    extract::{Request, State},
    http::HeaderMap,
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use raffle_rules::{has_role, Role};
use sqlx::SqlitePool;
use tracing::debug;

use crate::api::ApiState;
use crate::errors::{AdminError, Result};
use crate::models::User;
use crate::repo::users;

pub const USER_ID_HEADER: &str = "x-user-id";

/// The user named by the request headers, if any.
pub async fn current_user(pool: &SqlitePool, headers: &HeaderMap) -> Result<Option<User>> {
    let Some(id) = headers
        .get(USER_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.trim().parse::<i64>().ok())
    else {
        return Ok(None);
    };

    match users::get_user(pool, id).await {
        Ok(user) => Ok(Some(user)),
        Err(AdminError::NotFound(_)) => Ok(None),
        Err(e) => Err(e),
    }
}

pub async fn require_admin(
    State(state): State<Arc<ApiState>>,
    request: Request,
    next: Next,
) -> Response {
    match current_user(&state.pool, request.headers()).await {
        Ok(Some(user)) if has_role(&user, Role::Admin) => next.run(request).await,
        Ok(user) => {
            debug!(
                path = %request.uri().path(),
                user_id = user.map(|u| u.id),
                "admin route refused"
            );
            Redirect::to(&state.config.login_path).into_response()
        }
        Err(e) => e.into_response(),
    }
}
