//! Session guard
//!
//! Handlers that take [`AuthenticatedUser`] only run for requests carrying a
//! valid `jwt` session cookie whose user still exists.

use axum::{async_trait, extract::FromRequestParts, http::request::Parts};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use uuid::Uuid;

use crate::app_state::{AppState, CookieSettings};
use crate::error::ApiError;
use crate::models::PublicUser;
use crate::users::UserError;

/// Name of the cookie carrying the session token
pub const SESSION_COOKIE: &str = "jwt";

/// The user behind the current request's session
#[derive(Debug, Clone)]
pub struct AuthenticatedUser {
    pub id: Uuid,
    pub user: PublicUser,
}

#[async_trait]
impl FromRequestParts<AppState> for AuthenticatedUser {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let jar = CookieJar::from_headers(&parts.headers);
        let token = jar
            .get(SESSION_COOKIE)
            .map(|cookie| cookie.value().to_string())
            .filter(|token| !token.is_empty())
            .ok_or_else(|| {
                tracing::debug!(path = %parts.uri.path(), "request without session cookie");
                ApiError::Unauthenticated("Unauthorized: No token provided".to_string())
            })?;

        let id = state.auth_service.verify_token(&token).map_err(|_| {
            tracing::debug!(path = %parts.uri.path(), "rejected session token");
            ApiError::Unauthenticated("Unauthorized: Invalid token".to_string())
        })?;

        let user = state.user_service.me(id).await.map_err(|e| match e {
            UserError::NotFound => ApiError::NotFound("User not found".to_string()),
            other => other.into(),
        })?;

        Ok(Self { id, user })
    }
}

/// Cookie carrying a freshly issued session token
pub fn session_cookie(token: String, settings: &CookieSettings) -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE, token))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Strict)
        .secure(settings.secure)
        .max_age(time::Duration::days(settings.max_age_days))
        .build()
}

/// Cookie that clears the session on the client
pub fn cleared_session_cookie() -> Cookie<'static> {
    let mut cookie = Cookie::build((SESSION_COOKIE, ""))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Strict)
        .build();
    cookie.make_removal();
    cookie
}
