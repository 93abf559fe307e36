//! Signup, login, logout, and session check

use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    Json,
};
use axum_extra::extract::cookie::CookieJar;

use super::MessageResponse;
use crate::app_state::AppState;
use crate::error::ApiResult;
use crate::middleware::auth::{cleared_session_cookie, session_cookie, AuthenticatedUser};
use crate::models::{LoginRequest, PublicUser, SignupRequest};

/// Create an account and start a session
pub async fn signup(
    State(app_state): State<AppState>,
    jar: CookieJar,
    payload: Result<Json<SignupRequest>, JsonRejection>,
) -> ApiResult<(StatusCode, CookieJar, Json<PublicUser>)> {
    let Json(request) = payload?;
    let (user, token) = app_state.auth_service.signup(request).await?;
    let jar = jar.add(session_cookie(token, &app_state.cookies));
    Ok((StatusCode::CREATED, jar, Json(user.into())))
}

/// Start a session for existing credentials
pub async fn login(
    State(app_state): State<AppState>,
    jar: CookieJar,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> ApiResult<(CookieJar, Json<PublicUser>)> {
    let Json(request) = payload?;
    let (user, token) = app_state.auth_service.login(request).await?;
    let jar = jar.add(session_cookie(token, &app_state.cookies));
    Ok((jar, Json(user.into())))
}

/// End the session. Always answers with an expiring cookie, even without one.
pub async fn logout(jar: CookieJar) -> (CookieJar, Json<MessageResponse>) {
    (
        jar.add(cleared_session_cookie()),
        Json(MessageResponse::new("Logout successful")),
    )
}

/// Current session's user
pub async fn check_auth(session: AuthenticatedUser) -> Json<PublicUser> {
    Json(session.user)
}
