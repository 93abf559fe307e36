//! User directory and profile handlers

use std::sync::Arc;

use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection, QueryRejection},
        Path, Query, State,
    },
    Json,
};
use uuid::Uuid;

use super::{UserResponse, UserUpdateResponse, UsersResponse};
use crate::error::ApiResult;
use crate::matching::MatchBuckets;
use crate::middleware::AuthenticatedUser;
use crate::models::DirectoryFilter;
use crate::users::{UpdateProfileRequest, UserService};

/// Browse public users, optionally filtered by name, skill, or location
pub async fn list_users(
    State(users): State<Arc<UserService>>,
    session: AuthenticatedUser,
    query: Result<Query<DirectoryFilter>, QueryRejection>,
) -> ApiResult<Json<UsersResponse>> {
    let Query(filter) = query?;
    let users = users.browse(session.id, filter).await?;
    Ok(Json(UsersResponse { users }))
}

pub async fn get_me(session: AuthenticatedUser) -> Json<UserResponse> {
    Json(UserResponse { user: session.user })
}

pub async fn update_me(
    State(users): State<Arc<UserService>>,
    session: AuthenticatedUser,
    payload: Result<Json<UpdateProfileRequest>, JsonRejection>,
) -> ApiResult<Json<UserUpdateResponse>> {
    let Json(request) = payload?;
    let user = users.update_profile(session.id, request).await?;
    Ok(Json(UserUpdateResponse {
        message: "Profile updated successfully".to_string(),
        user,
    }))
}

pub async fn get_profile(
    State(users): State<Arc<UserService>>,
    session: AuthenticatedUser,
    path: Result<Path<Uuid>, PathRejection>,
) -> ApiResult<Json<UserResponse>> {
    let Path(user_id) = path?;
    let user = users.profile(session.id, user_id).await?;
    Ok(Json(UserResponse { user }))
}

/// Skill matches for the current user
pub async fn get_matches(
    State(users): State<Arc<UserService>>,
    session: AuthenticatedUser,
) -> ApiResult<Json<MatchBuckets>> {
    Ok(Json(users.matches(session.id).await?))
}
