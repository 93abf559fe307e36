//! Route definitions for the SkillSwap API

use axum::{
    routing::{delete, get, post, put},
    Router,
};

use crate::app_state::AppState;
use crate::handlers::*;

// Auth routes
pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/api/auth/signup", post(signup))
        .route("/api/auth/login", post(login))
        .route("/api/auth/logout", post(logout))
        .route("/api/auth/check-auth", get(check_auth))
}

// User routes
pub fn user_routes() -> Router<AppState> {
    Router::new()
        .route("/api/users", get(list_users))
        .route("/api/users/me", get(get_me).put(update_me))
        .route("/api/users/matches", get(get_matches))
        .route("/api/users/profile/:user_id", get(get_profile))
}

// Swap routes
pub fn swap_routes() -> Router<AppState> {
    Router::new()
        .route("/api/swaps", post(create_swap).get(list_swaps))
        .route("/api/swaps/:swap_id", get(get_swap))
        .route("/api/swaps/:swap_id/accept", put(accept_swap))
        .route("/api/swaps/:swap_id/reject", put(reject_swap))
        .route("/api/swaps/:swap_id/cancel", delete(cancel_swap))
        .route("/api/swaps/:swap_id/complete", put(complete_swap))
}
