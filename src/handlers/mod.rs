//! API handlers for the SkillSwap backend

use serde::{Deserialize, Serialize};

use crate::models::{PublicUser, SwapDetails};

pub mod auth;
pub mod swap;
pub mod user;

pub use auth::{check_auth, login, logout, signup};
pub use swap::{
    accept_swap, cancel_swap, complete_swap, create_swap, get_swap, list_swaps, reject_swap,
};
pub use user::{get_matches, get_me, get_profile, list_users, update_me};

/// Re-export for handler signatures
pub use crate::middleware::AuthenticatedUser;

/// Plain `{ message }` body
#[derive(Debug, Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct UserResponse {
    pub user: PublicUser,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct UsersResponse {
    pub users: Vec<PublicUser>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct UserUpdateResponse {
    pub message: String,
    pub user: PublicUser,
}

/// Result of a swap mutation
#[derive(Debug, Serialize, Deserialize)]
pub struct SwapResponse {
    pub message: String,
    pub swap: SwapDetails,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SwapDetailResponse {
    pub swap: SwapDetails,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SwapListResponse {
    pub success: bool,
    pub swaps: Vec<SwapDetails>,
}
