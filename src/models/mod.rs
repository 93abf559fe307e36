//! Data models for the SkillSwap backend

use serde::{Deserialize, Serialize};
use sqlx::types::chrono::{DateTime, Utc};
use uuid::Uuid;
use validator::Validate;

pub mod auth;
pub use auth::*;

/// Stored user record, including the password hash.
///
/// Never serialized directly; convert into [`PublicUser`] before it leaves
/// the server.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct User {
    pub id: Uuid,
    pub full_name: String,
    pub email: String,
    pub password_hash: String,
    pub profile_pic: Option<String>,
    pub location: Option<String>,
    pub bio: String,
    pub skills_offered: Vec<String>,
    pub skills_wanted: Vec<String>,
    pub availability: Availability,
    pub is_public: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// User as returned by the API
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PublicUser {
    #[serde(rename = "_id")]
    pub id: Uuid,
    pub full_name: String,
    pub email: String,
    pub profile_pic: Option<String>,
    pub location: Option<String>,
    pub bio: String,
    pub skills_offered: Vec<String>,
    pub skills_wanted: Vec<String>,
    pub availability: Availability,
    pub is_public: bool,
    pub created_at: DateTime<Utc>,
}

impl From<User> for PublicUser {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            full_name: user.full_name,
            email: user.email,
            profile_pic: user.profile_pic,
            location: user.location,
            bio: user.bio,
            skills_offered: user.skills_offered,
            skills_wanted: user.skills_wanted,
            availability: user.availability,
            is_public: user.is_public,
            created_at: user.created_at,
        }
    }
}

/// When a user is available for sessions
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(type_name = "availability", rename_all = "lowercase")]
pub enum Availability {
    Weekdays,
    Weekends,
    Anytime,
    #[default]
    #[serde(rename = "not available")]
    #[sqlx(rename = "not available")]
    NotAvailable,
}

/// Fields needed to insert a new user
#[derive(Debug, Clone)]
pub struct NewUser {
    pub full_name: String,
    pub email: String,
    pub password_hash: String,
}

/// Owner-editable profile fields. `None` leaves the stored value untouched.
///
/// `location` and `profile_pic` are doubly optional: `Some(None)` clears them.
#[derive(Debug, Clone, Default)]
pub struct ProfileUpdate {
    pub bio: Option<String>,
    pub location: Option<Option<String>>,
    pub profile_pic: Option<Option<String>>,
    pub skills_offered: Option<Vec<String>>,
    pub skills_wanted: Option<Vec<String>>,
    pub availability: Option<Availability>,
    pub is_public: Option<bool>,
}

/// Directory query. Text filters are case-insensitive substring matches.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DirectoryFilter {
    /// Matched against the full name
    pub search: Option<String>,
    /// Matched against any offered skill
    pub skill: Option<String>,
    pub location: Option<String>,
    #[serde(skip)]
    pub exclude: Option<Uuid>,
}

/// Swap lifecycle status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(type_name = "swap_status", rename_all = "lowercase")]
pub enum SwapStatus {
    Pending,
    Accepted,
    Rejected,
    Completed,
}

impl SwapStatus {
    /// Whether a swap in this status may move to `next`.
    ///
    /// Cancellation is a deletion, not a status, so it does not appear here.
    pub fn can_transition_to(self, next: SwapStatus) -> bool {
        matches!(
            (self, next),
            (SwapStatus::Pending, SwapStatus::Accepted)
                | (SwapStatus::Pending, SwapStatus::Rejected)
                | (SwapStatus::Accepted, SwapStatus::Completed)
        )
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, SwapStatus::Rejected | SwapStatus::Completed)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            SwapStatus::Pending => "pending",
            SwapStatus::Accepted => "accepted",
            SwapStatus::Rejected => "rejected",
            SwapStatus::Completed => "completed",
        }
    }
}

impl std::fmt::Display for SwapStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Stored swap record
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Swap {
    #[serde(rename = "_id")]
    pub id: Uuid,
    #[serde(rename = "requester")]
    pub requester_id: Uuid,
    #[serde(rename = "recipient")]
    pub recipient_id: Uuid,
    pub requester_skill: String,
    pub recipient_skill: String,
    pub status: SwapStatus,
    pub message: Option<String>,
    pub scheduled_date: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Swap {
    pub fn is_participant(&self, user_id: Uuid) -> bool {
        self.requester_id == user_id || self.recipient_id == user_id
    }
}

/// Fields needed to insert a new swap
#[derive(Debug, Clone)]
pub struct NewSwap {
    pub requester_id: Uuid,
    pub recipient_id: Uuid,
    pub requester_skill: String,
    pub recipient_skill: String,
    pub message: Option<String>,
}

/// Participant identity embedded in swap responses
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Participant {
    #[serde(rename = "_id")]
    pub id: Uuid,
    pub full_name: String,
    pub email: String,
    pub profile_pic: Option<String>,
    pub skills_offered: Vec<String>,
}

impl From<&User> for Participant {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            full_name: user.full_name.clone(),
            email: user.email.clone(),
            profile_pic: user.profile_pic.clone(),
            skills_offered: user.skills_offered.clone(),
        }
    }
}

/// Swap with both participants resolved
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SwapDetails {
    #[serde(rename = "_id")]
    pub id: Uuid,
    pub requester: Participant,
    pub recipient: Participant,
    pub requester_skill: String,
    pub recipient_skill: String,
    pub status: SwapStatus,
    pub message: Option<String>,
    pub scheduled_date: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Which side of a swap the listing is for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SwapDirection {
    Sent,
    Received,
    #[default]
    All,
}

impl SwapDirection {
    /// Parse the `type` query parameter; anything unrecognised lists both sides.
    pub fn from_query(value: Option<&str>) -> Self {
        match value {
            Some("sent") => SwapDirection::Sent,
            Some("received") => SwapDirection::Received,
            _ => SwapDirection::All,
        }
    }
}

/// Feedback left by one participant about the other after a swap.
///
/// Only the persisted shape exists; no endpoint creates feedback yet.
#[derive(Debug, Clone, Serialize, Deserialize, Validate, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Feedback {
    #[serde(rename = "_id")]
    pub id: Uuid,
    #[serde(rename = "swap")]
    pub swap_id: Uuid,
    #[serde(rename = "reviewer")]
    pub reviewer_id: Uuid,
    #[serde(rename = "reviewee")]
    pub reviewee_id: Uuid,
    #[validate(range(min = 1, max = 5, message = "rating must be between 1 and 5"))]
    pub rating: i16,
    #[validate(length(max = 500, message = "comment must be at most 500 characters"))]
    pub comment: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Trim skill names and drop blank entries, keeping order.
pub fn normalize_skills(skills: Vec<String>) -> Vec<String> {
    skills
        .into_iter()
        .map(|skill| skill.trim().to_string())
        .filter(|skill| !skill.is_empty())
        .collect()
}
