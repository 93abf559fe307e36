//! Persistence interfaces for users and swaps
//!
//! Two backends implement these traits: [`PostgresStore`] for deployments and
//! [`MemoryStore`] for tests and database-less local runs. Both enforce the
//! single-pending-swap rule and perform status transitions as conditional
//! updates, so callers never read-then-write a status.

use async_trait::async_trait;
use uuid::Uuid;

use crate::models::{
    DirectoryFilter, NewSwap, NewUser, ProfileUpdate, Swap, SwapDirection, SwapStatus, User,
};

pub mod memory;
pub mod postgres;

pub use memory::MemoryStore;
pub use postgres::PostgresStore;

/// Result type for store operations
pub type StoreResult<T> = Result<T, StoreError>;

/// Store-layer errors
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("record not found: {0}")]
    NotFound(String),

    #[error("conflict: {0}")]
    Conflict(String),

    /// A conditional transition found the record in a different status.
    #[error("status mismatch: expected {expected}, found {found}")]
    StatusMismatch {
        expected: SwapStatus,
        found: SwapStatus,
    },

    #[error("backend error: {0}")]
    Backend(String),
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        StoreError::Backend(err.to_string())
    }
}

/// User persistence
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Insert a user. Fails with `Conflict` if the email is taken.
    async fn insert_user(&self, user: NewUser) -> StoreResult<User>;

    async fn find_user(&self, id: Uuid) -> StoreResult<Option<User>>;

    async fn find_user_by_email(&self, email: &str) -> StoreResult<Option<User>>;

    /// Fetch several users at once; missing ids are skipped.
    async fn find_users(&self, ids: &[Uuid]) -> StoreResult<Vec<User>>;

    /// Public users matching the filter, newest first, minus `filter.exclude`.
    async fn list_public_users(&self, filter: &DirectoryFilter) -> StoreResult<Vec<User>>;

    /// Apply owner-editable fields. Returns `None` if the user does not exist.
    async fn update_profile(&self, id: Uuid, update: ProfileUpdate) -> StoreResult<Option<User>>;
}

/// Swap persistence
#[async_trait]
pub trait SwapStore: Send + Sync {
    /// Insert a pending swap. Fails with `Conflict` if the ordered pair
    /// already has a pending swap.
    async fn insert_swap(&self, swap: NewSwap) -> StoreResult<Swap>;

    async fn find_swap(&self, id: Uuid) -> StoreResult<Option<Swap>>;

    /// Swaps involving the user on the given side, newest first.
    async fn list_swaps(&self, user_id: Uuid, direction: SwapDirection) -> StoreResult<Vec<Swap>>;

    /// Set `status = to` only if the current status is `expected_from`.
    async fn transition_status(
        &self,
        id: Uuid,
        expected_from: SwapStatus,
        to: SwapStatus,
    ) -> StoreResult<Swap>;

    /// Delete the swap only if it is still pending.
    async fn delete_pending_swap(&self, id: Uuid) -> StoreResult<()>;
}

/// Case-insensitive substring test used by the in-memory directory filter.
pub(crate) fn contains_ignore_case(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(&needle.to_lowercase())
}
