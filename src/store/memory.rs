//! In-memory store
//!
//! Deterministic and test-friendly. Every operation takes the relevant lock
//! once, so conditional transitions are atomic with respect to each other.

use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;
use chrono::Utc;
use uuid::Uuid;

use super::{contains_ignore_case, StoreError, StoreResult, SwapStore, UserStore};
use crate::models::{
    Availability, DirectoryFilter, NewSwap, NewUser, ProfileUpdate, Swap, SwapDirection,
    SwapStatus, User,
};

/// In-memory user and swap store
#[derive(Default)]
pub struct MemoryStore {
    users: RwLock<HashMap<Uuid, User>>,
    swaps: RwLock<HashMap<Uuid, Swap>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn poisoned(what: &str) -> StoreError {
    StoreError::Backend(format!("{what} lock poisoned"))
}

fn newest_first<T>(items: &mut [T], created_at: impl Fn(&T) -> chrono::DateTime<Utc>) {
    items.sort_by(|a, b| created_at(b).cmp(&created_at(a)));
}

#[async_trait]
impl UserStore for MemoryStore {
    async fn insert_user(&self, user: NewUser) -> StoreResult<User> {
        let mut guard = self.users.write().map_err(|_| poisoned("users"))?;

        if guard.values().any(|existing| existing.email == user.email) {
            return Err(StoreError::Conflict(format!(
                "email {} already registered",
                user.email
            )));
        }

        let now = Utc::now();
        let record = User {
            id: Uuid::new_v4(),
            full_name: user.full_name,
            email: user.email,
            password_hash: user.password_hash,
            profile_pic: None,
            location: None,
            bio: String::new(),
            skills_offered: Vec::new(),
            skills_wanted: Vec::new(),
            availability: Availability::default(),
            is_public: true,
            created_at: now,
            updated_at: now,
        };
        guard.insert(record.id, record.clone());
        Ok(record)
    }

    async fn find_user(&self, id: Uuid) -> StoreResult<Option<User>> {
        let guard = self.users.read().map_err(|_| poisoned("users"))?;
        Ok(guard.get(&id).cloned())
    }

    async fn find_user_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        let guard = self.users.read().map_err(|_| poisoned("users"))?;
        Ok(guard.values().find(|user| user.email == email).cloned())
    }

    async fn find_users(&self, ids: &[Uuid]) -> StoreResult<Vec<User>> {
        let guard = self.users.read().map_err(|_| poisoned("users"))?;
        Ok(ids.iter().filter_map(|id| guard.get(id).cloned()).collect())
    }

    async fn list_public_users(&self, filter: &DirectoryFilter) -> StoreResult<Vec<User>> {
        let guard = self.users.read().map_err(|_| poisoned("users"))?;
        let mut users: Vec<User> = guard
            .values()
            .filter(|user| user.is_public)
            .filter(|user| Some(user.id) != filter.exclude)
            .filter(|user| match filter.search.as_deref() {
                Some(search) => contains_ignore_case(&user.full_name, search),
                None => true,
            })
            .filter(|user| match filter.skill.as_deref() {
                Some(skill) => user
                    .skills_offered
                    .iter()
                    .any(|offered| contains_ignore_case(offered, skill)),
                None => true,
            })
            .filter(|user| match filter.location.as_deref() {
                Some(location) => user
                    .location
                    .as_deref()
                    .is_some_and(|own| contains_ignore_case(own, location)),
                None => true,
            })
            .cloned()
            .collect();
        newest_first(&mut users, |user| user.created_at);
        Ok(users)
    }

    async fn update_profile(&self, id: Uuid, update: ProfileUpdate) -> StoreResult<Option<User>> {
        let mut guard = self.users.write().map_err(|_| poisoned("users"))?;
        let Some(user) = guard.get_mut(&id) else {
            return Ok(None);
        };

        if let Some(bio) = update.bio {
            user.bio = bio;
        }
        if let Some(location) = update.location {
            user.location = location;
        }
        if let Some(profile_pic) = update.profile_pic {
            user.profile_pic = profile_pic;
        }
        if let Some(skills) = update.skills_offered {
            user.skills_offered = skills;
        }
        if let Some(skills) = update.skills_wanted {
            user.skills_wanted = skills;
        }
        if let Some(availability) = update.availability {
            user.availability = availability;
        }
        if let Some(is_public) = update.is_public {
            user.is_public = is_public;
        }
        user.updated_at = Utc::now();

        Ok(Some(user.clone()))
    }
}

#[async_trait]
impl SwapStore for MemoryStore {
    async fn insert_swap(&self, swap: NewSwap) -> StoreResult<Swap> {
        let mut guard = self.swaps.write().map_err(|_| poisoned("swaps"))?;

        let duplicate = guard.values().any(|existing| {
            existing.status == SwapStatus::Pending
                && existing.requester_id == swap.requester_id
                && existing.recipient_id == swap.recipient_id
        });
        if duplicate {
            return Err(StoreError::Conflict(format!(
                "pending swap from {} to {} already exists",
                swap.requester_id, swap.recipient_id
            )));
        }

        let now = Utc::now();
        let record = Swap {
            id: Uuid::new_v4(),
            requester_id: swap.requester_id,
            recipient_id: swap.recipient_id,
            requester_skill: swap.requester_skill,
            recipient_skill: swap.recipient_skill,
            status: SwapStatus::Pending,
            message: swap.message,
            scheduled_date: None,
            created_at: now,
            updated_at: now,
        };
        guard.insert(record.id, record.clone());
        Ok(record)
    }

    async fn find_swap(&self, id: Uuid) -> StoreResult<Option<Swap>> {
        let guard = self.swaps.read().map_err(|_| poisoned("swaps"))?;
        Ok(guard.get(&id).cloned())
    }

    async fn list_swaps(&self, user_id: Uuid, direction: SwapDirection) -> StoreResult<Vec<Swap>> {
        let guard = self.swaps.read().map_err(|_| poisoned("swaps"))?;
        let mut swaps: Vec<Swap> = guard
            .values()
            .filter(|swap| match direction {
                SwapDirection::Sent => swap.requester_id == user_id,
                SwapDirection::Received => swap.recipient_id == user_id,
                SwapDirection::All => swap.is_participant(user_id),
            })
            .cloned()
            .collect();
        newest_first(&mut swaps, |swap| swap.created_at);
        Ok(swaps)
    }

    async fn transition_status(
        &self,
        id: Uuid,
        expected_from: SwapStatus,
        to: SwapStatus,
    ) -> StoreResult<Swap> {
        let mut guard = self.swaps.write().map_err(|_| poisoned("swaps"))?;
        let swap = guard
            .get_mut(&id)
            .ok_or_else(|| StoreError::NotFound(format!("swap {id} not found")))?;

        if swap.status != expected_from {
            return Err(StoreError::StatusMismatch {
                expected: expected_from,
                found: swap.status,
            });
        }

        swap.status = to;
        swap.updated_at = Utc::now();
        Ok(swap.clone())
    }

    async fn delete_pending_swap(&self, id: Uuid) -> StoreResult<()> {
        let mut guard = self.swaps.write().map_err(|_| poisoned("swaps"))?;
        let status = guard
            .get(&id)
            .map(|swap| swap.status)
            .ok_or_else(|| StoreError::NotFound(format!("swap {id} not found")))?;

        if status != SwapStatus::Pending {
            return Err(StoreError::StatusMismatch {
                expected: SwapStatus::Pending,
                found: status,
            });
        }

        guard.remove(&id);
        Ok(())
    }
}
