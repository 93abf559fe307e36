//! Swap lifecycle service
//!
//! Owns the swap state machine:
//!
//! ```text
//! pending ──accept──▶ accepted ──complete──▶ completed
//!    │  └───reject──▶ rejected
//!    └──cancel──▶ (deleted)
//! ```
//!
//! Each transition checks the actor's role, then applies the change as a
//! conditional update at the store, so two racing requests cannot both
//! succeed against the same pending swap.

use std::collections::HashMap;
use std::sync::Arc;

use serde::Deserialize;
use uuid::Uuid;
use validator::Validate;

use crate::error::validation_message;
use crate::models::{NewSwap, Participant, Swap, SwapDetails, SwapDirection, SwapStatus, User};
use crate::policy::{self, Access, SwapAnswer};
use crate::store::{StoreError, SwapStore, UserStore};

/// Swap service error
#[derive(Debug, thiserror::Error)]
pub enum SwapError {
    #[error("{0}")]
    NotFound(&'static str),
    #[error("{0}")]
    Forbidden(&'static str),
    #[error("Cannot create swap request with yourself")]
    SelfSwap,
    #[error("{0}")]
    InvalidState(&'static str),
    #[error("Pending swap request already exists with this user")]
    DuplicatePending,
    #[error("{0}")]
    Validation(String),
    #[error("Store error: {0}")]
    Store(#[from] StoreError),
}

/// Create swap request body
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateSwapRequest {
    pub recipient_id: String,
    #[validate(length(min = 1, message = "requesterSkill is required"))]
    pub requester_skill: String,
    #[validate(length(min = 1, message = "recipientSkill is required"))]
    pub recipient_skill: String,
    #[validate(length(max = 500, message = "message must be at most 500 characters"))]
    pub message: Option<String>,
}

impl CreateSwapRequest {
    fn trimmed(self) -> Self {
        Self {
            recipient_id: self.recipient_id.trim().to_string(),
            requester_skill: self.requester_skill.trim().to_string(),
            recipient_skill: self.recipient_skill.trim().to_string(),
            message: self
                .message
                .map(|m| m.trim().to_string())
                .filter(|m| !m.is_empty()),
        }
    }
}

fn check(access: Access) -> Result<(), SwapError> {
    match access {
        Access::Allowed => Ok(()),
        Access::Denied(reason) => Err(SwapError::Forbidden(reason)),
    }
}

/// Swap lifecycle service
pub struct SwapService {
    swaps: Arc<dyn SwapStore>,
    users: Arc<dyn UserStore>,
}

impl SwapService {
    pub fn new(swaps: Arc<dyn SwapStore>, users: Arc<dyn UserStore>) -> Self {
        Self { swaps, users }
    }

    /// Create a pending swap from `requester_id` to the request's recipient
    ///
    /// # Errors
    /// `NotFound` if the recipient does not exist, `SelfSwap` if the recipient
    /// is the requester, `DuplicatePending` if the ordered pair already has a
    /// pending swap.
    pub async fn create(
        &self,
        requester_id: Uuid,
        request: CreateSwapRequest,
    ) -> Result<SwapDetails, SwapError> {
        let request = request.trimmed();
        request
            .validate()
            .map_err(|e| SwapError::Validation(validation_message(&e)))?;

        let recipient_id = Uuid::parse_str(&request.recipient_id)
            .map_err(|_| SwapError::Validation("recipientId is not a valid id".to_string()))?;

        if self.users.find_user(recipient_id).await?.is_none() {
            return Err(SwapError::NotFound("Recipient not found"));
        }

        if requester_id == recipient_id {
            return Err(SwapError::SelfSwap);
        }

        let swap = self
            .swaps
            .insert_swap(NewSwap {
                requester_id,
                recipient_id,
                requester_skill: request.requester_skill,
                recipient_skill: request.recipient_skill,
                message: request.message,
            })
            .await
            .map_err(|e| match e {
                StoreError::Conflict(_) => SwapError::DuplicatePending,
                other => other.into(),
            })?;

        tracing::info!(swap_id = %swap.id, requester = %requester_id, recipient = %recipient_id, "swap requested");

        // Not transactional: if resolution fails the pending swap stays stored.
        self.resolve(swap).await
    }

    /// Swaps the user sent, received, or both, newest first
    pub async fn list_for_user(
        &self,
        user_id: Uuid,
        direction: SwapDirection,
    ) -> Result<Vec<SwapDetails>, SwapError> {
        let swaps = self.swaps.list_swaps(user_id, direction).await?;
        self.resolve_many(swaps).await
    }

    /// Recipient accepts a pending swap
    pub async fn accept(&self, swap_id: Uuid, actor: Uuid) -> Result<SwapDetails, SwapError> {
        self.respond(swap_id, actor, SwapAnswer::Accept).await
    }

    /// Recipient rejects a pending swap
    pub async fn reject(&self, swap_id: Uuid, actor: Uuid) -> Result<SwapDetails, SwapError> {
        self.respond(swap_id, actor, SwapAnswer::Reject).await
    }

    async fn respond(
        &self,
        swap_id: Uuid,
        actor: Uuid,
        answer: SwapAnswer,
    ) -> Result<SwapDetails, SwapError> {
        let swap = self.load(swap_id, "Swap request not found").await?;
        check(policy::can_respond_to_swap(actor, &swap, answer))?;

        let target = match answer {
            SwapAnswer::Accept => SwapStatus::Accepted,
            SwapAnswer::Reject => SwapStatus::Rejected,
        };
        let swap = self
            .transition(
                swap,
                SwapStatus::Pending,
                target,
                "This swap request is no longer pending",
            )
            .await?;

        tracing::info!(swap_id = %swap_id, actor = %actor, status = %target, "swap answered");
        self.resolve(swap).await
    }

    /// Requester withdraws a pending swap. The record is deleted outright.
    pub async fn cancel(&self, swap_id: Uuid, actor: Uuid) -> Result<(), SwapError> {
        const NOT_PENDING: &str = "Can only cancel pending swap requests";

        let swap = self.load(swap_id, "Swap request not found").await?;
        check(policy::can_cancel_swap(actor, &swap))?;

        if swap.status != SwapStatus::Pending {
            return Err(SwapError::InvalidState(NOT_PENDING));
        }

        self.swaps
            .delete_pending_swap(swap_id)
            .await
            .map_err(|e| match e {
                StoreError::StatusMismatch { .. } => SwapError::InvalidState(NOT_PENDING),
                StoreError::NotFound(_) => SwapError::NotFound("Swap request not found"),
                other => other.into(),
            })?;

        tracing::info!(swap_id = %swap_id, actor = %actor, "swap cancelled");
        Ok(())
    }

    /// Either participant marks an accepted swap as completed
    pub async fn complete(&self, swap_id: Uuid, actor: Uuid) -> Result<SwapDetails, SwapError> {
        let swap = self.load(swap_id, "Swap not found").await?;
        check(policy::can_complete_swap(actor, &swap))?;

        let swap = self
            .transition(
                swap,
                SwapStatus::Accepted,
                SwapStatus::Completed,
                "Can only complete accepted swaps",
            )
            .await?;

        tracing::info!(swap_id = %swap_id, actor = %actor, "swap completed");
        self.resolve(swap).await
    }

    /// Swap with participants resolved; participants only
    pub async fn get_details(&self, swap_id: Uuid, actor: Uuid) -> Result<SwapDetails, SwapError> {
        let swap = self.load(swap_id, "Swap not found").await?;
        check(policy::can_view_swap(actor, &swap))?;
        self.resolve(swap).await
    }

    /// Join participant identities onto a stored swap.
    pub async fn resolve(&self, swap: Swap) -> Result<SwapDetails, SwapError> {
        let mut resolved = self.resolve_many(vec![swap]).await?;
        resolved
            .pop()
            .ok_or_else(|| StoreError::Backend("swap resolution produced no record".into()).into())
    }

    async fn resolve_many(&self, swaps: Vec<Swap>) -> Result<Vec<SwapDetails>, SwapError> {
        let mut ids: Vec<Uuid> = swaps
            .iter()
            .flat_map(|swap| [swap.requester_id, swap.recipient_id])
            .collect();
        ids.sort();
        ids.dedup();

        let users: HashMap<Uuid, User> = self
            .users
            .find_users(&ids)
            .await?
            .into_iter()
            .map(|user| (user.id, user))
            .collect();

        let participant = |id: Uuid| -> Result<Participant, SwapError> {
            users
                .get(&id)
                .map(Participant::from)
                .ok_or_else(|| StoreError::Backend(format!("participant {id} missing")).into())
        };

        swaps
            .into_iter()
            .map(|swap| {
                Ok(SwapDetails {
                    id: swap.id,
                    requester: participant(swap.requester_id)?,
                    recipient: participant(swap.recipient_id)?,
                    requester_skill: swap.requester_skill,
                    recipient_skill: swap.recipient_skill,
                    status: swap.status,
                    message: swap.message,
                    scheduled_date: swap.scheduled_date,
                    created_at: swap.created_at,
                    updated_at: swap.updated_at,
                })
            })
            .collect()
    }

    async fn load(&self, swap_id: Uuid, missing: &'static str) -> Result<Swap, SwapError> {
        self.swaps
            .find_swap(swap_id)
            .await?
            .ok_or(SwapError::NotFound(missing))
    }

    async fn transition(
        &self,
        swap: Swap,
        from: SwapStatus,
        to: SwapStatus,
        wrong_state: &'static str,
    ) -> Result<Swap, SwapError> {
        debug_assert!(from.can_transition_to(to));

        if swap.status != from {
            return Err(SwapError::InvalidState(wrong_state));
        }

        self.swaps
            .transition_status(swap.id, from, to)
            .await
            .map_err(|e| match e {
                StoreError::StatusMismatch { .. } => SwapError::InvalidState(wrong_state),
                StoreError::NotFound(_) => SwapError::NotFound("Swap not found"),
                other => other.into(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{DirectoryFilter, NewUser, ProfileUpdate};
    use crate::store::{MemoryStore, StoreResult};
    use async_trait::async_trait;

    struct Fixture {
        store: Arc<MemoryStore>,
        service: SwapService,
        ana: Uuid,
        bo: Uuid,
        cy: Uuid,
    }

    async fn fixture() -> Fixture {
        let store = Arc::new(MemoryStore::new());
        let mut ids = Vec::new();
        for name in ["ana", "bo", "cy"] {
            let user = store
                .insert_user(NewUser {
                    full_name: name.to_string(),
                    email: format!("{name}@example.com"),
                    password_hash: "hash".to_string(),
                })
                .await
                .unwrap();
            ids.push(user.id);
        }
        let service = SwapService::new(store.clone(), store.clone());
        Fixture {
            store,
            service,
            ana: ids[0],
            bo: ids[1],
            cy: ids[2],
        }
    }

    fn request(to: Uuid) -> CreateSwapRequest {
        CreateSwapRequest {
            recipient_id: to.to_string(),
            requester_skill: " Guitar ".to_string(),
            recipient_skill: "Spanish".to_string(),
            message: Some("Let's trade!".to_string()),
        }
    }

    #[tokio::test]
    async fn create_resolves_participants_and_starts_pending() {
        let f = fixture().await;
        let swap = f.service.create(f.ana, request(f.bo)).await.unwrap();

        assert_eq!(swap.status, SwapStatus::Pending);
        assert_eq!(swap.requester.id, f.ana);
        assert_eq!(swap.requester.full_name, "ana");
        assert_eq!(swap.recipient.id, f.bo);
        assert_eq!(swap.requester_skill, "Guitar");
        assert!(swap.scheduled_date.is_none());
    }

    #[tokio::test]
    async fn create_guards_recipient_self_and_duplicates() {
        let f = fixture().await;

        let missing = f.service.create(f.ana, request(Uuid::new_v4())).await;
        assert!(matches!(missing, Err(SwapError::NotFound("Recipient not found"))));

        let own = f.service.create(f.ana, request(f.ana)).await;
        assert!(matches!(own, Err(SwapError::SelfSwap)));

        f.service.create(f.ana, request(f.bo)).await.unwrap();
        let again = f.service.create(f.ana, request(f.bo)).await;
        assert!(matches!(again, Err(SwapError::DuplicatePending)));

        // Reverse direction is a different ordered pair.
        f.service.create(f.bo, request(f.ana)).await.unwrap();
    }

    #[tokio::test]
    async fn create_validates_input() {
        let f = fixture().await;

        let mut blank = request(f.bo);
        blank.recipient_skill = "   ".to_string();
        assert!(matches!(
            f.service.create(f.ana, blank).await,
            Err(SwapError::Validation(_))
        ));

        let mut long = request(f.bo);
        long.message = Some("x".repeat(501));
        assert!(matches!(
            f.service.create(f.ana, long).await,
            Err(SwapError::Validation(_))
        ));

        let mut bad_id = request(f.bo);
        bad_id.recipient_id = "not-a-uuid".to_string();
        assert!(matches!(
            f.service.create(f.ana, bad_id).await,
            Err(SwapError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn only_recipient_may_accept_or_reject() {
        let f = fixture().await;
        let swap = f.service.create(f.ana, request(f.bo)).await.unwrap();

        assert!(matches!(
            f.service.accept(swap.id, f.ana).await,
            Err(SwapError::Forbidden(_))
        ));
        assert!(matches!(
            f.service.reject(swap.id, f.ana).await,
            Err(SwapError::Forbidden(_))
        ));

        let accepted = f.service.accept(swap.id, f.bo).await.unwrap();
        assert_eq!(accepted.status, SwapStatus::Accepted);
    }

    #[tokio::test]
    async fn repeated_transitions_fail_with_invalid_state() {
        let f = fixture().await;
        let swap = f.service.create(f.ana, request(f.bo)).await.unwrap();

        f.service.reject(swap.id, f.bo).await.unwrap();
        for result in [
            f.service.reject(swap.id, f.bo).await,
            f.service.accept(swap.id, f.bo).await,
            f.service.complete(swap.id, f.ana).await,
        ] {
            assert!(matches!(result, Err(SwapError::InvalidState(_))));
        }
        assert!(matches!(
            f.service.cancel(swap.id, f.ana).await,
            Err(SwapError::InvalidState(_))
        ));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_answers_settle_exactly_once() {
        let f = fixture().await;
        let service = Arc::new(SwapService::new(f.store.clone(), f.store.clone()));

        for _ in 0..50 {
            let id = service.create(f.ana, request(f.bo)).await.unwrap().id;

            let accept = tokio::spawn({
                let service = service.clone();
                let bo = f.bo;
                async move { service.accept(id, bo).await }
            });
            let reject = tokio::spawn({
                let service = service.clone();
                let bo = f.bo;
                async move { service.reject(id, bo).await }
            });

            let results = [accept.await.unwrap(), reject.await.unwrap()];
            let settled: Vec<_> = results.iter().filter_map(|r| r.as_ref().ok()).collect();
            assert_eq!(settled.len(), 1);
            assert!(results
                .iter()
                .filter_map(|r| r.as_ref().err())
                .all(|e| matches!(e, SwapError::InvalidState(_))));

            let stored = f.store.find_swap(id).await.unwrap().unwrap();
            assert_eq!(stored.status, settled[0].status);
        }
    }

    #[tokio::test]
    async fn complete_requires_accepted_and_a_participant() {
        let f = fixture().await;
        let swap = f.service.create(f.ana, request(f.bo)).await.unwrap();

        assert!(matches!(
            f.service.complete(swap.id, f.ana).await,
            Err(SwapError::InvalidState("Can only complete accepted swaps"))
        ));

        f.service.accept(swap.id, f.bo).await.unwrap();
        assert!(matches!(
            f.service.complete(swap.id, f.cy).await,
            Err(SwapError::Forbidden(_))
        ));

        // Requester alone can complete.
        let done = f.service.complete(swap.id, f.ana).await.unwrap();
        assert_eq!(done.status, SwapStatus::Completed);
        assert!(matches!(
            f.service.complete(swap.id, f.bo).await,
            Err(SwapError::InvalidState(_))
        ));
    }

    #[tokio::test]
    async fn cancel_deletes_and_is_requester_only() {
        let f = fixture().await;
        let swap = f.service.create(f.ana, request(f.bo)).await.unwrap();

        assert!(matches!(
            f.service.cancel(swap.id, f.bo).await,
            Err(SwapError::Forbidden(_))
        ));

        f.service.cancel(swap.id, f.ana).await.unwrap();
        assert!(matches!(
            f.service.get_details(swap.id, f.ana).await,
            Err(SwapError::NotFound(_))
        ));
        assert!(f.store.find_swap(swap.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn details_are_participant_only() {
        let f = fixture().await;
        let swap = f.service.create(f.ana, request(f.bo)).await.unwrap();

        assert!(f.service.get_details(swap.id, f.bo).await.is_ok());
        assert!(matches!(
            f.service.get_details(swap.id, f.cy).await,
            Err(SwapError::Forbidden("You can only view swaps you are part of"))
        ));
    }

    #[tokio::test]
    async fn listing_respects_direction() {
        let f = fixture().await;
        let sent = f.service.create(f.ana, request(f.bo)).await.unwrap();
        let received = f.service.create(f.cy, request(f.ana)).await.unwrap();
        f.service.create(f.bo, request(f.cy)).await.unwrap();

        let ids = |swaps: Vec<SwapDetails>| swaps.into_iter().map(|s| s.id).collect::<Vec<_>>();

        assert_eq!(
            ids(f.service.list_for_user(f.ana, SwapDirection::Sent).await.unwrap()),
            vec![sent.id]
        );
        assert_eq!(
            ids(f.service.list_for_user(f.ana, SwapDirection::Received).await.unwrap()),
            vec![received.id]
        );
        let all = ids(f.service.list_for_user(f.ana, SwapDirection::All).await.unwrap());
        assert_eq!(all.len(), 2);
        assert!(all.contains(&sent.id) && all.contains(&received.id));
    }

    /// Delegates to a memory store but cannot resolve participants.
    struct BrokenLookup(Arc<MemoryStore>);

    #[async_trait]
    impl UserStore for BrokenLookup {
        async fn insert_user(&self, user: NewUser) -> StoreResult<User> {
            self.0.insert_user(user).await
        }
        async fn find_user(&self, id: Uuid) -> StoreResult<Option<User>> {
            self.0.find_user(id).await
        }
        async fn find_user_by_email(&self, email: &str) -> StoreResult<Option<User>> {
            self.0.find_user_by_email(email).await
        }
        async fn find_users(&self, _ids: &[Uuid]) -> StoreResult<Vec<User>> {
            Err(StoreError::Backend("lookup unavailable".to_string()))
        }
        async fn list_public_users(&self, filter: &DirectoryFilter) -> StoreResult<Vec<User>> {
            self.0.list_public_users(filter).await
        }
        async fn update_profile(
            &self,
            id: Uuid,
            update: ProfileUpdate,
        ) -> StoreResult<Option<User>> {
            self.0.update_profile(id, update).await
        }
    }

    #[tokio::test]
    async fn failed_resolution_leaves_created_swap_pending() {
        let f = fixture().await;
        let service = SwapService::new(f.store.clone(), Arc::new(BrokenLookup(f.store.clone())));

        let result = service.create(f.ana, request(f.bo)).await;
        assert!(matches!(result, Err(SwapError::Store(_))));

        let stored = f.store.list_swaps(f.ana, SwapDirection::Sent).await.unwrap();
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].status, SwapStatus::Pending);
    }
}
