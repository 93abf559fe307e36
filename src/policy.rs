//! Access and visibility rules for profiles and swaps

use uuid::Uuid;

use crate::models::{Swap, User};

/// Outcome of an access check
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    Allowed,
    Denied(&'static str),
}

impl Access {
    pub fn is_allowed(self) -> bool {
        matches!(self, Access::Allowed)
    }
}

/// A profile is readable if it is public or the viewer owns it.
pub fn can_view_profile(viewer: Uuid, target: &User) -> Access {
    if target.is_public || target.id == viewer {
        Access::Allowed
    } else {
        Access::Denied("Profile is private")
    }
}

/// Whether `user` belongs in `viewer`'s directory listing.
pub fn listed_in_directory(viewer: Uuid, user: &User) -> bool {
    user.is_public && user.id != viewer
}

pub fn can_view_swap(actor: Uuid, swap: &Swap) -> Access {
    if swap.is_participant(actor) {
        Access::Allowed
    } else {
        Access::Denied("You can only view swaps you are part of")
    }
}

/// Only the recipient may answer a request.
pub fn can_respond_to_swap(actor: Uuid, swap: &Swap, verb: SwapAnswer) -> Access {
    if swap.recipient_id == actor {
        Access::Allowed
    } else {
        Access::Denied(match verb {
            SwapAnswer::Accept => "You can only accept swap requests sent to you",
            SwapAnswer::Reject => "You can only reject swap requests sent to you",
        })
    }
}

/// The recipient's answer to a pending request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SwapAnswer {
    Accept,
    Reject,
}

pub fn can_cancel_swap(actor: Uuid, swap: &Swap) -> Access {
    if swap.requester_id == actor {
        Access::Allowed
    } else {
        Access::Denied("You can only cancel swap requests you created")
    }
}

/// Either participant may complete; no confirmation from the other side.
pub fn can_complete_swap(actor: Uuid, swap: &Swap) -> Access {
    if swap.is_participant(actor) {
        Access::Allowed
    } else {
        Access::Denied("You are not part of this swap")
    }
}
