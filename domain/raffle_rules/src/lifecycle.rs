//! # Lifecycle
//!
//! Allowed status transitions for raffles and purchases, and the role
//! capability check used at every admin entry point.
//!
//! Transitions are triggered by an operator; these checks are the only guard.

use crate::error::RuleError;
use crate::types::{PurchaseStatus, RaffleStatus, Role};

impl RaffleStatus {
    /// `Finished` and `Cancelled` accept no further transitions.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Finished | Self::Cancelled)
    }

    /// Whether buyers may reserve or purchase tickets.
    pub fn is_selling(&self) -> bool {
        *self == Self::Active
    }
}

impl PurchaseStatus {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Pending)
    }
}

/// Whether a raffle may move from `from` to `to`.
///
/// ```text
/// Draft     -> Active | Cancelled
/// Active    -> Finished | Cancelled | Postponed
/// Postponed -> Active | Cancelled
/// ```
pub fn can_transition_raffle(from: RaffleStatus, to: RaffleStatus) -> bool {
    use RaffleStatus::*;
    matches!(
        (from, to),
        (Draft, Active)
            | (Draft, Cancelled)
            | (Active, Finished)
            | (Active, Cancelled)
            | (Active, Postponed)
            | (Postponed, Active)
            | (Postponed, Cancelled)
    )
}

pub fn check_raffle_transition(from: RaffleStatus, to: RaffleStatus) -> Result<(), RuleError> {
    if can_transition_raffle(from, to) {
        Ok(())
    } else {
        Err(RuleError::InvalidRaffleTransition { from, to })
    }
}

/// Only `Pending -> Confirmed | Rejected` is allowed.
pub fn check_purchase_transition(
    from: PurchaseStatus,
    to: PurchaseStatus,
) -> Result<(), RuleError> {
    match (from, to) {
        (PurchaseStatus::Pending, PurchaseStatus::Confirmed | PurchaseStatus::Rejected) => Ok(()),
        _ => Err(RuleError::InvalidPurchaseTransition { from, to }),
    }
}

/// Anything that carries a role.
pub trait HasRole {
    fn role(&self) -> Role;
}

impl HasRole for Role {
    fn role(&self) -> Role {
        *self
    }
}

/// Capability check: does `subject` hold `role`?
pub fn has_role<T: HasRole + ?Sized>(subject: &T, role: Role) -> bool {
    subject.role() == role
}
