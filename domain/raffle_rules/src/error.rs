//! Errors raised by the raffle rules.

use thiserror::Error;

use crate::types::{PurchaseStatus, RaffleStatus};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RuleError {
    #[error("unknown {kind} value: {value:?}")]
    UnknownVariant { kind: &'static str, value: String },

    #[error("raffle cannot move from {from} to {to}")]
    InvalidRaffleTransition { from: RaffleStatus, to: RaffleStatus },

    #[error("purchase cannot move from {from} to {to}")]
    InvalidPurchaseTransition {
        from: PurchaseStatus,
        to: PurchaseStatus,
    },

    #[error("invalid referral code: {0:?}")]
    InvalidReferralCode(String),
}
