//! # Raffle Rules
//!
//! Pure domain rules of the raffle administration service. Nothing in this
//! crate touches storage, the network or the clock: callers pass in snapshots
//! and the current instant.
//!
//! | Concern                  | Module            |
//! |--------------------------|-------------------|
//! | Ticket availability      | [`availability`]  |
//! | Referral rollups, links  | [`referrals`]     |
//! | Commission eligibility   | [`commission`]    |
//! | Status transitions, roles| [`lifecycle`]     |
//! | Shared types             | [`types`]         |
//!
//! All functions are single-pass over their input and safe to call from any
//! number of threads.

pub mod availability;
pub mod commission;
pub mod error;
pub mod lifecycle;
pub mod referrals;
pub mod types;

#[cfg(test)]
mod invariants;
#[cfg(test)]
mod test_availability;
#[cfg(test)]
mod test_commission;
#[cfg(test)]
mod test_lifecycle;
#[cfg(test)]
mod test_referrals;

pub use availability::AvailabilitySummary;
pub use commission::{CommissionLine, CommissionReport};
pub use error::RuleError;
pub use lifecycle::{has_role, HasRole};
pub use referrals::{ReferralReport, SourceTotals, DIRECT_SALES};
pub use types::{
    Currency, PurchaseSnapshot, PurchaseStatus, RaffleStatus, Role, Settings, TicketSnapshot,
    TicketStatus,
};
