//! # Types
//!
//! Shared data structures used across all rules of the raffle domain.
//!
//! ## Design decisions
//!
//! ### Snapshots, not rows
//!
//! The rules never see database rows. Callers project their records onto the
//! small snapshot types below ([`TicketSnapshot`], [`PurchaseSnapshot`]) and
//! the configuration values onto [`Settings`], so every rule stays a pure
//! function of its inputs.
//!
//! ### Status as a Finite-State Machine
//!
//! [`RaffleStatus`] follows a forward-only lifecycle:
//!
//! ```text
//! Draft ──► Active ──► Finished
//!   │        │  ▲
//!   │        ▼  │
//!   │     Postponed
//!   │        │
//!   └────────┴──► Cancelled
//! ```
//!
//! [`PurchaseStatus`] is `Pending ──► Confirmed | Rejected`. Transition checks
//! live in [`crate::lifecycle`].

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::RuleError;

/// Implements `as_str`, [`fmt::Display`] and [`FromStr`] for a text-backed enum.
macro_rules! text_enum {
    ($name:ident { $($variant:ident => $text:literal),+ $(,)? }) => {
        impl $name {
            /// Short identifier suitable for storage and JSON.
            pub fn as_str(&self) -> &'static str {
                match self {
                    $(Self::$variant => $text,)+
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $name {
            type Err = RuleError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($text => Ok(Self::$variant),)+
                    other => Err(RuleError::UnknownVariant {
                        kind: stringify!($name),
                        value: other.to_string(),
                    }),
                }
            }
        }
    };
}

/// Lifecycle status of a raffle.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RaffleStatus {
    /// Being configured; not visible to buyers.
    Draft,
    /// Selling tickets.
    Active,
    /// Drawn; terminal.
    Finished,
    /// Called off; terminal.
    Cancelled,
    /// Temporarily halted; may resume.
    Postponed,
}

text_enum!(RaffleStatus {
    Draft => "draft",
    Active => "active",
    Finished => "finished",
    Cancelled => "cancelled",
    Postponed => "postponed",
});

/// Currency a raffle is priced in.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Currency {
    Usd,
    /// Local currency (bolívares).
    Ves,
}

text_enum!(Currency {
    Usd => "USD",
    Ves => "VES",
});

/// Stored status of a single ticket.
///
/// The stored value alone does not say whether a ticket is taken: a
/// `Reserved` ticket whose expiry has passed is available. See
/// [`crate::availability`].
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TicketStatus {
    Available,
    Reserved,
    Sold,
}

text_enum!(TicketStatus {
    Available => "available",
    Reserved => "reserved",
    Sold => "sold",
});

/// Lifecycle status of a purchase.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PurchaseStatus {
    /// Submitted; payment not yet verified.
    Pending,
    Confirmed,
    Rejected,
}

text_enum!(PurchaseStatus {
    Pending => "pending",
    Confirmed => "confirmed",
    Rejected => "rejected",
});

/// Role held by an operator account.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Admin,
    User,
}

text_enum!(Role {
    Admin => "admin",
    User => "user",
});

/// The part of a ticket the availability rules look at.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct TicketSnapshot {
    /// Display number, unique per raffle.
    pub number: i64,
    pub status: TicketStatus,
    /// When a reservation lapses. Ignored unless `status` is `Reserved`.
    pub reserved_until: Option<DateTime<Utc>>,
}

/// The part of a purchase the referral and commission rules look at.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct PurchaseSnapshot {
    pub status: PurchaseStatus,
    /// Referral code the purchase was attributed to, if any.
    pub referral_code: Option<String>,
    /// Display name of the referral source (campaign or seller), if any.
    pub referral_name: Option<String>,
    pub buyer_email: String,
    pub ticket_count: u32,
    pub amount: Decimal,
}

/// Explicitly loaded configuration snapshot.
///
/// Rules that need global configuration take this as a parameter instead of
/// reading it from ambient state.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    /// Flat fee paid per unique buyer per referral code.
    pub commission_rate: Decimal,
    /// Local currency units per USD.
    pub exchange_rate: Decimal,
}

impl Settings {
    /// Convert an amount in `currency` to USD using the snapshot's rate.
    ///
    /// Returns `None` for local-currency amounts when the exchange rate is zero.
    pub fn to_usd(&self, amount: Decimal, currency: Currency) -> Option<Decimal> {
        match currency {
            Currency::Usd => Some(amount),
            Currency::Ves => amount.checked_div(self.exchange_rate),
        }
    }

    /// Convert a USD amount to local currency.
    pub fn to_local(&self, amount_usd: Decimal) -> Decimal {
        amount_usd * self.exchange_rate
    }
}
