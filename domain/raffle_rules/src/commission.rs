//! # Commission
//!
//! A referral commission is owed once per unique buyer per referral code, no
//! matter how many confirmed purchases that buyer made through the code. The
//! rule is a set-membership count over confirmed purchases multiplied by the
//! flat rate in the [`Settings`] snapshot.

use std::collections::{BTreeMap, BTreeSet};

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::types::{PurchaseSnapshot, PurchaseStatus, Settings};

/// Commission owed for one referral code.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct CommissionLine {
    pub code: String,
    pub unique_buyers: u32,
    pub commission: Decimal,
}

#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
pub struct CommissionReport {
    /// One line per referral code, sorted by code.
    pub lines: Vec<CommissionLine>,
    pub total_commission: Decimal,
}

/// Canonical buyer identity used for deduplication.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_ascii_lowercase()
}

/// Compute commission eligibility over `purchases` using the snapshot's rate.
///
/// Purchases that are not confirmed, carry no referral code, or have a blank
/// buyer email are ignored.
pub fn commissions<'a, I>(purchases: I, settings: &Settings) -> CommissionReport
where
    I: IntoIterator<Item = &'a PurchaseSnapshot>,
{
    let mut buyers: BTreeMap<&str, BTreeSet<String>> = BTreeMap::new();

    for purchase in purchases {
        if purchase.status != PurchaseStatus::Confirmed {
            continue;
        }
        let Some(code) = purchase.referral_code.as_deref() else {
            continue;
        };
        let email = normalize_email(&purchase.buyer_email);
        if email.is_empty() {
            continue;
        }
        buyers.entry(code).or_default().insert(email);
    }

    let mut report = CommissionReport::default();
    for (code, emails) in buyers {
        let unique_buyers = u32::try_from(emails.len()).unwrap_or(u32::MAX);
        let commission = settings.commission_rate * Decimal::from(unique_buyers);
        report.total_commission += commission;
        report.lines.push(CommissionLine {
            code: code.to_string(),
            unique_buyers,
            commission,
        });
    }
    report
}
