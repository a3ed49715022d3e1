//! # Referrals
//!
//! Attribution of purchases to referral sources and the per-source rollups
//! shown on the referral report.
//!
//! Purchases are grouped by the referral source name; purchases without one
//! fall under [`DIRECT_SALES`]. Every purchase counts towards the `total_*`
//! figures of its source, only confirmed ones towards the `confirmed_*`
//! figures and the revenue.

use std::collections::HashMap;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::RuleError;
use crate::types::{PurchaseSnapshot, PurchaseStatus};

/// Grouping label for purchases with no referral source.
pub const DIRECT_SALES: &str = "Direct Sales";

/// Query-string parameter carrying the referral code.
pub const REFERRAL_PARAM: &str = "r";

/// Older links used this parameter name; still honoured.
pub const LEGACY_REFERRAL_PARAM: &str = "ref";

const MAX_CODE_LEN: usize = 32;

/// Aggregate figures for one referral source.
#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
pub struct SourceTotals {
    pub total_sales: u32,
    pub confirmed_sales: u32,
    pub total_tickets: u64,
    pub confirmed_tickets: u64,
    pub confirmed_revenue: Decimal,
}

/// Per-source rollups plus the grand total across all sources.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ReferralReport {
    pub sources: HashMap<String, SourceTotals>,
    pub total_confirmed_revenue: Decimal,
}

impl ReferralReport {
    /// Sources sorted by confirmed revenue, highest first, then by name.
    pub fn ranked(&self) -> Vec<(&str, &SourceTotals)> {
        let mut rows: Vec<_> = self
            .sources
            .iter()
            .map(|(name, totals)| (name.as_str(), totals))
            .collect();
        rows.sort_by(|a, b| {
            b.1.confirmed_revenue
                .cmp(&a.1.confirmed_revenue)
                .then_with(|| a.0.cmp(b.0))
        });
        rows
    }
}

/// The grouping key for a purchase.
pub fn source_name(purchase: &PurchaseSnapshot) -> &str {
    purchase
        .referral_name
        .as_deref()
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .unwrap_or(DIRECT_SALES)
}

/// Roll purchases up per referral source.
pub fn aggregate<'a, I>(purchases: I) -> ReferralReport
where
    I: IntoIterator<Item = &'a PurchaseSnapshot>,
{
    let mut report = ReferralReport::default();

    for purchase in purchases {
        let totals = report
            .sources
            .entry(source_name(purchase).to_string())
            .or_default();

        totals.total_sales += 1;
        totals.total_tickets += u64::from(purchase.ticket_count);

        if purchase.status == PurchaseStatus::Confirmed {
            totals.confirmed_sales += 1;
            totals.confirmed_tickets += u64::from(purchase.ticket_count);
            totals.confirmed_revenue += purchase.amount;
            report.total_confirmed_revenue += purchase.amount;
        }
    }

    report
}

/// Canonical form of a referral code: trimmed and upper-cased.
///
/// Codes are 1 to 32 ASCII letters, digits, `-` or `_`.
pub fn normalize_code(raw: &str) -> Result<String, RuleError> {
    let code = raw.trim();
    let valid = !code.is_empty()
        && code.len() <= MAX_CODE_LEN
        && code
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
    if !valid {
        return Err(RuleError::InvalidReferralCode(raw.to_string()));
    }
    Ok(code.to_ascii_uppercase())
}

/// Pick the referral code out of decoded query parameters.
///
/// `r` wins over the legacy `ref`; blank values are ignored.
pub fn code_from_query<'a, I>(params: I) -> Option<String>
where
    I: IntoIterator<Item = (&'a str, &'a str)>,
{
    let mut legacy = None;
    for (key, value) in params {
        let value = value.trim();
        if value.is_empty() {
            continue;
        }
        match key {
            REFERRAL_PARAM => return Some(value.to_string()),
            LEGACY_REFERRAL_PARAM if legacy.is_none() => legacy = Some(value.to_string()),
            _ => {}
        }
    }
    legacy
}

/// Public share link for a raffle attributed to `code`.
pub fn share_link(domain: &str, raffle_slug: &str, code: &str) -> String {
    let domain = domain
        .trim_start_matches("https://")
        .trim_start_matches("http://")
        .trim_end_matches('/');
    format!("https://{domain}/rifa/{raffle_slug}?{REFERRAL_PARAM}={code}")
}
