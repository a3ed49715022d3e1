use rust_decimal::Decimal;

use crate::commission::commissions;
use crate::invariants::assert_commission_balances;
use crate::types::{PurchaseSnapshot, PurchaseStatus, Settings};

fn settings(rate: i64) -> Settings {
    Settings {
        commission_rate: Decimal::from(rate),
        exchange_rate: Decimal::from(36),
    }
}

fn confirmed(code: Option<&str>, email: &str) -> PurchaseSnapshot {
    PurchaseSnapshot {
        status: PurchaseStatus::Confirmed,
        referral_code: code.map(str::to_string),
        referral_name: code.map(|c| format!("Campaign {c}")),
        buyer_email: email.to_string(),
        ticket_count: 1,
        amount: Decimal::from(10),
    }
}

#[test]
fn test_repeat_buyer_pays_once_per_code() {
    let purchases = vec![
        confirmed(Some("META1"), "ana@example.com"),
        confirmed(Some("META1"), "ana@example.com"),
        confirmed(Some("META1"), "ANA@example.com "),
        confirmed(Some("META1"), "luis@example.com"),
    ];

    let report = commissions(&purchases, &settings(2));

    assert_eq!(report.lines.len(), 1);
    assert_eq!(report.lines[0].code, "META1");
    assert_eq!(report.lines[0].unique_buyers, 2);
    assert_eq!(report.lines[0].commission, Decimal::from(4));
    assert_eq!(report.total_commission, Decimal::from(4));
}

#[test]
fn test_same_buyer_under_two_codes_counts_twice() {
    let purchases = vec![
        confirmed(Some("META1"), "ana@example.com"),
        confirmed(Some("IG"), "ana@example.com"),
    ];

    let report = commissions(&purchases, &settings(3));

    assert_eq!(report.lines.len(), 2);
    assert_eq!(report.lines[0].code, "IG");
    assert_eq!(report.lines[1].code, "META1");
    assert_eq!(report.total_commission, Decimal::from(6));
    assert_commission_balances(&report);
}

#[test]
fn test_only_confirmed_referred_purchases_qualify() {
    let mut pending = confirmed(Some("META1"), "ana@example.com");
    pending.status = PurchaseStatus::Pending;
    let mut rejected = confirmed(Some("META1"), "luis@example.com");
    rejected.status = PurchaseStatus::Rejected;
    let direct = confirmed(None, "maria@example.com");
    let blank = confirmed(Some("META1"), "   ");

    let report = commissions(&[pending, rejected, direct, blank], &settings(5));

    assert!(report.lines.is_empty());
    assert_eq!(report.total_commission, Decimal::ZERO);
}

#[test]
fn test_rate_comes_from_snapshot() {
    let purchases = vec![confirmed(Some("META1"), "ana@example.com")];
    let half = Settings {
        commission_rate: Decimal::new(5, 1),
        exchange_rate: Decimal::ONE,
    };

    assert_eq!(commissions(&purchases, &half).total_commission, Decimal::new(5, 1));
    assert_eq!(
        commissions(&purchases, &settings(0)).total_commission,
        Decimal::ZERO
    );
}
