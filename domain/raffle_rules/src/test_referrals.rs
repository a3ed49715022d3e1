use rust_decimal::Decimal;

use crate::invariants::{assert_confirmed_within_totals, assert_revenue_balances};
use crate::referrals::{aggregate, DIRECT_SALES};
use crate::types::{PurchaseSnapshot, PurchaseStatus};

fn purchase(
    status: PurchaseStatus,
    referral: Option<&str>,
    tickets: u32,
    amount: i64,
) -> PurchaseSnapshot {
    PurchaseSnapshot {
        status,
        referral_code: referral.map(str::to_string),
        referral_name: referral.map(str::to_string),
        buyer_email: "buyer@example.com".to_string(),
        ticket_count: tickets,
        amount: Decimal::from(amount),
    }
}

#[test]
fn test_meta1_scenario() {
    let purchases = vec![
        purchase(PurchaseStatus::Confirmed, Some("META1"), 2, 20),
        purchase(PurchaseStatus::Confirmed, Some("META1"), 3, 30),
        purchase(PurchaseStatus::Pending, Some("META1"), 1, 10),
    ];

    let report = aggregate(&purchases);
    let meta = &report.sources["META1"];

    assert_eq!(meta.confirmed_sales, 2);
    assert_eq!(meta.total_sales, 3);
    assert_eq!(meta.confirmed_tickets, 5);
    assert_eq!(meta.total_tickets, 6);
    assert_eq!(meta.confirmed_revenue, Decimal::from(50));
    assert_eq!(report.total_confirmed_revenue, Decimal::from(50));
    assert_revenue_balances(&report);
}

#[test]
fn test_rejected_counts_only_in_totals() {
    let purchases = vec![
        purchase(PurchaseStatus::Rejected, Some("IG"), 4, 40),
        purchase(PurchaseStatus::Confirmed, Some("IG"), 1, 10),
    ];

    let report = aggregate(&purchases);
    let ig = &report.sources["IG"];

    assert_eq!(ig.total_sales, 2);
    assert_eq!(ig.total_tickets, 5);
    assert_eq!(ig.confirmed_sales, 1);
    assert_eq!(ig.confirmed_tickets, 1);
    assert_eq!(ig.confirmed_revenue, Decimal::from(10));
    assert_confirmed_within_totals(&report);
}

#[test]
fn test_unattributed_purchases_group_as_direct() {
    let purchases = vec![
        purchase(PurchaseStatus::Confirmed, None, 1, 10),
        purchase(PurchaseStatus::Pending, None, 2, 20),
        purchase(PurchaseStatus::Confirmed, Some("SELLER-ANA"), 1, 10),
    ];

    let report = aggregate(&purchases);
    assert_eq!(report.sources.len(), 2);

    let direct = &report.sources[DIRECT_SALES];
    assert_eq!(direct.total_sales, 2);
    assert_eq!(direct.confirmed_revenue, Decimal::from(10));
    assert_eq!(report.total_confirmed_revenue, Decimal::from(20));
    assert_revenue_balances(&report);
}

#[test]
fn test_revenue_balances_across_many_sources() {
    let sources = [None, Some("A"), Some("B"), Some("C")];
    let statuses = [
        PurchaseStatus::Confirmed,
        PurchaseStatus::Pending,
        PurchaseStatus::Rejected,
    ];
    let purchases: Vec<_> = (0..60)
        .map(|i| {
            purchase(
                statuses[i % statuses.len()],
                sources[i % sources.len()],
                (i % 5 + 1) as u32,
                (i as i64) * 7 + 3,
            )
        })
        .collect();

    let report = aggregate(&purchases);
    assert_revenue_balances(&report);
    assert_confirmed_within_totals(&report);

    let total_sales: u32 = report.sources.values().map(|s| s.total_sales).sum();
    assert_eq!(total_sales, 60);
}

#[test]
fn test_empty_input_yields_empty_report() {
    let report = aggregate(&Vec::<PurchaseSnapshot>::new());
    assert!(report.sources.is_empty());
    assert_eq!(report.total_confirmed_revenue, Decimal::ZERO);
}

#[test]
fn test_ranked_orders_by_revenue_then_name() {
    let purchases = vec![
        purchase(PurchaseStatus::Confirmed, Some("B"), 1, 10),
        purchase(PurchaseStatus::Confirmed, Some("A"), 1, 10),
        purchase(PurchaseStatus::Confirmed, Some("C"), 1, 50),
    ];

    let report = aggregate(&purchases);
    let names: Vec<_> = report.ranked().into_iter().map(|(name, _)| name).collect();
    assert_eq!(names, vec!["C", "A", "B"]);
}
