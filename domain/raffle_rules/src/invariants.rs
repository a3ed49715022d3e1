//! Assertions over rule outputs, shared by the test modules.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

use crate::availability::{self, AvailabilitySummary};
use crate::commission::CommissionReport;
use crate::referrals::ReferralReport;
use crate::types::{TicketSnapshot, TicketStatus};

/// Available plus taken always equals the ticket universe.
pub fn assert_counts_cover_universe(summary: &AvailabilitySummary, universe: usize) {
    assert_eq!(
        summary.available + summary.taken,
        universe,
        "available ({}) + taken ({}) != universe ({})",
        summary.available,
        summary.taken,
        universe
    );
    assert_eq!(summary.total, universe, "summary total != universe");
}

/// Sold tickets are taken whatever their expiry field says.
pub fn assert_sold_always_taken(tickets: &[TicketSnapshot], now: DateTime<Utc>) {
    for ticket in tickets.iter().filter(|t| t.status == TicketStatus::Sold) {
        assert!(
            availability::is_taken(ticket, now),
            "sold ticket #{} classified as available",
            ticket.number
        );
    }
}

/// Lapsed reservations are never taken.
pub fn assert_lapsed_reservations_available(tickets: &[TicketSnapshot], now: DateTime<Utc>) {
    for ticket in tickets {
        let lapsed = ticket.status == TicketStatus::Reserved
            && ticket.reserved_until.map_or(true, |until| until <= now);
        if lapsed {
            assert!(
                !availability::is_taken(ticket, now),
                "lapsed reservation #{} classified as taken",
                ticket.number
            );
        }
    }
}

/// Per-source confirmed revenue sums to the grand total.
pub fn assert_revenue_balances(report: &ReferralReport) {
    let sum: Decimal = report.sources.values().map(|s| s.confirmed_revenue).sum();
    assert_eq!(
        sum, report.total_confirmed_revenue,
        "per-source revenue {} != grand total {}",
        sum, report.total_confirmed_revenue
    );
}

/// Confirmed counters never exceed total counters.
pub fn assert_confirmed_within_totals(report: &ReferralReport) {
    for (name, totals) in &report.sources {
        assert!(
            totals.confirmed_sales <= totals.total_sales,
            "{name}: confirmed sales exceed total sales"
        );
        assert!(
            totals.confirmed_tickets <= totals.total_tickets,
            "{name}: confirmed tickets exceed total tickets"
        );
    }
}

/// Commission lines sum to the reported total.
pub fn assert_commission_balances(report: &CommissionReport) {
    let sum: Decimal = report.lines.iter().map(|l| l.commission).sum();
    assert_eq!(sum, report.total_commission, "commission lines != total");
}
