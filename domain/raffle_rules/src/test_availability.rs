use chrono::{DateTime, Duration, TimeZone, Utc};

use crate::availability::{available_numbers, is_taken, partition, summarize, taken_count};
use crate::invariants::{
    assert_counts_cover_universe, assert_lapsed_reservations_available, assert_sold_always_taken,
};
use crate::types::{TicketSnapshot, TicketStatus};

fn fixed_now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap()
}

fn sold(number: i64) -> TicketSnapshot {
    TicketSnapshot {
        number,
        status: TicketStatus::Sold,
        reserved_until: None,
    }
}

fn reserved(number: i64, until: DateTime<Utc>) -> TicketSnapshot {
    TicketSnapshot {
        number,
        status: TicketStatus::Reserved,
        reserved_until: Some(until),
    }
}

fn available(number: i64) -> TicketSnapshot {
    TicketSnapshot {
        number,
        status: TicketStatus::Available,
        reserved_until: None,
    }
}

#[test]
fn test_three_ticket_scenario() {
    let now = fixed_now();
    let tickets = vec![
        sold(1),
        reserved(2, now + Duration::hours(1)),
        reserved(3, now - Duration::hours(1)),
    ];

    assert_eq!(taken_count(&tickets, now), 2);

    let (free, taken) = partition(&tickets, now);
    assert_eq!(free.len(), 1);
    assert_eq!(free[0].number, 3);
    assert_eq!(taken.iter().map(|t| t.number).collect::<Vec<_>>(), vec![1, 2]);

    assert_eq!(available_numbers(&tickets, now), vec![3]);

    let summary = summarize(&tickets, now);
    assert_eq!(summary.taken, 2);
    assert_eq!(summary.available, 1);
    assert_eq!(summary.progress_percent, 66);
    assert_counts_cover_universe(&summary, 3);
}

#[test]
fn test_sold_is_taken_regardless_of_expiry() {
    let now = fixed_now();
    let mut stale = sold(1);
    stale.reserved_until = Some(now - Duration::days(30));
    let mut future = sold(2);
    future.reserved_until = Some(now + Duration::days(30));
    let tickets = vec![stale, future, sold(3)];

    assert_sold_always_taken(&tickets, now);
    assert_eq!(taken_count(&tickets, now), 3);
}

#[test]
fn test_lapsed_reservations_are_available() {
    let now = fixed_now();
    let tickets: Vec<_> = (1..=10)
        .map(|n| reserved(n, now - Duration::minutes(n)))
        .chain([reserved(11, now)])
        .collect();

    assert_lapsed_reservations_available(&tickets, now);
    assert_eq!(taken_count(&tickets, now), 0);
}

#[test]
fn test_same_tickets_read_at_different_instants() {
    let now = fixed_now();
    let tickets = vec![reserved(1, now + Duration::minutes(10)), available(2)];

    assert!(is_taken(&tickets[0], now));
    assert!(!is_taken(&tickets[0], now + Duration::minutes(10)));
    assert_eq!(summarize(&tickets, now).taken, 1);
    assert_eq!(summarize(&tickets, now + Duration::hours(1)).taken, 0);
}

#[test]
fn test_counts_cover_universe_for_mixed_sets() {
    let now = fixed_now();
    let tickets: Vec<_> = (1..=100)
        .map(|n| match n % 4 {
            0 => sold(n),
            1 => reserved(n, now + Duration::minutes(n)),
            2 => reserved(n, now - Duration::minutes(n)),
            _ => available(n),
        })
        .collect();

    let summary = summarize(&tickets, now);
    assert_counts_cover_universe(&summary, 100);
    assert_eq!(summary.taken, 50);
    assert_sold_always_taken(&tickets, now);
    assert_lapsed_reservations_available(&tickets, now);
}
