//! # Availability
//!
//! Decides which tickets of a raffle are currently taken.
//!
//! A ticket is taken when it is `Sold`, or when it is `Reserved` and its
//! reservation expires strictly after `now`. Everything else is available,
//! including reservations that have lapsed but whose stored status was never
//! reset. Nothing here writes back: expiry is evaluated on every read.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::types::{TicketSnapshot, TicketStatus};

/// Availability figures for one raffle at one instant.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct AvailabilitySummary {
    pub total: usize,
    pub taken: usize,
    pub available: usize,
    /// Share of the ticket universe taken, rounded down to a whole percent.
    pub progress_percent: u8,
}

/// Whether `ticket` counts against availability at `now`.
pub fn is_taken(ticket: &TicketSnapshot, now: DateTime<Utc>) -> bool {
    match ticket.status {
        TicketStatus::Sold => true,
        TicketStatus::Reserved => ticket.reserved_until.is_some_and(|until| until > now),
        TicketStatus::Available => false,
    }
}

/// Whether a stored reservation has lapsed and may be reset to `Available`.
pub fn is_expired_reservation(ticket: &TicketSnapshot, now: DateTime<Utc>) -> bool {
    ticket.status == TicketStatus::Reserved && !is_taken(ticket, now)
}

/// Number of taken tickets. Empty input yields zero.
pub fn taken_count<'a, I>(tickets: I, now: DateTime<Utc>) -> usize
where
    I: IntoIterator<Item = &'a TicketSnapshot>,
{
    tickets.into_iter().filter(|t| is_taken(t, now)).count()
}

/// Split tickets into `(available, taken)`, preserving input order.
pub fn partition(
    tickets: &[TicketSnapshot],
    now: DateTime<Utc>,
) -> (Vec<&TicketSnapshot>, Vec<&TicketSnapshot>) {
    tickets.iter().partition(|t| !is_taken(t, now))
}

/// Numbers of the tickets available at `now`, in input order.
pub fn available_numbers(tickets: &[TicketSnapshot], now: DateTime<Utc>) -> Vec<i64> {
    tickets
        .iter()
        .filter(|t| !is_taken(t, now))
        .map(|t| t.number)
        .collect()
}

/// Summarise a raffle's full ticket set.
pub fn summarize(tickets: &[TicketSnapshot], now: DateTime<Utc>) -> AvailabilitySummary {
    let total = tickets.len();
    let taken = taken_count(tickets, now);
    AvailabilitySummary {
        total,
        taken,
        available: total - taken,
        progress_percent: progress_percent(taken, total),
    }
}

fn progress_percent(taken: usize, total: usize) -> u8 {
    if total == 0 {
        return 0;
    }
    // taken <= total, so the quotient is at most 100.
    u8::try_from(taken.saturating_mul(100) / total).unwrap_or(100)
}

/// Render a ticket number zero-padded to the width of the largest number in
/// a universe of `universe` tickets, e.g. `7` of `1000` → `"0007"`.
pub fn display_number(number: i64, universe: i64) -> String {
    let width = universe.max(1).to_string().len();
    format!("{number:0width$}")
}
