//! Ticket queries: universe generation, reservations and release.
//!
//! Whether a ticket is taken is never read from the `status` column alone;
//! callers run [`raffle_rules::availability`] over the rows.

use std::collections::HashMap;

use chrono::{DateTime, Duration, Utc};
use raffle_rules::availability::{self, AvailabilitySummary};
use raffle_rules::TicketSnapshot;
use rand::distributions::Alphanumeric;
use rand::Rng;
use sqlx::{Sqlite, SqliteExecutor, SqlitePool, Transaction};
use tracing::info;

use crate::db::to_unix;
use crate::errors::{AdminError, Result};
use crate::models::Ticket;
use crate::repo::raffles;

/// Most numbers a single reservation or purchase may name.
pub const MAX_NUMBERS_PER_REQUEST: usize = 500;

const RESERVATION_TOKEN_LEN: usize = 32;

/// Numbers held for one buyer. The token must accompany the purchase that
/// claims them while the hold is live.
#[derive(Debug, Clone)]
pub struct Reservation {
    pub token: String,
    pub until: DateTime<Utc>,
    pub tickets: Vec<Ticket>,
}

fn new_reservation_token() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(RESERVATION_TOKEN_LEN)
        .map(char::from)
        .collect()
}

/// Insert tickets `1..=count` for a raffle.
pub async fn insert_universe(
    tx: &mut Transaction<'_, Sqlite>,
    raffle_id: i64,
    count: i64,
) -> Result<u64> {
    let inserted = sqlx::query(
        r#"
        WITH RECURSIVE seq(n) AS (
            SELECT 1
            UNION ALL
            SELECT n + 1 FROM seq WHERE n < ?2
        )
        INSERT INTO tickets (raffle_id, number)
        SELECT ?1, n FROM seq
        "#,
    )
    .bind(raffle_id)
    .bind(count)
    .execute(&mut **tx)
    .await?
    .rows_affected();
    Ok(inserted)
}

/// All tickets of a raffle, ordered by number.
pub async fn list_tickets<'e, E>(executor: E, raffle_id: i64) -> Result<Vec<Ticket>>
where
    E: SqliteExecutor<'e>,
{
    let rows = sqlx::query_as::<_, Ticket>(
        r#"
        SELECT id, raffle_id, number, status, reserved_until, purchase_id, reservation_token
        FROM   tickets
        WHERE  raffle_id = ?1
        ORDER  BY number ASC
        "#,
    )
    .bind(raffle_id)
    .fetch_all(executor)
    .await?;
    Ok(rows)
}

pub async fn tickets_for_purchase<'e, E>(executor: E, purchase_id: i64) -> Result<Vec<Ticket>>
where
    E: SqliteExecutor<'e>,
{
    let rows = sqlx::query_as::<_, Ticket>(
        r#"
        SELECT id, raffle_id, number, status, reserved_until, purchase_id, reservation_token
        FROM   tickets
        WHERE  purchase_id = ?1
        ORDER  BY number ASC
        "#,
    )
    .bind(purchase_id)
    .fetch_all(executor)
    .await?;
    Ok(rows)
}

/// Availability of a raffle's tickets at `now`.
pub async fn summary(pool: &SqlitePool, raffle_id: i64, now: DateTime<Utc>) -> Result<AvailabilitySummary> {
    let snapshots: Vec<TicketSnapshot> = list_tickets(pool, raffle_id)
        .await?
        .iter()
        .map(Ticket::snapshot)
        .collect();
    Ok(availability::summarize(&snapshots, now))
}

/// Reject empty, oversized or repeated number lists.
pub fn validate_numbers(numbers: &[i64]) -> Result<()> {
    if numbers.is_empty() {
        return Err(AdminError::Validation(
            "at least one ticket number is required".to_string(),
        ));
    }
    if numbers.len() > MAX_NUMBERS_PER_REQUEST {
        return Err(AdminError::Validation(format!(
            "at most {MAX_NUMBERS_PER_REQUEST} tickets per request"
        )));
    }
    let mut seen = std::collections::HashSet::with_capacity(numbers.len());
    if let Some(dup) = numbers.iter().find(|n| !seen.insert(**n)) {
        return Err(AdminError::Validation(format!(
            "ticket #{dup} is listed twice"
        )));
    }
    Ok(())
}

/// Look up the requested numbers among a raffle's tickets.
pub fn pick<'a>(tickets: &'a [Ticket], numbers: &[i64]) -> Result<Vec<&'a Ticket>> {
    let by_number: HashMap<i64, &Ticket> = tickets.iter().map(|t| (t.number, t)).collect();
    numbers
        .iter()
        .map(|n| {
            by_number
                .get(n)
                .copied()
                .ok_or_else(|| AdminError::Validation(format!("ticket #{n} does not exist")))
        })
        .collect()
}

/// Hold specific numbers for a buyer until `now + window`.
///
/// Every number must exist and be free at `now`: not sold, not under a live
/// reservation, not owned by a purchase.
pub async fn reserve(
    pool: &SqlitePool,
    raffle_id: i64,
    numbers: &[i64],
    now: DateTime<Utc>,
    window: Duration,
) -> Result<Reservation> {
    validate_numbers(numbers)?;
    let raffle = raffles::get_raffle(pool, raffle_id).await?;
    if !raffle.status.is_selling() {
        return Err(AdminError::Conflict(format!(
            "raffle is {}, not accepting reservations",
            raffle.status
        )));
    }

    let until = now + window;
    let token = new_reservation_token();
    let mut tx = pool.begin().await?;

    let tickets = list_tickets(&mut *tx, raffle_id).await?;
    let wanted = pick(&tickets, numbers)?;
    if let Some(t) = wanted
        .iter()
        .find(|t| t.purchase_id.is_some() || availability::is_taken(&t.snapshot(), now))
    {
        return Err(AdminError::Conflict(format!(
            "ticket #{} is not available",
            t.number
        )));
    }

    let ids: Vec<i64> = wanted.iter().map(|t| t.id).collect();
    for id in &ids {
        // Re-check in the WHERE clause so a concurrent sale is not overwritten.
        let affected = sqlx::query(
            r#"
            UPDATE tickets
            SET    status = 'reserved', reserved_until = ?1, reservation_token = ?4
            WHERE  id = ?2 AND purchase_id IS NULL
              AND  (status = 'available'
                    OR (status = 'reserved' AND (reserved_until IS NULL OR reserved_until <= ?3)))
            "#,
        )
        .bind(to_unix(until))
        .bind(id)
        .bind(to_unix(now))
        .bind(&token)
        .execute(&mut *tx)
        .await?
        .rows_affected();
        if affected == 0 {
            return Err(AdminError::Conflict(
                "a requested ticket was taken concurrently".to_string(),
            ));
        }
    }

    let reserved = list_tickets(&mut *tx, raffle_id)
        .await?
        .into_iter()
        .filter(|t| ids.contains(&t.id))
        .collect();
    tx.commit().await?;

    info!(raffle_id, count = ids.len(), until = %until, "tickets reserved");
    Ok(Reservation {
        token,
        until,
        tickets: reserved,
    })
}

/// Return a purchase's tickets to the pool.
pub async fn release_for_purchase(
    tx: &mut Transaction<'_, Sqlite>,
    purchase_id: i64,
) -> Result<u64> {
    let released = sqlx::query(
        r#"
        UPDATE tickets
        SET    status = 'available', reserved_until = NULL, reservation_token = NULL,
               purchase_id = NULL
        WHERE  purchase_id = ?1
        "#,
    )
    .bind(purchase_id)
    .execute(&mut **tx)
    .await?
    .rows_affected();
    Ok(released)
}

/// Reset lapsed reservations to `available`.
///
/// Cosmetic only: reads treat lapsed reservations as available either way.
pub async fn reset_expired_reservations(pool: &SqlitePool, now: DateTime<Utc>) -> Result<u64> {
    let reset = sqlx::query(
        r#"
        UPDATE tickets
        SET    status = 'available', reserved_until = NULL, reservation_token = NULL
        WHERE  status = 'reserved' AND purchase_id IS NULL
          AND  (reserved_until IS NULL OR reserved_until <= ?1)
        "#,
    )
    .bind(to_unix(now))
    .execute(pool)
    .await?
    .rows_affected();
    Ok(reset)
}
