//! Purchase intake, review (confirm / reject) and deletion.
//!
//! A purchase owns its tickets from the moment it is submitted: they are
//! marked `sold` and linked to the pending purchase, so no other buyer can
//! take them while payment is being verified. Rejection or deletion puts
//! them back in the pool.

use chrono::{DateTime, Utc};
use raffle_rules::{availability, lifecycle, referrals, PurchaseStatus, TicketStatus};
use rand::seq::SliceRandom;
use rust_decimal::Decimal;
use serde::Deserialize;
use sqlx::{Sqlite, SqliteExecutor, SqlitePool, Transaction};
use tracing::info;

use crate::errors::{AdminError, Result};
use crate::models::{Purchase, Raffle, Ticket};
use crate::repo::{clean, referral_links, required, tickets};

const SELECT_PURCHASE: &str = r#"
    SELECT id, raffle_id, buyer_name, buyer_email, buyer_phone, buyer_id_number,
           payment_method_id, payment_reference, payment_proof_url, ticket_count, amount,
           status, rejection_reason, rejection_comment, referral_code, referral_name,
           created_at, updated_at
    FROM   purchases
"#;

/// A buyer's order as submitted by the purchase form.
#[derive(Debug, Clone, Deserialize)]
pub struct NewPurchase {
    pub buyer_name: String,
    pub buyer_email: String,
    pub buyer_phone: String,
    pub buyer_id_number: Option<String>,
    pub payment_method_id: Option<i64>,
    pub payment_reference: Option<String>,
    pub payment_proof_url: Option<String>,
    /// Specific numbers the buyer picked (possibly reserved beforehand).
    #[serde(default)]
    pub ticket_numbers: Vec<i64>,
    /// How many random numbers to draw when `ticket_numbers` is empty.
    pub ticket_count: Option<u32>,
    /// Token returned by the reservation that holds `ticket_numbers`.
    #[serde(default)]
    pub reservation_token: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PurchaseFilter {
    pub raffle_id: Option<i64>,
    pub status: Option<PurchaseStatus>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Rejection {
    pub reason: String,
    pub comment: Option<String>,
}

// ─────────────────────────────────────────────────────────
// Reads
// ─────────────────────────────────────────────────────────

pub async fn list_purchases(pool: &SqlitePool, filter: &PurchaseFilter) -> Result<Vec<Purchase>> {
    let sql = format!(
        "{SELECT_PURCHASE}
         WHERE (?1 IS NULL OR raffle_id = ?1) AND (?2 IS NULL OR status = ?2)
         ORDER BY created_at DESC, id DESC"
    );
    let rows = sqlx::query_as::<_, Purchase>(&sql)
        .bind(filter.raffle_id)
        .bind(filter.status.map(|s| s.as_str()))
        .fetch_all(pool)
        .await?;
    Ok(rows)
}

/// Every purchase of a raffle, oldest first.
pub async fn purchases_for_raffle(pool: &SqlitePool, raffle_id: i64) -> Result<Vec<Purchase>> {
    let sql = format!("{SELECT_PURCHASE} WHERE raffle_id = ?1 ORDER BY created_at ASC, id ASC");
    let rows = sqlx::query_as::<_, Purchase>(&sql)
        .bind(raffle_id)
        .fetch_all(pool)
        .await?;
    Ok(rows)
}

pub async fn get_purchase<'e, E>(executor: E, id: i64) -> Result<Purchase>
where
    E: SqliteExecutor<'e>,
{
    let sql = format!("{SELECT_PURCHASE} WHERE id = ?1");
    sqlx::query_as::<_, Purchase>(&sql)
        .bind(id)
        .fetch_optional(executor)
        .await?
        .ok_or(AdminError::NotFound("purchase"))
}

// ─────────────────────────────────────────────────────────
// Intake
// ─────────────────────────────────────────────────────────

/// Choose the tickets for an order.
///
/// Explicit numbers must not be sold or owned by another purchase. A number
/// under a live reservation is accepted only with that reservation's
/// `token`. Otherwise `count` numbers are drawn at random from the tickets
/// available at `now`.
pub fn allocate<'a>(
    tickets: &'a [Ticket],
    numbers: &[i64],
    count: Option<u32>,
    token: Option<&str>,
    now: DateTime<Utc>,
) -> Result<Vec<&'a Ticket>> {
    if !numbers.is_empty() {
        tickets::validate_numbers(numbers)?;
        let wanted = tickets::pick(tickets, numbers)?;
        if let Some(t) = wanted.iter().find(|t| {
            let held_by_other = availability::is_taken(&t.snapshot(), now)
                && (token.is_none() || t.reservation_token.as_deref() != token);
            t.purchase_id.is_some() || t.status == TicketStatus::Sold || held_by_other
        }) {
            return Err(AdminError::Conflict(format!(
                "ticket #{} is not available",
                t.number
            )));
        }
        return Ok(wanted);
    }

    let count = match count {
        Some(n) if n > 0 && (n as usize) <= tickets::MAX_NUMBERS_PER_REQUEST => n as usize,
        _ => {
            return Err(AdminError::Validation(format!(
                "ticket_count must be between 1 and {}",
                tickets::MAX_NUMBERS_PER_REQUEST
            )))
        }
    };

    let pool: Vec<&Ticket> = tickets
        .iter()
        .filter(|t| t.purchase_id.is_none() && !availability::is_taken(&t.snapshot(), now))
        .collect();
    if pool.len() < count {
        return Err(AdminError::Conflict(format!(
            "only {} tickets available",
            pool.len()
        )));
    }

    let mut chosen: Vec<&Ticket> = pool
        .choose_multiple(&mut rand::thread_rng(), count)
        .copied()
        .collect();
    chosen.sort_by_key(|t| t.number);
    Ok(chosen)
}

/// Record a pending purchase for an active raffle and hand it its tickets.
///
/// `referral_code` comes from the share link; unknown codes are dropped
/// rather than failing the order.
pub async fn create_purchase(
    pool: &SqlitePool,
    raffle: &Raffle,
    new: NewPurchase,
    referral_code: Option<&str>,
    now: DateTime<Utc>,
) -> Result<(Purchase, Vec<Ticket>)> {
    if !raffle.status.is_selling() {
        return Err(AdminError::Conflict(format!(
            "raffle is {}, not accepting purchases",
            raffle.status
        )));
    }
    let buyer_name = required(&new.buyer_name, "buyer_name")?;
    let buyer_email = required(&new.buyer_email, "buyer_email")?;
    if !buyer_email.contains('@') {
        return Err(AdminError::Validation("buyer_email is invalid".to_string()));
    }
    let buyer_phone = required(&new.buyer_phone, "buyer_phone")?;

    let referral = match referral_code.map(referrals::normalize_code) {
        Some(Ok(code)) => referral_links::find_by_code(pool, &code).await?,
        Some(Err(_)) | None => None,
    };

    let mut tx = pool.begin().await?;

    let all = tickets::list_tickets(&mut *tx, raffle.id).await?;
    let chosen = allocate(
        &all,
        &new.ticket_numbers,
        new.ticket_count,
        new.reservation_token.as_deref(),
        now,
    )?;
    let ticket_count = u32::try_from(chosen.len())
        .map_err(|_| AdminError::Validation("too many tickets".to_string()))?;
    let amount = raffle.price * Decimal::from(ticket_count);
    let ids: Vec<i64> = chosen.iter().map(|t| t.id).collect();

    let id = sqlx::query(
        r#"
        INSERT INTO purchases
            (raffle_id, buyer_name, buyer_email, buyer_phone, buyer_id_number,
             payment_method_id, payment_reference, payment_proof_url, ticket_count, amount,
             referral_code, referral_name)
        VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)
        "#,
    )
    .bind(raffle.id)
    .bind(&buyer_name)
    .bind(&buyer_email)
    .bind(&buyer_phone)
    .bind(clean(new.buyer_id_number))
    .bind(new.payment_method_id)
    .bind(clean(new.payment_reference))
    .bind(clean(new.payment_proof_url))
    .bind(ticket_count)
    .bind(amount.to_string())
    .bind(referral.as_ref().map(|r| r.code.as_str()))
    .bind(referral.as_ref().map(|r| r.name.as_str()))
    .execute(&mut *tx)
    .await
    .map_err(|e| AdminError::from_write(e, "purchase"))?
    .last_insert_rowid();

    for ticket_id in &ids {
        mark_sold(&mut tx, *ticket_id, id).await?;
    }

    let purchase = get_purchase(&mut *tx, id).await?;
    let owned = tickets::tickets_for_purchase(&mut *tx, id).await?;
    tx.commit().await?;

    info!(
        purchase_id = id,
        raffle_id = raffle.id,
        tickets = ticket_count,
        referral = purchase.referral_code.as_deref().unwrap_or("-"),
        "purchase recorded"
    );
    Ok((purchase, owned))
}

async fn mark_sold(tx: &mut Transaction<'_, Sqlite>, ticket_id: i64, purchase_id: i64) -> Result<()> {
    let affected = sqlx::query(
        r#"
        UPDATE tickets
        SET    status = 'sold', reserved_until = NULL, reservation_token = NULL,
               purchase_id = ?1
        WHERE  id = ?2 AND purchase_id IS NULL AND status != 'sold'
        "#,
    )
    .bind(purchase_id)
    .bind(ticket_id)
    .execute(&mut **tx)
    .await?
    .rows_affected();
    if affected == 0 {
        return Err(AdminError::Conflict(
            "a requested ticket was taken concurrently".to_string(),
        ));
    }
    Ok(())
}

// ─────────────────────────────────────────────────────────
// Review
// ─────────────────────────────────────────────────────────

pub async fn confirm_purchase(pool: &SqlitePool, id: i64) -> Result<Purchase> {
    let purchase = get_purchase(pool, id).await?;
    lifecycle::check_purchase_transition(purchase.status, PurchaseStatus::Confirmed)?;

    sqlx::query(
        r#"
        UPDATE purchases
        SET    status = 'confirmed', updated_at = strftime('%s', 'now')
        WHERE  id = ?1
        "#,
    )
    .bind(id)
    .execute(pool)
    .await?;

    info!(purchase_id = id, "purchase confirmed");
    get_purchase(pool, id).await
}

/// Reject a pending purchase and release its tickets.
pub async fn reject_purchase(pool: &SqlitePool, id: i64, rejection: Rejection) -> Result<Purchase> {
    let reason = required(&rejection.reason, "reason")?;
    let purchase = get_purchase(pool, id).await?;
    lifecycle::check_purchase_transition(purchase.status, PurchaseStatus::Rejected)?;

    let mut tx = pool.begin().await?;
    sqlx::query(
        r#"
        UPDATE purchases
        SET    status = 'rejected', rejection_reason = ?1, rejection_comment = ?2,
               updated_at = strftime('%s', 'now')
        WHERE  id = ?3
        "#,
    )
    .bind(&reason)
    .bind(clean(rejection.comment))
    .bind(id)
    .execute(&mut *tx)
    .await?;
    let released = tickets::release_for_purchase(&mut tx, id).await?;
    let purchase = get_purchase(&mut *tx, id).await?;
    tx.commit().await?;

    info!(purchase_id = id, released, %reason, "purchase rejected");
    Ok(purchase)
}

/// Delete a purchase in any state, releasing its tickets first.
pub async fn delete_purchase(pool: &SqlitePool, id: i64) -> Result<()> {
    let mut tx = pool.begin().await?;
    get_purchase(&mut *tx, id).await?;
    let released = tickets::release_for_purchase(&mut tx, id).await?;
    sqlx::query("DELETE FROM purchases WHERE id = ?1")
        .bind(id)
        .execute(&mut *tx)
        .await?;
    tx.commit().await?;

    info!(purchase_id = id, released, "purchase deleted");
    Ok(())
}
