//! Raffle queries and status transitions.

use chrono::{DateTime, Utc};
use raffle_rules::{lifecycle, Currency, PurchaseStatus, RaffleStatus, TicketStatus};
use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer};
use sqlx::SqlitePool;
use tracing::info;

use crate::db::to_unix;
use crate::errors::{AdminError, Result};
use crate::models::Raffle;
use crate::repo::{required, tickets};

/// Upper bound on the ticket universe of a single raffle.
pub const MAX_TICKETS: i64 = 100_000;

const SELECT_RAFFLE: &str = r#"
    SELECT id, name, slug, description, price, currency, min_tickets, status,
           winning_ticket_number, limit_date, created_at, updated_at
    FROM   raffles
"#;

#[derive(Debug, Clone, Deserialize)]
pub struct NewRaffle {
    pub name: String,
    /// Derived from `name` when absent.
    pub slug: Option<String>,
    #[serde(default)]
    pub description: String,
    pub price: Decimal,
    pub currency: Currency,
    pub min_tickets: i64,
    pub limit_date: Option<DateTime<Utc>>,
}

/// Editable fields of a draft raffle.
#[derive(Debug, Clone, Deserialize)]
pub struct RaffleUpdate {
    pub name: Option<String>,
    pub description: Option<String>,
    pub price: Option<Decimal>,
    pub currency: Option<Currency>,
    pub min_tickets: Option<i64>,
    /// Absent keeps the current date; `null` clears it.
    #[serde(default, deserialize_with = "present")]
    pub limit_date: Option<Option<DateTime<Utc>>>,
}

/// Tell an explicit `null` apart from a missing key.
fn present<'de, D, T>(deserializer: D) -> std::result::Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

/// URL-safe slug: lowercase ASCII letters and digits joined by single dashes.
pub fn slugify(name: &str) -> String {
    let mut slug = String::with_capacity(name.len());
    for c in name.chars().flat_map(char::to_lowercase) {
        let c = match c {
            'á' | 'à' | 'ä' | 'â' => 'a',
            'é' | 'è' | 'ë' | 'ê' => 'e',
            'í' | 'ì' | 'ï' | 'î' => 'i',
            'ó' | 'ò' | 'ö' | 'ô' => 'o',
            'ú' | 'ù' | 'ü' | 'û' => 'u',
            'ñ' => 'n',
            other => other,
        };
        if c.is_ascii_alphanumeric() {
            slug.push(c);
        } else if !slug.is_empty() && !slug.ends_with('-') {
            slug.push('-');
        }
    }
    slug.trim_end_matches('-').to_string()
}

fn validate_price(price: Decimal) -> Result<()> {
    if price <= Decimal::ZERO {
        return Err(AdminError::Validation("price must be positive".to_string()));
    }
    Ok(())
}

fn validate_universe(min_tickets: i64) -> Result<()> {
    if !(1..=MAX_TICKETS).contains(&min_tickets) {
        return Err(AdminError::Validation(format!(
            "min_tickets must be between 1 and {MAX_TICKETS}"
        )));
    }
    Ok(())
}

// ─────────────────────────────────────────────────────────
// Reads
// ─────────────────────────────────────────────────────────

pub async fn list_raffles(pool: &SqlitePool) -> Result<Vec<Raffle>> {
    let sql = format!("{SELECT_RAFFLE} ORDER BY created_at DESC, id DESC");
    Ok(sqlx::query_as::<_, Raffle>(&sql).fetch_all(pool).await?)
}

pub async fn get_raffle(pool: &SqlitePool, id: i64) -> Result<Raffle> {
    let sql = format!("{SELECT_RAFFLE} WHERE id = ?1");
    sqlx::query_as::<_, Raffle>(&sql)
        .bind(id)
        .fetch_optional(pool)
        .await?
        .ok_or(AdminError::NotFound("raffle"))
}

pub async fn get_raffle_by_slug(pool: &SqlitePool, slug: &str) -> Result<Raffle> {
    let sql = format!("{SELECT_RAFFLE} WHERE slug = ?1");
    sqlx::query_as::<_, Raffle>(&sql)
        .bind(slug)
        .fetch_optional(pool)
        .await?
        .ok_or(AdminError::NotFound("raffle"))
}

// ─────────────────────────────────────────────────────────
// Writes
// ─────────────────────────────────────────────────────────

/// Create a draft raffle together with its full ticket universe.
pub async fn create_raffle(pool: &SqlitePool, new: NewRaffle) -> Result<Raffle> {
    let name = required(&new.name, "name")?;
    let slug = slugify(new.slug.as_deref().unwrap_or(&name));
    if slug.is_empty() {
        return Err(AdminError::Validation(
            "slug must contain letters or digits".to_string(),
        ));
    }
    validate_price(new.price)?;
    validate_universe(new.min_tickets)?;

    let mut tx = pool.begin().await?;

    let id = sqlx::query(
        r#"
        INSERT INTO raffles (name, slug, description, price, currency, min_tickets, limit_date)
        VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
        "#,
    )
    .bind(&name)
    .bind(&slug)
    .bind(new.description.trim())
    .bind(new.price.to_string())
    .bind(new.currency.as_str())
    .bind(new.min_tickets)
    .bind(new.limit_date.map(to_unix))
    .execute(&mut *tx)
    .await
    .map_err(|e| AdminError::from_write(e, "raffle slug"))?
    .last_insert_rowid();

    tickets::insert_universe(&mut tx, id, new.min_tickets).await?;
    tx.commit().await?;

    info!(raffle_id = id, %slug, tickets = new.min_tickets, "raffle created");
    get_raffle(pool, id).await
}

/// Edit a raffle. Only drafts are editable; changing `min_tickets`
/// regenerates the ticket universe.
pub async fn update_raffle(pool: &SqlitePool, id: i64, update: RaffleUpdate) -> Result<Raffle> {
    let current = get_raffle(pool, id).await?;
    if current.status != RaffleStatus::Draft {
        return Err(AdminError::Conflict(
            "only draft raffles can be edited".to_string(),
        ));
    }

    let name = match update.name {
        Some(name) => required(&name, "name")?,
        None => current.name,
    };
    let price = update.price.unwrap_or(current.price);
    validate_price(price)?;
    let min_tickets = update.min_tickets.unwrap_or(current.min_tickets);
    validate_universe(min_tickets)?;
    let description = update.description.unwrap_or(current.description);

    let mut tx = pool.begin().await?;

    sqlx::query(
        r#"
        UPDATE raffles
        SET    name = ?1, description = ?2, price = ?3, currency = ?4, min_tickets = ?5,
               limit_date = ?6, updated_at = strftime('%s', 'now')
        WHERE  id = ?7
        "#,
    )
    .bind(&name)
    .bind(description.trim())
    .bind(price.to_string())
    .bind(update.currency.unwrap_or(current.currency).as_str())
    .bind(min_tickets)
    .bind(update.limit_date.unwrap_or(current.limit_date).map(to_unix))
    .bind(id)
    .execute(&mut *tx)
    .await?;

    if min_tickets != current.min_tickets {
        sqlx::query("DELETE FROM tickets WHERE raffle_id = ?1")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        tickets::insert_universe(&mut tx, id, min_tickets).await?;
    }

    tx.commit().await?;
    get_raffle(pool, id).await
}

/// Delete a draft raffle and its tickets.
pub async fn delete_raffle(pool: &SqlitePool, id: i64) -> Result<()> {
    let raffle = get_raffle(pool, id).await?;
    if raffle.status != RaffleStatus::Draft {
        return Err(AdminError::Conflict(
            "only draft raffles can be deleted".to_string(),
        ));
    }
    sqlx::query("DELETE FROM raffles WHERE id = ?1")
        .bind(id)
        .execute(pool)
        .await?;
    info!(raffle_id = id, "raffle deleted");
    Ok(())
}

/// Move a raffle to `to`. A winning number may only accompany `Finished` and
/// must name a sold ticket of a confirmed purchase.
pub async fn set_status(
    pool: &SqlitePool,
    id: i64,
    to: RaffleStatus,
    winning_number: Option<i64>,
) -> Result<Raffle> {
    let raffle = get_raffle(pool, id).await?;
    lifecycle::check_raffle_transition(raffle.status, to)?;

    if let Some(number) = winning_number {
        if to != RaffleStatus::Finished {
            return Err(AdminError::Validation(
                "a winning ticket can only be set when finishing a raffle".to_string(),
            ));
        }
        check_winner(pool, id, number).await?;
    }

    sqlx::query(
        r#"
        UPDATE raffles
        SET    status = ?1, winning_ticket_number = COALESCE(?2, winning_ticket_number),
               updated_at = strftime('%s', 'now')
        WHERE  id = ?3
        "#,
    )
    .bind(to.as_str())
    .bind(winning_number)
    .bind(id)
    .execute(pool)
    .await?;

    info!(raffle_id = id, from = %raffle.status, %to, "raffle status changed");
    get_raffle(pool, id).await
}

async fn check_winner(pool: &SqlitePool, raffle_id: i64, number: i64) -> Result<()> {
    let row: Option<(String, Option<String>)> = sqlx::query_as(
        r#"
        SELECT t.status, p.status
        FROM   tickets t
        LEFT   JOIN purchases p ON p.id = t.purchase_id
        WHERE  t.raffle_id = ?1 AND t.number = ?2
        "#,
    )
    .bind(raffle_id)
    .bind(number)
    .fetch_optional(pool)
    .await?;

    let Some((ticket_status, purchase_status)) = row else {
        return Err(AdminError::Validation(format!(
            "ticket #{number} does not exist"
        )));
    };
    let sold = ticket_status.parse::<TicketStatus>()? == TicketStatus::Sold;
    let confirmed = purchase_status
        .map(|s| s.parse::<PurchaseStatus>())
        .transpose()?
        == Some(PurchaseStatus::Confirmed);
    if !(sold && confirmed) {
        return Err(AdminError::Validation(format!(
            "ticket #{number} was not sold through a confirmed purchase"
        )));
    }
    Ok(())
}
