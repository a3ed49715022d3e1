//! Referral link queries.

use rand::Rng;
use raffle_rules::referrals;
use serde::Deserialize;
use sqlx::SqlitePool;
use tracing::info;

use crate::errors::{AdminError, Result};
use crate::models::ReferralLink;
use crate::repo::required;

const GENERATED_CODE_LEN: usize = 8;

/// Generated codes draw uniformly from uppercase letters and digits.
const CODE_CHARSET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

#[derive(Debug, Clone, Deserialize)]
pub struct NewReferralLink {
    /// Campaign or seller name.
    pub name: String,
    /// Generated when absent.
    pub code: Option<String>,
}

/// Random upper-case alphanumeric code.
pub fn generate_code() -> String {
    let mut rng = rand::thread_rng();
    (0..GENERATED_CODE_LEN)
        .map(|_| char::from(CODE_CHARSET[rng.gen_range(0..CODE_CHARSET.len())]))
        .collect()
}

pub async fn list_links(pool: &SqlitePool) -> Result<Vec<ReferralLink>> {
    let rows = sqlx::query_as::<_, ReferralLink>(
        "SELECT id, name, code, created_at FROM referral_links ORDER BY name ASC, id ASC",
    )
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

pub async fn get_link(pool: &SqlitePool, id: i64) -> Result<ReferralLink> {
    sqlx::query_as::<_, ReferralLink>(
        "SELECT id, name, code, created_at FROM referral_links WHERE id = ?1",
    )
    .bind(id)
    .fetch_optional(pool)
    .await?
    .ok_or(AdminError::NotFound("referral link"))
}

/// Look up a link by its normalised code.
pub async fn find_by_code(pool: &SqlitePool, code: &str) -> Result<Option<ReferralLink>> {
    let row = sqlx::query_as::<_, ReferralLink>(
        "SELECT id, name, code, created_at FROM referral_links WHERE code = ?1",
    )
    .bind(code)
    .fetch_optional(pool)
    .await?;
    Ok(row)
}

pub async fn create_link(pool: &SqlitePool, new: NewReferralLink) -> Result<ReferralLink> {
    let name = required(&new.name, "name")?;
    let code = match new.code.as_deref().map(str::trim).filter(|c| !c.is_empty()) {
        Some(raw) => referrals::normalize_code(raw)?,
        None => generate_code(),
    };

    let id = sqlx::query("INSERT INTO referral_links (name, code) VALUES (?1, ?2)")
        .bind(&name)
        .bind(&code)
        .execute(pool)
        .await
        .map_err(|e| AdminError::from_write(e, "referral code"))?
        .last_insert_rowid();

    info!(link_id = id, %code, %name, "referral link created");
    get_link(pool, id).await
}

/// Delete a link. Purchases keep the code and name they were attributed with.
pub async fn delete_link(pool: &SqlitePool, id: i64) -> Result<()> {
    let affected = sqlx::query("DELETE FROM referral_links WHERE id = ?1")
        .bind(id)
        .execute(pool)
        .await?
        .rows_affected();
    if affected == 0 {
        return Err(AdminError::NotFound("referral link"));
    }
    Ok(())
}
