//! Payment method queries.

use raffle_rules::Currency;
use serde::Deserialize;
use sqlx::SqlitePool;

use crate::errors::{AdminError, Result};
use crate::models::PaymentMethod;
use crate::repo::required;

const SELECT_METHOD: &str =
    "SELECT id, name, details, currency, active, created_at FROM payment_methods";

#[derive(Debug, Clone, Deserialize)]
pub struct PaymentMethodInput {
    pub name: String,
    #[serde(default)]
    pub details: String,
    pub currency: Currency,
    #[serde(default = "default_active")]
    pub active: bool,
}

fn default_active() -> bool {
    true
}

pub async fn list_methods(pool: &SqlitePool, only_active: bool) -> Result<Vec<PaymentMethod>> {
    let sql = format!("{SELECT_METHOD} WHERE (?1 = 0 OR active = 1) ORDER BY name ASC, id ASC");
    let rows = sqlx::query_as::<_, PaymentMethod>(&sql)
        .bind(only_active)
        .fetch_all(pool)
        .await?;
    Ok(rows)
}

pub async fn get_method(pool: &SqlitePool, id: i64) -> Result<PaymentMethod> {
    let sql = format!("{SELECT_METHOD} WHERE id = ?1");
    sqlx::query_as::<_, PaymentMethod>(&sql)
        .bind(id)
        .fetch_optional(pool)
        .await?
        .ok_or(AdminError::NotFound("payment method"))
}

pub async fn create_method(pool: &SqlitePool, input: PaymentMethodInput) -> Result<PaymentMethod> {
    let name = required(&input.name, "name")?;
    let id = sqlx::query(
        "INSERT INTO payment_methods (name, details, currency, active) VALUES (?1, ?2, ?3, ?4)",
    )
    .bind(&name)
    .bind(input.details.trim())
    .bind(input.currency.as_str())
    .bind(input.active)
    .execute(pool)
    .await?
    .last_insert_rowid();
    get_method(pool, id).await
}

pub async fn update_method(
    pool: &SqlitePool,
    id: i64,
    input: PaymentMethodInput,
) -> Result<PaymentMethod> {
    let name = required(&input.name, "name")?;
    let affected = sqlx::query(
        "UPDATE payment_methods SET name = ?1, details = ?2, currency = ?3, active = ?4 WHERE id = ?5",
    )
    .bind(&name)
    .bind(input.details.trim())
    .bind(input.currency.as_str())
    .bind(input.active)
    .bind(id)
    .execute(pool)
    .await?
    .rows_affected();
    if affected == 0 {
        return Err(AdminError::NotFound("payment method"));
    }
    get_method(pool, id).await
}

/// Delete a method; purchases that used it keep their payment reference.
pub async fn delete_method(pool: &SqlitePool, id: i64) -> Result<()> {
    let affected = sqlx::query("DELETE FROM payment_methods WHERE id = ?1")
        .bind(id)
        .execute(pool)
        .await?
        .rows_affected();
    if affected == 0 {
        return Err(AdminError::NotFound("payment method"));
    }
    Ok(())
}
