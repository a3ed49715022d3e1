//! Database layer: pool setup, migrations and column conversions.

use std::str::FromStr;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::{
    sqlite::{SqliteConnectOptions, SqlitePoolOptions, SqliteRow},
    Row, SqlitePool,
};
use thiserror::Error;
use tracing::info;

use crate::errors::Result;

/// Establish a SQLite connection pool and run pending migrations.
pub async fn init_pool(database_url: &str) -> Result<SqlitePool> {
    let url = if database_url.starts_with("sqlite:") {
        database_url.to_string()
    } else {
        format!("sqlite:{database_url}")
    };

    let options = SqliteConnectOptions::from_str(&url)?
        .create_if_missing(true)
        .foreign_keys(true);

    // Every connection to `:memory:` is its own database, so keep exactly one
    // connection alive for the lifetime of the pool.
    let pool = if url.contains(":memory:") {
        SqlitePoolOptions::new()
            .max_connections(1)
            .min_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(options)
            .await?
    } else {
        SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(options)
            .await?
    };

    sqlx::migrate!("./migrations").run(&pool).await?;
    info!("Database migrations applied successfully");
    Ok(pool)
}

// ─────────────────────────────────────────────────────────
// Column conversions
// ─────────────────────────────────────────────────────────

pub fn to_unix(ts: DateTime<Utc>) -> i64 {
    ts.timestamp()
}

#[derive(Debug, Error)]
#[error("timestamp {0} is out of range")]
pub struct TimestampOutOfRange(pub i64);

pub fn from_unix(secs: i64) -> std::result::Result<DateTime<Utc>, TimestampOutOfRange> {
    DateTime::from_timestamp(secs, 0).ok_or(TimestampOutOfRange(secs))
}

fn decode_error<E>(column: &str, source: E) -> sqlx::Error
where
    E: std::error::Error + Send + Sync + 'static,
{
    sqlx::Error::ColumnDecode {
        index: column.to_string(),
        source: Box::new(source),
    }
}

/// Read a decimal stored as text.
pub fn decimal(row: &SqliteRow, column: &str) -> std::result::Result<Decimal, sqlx::Error> {
    let raw: String = row.try_get(column)?;
    Decimal::from_str(raw.trim()).map_err(|e| decode_error(column, e))
}

/// Read a text-backed enum through its `FromStr` impl.
pub fn text_enum<T>(row: &SqliteRow, column: &str) -> std::result::Result<T, sqlx::Error>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    let raw: String = row.try_get(column)?;
    raw.parse().map_err(|e| decode_error(column, e))
}

/// Read a unix timestamp; values chrono cannot represent fail to decode.
pub fn timestamp(row: &SqliteRow, column: &str) -> std::result::Result<DateTime<Utc>, sqlx::Error> {
    from_unix(row.try_get(column)?).map_err(|e| decode_error(column, e))
}

pub fn optional_timestamp(
    row: &SqliteRow,
    column: &str,
) -> std::result::Result<Option<DateTime<Utc>>, sqlx::Error> {
    row.try_get::<Option<i64>, _>(column)?
        .map(from_unix)
        .transpose()
        .map_err(|e| decode_error(column, e))
}

#[cfg(test)]
pub async fn test_pool() -> SqlitePool {
    init_pool("sqlite::memory:").await.unwrap()
}
