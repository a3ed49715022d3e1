//! The single settings row: commission rate and exchange rate.

use raffle_rules::Settings;
use rust_decimal::Decimal;
use sqlx::SqlitePool;
use tracing::info;

use crate::errors::{AdminError, Result};
use crate::models::SettingsRow;

/// Load the current configuration snapshot.
pub async fn load_settings(pool: &SqlitePool) -> Result<Settings> {
    let SettingsRow(settings) = sqlx::query_as::<_, SettingsRow>(
        "SELECT commission_rate, exchange_rate FROM settings WHERE id = 1",
    )
    .fetch_optional(pool)
    .await?
    .ok_or(AdminError::NotFound("settings"))?;
    Ok(settings)
}

pub async fn update_settings(pool: &SqlitePool, settings: &Settings) -> Result<Settings> {
    if settings.commission_rate < Decimal::ZERO {
        return Err(AdminError::Validation(
            "commission_rate cannot be negative".to_string(),
        ));
    }
    if settings.exchange_rate <= Decimal::ZERO {
        return Err(AdminError::Validation(
            "exchange_rate must be positive".to_string(),
        ));
    }

    sqlx::query(
        r#"
        INSERT INTO settings (id, commission_rate, exchange_rate, updated_at)
        VALUES (1, ?1, ?2, strftime('%s', 'now'))
        ON CONFLICT (id) DO UPDATE
        SET commission_rate = excluded.commission_rate,
            exchange_rate = excluded.exchange_rate,
            updated_at = excluded.updated_at
        "#,
    )
    .bind(settings.commission_rate.to_string())
    .bind(settings.exchange_rate.to_string())
    .execute(pool)
    .await?;

    info!(
        commission_rate = %settings.commission_rate,
        exchange_rate = %settings.exchange_rate,
        "settings updated"
    );
    load_settings(pool).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::test_pool;

    #[tokio::test]
    async fn defaults_then_update() {
        let pool = test_pool().await;
        let defaults = load_settings(&pool).await.unwrap();
        assert_eq!(defaults.commission_rate, Decimal::ONE);
        assert_eq!(defaults.exchange_rate, Decimal::new(365, 1));

        let next = Settings {
            commission_rate: Decimal::new(25, 1),
            exchange_rate: Decimal::from(40),
        };
        assert_eq!(update_settings(&pool, &next).await.unwrap(), next);
    }

    #[tokio::test]
    async fn rejects_non_positive_exchange_rate() {
        let pool = test_pool().await;
        let err = update_settings(
            &pool,
            &Settings {
                commission_rate: Decimal::ONE,
                exchange_rate: Decimal::ZERO,
            },
        )
        .await
        .unwrap_err();
        assert!(matches!(err, AdminError::Validation(_)));
    }
}
