//! Background task that resets lapsed reservations to `available`.
//!
//! Purely cosmetic: every read already treats an expired reservation as
//! available, so the counts callers see do not depend on this loop running.

use std::time::Duration;

use chrono::Utc;
use sqlx::SqlitePool;
use tracing::{debug, error, info};

use crate::repo::tickets;

/// Run the sweep forever, once every `interval_secs`. Zero disables it.
pub async fn run(pool: SqlitePool, interval_secs: u64) {
    if interval_secs == 0 {
        info!("Reservation janitor disabled");
        return;
    }
    info!("Reservation janitor starting, every {interval_secs}s");

    let mut ticker = tokio::time::interval(Duration::from_secs(interval_secs));
    loop {
        ticker.tick().await;
        if let Err(e) = sweep_once(&pool).await {
            error!("Reservation sweep error: {e}");
        }
    }
}

/// Perform a single sweep. Returns how many tickets were reset.
pub async fn sweep_once(pool: &SqlitePool) -> crate::errors::Result<u64> {
    let reset = tickets::reset_expired_reservations(pool, Utc::now()).await?;
    if reset > 0 {
        info!(reset, "Lapsed reservations returned to the pool");
    } else {
        debug!("No lapsed reservations");
    }
    Ok(reset)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::test_pool;
    use crate::test_support::active_raffle;
    use chrono::Duration as ChronoDuration;

    #[tokio::test]
    async fn sweep_does_not_change_observed_availability() {
        let pool = test_pool().await;
        let raffle = active_raffle(&pool, 4).await;
        let past = Utc::now() - ChronoDuration::hours(2);
        tickets::reserve(&pool, raffle.id, &[1, 2], past, ChronoDuration::minutes(15))
            .await
            .unwrap();

        let before = tickets::summary(&pool, raffle.id, Utc::now()).await.unwrap();
        assert_eq!(sweep_once(&pool).await.unwrap(), 2);
        let after = tickets::summary(&pool, raffle.id, Utc::now()).await.unwrap();

        assert_eq!(before, after);
        assert_eq!(after.available, 4);
        assert_eq!(sweep_once(&pool).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn zero_interval_returns_immediately() {
        let pool = test_pool().await;
        run(pool, 0).await;
    }
}
