//! Fixtures shared by the backend's test modules.

use raffle_rules::{Currency, RaffleStatus};
use rust_decimal::Decimal;
use sqlx::SqlitePool;

use crate::models::Raffle;
use crate::repo::purchases::NewPurchase;
use crate::repo::raffles::{self, NewRaffle};

/// A draft raffle with `tickets` numbers at 10 USD each.
pub fn new_raffle(name: &str, tickets: i64) -> NewRaffle {
    NewRaffle {
        name: name.to_string(),
        slug: None,
        description: String::new(),
        price: Decimal::from(10),
        currency: Currency::Usd,
        min_tickets: tickets,
        limit_date: None,
    }
}

/// Create a raffle and move it straight to `active`.
pub async fn active_raffle(pool: &SqlitePool, tickets: i64) -> Raffle {
    let count = raffles::list_raffles(pool).await.unwrap().len();
    let draft = raffles::create_raffle(pool, new_raffle(&format!("Rifa {}", count + 1), tickets))
        .await
        .unwrap();
    raffles::set_status(pool, draft.id, RaffleStatus::Active, None)
        .await
        .unwrap()
}

/// A one-ticket order placed by `email`.
pub fn new_purchase(email: &str) -> NewPurchase {
    NewPurchase {
        buyer_name: "Ana Pérez".to_string(),
        buyer_email: email.to_string(),
        buyer_phone: "+584141234567".to_string(),
        buyer_id_number: Some("V-12345678".to_string()),
        payment_method_id: None,
        payment_reference: Some("REF-001".to_string()),
        payment_proof_url: None,
        ticket_numbers: Vec::new(),
        ticket_count: Some(1),
        reservation_token: None,
    }
}
