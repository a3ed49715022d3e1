//! Buyer-facing routes, addressed by raffle slug.

use std::sync::Arc;

use axum::{
    extract::State,
    http::StatusCode,
    response::IntoResponse,
};
use chrono::{DateTime, Utc};
use raffle_rules::{availability, referrals, AvailabilitySummary, Currency, RaffleStatus};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::info;

use super::extract::{Json, Path, Query};
use super::ApiState;
use crate::broadcast::PurchaseEvent;
use crate::errors::{AdminError, Result};
use crate::models::{Purchase, Raffle, Ticket};
use crate::repo::purchases::{self, NewPurchase};
use crate::repo::{raffles, settings, tickets};

#[derive(Serialize)]
pub struct PublicRaffle {
    pub name: String,
    pub slug: String,
    pub description: String,
    pub price: Decimal,
    pub currency: Currency,
    /// Price in local currency at the current exchange rate.
    pub price_local: Decimal,
    pub status: RaffleStatus,
    pub limit_date: Option<DateTime<Utc>>,
    pub winning_ticket_number: Option<i64>,
    pub progress: AvailabilitySummary,
    pub available_numbers: Vec<i64>,
}

#[derive(Deserialize)]
pub struct ReservationRequest {
    pub numbers: Vec<i64>,
}

#[derive(Serialize)]
pub struct ReservationResponse {
    pub numbers: Vec<i64>,
    pub reserved_until: DateTime<Utc>,
    /// Send back as `reservation_token` with the purchase.
    pub reservation_token: String,
}

#[derive(Serialize)]
pub struct PurchaseReceipt {
    pub purchase: Purchase,
    pub numbers: Vec<String>,
}

/// Drafts are invisible to buyers.
async fn visible_raffle(state: &ApiState, slug: &str) -> Result<Raffle> {
    let raffle = raffles::get_raffle_by_slug(&state.pool, slug).await?;
    if raffle.status == RaffleStatus::Draft {
        return Err(AdminError::NotFound("raffle"));
    }
    Ok(raffle)
}

/// `GET /public/raffles/:slug`
pub async fn show(
    State(state): State<Arc<ApiState>>,
    Path(slug): Path<String>,
) -> Result<Json<PublicRaffle>> {
    let raffle = visible_raffle(&state, &slug).await?;
    let settings = settings::load_settings(&state.pool).await?;
    let now = Utc::now();

    let snapshots: Vec<_> = tickets::list_tickets(&state.pool, raffle.id)
        .await?
        .iter()
        .map(Ticket::snapshot)
        .collect();

    let price_local = match raffle.currency {
        Currency::Usd => settings.to_local(raffle.price),
        Currency::Ves => raffle.price,
    };

    Ok(Json(PublicRaffle {
        progress: availability::summarize(&snapshots, now),
        available_numbers: availability::available_numbers(&snapshots, now),
        name: raffle.name,
        slug: raffle.slug,
        description: raffle.description,
        price: raffle.price,
        currency: raffle.currency,
        price_local,
        status: raffle.status,
        limit_date: raffle.limit_date,
        winning_ticket_number: raffle.winning_ticket_number,
    }))
}

/// `POST /public/raffles/:slug/reservations`
pub async fn reserve(
    State(state): State<Arc<ApiState>>,
    Path(slug): Path<String>,
    Json(request): Json<ReservationRequest>,
) -> Result<Json<ReservationResponse>> {
    let raffle = visible_raffle(&state, &slug).await?;
    let held = tickets::reserve(
        &state.pool,
        raffle.id,
        &request.numbers,
        Utc::now(),
        state.config.reservation_window(),
    )
    .await?;

    Ok(Json(ReservationResponse {
        numbers: held.tickets.iter().map(|t| t.number).collect(),
        reserved_until: held.until,
        reservation_token: held.token,
    }))
}

/// `POST /public/raffles/:slug/purchases?r=CODE`
///
/// The referral code rides on the share link's query string (`r`, or the
/// legacy `ref`).
pub async fn purchase(
    State(state): State<Arc<ApiState>>,
    Path(slug): Path<String>,
    Query(params): Query<Vec<(String, String)>>,
    Json(order): Json<NewPurchase>,
) -> Result<impl IntoResponse> {
    let raffle = visible_raffle(&state, &slug).await?;
    let code = referrals::code_from_query(params.iter().map(|(k, v)| (k.as_str(), v.as_str())));

    let (purchase, owned) =
        purchases::create_purchase(&state.pool, &raffle, order, code.as_deref(), Utc::now())
            .await?;

    let receivers = state
        .broadcaster
        .publish(PurchaseEvent::NewPurchase(purchase.clone()));
    info!(purchase_id = purchase.id, receivers, "new-purchase broadcast");

    let numbers = owned
        .iter()
        .map(|t| availability::display_number(t.number, raffle.min_tickets))
        .collect();
    Ok((StatusCode::CREATED, Json(PurchaseReceipt { purchase, numbers })))
}
