//! Raffle management and ticket availability.

use std::sync::Arc;

use axum::{
    extract::State,
    http::StatusCode,
    response::IntoResponse,
};
use chrono::{DateTime, Utc};
use raffle_rules::{availability, AvailabilitySummary, RaffleStatus, TicketStatus};
use serde::{Deserialize, Serialize};

use super::extract::{Json, Path, Query};
use super::ApiState;
use crate::errors::Result;
use crate::models::{Raffle, Ticket};
use crate::repo::raffles::{self as repo, NewRaffle, RaffleUpdate};
use crate::repo::tickets;

#[derive(Serialize)]
pub struct RaffleDetail {
    #[serde(flatten)]
    pub raffle: Raffle,
    pub progress: AvailabilitySummary,
}

#[derive(Deserialize)]
pub struct StatusChange {
    pub status: RaffleStatus,
    pub winning_ticket_number: Option<i64>,
}

#[derive(Default, Deserialize)]
pub struct TicketQuery {
    /// Only list tickets a buyer could take right now.
    #[serde(default)]
    pub available: bool,
}

/// A ticket as the board shows it: stored state plus the effective one.
#[derive(Serialize)]
pub struct TicketView {
    pub number: i64,
    pub label: String,
    pub status: TicketStatus,
    pub taken: bool,
    pub reserved_until: Option<DateTime<Utc>>,
    pub purchase_id: Option<i64>,
}

#[derive(Serialize)]
pub struct TicketsResponse {
    pub raffle_id: i64,
    pub summary: AvailabilitySummary,
    pub tickets: Vec<TicketView>,
}

fn ticket_view(ticket: &Ticket, universe: i64, now: DateTime<Utc>) -> TicketView {
    TicketView {
        number: ticket.number,
        label: availability::display_number(ticket.number, universe),
        status: ticket.status,
        taken: availability::is_taken(&ticket.snapshot(), now),
        reserved_until: ticket.reserved_until,
        purchase_id: ticket.purchase_id,
    }
}

/// `GET /raffles`
pub async fn list(State(state): State<Arc<ApiState>>) -> Result<Json<Vec<Raffle>>> {
    Ok(Json(repo::list_raffles(&state.pool).await?))
}

/// `POST /raffles`
pub async fn create(
    State(state): State<Arc<ApiState>>,
    Json(new): Json<NewRaffle>,
) -> Result<impl IntoResponse> {
    let raffle = repo::create_raffle(&state.pool, new).await?;
    Ok((StatusCode::CREATED, Json(raffle)))
}

/// `GET /raffles/:id`
pub async fn show(
    State(state): State<Arc<ApiState>>,
    Path(id): Path<i64>,
) -> Result<Json<RaffleDetail>> {
    let raffle = repo::get_raffle(&state.pool, id).await?;
    let progress = tickets::summary(&state.pool, id, Utc::now()).await?;
    Ok(Json(RaffleDetail { raffle, progress }))
}

/// `PUT /raffles/:id`
pub async fn update(
    State(state): State<Arc<ApiState>>,
    Path(id): Path<i64>,
    Json(update): Json<RaffleUpdate>,
) -> Result<Json<Raffle>> {
    Ok(Json(repo::update_raffle(&state.pool, id, update).await?))
}

/// `DELETE /raffles/:id`
pub async fn remove(
    State(state): State<Arc<ApiState>>,
    Path(id): Path<i64>,
) -> Result<StatusCode> {
    repo::delete_raffle(&state.pool, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// `POST /raffles/:id/status`
pub async fn change_status(
    State(state): State<Arc<ApiState>>,
    Path(id): Path<i64>,
    Json(change): Json<StatusChange>,
) -> Result<Json<Raffle>> {
    let raffle =
        repo::set_status(&state.pool, id, change.status, change.winning_ticket_number).await?;
    Ok(Json(raffle))
}

/// `GET /raffles/:id/tickets`
pub async fn tickets(
    State(state): State<Arc<ApiState>>,
    Path(id): Path<i64>,
    Query(query): Query<TicketQuery>,
) -> Result<Json<TicketsResponse>> {
    let raffle = repo::get_raffle(&state.pool, id).await?;
    let all = tickets::list_tickets(&state.pool, id).await?;
    let now = Utc::now();

    let snapshots: Vec<_> = all.iter().map(Ticket::snapshot).collect();
    let summary = availability::summarize(&snapshots, now);
    let tickets = all
        .iter()
        .map(|t| ticket_view(t, raffle.min_tickets, now))
        .filter(|view| !query.available || !view.taken)
        .collect();

    Ok(Json(TicketsResponse {
        raffle_id: id,
        summary,
        tickets,
    }))
}

/// `GET /raffles/:id/progress`
pub async fn progress(
    State(state): State<Arc<ApiState>>,
    Path(id): Path<i64>,
) -> Result<Json<AvailabilitySummary>> {
    repo::get_raffle(&state.pool, id).await?;
    Ok(Json(tickets::summary(&state.pool, id, Utc::now()).await?))
}
