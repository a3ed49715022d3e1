//! Purchase review: list, inspect, confirm, reject, delete.

use std::sync::Arc;

use axum::{
    extract::State,
    http::StatusCode,
};
use serde::Serialize;
use tracing::info;

use super::extract::{Json, Path, Query};
use super::ApiState;
use crate::errors::Result;
use crate::models::{Purchase, Ticket};
use crate::notifier::NotificationOutcome;
use crate::repo::purchases::{self as repo, PurchaseFilter, Rejection};
use crate::repo::{raffles, tickets};

#[derive(Serialize)]
pub struct PurchaseDetail {
    #[serde(flatten)]
    pub purchase: Purchase,
    pub tickets: Vec<Ticket>,
}

#[derive(Serialize)]
pub struct ConfirmResponse {
    pub purchase: Purchase,
    pub notification: NotificationOutcome,
}

/// `GET /purchases?raffle_id=&status=`
pub async fn list(
    State(state): State<Arc<ApiState>>,
    Query(filter): Query<PurchaseFilter>,
) -> Result<Json<Vec<Purchase>>> {
    Ok(Json(repo::list_purchases(&state.pool, &filter).await?))
}

/// `GET /purchases/:id`
pub async fn show(
    State(state): State<Arc<ApiState>>,
    Path(id): Path<i64>,
) -> Result<Json<PurchaseDetail>> {
    let purchase = repo::get_purchase(&state.pool, id).await?;
    let tickets = tickets::tickets_for_purchase(&state.pool, id).await?;
    Ok(Json(PurchaseDetail { purchase, tickets }))
}

/// `DELETE /purchases/:id`
pub async fn remove(
    State(state): State<Arc<ApiState>>,
    Path(id): Path<i64>,
) -> Result<StatusCode> {
    repo::delete_purchase(&state.pool, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// `POST /purchases/:id/confirm`
///
/// The buyer is notified after the status change is stored; a failed
/// notification is reported in the response but does not undo it.
pub async fn confirm(
    State(state): State<Arc<ApiState>>,
    Path(id): Path<i64>,
) -> Result<Json<ConfirmResponse>> {
    let purchase = repo::confirm_purchase(&state.pool, id).await?;
    let raffle = raffles::get_raffle(&state.pool, purchase.raffle_id).await?;
    let owned = tickets::tickets_for_purchase(&state.pool, id).await?;

    let notification = state
        .notifier
        .purchase_confirmed(&purchase, &raffle, &owned)
        .await;
    info!(purchase_id = id, ?notification, "buyer notification");

    Ok(Json(ConfirmResponse {
        purchase,
        notification,
    }))
}

/// `POST /purchases/:id/reject`
pub async fn reject(
    State(state): State<Arc<ApiState>>,
    Path(id): Path<i64>,
    Json(rejection): Json<Rejection>,
) -> Result<Json<Purchase>> {
    Ok(Json(repo::reject_purchase(&state.pool, id, rejection).await?))
}
