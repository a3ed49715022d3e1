//! Axum REST API.
//!
//! Back-office routes sit behind [`auth::require_admin`]; `/health` and the
//! `/public` buyer routes are open.

mod extract;
mod payment_methods;
mod public;
mod purchases;
mod raffles;
mod referrals;
mod reports;
mod settings;
mod users;
mod ws;

use std::sync::Arc;

use axum::{
    middleware,
    response::IntoResponse,
    routing::{delete, get, post, put},
    Json, Router,
};
use serde::Serialize;
use sqlx::SqlitePool;

use crate::auth;
use crate::broadcast::Broadcaster;
use crate::config::Config;
use crate::notifier::Notifier;

pub struct ApiState {
    pub pool: SqlitePool,
    pub config: Config,
    pub broadcaster: Broadcaster,
    pub notifier: Notifier,
}

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
}

/// `GET /health`
pub async fn health() -> impl IntoResponse {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

pub fn router(state: Arc<ApiState>) -> Router {
    let admin = Router::new()
        .route("/raffles", get(raffles::list).post(raffles::create))
        .route(
            "/raffles/:id",
            get(raffles::show).put(raffles::update).delete(raffles::remove),
        )
        .route("/raffles/:id/status", post(raffles::change_status))
        .route("/raffles/:id/tickets", get(raffles::tickets))
        .route("/raffles/:id/progress", get(raffles::progress))
        .route("/raffles/:id/referrals", get(reports::referrals))
        .route("/raffles/:id/commissions", get(reports::commissions))
        .route("/raffles/:id/customers.csv", get(reports::customers_csv))
        .route("/purchases", get(purchases::list))
        .route(
            "/purchases/:id",
            get(purchases::show).delete(purchases::remove),
        )
        .route("/purchases/:id/confirm", post(purchases::confirm))
        .route("/purchases/:id/reject", post(purchases::reject))
        .route(
            "/referral-links",
            get(referrals::list).post(referrals::create),
        )
        .route("/referral-links/:id", delete(referrals::remove))
        .route("/referral-links/:id/share", get(referrals::share))
        .route(
            "/payment-methods",
            get(payment_methods::list).post(payment_methods::create),
        )
        .route(
            "/payment-methods/:id",
            put(payment_methods::update).delete(payment_methods::remove),
        )
        .route("/users", get(users::list).post(users::create))
        .route("/users/:id", put(users::update).delete(users::remove))
        .route("/settings", get(settings::show).put(settings::update))
        .route("/ws", get(ws::subscribe))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            auth::require_admin,
        ));

    let open = Router::new()
        .route("/health", get(health))
        .route("/public/raffles/:slug", get(public::show))
        .route("/public/raffles/:slug/reservations", post(public::reserve))
        .route("/public/raffles/:slug/purchases", post(public::purchase));

    admin.merge(open).with_state(state)
}
