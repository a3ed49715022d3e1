//! Raffle administration service: entry point.
//!
//! Serves the back-office REST API (raffles, tickets, purchases, referral
//! links, reports) and the buyer-facing purchase routes, and runs a
//! background janitor that tidies lapsed ticket reservations.

mod api;
mod auth;
mod broadcast;
mod config;
mod db;
mod errors;
mod export;
mod janitor;
mod models;
mod notifier;
mod repo;
#[cfg(test)]
mod test_support;

use std::sync::Arc;

use reqwest::Client;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;
use tracing_subscriber::EnvFilter;

use broadcast::Broadcaster;
use config::Config;
use notifier::Notifier;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialise structured logging (RUST_LOG controls verbosity).
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    // Load optional .env file (ignored if missing).
    let _ = dotenvy::dotenv();

    let config = Config::from_env().map_err(|e| anyhow::anyhow!("{e}"))?;

    let pool = db::init_pool(&config.database_url).await?;

    // HTTP client for the messaging provider.
    let client = Client::builder()
        .timeout(std::time::Duration::from_secs(30))
        .build()?;

    // ─── Background janitor ───────────────────────────────
    tokio::spawn(janitor::run(pool.clone(), config.sweep_interval_secs));

    // ─── REST API ─────────────────────────────────────────
    let state = Arc::new(api::ApiState {
        notifier: Notifier::from_config(&config, client),
        broadcaster: Broadcaster::new(),
        config: config.clone(),
        pool,
    });

    let app = api::router(state)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http());

    let addr = format!("0.0.0.0:{}", config.api_port);
    info!("API listening on http://{addr}");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
