use std::sync::Arc;

use axum::extract::State;
use raffle_rules::Settings;

use super::extract::Json;
use super::ApiState;
use crate::errors::Result;
use crate::repo::settings as repo;

/// `GET /settings`
pub async fn show(State(state): State<Arc<ApiState>>) -> Result<Json<Settings>> {
    Ok(Json(repo::load_settings(&state.pool).await?))
}

/// `PUT /settings`
pub async fn update(
    State(state): State<Arc<ApiState>>,
    Json(settings): Json<Settings>,
) -> Result<Json<Settings>> {
    Ok(Json(repo::update_settings(&state.pool, &settings).await?))
}
