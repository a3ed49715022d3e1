use std::sync::Arc;

use axum::{
    extract::State,
    http::StatusCode,
    response::IntoResponse,
};
use serde::Deserialize;

use super::extract::{Json, Path, Query};
use super::ApiState;
use crate::errors::Result;
use crate::models::PaymentMethod;
use crate::repo::payment_methods::{self as repo, PaymentMethodInput};

#[derive(Default, Deserialize)]
pub struct ListQuery {
    #[serde(default)]
    pub active: bool,
}

/// `GET /payment-methods?active=true`
pub async fn list(
    State(state): State<Arc<ApiState>>,
    Query(query): Query<ListQuery>,
) -> Result<Json<Vec<PaymentMethod>>> {
    Ok(Json(repo::list_methods(&state.pool, query.active).await?))
}

/// `POST /payment-methods`
pub async fn create(
    State(state): State<Arc<ApiState>>,
    Json(input): Json<PaymentMethodInput>,
) -> Result<impl IntoResponse> {
    let method = repo::create_method(&state.pool, input).await?;
    Ok((StatusCode::CREATED, Json(method)))
}

/// `PUT /payment-methods/:id`
pub async fn update(
    State(state): State<Arc<ApiState>>,
    Path(id): Path<i64>,
    Json(input): Json<PaymentMethodInput>,
) -> Result<Json<PaymentMethod>> {
    Ok(Json(repo::update_method(&state.pool, id, input).await?))
}

/// `DELETE /payment-methods/:id`
pub async fn remove(
    State(state): State<Arc<ApiState>>,
    Path(id): Path<i64>,
) -> Result<StatusCode> {
    repo::delete_method(&state.pool, id).await?;
    Ok(StatusCode::NO_CONTENT)
}
