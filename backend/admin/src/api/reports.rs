//! Per-raffle reports: referral rollups, commissions and the customer export.

use std::sync::Arc;

use axum::{
    extract::State,
    http::header,
    response::IntoResponse,
};
use raffle_rules::{commission, referrals, CommissionReport, Currency, SourceTotals};
use rust_decimal::Decimal;
use serde::Serialize;

use super::extract::{Json, Path};
use super::ApiState;
use crate::errors::Result;
use crate::export;
use crate::models::Purchase;
use crate::repo::{purchases, raffles, settings, tickets};

#[derive(Serialize)]
pub struct SourceRow {
    pub source: String,
    #[serde(flatten)]
    pub totals: SourceTotals,
}

#[derive(Serialize)]
pub struct ReferralsResponse {
    pub raffle_id: i64,
    pub currency: Currency,
    /// Highest confirmed revenue first.
    pub sources: Vec<SourceRow>,
    pub total_confirmed_revenue: Decimal,
    pub total_confirmed_revenue_usd: Option<Decimal>,
}

#[derive(Serialize)]
pub struct CommissionsResponse {
    pub raffle_id: i64,
    pub commission_rate: Decimal,
    #[serde(flatten)]
    pub report: CommissionReport,
}

/// `GET /raffles/:id/referrals`
pub async fn referrals(
    State(state): State<Arc<ApiState>>,
    Path(id): Path<i64>,
) -> Result<Json<ReferralsResponse>> {
    let raffle = raffles::get_raffle(&state.pool, id).await?;
    let rows = purchases::purchases_for_raffle(&state.pool, id).await?;
    let settings = settings::load_settings(&state.pool).await?;

    let snapshots: Vec<_> = rows.iter().map(Purchase::snapshot).collect();
    let report = referrals::aggregate(&snapshots);
    let sources = report
        .ranked()
        .into_iter()
        .map(|(source, totals)| SourceRow {
            source: source.to_string(),
            totals: totals.clone(),
        })
        .collect();

    Ok(Json(ReferralsResponse {
        raffle_id: id,
        currency: raffle.currency,
        sources,
        total_confirmed_revenue: report.total_confirmed_revenue,
        total_confirmed_revenue_usd: settings
            .to_usd(report.total_confirmed_revenue, raffle.currency),
    }))
}

/// `GET /raffles/:id/commissions`
pub async fn commissions(
    State(state): State<Arc<ApiState>>,
    Path(id): Path<i64>,
) -> Result<Json<CommissionsResponse>> {
    raffles::get_raffle(&state.pool, id).await?;
    let rows = purchases::purchases_for_raffle(&state.pool, id).await?;
    let settings = settings::load_settings(&state.pool).await?;

    let snapshots: Vec<_> = rows.iter().map(Purchase::snapshot).collect();
    Ok(Json(CommissionsResponse {
        raffle_id: id,
        commission_rate: settings.commission_rate,
        report: commission::commissions(&snapshots, &settings),
    }))
}

/// `GET /raffles/:id/customers.csv`
pub async fn customers_csv(
    State(state): State<Arc<ApiState>>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse> {
    let raffle = raffles::get_raffle(&state.pool, id).await?;
    let rows = purchases::purchases_for_raffle(&state.pool, id).await?;
    let all_tickets = tickets::list_tickets(&state.pool, id).await?;

    let body = export::customers_csv(&raffle, &rows, &all_tickets)?;
    let disposition = format!("attachment; filename=\"{}-customers.csv\"", raffle.slug);
    Ok((
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8".to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        body,
    ))
}
