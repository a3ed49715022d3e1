//! Referral links and their share URLs.

use std::sync::Arc;

use axum::{
    extract::State,
    http::StatusCode,
    response::IntoResponse,
};
use raffle_rules::referrals::share_link;
use serde::{Deserialize, Serialize};

use super::extract::{Json, Path, Query};
use super::ApiState;
use crate::errors::Result;
use crate::models::ReferralLink;
use crate::repo::raffles;
use crate::repo::referral_links::{self as repo, NewReferralLink};

#[derive(Deserialize)]
pub struct ShareQuery {
    pub raffle_id: i64,
}

#[derive(Serialize)]
pub struct ShareResponse {
    pub code: String,
    pub raffle_slug: String,
    pub url: String,
}

/// `GET /referral-links`
pub async fn list(State(state): State<Arc<ApiState>>) -> Result<Json<Vec<ReferralLink>>> {
    Ok(Json(repo::list_links(&state.pool).await?))
}

/// `POST /referral-links`
pub async fn create(
    State(state): State<Arc<ApiState>>,
    Json(new): Json<NewReferralLink>,
) -> Result<impl IntoResponse> {
    let link = repo::create_link(&state.pool, new).await?;
    Ok((StatusCode::CREATED, Json(link)))
}

/// `DELETE /referral-links/:id`
pub async fn remove(
    State(state): State<Arc<ApiState>>,
    Path(id): Path<i64>,
) -> Result<StatusCode> {
    repo::delete_link(&state.pool, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// `GET /referral-links/:id/share?raffle_id=`
pub async fn share(
    State(state): State<Arc<ApiState>>,
    Path(id): Path<i64>,
    Query(query): Query<ShareQuery>,
) -> Result<Json<ShareResponse>> {
    let link = repo::get_link(&state.pool, id).await?;
    let raffle = raffles::get_raffle(&state.pool, query.raffle_id).await?;
    let url = share_link(&state.config.public_domain, &raffle.slug, &link.code);
    Ok(Json(ShareResponse {
        code: link.code,
        raffle_slug: raffle.slug,
        url,
    }))
}

#[cfg(test)]
mod tests {
    use axum::http::StatusCode;
    use serde_json::json;

    use crate::api::test_helpers::TestApp;
    use crate::test_support::active_raffle;

    #[tokio::test]
    async fn create_share_and_delete() {
        let app = TestApp::new().await;
        let raffle = active_raffle(&app.state.pool, 10).await;

        let (status, link) = app
            .admin_json(
                "POST",
                "/referral-links",
                Some(json!({ "name": "Instagram", "code": "insta" })),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(link["code"], "INSTA");
        let id = link["id"].as_i64().unwrap();

        let (status, share) = app
            .admin_json(
                "GET",
                &format!("/referral-links/{id}/share?raffle_id={}", raffle.id),
                None,
            )
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            share["url"],
            format!("https://rifas.example.com/rifa/{}?r=INSTA", raffle.slug)
        );

        let (status, _) = app
            .admin_json(
                "POST",
                "/referral-links",
                Some(json!({ "name": "Copy", "code": "INSTA" })),
            )
            .await;
        assert_eq!(status, StatusCode::CONFLICT);

        let (status, _) = app
            .admin_json("DELETE", &format!("/referral-links/{id}"), None)
            .await;
        assert_eq!(status, StatusCode::NO_CONTENT);
        let (_, all) = app.admin_json("GET", "/referral-links", None).await;
        assert!(all.as_array().unwrap().is_empty());
    }
}
