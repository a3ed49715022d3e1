use std::sync::Arc;

use axum::{
    extract::State,
    http::StatusCode,
    response::IntoResponse,
};

use super::extract::{Json, Path};
use super::ApiState;
use crate::errors::Result;
use crate::models::User;
use crate::repo::users::{self as repo, UserInput};

/// `GET /users`
pub async fn list(State(state): State<Arc<ApiState>>) -> Result<Json<Vec<User>>> {
    Ok(Json(repo::list_users(&state.pool).await?))
}

/// `POST /users`
pub async fn create(
    State(state): State<Arc<ApiState>>,
    Json(input): Json<UserInput>,
) -> Result<impl IntoResponse> {
    let user = repo::create_user(&state.pool, input).await?;
    Ok((StatusCode::CREATED, Json(user)))
}

/// `PUT /users/:id`
pub async fn update(
    State(state): State<Arc<ApiState>>,
    Path(id): Path<i64>,
    Json(input): Json<UserInput>,
) -> Result<Json<User>> {
    Ok(Json(repo::update_user(&state.pool, id, input).await?))
}

/// `DELETE /users/:id`
pub async fn remove(
    State(state): State<Arc<ApiState>>,
    Path(id): Path<i64>,
) -> Result<StatusCode> {
    repo::delete_user(&state.pool, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use axum::http::StatusCode;
    use serde_json::json;

    use crate::api::test_helpers::TestApp;

    #[tokio::test]
    async fn demoted_admin_loses_access() {
        let app = TestApp::new().await;
        let (status, body) = app
            .admin_json(
                "POST",
                "/users",
                Some(json!({ "name": "Eva", "email": "eva@example.com", "role": "admin" })),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED);
        let eva = body["id"].as_i64().unwrap();

        let (status, _, _) = app.send("GET", "/users", Some(eva), None).await;
        assert_eq!(status, StatusCode::OK);

        let (status, _) = app
            .admin_json(
                "PUT",
                &format!("/users/{eva}"),
                Some(json!({ "name": "Eva", "email": "eva@example.com", "role": "user" })),
            )
            .await;
        assert_eq!(status, StatusCode::OK);

        let (status, _, location) = app.send("GET", "/users", Some(eva), None).await;
        assert_eq!(status, StatusCode::SEE_OTHER);
        assert_eq!(location.as_deref(), Some("/login"));
    }

    #[tokio::test]
    async fn payment_methods_crud() {
        let app = TestApp::new().await;
        let (status, body) = app
            .admin_json(
                "POST",
                "/payment-methods",
                Some(json!({ "name": "Zelle", "details": "pagos@example.com", "currency": "USD" })),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["active"], true);
        let id = body["id"].as_i64().unwrap();

        let (status, _) = app
            .admin_json(
                "PUT",
                &format!("/payment-methods/{id}"),
                Some(json!({ "name": "Zelle", "currency": "USD", "active": false })),
            )
            .await;
        assert_eq!(status, StatusCode::OK);

        let (_, active) = app.admin_json("GET", "/payment-methods?active=true", None).await;
        assert!(active.as_array().unwrap().is_empty());
        let (_, all) = app.admin_json("GET", "/payment-methods", None).await;
        assert_eq!(all.as_array().unwrap().len(), 1);

        let (status, _) = app
            .admin_json("DELETE", &format!("/payment-methods/{id}"), None)
            .await;
        assert_eq!(status, StatusCode::NO_CONTENT);
    }
}
