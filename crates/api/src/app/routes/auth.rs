use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Extension, rejection::JsonRejection},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
};

use storefront_auth::{ProfileUpdate, Registration};

use crate::app::services::AppServices;
use crate::app::{dto, errors};
use crate::authz::require_identity;
use crate::context::IdentityContext;

pub fn router() -> Router {
    Router::new()
        .route("/register", post(register))
        .route("/login", post(login))
        .route("/token/refresh", post(refresh))
        .route(
            "/user",
            get(current_user).put(update_user).patch(update_user),
        )
}

pub async fn register(
    Extension(services): Extension<Arc<AppServices>>,
    body: Result<Json<Registration>, JsonRejection>,
) -> axum::response::Response {
    let Json(registration) = match body {
        Ok(b) => b,
        Err(e) => return errors::json_rejection_to_response(e),
    };

    match services.accounts.register(registration).await {
        Ok((user, tokens)) => (
            StatusCode::CREATED,
            Json(dto::registration_to_json(&user, &tokens)),
        )
            .into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn login(
    Extension(services): Extension<Arc<AppServices>>,
    body: Result<Json<dto::LoginRequest>, JsonRejection>,
) -> axum::response::Response {
    let Json(body) = match body {
        Ok(b) => b,
        Err(e) => return errors::json_rejection_to_response(e),
    };

    match services.accounts.login(&body.username, &body.password).await {
        Ok(tokens) => (StatusCode::OK, Json(tokens)).into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn refresh(
    Extension(services): Extension<Arc<AppServices>>,
    body: Result<Json<dto::RefreshRequest>, JsonRejection>,
) -> axum::response::Response {
    let Json(body) = match body {
        Ok(b) => b,
        Err(e) => return errors::json_rejection_to_response(e),
    };

    match services.accounts.refresh(&body.refresh).await {
        Ok(access) => (StatusCode::OK, Json(serde_json::json!({ "access": access }))).into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn current_user(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(identity): Extension<Option<IdentityContext>>,
) -> axum::response::Response {
    let identity = match require_identity(identity) {
        Ok(i) => i,
        Err(res) => return res,
    };

    match services.accounts.current_user(identity.user_id()).await {
        Ok(user) => (StatusCode::OK, Json(dto::user_to_json(&user))).into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}

/// PUT and PATCH share this handler: every profile field is optional.
pub async fn update_user(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(identity): Extension<Option<IdentityContext>>,
    body: Result<Json<ProfileUpdate>, JsonRejection>,
) -> axum::response::Response {
    let identity = match require_identity(identity) {
        Ok(i) => i,
        Err(res) => return res,
    };
    let Json(update) = match body {
        Ok(b) => b,
        Err(e) => return errors::json_rejection_to_response(e),
    };

    match services
        .accounts
        .update_profile(identity.user_id(), update)
        .await
    {
        Ok(user) => (StatusCode::OK, Json(dto::user_to_json(&user))).into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}
