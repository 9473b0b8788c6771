//! HTTP API application wiring (Axum router + service wiring).
//!
//! - `services.rs`: storage selection and service construction
//! - `routes/`: HTTP routes + handlers (one file per area)
//! - `dto.rs`: request/response DTOs and JSON mapping helpers
//! - `errors.rs`: consistent error responses

use std::sync::Arc;

use axum::{Extension, Router, routing::get};
use tower::ServiceBuilder;

use storefront_auth::Hs256JwtValidator;
use storefront_infra::{AppConfig, ServiceResult};

use crate::middleware;

pub mod dto;
pub mod errors;
pub mod routes;
pub mod services;

pub use services::AppServices;

/// Build the full HTTP router (public entrypoint used by `main.rs`).
pub async fn build_app(config: &AppConfig) -> ServiceResult<Router> {
    let services = services::build_services(config).await?;
    Ok(build_app_with(Arc::new(services), config))
}

/// Router over already-constructed services.
pub fn build_app_with(services: Arc<AppServices>, config: &AppConfig) -> Router {
    let jwt = Arc::new(Hs256JwtValidator::new(config.jwt_secret.as_bytes()));
    let auth_state = middleware::AuthState { jwt };

    let api = routes::router().layer(
        ServiceBuilder::new()
            .layer(Extension(services))
            .layer(axum::middleware::from_fn_with_state(
                auth_state,
                middleware::identity_middleware,
            )),
    );

    Router::new()
        .route("/health", get(routes::system::health))
        .nest("/api", api)
}
