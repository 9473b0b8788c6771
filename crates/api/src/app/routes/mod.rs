use axum::Router;

pub mod auth;
pub mod orders;
pub mod products;
pub mod reviews;
pub mod system;

/// Router for everything under `/api`. Identity is optional at this level;
/// handlers that need it use [`crate::authz::require_identity`].
pub fn router() -> Router {
    Router::new()
        .nest("/auth", auth::router())
        .nest("/products", products::router())
        .nest("/orders", orders::router())
        .nest("/reviews", reviews::router())
}
