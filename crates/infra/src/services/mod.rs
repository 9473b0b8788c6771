//! Application services: the use cases behind each HTTP endpoint.
//!
//! Services hold only `Arc<dyn …Repository>` handles, so the same code runs
//! against [`crate::InMemoryDatabase`] in tests and [`crate::PgDatabase`] in
//! production.

use thiserror::Error;

use storefront_auth::AuthError;
use storefront_core::DomainError;

use crate::repository::StoreError;

mod accounts;
mod catalog;
mod orders;
mod reviews;

pub use accounts::AccountService;
pub use catalog::CatalogService;
pub use orders::OrderService;
pub use reviews::{ProductReviews, ReviewService};

pub type ServiceResult<T> = Result<T, ServiceError>;

#[derive(Debug, Error)]
pub enum ServiceError {
    /// Deterministic business failure (validation, not found, conflict, ownership).
    #[error(transparent)]
    Domain(#[from] DomainError),

    /// Missing or bad credentials.
    #[error(transparent)]
    Auth(#[from] AuthError),

    /// Storage fault.
    #[error(transparent)]
    Store(#[from] StoreError),
}
