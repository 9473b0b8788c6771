//! Storage ports.
//!
//! Each trait covers one aggregate's persistence. [`crate::InMemoryDatabase`]
//! and [`crate::PgDatabase`] implement all of them, and the services depend
//! only on these traits.

use async_trait::async_trait;
use thiserror::Error;

use storefront_auth::User;
use storefront_core::{CategoryId, OrderId, ProductId, ReviewId, UserId};
use storefront_orders::Order;
use storefront_products::{CatalogQuery, Category, Product};
use storefront_reviews::{Review, ReviewDetails};

/// Name of the storage constraint enforcing one review per (product, user).
pub const REVIEWS_PRODUCT_USER_KEY: &str = "reviews_product_user_key";

/// Name of the storage constraint enforcing unique usernames.
pub const USERS_USERNAME_KEY: &str = "users_username_key";

pub type StoreResult<T> = Result<T, StoreError>;

#[derive(Debug, Error)]
pub enum StoreError {
    /// A unique constraint rejected the write (Postgres SQLSTATE `23505`).
    #[error("unique constraint '{constraint}' violated")]
    UniqueViolation { constraint: String },

    /// The row addressed by an update or delete does not exist.
    #[error("row not found")]
    NotFound,

    /// A stored row could not be mapped back into a domain value.
    #[error("stored data is invalid: {0}")]
    Corrupt(String),

    #[error("database error: {0}")]
    Database(#[source] sqlx::Error),

    #[error("lock poisoned")]
    Poisoned,
}

impl StoreError {
    pub fn is_unique_violation_of(&self, name: &str) -> bool {
        matches!(self, StoreError::UniqueViolation { constraint } if constraint == name)
    }
}

/// Which reviews a listing returns. Results are newest first.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReviewFilter {
    All,
    Product(ProductId),
    Author(UserId),
}

#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Fails with [`StoreError::UniqueViolation`] on a taken username.
    async fn insert_user(&self, user: &User) -> StoreResult<()>;

    async fn find_user(&self, id: UserId) -> StoreResult<Option<User>>;

    async fn find_user_by_username(&self, username: &str) -> StoreResult<Option<User>>;

    async fn update_user(&self, user: &User) -> StoreResult<()>;
}

#[async_trait]
pub trait CatalogRepository: Send + Sync {
    /// Active products matching `query`, in its order.
    async fn list_products(&self, query: &CatalogQuery) -> StoreResult<Vec<Product>>;

    /// Lookup by id regardless of the active flag.
    async fn find_product(&self, id: ProductId) -> StoreResult<Option<Product>>;

    async fn list_categories(&self) -> StoreResult<Vec<Category>>;

    async fn find_category(&self, id: CategoryId) -> StoreResult<Option<Category>>;

    /// Insert unless the slug exists; returns the stored category either way.
    async fn ensure_category(&self, category: &Category) -> StoreResult<Category>;

    /// Insert unless the slug exists; returns whether a row was written.
    async fn ensure_product(&self, product: &Product) -> StoreResult<bool>;
}

#[async_trait]
pub trait OrderRepository: Send + Sync {
    /// Persist the order and all of its items atomically.
    async fn insert_order(&self, order: &Order) -> StoreResult<()>;

    async fn find_order(&self, id: OrderId) -> StoreResult<Option<Order>>;

    /// Newest first.
    async fn list_orders(&self) -> StoreResult<Vec<Order>>;
}

#[async_trait]
pub trait ReviewRepository: Send + Sync {
    /// Fails with [`StoreError::UniqueViolation`] naming
    /// [`REVIEWS_PRODUCT_USER_KEY`] when (product, user) is already reviewed.
    async fn insert_review(&self, review: &Review) -> StoreResult<()>;

    async fn find_review(&self, id: ReviewId) -> StoreResult<Option<ReviewDetails>>;

    async fn find_review_by_author(
        &self,
        product_id: ProductId,
        user_id: UserId,
    ) -> StoreResult<Option<Review>>;

    async fn update_review(&self, review: &Review) -> StoreResult<()>;

    async fn delete_review(&self, id: ReviewId) -> StoreResult<()>;

    async fn list_reviews(&self, filter: ReviewFilter) -> StoreResult<Vec<ReviewDetails>>;
}
