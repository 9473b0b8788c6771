//! Infrastructure layer: storage, configuration and the application services
//! that sit between the HTTP API and the pure domain crates.

pub mod config;
pub mod in_memory;
pub mod postgres;
pub mod repository;
pub mod seed;
pub mod services;

pub use config::{AppConfig, ConfigError};
pub use in_memory::InMemoryDatabase;
pub use postgres::PgDatabase;
pub use repository::{
    CatalogRepository, OrderRepository, ReviewFilter, ReviewRepository, StoreError, StoreResult,
    UserRepository,
};
pub use services::{
    AccountService, CatalogService, OrderService, ProductReviews, ReviewService, ServiceError,
    ServiceResult,
};
