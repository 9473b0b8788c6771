//! Product catalog domain module.
//!
//! Categories and products are read-mostly: the storefront lists and searches
//! them, orders copy their name and price, and reviews reference them by id.
//! This crate holds the catalog types and the listing rules (no IO, no HTTP,
//! no storage).

pub mod category;
pub mod product;
pub mod query;

pub use category::Category;
pub use product::{NewProduct, Product, ProductSummary};
pub use query::{CatalogQuery, FEATURED_LIMIT, ProductOrdering};
