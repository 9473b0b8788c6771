//! Orders domain module.
//!
//! This crate contains the order pricing rules (line-item validation, exact
//! decimal subtotals and totals), implemented purely as deterministic domain
//! logic (no IO, no HTTP, no storage). Persisting an order atomically is the
//! infra layer's job.

pub mod order;

pub use order::{
    LineItemRequest, MAX_CUSTOMER_NAME_LEN, MAX_PRODUCT_NAME_LEN, Order, OrderItem, OrderStatus,
    PlaceOrder, place_order,
};
