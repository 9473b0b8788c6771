//! `storefront-reviews` — product reviews.
//!
//! Pure domain: rating rules, ownership policy and the per-product aggregate.
//! Uniqueness per (product, user) needs storage and is enforced by the infra
//! layer; this crate only owns the message reported when it is violated.

pub mod rating;
pub mod review;
pub mod stats;

pub use rating::Rating;
pub use review::{
    DUPLICATE_REVIEW_MESSAGE, MAX_TITLE_LEN, NewReview, Review, ReviewAuthor, ReviewDetails,
    ReviewPatch, ensure_owner,
};
pub use stats::ReviewStats;
