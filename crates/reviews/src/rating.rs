use serde::Serialize;

use storefront_core::{DomainError, DomainResult, ValueObject};

pub const MIN_RATING: u8 = 1;
pub const MAX_RATING: u8 = 5;

/// Star rating in `1..=5`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct Rating(u8);

impl ValueObject for Rating {}

impl Rating {
    /// Accepts any integer so out-of-range input (`0`, `6`, `-3`) gets the
    /// same field error instead of a deserialization failure.
    pub fn try_new(value: i64) -> DomainResult<Self> {
        if value < i64::from(MIN_RATING) || value > i64::from(MAX_RATING) {
            return Err(DomainError::field(
                "rating",
                "Rating must be between 1 and 5.",
            ));
        }
        Ok(Self(value as u8))
    }

    pub fn value(self) -> u8 {
        self.0
    }
}

impl From<Rating> for i16 {
    fn from(value: Rating) -> Self {
        i16::from(value.0)
    }
}
