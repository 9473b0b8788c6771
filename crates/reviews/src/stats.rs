use rust_decimal::{Decimal, RoundingStrategy};

use crate::Rating;

/// Per-product aggregate returned alongside the review list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReviewStats {
    /// Mean rating at two decimal places; zero when there are no reviews.
    pub average_rating: Decimal,
    pub total_reviews: u64,
}

impl ReviewStats {
    pub fn from_ratings<I>(ratings: I) -> Self
    where
        I: IntoIterator<Item = Rating>,
    {
        let (sum, count) = ratings
            .into_iter()
            .fold((0u64, 0u64), |(sum, count), r| (sum + u64::from(r.value()), count + 1));

        if count == 0 {
            return Self {
                average_rating: Decimal::ZERO,
                total_reviews: 0,
            };
        }

        let mean = Decimal::from(sum) / Decimal::from(count);
        Self {
            average_rating: mean.round_dp_with_strategy(2, RoundingStrategy::MidpointNearestEven),
            total_reviews: count,
        }
    }
}
