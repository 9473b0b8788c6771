use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use storefront_core::validation::{require_max_len, require_non_blank};
use storefront_core::{DomainError, DomainResult, Entity, ProductId, ReviewId, UserId};

use crate::Rating;

pub const MAX_TITLE_LEN: usize = 200;

/// Reported both by the pre-insert check and when the storage constraint on
/// (product, user) fires.
pub const DUPLICATE_REVIEW_MESSAGE: &str =
    "You have already reviewed this product. You can update your existing review instead.";

/// A user's review of one product.
///
/// At most one exists per (product_id, user_id).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Review {
    pub id: ReviewId,
    pub product_id: ProductId,
    pub user_id: UserId,
    pub rating: Rating,
    pub title: String,
    pub comment: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Entity for Review {
    type Id = ReviewId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

/// Public profile of a review's author.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReviewAuthor {
    pub id: UserId,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
}

/// A review joined with the names a client needs to render it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReviewDetails {
    pub review: Review,
    pub product_name: String,
    pub author: ReviewAuthor,
}

/// Command: submit a review for a product.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct NewReview {
    pub product: ProductId,
    pub rating: i64,
    pub title: String,
    pub comment: String,
}

impl NewReview {
    pub fn into_review(self, author: UserId, now: DateTime<Utc>) -> DomainResult<Review> {
        let rating = Rating::try_new(self.rating)?;
        validate_title(&self.title)?;
        validate_comment(&self.comment)?;

        Ok(Review {
            id: ReviewId::new(),
            product_id: self.product,
            user_id: author,
            rating,
            title: self.title,
            comment: self.comment,
            created_at: now,
            updated_at: now,
        })
    }
}

/// Changes to an existing review. `None` keeps the current value.
///
/// A full replace is a patch with every field set. The reviewed product never
/// changes.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ReviewPatch {
    pub rating: Option<i64>,
    pub title: Option<String>,
    pub comment: Option<String>,
}

impl ReviewPatch {
    /// Returns the updated review; `current` is untouched on error.
    pub fn apply(self, current: &Review, now: DateTime<Utc>) -> DomainResult<Review> {
        let mut next = current.clone();

        if let Some(rating) = self.rating {
            next.rating = Rating::try_new(rating)?;
        }
        if let Some(title) = self.title {
            validate_title(&title)?;
            next.title = title;
        }
        if let Some(comment) = self.comment {
            validate_comment(&comment)?;
            next.comment = comment;
        }
        next.updated_at = now;

        Ok(next)
    }
}

/// Only the author may modify or delete a review.
pub fn ensure_owner(actor: UserId, review: &Review) -> DomainResult<()> {
    if review.user_id != actor {
        return Err(DomainError::Unauthorized);
    }
    Ok(())
}

fn validate_title(title: &str) -> DomainResult<()> {
    require_non_blank("title", title)?;
    require_max_len("title", title, MAX_TITLE_LEN)
}

fn validate_comment(comment: &str) -> DomainResult<()> {
    require_non_blank("comment", comment)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn submit(rating: i64) -> NewReview {
        NewReview {
            product: ProductId::new(),
            rating,
            title: "Great service!".to_string(),
            comment: "Love this product!".to_string(),
        }
    }

    #[test]
    fn new_review_is_owned_by_author() {
        let author = UserId::new();
        let review = submit(5).into_review(author, Utc::now()).unwrap();
        assert_eq!(review.user_id, author);
        assert_eq!(review.rating.value(), 5);
        assert_eq!(review.created_at, review.updated_at);
    }

    #[test]
    fn new_review_rejects_bad_rating() {
        let err = submit(6).into_review(UserId::new(), Utc::now()).unwrap_err();
        assert!(matches!(err, DomainError::InvalidField { ref field, .. } if field == "rating"));
    }

    #[test]
    fn new_review_rejects_long_title() {
        let mut cmd = submit(4);
        cmd.title = "x".repeat(MAX_TITLE_LEN + 1);
        assert!(cmd.into_review(UserId::new(), Utc::now()).is_err());
    }

    #[test]
    fn patch_keeps_unset_fields() {
        let t0 = Utc::now();
        let review = submit(3).into_review(UserId::new(), t0).unwrap();
        let patch = ReviewPatch {
            rating: Some(4),
            ..ReviewPatch::default()
        };

        let t1 = t0 + chrono::Duration::seconds(5);
        let updated = patch.apply(&review, t1).unwrap();
        assert_eq!(updated.rating.value(), 4);
        assert_eq!(updated.title, review.title);
        assert_eq!(updated.created_at, t0);
        assert_eq!(updated.updated_at, t1);
    }

    #[test]
    fn patch_revalidates_rating() {
        let review = submit(3).into_review(UserId::new(), Utc::now()).unwrap();
        let patch = ReviewPatch {
            rating: Some(0),
            ..ReviewPatch::default()
        };
        assert!(patch.apply(&review, Utc::now()).is_err());
    }

    #[test]
    fn only_author_passes_ownership_check() {
        let author = UserId::new();
        let review = submit(5).into_review(author, Utc::now()).unwrap();
        assert!(ensure_owner(author, &review).is_ok());
        assert_eq!(
            ensure_owner(UserId::new(), &review),
            Err(DomainError::Unauthorized)
        );
    }
}
