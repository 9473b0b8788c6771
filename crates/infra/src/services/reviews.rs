use std::sync::Arc;

use chrono::Utc;
use tracing::{info, instrument, warn};

use storefront_core::{DomainError, ProductId, ReviewId, UserId};
use storefront_reviews::{
    DUPLICATE_REVIEW_MESSAGE, NewReview, ReviewDetails, ReviewPatch, ReviewStats, ensure_owner,
};

use crate::repository::{
    CatalogRepository, REVIEWS_PRODUCT_USER_KEY, ReviewFilter, ReviewRepository, StoreError,
};
use crate::services::{ServiceError, ServiceResult};

/// Reviews for one product plus their aggregate.
#[derive(Debug, Clone)]
pub struct ProductReviews {
    pub reviews: Vec<ReviewDetails>,
    pub stats: ReviewStats,
}

/// Review use cases.
///
/// One review per (product, user) is enforced twice: a lookup before the
/// insert gives the friendly error, and the storage constraint catches the
/// requests that race past the lookup. Both report the same conflict.
pub struct ReviewService {
    reviews: Arc<dyn ReviewRepository>,
    catalog: Arc<dyn CatalogRepository>,
}

impl ReviewService {
    pub fn new(reviews: Arc<dyn ReviewRepository>, catalog: Arc<dyn CatalogRepository>) -> Self {
        Self { reviews, catalog }
    }

    #[instrument(skip(self, input), fields(user_id = %actor, product_id = %input.product), err)]
    pub async fn create(&self, actor: UserId, input: NewReview) -> ServiceResult<ReviewDetails> {
        let product_id = input.product;
        let review = input.into_review(actor, Utc::now())?;
        self.require_product(product_id).await?;

        if self
            .reviews
            .find_review_by_author(product_id, actor)
            .await?
            .is_some()
        {
            return Err(DomainError::conflict(DUPLICATE_REVIEW_MESSAGE).into());
        }

        match self.reviews.insert_review(&review).await {
            Ok(()) => {}
            Err(e) if e.is_unique_violation_of(REVIEWS_PRODUCT_USER_KEY) => {
                warn!("concurrent duplicate review rejected by storage constraint");
                return Err(DomainError::conflict(DUPLICATE_REVIEW_MESSAGE).into());
            }
            Err(e) => return Err(e.into()),
        }

        info!(review_id = %review.id, rating = review.rating.value(), "review created");
        self.get(review.id).await
    }

    pub async fn get(&self, id: ReviewId) -> ServiceResult<ReviewDetails> {
        self.reviews
            .find_review(id)
            .await?
            .ok_or_else(|| DomainError::not_found("review").into())
    }

    pub async fn list(&self) -> ServiceResult<Vec<ReviewDetails>> {
        Ok(self.reviews.list_reviews(ReviewFilter::All).await?)
    }

    /// Full replace and partial update both go through here; the rating is
    /// re-validated whenever it is present.
    #[instrument(skip(self, patch), fields(user_id = %actor, review_id = %id), err)]
    pub async fn update(
        &self,
        actor: UserId,
        id: ReviewId,
        patch: ReviewPatch,
    ) -> ServiceResult<ReviewDetails> {
        let mut details = self.get(id).await?;
        ensure_owner(actor, &details.review)?;

        let updated = patch.apply(&details.review, Utc::now())?;
        self.reviews
            .update_review(&updated)
            .await
            .map_err(|e| not_found_as_domain(e, "review"))?;

        details.review = updated;
        Ok(details)
    }

    #[instrument(skip(self), fields(user_id = %actor, review_id = %id), err)]
    pub async fn delete(&self, actor: UserId, id: ReviewId) -> ServiceResult<()> {
        let details = self.get(id).await?;
        ensure_owner(actor, &details.review)?;

        self.reviews
            .delete_review(id)
            .await
            .map_err(|e| not_found_as_domain(e, "review"))?;
        info!("review deleted");
        Ok(())
    }

    pub async fn product_reviews(&self, product_id: ProductId) -> ServiceResult<ProductReviews> {
        self.require_product(product_id).await?;
        let reviews = self
            .reviews
            .list_reviews(ReviewFilter::Product(product_id))
            .await?;
        let stats = ReviewStats::from_ratings(reviews.iter().map(|d| d.review.rating));
        Ok(ProductReviews { reviews, stats })
    }

    pub async fn reviews_by(&self, author: UserId) -> ServiceResult<Vec<ReviewDetails>> {
        Ok(self.reviews.list_reviews(ReviewFilter::Author(author)).await?)
    }

    async fn require_product(&self, id: ProductId) -> ServiceResult<()> {
        match self.catalog.find_product(id).await? {
            Some(_) => Ok(()),
            None => Err(DomainError::not_found("product").into()),
        }
    }
}

/// A row removed between our read and write is reported as a plain 404.
fn not_found_as_domain(err: StoreError, what: &str) -> ServiceError {
    match err {
        StoreError::NotFound => DomainError::not_found(what).into(),
        other => other.into(),
    }
}
