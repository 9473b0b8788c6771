use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{
        Extension, Path, Query,
        rejection::{JsonRejection, QueryRejection},
    },
    http::StatusCode,
    response::IntoResponse,
    routing::get,
};

use storefront_core::{ProductId, ReviewId};
use storefront_reviews::{NewReview, ReviewPatch};

use crate::app::services::AppServices;
use crate::app::{dto, errors};
use crate::authz::require_identity;
use crate::context::IdentityContext;

pub fn router() -> Router {
    Router::new()
        .route("/", get(list_reviews).post(create_review))
        .route("/product_reviews", get(product_reviews))
        .route("/my_reviews", get(my_reviews))
        .route(
            "/:id",
            get(get_review)
                .put(replace_review)
                .patch(patch_review)
                .delete(delete_review),
        )
}

pub async fn list_reviews(
    Extension(services): Extension<Arc<AppServices>>,
) -> axum::response::Response {
    match services.reviews.list().await {
        Ok(reviews) => (StatusCode::OK, Json(dto::reviews_to_json(&reviews))).into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn create_review(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(identity): Extension<Option<IdentityContext>>,
    body: Result<Json<NewReview>, JsonRejection>,
) -> axum::response::Response {
    let identity = match require_identity(identity) {
        Ok(i) => i,
        Err(res) => return res,
    };
    let Json(input) = match body {
        Ok(b) => b,
        Err(e) => return errors::json_rejection_to_response(e),
    };

    match services.reviews.create(identity.user_id(), input).await {
        Ok(details) => (StatusCode::CREATED, Json(dto::review_to_json(&details))).into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn get_review(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let review_id = match parse_review_id(&id) {
        Ok(v) => v,
        Err(res) => return res,
    };

    match services.reviews.get(review_id).await {
        Ok(details) => (StatusCode::OK, Json(dto::review_to_json(&details))).into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn replace_review(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(identity): Extension<Option<IdentityContext>>,
    Path(id): Path<String>,
    body: Result<Json<dto::ReviewReplaceRequest>, JsonRejection>,
) -> axum::response::Response {
    let identity = match require_identity(identity) {
        Ok(i) => i,
        Err(res) => return res,
    };
    let review_id = match parse_review_id(&id) {
        Ok(v) => v,
        Err(res) => return res,
    };
    let Json(body) = match body {
        Ok(b) => b,
        Err(e) => return errors::json_rejection_to_response(e),
    };

    update(&services, identity, review_id, body.into()).await
}

pub async fn patch_review(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(identity): Extension<Option<IdentityContext>>,
    Path(id): Path<String>,
    body: Result<Json<ReviewPatch>, JsonRejection>,
) -> axum::response::Response {
    let identity = match require_identity(identity) {
        Ok(i) => i,
        Err(res) => return res,
    };
    let review_id = match parse_review_id(&id) {
        Ok(v) => v,
        Err(res) => return res,
    };
    let Json(patch) = match body {
        Ok(b) => b,
        Err(e) => return errors::json_rejection_to_response(e),
    };

    update(&services, identity, review_id, patch).await
}

async fn update(
    services: &AppServices,
    identity: IdentityContext,
    review_id: ReviewId,
    patch: ReviewPatch,
) -> axum::response::Response {
    match services
        .reviews
        .update(identity.user_id(), review_id, patch)
        .await
    {
        Ok(details) => (StatusCode::OK, Json(dto::review_to_json(&details))).into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn delete_review(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(identity): Extension<Option<IdentityContext>>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let identity = match require_identity(identity) {
        Ok(i) => i,
        Err(res) => return res,
    };
    let review_id = match parse_review_id(&id) {
        Ok(v) => v,
        Err(res) => return res,
    };

    match services.reviews.delete(identity.user_id(), review_id).await {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}

/// `GET /reviews/product_reviews?product_id=<uuid>`: the product's reviews
/// plus their average and count.
pub async fn product_reviews(
    Extension(services): Extension<Arc<AppServices>>,
    query: Result<Query<dto::ProductReviewsQuery>, QueryRejection>,
) -> axum::response::Response {
    let Query(params) = match query {
        Ok(q) => q,
        Err(e) => return errors::query_rejection_to_response(e),
    };
    let Some(raw) = params.product_id.filter(|s| !s.trim().is_empty()) else {
        return errors::json_error(
            StatusCode::BAD_REQUEST,
            "missing_parameter",
            "product_id parameter is required",
        );
    };
    let product_id: ProductId = match raw.trim().parse() {
        Ok(v) => v,
        Err(_) => return errors::json_error(StatusCode::BAD_REQUEST, "invalid_id", "invalid product id"),
    };

    match services.reviews.product_reviews(product_id).await {
        Ok(result) => (StatusCode::OK, Json(dto::product_reviews_to_json(&result))).into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn my_reviews(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(identity): Extension<Option<IdentityContext>>,
) -> axum::response::Response {
    let identity = match require_identity(identity) {
        Ok(i) => i,
        Err(res) => return res,
    };

    match services.reviews.reviews_by(identity.user_id()).await {
        Ok(reviews) => (StatusCode::OK, Json(dto::reviews_to_json(&reviews))).into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}

fn parse_review_id(raw: &str) -> Result<ReviewId, axum::response::Response> {
    raw.parse()
        .map_err(|_| errors::json_error(StatusCode::BAD_REQUEST, "invalid_id", "invalid review id"))
}
