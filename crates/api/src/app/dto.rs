use rust_decimal::prelude::ToPrimitive;
use serde::Deserialize;
use serde_json::{Value, json};

use storefront_auth::{TokenPair, User};
use storefront_infra::ProductReviews;
use storefront_orders::{Order, OrderItem};
use storefront_products::{Category, Product};
use storefront_reviews::{ReviewDetails, ReviewPatch};

// -------------------------
// Request DTOs
// -------------------------

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct RefreshRequest {
    pub refresh: String,
}

/// PUT body: every editable field is required. `product` may be echoed back
/// by clients but a review never moves to another product.
#[derive(Debug, Deserialize)]
pub struct ReviewReplaceRequest {
    pub rating: i64,
    pub title: String,
    pub comment: String,
}

impl From<ReviewReplaceRequest> for ReviewPatch {
    fn from(body: ReviewReplaceRequest) -> Self {
        ReviewPatch {
            rating: Some(body.rating),
            title: Some(body.title),
            comment: Some(body.comment),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct ProductListQuery {
    pub search: Option<String>,
    pub ordering: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ProductReviewsQuery {
    pub product_id: Option<String>,
}

// -------------------------
// Response mapping
// -------------------------

pub fn user_to_json(user: &User) -> Value {
    json!({
        "id": user.id.to_string(),
        "username": user.username,
        "email": user.email,
        "first_name": user.first_name,
        "last_name": user.last_name,
        "date_joined": user.date_joined.to_rfc3339(),
    })
}

pub fn registration_to_json(user: &User, tokens: &TokenPair) -> Value {
    json!({
        "user": user_to_json(user),
        "access": tokens.access,
        "refresh": tokens.refresh,
    })
}

pub fn category_to_json(category: &Category) -> Value {
    json!({
        "id": category.id.to_string(),
        "name": category.name,
        "slug": category.slug,
        "description": category.description,
    })
}

pub fn product_to_json(product: &Product) -> Value {
    json!({
        "id": product.id.to_string(),
        "name": product.name,
        "slug": product.slug,
        "description": product.description,
        "price": product.price.to_string(),
        "image": product.image,
        "image_url": product.image.as_deref().map(|path| format!("/media/{path}")),
        "category": product.category.as_ref().map(category_to_json),
        "stock": product.stock,
        "is_active": product.is_active,
        "created_at": product.created_at.to_rfc3339(),
        "updated_at": product.updated_at.to_rfc3339(),
    })
}

fn order_item_to_json(item: &OrderItem) -> Value {
    json!({
        "id": item.id.to_string(),
        "product_name": item.product_name,
        "product_price": item.product_price.to_string(),
        "quantity": item.quantity,
        "subtotal": item.subtotal.to_string(),
    })
}

pub fn order_to_json(order: &Order) -> Value {
    json!({
        "id": order.id.to_string(),
        "customer_name": order.customer_name,
        "customer_email": order.customer_email,
        "total_amount": order.total_amount.to_string(),
        "status": order.status.as_str(),
        "items": order.items.iter().map(order_item_to_json).collect::<Vec<_>>(),
        "created_at": order.created_at.to_rfc3339(),
        "updated_at": order.updated_at.to_rfc3339(),
    })
}

pub fn review_to_json(details: &ReviewDetails) -> Value {
    let review = &details.review;
    json!({
        "id": review.id.to_string(),
        "product": review.product_id.to_string(),
        "product_name": details.product_name,
        "user": {
            "id": details.author.id.to_string(),
            "username": details.author.username,
            "first_name": details.author.first_name,
            "last_name": details.author.last_name,
        },
        "rating": review.rating.value(),
        "title": review.title,
        "comment": review.comment,
        "created_at": review.created_at.to_rfc3339(),
        "updated_at": review.updated_at.to_rfc3339(),
    })
}

pub fn reviews_to_json(reviews: &[ReviewDetails]) -> Value {
    Value::Array(reviews.iter().map(review_to_json).collect())
}

/// The average is a JSON number (`4.5`), already rounded to two places.
pub fn product_reviews_to_json(product_reviews: &ProductReviews) -> Value {
    let stats = &product_reviews.stats;
    json!({
        "reviews": reviews_to_json(&product_reviews.reviews),
        "average_rating": stats.average_rating.to_f64().unwrap_or_default(),
        "total_reviews": stats.total_reviews,
    })
}
