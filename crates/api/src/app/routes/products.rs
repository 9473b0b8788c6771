use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Extension, Path, Query, rejection::QueryRejection},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
};

use storefront_core::{CategoryId, ProductId};
use storefront_products::{CatalogQuery, ProductOrdering};

use crate::app::services::AppServices;
use crate::app::{dto, errors};

pub fn router() -> Router {
    Router::new()
        .route("/", get(list_products))
        .route("/featured", get(featured_products))
        .route("/categories", get(list_categories))
        .route("/categories/:id", get(get_category))
        .route("/:id", get(get_product))
}

pub async fn list_products(
    Extension(services): Extension<Arc<AppServices>>,
    query: Result<Query<dto::ProductListQuery>, QueryRejection>,
) -> axum::response::Response {
    let Query(params) = match query {
        Ok(q) => q,
        Err(e) => return errors::query_rejection_to_response(e),
    };

    let ordering = match params.ordering.as_deref().filter(|s| !s.is_empty()) {
        None => ProductOrdering::default(),
        Some(raw) => match raw.parse() {
            Ok(o) => o,
            Err(e) => return errors::domain_error_to_response(e),
        },
    };
    let catalog_query = CatalogQuery {
        search: params.search,
        ordering,
        limit: None,
    };

    match services.catalog.list_products(&catalog_query).await {
        Ok(products) => products_response(&products),
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn featured_products(
    Extension(services): Extension<Arc<AppServices>>,
) -> axum::response::Response {
    match services.catalog.featured_products().await {
        Ok(products) => products_response(&products),
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn get_product(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let product_id: ProductId = match id.parse() {
        Ok(v) => v,
        Err(_) => return errors::json_error(StatusCode::BAD_REQUEST, "invalid_id", "invalid product id"),
    };

    match services.catalog.product(product_id).await {
        Ok(product) => (StatusCode::OK, Json(dto::product_to_json(&product))).into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn list_categories(
    Extension(services): Extension<Arc<AppServices>>,
) -> axum::response::Response {
    match services.catalog.categories().await {
        Ok(categories) => {
            let body: Vec<_> = categories.iter().map(dto::category_to_json).collect();
            (StatusCode::OK, Json(body)).into_response()
        }
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn get_category(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let category_id: CategoryId = match id.parse() {
        Ok(v) => v,
        Err(_) => return errors::json_error(StatusCode::BAD_REQUEST, "invalid_id", "invalid category id"),
    };

    match services.catalog.category(category_id).await {
        Ok(category) => (StatusCode::OK, Json(dto::category_to_json(&category))).into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}

fn products_response(products: &[storefront_products::Product]) -> axum::response::Response {
    let body: Vec<_> = products.iter().map(dto::product_to_json).collect();
    (StatusCode::OK, Json(body)).into_response()
}
