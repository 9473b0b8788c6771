use std::sync::Arc;

use storefront_core::{CategoryId, DomainError, ProductId};
use storefront_products::{CatalogQuery, Category, Product};

use crate::repository::CatalogRepository;
use crate::services::ServiceResult;

/// Read side of the product catalog.
pub struct CatalogService {
    catalog: Arc<dyn CatalogRepository>,
}

impl CatalogService {
    pub fn new(catalog: Arc<dyn CatalogRepository>) -> Self {
        Self { catalog }
    }

    pub async fn list_products(&self, query: &CatalogQuery) -> ServiceResult<Vec<Product>> {
        Ok(self.catalog.list_products(query).await?)
    }

    pub async fn featured_products(&self) -> ServiceResult<Vec<Product>> {
        self.list_products(&CatalogQuery::featured()).await
    }

    /// Inactive products are hidden from the storefront.
    pub async fn product(&self, id: ProductId) -> ServiceResult<Product> {
        match self.catalog.find_product(id).await? {
            Some(product) if product.is_listed() => Ok(product),
            _ => Err(DomainError::not_found("product").into()),
        }
    }

    pub async fn categories(&self) -> ServiceResult<Vec<Category>> {
        Ok(self.catalog.list_categories().await?)
    }

    pub async fn category(&self, id: CategoryId) -> ServiceResult<Category> {
        self.catalog
            .find_category(id)
            .await?
            .ok_or_else(|| DomainError::not_found("category").into())
    }
}
