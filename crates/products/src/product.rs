use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;

use storefront_core::{DomainError, DomainResult, Entity, Money, ProductId};

use crate::Category;

/// Catalog product.
///
/// Products are never referenced live by orders: an order line copies the
/// name and price at order time, so later catalog edits leave historical
/// totals untouched.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    pub slug: String,
    pub description: String,
    pub price: Money,
    pub image: Option<String>,
    pub category: Option<Category>,
    pub stock: i32,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Product {
    /// Whether the product shows up in storefront listings.
    pub fn is_listed(&self) -> bool {
        self.is_active
    }

    pub fn summary(&self) -> ProductSummary {
        ProductSummary {
            id: self.id,
            name: self.name.clone(),
        }
    }
}

impl Entity for Product {
    type Id = ProductId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

/// Minimal product view consumed by the review engine (existence + display name).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProductSummary {
    pub id: ProductId,
    pub name: String,
}

/// Input for adding a product to the catalog (seeding, admin tooling).
#[derive(Debug, Clone)]
pub struct NewProduct {
    pub name: String,
    pub slug: String,
    pub description: String,
    pub price: Decimal,
    pub category: Option<Category>,
    pub stock: i32,
    pub is_active: bool,
}

impl NewProduct {
    /// Validate the input and stamp identity + timestamps.
    pub fn into_product(self, now: DateTime<Utc>) -> DomainResult<Product> {
        if self.name.trim().is_empty() {
            return Err(DomainError::field("name", "This field may not be blank."));
        }
        validate_slug(&self.slug)?;
        let price = Money::try_new(self.price).map_err(|e| DomainError::field("price", e.to_string()))?;
        if self.stock < 0 {
            return Err(DomainError::field("stock", "must be greater than or equal to 0"));
        }

        Ok(Product {
            id: ProductId::new(),
            name: self.name,
            slug: self.slug,
            description: self.description,
            price,
            image: None,
            category: self.category,
            stock: self.stock,
            is_active: self.is_active,
            created_at: now,
            updated_at: now,
        })
    }
}

/// Slugs are lowercase ASCII letters, digits and hyphens.
pub(crate) fn validate_slug(slug: &str) -> DomainResult<()> {
    let valid = !slug.is_empty()
        && slug
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-');
    if valid {
        Ok(())
    } else {
        Err(DomainError::field(
            "slug",
            "Enter a valid slug consisting of lowercase letters, numbers or hyphens.",
        ))
    }
}
