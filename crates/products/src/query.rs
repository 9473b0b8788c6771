//! Storefront listing rules: which products are visible and in what order.
//!
//! Storage backends either apply [`CatalogQuery::apply`] directly (in-memory)
//! or translate the same rules to SQL (`ProductOrdering::sql_order_by`).

use core::str::FromStr;

use storefront_core::DomainError;

use crate::Product;

/// Number of products returned by the "featured" listing.
pub const FEATURED_LIMIT: usize = 8;

/// Sort order accepted by the product listing (`?ordering=`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ProductOrdering {
    PriceAsc,
    PriceDesc,
    CreatedAsc,
    #[default]
    CreatedDesc,
    NameAsc,
    NameDesc,
}

impl ProductOrdering {
    pub fn sql_order_by(self) -> &'static str {
        match self {
            ProductOrdering::PriceAsc => "p.price ASC, p.id ASC",
            ProductOrdering::PriceDesc => "p.price DESC, p.id DESC",
            ProductOrdering::CreatedAsc => "p.created_at ASC, p.id ASC",
            ProductOrdering::CreatedDesc => "p.created_at DESC, p.id DESC",
            ProductOrdering::NameAsc => "p.name ASC, p.id ASC",
            ProductOrdering::NameDesc => "p.name DESC, p.id DESC",
        }
    }

    fn compare(self, a: &Product, b: &Product) -> core::cmp::Ordering {
        let by_id = a.id.as_uuid().cmp(b.id.as_uuid());
        match self {
            ProductOrdering::PriceAsc => a.price.cmp(&b.price).then(by_id),
            ProductOrdering::PriceDesc => b.price.cmp(&a.price).then(by_id.reverse()),
            ProductOrdering::CreatedAsc => a.created_at.cmp(&b.created_at).then(by_id),
            ProductOrdering::CreatedDesc => b.created_at.cmp(&a.created_at).then(by_id.reverse()),
            ProductOrdering::NameAsc => a.name.cmp(&b.name).then(by_id),
            ProductOrdering::NameDesc => b.name.cmp(&a.name).then(by_id.reverse()),
        }
    }
}

impl FromStr for ProductOrdering {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "price" => Ok(ProductOrdering::PriceAsc),
            "-price" => Ok(ProductOrdering::PriceDesc),
            "created_at" => Ok(ProductOrdering::CreatedAsc),
            "-created_at" => Ok(ProductOrdering::CreatedDesc),
            "name" => Ok(ProductOrdering::NameAsc),
            "-name" => Ok(ProductOrdering::NameDesc),
            other => Err(DomainError::field(
                "ordering",
                format!(
                    "'{other}' is not one of: price, -price, created_at, -created_at, name, -name"
                ),
            )),
        }
    }
}

/// Listing request over active products.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CatalogQuery {
    pub search: Option<String>,
    pub ordering: ProductOrdering,
    pub limit: Option<usize>,
}

impl CatalogQuery {
    pub fn featured() -> Self {
        Self {
            limit: Some(FEATURED_LIMIT),
            ..Self::default()
        }
    }

    /// Lowercased whitespace-separated search terms; every term must match.
    pub fn search_terms(&self) -> Vec<String> {
        self.search
            .as_deref()
            .unwrap_or_default()
            .split_whitespace()
            .map(str::to_lowercase)
            .collect()
    }

    pub fn matches(&self, product: &Product) -> bool {
        if !product.is_listed() {
            return false;
        }
        let name = product.name.to_lowercase();
        let description = product.description.to_lowercase();
        self.search_terms()
            .iter()
            .all(|term| name.contains(term.as_str()) || description.contains(term.as_str()))
    }

    /// Filter, sort and truncate an unordered product set.
    pub fn apply(&self, products: impl IntoIterator<Item = Product>) -> Vec<Product> {
        let mut listed: Vec<Product> = products.into_iter().filter(|p| self.matches(p)).collect();
        listed.sort_by(|a, b| self.ordering.compare(a, b));
        if let Some(limit) = self.limit {
            listed.truncate(limit);
        }
        listed
    }
}
