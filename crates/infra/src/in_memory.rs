use std::collections::HashMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use async_trait::async_trait;

use storefront_auth::User;
use storefront_core::{CategoryId, Entity, OrderId, ProductId, ReviewId, UserId};
use storefront_orders::Order;
use storefront_products::{CatalogQuery, Category, Product};
use storefront_reviews::{Review, ReviewAuthor, ReviewDetails};

use crate::repository::{
    CatalogRepository, OrderRepository, REVIEWS_PRODUCT_USER_KEY, ReviewFilter, ReviewRepository,
    StoreError, StoreResult, USERS_USERNAME_KEY, UserRepository,
};

#[derive(Debug, Default)]
struct Tables {
    users: HashMap<UserId, User>,
    categories: HashMap<CategoryId, Category>,
    products: HashMap<ProductId, Product>,
    orders: HashMap<OrderId, Order>,
    reviews: HashMap<ReviewId, Review>,
}

/// In-memory implementation of every repository.
///
/// Intended for tests/dev. All tables sit behind one lock, so each write is
/// atomic and the unique constraints are checked and applied in the same
/// critical section, just like a database transaction.
#[derive(Debug, Default)]
pub struct InMemoryDatabase {
    tables: RwLock<Tables>,
}

impl InMemoryDatabase {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> StoreResult<RwLockReadGuard<'_, Tables>> {
        self.tables.read().map_err(|_| StoreError::Poisoned)
    }

    fn write(&self) -> StoreResult<RwLockWriteGuard<'_, Tables>> {
        self.tables.write().map_err(|_| StoreError::Poisoned)
    }
}

/// Insert or replace, keyed on the entity's own id.
fn put<E: Entity + Clone>(table: &mut HashMap<E::Id, E>, entity: &E) {
    table.insert(*entity.id(), entity.clone());
}

impl Tables {
    fn details(&self, review: &Review) -> StoreResult<ReviewDetails> {
        let product = self
            .products
            .get(&review.product_id)
            .ok_or_else(|| StoreError::Corrupt(format!("review {} has no product", review.id)))?;
        let user = self
            .users
            .get(&review.user_id)
            .ok_or_else(|| StoreError::Corrupt(format!("review {} has no author", review.id)))?;

        Ok(ReviewDetails {
            review: review.clone(),
            product_name: product.name.clone(),
            author: ReviewAuthor {
                id: user.id,
                username: user.username.clone(),
                first_name: user.first_name.clone(),
                last_name: user.last_name.clone(),
            },
        })
    }
}

#[async_trait]
impl UserRepository for InMemoryDatabase {
    async fn insert_user(&self, user: &User) -> StoreResult<()> {
        let mut tables = self.write()?;
        if tables.users.values().any(|u| u.username == user.username) {
            return Err(StoreError::UniqueViolation {
                constraint: USERS_USERNAME_KEY.to_string(),
            });
        }
        put(&mut tables.users, user);
        Ok(())
    }

    async fn find_user(&self, id: UserId) -> StoreResult<Option<User>> {
        Ok(self.read()?.users.get(&id).cloned())
    }

    async fn find_user_by_username(&self, username: &str) -> StoreResult<Option<User>> {
        Ok(self
            .read()?
            .users
            .values()
            .find(|u| u.username == username)
            .cloned())
    }

    async fn update_user(&self, user: &User) -> StoreResult<()> {
        let mut tables = self.write()?;
        let slot = tables.users.get_mut(&user.id).ok_or(StoreError::NotFound)?;
        *slot = user.clone();
        Ok(())
    }
}

#[async_trait]
impl CatalogRepository for InMemoryDatabase {
    async fn list_products(&self, query: &CatalogQuery) -> StoreResult<Vec<Product>> {
        let tables = self.read()?;
        Ok(query.apply(tables.products.values().cloned()))
    }

    async fn find_product(&self, id: ProductId) -> StoreResult<Option<Product>> {
        Ok(self.read()?.products.get(&id).cloned())
    }

    async fn list_categories(&self) -> StoreResult<Vec<Category>> {
        let mut categories: Vec<Category> = self.read()?.categories.values().cloned().collect();
        categories.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(categories)
    }

    async fn find_category(&self, id: CategoryId) -> StoreResult<Option<Category>> {
        Ok(self.read()?.categories.get(&id).cloned())
    }

    async fn ensure_category(&self, category: &Category) -> StoreResult<Category> {
        let mut tables = self.write()?;
        if let Some(existing) = tables.categories.values().find(|c| c.slug == category.slug) {
            return Ok(existing.clone());
        }
        put(&mut tables.categories, category);
        Ok(category.clone())
    }

    async fn ensure_product(&self, product: &Product) -> StoreResult<bool> {
        let mut tables = self.write()?;
        if tables.products.values().any(|p| p.slug == product.slug) {
            return Ok(false);
        }
        put(&mut tables.products, product);
        Ok(true)
    }
}

#[async_trait]
impl OrderRepository for InMemoryDatabase {
    async fn insert_order(&self, order: &Order) -> StoreResult<()> {
        put(&mut self.write()?.orders, order);
        Ok(())
    }

    async fn find_order(&self, id: OrderId) -> StoreResult<Option<Order>> {
        Ok(self.read()?.orders.get(&id).cloned())
    }

    async fn list_orders(&self) -> StoreResult<Vec<Order>> {
        let mut orders: Vec<Order> = self.read()?.orders.values().cloned().collect();
        orders.sort_by(|a, b| {
            b.created_at
                .cmp(&a.created_at)
                .then_with(|| b.id.as_uuid().cmp(a.id.as_uuid()))
        });
        Ok(orders)
    }
}

#[async_trait]
impl ReviewRepository for InMemoryDatabase {
    async fn insert_review(&self, review: &Review) -> StoreResult<()> {
        let mut tables = self.write()?;
        let taken = tables
            .reviews
            .values()
            .any(|r| r.product_id == review.product_id && r.user_id == review.user_id);
        if taken {
            return Err(StoreError::UniqueViolation {
                constraint: REVIEWS_PRODUCT_USER_KEY.to_string(),
            });
        }
        put(&mut tables.reviews, review);
        Ok(())
    }

    async fn find_review(&self, id: ReviewId) -> StoreResult<Option<ReviewDetails>> {
        let tables = self.read()?;
        tables
            .reviews
            .get(&id)
            .map(|r| tables.details(r))
            .transpose()
    }

    async fn find_review_by_author(
        &self,
        product_id: ProductId,
        user_id: UserId,
    ) -> StoreResult<Option<Review>> {
        Ok(self
            .read()?
            .reviews
            .values()
            .find(|r| r.product_id == product_id && r.user_id == user_id)
            .cloned())
    }

    async fn update_review(&self, review: &Review) -> StoreResult<()> {
        let mut tables = self.write()?;
        let slot = tables.reviews.get_mut(&review.id).ok_or(StoreError::NotFound)?;
        *slot = review.clone();
        Ok(())
    }

    async fn delete_review(&self, id: ReviewId) -> StoreResult<()> {
        self.write()?
            .reviews
            .remove(&id)
            .map(|_| ())
            .ok_or(StoreError::NotFound)
    }

    async fn list_reviews(&self, filter: ReviewFilter) -> StoreResult<Vec<ReviewDetails>> {
        let tables = self.read()?;
        let mut reviews: Vec<&Review> = tables
            .reviews
            .values()
            .filter(|r| match filter {
                ReviewFilter::All => true,
                ReviewFilter::Product(id) => r.product_id == id,
                ReviewFilter::Author(id) => r.user_id == id,
            })
            .collect();
        reviews.sort_by(|a, b| {
            b.created_at
                .cmp(&a.created_at)
                .then_with(|| b.id.as_uuid().cmp(a.id.as_uuid()))
        });
        reviews.into_iter().map(|r| tables.details(r)).collect()
    }
}
