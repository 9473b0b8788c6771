//! Postgres-backed repositories.
//!
//! ## Error Mapping
//!
//! | SQLx Error | PostgreSQL Error Code | StoreError |
//! |------------|----------------------|------------|
//! | Database (unique violation) | `23505` | `UniqueViolation { constraint }` |
//! | Database (other) | Any other | `Database` |
//! | Other | N/A | `Database` |
//!
//! The review uniqueness rule lives in the schema
//! (`reviews_product_user_key`); a losing concurrent insert surfaces here as
//! `UniqueViolation` and the review service reports it as a conflict.
//!
//! ## Thread Safety
//!
//! `PgDatabase` is `Send + Sync` and cheap to clone; all operations go through
//! the SQLx connection pool.

use std::collections::HashMap;
use std::str::FromStr;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::postgres::{PgPoolOptions, PgRow};
use sqlx::{FromRow, PgPool, Row};
use tracing::{Span, instrument};
use uuid::Uuid;

use storefront_auth::User;
use storefront_core::{CategoryId, Money, OrderId, OrderItemId, ProductId, ReviewId, UserId};
use storefront_orders::{Order, OrderItem, OrderStatus};
use storefront_products::{CatalogQuery, Category, Product};
use storefront_reviews::{Rating, Review, ReviewAuthor, ReviewDetails};

use crate::repository::{
    CatalogRepository, OrderRepository, ReviewFilter, ReviewRepository, StoreError, StoreResult,
    UserRepository,
};

#[derive(Debug, Clone)]
pub struct PgDatabase {
    pool: PgPool,
}

impl PgDatabase {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Connect and bring the schema up to date.
    pub async fn connect(database_url: &str) -> StoreResult<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(10)
            .connect(database_url)
            .await
            .map_err(|e| map_sqlx_error("connect", e))?;

        sqlx::migrate!("./migrations")
            .run(&pool)
            .await
            .map_err(|e| StoreError::Database(e.into()))?;

        Ok(Self::new(pool))
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

fn map_sqlx_error(operation: &str, err: sqlx::Error) -> StoreError {
    if let sqlx::Error::Database(db_err) = &err {
        if db_err.code().as_deref() == Some("23505") {
            let constraint = db_err.constraint().unwrap_or("unknown").to_string();
            tracing::debug!(operation, constraint = %constraint, "unique violation");
            return StoreError::UniqueViolation { constraint };
        }
    }
    tracing::error!(operation, error = %err, "database error");
    StoreError::Database(err)
}

fn money(column: &str, value: Decimal) -> StoreResult<Money> {
    Money::try_new(value).map_err(|e| StoreError::Corrupt(format!("{column}: {e}")))
}

// ─────────────────────────────────────────────────────────────────────────────
// Users
// ─────────────────────────────────────────────────────────────────────────────

struct UserRow(User);

impl<'r> FromRow<'r, PgRow> for UserRow {
    fn from_row(row: &'r PgRow) -> Result<Self, sqlx::Error> {
        Ok(UserRow(User {
            id: UserId::from_uuid(row.try_get("id")?),
            username: row.try_get("username")?,
            email: row.try_get("email")?,
            first_name: row.try_get("first_name")?,
            last_name: row.try_get("last_name")?,
            password_hash: row.try_get("password_hash")?,
            date_joined: row.try_get("date_joined")?,
        }))
    }
}

const USER_COLUMNS: &str =
    "id, username, email, first_name, last_name, password_hash, date_joined";

#[async_trait]
impl UserRepository for PgDatabase {
    #[instrument(skip(self, user), fields(username = %user.username), err)]
    async fn insert_user(&self, user: &User) -> StoreResult<()> {
        sqlx::query(
            r#"
            INSERT INTO users (id, username, email, first_name, last_name, password_hash, date_joined)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(user.id.as_uuid())
        .bind(&user.username)
        .bind(&user.email)
        .bind(&user.first_name)
        .bind(&user.last_name)
        .bind(&user.password_hash)
        .bind(user.date_joined)
        .execute(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("insert_user", e))?;
        Ok(())
    }

    async fn find_user(&self, id: UserId) -> StoreResult<Option<User>> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE id = $1"
        ))
        .bind(id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("find_user", e))?;
        Ok(row.map(|r| r.0))
    }

    async fn find_user_by_username(&self, username: &str) -> StoreResult<Option<User>> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE username = $1"
        ))
        .bind(username)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("find_user_by_username", e))?;
        Ok(row.map(|r| r.0))
    }

    #[instrument(skip(self, user), fields(user_id = %user.id), err)]
    async fn update_user(&self, user: &User) -> StoreResult<()> {
        let result = sqlx::query(
            r#"
            UPDATE users
            SET email = $2, first_name = $3, last_name = $4, password_hash = $5
            WHERE id = $1
            "#,
        )
        .bind(user.id.as_uuid())
        .bind(&user.email)
        .bind(&user.first_name)
        .bind(&user.last_name)
        .bind(&user.password_hash)
        .execute(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("update_user", e))?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound);
        }
        Ok(())
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Catalog
// ─────────────────────────────────────────────────────────────────────────────

struct CategoryRow(Category);

impl<'r> FromRow<'r, PgRow> for CategoryRow {
    fn from_row(row: &'r PgRow) -> Result<Self, sqlx::Error> {
        Ok(CategoryRow(Category {
            id: CategoryId::from_uuid(row.try_get("id")?),
            name: row.try_get("name")?,
            slug: row.try_get("slug")?,
            description: row.try_get("description")?,
        }))
    }
}

#[derive(Debug)]
struct ProductRow {
    id: Uuid,
    name: String,
    slug: String,
    description: String,
    price: Decimal,
    image: Option<String>,
    stock: i32,
    is_active: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    category_id: Option<Uuid>,
    category_name: Option<String>,
    category_slug: Option<String>,
    category_description: Option<String>,
}

impl<'r> FromRow<'r, PgRow> for ProductRow {
    fn from_row(row: &'r PgRow) -> Result<Self, sqlx::Error> {
        Ok(ProductRow {
            id: row.try_get("id")?,
            name: row.try_get("name")?,
            slug: row.try_get("slug")?,
            description: row.try_get("description")?,
            price: row.try_get("price")?,
            image: row.try_get("image")?,
            stock: row.try_get("stock")?,
            is_active: row.try_get("is_active")?,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
            category_id: row.try_get("category_id")?,
            category_name: row.try_get("category_name")?,
            category_slug: row.try_get("category_slug")?,
            category_description: row.try_get("category_description")?,
        })
    }
}

impl TryFrom<ProductRow> for Product {
    type Error = StoreError;

    fn try_from(row: ProductRow) -> StoreResult<Self> {
        let category = match (row.category_id, row.category_name, row.category_slug) {
            (Some(id), Some(name), Some(slug)) => Some(Category {
                id: CategoryId::from_uuid(id),
                name,
                slug,
                description: row.category_description,
            }),
            _ => None,
        };

        Ok(Product {
            id: ProductId::from_uuid(row.id),
            name: row.name,
            slug: row.slug,
            description: row.description,
            price: money("products.price", row.price)?,
            image: row.image,
            category,
            stock: row.stock,
            is_active: row.is_active,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

const PRODUCT_SELECT: &str = r#"
    SELECT
        p.id, p.name, p.slug, p.description, p.price, p.image, p.stock,
        p.is_active, p.created_at, p.updated_at,
        c.id AS category_id,
        c.name AS category_name,
        c.slug AS category_slug,
        c.description AS category_description
    FROM products p
    LEFT JOIN categories c ON c.id = p.category_id
"#;

#[async_trait]
impl CatalogRepository for PgDatabase {
    #[instrument(skip(self), fields(product_count = tracing::field::Empty), err)]
    async fn list_products(&self, query: &CatalogQuery) -> StoreResult<Vec<Product>> {
        // ORDER BY comes from a closed enum; search terms are bound.
        let sql = format!(
            r#"{PRODUCT_SELECT}
            WHERE p.is_active
              AND NOT EXISTS (
                  SELECT 1 FROM unnest($1::text[]) AS t(term)
                  WHERE strpos(lower(p.name), t.term) = 0
                    AND strpos(lower(p.description), t.term) = 0
              )
            ORDER BY {order}
            LIMIT $2
            "#,
            order = query.ordering.sql_order_by(),
        );

        let limit = query.limit.map(|l| l as i64);
        let rows = sqlx::query_as::<_, ProductRow>(&sql)
            .bind(query.search_terms())
            .bind(limit)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("list_products", e))?;

        Span::current().record("product_count", rows.len());
        rows.into_iter().map(Product::try_from).collect()
    }

    async fn find_product(&self, id: ProductId) -> StoreResult<Option<Product>> {
        let row = sqlx::query_as::<_, ProductRow>(&format!("{PRODUCT_SELECT} WHERE p.id = $1"))
            .bind(id.as_uuid())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("find_product", e))?;
        row.map(Product::try_from).transpose()
    }

    async fn list_categories(&self) -> StoreResult<Vec<Category>> {
        let rows = sqlx::query_as::<_, CategoryRow>(
            "SELECT id, name, slug, description FROM categories ORDER BY name ASC",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("list_categories", e))?;
        Ok(rows.into_iter().map(|r| r.0).collect())
    }

    async fn find_category(&self, id: CategoryId) -> StoreResult<Option<Category>> {
        let row = sqlx::query_as::<_, CategoryRow>(
            "SELECT id, name, slug, description FROM categories WHERE id = $1",
        )
        .bind(id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("find_category", e))?;
        Ok(row.map(|r| r.0))
    }

    #[instrument(skip(self, category), fields(slug = %category.slug), err)]
    async fn ensure_category(&self, category: &Category) -> StoreResult<Category> {
        sqlx::query(
            r#"
            INSERT INTO categories (id, name, slug, description)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (slug) DO NOTHING
            "#,
        )
        .bind(category.id.as_uuid())
        .bind(&category.name)
        .bind(&category.slug)
        .bind(&category.description)
        .execute(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("ensure_category", e))?;

        let row = sqlx::query_as::<_, CategoryRow>(
            "SELECT id, name, slug, description FROM categories WHERE slug = $1",
        )
        .bind(&category.slug)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("ensure_category", e))?;
        Ok(row.0)
    }

    #[instrument(skip(self, product), fields(slug = %product.slug), err)]
    async fn ensure_product(&self, product: &Product) -> StoreResult<bool> {
        let result = sqlx::query(
            r#"
            INSERT INTO products
                (id, name, slug, description, price, image, category_id, stock, is_active, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            ON CONFLICT (slug) DO NOTHING
            "#,
        )
        .bind(product.id.as_uuid())
        .bind(&product.name)
        .bind(&product.slug)
        .bind(&product.description)
        .bind(product.price.amount())
        .bind(&product.image)
        .bind(product.category.as_ref().map(|c| *c.id.as_uuid()))
        .bind(product.stock)
        .bind(product.is_active)
        .bind(product.created_at)
        .bind(product.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("ensure_product", e))?;

        Ok(result.rows_affected() == 1)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Orders
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug)]
struct OrderRow {
    id: Uuid,
    customer_name: String,
    customer_email: String,
    total_amount: Decimal,
    status: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl<'r> FromRow<'r, PgRow> for OrderRow {
    fn from_row(row: &'r PgRow) -> Result<Self, sqlx::Error> {
        Ok(OrderRow {
            id: row.try_get("id")?,
            customer_name: row.try_get("customer_name")?,
            customer_email: row.try_get("customer_email")?,
            total_amount: row.try_get("total_amount")?,
            status: row.try_get("status")?,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        })
    }
}

#[derive(Debug)]
struct OrderItemRow {
    id: Uuid,
    order_id: Uuid,
    product_name: String,
    product_price: Decimal,
    quantity: i32,
    subtotal: Decimal,
}

impl<'r> FromRow<'r, PgRow> for OrderItemRow {
    fn from_row(row: &'r PgRow) -> Result<Self, sqlx::Error> {
        Ok(OrderItemRow {
            id: row.try_get("id")?,
            order_id: row.try_get("order_id")?,
            product_name: row.try_get("product_name")?,
            product_price: row.try_get("product_price")?,
            quantity: row.try_get("quantity")?,
            subtotal: row.try_get("subtotal")?,
        })
    }
}

impl TryFrom<OrderItemRow> for OrderItem {
    type Error = StoreError;

    fn try_from(row: OrderItemRow) -> StoreResult<Self> {
        let quantity = u32::try_from(row.quantity)
            .map_err(|_| StoreError::Corrupt(format!("order_items.quantity: {}", row.quantity)))?;
        Ok(OrderItem {
            id: OrderItemId::from_uuid(row.id),
            product_name: row.product_name,
            product_price: money("order_items.product_price", row.product_price)?,
            quantity,
            subtotal: money("order_items.subtotal", row.subtotal)?,
        })
    }
}

fn assemble_order(row: OrderRow, items: Vec<OrderItemRow>) -> StoreResult<Order> {
    let status = OrderStatus::from_str(&row.status)
        .map_err(|e| StoreError::Corrupt(format!("orders.status: {e}")))?;
    Ok(Order {
        id: OrderId::from_uuid(row.id),
        customer_name: row.customer_name,
        customer_email: row.customer_email,
        total_amount: money("orders.total_amount", row.total_amount)?,
        status,
        items: items
            .into_iter()
            .map(OrderItem::try_from)
            .collect::<StoreResult<_>>()?,
        created_at: row.created_at,
        updated_at: row.updated_at,
    })
}

const ORDER_COLUMNS: &str =
    "id, customer_name, customer_email, total_amount, status, created_at, updated_at";
const ORDER_ITEM_COLUMNS: &str =
    "id, order_id, product_name, product_price, quantity, subtotal";

#[async_trait]
impl OrderRepository for PgDatabase {
    /// Insert the order header and its items in one transaction.
    #[instrument(
        skip(self, order),
        fields(order_id = %order.id, item_count = order.items.len()),
        err
    )]
    async fn insert_order(&self, order: &Order) -> StoreResult<()> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| map_sqlx_error("begin_transaction", e))?;

        sqlx::query(
            r#"
            INSERT INTO orders (id, customer_name, customer_email, total_amount, status, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(order.id.as_uuid())
        .bind(&order.customer_name)
        .bind(&order.customer_email)
        .bind(order.total_amount.amount())
        .bind(order.status.as_str())
        .bind(order.created_at)
        .bind(order.updated_at)
        .execute(&mut *tx)
        .await
        .map_err(|e| map_sqlx_error("insert_order", e))?;

        for (position, item) in order.items.iter().enumerate() {
            let position = i32::try_from(position)
                .map_err(|_| StoreError::Corrupt("too many order items".to_string()))?;
            let quantity = i32::try_from(item.quantity)
                .map_err(|_| StoreError::Corrupt(format!("quantity {}", item.quantity)))?;

            sqlx::query(
                r#"
                INSERT INTO order_items
                    (id, order_id, position, product_name, product_price, quantity, subtotal)
                VALUES ($1, $2, $3, $4, $5, $6, $7)
                "#,
            )
            .bind(item.id.as_uuid())
            .bind(order.id.as_uuid())
            .bind(position)
            .bind(&item.product_name)
            .bind(item.product_price.amount())
            .bind(quantity)
            .bind(item.subtotal.amount())
            .execute(&mut *tx)
            .await
            .map_err(|e| map_sqlx_error("insert_order_item", e))?;
        }

        tx.commit()
            .await
            .map_err(|e| map_sqlx_error("commit", e))?;
        Ok(())
    }

    async fn find_order(&self, id: OrderId) -> StoreResult<Option<Order>> {
        let Some(row) = sqlx::query_as::<_, OrderRow>(&format!(
            "SELECT {ORDER_COLUMNS} FROM orders WHERE id = $1"
        ))
        .bind(id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("find_order", e))?
        else {
            return Ok(None);
        };

        let items = sqlx::query_as::<_, OrderItemRow>(&format!(
            "SELECT {ORDER_ITEM_COLUMNS} FROM order_items WHERE order_id = $1 ORDER BY position ASC"
        ))
        .bind(id.as_uuid())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("find_order_items", e))?;

        assemble_order(row, items).map(Some)
    }

    async fn list_orders(&self) -> StoreResult<Vec<Order>> {
        let rows = sqlx::query_as::<_, OrderRow>(&format!(
            "SELECT {ORDER_COLUMNS} FROM orders ORDER BY created_at DESC, id DESC"
        ))
        .fetch_all(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("list_orders", e))?;

        let ids: Vec<Uuid> = rows.iter().map(|r| r.id).collect();
        let item_rows = sqlx::query_as::<_, OrderItemRow>(&format!(
            "SELECT {ORDER_ITEM_COLUMNS} FROM order_items WHERE order_id = ANY($1) ORDER BY order_id, position ASC"
        ))
        .bind(&ids[..])
        .fetch_all(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("list_order_items", e))?;

        let mut items_by_order: HashMap<Uuid, Vec<OrderItemRow>> = HashMap::new();
        for item in item_rows {
            items_by_order.entry(item.order_id).or_default().push(item);
        }

        rows.into_iter()
            .map(|row| {
                let items = items_by_order.remove(&row.id).unwrap_or_default();
                assemble_order(row, items)
            })
            .collect()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Reviews
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug)]
struct ReviewRow {
    id: Uuid,
    product_id: Uuid,
    user_id: Uuid,
    rating: i16,
    title: String,
    comment: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl<'r> FromRow<'r, PgRow> for ReviewRow {
    fn from_row(row: &'r PgRow) -> Result<Self, sqlx::Error> {
        Ok(ReviewRow {
            id: row.try_get("id")?,
            product_id: row.try_get("product_id")?,
            user_id: row.try_get("user_id")?,
            rating: row.try_get("rating")?,
            title: row.try_get("title")?,
            comment: row.try_get("comment")?,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        })
    }
}

impl TryFrom<ReviewRow> for Review {
    type Error = StoreError;

    fn try_from(row: ReviewRow) -> StoreResult<Self> {
        let rating = Rating::try_new(i64::from(row.rating))
            .map_err(|e| StoreError::Corrupt(format!("reviews.rating: {e}")))?;
        Ok(Review {
            id: ReviewId::from_uuid(row.id),
            product_id: ProductId::from_uuid(row.product_id),
            user_id: UserId::from_uuid(row.user_id),
            rating,
            title: row.title,
            comment: row.comment,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

struct ReviewDetailsRow {
    review: ReviewRow,
    product_name: String,
    username: String,
    first_name: String,
    last_name: String,
}

impl<'r> FromRow<'r, PgRow> for ReviewDetailsRow {
    fn from_row(row: &'r PgRow) -> Result<Self, sqlx::Error> {
        Ok(ReviewDetailsRow {
            review: ReviewRow::from_row(row)?,
            product_name: row.try_get("product_name")?,
            username: row.try_get("username")?,
            first_name: row.try_get("first_name")?,
            last_name: row.try_get("last_name")?,
        })
    }
}

impl TryFrom<ReviewDetailsRow> for ReviewDetails {
    type Error = StoreError;

    fn try_from(row: ReviewDetailsRow) -> StoreResult<Self> {
        let review = Review::try_from(row.review)?;
        Ok(ReviewDetails {
            author: ReviewAuthor {
                id: review.user_id,
                username: row.username,
                first_name: row.first_name,
                last_name: row.last_name,
            },
            product_name: row.product_name,
            review,
        })
    }
}

const REVIEW_DETAILS_SELECT: &str = r#"
    SELECT
        r.id, r.product_id, r.user_id, r.rating, r.title, r.comment,
        r.created_at, r.updated_at,
        p.name AS product_name,
        u.username, u.first_name, u.last_name
    FROM reviews r
    JOIN products p ON p.id = r.product_id
    JOIN users u ON u.id = r.user_id
"#;

#[async_trait]
impl ReviewRepository for PgDatabase {
    #[instrument(
        skip(self, review),
        fields(product_id = %review.product_id, user_id = %review.user_id),
        err
    )]
    async fn insert_review(&self, review: &Review) -> StoreResult<()> {
        sqlx::query(
            r#"
            INSERT INTO reviews (id, product_id, user_id, rating, title, comment, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
        )
        .bind(review.id.as_uuid())
        .bind(review.product_id.as_uuid())
        .bind(review.user_id.as_uuid())
        .bind(i16::from(review.rating))
        .bind(&review.title)
        .bind(&review.comment)
        .bind(review.created_at)
        .bind(review.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("insert_review", e))?;
        Ok(())
    }

    async fn find_review(&self, id: ReviewId) -> StoreResult<Option<ReviewDetails>> {
        let row = sqlx::query_as::<_, ReviewDetailsRow>(&format!(
            "{REVIEW_DETAILS_SELECT} WHERE r.id = $1"
        ))
        .bind(id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("find_review", e))?;
        row.map(ReviewDetails::try_from).transpose()
    }

    async fn find_review_by_author(
        &self,
        product_id: ProductId,
        user_id: UserId,
    ) -> StoreResult<Option<Review>> {
        let row = sqlx::query_as::<_, ReviewRow>(
            r#"
            SELECT id, product_id, user_id, rating, title, comment, created_at, updated_at
            FROM reviews
            WHERE product_id = $1 AND user_id = $2
            "#,
        )
        .bind(product_id.as_uuid())
        .bind(user_id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("find_review_by_author", e))?;
        row.map(Review::try_from).transpose()
    }

    #[instrument(skip(self, review), fields(review_id = %review.id), err)]
    async fn update_review(&self, review: &Review) -> StoreResult<()> {
        let result = sqlx::query(
            r#"
            UPDATE reviews
            SET rating = $2, title = $3, comment = $4, updated_at = $5
            WHERE id = $1
            "#,
        )
        .bind(review.id.as_uuid())
        .bind(i16::from(review.rating))
        .bind(&review.title)
        .bind(&review.comment)
        .bind(review.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("update_review", e))?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound);
        }
        Ok(())
    }

    #[instrument(skip(self), fields(review_id = %id), err)]
    async fn delete_review(&self, id: ReviewId) -> StoreResult<()> {
        let result = sqlx::query("DELETE FROM reviews WHERE id = $1")
            .bind(id.as_uuid())
            .execute(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("delete_review", e))?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound);
        }
        Ok(())
    }

    async fn list_reviews(&self, filter: ReviewFilter) -> StoreResult<Vec<ReviewDetails>> {
        let (product_id, user_id): (Option<Uuid>, Option<Uuid>) = match filter {
            ReviewFilter::All => (None, None),
            ReviewFilter::Product(id) => (Some(*id.as_uuid()), None),
            ReviewFilter::Author(id) => (None, Some(*id.as_uuid())),
        };

        let rows = sqlx::query_as::<_, ReviewDetailsRow>(&format!(
            r#"{REVIEW_DETAILS_SELECT}
            WHERE ($1::uuid IS NULL OR r.product_id = $1)
              AND ($2::uuid IS NULL OR r.user_id = $2)
            ORDER BY r.created_at DESC, r.id DESC
            "#
        ))
        .bind(product_id)
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("list_reviews", e))?;

        rows.into_iter().map(ReviewDetails::try_from).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use storefront_orders::{LineItemRequest, PlaceOrder, place_order};
    use storefront_products::NewProduct;

    use crate::repository::REVIEWS_PRODUCT_USER_KEY;

    /// Needs a disposable Postgres: `DATABASE_URL=... cargo test -- --ignored`.
    async fn database() -> Option<PgDatabase> {
        let url = std::env::var("DATABASE_URL").ok()?;
        Some(PgDatabase::connect(&url).await.expect("connect + migrate"))
    }

    fn suffix() -> String {
        Uuid::now_v7().simple().to_string()
    }

    async fn seed_user_and_product(db: &PgDatabase) -> (UserId, ProductId) {
        let tag = suffix();
        let user = User {
            id: UserId::new(),
            username: format!("pg-{tag}"),
            email: format!("pg-{tag}@example.com"),
            first_name: "Pg".to_string(),
            last_name: "User".to_string(),
            password_hash: "x".to_string(),
            date_joined: Utc::now(),
        };
        db.insert_user(&user).await.unwrap();

        let product = NewProduct {
            name: "Netflix Premium".to_string(),
            slug: format!("netflix-{tag}"),
            description: "Streaming".to_string(),
            price: Decimal::new(1999, 2),
            category: None,
            stock: 10,
            is_active: true,
        }
        .into_product(Utc::now())
        .unwrap();
        assert!(db.ensure_product(&product).await.unwrap());

        (user.id, product.id)
    }

    fn review(product_id: ProductId, user_id: UserId, rating: i64) -> Review {
        let now = Utc::now();
        Review {
            id: ReviewId::new(),
            product_id,
            user_id,
            rating: Rating::try_new(rating).unwrap(),
            title: "Great".to_string(),
            comment: "Works well".to_string(),
            created_at: now,
            updated_at: now,
        }
    }

    #[tokio::test]
    #[ignore = "requires DATABASE_URL"]
    async fn second_review_hits_product_user_constraint() {
        let Some(db) = database().await else { return };
        let (user, product) = seed_user_and_product(&db).await;

        db.insert_review(&review(product, user, 5)).await.unwrap();
        let err = db.insert_review(&review(product, user, 1)).await.unwrap_err();
        assert!(err.is_unique_violation_of(REVIEWS_PRODUCT_USER_KEY), "{err:?}");

        let stored = db.list_reviews(ReviewFilter::Product(product)).await.unwrap();
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].review.rating.value(), 5);
    }

    #[tokio::test]
    #[ignore = "requires DATABASE_URL"]
    async fn failed_item_insert_rolls_back_the_order() {
        let Some(db) = database().await else { return };
        let line = |name: &str| LineItemRequest {
            product_name: name.to_string(),
            product_price: Decimal::new(999, 2),
            quantity: 1,
        };
        let mut order = place_order(
            PlaceOrder {
                customer_name: "John Doe".to_string(),
                customer_email: "john@example.com".to_string(),
                items: vec![line("Spotify Premium"), line("Spotify Family")],
            },
            Utc::now(),
        )
        .unwrap();
        // Same primary key twice: the second item insert fails inside the tx.
        order.items[1].id = order.items[0].id;

        assert!(db.insert_order(&order).await.is_err());
        assert_eq!(db.find_order(order.id).await.unwrap(), None);
    }

    #[tokio::test]
    #[ignore = "requires DATABASE_URL"]
    async fn order_round_trips_with_items_in_order() {
        let Some(db) = database().await else { return };
        let order = place_order(
            PlaceOrder {
                customer_name: "John Doe".to_string(),
                customer_email: "john@example.com".to_string(),
                items: vec![
                    LineItemRequest {
                        product_name: "Spotify Premium".to_string(),
                        product_price: Decimal::new(999, 2),
                        quantity: 1,
                    },
                    LineItemRequest {
                        product_name: "ChatGPT Plus".to_string(),
                        product_price: Decimal::new(2000, 2),
                        quantity: 1,
                    },
                ],
            },
            Utc::now(),
        )
        .unwrap();

        db.insert_order(&order).await.unwrap();
        let loaded = db.find_order(order.id).await.unwrap().unwrap();
        assert_eq!(loaded.total_amount.to_string(), "29.99");
        assert_eq!(loaded.items, order.items);
    }
}
