use std::sync::Arc;

use chrono::Utc;

use storefront_auth::{Hs256JwtValidator, TokenIssuer};
use storefront_infra::seed::seed_demo_catalog;
use storefront_infra::{
    AccountService, AppConfig, CatalogRepository, CatalogService, InMemoryDatabase,
    OrderRepository, OrderService, PgDatabase, ReviewRepository, ReviewService, ServiceResult,
    UserRepository,
};

/// Everything the handlers need, shared behind one `Arc`.
pub struct AppServices {
    pub accounts: AccountService,
    pub catalog: CatalogService,
    pub orders: OrderService,
    pub reviews: ReviewService,
}

/// One handle per repository port; usually the same store behind each.
struct Stores {
    users: Arc<dyn UserRepository>,
    catalog: Arc<dyn CatalogRepository>,
    orders: Arc<dyn OrderRepository>,
    reviews: Arc<dyn ReviewRepository>,
}

impl Stores {
    fn from_shared<S>(store: Arc<S>) -> Self
    where
        S: UserRepository + CatalogRepository + OrderRepository + ReviewRepository + 'static,
    {
        Self {
            users: store.clone(),
            catalog: store.clone(),
            orders: store.clone(),
            reviews: store,
        }
    }
}

/// Postgres when `DATABASE_URL` is set, otherwise the in-memory store.
pub async fn build_services(config: &AppConfig) -> ServiceResult<AppServices> {
    let stores = match &config.database_url {
        Some(url) => {
            tracing::info!("using postgres store");
            Stores::from_shared(Arc::new(PgDatabase::connect(url).await?))
        }
        None => {
            tracing::warn!("DATABASE_URL not set, using in-memory store");
            Stores::from_shared(Arc::new(InMemoryDatabase::new()))
        }
    };

    if config.seed_catalog {
        seed_demo_catalog(stores.catalog.as_ref(), Utc::now()).await?;
    }

    Ok(assemble(stores, config))
}

/// In-memory services, for tests and local runs.
pub fn in_memory_services(config: &AppConfig) -> (AppServices, Arc<InMemoryDatabase>) {
    let db = Arc::new(InMemoryDatabase::new());
    (assemble(Stores::from_shared(db.clone()), config), db)
}

fn assemble(stores: Stores, config: &AppConfig) -> AppServices {
    let secret = config.jwt_secret.as_bytes();
    let issuer = TokenIssuer::new(secret, config.access_token_ttl, config.refresh_token_ttl);
    let validator = Arc::new(Hs256JwtValidator::new(secret));

    AppServices {
        accounts: AccountService::new(stores.users, issuer, validator),
        catalog: CatalogService::new(stores.catalog.clone()),
        orders: OrderService::new(stores.orders),
        reviews: ReviewService::new(stores.reviews, stores.catalog),
    }
}
