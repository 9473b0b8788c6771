use std::sync::Arc;

use chrono::{Duration as ChronoDuration, Utc};
use jsonwebtoken::{Algorithm, EncodingKey, Header};
use reqwest::StatusCode;
use rust_decimal::Decimal;
use serde_json::{Value, json};

use storefront_auth::{JwtClaims, TokenType};
use storefront_core::UserId;
use storefront_infra::{AppConfig, CatalogRepository, InMemoryDatabase};
use storefront_products::NewProduct;

const JWT_SECRET: &str = "test-secret";

struct TestServer {
    base_url: String,
    db: Arc<InMemoryDatabase>,
    handle: tokio::task::JoinHandle<()>,
}

impl TestServer {
    async fn spawn() -> Self {
        let config = AppConfig {
            jwt_secret: JWT_SECRET.to_string(),
            ..AppConfig::default()
        };
        // Same router as prod, over the in-memory store, on an ephemeral port.
        let (services, db) = storefront_api::app::services::in_memory_services(&config);
        let app = storefront_api::app::build_app_with(Arc::new(services), &config);

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("failed to bind ephemeral port");
        let addr = listener.local_addr().unwrap();
        let base_url = format!("http://{}/api", addr);

        let handle = tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            base_url,
            db,
            handle,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn product(&self, name: &str, slug: &str, cents: i64, active: bool) -> String {
        let product = NewProduct {
            name: name.to_string(),
            slug: slug.to_string(),
            description: format!("{name} subscription"),
            price: Decimal::new(cents, 2),
            category: None,
            stock: 100,
            is_active: active,
        }
        .into_product(Utc::now())
        .unwrap();
        self.db.ensure_product(&product).await.unwrap();
        product.id.to_string()
    }

    /// Register `username` and return its access token.
    async fn register(&self, client: &reqwest::Client, username: &str) -> String {
        let res = client
            .post(self.url("/auth/register"))
            .json(&json!({
                "username": username,
                "email": format!("{username}@example.com"),
                "password": "testpass123",
                "password2": "testpass123",
                "first_name": "Test",
                "last_name": "User",
            }))
            .send()
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::CREATED);
        let body: Value = res.json().await.unwrap();
        body["access"].as_str().unwrap().to_string()
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

fn mint_jwt(token_type: TokenType, issued: ChronoDuration, lifetime: ChronoDuration) -> String {
    let iat = Utc::now() - issued;
    let claims = JwtClaims {
        sub: UserId::new(),
        username: "ghost".to_string(),
        token_type,
        iat: iat.timestamp(),
        exp: (iat + lifetime).timestamp(),
    };

    jsonwebtoken::encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(JWT_SECRET.as_bytes()),
    )
    .expect("failed to encode jwt")
}

fn review_body(product: &str, rating: i64) -> Value {
    json!({
        "product": product,
        "rating": rating,
        "title": "Great service!",
        "comment": "Love this product!",
    })
}

#[tokio::test]
async fn health_is_public() {
    let srv = TestServer::spawn().await;
    let res = reqwest::get(srv.base_url.replace("/api", "/health"))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
}

#[tokio::test]
async fn order_totals_are_exact() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();

    let res = client
        .post(srv.url("/orders"))
        .json(&json!({
            "customer_name": "John Doe",
            "customer_email": "john@example.com",
            "items": [
                {"product_name": "Spotify Premium", "product_price": "9.99", "quantity": 1},
                {"product_name": "Netflix Standard", "product_price": "15.49", "quantity": 1},
                {"product_name": "Pixel Pack", "product_price": "0.01", "quantity": 451},
            ],
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CREATED);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["total_amount"], "29.99");
    assert_eq!(body["status"], "pending");
    assert_eq!(body["items"][2]["subtotal"], "4.51");

    let id = body["id"].as_str().unwrap();
    let res = client.get(srv.url(&format!("/orders/{id}"))).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let fetched: Value = res.json().await.unwrap();
    assert_eq!(fetched["items"].as_array().unwrap().len(), 3);
}

#[tokio::test]
async fn invalid_order_is_rejected_and_not_stored() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();

    let res = client
        .post(srv.url("/orders"))
        .json(&json!({
            "customer_name": "John Doe",
            "customer_email": "john@example.com",
            "items": [
                {"product_name": "Spotify Premium", "product_price": "9.99", "quantity": 1},
                {"product_name": "Netflix Standard", "product_price": "15.49", "quantity": 0},
            ],
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    let orders: Value = client
        .get(srv.url("/orders"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert!(orders.as_array().unwrap().is_empty());
}

#[tokio::test]
async fn register_login_refresh_and_profile() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();
    srv.register(&client, "testuser").await;

    let res = client
        .post(srv.url("/auth/login"))
        .json(&json!({"username": "testuser", "password": "wrongpass"}))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);

    let res = client
        .post(srv.url("/auth/login"))
        .json(&json!({"username": "testuser", "password": "testpass123"}))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let tokens: Value = res.json().await.unwrap();
    let access = tokens["access"].as_str().unwrap();
    let refresh = tokens["refresh"].as_str().unwrap();

    let res = client
        .post(srv.url("/auth/token/refresh"))
        .json(&json!({"refresh": refresh}))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let refreshed: Value = res.json().await.unwrap();
    assert!(refreshed["access"].is_string());

    let res = client
        .post(srv.url("/auth/token/refresh"))
        .json(&json!({"refresh": access}))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);

    let res = client
        .patch(srv.url("/auth/user"))
        .bearer_auth(access)
        .json(&json!({"first_name": "New", "email": "new@example.com"}))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    let me: Value = client
        .get(srv.url("/auth/user"))
        .bearer_auth(access)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(me["username"], "testuser");
    assert_eq!(me["first_name"], "New");
    assert_eq!(me["email"], "new@example.com");
}

#[tokio::test]
async fn mismatched_passwords_name_the_field() {
    let srv = TestServer::spawn().await;
    let res = reqwest::Client::new()
        .post(srv.url("/auth/register"))
        .json(&json!({
            "username": "testuser",
            "email": "test@example.com",
            "password": "testpass123",
            "password2": "different123",
            "first_name": "Test",
            "last_name": "User",
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["field"], "password");
}

#[tokio::test]
async fn current_user_requires_authentication() {
    let srv = TestServer::spawn().await;
    let res = reqwest::get(srv.url("/auth/user")).await.unwrap();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn catalog_lists_active_products_only() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();
    let spotify = srv.product("Spotify Premium", "spotify-premium", 999, true).await;
    let retired = srv.product("Retired Plan", "retired-plan", 500, false).await;

    let listed: Value = client
        .get(srv.url("/products?search=spotify"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let listed = listed.as_array().unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0]["price"], "9.99");

    let res = client.get(srv.url(&format!("/products/{spotify}"))).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let res = client.get(srv.url(&format!("/products/{retired}"))).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);

    let res = client.get(srv.url("/products?ordering=rating")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn review_requires_authentication() {
    let srv = TestServer::spawn().await;
    let product = srv.product("Netflix Premium", "netflix-premium", 1999, true).await;

    let res = reqwest::Client::new()
        .post(srv.url("/reviews"))
        .json(&review_body(&product, 5))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn malformed_expired_or_refresh_bearer_is_rejected() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();

    let expired = mint_jwt(
        TokenType::Access,
        ChronoDuration::hours(2),
        ChronoDuration::hours(1),
    );
    let refresh = mint_jwt(
        TokenType::Refresh,
        ChronoDuration::zero(),
        ChronoDuration::hours(1),
    );

    for token in ["not-a-jwt", expired.as_str(), refresh.as_str()] {
        let res = client
            .get(srv.url("/reviews"))
            .bearer_auth(token)
            .send()
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
        let body: Value = res.json().await.unwrap();
        assert_eq!(body["error"], "token_not_valid");
    }
}

#[tokio::test]
async fn duplicate_review_is_rejected_and_first_is_unchanged() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();
    let product = srv.product("Netflix Premium", "netflix-premium", 1999, true).await;
    let token = srv.register(&client, "testuser").await;

    let res = client
        .post(srv.url("/reviews"))
        .bearer_auth(&token)
        .json(&review_body(&product, 5))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CREATED);
    let first: Value = res.json().await.unwrap();
    assert_eq!(first["product_name"], "Netflix Premium");
    assert_eq!(first["user"]["username"], "testuser");

    let res = client
        .post(srv.url("/reviews"))
        .bearer_auth(&token)
        .json(&review_body(&product, 1))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["error"], "duplicate_review");
    assert!(
        body["message"]
            .as_str()
            .unwrap()
            .contains("already reviewed this product")
    );

    let id = first["id"].as_str().unwrap();
    let stored: Value = client
        .get(srv.url(&format!("/reviews/{id}")))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(stored["rating"], 5);
}

#[tokio::test]
async fn out_of_range_rating_is_rejected() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();
    let product = srv.product("Netflix Premium", "netflix-premium", 1999, true).await;
    let token = srv.register(&client, "testuser").await;

    let res = client
        .post(srv.url("/reviews"))
        .bearer_auth(&token)
        .json(&review_body(&product, 6))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn only_the_author_may_modify_a_review() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();
    let product = srv.product("Netflix Premium", "netflix-premium", 1999, true).await;
    let author = srv.register(&client, "author").await;
    let other = srv.register(&client, "other").await;

    let created: Value = client
        .post(srv.url("/reviews"))
        .bearer_auth(&author)
        .json(&review_body(&product, 4))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let review_url = srv.url(&format!("/reviews/{}", created["id"].as_str().unwrap()));

    let res = client
        .patch(&review_url)
        .bearer_auth(&other)
        .json(&json!({"rating": 1}))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::FORBIDDEN);

    let res = client.delete(&review_url).bearer_auth(&other).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::FORBIDDEN);

    let res = client
        .patch(&review_url)
        .bearer_auth(&author)
        .json(&json!({"rating": 0}))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    let res = client
        .put(&review_url)
        .bearer_auth(&author)
        .json(&json!({"rating": 2, "title": "Changed my mind", "comment": "Price went up."}))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let updated: Value = res.json().await.unwrap();
    assert_eq!(updated["rating"], 2);
    assert_eq!(updated["title"], "Changed my mind");

    let res = client.delete(&review_url).bearer_auth(&author).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::NO_CONTENT);

    let res = client.get(&review_url).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn anonymous_callers_cannot_modify_a_review() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();
    let product = srv.product("Netflix Premium", "netflix-premium", 1999, true).await;
    let author = srv.register(&client, "author").await;

    let created: Value = client
        .post(srv.url("/reviews"))
        .bearer_auth(&author)
        .json(&review_body(&product, 4))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let review_url = srv.url(&format!("/reviews/{}", created["id"].as_str().unwrap()));

    let attempts = [
        client
            .put(&review_url)
            .json(&json!({"rating": 1, "title": "Hijacked", "comment": "Not mine."})),
        client.patch(&review_url).json(&json!({"rating": 1})),
        client.delete(&review_url),
    ];
    for request in attempts {
        let res = request.send().await.unwrap();
        assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
        let body: Value = res.json().await.unwrap();
        assert_eq!(body["error"], "not_authenticated");
    }

    let res = client.get(&review_url).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let review: Value = res.json().await.unwrap();
    assert_eq!(review["rating"], 4);
    assert_eq!(review["title"], "Great service!");
    assert_eq!(review["comment"], "Love this product!");
}

#[tokio::test]
async fn product_reviews_aggregate_ratings() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();
    let product = srv.product("Netflix Premium", "netflix-premium", 1999, true).await;

    let empty: Value = client
        .get(srv.url(&format!("/reviews/product_reviews?product_id={product}")))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(empty["total_reviews"], 0);
    assert_eq!(empty["average_rating"], 0.0);

    for (username, rating) in [("alice", 5), ("bob", 4)] {
        let token = srv.register(&client, username).await;
        let res = client
            .post(srv.url("/reviews"))
            .bearer_auth(&token)
            .json(&review_body(&product, rating))
            .send()
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::CREATED);
    }

    let body: Value = client
        .get(srv.url(&format!("/reviews/product_reviews?product_id={product}")))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body["total_reviews"], 2);
    assert_eq!(body["average_rating"], 4.5);
    assert_eq!(body["reviews"].as_array().unwrap().len(), 2);

    let res = client
        .get(srv.url("/reviews/product_reviews"))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    let res = client
        .get(srv.url(&format!(
            "/reviews/product_reviews?product_id={}",
            UserId::new()
        )))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn my_reviews_lists_only_the_callers_reviews() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();
    let netflix = srv.product("Netflix Premium", "netflix-premium", 1999, true).await;
    let spotify = srv.product("Spotify Premium", "spotify-premium", 999, true).await;
    let alice = srv.register(&client, "alice").await;
    let bob = srv.register(&client, "bob").await;

    for (token, product) in [(&alice, &netflix), (&alice, &spotify), (&bob, &netflix)] {
        let res = client
            .post(srv.url("/reviews"))
            .bearer_auth(token)
            .json(&review_body(product, 5))
            .send()
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::CREATED);
    }

    let res = client.get(srv.url("/reviews/my_reviews")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);

    let mine: Value = client
        .get(srv.url("/reviews/my_reviews"))
        .bearer_auth(&alice)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let mine = mine.as_array().unwrap();
    assert_eq!(mine.len(), 2);
    assert!(mine.iter().all(|r| r["user"]["username"] == "alice"));
}
