#![allow(dead_code)]

use std::sync::Arc;

use axum::{
    body::{self, Body},
    http::{Method, Request},
    response::Response,
    Router,
};
use chrono::{DateTime, Duration, Utc};
use rust_decimal::Decimal;
use sea_orm::{ActiveModelTrait, EntityTrait, Set};
use serde_json::{json, Value};
use storefront_commerce::{
    auth::{AuthConfig, AuthService, ADMIN_ROLE},
    config::AppConfig,
    db,
    entities::commerce::{coupon, product, CouponModel, DiscountType, Product, ProductModel, ProductStatus},
    events::{self, EventSender},
    AppState,
};
use tempfile::TempDir;
use tokio::{sync::mpsc, task::JoinHandle};
use tower::ServiceExt;
use uuid::Uuid;

const TEST_SECRET: &str = "integration_test_secret_with_plenty_of_entropy_42";

/// Full application wired to a throwaway SQLite file.
pub struct TestApp {
    router: Router,
    pub state: AppState,
    auth_service: Arc<AuthService>,
    event_task: JoinHandle<()>,
    _db_dir: TempDir,
}

impl TestApp {
    pub async fn new() -> Self {
        Self::with_pool_size(1).await
    }

    /// Same wiring over a pool of `connections`; the SQLite file runs in WAL
    /// mode so concurrent requests really race on the database.
    pub async fn with_pool_size(connections: u32) -> Self {
        let db_dir = tempfile::tempdir().expect("temp dir");
        let db_path = db_dir.path().join("storefront_test.db");

        let mut cfg = AppConfig::new(
            format!("sqlite://{}?mode=rwc", db_path.display()),
            TEST_SECRET.to_string(),
            "127.0.0.1".to_string(),
            18_080,
            "test".to_string(),
        );
        cfg.db_max_connections = connections;
        cfg.db_min_connections = 1;

        let pool = db::establish_connection_from_app_config(&cfg)
            .await
            .expect("failed to create test database");
        db::run_migrations(&pool)
            .await
            .expect("failed to run migrations in tests");

        let (event_tx, event_rx) = mpsc::channel(256);
        let event_task = tokio::spawn(events::process_events(event_rx));
        let event_sender = Arc::new(EventSender::new(event_tx));

        let auth_service = Arc::new(AuthService::new(AuthConfig::from(&cfg)));
        let state = AppState::new(Arc::new(pool), cfg, event_sender);
        let router = storefront_commerce::build_router(state.clone(), auth_service.clone());

        Self {
            router,
            state,
            auth_service,
            event_task,
            _db_dir: db_dir,
        }
    }

    pub fn user_token(&self, user_id: &str) -> String {
        self.auth_service
            .issue_token(user_id, &[], Duration::hours(1))
            .expect("issue user token")
    }

    pub fn admin_token(&self) -> String {
        self.auth_service
            .issue_token("admin-1", &[ADMIN_ROLE], Duration::hours(1))
            .expect("issue admin token")
    }

    /// Sends a request through the full router, middleware included.
    pub async fn request(
        &self,
        method: Method,
        uri: &str,
        body: Option<Value>,
        token: Option<&str>,
        headers: &[(&str, &str)],
    ) -> Response {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(tok) = token {
            builder = builder.header("authorization", format!("Bearer {}", tok));
        }
        for (name, value) in headers {
            builder = builder.header(*name, *value);
        }

        let body = match body {
            Some(payload) => {
                builder = builder.header("content-type", "application/json");
                Body::from(serde_json::to_vec(&payload).expect("serialize request body"))
            }
            None => Body::empty(),
        };

        self.router
            .clone()
            .oneshot(builder.body(body).expect("build request"))
            .await
            .expect("router error during test request")
    }

    /// Request made by a guest identified only by `session`.
    pub async fn guest(
        &self,
        method: Method,
        uri: &str,
        body: Option<Value>,
        session: &str,
    ) -> Response {
        self.request(method, uri, body, None, &[("x-session-id", session)])
            .await
    }

    pub async fn seed_product(&self, name: &str, price: Decimal, stock: i32) -> ProductModel {
        self.seed_product_with(name, price, None, stock, true).await
    }

    pub async fn seed_product_with(
        &self,
        name: &str,
        price: Decimal,
        sale_price: Option<Decimal>,
        stock: i32,
        track_inventory: bool,
    ) -> ProductModel {
        let now = Utc::now();
        let id = Uuid::new_v4();
        product::ActiveModel {
            id: Set(id),
            name: Set(name.to_string()),
            slug: Set(format!("{}-{}", name.to_lowercase().replace(' ', "-"), id.simple())),
            price: Set(price),
            sale_price: Set(sale_price),
            stock_quantity: Set(stock),
            track_inventory: Set(track_inventory),
            low_stock_threshold: Set(5),
            status: Set(ProductStatus::Active),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(&*self.state.db)
        .await
        .expect("seed product")
    }

    pub async fn stock_of(&self, product_id: Uuid) -> i32 {
        Product::find_by_id(product_id)
            .one(&*self.state.db)
            .await
            .expect("load product")
            .expect("product exists")
            .stock_quantity
    }

    pub async fn seed_coupon(&self, seed: CouponSeed) -> CouponModel {
        let now = Utc::now();
        coupon::ActiveModel {
            id: Set(Uuid::new_v4()),
            code: Set(seed.code.to_string()),
            description: Set(None),
            discount_type: Set(seed.discount_type),
            discount_value: Set(seed.value),
            minimum_order: Set(seed.minimum_order),
            maximum_discount: Set(seed.maximum_discount),
            usage_limit: Set(seed.usage_limit),
            used_count: Set(seed.used_count),
            valid_from: Set(seed.valid_from.unwrap_or(now - Duration::days(1))),
            valid_until: Set(seed.valid_until.unwrap_or(now + Duration::days(30))),
            is_active: Set(seed.is_active),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(&*self.state.db)
        .await
        .expect("seed coupon")
    }

    /// Places an order through the HTTP surface and returns the response body.
    pub async fn place_order(&self, items: Value, coupon: Option<&str>) -> Value {
        let mut payload = order_payload(items);
        if let Some(code) = coupon {
            payload["couponCode"] = json!(code);
        }
        let response = self
            .request(Method::POST, "/api/v1/orders", Some(payload), None, &[])
            .await;
        assert_eq!(response.status(), 201, "order creation should succeed");
        response_json(response).await
    }
}

impl Drop for TestApp {
    fn drop(&mut self) {
        self.event_task.abort();
    }
}

pub struct CouponSeed {
    pub code: &'static str,
    pub discount_type: DiscountType,
    pub value: Decimal,
    pub minimum_order: Decimal,
    pub maximum_discount: Option<Decimal>,
    pub usage_limit: Option<i32>,
    pub used_count: i32,
    pub valid_from: Option<DateTime<Utc>>,
    pub valid_until: Option<DateTime<Utc>>,
    pub is_active: bool,
}

impl CouponSeed {
    pub fn percentage(code: &'static str, value: Decimal) -> Self {
        Self {
            code,
            discount_type: DiscountType::Percentage,
            value,
            minimum_order: Decimal::ZERO,
            maximum_discount: None,
            usage_limit: None,
            used_count: 0,
            valid_from: None,
            valid_until: None,
            is_active: true,
        }
    }

    pub fn fixed(code: &'static str, value: Decimal) -> Self {
        Self {
            discount_type: DiscountType::Fixed,
            ..Self::percentage(code, value)
        }
    }
}

pub async fn response_json(response: Response) -> Value {
    let bytes = body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("response body bytes");
    serde_json::from_slice(&bytes).expect("json response")
}

/// Reads a money field serialized either as a string or a number.
/// SQLite stores decimals as REAL, so values are compared at cent precision.
pub fn money(value: &Value) -> Decimal {
    let parsed = match value {
        Value::String(s) => s.parse::<Decimal>().expect("decimal string"),
        Value::Number(n) => n.to_string().parse::<Decimal>().expect("decimal number"),
        other => panic!("expected a decimal, got {other}"),
    };
    parsed.round_dp(2)
}

pub fn address() -> Value {
    json!({
        "line1": "12 Calle Mayor",
        "city": "Madrid",
        "postalCode": "28013",
        "country": "ES"
    })
}

pub fn order_payload(items: Value) -> Value {
    json!({
        "customerEmail": "ana@example.com",
        "customerFirstName": "Ana",
        "customerLastName": "Lopez",
        "shippingAddress": address(),
        "items": items
    })
}
