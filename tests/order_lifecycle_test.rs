mod common;

use axum::http::{Method, StatusCode};
use common::{response_json, TestApp};
use rust_decimal_macros::dec;
use serde_json::{json, Value};

async fn app_with_order() -> (TestApp, Value) {
    let app = TestApp::new().await;
    let book = app.seed_product("Reader", dec!(12.00), 20).await;
    let order = app
        .place_order(json!([{ "productId": book.id, "quantity": 1 }]), None)
        .await;
    (app, order)
}

async fn set_status(app: &TestApp, order_id: &str, body: Value) -> axum::response::Response {
    let admin = app.admin_token();
    app.request(
        Method::PUT,
        &format!("/api/v1/orders/{}/status", order_id),
        Some(body),
        Some(&admin),
        &[],
    )
    .await
}

#[tokio::test]
async fn order_moves_through_fulfillment() {
    let (app, order) = app_with_order().await;
    let id = order["id"].as_str().expect("id").to_string();

    let processing = set_status(&app, &id, json!({ "status": "processing" })).await;
    assert_eq!(processing.status(), StatusCode::OK);

    let shipped = set_status(
        &app,
        &id,
        json!({ "status": "shipped", "trackingNumber": "1Z999", "notes": "Left the warehouse" }),
    )
    .await;
    assert_eq!(shipped.status(), StatusCode::OK);
    let shipped = response_json(shipped).await;
    assert_eq!(shipped["status"], "shipped");
    assert_eq!(shipped["trackingNumber"], "1Z999");
    assert!(!shipped["shippedAt"].is_null());
    assert!(shipped["deliveredAt"].is_null());

    let delivered = response_json(set_status(&app, &id, json!({ "status": "delivered" })).await).await;
    assert_eq!(delivered["status"], "delivered");
    assert!(!delivered["deliveredAt"].is_null());

    let history = app
        .state
        .services
        .orders
        .history(serde_json::from_value(order["id"].clone()).unwrap())
        .await
        .expect("history");
    let statuses: Vec<String> = history.iter().map(|h| h.status.to_string()).collect();
    assert_eq!(statuses, ["delivered", "shipped", "processing", "pending"]);
    assert_eq!(history[1].notes.as_deref(), Some("Left the warehouse"));
    assert_eq!(history[3].notes.as_deref(), Some("Order created"));
}

#[tokio::test]
async fn illegal_transitions_are_rejected_without_side_effects() {
    let (app, order) = app_with_order().await;
    let id = order["id"].as_str().expect("id").to_string();

    let skip = set_status(&app, &id, json!({ "status": "delivered" })).await;
    assert_eq!(skip.status(), StatusCode::BAD_REQUEST);
    let body = response_json(skip).await;
    assert!(body["message"]
        .as_str()
        .expect("message")
        .contains("pending to delivered"));

    let cancelled = set_status(&app, &id, json!({ "status": "cancelled" })).await;
    assert_eq!(cancelled.status(), StatusCode::OK);

    // Cancelled is terminal.
    let revive = set_status(&app, &id, json!({ "status": "processing" })).await;
    assert_eq!(revive.status(), StatusCode::BAD_REQUEST);

    let history = app
        .state
        .services
        .orders
        .history(serde_json::from_value(order["id"].clone()).unwrap())
        .await
        .expect("history");
    assert_eq!(history.len(), 2);
}

#[tokio::test]
async fn status_changes_require_admin() {
    let (app, order) = app_with_order().await;
    let id = order["id"].as_str().expect("id");
    let uri = format!("/api/v1/orders/{}/status", id);

    let customer = app.user_token("shopper");
    let forbidden = app
        .request(
            Method::PUT,
            &uri,
            Some(json!({ "status": "processing" })),
            Some(&customer),
            &[],
        )
        .await;
    assert_eq!(forbidden.status(), StatusCode::FORBIDDEN);

    let anonymous = app
        .request(Method::PUT, &uri, Some(json!({ "status": "processing" })), None, &[])
        .await;
    assert_eq!(anonymous.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn unknown_order_is_not_found() {
    let app = TestApp::new().await;
    let response = set_status(
        &app,
        &uuid::Uuid::new_v4().to_string(),
        json!({ "status": "processing" }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn payment_status_is_independent_of_lifecycle() {
    let (app, order) = app_with_order().await;
    let id = order["id"].as_str().expect("id");
    let admin = app.admin_token();

    let paid = app
        .request(
            Method::PUT,
            &format!("/api/v1/orders/{}/payment", id),
            Some(json!({ "paymentStatus": "paid", "paymentIntentId": "pi_123" })),
            Some(&admin),
            &[],
        )
        .await;
    assert_eq!(paid.status(), StatusCode::OK);
    let paid = response_json(paid).await;
    assert_eq!(paid["paymentStatus"], "paid");
    assert_eq!(paid["paymentIntentId"], "pi_123");
    assert_eq!(paid["status"], "pending");

    // Omitting the intent keeps the stored one.
    let refunded = response_json(
        app.request(
            Method::PUT,
            &format!("/api/v1/orders/{}/payment", id),
            Some(json!({ "paymentStatus": "refunded" })),
            Some(&admin),
            &[],
        )
        .await,
    )
    .await;
    assert_eq!(refunded["paymentStatus"], "refunded");
    assert_eq!(refunded["paymentIntentId"], "pi_123");
}

#[tokio::test]
async fn tracking_requires_the_matching_email() {
    let (app, order) = app_with_order().await;
    let number = order["orderNumber"].as_str().expect("number");

    let found = app
        .request(
            Method::GET,
            &format!("/api/v1/orders/track/{}?email=ANA%40example.com", number),
            None,
            None,
            &[],
        )
        .await;
    assert_eq!(found.status(), StatusCode::OK);
    let tracked = response_json(found).await;
    assert_eq!(tracked["orderNumber"], number);
    assert_eq!(tracked["statusHistory"].as_array().expect("history").len(), 1);

    let wrong = app
        .request(
            Method::GET,
            &format!("/api/v1/orders/track/{}?email=someone%40example.com", number),
            None,
            None,
            &[],
        )
        .await;
    assert_eq!(wrong.status(), StatusCode::NOT_FOUND);

    let missing = app
        .request(
            Method::GET,
            &format!("/api/v1/orders/track/{}", number),
            None,
            None,
            &[],
        )
        .await;
    assert_eq!(missing.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn customers_only_see_their_own_orders() {
    let app = TestApp::new().await;
    let book = app.seed_product("Reader", dec!(12.00), 20).await;
    let owner = app.user_token("owner");

    let created = response_json(
        app.request(
            Method::POST,
            "/api/v1/orders",
            Some(common::order_payload(json!([{ "productId": book.id, "quantity": 1 }]))),
            Some(&owner),
            &[],
        )
        .await,
    )
    .await;
    let uri = format!("/api/v1/orders/{}", created["id"].as_str().expect("id"));

    let own = app.request(Method::GET, &uri, None, Some(&owner), &[]).await;
    assert_eq!(own.status(), StatusCode::OK);
    assert!(response_json(own).await["statusHistory"].is_array());

    let other = app.user_token("someone-else");
    let hidden = app.request(Method::GET, &uri, None, Some(&other), &[]).await;
    assert_eq!(hidden.status(), StatusCode::NOT_FOUND);

    let admin = app.admin_token();
    let as_admin = app.request(Method::GET, &uri, None, Some(&admin), &[]).await;
    assert_eq!(as_admin.status(), StatusCode::OK);

    let anonymous = app.request(Method::GET, &uri, None, None, &[]).await;
    assert_eq!(anonymous.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn admin_listing_filters_by_status() {
    let app = TestApp::new().await;
    let book = app.seed_product("Reader", dec!(12.00), 20).await;
    let mut ids = Vec::new();
    for _ in 0..3 {
        let order = app
            .place_order(json!([{ "productId": book.id, "quantity": 1 }]), None)
            .await;
        ids.push(order["id"].as_str().expect("id").to_string());
    }
    set_status(&app, &ids[0], json!({ "status": "processing" })).await;

    let admin = app.admin_token();
    let all = response_json(
        app.request(Method::GET, "/api/v1/admin/orders", None, Some(&admin), &[])
            .await,
    )
    .await;
    assert_eq!(all["success"], true);
    assert_eq!(all["data"].as_array().expect("orders").len(), 3);

    let processing = response_json(
        app.request(
            Method::GET,
            "/api/v1/admin/orders?status=processing",
            None,
            Some(&admin),
            &[],
        )
        .await,
    )
    .await;
    let data = processing["data"].as_array().expect("orders");
    assert_eq!(data.len(), 1);
    assert_eq!(data[0]["id"], ids[0].as_str());

    let paged = response_json(
        app.request(
            Method::GET,
            "/api/v1/admin/orders?limit=2&offset=2",
            None,
            Some(&admin),
            &[],
        )
        .await,
    )
    .await;
    assert_eq!(paged["data"].as_array().expect("orders").len(), 1);

    let customer = app.user_token("shopper");
    let forbidden = app
        .request(Method::GET, "/api/v1/admin/orders", None, Some(&customer), &[])
        .await;
    assert_eq!(forbidden.status(), StatusCode::FORBIDDEN);
}
