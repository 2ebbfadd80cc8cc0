mod common;

use axum::http::{Method, StatusCode};
use common::{response_json, TestApp};
use rust_decimal_macros::dec;
use sea_orm::{EntityTrait, PaginatorTrait};
use serde_json::json;
use storefront_commerce::entities::commerce::Cart;

#[tokio::test]
async fn guest_cart_is_reassigned_when_user_has_none() {
    let app = TestApp::new().await;
    let mug = app.seed_product("Mug", dec!(10.00), 10).await;
    let guest_cart = response_json(
        app.guest(
            Method::POST,
            "/api/v1/cart/items",
            Some(json!({ "productId": mug.id, "quantity": 2 })),
            "sess-reassign",
        )
        .await,
    )
    .await;

    let token = app.user_token("user-reassign");
    let response = app
        .request(
            Method::POST,
            "/api/v1/cart/merge",
            Some(json!({ "sessionId": "sess-reassign", "userId": "user-reassign" })),
            Some(&token),
            &[],
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let outcome = response_json(response).await;
    assert_eq!(outcome["outcome"], "reassigned");
    assert_eq!(outcome["cartId"], guest_cart["id"]);

    let mine = response_json(
        app.request(Method::GET, "/api/v1/cart", None, Some(&token), &[])
            .await,
    )
    .await;
    assert_eq!(mine["id"], guest_cart["id"]);
    assert_eq!(mine["itemCount"], 2);
    assert!(mine["sessionId"].is_null());
}

#[tokio::test]
async fn merging_into_existing_user_cart_sums_quantities() {
    let app = TestApp::new().await;
    let mug = app.seed_product("Mug", dec!(10.00), 20).await;
    let pen = app.seed_product("Pen", dec!(2.00), 20).await;
    let token = app.user_token("user-merge");

    app.request(
        Method::POST,
        "/api/v1/cart/items",
        Some(json!({ "productId": mug.id, "quantity": 1 })),
        Some(&token),
        &[],
    )
    .await;
    for (product, qty) in [(&mug, 2), (&pen, 3)] {
        app.guest(
            Method::POST,
            "/api/v1/cart/items",
            Some(json!({ "productId": product.id, "quantity": qty })),
            "sess-merge",
        )
        .await;
    }
    assert_eq!(Cart::find().count(&*app.state.db).await.unwrap(), 2);

    let response = app
        .request(
            Method::POST,
            "/api/v1/cart/merge",
            Some(json!({ "sessionId": "sess-merge", "userId": "user-merge" })),
            Some(&token),
            &[],
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let outcome = response_json(response).await;
    assert_eq!(outcome["outcome"], "merged");
    assert_eq!(outcome["linesMerged"], 2);

    let mine = response_json(
        app.request(Method::GET, "/api/v1/cart", None, Some(&token), &[])
            .await,
    )
    .await;
    let items = mine["items"].as_array().expect("items");
    assert_eq!(items.len(), 2);
    let mug_line = items
        .iter()
        .find(|line| line["productId"] == json!(mug.id))
        .expect("mug line");
    assert_eq!(mug_line["quantity"], 3);
    assert_eq!(mine["itemCount"], 6);

    // The guest cart is gone.
    assert_eq!(Cart::find().count(&*app.state.db).await.unwrap(), 1);
}

#[tokio::test]
async fn merge_without_guest_cart_is_a_no_op() {
    let app = TestApp::new().await;
    let token = app.user_token("user-empty");
    let response = app
        .request(
            Method::POST,
            "/api/v1/cart/merge",
            Some(json!({ "sessionId": "never-used", "userId": "user-empty" })),
            Some(&token),
            &[],
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response_json(response).await["outcome"], "no_guest_cart");
}

#[tokio::test]
async fn merge_requires_matching_user() {
    let app = TestApp::new().await;
    let token = app.user_token("user-a");
    let response = app
        .request(
            Method::POST,
            "/api/v1/cart/merge",
            Some(json!({ "sessionId": "sess-x", "userId": "user-b" })),
            Some(&token),
            &[],
        )
        .await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let anonymous = app
        .request(
            Method::POST,
            "/api/v1/cart/merge",
            Some(json!({ "sessionId": "sess-x", "userId": "user-b" })),
            None,
            &[],
        )
        .await;
    assert_eq!(anonymous.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn admin_may_merge_on_behalf_of_a_user() {
    let app = TestApp::new().await;
    let mug = app.seed_product("Mug", dec!(10.00), 10).await;
    app.guest(
        Method::POST,
        "/api/v1/cart/items",
        Some(json!({ "productId": mug.id })),
        "sess-admin",
    )
    .await;

    let outcome = app
        .state
        .services
        .cart_merge
        .merge("sess-admin", "user-c")
        .await
        .expect("merge");
    assert!(matches!(
        outcome,
        storefront_commerce::services::commerce::MergeOutcome::Reassigned { .. }
    ));

    let admin = app.admin_token();
    let again = app
        .request(
            Method::POST,
            "/api/v1/cart/merge",
            Some(json!({ "sessionId": "sess-admin", "userId": "user-c" })),
            Some(&admin),
            &[],
        )
        .await;
    assert_eq!(again.status(), StatusCode::OK);
    assert_eq!(response_json(again).await["outcome"], "no_guest_cart");
}
