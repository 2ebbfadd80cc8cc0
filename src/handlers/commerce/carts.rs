use crate::handlers::common::{
    map_service_error, session_id_from, success_response, validate_input, JsonBody,
};
use crate::{
    auth::{AuthRouterExt, AuthUser},
    errors::{ApiError, ServiceError},
    services::commerce::{cart_service::CouponPreview, CartIdentity, CartView, MergeOutcome},
    AppState,
};
use axum::{
    extract::{Path, State},
    http::HeaderMap,
    response::IntoResponse,
    routing::{get, post, put},
    Router,
};
use serde::{Deserialize, Serialize};
use tracing::info;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

/// Cart routes. A bearer token is honoured when present; otherwise the
/// `x-session-id` header identifies the cart.
pub fn carts_routes() -> Router<AppState> {
    let merge = Router::new()
        .route("/cart/merge", post(merge_carts))
        .with_auth();

    Router::new()
        .route("/cart", get(get_cart).delete(clear_cart))
        .route("/cart/items", post(add_item))
        .route("/cart/items/:item_id", put(update_item).delete(remove_item))
        .route("/cart/coupon", post(preview_coupon))
        .with_optional_auth()
        .merge(merge)
}

fn identity(user: Option<AuthUser>, headers: &HeaderMap) -> CartIdentity {
    CartIdentity::from_parts(user.map(|u| u.user_id), session_id_from(headers))
}

#[derive(Debug, Deserialize, Serialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AddItemRequest {
    pub product_id: Uuid,
    #[serde(default = "default_quantity")]
    #[validate(range(min = 1, max = 1000))]
    pub quantity: i32,
}

fn default_quantity() -> i32 {
    1
}

#[derive(Debug, Deserialize, Serialize, Validate, ToSchema)]
pub struct UpdateQuantityRequest {
    #[validate(range(min = 1, max = 1000))]
    pub quantity: i32,
}

#[derive(Debug, Deserialize, Serialize, Validate, ToSchema)]
pub struct ApplyCouponRequest {
    #[validate(length(min = 1, max = 50))]
    pub code: String,
}

#[derive(Debug, Deserialize, Serialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct MergeCartRequest {
    #[validate(length(min = 1, max = 128))]
    pub session_id: String,
    #[validate(length(min = 1, max = 255))]
    pub user_id: String,
}

/// Get the caller's cart
#[utoipa::path(
    get,
    path = "/api/v1/cart",
    params(("x-session-id" = Option<String>, Header, description = "Guest cart token")),
    responses(
        (status = 200, description = "Cart with live prices", body = CartView),
        (status = 401, description = "Invalid bearer token", body = crate::errors::ErrorResponse)
    ),
    tag = "Cart"
)]
pub async fn get_cart(
    State(state): State<AppState>,
    user: Option<AuthUser>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, ApiError> {
    let cart = state
        .services
        .cart
        .view_cart(&identity(user, &headers))
        .await
        .map_err(map_service_error)?;
    Ok(success_response(cart))
}

/// Add a product to the cart, merging with an existing line
#[utoipa::path(
    post,
    path = "/api/v1/cart/items",
    request_body = AddItemRequest,
    responses(
        (status = 200, description = "Updated cart", body = CartView),
        (status = 400, description = "Invalid quantity or insufficient stock", body = crate::errors::ErrorResponse),
        (status = 404, description = "Product not found", body = crate::errors::ErrorResponse)
    ),
    tag = "Cart"
)]
pub async fn add_item(
    State(state): State<AppState>,
    user: Option<AuthUser>,
    headers: HeaderMap,
    JsonBody(payload): JsonBody<AddItemRequest>,
) -> Result<impl IntoResponse, ApiError> {
    validate_input(&payload)?;

    let cart = state
        .services
        .cart
        .add_item(&identity(user, &headers), payload.product_id, payload.quantity)
        .await
        .map_err(map_service_error)?;
    Ok(success_response(cart))
}

/// Set a cart line's quantity
#[utoipa::path(
    put,
    path = "/api/v1/cart/items/:item_id",
    params(("item_id" = Uuid, Path, description = "Cart item ID")),
    request_body = UpdateQuantityRequest,
    responses(
        (status = 200, description = "Updated cart", body = CartView),
        (status = 400, description = "Invalid quantity or insufficient stock", body = crate::errors::ErrorResponse),
        (status = 404, description = "Item not in this cart", body = crate::errors::ErrorResponse)
    ),
    tag = "Cart"
)]
pub async fn update_item(
    State(state): State<AppState>,
    user: Option<AuthUser>,
    headers: HeaderMap,
    Path(item_id): Path<Uuid>,
    JsonBody(payload): JsonBody<UpdateQuantityRequest>,
) -> Result<impl IntoResponse, ApiError> {
    validate_input(&payload)?;

    let cart = state
        .services
        .cart
        .update_item_quantity(&identity(user, &headers), item_id, payload.quantity)
        .await
        .map_err(map_service_error)?;
    Ok(success_response(cart))
}

/// Remove a cart line. Missing lines are ignored.
#[utoipa::path(
    delete,
    path = "/api/v1/cart/items/:item_id",
    params(("item_id" = Uuid, Path, description = "Cart item ID")),
    responses((status = 200, description = "Updated cart", body = CartView)),
    tag = "Cart"
)]
pub async fn remove_item(
    State(state): State<AppState>,
    user: Option<AuthUser>,
    headers: HeaderMap,
    Path(item_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let cart = state
        .services
        .cart
        .remove_item(&identity(user, &headers), item_id)
        .await
        .map_err(map_service_error)?;
    Ok(success_response(cart))
}

/// Remove every line from the cart
#[utoipa::path(
    delete,
    path = "/api/v1/cart",
    responses((status = 200, description = "Emptied cart", body = CartView)),
    tag = "Cart"
)]
pub async fn clear_cart(
    State(state): State<AppState>,
    user: Option<AuthUser>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, ApiError> {
    let cart = state
        .services
        .cart
        .clear(&identity(user, &headers))
        .await
        .map_err(map_service_error)?;
    Ok(success_response(cart))
}

/// Preview cart pricing with a coupon; nothing is persisted
#[utoipa::path(
    post,
    path = "/api/v1/cart/coupon",
    request_body = ApplyCouponRequest,
    responses(
        (status = 200, description = "Priced cart", body = CouponPreview),
        (status = 400, description = "Coupon rejected", body = crate::errors::ErrorResponse)
    ),
    tag = "Cart"
)]
pub async fn preview_coupon(
    State(state): State<AppState>,
    user: Option<AuthUser>,
    headers: HeaderMap,
    JsonBody(payload): JsonBody<ApplyCouponRequest>,
) -> Result<impl IntoResponse, ApiError> {
    validate_input(&payload)?;

    let preview = state
        .services
        .cart
        .preview_coupon(&identity(user, &headers), &payload.code)
        .await
        .map_err(map_service_error)?;
    Ok(success_response(preview))
}

/// Fold a guest cart into the user's cart after login
#[utoipa::path(
    post,
    path = "/api/v1/cart/merge",
    request_body = MergeCartRequest,
    responses(
        (status = 200, description = "Merge result", body = MergeOutcome),
        (status = 401, description = "Missing bearer token", body = crate::errors::ErrorResponse),
        (status = 403, description = "Caller is not that user", body = crate::errors::ErrorResponse)
    ),
    security(("Bearer" = [])),
    tag = "Cart"
)]
pub async fn merge_carts(
    State(state): State<AppState>,
    user: AuthUser,
    JsonBody(payload): JsonBody<MergeCartRequest>,
) -> Result<impl IntoResponse, ApiError> {
    validate_input(&payload)?;

    if user.user_id != payload.user_id && !user.is_admin() {
        return Err(ServiceError::Forbidden("cannot merge into another user's cart".into()).into());
    }

    let outcome = state
        .services
        .cart_merge
        .merge(&payload.session_id, &payload.user_id)
        .await
        .map_err(map_service_error)?;

    info!(user_id = %payload.user_id, ?outcome, "cart merge requested");
    Ok(success_response(outcome))
}
