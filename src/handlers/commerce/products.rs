use crate::handlers::common::{map_service_error, success_response, validate_input, JsonBody};
use crate::{
    auth::{AuthRouterExt, ADMIN_ROLE},
    entities::commerce::ProductModel,
    errors::ApiError,
    services::commerce::BatchStockCheck,
    ApiResponse, AppState,
};
use axum::{
    extract::State,
    response::IntoResponse,
    routing::{get, post},
    Router,
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

const MAX_STOCK_CHECK_ITEMS: usize = 100;

pub fn products_routes() -> Router<AppState> {
    let admin = Router::new()
        .route("/admin/products/low-stock", get(low_stock))
        .with_role(ADMIN_ROLE);

    Router::new()
        .route("/products/check-stock", post(check_stock))
        .merge(admin)
}

#[derive(Debug, Deserialize, Serialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct StockItemRequest {
    pub product_id: Uuid,
    #[validate(range(min = 1))]
    pub quantity: i32,
}

#[derive(Debug, Deserialize, Serialize, Validate, ToSchema)]
pub struct CheckStockRequest {
    #[validate]
    pub items: Vec<StockItemRequest>,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LowStockProduct {
    pub id: Uuid,
    pub name: String,
    pub slug: String,
    pub price: Decimal,
    pub stock_quantity: i32,
    pub low_stock_threshold: i32,
}

impl From<ProductModel> for LowStockProduct {
    fn from(product: ProductModel) -> Self {
        Self {
            id: product.id,
            name: product.name,
            slug: product.slug,
            price: product.price,
            stock_quantity: product.stock_quantity,
            low_stock_threshold: product.low_stock_threshold,
        }
    }
}

/// Check availability for several products at once
#[utoipa::path(
    post,
    path = "/api/v1/products/check-stock",
    request_body = CheckStockRequest,
    responses(
        (status = 200, description = "Per-product availability", body = BatchStockCheck),
        (status = 400, description = "Invalid payload", body = crate::errors::ErrorResponse)
    ),
    tag = "Products"
)]
pub async fn check_stock(
    State(state): State<AppState>,
    JsonBody(payload): JsonBody<CheckStockRequest>,
) -> Result<impl IntoResponse, ApiError> {
    validate_input(&payload)?;
    if payload.items.is_empty() || payload.items.len() > MAX_STOCK_CHECK_ITEMS {
        return Err(ApiError::ValidationError(format!(
            "items must contain between 1 and {} entries",
            MAX_STOCK_CHECK_ITEMS
        )));
    }

    let items: Vec<(Uuid, i32)> = payload
        .items
        .iter()
        .map(|item| (item.product_id, item.quantity))
        .collect();
    let result = state
        .services
        .inventory
        .check_batch(&items)
        .await
        .map_err(map_service_error)?;
    Ok(success_response(result))
}

/// Tracked products at or below their low-stock threshold
#[utoipa::path(
    get,
    path = "/api/v1/admin/products/low-stock",
    responses(
        (status = 200, description = "Low-stock products, lowest first", body = crate::ApiResponse<Vec<LowStockProduct>>),
        (status = 403, description = "Forbidden", body = crate::errors::ErrorResponse)
    ),
    security(("Bearer" = [])),
    tag = "Admin"
)]
pub async fn low_stock(State(state): State<AppState>) -> Result<impl IntoResponse, ApiError> {
    let products: Vec<LowStockProduct> = state
        .services
        .inventory
        .low_stock()
        .await
        .map_err(map_service_error)?
        .into_iter()
        .map(LowStockProduct::from)
        .collect();
    Ok(success_response(ApiResponse::success(products)))
}
