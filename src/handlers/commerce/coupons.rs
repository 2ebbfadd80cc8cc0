use crate::handlers::common::{
    created_response, map_service_error, no_content_response, success_response, JsonBody,
};
use crate::{
    auth::{AuthRouterExt, ADMIN_ROLE},
    entities::commerce::{CouponModel, DiscountType},
    errors::ApiError,
    services::commerce::CreateCouponInput,
    ApiResponse, AppState,
};
use axum::{
    extract::{Path, State},
    response::IntoResponse,
    routing::{delete, get, put},
    Router,
};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use utoipa::ToSchema;
use uuid::Uuid;

/// Coupon administration; every route requires the admin role.
pub fn coupons_routes() -> Router<AppState> {
    Router::new()
        .route("/admin/coupons", get(list_coupons).post(create_coupon))
        .route("/admin/coupons/:id/toggle", put(toggle_coupon))
        .route("/admin/coupons/:id", delete(delete_coupon))
        .with_role(ADMIN_ROLE)
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CouponResponse {
    pub id: Uuid,
    pub code: String,
    pub description: Option<String>,
    pub discount_type: DiscountType,
    pub discount_value: Decimal,
    pub minimum_order: Decimal,
    pub maximum_discount: Option<Decimal>,
    pub usage_limit: Option<i32>,
    pub used_count: i32,
    pub valid_from: DateTime<Utc>,
    pub valid_until: DateTime<Utc>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

impl From<CouponModel> for CouponResponse {
    fn from(c: CouponModel) -> Self {
        Self {
            id: c.id,
            code: c.code,
            description: c.description,
            discount_type: c.discount_type,
            discount_value: c.discount_value,
            minimum_order: c.minimum_order,
            maximum_discount: c.maximum_discount,
            usage_limit: c.usage_limit,
            used_count: c.used_count,
            valid_from: c.valid_from,
            valid_until: c.valid_until,
            is_active: c.is_active,
            created_at: c.created_at,
        }
    }
}

#[utoipa::path(
    get,
    path = "/api/v1/admin/coupons",
    responses(
        (status = 200, description = "Coupons, newest first", body = crate::ApiResponse<Vec<CouponResponse>>),
        (status = 403, description = "Forbidden", body = crate::errors::ErrorResponse)
    ),
    security(("Bearer" = [])),
    tag = "Admin"
)]
pub async fn list_coupons(State(state): State<AppState>) -> Result<impl IntoResponse, ApiError> {
    let coupons: Vec<CouponResponse> = state
        .services
        .coupons
        .list()
        .await
        .map_err(map_service_error)?
        .into_iter()
        .map(CouponResponse::from)
        .collect();
    Ok(success_response(ApiResponse::success(coupons)))
}

/// Create a coupon. Codes are stored upper-cased.
#[utoipa::path(
    post,
    path = "/api/v1/admin/coupons",
    request_body = CreateCouponInput,
    responses(
        (status = 201, description = "Coupon created", body = crate::ApiResponse<CouponResponse>),
        (status = 400, description = "Invalid payload", body = crate::errors::ErrorResponse),
        (status = 409, description = "Code already exists", body = crate::errors::ErrorResponse)
    ),
    security(("Bearer" = [])),
    tag = "Admin"
)]
pub async fn create_coupon(
    State(state): State<AppState>,
    JsonBody(payload): JsonBody<CreateCouponInput>,
) -> Result<impl IntoResponse, ApiError> {
    let coupon = state
        .services
        .coupons
        .create(payload)
        .await
        .map_err(map_service_error)?;
    Ok(created_response(ApiResponse::success(CouponResponse::from(
        coupon,
    ))))
}

#[utoipa::path(
    put,
    path = "/api/v1/admin/coupons/:id/toggle",
    params(("id" = Uuid, Path, description = "Coupon ID")),
    responses(
        (status = 200, description = "Coupon toggled", body = crate::ApiResponse<CouponResponse>),
        (status = 404, description = "Coupon not found", body = crate::errors::ErrorResponse)
    ),
    security(("Bearer" = [])),
    tag = "Admin"
)]
pub async fn toggle_coupon(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let coupon = state
        .services
        .coupons
        .toggle(id)
        .await
        .map_err(map_service_error)?;
    Ok(success_response(ApiResponse::success(CouponResponse::from(
        coupon,
    ))))
}

#[utoipa::path(
    delete,
    path = "/api/v1/admin/coupons/:id",
    params(("id" = Uuid, Path, description = "Coupon ID")),
    responses((status = 204, description = "Coupon deleted")),
    security(("Bearer" = [])),
    tag = "Admin"
)]
pub async fn delete_coupon(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    state
        .services
        .coupons
        .delete(id)
        .await
        .map_err(map_service_error)?;
    Ok(no_content_response())
}
