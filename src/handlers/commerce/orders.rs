use crate::handlers::common::{
    created_response, map_service_error, success_response, validate_input, JsonBody,
};
use crate::{
    auth::{AuthRouterExt, AuthUser, ADMIN_ROLE},
    errors::ApiError,
    services::commerce::order_service::{
        CreateOrderInput, CreatedOrder, OrderFilter, OrderView, PaymentUpdateInput,
        TransitionInput,
    },
    ApiResponse, AppState,
};
use axum::{
    extract::{Path, Query, State},
    response::IntoResponse,
    routing::{get, post, put},
    Router,
};
use serde::Deserialize;
use utoipa::IntoParams;
use uuid::Uuid;

pub fn orders_routes() -> Router<AppState> {
    let checkout = Router::new()
        .route("/orders", post(create_order))
        .with_optional_auth();

    let public = Router::new().route("/orders/track/:order_number", get(track_order));

    let customer = Router::new()
        .route("/orders/my-orders", get(my_orders))
        .route("/orders/:id", get(get_order))
        .with_auth();

    let admin = Router::new()
        .route("/orders/:id/status", put(update_status))
        .route("/orders/:id/payment", put(update_payment))
        .route("/admin/orders", get(list_orders))
        .with_role(ADMIN_ROLE);

    Router::new()
        .merge(checkout)
        .merge(public)
        .merge(customer)
        .merge(admin)
}

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct TrackQuery {
    /// Email the order was placed with
    pub email: Option<String>,
}

/// Place an order
#[utoipa::path(
    post,
    path = "/api/v1/orders",
    request_body = CreateOrderInput,
    responses(
        (status = 201, description = "Order created", body = CreatedOrder),
        (status = 400, description = "Invalid payload or insufficient stock", body = crate::errors::ErrorResponse)
    ),
    tag = "Orders"
)]
pub async fn create_order(
    State(state): State<AppState>,
    user: Option<AuthUser>,
    JsonBody(payload): JsonBody<CreateOrderInput>,
) -> Result<impl IntoResponse, ApiError> {
    validate_input(&payload)?;

    let order = state
        .services
        .orders
        .create_order(payload, user.map(|u| u.user_id))
        .await
        .map_err(map_service_error)?;

    Ok(created_response(CreatedOrder::from(&order)))
}

/// Public order lookup gated by the customer's email
#[utoipa::path(
    get,
    path = "/api/v1/orders/track/:order_number",
    params(("order_number" = String, Path, description = "Order number"), TrackQuery),
    responses(
        (status = 200, description = "Order with status history", body = OrderView),
        (status = 400, description = "Email missing", body = crate::errors::ErrorResponse),
        (status = 404, description = "No order with that number and email", body = crate::errors::ErrorResponse)
    ),
    tag = "Orders"
)]
pub async fn track_order(
    State(state): State<AppState>,
    Path(order_number): Path<String>,
    Query(query): Query<TrackQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let email = query
        .email
        .filter(|e| !e.trim().is_empty())
        .ok_or_else(|| ApiError::BadRequest("email query parameter is required".into()))?;

    let order = state
        .services
        .orders
        .track(&order_number, &email)
        .await
        .map_err(map_service_error)?;
    Ok(success_response(order))
}

/// Orders placed by the authenticated caller
#[utoipa::path(
    get,
    path = "/api/v1/orders/my-orders",
    responses(
        (status = 200, description = "Caller's orders, newest first", body = [OrderView]),
        (status = 401, description = "Unauthorized", body = crate::errors::ErrorResponse)
    ),
    security(("Bearer" = [])),
    tag = "Orders"
)]
pub async fn my_orders(
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<impl IntoResponse, ApiError> {
    let orders = state
        .services
        .orders
        .my_orders(&user.user_id)
        .await
        .map_err(map_service_error)?;
    Ok(success_response(orders))
}

#[utoipa::path(
    get,
    path = "/api/v1/orders/:id",
    params(("id" = Uuid, Path, description = "Order ID")),
    responses(
        (status = 200, description = "Order with status history", body = OrderView),
        (status = 404, description = "Order not found", body = crate::errors::ErrorResponse)
    ),
    security(("Bearer" = [])),
    tag = "Orders"
)]
pub async fn get_order(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let order = state
        .services
        .orders
        .get_for_user(id, &user.user_id, user.is_admin())
        .await
        .map_err(map_service_error)?;
    Ok(success_response(order))
}

/// Move an order along its lifecycle
#[utoipa::path(
    put,
    path = "/api/v1/orders/:id/status",
    params(("id" = Uuid, Path, description = "Order ID")),
    request_body = TransitionInput,
    responses(
        (status = 200, description = "Order updated", body = OrderView),
        (status = 400, description = "Transition not allowed", body = crate::errors::ErrorResponse),
        (status = 403, description = "Forbidden", body = crate::errors::ErrorResponse),
        (status = 404, description = "Order not found", body = crate::errors::ErrorResponse)
    ),
    security(("Bearer" = [])),
    tag = "Orders"
)]
pub async fn update_status(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    JsonBody(payload): JsonBody<TransitionInput>,
) -> Result<impl IntoResponse, ApiError> {
    validate_input(&payload)?;

    let order = state
        .services
        .orders
        .transition(id, payload)
        .await
        .map_err(map_service_error)?;
    Ok(success_response(OrderView::from_model(order, None)?))
}

#[utoipa::path(
    put,
    path = "/api/v1/orders/:id/payment",
    params(("id" = Uuid, Path, description = "Order ID")),
    request_body = PaymentUpdateInput,
    responses(
        (status = 200, description = "Payment status updated", body = OrderView),
        (status = 403, description = "Forbidden", body = crate::errors::ErrorResponse),
        (status = 404, description = "Order not found", body = crate::errors::ErrorResponse)
    ),
    security(("Bearer" = [])),
    tag = "Orders"
)]
pub async fn update_payment(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    JsonBody(payload): JsonBody<PaymentUpdateInput>,
) -> Result<impl IntoResponse, ApiError> {
    validate_input(&payload)?;

    let order = state
        .services
        .orders
        .update_payment_status(id, payload)
        .await
        .map_err(map_service_error)?;
    Ok(success_response(OrderView::from_model(order, None)?))
}

/// Admin order listing
#[utoipa::path(
    get,
    path = "/api/v1/admin/orders",
    params(OrderFilter),
    responses(
        (status = 200, description = "Orders, newest first", body = crate::ApiResponse<Vec<OrderView>>),
        (status = 403, description = "Forbidden", body = crate::errors::ErrorResponse)
    ),
    security(("Bearer" = [])),
    tag = "Admin"
)]
pub async fn list_orders(
    State(state): State<AppState>,
    Query(filter): Query<OrderFilter>,
) -> Result<impl IntoResponse, ApiError> {
    let orders = state
        .services
        .orders
        .list(&filter)
        .await
        .map_err(map_service_error)?;
    Ok(success_response(ApiResponse::success(orders)))
}
