use utoipa::{
    openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
    Modify, OpenApi,
};
use utoipa_swagger_ui::SwaggerUi;

struct BearerAuth;

impl Modify for BearerAuth {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "Bearer",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .build(),
            ),
        );
    }
}

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Storefront Commerce API",
        version = "1.0.0",
        description = r#"
Carts, coupons and order fulfillment for the storefront.

Guests identify their cart with the `x-session-id` header; signed-in customers
send `Authorization: Bearer <jwt>`. Admin routes require the `admin` role.

Errors share one body:

```json
{
  "error": "Bad Request",
  "message": "Insufficient stock for product ...: requested 3, available 1",
  "available": 1,
  "request_id": "req-abc123",
  "timestamp": "2025-01-01T00:00:00Z"
}
```
        "#
    ),
    servers(
        (url = "http://localhost:8080", description = "Local development")
    ),
    tags(
        (name = "Cart", description = "Guest and customer carts"),
        (name = "Orders", description = "Checkout and order tracking"),
        (name = "Products", description = "Stock availability"),
        (name = "Admin", description = "Privileged operations")
    ),
    paths(
        crate::handlers::commerce::carts::get_cart,
        crate::handlers::commerce::carts::add_item,
        crate::handlers::commerce::carts::update_item,
        crate::handlers::commerce::carts::remove_item,
        crate::handlers::commerce::carts::clear_cart,
        crate::handlers::commerce::carts::preview_coupon,
        crate::handlers::commerce::carts::merge_carts,

        crate::handlers::commerce::orders::create_order,
        crate::handlers::commerce::orders::track_order,
        crate::handlers::commerce::orders::my_orders,
        crate::handlers::commerce::orders::get_order,
        crate::handlers::commerce::orders::update_status,
        crate::handlers::commerce::orders::update_payment,
        crate::handlers::commerce::orders::list_orders,

        crate::handlers::commerce::products::check_stock,
        crate::handlers::commerce::products::low_stock,

        crate::handlers::commerce::coupons::list_coupons,
        crate::handlers::commerce::coupons::create_coupon,
        crate::handlers::commerce::coupons::toggle_coupon,
        crate::handlers::commerce::coupons::delete_coupon,
    ),
    components(
        schemas(
            crate::errors::ErrorResponse,
            crate::services::commerce::CouponRejection,
            crate::services::commerce::PriceBreakdown,
            crate::entities::commerce::Address,
            crate::entities::commerce::OrderLine,
            crate::entities::commerce::OrderStatus,
            crate::entities::commerce::PaymentStatus,
        )
    ),
    modifiers(&BearerAuth)
)]
pub struct ApiDocV1;

pub fn swagger_ui() -> SwaggerUi {
    SwaggerUi::new("/swagger-ui")
        .url("/api-docs/openapi.json", ApiDocV1::openapi())
        .config(utoipa_swagger_ui::Config::from("/api-docs/openapi.json").try_it_out_enabled(true))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn openapi_lists_storefront_routes() {
        let json = serde_json::to_string(&ApiDocV1::openapi()).unwrap();
        assert!(json.contains("Storefront Commerce API"));
        assert!(json.contains("/api/v1/cart/items"));
        assert!(json.contains("/api/v1/orders/track/"));
        assert!(json.contains("Bearer"));
    }
}
