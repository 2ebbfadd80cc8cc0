//! Storefront HTTP handlers.
pub mod carts;
pub mod coupons;
pub mod orders;
pub mod products;

pub use carts::carts_routes;
pub use coupons::coupons_routes;
pub use orders::orders_routes;
pub use products::products_routes;
