//! Storefront commerce services: carts, coupons, pricing, stock and orders.
pub mod cart_merge;
pub mod cart_service;
pub mod coupon_service;
pub mod inventory_ledger;
pub mod order_number;
pub mod order_service;
pub mod pricing_service;

pub use cart_merge::{CartMergeService, MergeOutcome};
pub use cart_service::{CartIdentity, CartService, CartView};
pub use coupon_service::{CouponRejection, CouponService, CreateCouponInput};
pub use inventory_ledger::{BatchStockCheck, InventoryLedger, StockCheck};
pub use order_number::OrderNumberGenerator;
pub use order_service::{CreateOrderInput, OrderService, OrderView};
pub use pricing_service::{PriceBreakdown, PricingPolicy, PricingService};
