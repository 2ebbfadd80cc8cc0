//! Storefront entities: catalog products, carts, coupons and orders.
pub mod cart;
pub mod cart_item;
pub mod coupon;
pub mod coupon_usage;
pub mod order;
pub mod order_sequence;
pub mod order_status_history;
pub mod product;

pub use cart::{Entity as Cart, Model as CartModel};
pub use cart_item::{Entity as CartItem, Model as CartItemModel};
pub use coupon::{DiscountType, Entity as Coupon, Model as CouponModel};
pub use coupon_usage::{Entity as CouponUsage, Model as CouponUsageModel};
pub use order::{
    Address, Entity as Order, Model as OrderModel, OrderLine, OrderStatus, PaymentStatus,
};
pub use order_sequence::{Entity as OrderSequence, Model as OrderSequenceModel};
pub use order_status_history::{Entity as OrderStatusHistory, Model as OrderStatusHistoryModel};
pub use product::{Entity as Product, Model as ProductModel, ProductStatus};
