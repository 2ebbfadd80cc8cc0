pub mod commerce;
pub mod common;

use crate::{
    config::AppConfig,
    events::EventSender,
    services::commerce::{
        CartMergeService, CartService, CouponService, InventoryLedger, OrderNumberGenerator,
        OrderService, PricingPolicy, PricingService,
    },
};
use sea_orm::DatabaseConnection;
use std::sync::Arc;

// Re-export AppState so handler modules can import it as crate::handlers::AppState
pub use crate::AppState;

/// Services layer that encapsulates business logic used by HTTP handlers
#[derive(Clone)]
pub struct AppServices {
    pub cart: Arc<CartService>,
    pub cart_merge: Arc<CartMergeService>,
    pub inventory: Arc<InventoryLedger>,
    pub coupons: Arc<CouponService>,
    pub orders: Arc<OrderService>,
}

impl AppServices {
    pub fn new(
        db: Arc<DatabaseConnection>,
        event_sender: Arc<EventSender>,
        config: &AppConfig,
    ) -> Self {
        let coupons = CouponService::new(db.clone());
        let ledger = InventoryLedger::new(db.clone());
        let pricing = PricingService::new(PricingPolicy::from(&config.pricing), coupons.clone());

        let cart = CartService::new(
            db.clone(),
            event_sender.clone(),
            pricing.clone(),
            config.cart.expiry_days,
        );
        let cart_merge =
            CartMergeService::new(db.clone(), event_sender.clone(), config.cart.expiry_days);
        let orders = OrderService::new(
            db,
            event_sender,
            ledger.clone(),
            pricing,
            coupons.clone(),
            OrderNumberGenerator::new(config.orders.number_prefix.clone()),
        );

        Self {
            cart: Arc::new(cart),
            cart_merge: Arc::new(cart_merge),
            inventory: Arc::new(ledger),
            coupons: Arc::new(coupons),
            orders: Arc::new(orders),
        }
    }
}
