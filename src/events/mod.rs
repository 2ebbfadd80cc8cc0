use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tracing::{info, warn};
use uuid::Uuid;

use crate::entities::commerce::{OrderStatus, PaymentStatus};

#[derive(Debug, Clone)]
pub struct EventSender {
    sender: mpsc::Sender<Event>,
}

impl EventSender {
    pub fn new(sender: mpsc::Sender<Event>) -> Self {
        Self { sender }
    }

    /// Sends an event asynchronously
    pub async fn send(&self, event: Event) -> Result<(), String> {
        self.sender
            .send(event)
            .await
            .map_err(|e| format!("Failed to send event: {}", e))
    }

    /// Publishes after a commit. A closed channel is logged and swallowed; the
    /// mutation it describes has already happened.
    pub async fn send_or_log(&self, event: Event) {
        if let Err(err) = self.send(event).await {
            warn!(error = %err, "dropping domain event");
        }
    }
}

/// Domain events published after each committed mutation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Event {
    CartCreated {
        cart_id: Uuid,
        user_id: Option<String>,
    },
    CartItemAdded {
        cart_id: Uuid,
        product_id: Uuid,
        quantity: i32,
    },
    CartMerged {
        guest_cart_id: Uuid,
        user_cart_id: Uuid,
        user_id: String,
        reassigned: bool,
    },
    CartsExpired {
        count: u64,
        cutoff: DateTime<Utc>,
    },
    OrderCreated {
        order_id: Uuid,
        order_number: String,
        total_amount: Decimal,
    },
    OrderStatusChanged {
        order_id: Uuid,
        old_status: OrderStatus,
        new_status: OrderStatus,
    },
    PaymentStatusChanged {
        order_id: Uuid,
        old_status: PaymentStatus,
        new_status: PaymentStatus,
    },
    CouponRedeemed {
        coupon_id: Uuid,
        order_id: Uuid,
        discount: Decimal,
    },
}

impl Event {
    pub fn name(&self) -> &'static str {
        match self {
            Event::CartCreated { .. } => "cart.created",
            Event::CartItemAdded { .. } => "cart.item_added",
            Event::CartMerged { .. } => "cart.merged",
            Event::CartsExpired { .. } => "cart.expired",
            Event::OrderCreated { .. } => "order.created",
            Event::OrderStatusChanged { .. } => "order.status_changed",
            Event::PaymentStatusChanged { .. } => "order.payment_status_changed",
            Event::CouponRedeemed { .. } => "coupon.redeemed",
        }
    }
}

/// Drains the event channel, logging each event until every sender is dropped.
pub async fn process_events(mut rx: mpsc::Receiver<Event>) {
    info!("Starting event processing loop");

    while let Some(event) = rx.recv().await {
        metrics::counter!("commerce.events.processed", 1, "event" => event.name());

        match &event {
            Event::OrderCreated {
                order_id,
                order_number,
                total_amount,
            } => {
                info!(%order_id, %order_number, %total_amount, "order created");
            }
            Event::OrderStatusChanged {
                order_id,
                old_status,
                new_status,
            } => {
                info!(%order_id, from = %old_status, to = %new_status, "order status changed");
            }
            Event::PaymentStatusChanged {
                order_id,
                old_status,
                new_status,
            } => {
                info!(%order_id, from = %old_status, to = %new_status, "payment status changed");
            }
            Event::CartsExpired { count, cutoff } => {
                info!(count, %cutoff, "expired carts purged");
            }
            other => {
                info!(event = other.name(), payload = ?other, "domain event");
            }
        }
    }

    warn!("Event processing loop has ended");
}
