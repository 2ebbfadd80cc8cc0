use crate::{
    entities::commerce::{
        order, order_status_history, product, Address, Order, OrderLine, OrderModel, OrderStatus,
        OrderStatusHistory, OrderStatusHistoryModel, PaymentStatus, Product, ProductModel,
    },
    errors::ServiceError,
    events::{Event, EventSender},
};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::{
    sea_query::Expr, ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection,
    EntityTrait, QueryFilter, QueryOrder, QuerySelect, Set, TransactionTrait,
};
use serde::{Deserialize, Serialize};
use std::{collections::HashMap, sync::Arc};
use tracing::{info, instrument, warn};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

use super::{
    coupon_service::{CouponService, ValidatedCoupon},
    inventory_ledger::InventoryLedger,
    order_number::OrderNumberGenerator,
    pricing_service::{PricedLine, PricingService},
};

pub const DEFAULT_LIST_LIMIT: u64 = 50;
pub const MAX_LIST_LIMIT: u64 = 200;

#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct OrderItemInput {
    pub product_id: Uuid,
    #[validate(range(min = 1, max = 1000))]
    pub quantity: i32,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateOrderInput {
    #[validate(email)]
    pub customer_email: String,
    #[validate(length(min = 1, max = 100))]
    pub customer_first_name: String,
    #[validate(length(min = 1, max = 100))]
    pub customer_last_name: String,
    #[validate(length(max = 30))]
    pub customer_phone: Option<String>,
    #[validate]
    pub shipping_address: Address,
    #[validate]
    pub billing_address: Option<Address>,
    #[validate]
    pub items: Vec<OrderItemInput>,
    #[validate(length(max = 50))]
    pub coupon_code: Option<String>,
    #[validate(length(max = 255))]
    pub payment_intent_id: Option<String>,
}

impl CreateOrderInput {
    fn check_business_rules(&self) -> Result<(), ServiceError> {
        if self.items.is_empty() {
            return Err(ServiceError::ValidationError(
                "Order must contain at least one item".into(),
            ));
        }
        Ok(())
    }

    /// Collapses repeated products into one line, keeping first-seen order.
    fn coalesced_items(&self) -> Vec<(Uuid, i32)> {
        let mut lines: Vec<(Uuid, i32)> = Vec::with_capacity(self.items.len());
        for item in &self.items {
            match lines.iter_mut().find(|(id, _)| *id == item.product_id) {
                Some((_, quantity)) => *quantity += item.quantity,
                None => lines.push((item.product_id, item.quantity)),
            }
        }
        lines
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TransitionInput {
    pub status: OrderStatus,
    #[validate(length(max = 1000))]
    pub notes: Option<String>,
    #[validate(length(min = 1, max = 100))]
    pub tracking_number: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PaymentUpdateInput {
    pub payment_status: PaymentStatus,
    #[validate(length(min = 1, max = 255))]
    pub payment_intent_id: Option<String>,
}

/// Admin listing filters. Dates are RFC 3339.
#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct OrderFilter {
    pub status: Option<OrderStatus>,
    pub payment_status: Option<PaymentStatus>,
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
    pub limit: Option<u64>,
    pub offset: Option<u64>,
}

impl OrderFilter {
    pub fn effective_limit(&self) -> u64 {
        self.limit
            .unwrap_or(DEFAULT_LIST_LIMIT)
            .clamp(1, MAX_LIST_LIMIT)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct StatusHistoryEntry {
    pub status: OrderStatus,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl From<OrderStatusHistoryModel> for StatusHistoryEntry {
    fn from(model: OrderStatusHistoryModel) -> Self {
        Self {
            status: model.status,
            notes: model.notes,
            created_at: model.created_at,
        }
    }
}

/// An order with its JSON columns decoded.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct OrderView {
    pub id: Uuid,
    pub order_number: String,
    pub user_id: Option<String>,
    pub customer_email: String,
    pub customer_first_name: String,
    pub customer_last_name: String,
    pub customer_phone: Option<String>,
    pub shipping_address: Address,
    pub billing_address: Address,
    pub items: Vec<OrderLine>,
    pub subtotal: Decimal,
    pub shipping_cost: Decimal,
    pub tax_amount: Decimal,
    pub discount_amount: Decimal,
    pub total_amount: Decimal,
    pub coupon_code: Option<String>,
    pub payment_intent_id: Option<String>,
    pub status: OrderStatus,
    pub payment_status: PaymentStatus,
    pub tracking_number: Option<String>,
    pub shipped_at: Option<DateTime<Utc>>,
    pub delivered_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status_history: Option<Vec<StatusHistoryEntry>>,
}

impl OrderView {
    pub fn from_model(
        model: OrderModel,
        history: Option<Vec<OrderStatusHistoryModel>>,
    ) -> Result<Self, ServiceError> {
        Ok(Self {
            shipping_address: model.shipping_address()?,
            billing_address: model.billing_address()?,
            items: model.line_items()?,
            id: model.id,
            order_number: model.order_number,
            user_id: model.user_id,
            customer_email: model.customer_email,
            customer_first_name: model.customer_first_name,
            customer_last_name: model.customer_last_name,
            customer_phone: model.customer_phone,
            subtotal: model.subtotal,
            shipping_cost: model.shipping_cost,
            tax_amount: model.tax_amount,
            discount_amount: model.discount_amount,
            total_amount: model.total_amount,
            coupon_code: model.coupon_code,
            payment_intent_id: model.payment_intent_id,
            status: model.status,
            payment_status: model.payment_status,
            tracking_number: model.tracking_number,
            shipped_at: model.shipped_at,
            delivered_at: model.delivered_at,
            created_at: model.created_at,
            updated_at: model.updated_at,
            status_history: history
                .map(|rows| rows.into_iter().map(StatusHistoryEntry::from).collect()),
        })
    }
}

/// Body returned by a successful checkout.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreatedOrder {
    pub id: Uuid,
    pub order_number: String,
    pub subtotal: Decimal,
    pub shipping_cost: Decimal,
    pub tax_amount: Decimal,
    pub discount_amount: Decimal,
    pub total_amount: Decimal,
    pub coupon_code: Option<String>,
    pub status: OrderStatus,
    pub payment_status: PaymentStatus,
}

impl From<&OrderModel> for CreatedOrder {
    fn from(model: &OrderModel) -> Self {
        Self {
            id: model.id,
            order_number: model.order_number.clone(),
            subtotal: model.subtotal,
            shipping_cost: model.shipping_cost,
            tax_amount: model.tax_amount,
            discount_amount: model.discount_amount,
            total_amount: model.total_amount,
            coupon_code: model.coupon_code.clone(),
            status: model.status,
            payment_status: model.payment_status,
        }
    }
}

/// Lifecycle graph for shipment status.
pub fn allowed_transition(from: OrderStatus, to: OrderStatus) -> bool {
    use OrderStatus::*;
    matches!(
        (from, to),
        (Pending, Processing | Cancelled | Refunded)
            | (Processing, Shipped | Cancelled | Refunded)
            | (Shipped, Delivered)
            | (Delivered, Refunded)
    )
}

#[derive(Clone)]
pub struct OrderService {
    db: Arc<DatabaseConnection>,
    event_sender: Arc<EventSender>,
    ledger: InventoryLedger,
    pricing: PricingService,
    coupons: CouponService,
    numbers: OrderNumberGenerator,
}

impl OrderService {
    pub fn new(
        db: Arc<DatabaseConnection>,
        event_sender: Arc<EventSender>,
        ledger: InventoryLedger,
        pricing: PricingService,
        coupons: CouponService,
        numbers: OrderNumberGenerator,
    ) -> Self {
        Self {
            db,
            event_sender,
            ledger,
            pricing,
            coupons,
            numbers,
        }
    }

    /// Materializes an order all-or-nothing. A lost order-number race is
    /// retried once.
    #[instrument(skip(self, input), fields(email = %input.customer_email, items = input.items.len()))]
    pub async fn create_order(
        &self,
        input: CreateOrderInput,
        user_id: Option<String>,
    ) -> Result<OrderModel, ServiceError> {
        input.validate()?;
        input.check_business_rules()?;
        let lines = input.coalesced_items();
        self.ensure_products_sellable(&lines).await?;

        let (order, coupon) = match self.try_create(&input, &lines, user_id.clone()).await {
            Err(err) if err.is_unique_violation() => {
                warn!(error = %err, "order insert collided; retrying once");
                self.try_create(&input, &lines, user_id).await?
            }
            other => other?,
        };

        metrics::counter!("commerce.orders.created", 1);
        self.event_sender
            .send_or_log(Event::OrderCreated {
                order_id: order.id,
                order_number: order.order_number.clone(),
                total_amount: order.total_amount,
            })
            .await;
        if let Some(coupon) = coupon {
            self.event_sender
                .send_or_log(Event::CouponRedeemed {
                    coupon_id: coupon.coupon.id,
                    order_id: order.id,
                    discount: coupon.discount,
                })
                .await;
        }

        info!(
            order_id = %order.id,
            order_number = %order.order_number,
            total = %order.total_amount,
            "order created"
        );
        Ok(order)
    }

    /// Unknown or unsellable products are input errors, reported before any
    /// stock is touched.
    async fn ensure_products_sellable(&self, lines: &[(Uuid, i32)]) -> Result<(), ServiceError> {
        let products = self.load_products(&*self.db, lines).await?;
        for (product_id, _) in lines {
            match products.get(product_id) {
                Some(product) if product.is_active() => {}
                _ => {
                    return Err(ServiceError::ValidationError(format!(
                        "Product {} is not available",
                        product_id
                    )))
                }
            }
        }
        Ok(())
    }

    async fn load_products<C: ConnectionTrait>(
        &self,
        conn: &C,
        lines: &[(Uuid, i32)],
    ) -> Result<HashMap<Uuid, ProductModel>, ServiceError> {
        Ok(Product::find()
            .filter(product::Column::Id.is_in(lines.iter().map(|(id, _)| *id)))
            .all(conn)
            .await?
            .into_iter()
            .map(|p| (p.id, p))
            .collect())
    }

    async fn try_create(
        &self,
        input: &CreateOrderInput,
        lines: &[(Uuid, i32)],
        user_id: Option<String>,
    ) -> Result<(OrderModel, Option<ValidatedCoupon>), ServiceError> {
        let now = Utc::now();
        let txn = self.db.begin().await?;

        // Stock first: a short line aborts before anything else is written.
        for (product_id, quantity) in lines {
            self.ledger
                .reserve_and_decrement(&txn, *product_id, *quantity, now)
                .await?;
        }

        let products = self.load_products(&txn, lines).await?;
        let mut priced = Vec::with_capacity(lines.len());
        let mut snapshot = Vec::with_capacity(lines.len());
        for (product_id, quantity) in lines {
            let product = products.get(product_id).ok_or_else(|| {
                ServiceError::NotFound(format!("Product {} not found", product_id))
            })?;
            let line = PricedLine {
                product_id: *product_id,
                quantity: *quantity,
                unit_price: product.effective_price(),
            };
            snapshot.push(OrderLine {
                product_id: *product_id,
                product_name: product.name.clone(),
                quantity: *quantity,
                unit_price: line.unit_price,
                line_total: line.line_total(),
            });
            priced.push(line);
        }

        let outcome = self
            .pricing
            .price_lenient(&txn, &priced, input.coupon_code.as_deref(), now)
            .await?;
        let mut breakdown = outcome.breakdown;
        let mut applied = None;
        if let Some(validated) = outcome.coupon.filter(|c| c.discount > Decimal::ZERO) {
            if self.coupons.redeem(&txn, validated.coupon.id, now).await? {
                applied = Some(validated);
            } else {
                metrics::counter!("commerce.coupons.rejected", 1, "reason" => "usage_exceeded");
                breakdown = self.pricing.price_without_coupon(&priced);
            }
        }

        let order_id = Uuid::new_v4();
        let order_number = self.numbers.next(&txn, now).await?;
        let shipping_address = input.shipping_address.to_json()?;
        let billing_address = match &input.billing_address {
            Some(address) => address.to_json()?,
            None => shipping_address.clone(),
        };

        let order = order::ActiveModel {
            id: Set(order_id),
            order_number: Set(order_number),
            user_id: Set(user_id.clone()),
            customer_email: Set(input.customer_email.trim().to_string()),
            customer_first_name: Set(input.customer_first_name.clone()),
            customer_last_name: Set(input.customer_last_name.clone()),
            customer_phone: Set(input.customer_phone.clone()),
            shipping_address: Set(shipping_address),
            billing_address: Set(billing_address),
            items: Set(serde_json::to_value(&snapshot)?),
            subtotal: Set(breakdown.subtotal),
            shipping_cost: Set(breakdown.shipping_cost),
            tax_amount: Set(breakdown.tax_amount),
            discount_amount: Set(breakdown.discount_amount),
            total_amount: Set(breakdown.total),
            coupon_code: Set(applied.as_ref().map(|c| c.coupon.code.clone())),
            payment_intent_id: Set(input.payment_intent_id.clone()),
            status: Set(OrderStatus::Pending),
            payment_status: Set(PaymentStatus::Pending),
            tracking_number: Set(None),
            shipped_at: Set(None),
            delivered_at: Set(None),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(&txn)
        .await?;

        if let Some(coupon) = &applied {
            self.coupons
                .record_usage(
                    &txn,
                    coupon.coupon.id,
                    order.id,
                    user_id,
                    breakdown.discount_amount,
                    now,
                )
                .await?;
        }

        append_history(&txn, order.id, OrderStatus::Pending, Some("Order created".into()), now)
            .await?;
        txn.commit().await?;

        Ok((order, applied))
    }

    /// Moves an order along the lifecycle graph and appends a history row.
    #[instrument(skip(self, input), fields(to = %input.status))]
    pub async fn transition(
        &self,
        order_id: Uuid,
        input: TransitionInput,
    ) -> Result<OrderModel, ServiceError> {
        input.validate()?;
        let now = Utc::now();
        let txn = self.db.begin().await?;

        let current = find_order(&txn, order_id).await?;
        let from = current.status;
        let to = input.status;
        if !allowed_transition(from, to) {
            return Err(ServiceError::InvalidTransition { from, to });
        }

        let mut update = Order::update_many()
            .col_expr(order::Column::Status, Expr::value(to))
            .col_expr(order::Column::UpdatedAt, Expr::value(now));
        match to {
            OrderStatus::Shipped => {
                update = update.col_expr(order::Column::ShippedAt, Expr::value(now));
                if let Some(tracking) = &input.tracking_number {
                    update = update
                        .col_expr(order::Column::TrackingNumber, Expr::value(tracking.clone()));
                }
            }
            OrderStatus::Delivered => {
                update = update.col_expr(order::Column::DeliveredAt, Expr::value(now));
            }
            _ => {}
        }

        // Guarded on the status we validated against.
        let result = update
            .filter(order::Column::Id.eq(order_id))
            .filter(order::Column::Status.eq(from))
            .exec(&txn)
            .await?;
        if result.rows_affected != 1 {
            return Err(ServiceError::Conflict(format!(
                "Order {} changed status concurrently",
                order_id
            )));
        }

        append_history(&txn, order_id, to, input.notes.clone(), now).await?;
        let updated = find_order(&txn, order_id).await?;
        txn.commit().await?;

        self.event_sender
            .send_or_log(Event::OrderStatusChanged {
                order_id,
                old_status: from,
                new_status: to,
            })
            .await;
        info!(%order_id, %from, %to, "order status changed");
        Ok(updated)
    }

    /// Payment status moves independently of the lifecycle.
    #[instrument(skip(self, input), fields(to = %input.payment_status))]
    pub async fn update_payment_status(
        &self,
        order_id: Uuid,
        input: PaymentUpdateInput,
    ) -> Result<OrderModel, ServiceError> {
        input.validate()?;
        let current = find_order(&*self.db, order_id).await?;
        let old_status = current.payment_status;

        let mut active: order::ActiveModel = current.into();
        active.payment_status = Set(input.payment_status);
        if let Some(intent) = input.payment_intent_id {
            active.payment_intent_id = Set(Some(intent));
        }
        active.updated_at = Set(Utc::now());
        let updated = active.update(&*self.db).await?;

        self.event_sender
            .send_or_log(Event::PaymentStatusChanged {
                order_id,
                old_status,
                new_status: updated.payment_status,
            })
            .await;
        info!(%order_id, from = %old_status, to = %updated.payment_status, "payment status changed");
        Ok(updated)
    }

    /// Public lookup. A wrong email is indistinguishable from a wrong number.
    #[instrument(skip(self, email))]
    pub async fn track(&self, order_number: &str, email: &str) -> Result<OrderView, ServiceError> {
        let not_found = || ServiceError::NotFound(format!("Order {} not found", order_number));
        let order = Order::find()
            .filter(order::Column::OrderNumber.eq(order_number))
            .one(&*self.db)
            .await?
            .filter(|o| o.customer_email.eq_ignore_ascii_case(email.trim()))
            .ok_or_else(not_found)?;

        let history = self.history(order.id).await?;
        OrderView::from_model(order, Some(history))
    }

    pub async fn history(&self, order_id: Uuid) -> Result<Vec<OrderStatusHistoryModel>, ServiceError> {
        Ok(OrderStatusHistory::find()
            .filter(order_status_history::Column::OrderId.eq(order_id))
            .order_by_desc(order_status_history::Column::CreatedAt)
            .all(&*self.db)
            .await?)
    }

    pub async fn my_orders(&self, user_id: &str) -> Result<Vec<OrderView>, ServiceError> {
        Order::find()
            .filter(order::Column::UserId.eq(user_id))
            .order_by_desc(order::Column::CreatedAt)
            .all(&*self.db)
            .await?
            .into_iter()
            .map(|o| OrderView::from_model(o, None))
            .collect()
    }

    /// Admins see every order; other callers only their own. Anything else is 404.
    pub async fn get_for_user(
        &self,
        order_id: Uuid,
        user_id: &str,
        is_admin: bool,
    ) -> Result<OrderView, ServiceError> {
        let order = find_order(&*self.db, order_id).await?;
        if !is_admin && order.user_id.as_deref() != Some(user_id) {
            return Err(ServiceError::NotFound(format!("Order {} not found", order_id)));
        }
        let history = self.history(order.id).await?;
        OrderView::from_model(order, Some(history))
    }

    pub async fn list(&self, filter: &OrderFilter) -> Result<Vec<OrderView>, ServiceError> {
        let mut query = Order::find();
        if let Some(status) = filter.status {
            query = query.filter(order::Column::Status.eq(status));
        }
        if let Some(payment_status) = filter.payment_status {
            query = query.filter(order::Column::PaymentStatus.eq(payment_status));
        }
        if let Some(start) = filter.start_date {
            query = query.filter(order::Column::CreatedAt.gte(start));
        }
        if let Some(end) = filter.end_date {
            query = query.filter(order::Column::CreatedAt.lte(end));
        }

        query
            .order_by_desc(order::Column::CreatedAt)
            .limit(filter.effective_limit())
            .offset(filter.offset.unwrap_or(0))
            .all(&*self.db)
            .await?
            .into_iter()
            .map(|o| OrderView::from_model(o, None))
            .collect()
    }
}

async fn find_order<C: ConnectionTrait>(conn: &C, order_id: Uuid) -> Result<OrderModel, ServiceError> {
    Order::find_by_id(order_id)
        .one(conn)
        .await?
        .ok_or_else(|| ServiceError::NotFound(format!("Order {} not found", order_id)))
}

async fn append_history<C: ConnectionTrait>(
    conn: &C,
    order_id: Uuid,
    status: OrderStatus,
    notes: Option<String>,
    now: DateTime<Utc>,
) -> Result<(), ServiceError> {
    order_status_history::ActiveModel {
        id: Set(Uuid::new_v4()),
        order_id: Set(order_id),
        status: Set(status),
        notes: Set(notes),
        created_at: Set(now),
    }
    .insert(conn)
    .await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use OrderStatus::*;

    #[rstest]
    #[case(Pending, Processing)]
    #[case(Pending, Cancelled)]
    #[case(Pending, Refunded)]
    #[case(Processing, Shipped)]
    #[case(Processing, Cancelled)]
    #[case(Processing, Refunded)]
    #[case(Shipped, Delivered)]
    #[case(Delivered, Refunded)]
    fn legal_transitions(#[case] from: OrderStatus, #[case] to: OrderStatus) {
        assert!(allowed_transition(from, to));
    }

    #[rstest]
    #[case(Delivered, Processing)]
    #[case(Pending, Shipped)]
    #[case(Pending, Delivered)]
    #[case(Shipped, Cancelled)]
    #[case(Shipped, Refunded)]
    #[case(Cancelled, Pending)]
    #[case(Refunded, Processing)]
    #[case(Pending, Pending)]
    fn illegal_transitions(#[case] from: OrderStatus, #[case] to: OrderStatus) {
        assert!(!allowed_transition(from, to));
    }

    #[test]
    fn terminal_states_have_no_exits() {
        use sea_orm::Iterable;
        for to in OrderStatus::iter() {
            assert!(!allowed_transition(Cancelled, to));
            assert!(!allowed_transition(Refunded, to));
        }
    }

    fn address() -> Address {
        Address {
            line1: "1 Main St".into(),
            line2: None,
            city: "Austin".into(),
            state: Some("TX".into()),
            postal_code: "78701".into(),
            country: "US".into(),
        }
    }

    fn input(items: Vec<OrderItemInput>) -> CreateOrderInput {
        CreateOrderInput {
            customer_email: "ana@example.com".into(),
            customer_first_name: "Ana".into(),
            customer_last_name: "Lopez".into(),
            customer_phone: None,
            shipping_address: address(),
            billing_address: None,
            items,
            coupon_code: None,
            payment_intent_id: None,
        }
    }

    #[test]
    fn repeated_products_are_coalesced() {
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        let order = input(vec![
            OrderItemInput { product_id: a, quantity: 1 },
            OrderItemInput { product_id: b, quantity: 2 },
            OrderItemInput { product_id: a, quantity: 3 },
        ]);
        assert_eq!(order.coalesced_items(), vec![(a, 4), (b, 2)]);
    }

    #[test]
    fn empty_orders_and_bad_quantities_are_rejected() {
        assert!(matches!(
            input(vec![]).check_business_rules(),
            Err(ServiceError::ValidationError(_))
        ));

        let bad = input(vec![OrderItemInput {
            product_id: Uuid::new_v4(),
            quantity: 0,
        }]);
        assert!(bad.validate().is_err());
    }

    #[test]
    fn invalid_email_fails_validation() {
        let mut order = input(vec![OrderItemInput {
            product_id: Uuid::new_v4(),
            quantity: 1,
        }]);
        order.customer_email = "not-an-email".into();
        assert!(order.validate().is_err());
    }

    #[rstest]
    #[case(None, 50)]
    #[case(Some(0), 1)]
    #[case(Some(75), 75)]
    #[case(Some(10_000), 200)]
    fn list_limit_is_clamped(#[case] limit: Option<u64>, #[case] expected: u64) {
        let filter = OrderFilter {
            limit,
            ..Default::default()
        };
        assert_eq!(filter.effective_limit(), expected);
    }
}
