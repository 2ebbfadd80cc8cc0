use crate::{
    entities::commerce::{cart, cart_item, Cart, CartItem, CartModel, Product, ProductModel},
    errors::{is_unique_violation, ServiceError},
    events::{Event, EventSender},
};
use chrono::{DateTime, Duration, Utc};
use rust_decimal::Decimal;
use sea_orm::{
    sea_query::{Expr, OnConflict},
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection,
    EntityTrait, QueryFilter, QueryOrder, QuerySelect, Set, TransactionTrait,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, instrument, warn};
use utoipa::ToSchema;
use uuid::Uuid;

use super::pricing_service::{PriceBreakdown, PricedLine, PricingService};

/// Who a cart belongs to. A verified user wins over a session token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CartIdentity {
    User(String),
    Session(String),
    /// Neither was supplied; a fresh session token is minted.
    Anonymous,
}

impl CartIdentity {
    pub fn from_parts(user_id: Option<String>, session_id: Option<String>) -> Self {
        match (user_id, session_id.filter(|s| !s.trim().is_empty())) {
            (Some(user_id), _) => Self::User(user_id),
            (None, Some(session_id)) => Self::Session(session_id),
            (None, None) => Self::Anonymous,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CartLineView {
    pub id: Uuid,
    pub product_id: Uuid,
    pub name: String,
    pub slug: String,
    pub quantity: i32,
    /// Current effective price.
    pub price: Decimal,
    pub price_at_add: Decimal,
    pub line_total: Decimal,
    pub in_stock: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CartView {
    pub id: Uuid,
    pub session_id: Option<String>,
    pub items: Vec<CartLineView>,
    pub item_count: i32,
    /// Priced from current catalog prices, not `price_at_add`.
    pub subtotal: Decimal,
    pub expires_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CouponPreview {
    pub cart_id: Uuid,
    pub coupon_code: String,
    #[serde(flatten)]
    pub pricing: PriceBreakdown,
}

/// Owns cart and cart-item persistence.
#[derive(Clone)]
pub struct CartService {
    db: Arc<DatabaseConnection>,
    event_sender: Arc<EventSender>,
    pricing: PricingService,
    expiry_days: i64,
}

impl CartService {
    pub fn new(
        db: Arc<DatabaseConnection>,
        event_sender: Arc<EventSender>,
        pricing: PricingService,
        expiry_days: i64,
    ) -> Self {
        Self {
            db,
            event_sender,
            pricing,
            expiry_days,
        }
    }

    fn expiry_from(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        now + Duration::days(self.expiry_days)
    }

    async fn find_for_identity(
        &self,
        identity: &CartIdentity,
    ) -> Result<Option<CartModel>, ServiceError> {
        let found = match identity {
            CartIdentity::User(user_id) => {
                Cart::find()
                    .filter(cart::Column::UserId.eq(user_id.as_str()))
                    .one(&*self.db)
                    .await?
            }
            CartIdentity::Session(session_id) => {
                Cart::find()
                    .filter(cart::Column::SessionId.eq(session_id.as_str()))
                    .filter(cart::Column::UserId.is_null())
                    .one(&*self.db)
                    .await?
            }
            CartIdentity::Anonymous => None,
        };
        Ok(found)
    }

    /// Returns the identity's cart, creating it on first use. An expired cart
    /// is discarded and replaced.
    #[instrument(skip(self))]
    pub async fn resolve_cart(&self, identity: &CartIdentity) -> Result<CartModel, ServiceError> {
        let now = Utc::now();
        if let Some(existing) = self.find_for_identity(identity).await? {
            if existing.expires_at >= now {
                return Ok(existing);
            }
            info!(cart_id = %existing.id, "discarding expired cart");
            delete_carts(&*self.db, &[existing.id]).await?;
        }

        let (user_id, session_id) = match identity {
            CartIdentity::User(user_id) => (Some(user_id.clone()), None),
            CartIdentity::Session(session_id) => (None, Some(session_id.clone())),
            CartIdentity::Anonymous => (None, Some(Uuid::new_v4().to_string())),
        };

        let model = cart::ActiveModel {
            id: Set(Uuid::new_v4()),
            user_id: Set(user_id.clone()),
            session_id: Set(session_id),
            expires_at: Set(self.expiry_from(now)),
            created_at: Set(now),
            updated_at: Set(now),
        };

        match model.insert(&*self.db).await {
            Ok(cart) => {
                self.event_sender
                    .send_or_log(Event::CartCreated {
                        cart_id: cart.id,
                        user_id,
                    })
                    .await;
                info!(cart_id = %cart.id, "created cart");
                Ok(cart)
            }
            // A concurrent request created it first.
            Err(err) if is_unique_violation(&err) => self
                .find_for_identity(identity)
                .await?
                .ok_or(ServiceError::DatabaseError(err)),
            Err(err) => Err(err.into()),
        }
    }

    /// Adds `quantity` of a product, merging into an existing line.
    #[instrument(skip(self))]
    pub async fn add_item(
        &self,
        identity: &CartIdentity,
        product_id: Uuid,
        quantity: i32,
    ) -> Result<CartView, ServiceError> {
        if quantity < 1 {
            return Err(ServiceError::ValidationError(
                "Quantity must be at least 1".into(),
            ));
        }

        let cart = self.resolve_cart(identity).await?;
        let product = Product::find_by_id(product_id)
            .one(&*self.db)
            .await?
            .filter(ProductModel::is_active)
            .ok_or_else(|| ServiceError::NotFound(format!("Product {} not found", product_id)))?;

        let now = Utc::now();
        let txn = self.db.begin().await?;

        // Must stay the first statement: it takes the write lock before any read.
        CartItem::insert(cart_item::ActiveModel {
            id: Set(Uuid::new_v4()),
            cart_id: Set(cart.id),
            product_id: Set(product_id),
            quantity: Set(quantity),
            price_at_add: Set(product.effective_price()),
            created_at: Set(now),
            updated_at: Set(now),
        })
        .on_conflict(
            OnConflict::columns([cart_item::Column::CartId, cart_item::Column::ProductId])
                .value(
                    cart_item::Column::Quantity,
                    Expr::col((cart_item::Entity, cart_item::Column::Quantity)).add(quantity),
                )
                .value(cart_item::Column::UpdatedAt, Expr::value(now))
                .to_owned(),
        )
        .exec_without_returning(&txn)
        .await?;

        let new_total = CartItem::find()
            .filter(cart_item::Column::CartId.eq(cart.id))
            .filter(cart_item::Column::ProductId.eq(product_id))
            .one(&txn)
            .await?
            .map_or(quantity, |item| item.quantity);

        // Stock is re-read under the write lock; a short line rolls the upsert back.
        let stock = Product::find_by_id(product_id)
            .one(&txn)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Product {} not found", product_id)))?;
        if !stock.can_supply(new_total) {
            return Err(ServiceError::InsufficientStock {
                product_id,
                requested: new_total,
                available: stock.stock_quantity.max(0),
            });
        }

        self.touch(&txn, cart.id, now).await?;
        txn.commit().await?;

        self.event_sender
            .send_or_log(Event::CartItemAdded {
                cart_id: cart.id,
                product_id,
                quantity,
            })
            .await;
        info!(cart_id = %cart.id, %product_id, quantity, "added item to cart");

        self.view(cart).await
    }

    /// Sets a line's quantity, re-checking stock against the new total.
    #[instrument(skip(self))]
    pub async fn update_item_quantity(
        &self,
        identity: &CartIdentity,
        item_id: Uuid,
        quantity: i32,
    ) -> Result<CartView, ServiceError> {
        if quantity < 1 {
            return Err(ServiceError::ValidationError(
                "Quantity must be at least 1".into(),
            ));
        }

        let cart = self.resolve_cart(identity).await?;
        let now = Utc::now();
        let txn = self.db.begin().await?;

        let (item, product) = CartItem::find_by_id(item_id)
            .filter(cart_item::Column::CartId.eq(cart.id))
            .find_also_related(Product)
            .one(&txn)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Cart item {} not found", item_id)))?;

        let product = product.ok_or_else(|| {
            ServiceError::NotFound(format!("Product {} not found", item.product_id))
        })?;
        if !product.can_supply(quantity) {
            return Err(ServiceError::InsufficientStock {
                product_id: product.id,
                requested: quantity,
                available: product.stock_quantity.max(0),
            });
        }

        let mut active: cart_item::ActiveModel = item.into();
        active.quantity = Set(quantity);
        active.updated_at = Set(now);
        active.update(&txn).await?;

        self.touch(&txn, cart.id, now).await?;
        txn.commit().await?;

        info!(cart_id = %cart.id, %item_id, quantity, "updated cart line");
        self.view(cart).await
    }

    /// Removing a line that is not there is not an error.
    #[instrument(skip(self))]
    pub async fn remove_item(
        &self,
        identity: &CartIdentity,
        item_id: Uuid,
    ) -> Result<CartView, ServiceError> {
        let cart = self.resolve_cart(identity).await?;
        let now = Utc::now();
        let txn = self.db.begin().await?;

        let removed = CartItem::delete_many()
            .filter(cart_item::Column::Id.eq(item_id))
            .filter(cart_item::Column::CartId.eq(cart.id))
            .exec(&txn)
            .await?;
        self.touch(&txn, cart.id, now).await?;
        txn.commit().await?;

        info!(cart_id = %cart.id, %item_id, removed = removed.rows_affected, "remove cart line");
        self.view(cart).await
    }

    #[instrument(skip(self))]
    pub async fn clear(&self, identity: &CartIdentity) -> Result<CartView, ServiceError> {
        let cart = self.resolve_cart(identity).await?;
        let now = Utc::now();
        let txn = self.db.begin().await?;

        CartItem::delete_many()
            .filter(cart_item::Column::CartId.eq(cart.id))
            .exec(&txn)
            .await?;
        self.touch(&txn, cart.id, now).await?;
        txn.commit().await?;

        info!(cart_id = %cart.id, "cleared cart");
        self.view(cart).await
    }

    #[instrument(skip(self))]
    pub async fn view_cart(&self, identity: &CartIdentity) -> Result<CartView, ServiceError> {
        let cart = self.resolve_cart(identity).await?;
        self.view(cart).await
    }

    /// Prices the resolved cart with `code` without persisting anything.
    /// Unlike checkout, a rejected coupon is an error here.
    #[instrument(skip(self))]
    pub async fn preview_coupon(
        &self,
        identity: &CartIdentity,
        code: &str,
    ) -> Result<CouponPreview, ServiceError> {
        let cart = self.resolve_cart(identity).await?;
        let lines = self.load_lines(cart.id).await?;
        let priced: Vec<PricedLine> = lines
            .iter()
            .map(|(item, product)| PricedLine {
                product_id: item.product_id,
                quantity: item.quantity,
                unit_price: product.effective_price(),
            })
            .collect();

        let outcome = self
            .pricing
            .price(&*self.db, &priced, Some(code), Utc::now())
            .await?;
        let coupon_code = outcome
            .coupon
            .map(|c| c.coupon.code)
            .unwrap_or_else(|| code.trim().to_uppercase());

        Ok(CouponPreview {
            cart_id: cart.id,
            coupon_code,
            pricing: outcome.breakdown,
        })
    }

    /// Deletes carts (and their lines) that expired before `now`.
    #[instrument(skip(self))]
    pub async fn purge_expired(&self, now: DateTime<Utc>) -> Result<u64, ServiceError> {
        let txn = self.db.begin().await?;
        let expired: Vec<Uuid> = Cart::find()
            .select_only()
            .column(cart::Column::Id)
            .filter(cart::Column::ExpiresAt.lt(now))
            .into_tuple()
            .all(&txn)
            .await?;

        if expired.is_empty() {
            txn.commit().await?;
            return Ok(0);
        }

        let count = delete_carts(&txn, &expired).await?;
        txn.commit().await?;

        self.event_sender
            .send_or_log(Event::CartsExpired { count, cutoff: now })
            .await;
        info!(count, "purged expired carts");
        Ok(count)
    }

    async fn touch<C: ConnectionTrait>(
        &self,
        conn: &C,
        cart_id: Uuid,
        now: DateTime<Utc>,
    ) -> Result<(), ServiceError> {
        Cart::update_many()
            .col_expr(cart::Column::ExpiresAt, Expr::value(self.expiry_from(now)))
            .col_expr(cart::Column::UpdatedAt, Expr::value(now))
            .filter(cart::Column::Id.eq(cart_id))
            .exec(conn)
            .await?;
        Ok(())
    }

    async fn load_lines(
        &self,
        cart_id: Uuid,
    ) -> Result<Vec<(cart_item::Model, ProductModel)>, ServiceError> {
        let rows = CartItem::find()
            .filter(cart_item::Column::CartId.eq(cart_id))
            .order_by_asc(cart_item::Column::CreatedAt)
            .find_also_related(Product)
            .all(&*self.db)
            .await?;

        Ok(rows
            .into_iter()
            .filter_map(|(item, product)| match product {
                Some(product) => Some((item, product)),
                None => {
                    warn!(cart_item_id = %item.id, product_id = %item.product_id, "cart line references a missing product");
                    None
                }
            })
            .collect())
    }

    async fn view(&self, cart: CartModel) -> Result<CartView, ServiceError> {
        let cart = Cart::find_by_id(cart.id)
            .one(&*self.db)
            .await?
            .unwrap_or(cart);
        let lines = self.load_lines(cart.id).await?;

        let priced: Vec<PricedLine> = lines
            .iter()
            .map(|(item, product)| PricedLine {
                product_id: item.product_id,
                quantity: item.quantity,
                unit_price: product.effective_price(),
            })
            .collect();
        let pricing = self.pricing.price_without_coupon(&priced);

        let items: Vec<CartLineView> = lines
            .into_iter()
            .map(|(item, product)| {
                let price = product.effective_price();
                CartLineView {
                    id: item.id,
                    product_id: item.product_id,
                    name: product.name.clone(),
                    slug: product.slug.clone(),
                    quantity: item.quantity,
                    price,
                    price_at_add: item.price_at_add,
                    line_total: price * Decimal::from(item.quantity),
                    in_stock: product.is_active() && product.can_supply(item.quantity),
                }
            })
            .collect();

        Ok(CartView {
            id: cart.id,
            session_id: cart.session_id,
            item_count: items.iter().map(|i| i.quantity).sum(),
            items,
            subtotal: pricing.subtotal,
            expires_at: cart.expires_at,
        })
    }
}

/// Deletes the given carts and their lines.
pub(crate) async fn delete_carts<C: ConnectionTrait>(
    conn: &C,
    cart_ids: &[Uuid],
) -> Result<u64, ServiceError> {
    CartItem::delete_many()
        .filter(cart_item::Column::CartId.is_in(cart_ids.iter().copied()))
        .exec(conn)
        .await?;
    let deleted = Cart::delete_many()
        .filter(cart::Column::Id.is_in(cart_ids.iter().copied()))
        .exec(conn)
        .await?;
    Ok(deleted.rows_affected)
}
