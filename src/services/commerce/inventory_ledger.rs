//! Authoritative stock counts.
//!
//! Reads may race; the only write, [`InventoryLedger::reserve_and_decrement`],
//! is a single conditional `UPDATE` so stock can never go below zero.

use chrono::{DateTime, Utc};
use sea_orm::{
    sea_query::Expr, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, QueryFilter,
    QueryOrder,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, instrument, warn};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{
    entities::commerce::{product, Product, ProductModel, ProductStatus},
    errors::ServiceError,
};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct StockCheck {
    pub product_id: Uuid,
    pub available: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub quantity: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub available_quantity: Option<i32>,
}

impl StockCheck {
    pub fn evaluate(product_id: Uuid, product: Option<&ProductModel>, quantity: i32) -> Self {
        match product {
            None => Self {
                product_id,
                available: false,
                quantity: None,
                reason: Some("Product not found".into()),
                available_quantity: None,
            },
            Some(p) if p.can_supply(quantity) => Self {
                product_id,
                available: true,
                quantity: Some(quantity),
                reason: None,
                available_quantity: None,
            },
            Some(p) => Self {
                product_id,
                available: false,
                quantity: None,
                reason: Some("Insufficient stock".into()),
                available_quantity: Some(p.stock_quantity),
            },
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct BatchStockCheck {
    pub all_available: bool,
    pub items: Vec<StockCheck>,
}

#[derive(Clone)]
pub struct InventoryLedger {
    db: Arc<DatabaseConnection>,
}

impl InventoryLedger {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    #[instrument(skip(self))]
    pub async fn check_availability(
        &self,
        product_id: Uuid,
        quantity: i32,
    ) -> Result<StockCheck, ServiceError> {
        let product = Product::find_by_id(product_id).one(&*self.db).await?;
        Ok(StockCheck::evaluate(product_id, product.as_ref(), quantity))
    }

    #[instrument(skip(self, items), fields(count = items.len()))]
    pub async fn check_batch(
        &self,
        items: &[(Uuid, i32)],
    ) -> Result<BatchStockCheck, ServiceError> {
        let mut checks = Vec::with_capacity(items.len());
        for (product_id, quantity) in items {
            checks.push(self.check_availability(*product_id, *quantity).await?);
        }
        Ok(BatchStockCheck {
            all_available: checks.iter().all(|c| c.available),
            items: checks,
        })
    }

    /// Decrements tracked stock by `quantity` in one statement, failing with
    /// `InsufficientStock` when fewer units remain. Untracked products are left alone.
    pub async fn reserve_and_decrement<C: ConnectionTrait>(
        &self,
        conn: &C,
        product_id: Uuid,
        quantity: i32,
        now: DateTime<Utc>,
    ) -> Result<(), ServiceError> {
        if quantity < 1 {
            return Err(ServiceError::ValidationError(
                "quantity must be at least 1".into(),
            ));
        }

        let result = Product::update_many()
            .col_expr(
                product::Column::StockQuantity,
                Expr::col(product::Column::StockQuantity).sub(quantity),
            )
            .col_expr(product::Column::UpdatedAt, Expr::value(now))
            .filter(product::Column::Id.eq(product_id))
            .filter(product::Column::TrackInventory.eq(true))
            .filter(product::Column::StockQuantity.gte(quantity))
            .exec(conn)
            .await?;

        if result.rows_affected == 1 {
            debug!(%product_id, quantity, "stock decremented");
            return Ok(());
        }

        let product = Product::find_by_id(product_id)
            .one(conn)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Product {} not found", product_id)))?;

        if !product.track_inventory {
            return Ok(());
        }

        warn!(
            %product_id,
            requested = quantity,
            available = product.stock_quantity,
            "insufficient stock at reservation"
        );
        metrics::counter!("commerce.checkout.insufficient_stock", 1);
        Err(ServiceError::InsufficientStock {
            product_id,
            requested: quantity,
            available: product.stock_quantity.max(0),
        })
    }

    /// Active tracked products at or under their low-stock threshold, lowest first.
    pub async fn low_stock(&self) -> Result<Vec<ProductModel>, ServiceError> {
        Ok(Product::find()
            .filter(product::Column::Status.eq(ProductStatus::Active))
            .filter(product::Column::TrackInventory.eq(true))
            .filter(
                Expr::col(product::Column::StockQuantity)
                    .lte(Expr::col(product::Column::LowStockThreshold)),
            )
            .order_by_asc(product::Column::StockQuantity)
            .all(&*self.db)
            .await?)
    }
}
