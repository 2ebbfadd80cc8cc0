use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

/// Catalog product as seen by the cart and checkout.
///
/// Catalog maintenance happens elsewhere; this service reads prices and
/// mutates `stock_quantity` only.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "products")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub name: String,
    #[sea_orm(unique)]
    pub slug: String,
    #[sea_orm(column_type = "Decimal(None)")]
    pub price: Decimal,
    #[sea_orm(column_type = "Decimal(None)", nullable)]
    pub sale_price: Option<Decimal>,
    pub stock_quantity: i32,
    pub track_inventory: bool,
    pub low_stock_threshold: i32,
    pub status: ProductStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Model {
    /// Sale price when one is set, list price otherwise.
    pub fn effective_price(&self) -> Decimal {
        self.sale_price.unwrap_or(self.price)
    }

    pub fn is_active(&self) -> bool {
        self.status == ProductStatus::Active
    }

    /// Untracked products are always available.
    pub fn can_supply(&self, quantity: i32) -> bool {
        !self.track_inventory || self.stock_quantity >= quantity
    }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::cart_item::Entity")]
    CartItems,
}

impl Related<super::cart_item::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::CartItems.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, EnumIter, DeriveActiveEnum, ToSchema,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(20))")]
#[serde(rename_all = "lowercase")]
pub enum ProductStatus {
    #[sea_orm(string_value = "active")]
    Active,
    #[sea_orm(string_value = "draft")]
    Draft,
    #[sea_orm(string_value = "archived")]
    Archived,
}
