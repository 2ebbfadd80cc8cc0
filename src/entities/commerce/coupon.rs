use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

/// Discount code with a validity window, usage cap and minimum order amount.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "coupons")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    /// Always stored upper-cased.
    #[sea_orm(unique)]
    pub code: String,
    #[sea_orm(nullable)]
    pub description: Option<String>,
    pub discount_type: DiscountType,
    #[sea_orm(column_type = "Decimal(None)")]
    pub discount_value: Decimal,
    #[sea_orm(column_type = "Decimal(None)")]
    pub minimum_order: Decimal,
    /// Cap applied to percentage discounts.
    #[sea_orm(column_type = "Decimal(None)", nullable)]
    pub maximum_discount: Option<Decimal>,
    #[sea_orm(nullable)]
    pub usage_limit: Option<i32>,
    pub used_count: i32,
    pub valid_from: DateTime<Utc>,
    pub valid_until: DateTime<Utc>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, EnumIter, DeriveActiveEnum, ToSchema,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(20))")]
#[serde(rename_all = "lowercase")]
pub enum DiscountType {
    #[sea_orm(string_value = "percentage")]
    Percentage,
    #[sea_orm(string_value = "fixed")]
    Fixed,
}
