use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::errors::ServiceError;

/// Materialized order. Everything except the lifecycle fields
/// (`status`, `payment_status`, `payment_intent_id`, `tracking_number`,
/// `shipped_at`, `delivered_at`, `updated_at`) is frozen at creation.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "orders")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    #[sea_orm(unique)]
    pub order_number: String,
    #[sea_orm(nullable)]
    pub user_id: Option<String>,
    pub customer_email: String,
    pub customer_first_name: String,
    pub customer_last_name: String,
    #[sea_orm(nullable)]
    pub customer_phone: Option<String>,
    #[sea_orm(column_type = "Json")]
    pub shipping_address: Json,
    #[sea_orm(column_type = "Json")]
    pub billing_address: Json,
    /// Frozen snapshot of [`OrderLine`]s.
    #[sea_orm(column_type = "Json")]
    pub items: Json,
    #[sea_orm(column_type = "Decimal(None)")]
    pub subtotal: Decimal,
    #[sea_orm(column_type = "Decimal(None)")]
    pub shipping_cost: Decimal,
    #[sea_orm(column_type = "Decimal(None)")]
    pub tax_amount: Decimal,
    #[sea_orm(column_type = "Decimal(None)")]
    pub discount_amount: Decimal,
    #[sea_orm(column_type = "Decimal(None)")]
    pub total_amount: Decimal,
    #[sea_orm(nullable)]
    pub coupon_code: Option<String>,
    #[sea_orm(nullable)]
    pub payment_intent_id: Option<String>,
    pub status: OrderStatus,
    pub payment_status: PaymentStatus,
    #[sea_orm(nullable)]
    pub tracking_number: Option<String>,
    #[sea_orm(nullable)]
    pub shipped_at: Option<DateTime<Utc>>,
    #[sea_orm(nullable)]
    pub delivered_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Model {
    pub fn line_items(&self) -> Result<Vec<OrderLine>, ServiceError> {
        Ok(serde_json::from_value(self.items.clone())?)
    }

    pub fn shipping_address(&self) -> Result<Address, ServiceError> {
        Address::decode(&self.shipping_address)
    }

    pub fn billing_address(&self) -> Result<Address, ServiceError> {
        Address::decode(&self.billing_address)
    }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::order_status_history::Entity")]
    StatusHistory,
    #[sea_orm(has_many = "super::coupon_usage::Entity")]
    CouponUsage,
}

impl Related<super::order_status_history::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::StatusHistory.def()
    }
}

impl Related<super::coupon_usage::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::CouponUsage.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

/// Shipment-oriented lifecycle status.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    EnumIter,
    DeriveActiveEnum,
    ToSchema,
    strum::Display,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(20))")]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum OrderStatus {
    #[sea_orm(string_value = "pending")]
    Pending,
    #[sea_orm(string_value = "processing")]
    Processing,
    #[sea_orm(string_value = "shipped")]
    Shipped,
    #[sea_orm(string_value = "delivered")]
    Delivered,
    #[sea_orm(string_value = "cancelled")]
    Cancelled,
    #[sea_orm(string_value = "refunded")]
    Refunded,
}

/// Payment status, orthogonal to [`OrderStatus`].
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Serialize,
    Deserialize,
    EnumIter,
    DeriveActiveEnum,
    ToSchema,
    strum::Display,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(20))")]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum PaymentStatus {
    #[sea_orm(string_value = "pending")]
    Pending,
    #[sea_orm(string_value = "paid")]
    Paid,
    #[sea_orm(string_value = "failed")]
    Failed,
    #[sea_orm(string_value = "refunded")]
    Refunded,
}

/// Snapshot of one purchased product, independent of later catalog edits.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct OrderLine {
    pub product_id: Uuid,
    pub product_name: String,
    pub quantity: i32,
    pub unit_price: Decimal,
    pub line_total: Decimal,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Address {
    #[validate(length(min = 1, max = 255))]
    pub line1: String,
    #[validate(length(max = 255))]
    pub line2: Option<String>,
    #[validate(length(min = 1, max = 100))]
    pub city: String,
    #[validate(length(max = 100))]
    pub state: Option<String>,
    #[validate(length(min = 1, max = 20))]
    pub postal_code: String,
    #[validate(length(min = 2, max = 56))]
    pub country: String,
}

impl Address {
    /// Decodes a stored address and re-applies input validation.
    pub fn decode(value: &Json) -> Result<Self, ServiceError> {
        let address: Address = serde_json::from_value(value.clone())?;
        address.validate().map_err(|e| {
            ServiceError::SerializationError(format!("stored address is invalid: {}", e))
        })?;
        Ok(address)
    }

    pub fn to_json(&self) -> Result<Json, ServiceError> {
        Ok(serde_json::to_value(self)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn status_display_matches_storage_value() {
        assert_eq!(OrderStatus::Processing.to_string(), "processing");
        assert_eq!(PaymentStatus::Refunded.to_string(), "refunded");
    }

    #[test]
    fn stored_address_is_revalidated() {
        let stored = json!({
            "line1": "",
            "city": "Austin",
            "postalCode": "78701",
            "country": "US"
        });
        assert!(matches!(
            Address::decode(&stored),
            Err(ServiceError::SerializationError(_))
        ));

        let stored = json!({
            "line1": "1 Main St",
            "city": "Austin",
            "postalCode": "78701",
            "country": "US"
        });
        let address = Address::decode(&stored).unwrap();
        assert_eq!(address.city, "Austin");
        assert_eq!(address.line2, None);
    }
}
