use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::{
    sea_query::{Condition, Expr},
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, QueryFilter,
    QueryOrder, Set,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, instrument, warn};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::{
    entities::commerce::{coupon, coupon_usage, Coupon, CouponModel, DiscountType},
    errors::{is_unique_violation, ServiceError},
};

/// Why a coupon cannot be applied to a given subtotal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum CouponRejection {
    NotFound,
    Inactive,
    Expired,
    UsageExceeded,
    BelowMinimum,
}

impl CouponRejection {
    pub fn code(&self) -> &'static str {
        match self {
            Self::NotFound => "not_found",
            Self::Inactive => "inactive",
            Self::Expired => "expired",
            Self::UsageExceeded => "usage_exceeded",
            Self::BelowMinimum => "below_minimum",
        }
    }
}

impl std::fmt::Display for CouponRejection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let text = match self {
            Self::NotFound => "coupon does not exist",
            Self::Inactive => "coupon is not active",
            Self::Expired => "coupon is outside its validity window",
            Self::UsageExceeded => "coupon usage limit reached",
            Self::BelowMinimum => "order subtotal is below the coupon minimum",
        };
        f.write_str(text)
    }
}

/// A coupon that passed validation, with the discount it grants.
#[derive(Debug, Clone)]
pub struct ValidatedCoupon {
    pub coupon: CouponModel,
    pub discount: Decimal,
}

pub fn normalize_code(code: &str) -> String {
    code.trim().to_uppercase()
}

/// Percentage discounts respect the optional cap; no discount exceeds the subtotal.
pub fn compute_discount(
    discount_type: DiscountType,
    value: Decimal,
    maximum_discount: Option<Decimal>,
    subtotal: Decimal,
) -> Decimal {
    let raw = match discount_type {
        DiscountType::Percentage => {
            let pct = subtotal * value / Decimal::ONE_HUNDRED;
            maximum_discount.map_or(pct, |cap| pct.min(cap))
        }
        DiscountType::Fixed => value,
    };
    raw.max(Decimal::ZERO).min(subtotal.max(Decimal::ZERO))
}

/// Checks in order: active, validity window, usage cap, minimum order.
pub fn check_coupon(
    coupon: &CouponModel,
    subtotal: Decimal,
    now: DateTime<Utc>,
) -> Result<Decimal, CouponRejection> {
    if !coupon.is_active {
        return Err(CouponRejection::Inactive);
    }
    if now < coupon.valid_from || now > coupon.valid_until {
        return Err(CouponRejection::Expired);
    }
    if let Some(limit) = coupon.usage_limit {
        if coupon.used_count >= limit {
            return Err(CouponRejection::UsageExceeded);
        }
    }
    if subtotal < coupon.minimum_order {
        return Err(CouponRejection::BelowMinimum);
    }
    Ok(compute_discount(
        coupon.discount_type,
        coupon.discount_value,
        coupon.maximum_discount,
        subtotal,
    ))
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateCouponInput {
    #[validate(length(min = 1, max = 50))]
    pub code: String,
    #[validate(length(max = 500))]
    pub description: Option<String>,
    pub discount_type: DiscountType,
    pub discount_value: Decimal,
    pub minimum_order: Option<Decimal>,
    pub maximum_discount: Option<Decimal>,
    #[validate(range(min = 1))]
    pub usage_limit: Option<i32>,
    pub valid_from: DateTime<Utc>,
    pub valid_until: DateTime<Utc>,
}

impl CreateCouponInput {
    fn check_business_rules(&self) -> Result<(), ServiceError> {
        match self.discount_type {
            DiscountType::Percentage
                if self.discount_value <= Decimal::ZERO
                    || self.discount_value > Decimal::ONE_HUNDRED =>
            {
                return Err(ServiceError::ValidationError(
                    "percentage discount must be greater than 0 and at most 100".into(),
                ));
            }
            DiscountType::Fixed if self.discount_value <= Decimal::ZERO => {
                return Err(ServiceError::ValidationError(
                    "fixed discount must be greater than 0".into(),
                ));
            }
            _ => {}
        }
        if self
            .minimum_order
            .is_some_and(|m| m.is_sign_negative())
            || self
                .maximum_discount
                .is_some_and(|m| m <= Decimal::ZERO)
        {
            return Err(ServiceError::ValidationError(
                "minimumOrder must be >= 0 and maximumDiscount > 0".into(),
            ));
        }
        if self.valid_until <= self.valid_from {
            return Err(ServiceError::ValidationError(
                "validUntil must be after validFrom".into(),
            ));
        }
        if normalize_code(&self.code).is_empty() {
            return Err(ServiceError::ValidationError("code must not be blank".into()));
        }
        Ok(())
    }
}

#[derive(Clone)]
pub struct CouponService {
    db: Arc<DatabaseConnection>,
}

impl CouponService {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    pub async fn find_by_code<C: ConnectionTrait>(
        &self,
        conn: &C,
        code: &str,
    ) -> Result<Option<CouponModel>, ServiceError> {
        Ok(Coupon::find()
            .filter(coupon::Column::Code.eq(normalize_code(code)))
            .one(conn)
            .await?)
    }

    /// Validates `code` against `subtotal`; rejection is `InvalidCouponUsage`.
    #[instrument(skip(self, conn))]
    pub async fn validate<C: ConnectionTrait>(
        &self,
        conn: &C,
        code: &str,
        subtotal: Decimal,
        now: DateTime<Utc>,
    ) -> Result<ValidatedCoupon, ServiceError> {
        let reject = |reason| ServiceError::InvalidCouponUsage {
            code: normalize_code(code),
            reason,
        };

        let coupon = self
            .find_by_code(conn, code)
            .await?
            .ok_or_else(|| reject(CouponRejection::NotFound))?;
        let discount = check_coupon(&coupon, subtotal, now).map_err(reject)?;

        Ok(ValidatedCoupon { coupon, discount })
    }

    /// Atomically bumps `used_count` unless the cap has been reached meanwhile.
    /// Returns `false` when another checkout took the last redemption.
    pub async fn redeem<C: ConnectionTrait>(
        &self,
        conn: &C,
        coupon_id: Uuid,
        now: DateTime<Utc>,
    ) -> Result<bool, ServiceError> {
        let result = Coupon::update_many()
            .col_expr(
                coupon::Column::UsedCount,
                Expr::col(coupon::Column::UsedCount).add(1),
            )
            .col_expr(coupon::Column::UpdatedAt, Expr::value(now))
            .filter(coupon::Column::Id.eq(coupon_id))
            .filter(coupon::Column::IsActive.eq(true))
            .filter(
                Condition::any()
                    .add(coupon::Column::UsageLimit.is_null())
                    .add(
                        Expr::col(coupon::Column::UsedCount)
                            .lt(Expr::col(coupon::Column::UsageLimit)),
                    ),
            )
            .exec(conn)
            .await?;

        if result.rows_affected == 0 {
            warn!(%coupon_id, "coupon redemption lost the race for its last use");
        }
        Ok(result.rows_affected == 1)
    }

    pub async fn record_usage<C: ConnectionTrait>(
        &self,
        conn: &C,
        coupon_id: Uuid,
        order_id: Uuid,
        user_id: Option<String>,
        discount_applied: Decimal,
        now: DateTime<Utc>,
    ) -> Result<(), ServiceError> {
        coupon_usage::ActiveModel {
            id: Set(Uuid::new_v4()),
            coupon_id: Set(coupon_id),
            order_id: Set(order_id),
            user_id: Set(user_id),
            discount_applied: Set(discount_applied),
            created_at: Set(now),
        }
        .insert(conn)
        .await?;
        Ok(())
    }

    pub async fn list(&self) -> Result<Vec<CouponModel>, ServiceError> {
        Ok(Coupon::find()
            .order_by_desc(coupon::Column::CreatedAt)
            .all(&*self.db)
            .await?)
    }

    #[instrument(skip(self, input), fields(code = %input.code))]
    pub async fn create(&self, input: CreateCouponInput) -> Result<CouponModel, ServiceError> {
        input.validate()?;
        input.check_business_rules()?;

        let code = normalize_code(&input.code);
        if self.find_by_code(&*self.db, &code).await?.is_some() {
            return Err(ServiceError::Conflict(format!(
                "Coupon code {} already exists",
                code
            )));
        }

        let now = Utc::now();
        let model = coupon::ActiveModel {
            id: Set(Uuid::new_v4()),
            code: Set(code.clone()),
            description: Set(input.description),
            discount_type: Set(input.discount_type),
            discount_value: Set(input.discount_value),
            minimum_order: Set(input.minimum_order.unwrap_or(Decimal::ZERO)),
            maximum_discount: Set(input.maximum_discount),
            usage_limit: Set(input.usage_limit),
            used_count: Set(0),
            valid_from: Set(input.valid_from),
            valid_until: Set(input.valid_until),
            is_active: Set(true),
            created_at: Set(now),
            updated_at: Set(now),
        };

        let created = model.insert(&*self.db).await.map_err(|e| {
            if is_unique_violation(&e) {
                ServiceError::Conflict(format!("Coupon code {} already exists", code))
            } else {
                ServiceError::DatabaseError(e)
            }
        })?;

        info!(coupon_id = %created.id, code = %created.code, "coupon created");
        Ok(created)
    }

    #[instrument(skip(self))]
    pub async fn toggle(&self, id: Uuid) -> Result<CouponModel, ServiceError> {
        let coupon = Coupon::find_by_id(id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Coupon {} not found", id)))?;

        let is_active = !coupon.is_active;
        let mut active: coupon::ActiveModel = coupon.into();
        active.is_active = Set(is_active);
        active.updated_at = Set(Utc::now());
        let updated = active.update(&*self.db).await?;

        info!(coupon_id = %id, is_active, "coupon toggled");
        Ok(updated)
    }

    /// Idempotent; usage records are kept.
    #[instrument(skip(self))]
    pub async fn delete(&self, id: Uuid) -> Result<(), ServiceError> {
        let result = Coupon::delete_by_id(id).exec(&*self.db).await?;
        info!(coupon_id = %id, deleted = result.rows_affected, "coupon delete");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use chrono::Duration;
    use rstest::rstest;
    use rust_decimal_macros::dec;

    fn coupon(discount_type: DiscountType, value: Decimal) -> CouponModel {
        let now = Utc::now();
        CouponModel {
            id: Uuid::new_v4(),
            code: "WELCOME".into(),
            description: None,
            discount_type,
            discount_value: value,
            minimum_order: dec!(0),
            maximum_discount: None,
            usage_limit: None,
            used_count: 0,
            valid_from: now - Duration::days(1),
            valid_until: now + Duration::days(1),
            is_active: true,
            created_at: now,
            updated_at: now,
        }
    }

    #[rstest]
    #[case(dec!(100), dec!(10), None, dec!(10))]
    #[case(dec!(100), dec!(50), Some(dec!(20)), dec!(20))]
    #[case(dec!(30), dec!(10), Some(dec!(20)), dec!(3))]
    fn percentage_discount_respects_cap(
        #[case] subtotal: Decimal,
        #[case] pct: Decimal,
        #[case] cap: Option<Decimal>,
        #[case] expected: Decimal,
    ) {
        assert_eq!(
            compute_discount(DiscountType::Percentage, pct, cap, subtotal),
            expected
        );
    }

    #[test]
    fn fixed_discount_never_exceeds_subtotal() {
        assert_eq!(
            compute_discount(DiscountType::Fixed, dec!(15), None, dec!(40)),
            dec!(15)
        );
        assert_eq!(
            compute_discount(DiscountType::Fixed, dec!(15), None, dec!(9.50)),
            dec!(9.50)
        );
    }

    #[test]
    fn expired_and_future_coupons_are_rejected() {
        let now = Utc::now();
        let mut c = coupon(DiscountType::Fixed, dec!(5));
        c.valid_until = now - Duration::hours(1);
        assert_matches!(check_coupon(&c, dec!(40), now), Err(CouponRejection::Expired));

        let mut c = coupon(DiscountType::Fixed, dec!(5));
        c.valid_from = now + Duration::hours(1);
        assert_matches!(check_coupon(&c, dec!(40), now), Err(CouponRejection::Expired));
    }

    #[test]
    fn usage_cap_and_minimum_are_enforced() {
        let now = Utc::now();
        let mut c = coupon(DiscountType::Percentage, dec!(10));
        c.usage_limit = Some(3);
        c.used_count = 3;
        assert_matches!(
            check_coupon(&c, dec!(40), now),
            Err(CouponRejection::UsageExceeded)
        );

        let mut c = coupon(DiscountType::Percentage, dec!(10));
        c.minimum_order = dec!(50);
        assert_matches!(
            check_coupon(&c, dec!(49.99), now),
            Err(CouponRejection::BelowMinimum)
        );
        assert_eq!(check_coupon(&c, dec!(50), now), Ok(dec!(5)));
    }

    #[test]
    fn inactive_coupon_is_rejected_first() {
        let mut c = coupon(DiscountType::Fixed, dec!(5));
        c.is_active = false;
        c.valid_until = Utc::now() - Duration::days(3);
        assert_matches!(
            check_coupon(&c, dec!(40), Utc::now()),
            Err(CouponRejection::Inactive)
        );
    }

    #[test]
    fn codes_are_normalized() {
        assert_eq!(normalize_code("  save10 "), "SAVE10");
    }

    fn input(discount_type: DiscountType, value: Decimal) -> CreateCouponInput {
        let now = Utc::now();
        CreateCouponInput {
            code: "spring".into(),
            description: None,
            discount_type,
            discount_value: value,
            minimum_order: None,
            maximum_discount: None,
            usage_limit: None,
            valid_from: now,
            valid_until: now + Duration::days(30),
        }
    }

    #[rstest]
    #[case(DiscountType::Percentage, dec!(0), false)]
    #[case(DiscountType::Percentage, dec!(100), true)]
    #[case(DiscountType::Percentage, dec!(100.5), false)]
    #[case(DiscountType::Fixed, dec!(0), false)]
    #[case(DiscountType::Fixed, dec!(250), true)]
    fn create_input_value_rules(
        #[case] discount_type: DiscountType,
        #[case] value: Decimal,
        #[case] ok: bool,
    ) {
        assert_eq!(input(discount_type, value).check_business_rules().is_ok(), ok);
    }

    #[test]
    fn create_input_requires_forward_window() {
        let mut i = input(DiscountType::Fixed, dec!(5));
        i.valid_until = i.valid_from;
        assert_matches!(
            i.check_business_rules(),
            Err(ServiceError::ValidationError(_))
        );
    }

    #[test]
    fn rejection_display_is_human_readable() {
        let err = ServiceError::InvalidCouponUsage {
            code: "SAVE10".into(),
            reason: CouponRejection::UsageExceeded,
        };
        assert_eq!(
            err.to_string(),
            "Coupon SAVE10 cannot be applied: coupon usage limit reached"
        );
    }
}
