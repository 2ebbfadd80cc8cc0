//! Checkout arithmetic.
//!
//! Every amount is carried at full precision and rounded to cents once, at
//! the end. The total is the sum of the rounded parts, so
//! `total == subtotal + shipping_cost + tax_amount - discount_amount` holds
//! exactly for every [`PriceBreakdown`].

use chrono::{DateTime, Utc};
use rust_decimal::{Decimal, RoundingStrategy};
use rust_decimal_macros::dec;
use sea_orm::ConnectionTrait;
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::config::PricingConfig;
use crate::errors::ServiceError;

use super::coupon_service::{CouponService, ValidatedCoupon};

pub fn round_money(amount: Decimal) -> Decimal {
    amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PricingPolicy {
    pub tax_rate: Decimal,
    pub free_shipping_threshold: Decimal,
    pub flat_shipping_fee: Decimal,
}

impl Default for PricingPolicy {
    fn default() -> Self {
        Self {
            tax_rate: dec!(0.08),
            free_shipping_threshold: dec!(50.00),
            flat_shipping_fee: dec!(5.99),
        }
    }
}

impl From<&PricingConfig> for PricingPolicy {
    fn from(cfg: &PricingConfig) -> Self {
        Self {
            tax_rate: cfg.tax_rate,
            free_shipping_threshold: cfg.free_shipping_threshold,
            flat_shipping_fee: cfg.flat_shipping_fee,
        }
    }
}

/// One line to be priced at the product's current effective price.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PricedLine {
    pub product_id: Uuid,
    pub quantity: i32,
    pub unit_price: Decimal,
}

impl PricedLine {
    pub fn line_total(&self) -> Decimal {
        self.unit_price * Decimal::from(self.quantity)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PriceBreakdown {
    pub subtotal: Decimal,
    pub shipping_cost: Decimal,
    pub tax_amount: Decimal,
    pub discount_amount: Decimal,
    pub total: Decimal,
}

pub fn subtotal_of(lines: &[PricedLine]) -> Decimal {
    lines.iter().map(PricedLine::line_total).sum()
}

impl PricingPolicy {
    pub fn shipping_for(&self, subtotal: Decimal) -> Decimal {
        if subtotal >= self.free_shipping_threshold {
            Decimal::ZERO
        } else {
            self.flat_shipping_fee
        }
    }

    /// Shipping is decided on the pre-discount subtotal; tax on the discounted one.
    pub fn compute(&self, subtotal: Decimal, discount: Decimal) -> PriceBreakdown {
        let discount = discount.max(Decimal::ZERO).min(subtotal);
        let shipping = self.shipping_for(subtotal);
        let tax = (subtotal - discount) * self.tax_rate;

        let subtotal = round_money(subtotal);
        let shipping_cost = round_money(shipping);
        let tax_amount = round_money(tax);
        let discount_amount = round_money(discount);

        PriceBreakdown {
            subtotal,
            shipping_cost,
            tax_amount,
            discount_amount,
            total: subtotal + shipping_cost + tax_amount - discount_amount,
        }
    }
}

/// Result of pricing a set of lines with an optional coupon.
#[derive(Debug, Clone)]
pub struct PricingOutcome {
    pub breakdown: PriceBreakdown,
    pub coupon: Option<ValidatedCoupon>,
}

#[derive(Clone)]
pub struct PricingService {
    policy: PricingPolicy,
    coupons: CouponService,
}

impl PricingService {
    pub fn new(policy: PricingPolicy, coupons: CouponService) -> Self {
        Self { policy, coupons }
    }

    pub fn policy(&self) -> &PricingPolicy {
        &self.policy
    }

    /// Prices `lines`. A rejected coupon surfaces as `InvalidCouponUsage`;
    /// callers that degrade to "no discount" use [`Self::price_lenient`].
    #[instrument(skip(self, conn, lines))]
    pub async fn price<C: ConnectionTrait>(
        &self,
        conn: &C,
        lines: &[PricedLine],
        coupon_code: Option<&str>,
        now: DateTime<Utc>,
    ) -> Result<PricingOutcome, ServiceError> {
        let subtotal = subtotal_of(lines);
        let coupon = match coupon_code.filter(|c| !c.trim().is_empty()) {
            Some(code) => Some(self.coupons.validate(conn, code, subtotal, now).await?),
            None => None,
        };
        let discount = coupon.as_ref().map_or(Decimal::ZERO, |c| c.discount);

        Ok(PricingOutcome {
            breakdown: self.policy.compute(subtotal, discount),
            coupon,
        })
    }

    /// Like [`Self::price`], but a rejected coupon prices the order at full price.
    pub async fn price_lenient<C: ConnectionTrait>(
        &self,
        conn: &C,
        lines: &[PricedLine],
        coupon_code: Option<&str>,
        now: DateTime<Utc>,
    ) -> Result<PricingOutcome, ServiceError> {
        match self.price(conn, lines, coupon_code, now).await {
            Err(ServiceError::InvalidCouponUsage { code, reason }) => {
                metrics::counter!("commerce.coupons.rejected", 1, "reason" => reason.code());
                info!(%code, %reason, "coupon not applied; pricing without discount");
                Ok(PricingOutcome {
                    breakdown: self.policy.compute(subtotal_of(lines), Decimal::ZERO),
                    coupon: None,
                })
            }
            other => other,
        }
    }

    pub fn price_without_coupon(&self, lines: &[PricedLine]) -> PriceBreakdown {
        self.policy.compute(subtotal_of(lines), Decimal::ZERO)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn line(price: Decimal, quantity: i32) -> PricedLine {
        PricedLine {
            product_id: Uuid::new_v4(),
            quantity,
            unit_price: price,
        }
    }

    #[test]
    fn worked_example_without_coupon() {
        let lines = vec![line(dec!(20), 2), line(dec!(15), 1)];
        let breakdown = PricingPolicy::default().compute(subtotal_of(&lines), Decimal::ZERO);

        assert_eq!(breakdown.subtotal, dec!(55.00));
        assert_eq!(breakdown.shipping_cost, dec!(0));
        assert_eq!(breakdown.tax_amount, dec!(4.40));
        assert_eq!(breakdown.discount_amount, dec!(0));
        assert_eq!(breakdown.total, dec!(59.40));
    }

    #[rstest]
    #[case(dec!(49.99), dec!(5.99))]
    #[case(dec!(50.00), dec!(0))]
    #[case(dec!(0.01), dec!(5.99))]
    #[case(dec!(120), dec!(0))]
    fn shipping_threshold(#[case] subtotal: Decimal, #[case] expected: Decimal) {
        assert_eq!(PricingPolicy::default().shipping_for(subtotal), expected);
    }

    #[test]
    fn tax_applies_after_discount() {
        let breakdown = PricingPolicy::default().compute(dec!(100), dec!(25));
        assert_eq!(breakdown.tax_amount, dec!(6.00));
        assert_eq!(breakdown.total, dec!(81.00));
    }

    #[test]
    fn discount_never_exceeds_subtotal() {
        let breakdown = PricingPolicy::default().compute(dec!(10), dec!(40));
        assert_eq!(breakdown.discount_amount, dec!(10));
        assert_eq!(breakdown.tax_amount, dec!(0));
        assert_eq!(breakdown.total, dec!(5.99));
    }

    #[test]
    fn rounding_happens_once_and_total_is_sum_of_parts() {
        let breakdown = PricingPolicy::default().compute(dec!(10.005), dec!(0.3335));
        assert_eq!(breakdown.subtotal, dec!(10.01));
        assert_eq!(breakdown.discount_amount, dec!(0.33));
        assert_eq!(
            breakdown.total,
            breakdown.subtotal + breakdown.shipping_cost + breakdown.tax_amount
                - breakdown.discount_amount
        );
    }

    #[test]
    fn custom_policy_is_honoured() {
        let policy = PricingPolicy {
            tax_rate: dec!(0.10),
            free_shipping_threshold: dec!(75),
            flat_shipping_fee: dec!(4.50),
        };
        let breakdown = policy.compute(dec!(60), Decimal::ZERO);
        assert_eq!(breakdown.shipping_cost, dec!(4.50));
        assert_eq!(breakdown.tax_amount, dec!(6.00));
        assert_eq!(breakdown.total, dec!(70.50));
    }
}
