//! Property-based tests for checkout arithmetic.
//!
//! Amounts are generated as whole cents so every input is a valid store price.

use proptest::prelude::*;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use storefront_commerce::{
    entities::commerce::DiscountType,
    services::commerce::{
        coupon_service::compute_discount, order_service::allowed_transition, PricingPolicy,
    },
};

fn cents() -> impl Strategy<Value = Decimal> {
    (0i64..2_000_000).prop_map(|c| Decimal::new(c, 2))
}

fn percentage() -> impl Strategy<Value = Decimal> {
    (1i64..=100).prop_map(Decimal::from)
}

proptest! {
    #[test]
    fn total_is_sum_of_rounded_parts(subtotal in cents(), discount in cents()) {
        let b = PricingPolicy::default().compute(subtotal, discount);
        prop_assert_eq!(
            b.total,
            b.subtotal + b.shipping_cost + b.tax_amount - b.discount_amount
        );
        prop_assert!(b.total >= Decimal::ZERO);
        prop_assert!(b.tax_amount.scale() <= 2);
    }

    #[test]
    fn discount_never_exceeds_subtotal(subtotal in cents(), discount in cents()) {
        let b = PricingPolicy::default().compute(subtotal, discount);
        prop_assert!(b.discount_amount <= b.subtotal);
        prop_assert!(b.discount_amount >= Decimal::ZERO);
    }

    #[test]
    fn shipping_depends_only_on_threshold(subtotal in cents(), discount in cents()) {
        let policy = PricingPolicy::default();
        let b = policy.compute(subtotal, discount);
        if subtotal >= dec!(50.00) {
            prop_assert_eq!(b.shipping_cost, Decimal::ZERO);
        } else {
            prop_assert_eq!(b.shipping_cost, dec!(5.99));
        }
    }

    #[test]
    fn percentage_discount_respects_cap(
        subtotal in cents(),
        pct in percentage(),
        cap in prop::option::of(cents()),
    ) {
        let discount = compute_discount(DiscountType::Percentage, pct, cap, subtotal);
        prop_assert!(discount <= subtotal);
        if let Some(cap) = cap {
            prop_assert!(discount <= cap);
        }
        prop_assert!(discount <= subtotal * pct / Decimal::ONE_HUNDRED);
    }

    #[test]
    fn fixed_discount_is_min_of_value_and_subtotal(subtotal in cents(), value in cents()) {
        let discount = compute_discount(DiscountType::Fixed, value, None, subtotal);
        prop_assert_eq!(discount, value.min(subtotal));
    }

    #[test]
    fn tax_grows_with_discounted_subtotal(subtotal in cents(), extra in 1i64..10_000) {
        let policy = PricingPolicy::default();
        let smaller = policy.compute(subtotal, Decimal::ZERO);
        let larger = policy.compute(subtotal + Decimal::new(extra, 2), Decimal::ZERO);
        prop_assert!(larger.tax_amount >= smaller.tax_amount);
    }
}

#[test]
fn no_status_returns_to_pending() {
    use storefront_commerce::entities::commerce::OrderStatus::*;
    for from in [Pending, Processing, Shipped, Delivered, Cancelled, Refunded] {
        assert!(!allowed_transition(from, Pending));
    }
}
