//! Tiered bulk-discount pricing
//!
//! Pure computation: the event's tier snapshot is passed in, nothing is
//! read from ambient state. Amounts are integer minor units of the batch
//! currency.

use crate::models::DiscountTier;
use serde::{Deserialize, Serialize};

/// Pricing result; `total_amount = base_amount - discount_amount` by
/// construction, the three are never written independently
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PricingBreakdown {
    pub base_amount: i64,
    pub discount_percent: f64,
    pub discount_amount: i64,
    pub total_amount: i64,
}

/// Round half-up to the nearest minor unit, applied once at the end
fn round_half_up(value: f64) -> i64 {
    (value + 0.5).floor() as i64
}

/// Compute base, discount and total for a batch
///
/// Tiers with `min_students <= student_count` are eligible; the single
/// tier with the greatest `min_students` wins (minimums are unique per
/// event, so there is no tie to break). Discounts are not cumulative.
/// No eligible tier means no discount.
pub fn compute_total(
    student_count: u32,
    unit_fee: i64,
    tiers: &[DiscountTier],
) -> PricingBreakdown {
    let base_amount = unit_fee * student_count as i64;

    let discount_percent = tiers
        .iter()
        .filter(|tier| tier.min_students <= student_count)
        .max_by_key(|tier| tier.min_students)
        .map(|tier| tier.discount_percent)
        .unwrap_or(0.0);

    let discount_amount =
        round_half_up(base_amount as f64 * discount_percent / 100.0).min(base_amount);

    PricingBreakdown {
        base_amount,
        discount_percent,
        discount_amount,
        total_amount: base_amount - discount_amount,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tiers() -> Vec<DiscountTier> {
        vec![
            DiscountTier { min_students: 10, discount_percent: 5.0 },
            DiscountTier { min_students: 50, discount_percent: 10.0 },
        ]
    }

    #[test]
    fn test_ten_students_hit_first_tier() {
        let pricing = compute_total(10, 100, &tiers());
        assert_eq!(pricing.base_amount, 1000);
        assert_eq!(pricing.discount_percent, 5.0);
        assert_eq!(pricing.discount_amount, 50);
        assert_eq!(pricing.total_amount, 950);
    }

    #[test]
    fn test_forty_nine_students_stay_on_lower_tier() {
        let pricing = compute_total(49, 100, &tiers());
        assert_eq!(pricing.base_amount, 4900);
        assert_eq!(pricing.discount_percent, 5.0);
        assert_eq!(pricing.discount_amount, 245);
        assert_eq!(pricing.total_amount, 4655);
    }

    #[test]
    fn test_tier_boundary_is_inclusive() {
        assert_eq!(compute_total(50, 100, &tiers()).discount_percent, 10.0);
        assert_eq!(compute_total(49, 100, &tiers()).discount_percent, 5.0);
        assert_eq!(compute_total(10, 100, &tiers()).discount_percent, 5.0);
        assert_eq!(compute_total(9, 100, &tiers()).discount_percent, 0.0);
    }

    #[test]
    fn test_no_eligible_tier_means_no_discount() {
        let pricing = compute_total(5, 100, &tiers());
        assert_eq!(pricing.discount_amount, 0);
        assert_eq!(pricing.total_amount, pricing.base_amount);
    }

    #[test]
    fn test_rounding_half_up_once() {
        // 3 students at 33 minor units, 5% => 4.95 rounds to 5
        let tiers = vec![DiscountTier { min_students: 1, discount_percent: 5.0 }];
        let pricing = compute_total(3, 33, &tiers);
        assert_eq!(pricing.base_amount, 99);
        assert_eq!(pricing.discount_amount, 5);
        assert_eq!(pricing.total_amount, 94);
    }

    #[test]
    fn test_discount_never_exceeds_base() {
        let tiers = vec![DiscountTier { min_students: 1, discount_percent: 100.0 }];
        for count in [1u32, 7, 49, 200] {
            let pricing = compute_total(count, 125, &tiers);
            assert!(pricing.discount_amount <= pricing.base_amount);
            assert_eq!(
                pricing.total_amount,
                pricing.base_amount - pricing.discount_amount
            );
        }
    }
}
