//! # Discount Evaluator
//!
//! Decides whether a discount code applies to an order amount and how much
//! it takes off. Pure: reads the discount, never changes it. Usage counting
//! happens only when an order commits.
//!
//! ## Check Order
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  evaluate(code, discount, amount, now)                                  │
//! │                                                                         │
//! │  1. exists && is_active           else DiscountNotFound                 │
//! │  2. starts_at <= now              else DiscountNotYetActive             │
//! │     now <= ends_at                else DiscountExpired                  │
//! │  3. usage_count < usage_limit     else DiscountUsageExceeded            │
//! │  4. amount >= min_order           else DiscountMinimumNotMet            │
//! │                                                                         │
//! │  First failing check wins.                                              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Computation
//! - Percentage: `round_half_up(amount × pct)`, capped by `max_discount`
//! - Fixed amount: `min(value, amount)`
//!
//! Either way the discount never exceeds the order amount.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::{CoreError, CoreResult};
use crate::money::Money;
use crate::types::{Discount, DiscountType};

/// Outcome of a successful evaluation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct AppliedDiscount {
    pub discount_id: String,
    pub code: String,
    pub discount_type: DiscountType,
    /// Amount taken off the order, 0 <= discount_amount <= order amount.
    pub discount_amount: Money,
}

/// Evaluates `discount` (looked up by `code`) against `order_amount` at `now`.
///
/// `discount` is `None` when the lookup found nothing; `code` is only used
/// to name the code in errors.
///
/// ## Example
/// ```rust,ignore
/// let applied = evaluate("SAVE10", Some(&discount), subtotal, Utc::now())?;
/// let total = subtotal.checked_sub(applied.discount_amount);
/// ```
pub fn evaluate(
    code: &str,
    discount: Option<&Discount>,
    order_amount: Money,
    now: DateTime<Utc>,
) -> CoreResult<AppliedDiscount> {
    let discount = match discount {
        Some(d) if d.is_active => d,
        _ => return Err(CoreError::DiscountNotFound(code.to_string())),
    };

    check_window(discount, now)?;

    if !discount.has_uses_remaining() {
        return Err(CoreError::DiscountUsageExceeded {
            code: discount.code.clone(),
            limit: discount.usage_limit.unwrap_or_default(),
        });
    }

    if order_amount < discount.min_order_amount() {
        return Err(CoreError::DiscountMinimumNotMet {
            code: discount.code.clone(),
            minimum_cents: discount.min_order_cents,
            amount_cents: order_amount.cents(),
        });
    }

    let discount_amount = compute_amount(discount, order_amount)?;

    Ok(AppliedDiscount {
        discount_id: discount.id.clone(),
        code: discount.code.clone(),
        discount_type: discount.discount_type,
        discount_amount,
    })
}

/// Missing bounds are open on that side.
fn check_window(discount: &Discount, now: DateTime<Utc>) -> CoreResult<()> {
    if let Some(starts_at) = discount.starts_at {
        if now < starts_at {
            return Err(CoreError::DiscountNotYetActive(discount.code.clone()));
        }
    }

    if let Some(ends_at) = discount.ends_at {
        if now > ends_at {
            return Err(CoreError::DiscountExpired(discount.code.clone()));
        }
    }

    Ok(())
}

fn compute_amount(discount: &Discount, order_amount: Money) -> CoreResult<Money> {
    let raw = match discount.discount_type {
        DiscountType::Percentage => {
            let raw = order_amount
                .percentage(discount.percentage())
                .ok_or_else(|| CoreError::overflow("percentage discount"))?;
            match discount.max_discount_amount() {
                Some(cap) => raw.min(cap),
                None => raw,
            }
        }
        DiscountType::FixedAmount => discount.fixed_amount(),
    };

    Ok(raw.min(order_amount).floor_zero())
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn percentage(bps: i64, cap: Option<i64>) -> Discount {
        let now = Utc::now();
        Discount {
            id: "d-pct".to_string(),
            code: "SAVE".to_string(),
            description: None,
            discount_type: DiscountType::Percentage,
            value: bps,
            min_order_cents: 0,
            max_discount_cents: cap,
            usage_limit: None,
            usage_count: 0,
            starts_at: None,
            ends_at: None,
            is_active: true,
            created_at: now,
            updated_at: now,
        }
    }

    fn fixed(cents: i64) -> Discount {
        Discount {
            id: "d-fixed".to_string(),
            code: "FLAT".to_string(),
            discount_type: DiscountType::FixedAmount,
            value: cents,
            ..percentage(0, None)
        }
    }

    fn cents(c: i64) -> Money {
        Money::from_cents(c)
    }

    #[test]
    fn test_percentage_capped_by_max_discount() {
        // 10% of $100.00 is $10.00, capped at $5.00
        let d = percentage(1000, Some(500));
        let applied = evaluate("SAVE", Some(&d), cents(10000), Utc::now()).unwrap();
        assert_eq!(applied.discount_amount, cents(500));
        assert_eq!(applied.discount_id, "d-pct");
    }

    #[test]
    fn test_percentage_without_cap() {
        let d = percentage(1000, None);
        let applied = evaluate("SAVE", Some(&d), cents(10000), Utc::now()).unwrap();
        assert_eq!(applied.discount_amount, cents(1000));
    }

    #[test]
    fn test_percentage_rounds_half_up() {
        // 12.5% of $0.99 = $0.12375 → $0.12; 15% of $0.99 = $0.1485 → $0.15
        let d = percentage(1250, None);
        assert_eq!(
            evaluate("SAVE", Some(&d), cents(99), Utc::now()).unwrap().discount_amount,
            cents(12)
        );
        let d = percentage(1500, None);
        assert_eq!(
            evaluate("SAVE", Some(&d), cents(99), Utc::now()).unwrap().discount_amount,
            cents(15)
        );
    }

    #[test]
    fn test_fixed_amount_never_exceeds_order() {
        // $50.00 off a $30.00 order takes $30.00, total $0.00
        let d = fixed(5000);
        let applied = evaluate("FLAT", Some(&d), cents(3000), Utc::now()).unwrap();
        assert_eq!(applied.discount_amount, cents(3000));
        assert_eq!(cents(3000).checked_sub(applied.discount_amount), Some(Money::zero()));
    }

    #[test]
    fn test_fixed_amount_below_order() {
        let d = fixed(500);
        let applied = evaluate("FLAT", Some(&d), cents(3000), Utc::now()).unwrap();
        assert_eq!(applied.discount_amount, cents(500));
    }

    #[test]
    fn test_missing_or_inactive_is_not_found() {
        let err = evaluate("NOPE", None, cents(1000), Utc::now()).unwrap_err();
        assert!(matches!(err, CoreError::DiscountNotFound(code) if code == "NOPE"));

        let mut d = percentage(1000, None);
        d.is_active = false;
        let err = evaluate("SAVE", Some(&d), cents(1000), Utc::now()).unwrap_err();
        assert!(matches!(err, CoreError::DiscountNotFound(_)));
    }

    #[test]
    fn test_window_bounds() {
        let now = Utc::now();

        let mut future = percentage(1000, None);
        future.starts_at = Some(now + Duration::days(1));
        assert!(matches!(
            evaluate("SAVE", Some(&future), cents(1000), now),
            Err(CoreError::DiscountNotYetActive(_))
        ));

        let mut past = percentage(1000, None);
        past.ends_at = Some(now - Duration::days(1));
        assert!(matches!(
            evaluate("SAVE", Some(&past), cents(1000), now),
            Err(CoreError::DiscountExpired(_))
        ));

        let mut open_ended = percentage(1000, None);
        open_ended.starts_at = Some(now - Duration::days(1));
        assert!(evaluate("SAVE", Some(&open_ended), cents(1000), now).is_ok());

        // Bounds are inclusive
        let mut exact = percentage(1000, None);
        exact.starts_at = Some(now);
        exact.ends_at = Some(now);
        assert!(evaluate("SAVE", Some(&exact), cents(1000), now).is_ok());
    }

    #[test]
    fn test_usage_limit_reached() {
        let mut d = percentage(1000, None);
        d.usage_limit = Some(1);
        d.usage_count = 1;
        let err = evaluate("SAVE", Some(&d), cents(1000), Utc::now()).unwrap_err();
        assert!(matches!(err, CoreError::DiscountUsageExceeded { limit: 1, .. }));
    }

    #[test]
    fn test_minimum_not_met() {
        let mut d = fixed(500);
        d.min_order_cents = 2000;
        let err = evaluate("FLAT", Some(&d), cents(1999), Utc::now()).unwrap_err();
        assert!(matches!(
            err,
            CoreError::DiscountMinimumNotMet {
                minimum_cents: 2000,
                amount_cents: 1999,
                ..
            }
        ));

        // Exactly the minimum qualifies
        assert!(evaluate("FLAT", Some(&d), cents(2000), Utc::now()).is_ok());
    }

    #[test]
    fn test_first_failing_check_wins() {
        // Expired AND exhausted AND below minimum: expiry is reported
        let now = Utc::now();
        let mut d = fixed(500);
        d.ends_at = Some(now - Duration::hours(1));
        d.usage_limit = Some(1);
        d.usage_count = 1;
        d.min_order_cents = 10_000;
        assert!(matches!(
            evaluate("FLAT", Some(&d), cents(100), now),
            Err(CoreError::DiscountExpired(_))
        ));

        // Exhausted AND below minimum: usage is reported
        d.ends_at = None;
        assert!(matches!(
            evaluate("FLAT", Some(&d), cents(100), now),
            Err(CoreError::DiscountUsageExceeded { .. })
        ));
    }

    #[test]
    fn test_evaluation_does_not_touch_usage() {
        let mut d = percentage(1000, None);
        d.usage_limit = Some(5);
        d.usage_count = 2;
        evaluate("SAVE", Some(&d), cents(1000), Utc::now()).unwrap();
        evaluate("SAVE", Some(&d), cents(1000), Utc::now()).unwrap();
        assert_eq!(d.usage_count, 2);
    }
}
