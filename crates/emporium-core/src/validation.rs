//! # Validation Module
//!
//! Input validation utilities for Emporium.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: HTTP layer (request DTOs)                                    │
//! │  ├── Schema / bounds checks, email format                              │
//! │  └── Role checks                                                        │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: Checkout engine (Rust)                                       │
//! │  └── THIS MODULE: domain rules re-checked (quantities, codes, ranges)  │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: Database (SQLite)                                            │
//! │  ├── NOT NULL / CHECK constraints                                      │
//! │  ├── UNIQUE constraints                                                │
//! │  └── Foreign key constraints                                           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use emporium_core::validation::{normalize_discount_code, validate_quantity};
//!
//! validate_quantity(5).unwrap();
//! assert_eq!(normalize_discount_code(" save10 ").unwrap(), "SAVE10");
//! ```

use crate::error::ValidationError;
use crate::money::Percentage;
use crate::types::{DiscountType, NewDiscount};
use crate::MAX_ITEM_QUANTITY;

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

/// Longest accepted discount code.
pub const MAX_DISCOUNT_CODE_LEN: usize = 32;

// =============================================================================
// String Validators
// =============================================================================

/// Validates a SKU (Stock Keeping Unit).
///
/// ## Rules
/// - Must not be empty
/// - At most 50 characters
/// - Only alphanumeric characters, hyphens, underscores
///
/// ## Example
/// ```rust
/// use emporium_core::validation::validate_sku;
///
/// assert!(validate_sku("TEE-BLK-M").is_ok());
/// assert!(validate_sku("").is_err());
/// ```
pub fn validate_sku(sku: &str) -> ValidationResult<()> {
    let sku = sku.trim();

    if sku.is_empty() {
        return Err(ValidationError::Required {
            field: "sku".to_string(),
        });
    }

    if sku.len() > 50 {
        return Err(ValidationError::TooLong {
            field: "sku".to_string(),
            max: 50,
        });
    }

    if !sku
        .chars()
        .all(|c| c.is_alphanumeric() || c == '-' || c == '_')
    {
        return Err(ValidationError::InvalidFormat {
            field: "sku".to_string(),
            reason: "must contain only letters, numbers, hyphens, and underscores".to_string(),
        });
    }

    Ok(())
}

/// Validates a product name: non-empty, at most 200 characters.
pub fn validate_product_name(name: &str) -> ValidationResult<()> {
    let name = name.trim();

    if name.is_empty() {
        return Err(ValidationError::Required {
            field: "name".to_string(),
        });
    }

    if name.len() > 200 {
        return Err(ValidationError::TooLong {
            field: "name".to_string(),
            max: 200,
        });
    }

    Ok(())
}

/// Trims and upper-cases a discount code, rejecting blank or malformed ones.
///
/// Codes are compared case-insensitively everywhere; storing the upper-cased
/// form keeps the UNIQUE index honest.
///
/// ## Example
/// ```rust
/// use emporium_core::validation::normalize_discount_code;
///
/// assert_eq!(normalize_discount_code("summer-25").unwrap(), "SUMMER-25");
/// assert!(normalize_discount_code("   ").is_err());
/// assert!(normalize_discount_code("no spaces").is_err());
/// ```
pub fn normalize_discount_code(code: &str) -> ValidationResult<String> {
    let code = code.trim();

    if code.is_empty() {
        return Err(ValidationError::Required {
            field: "discount code".to_string(),
        });
    }

    if code.len() > MAX_DISCOUNT_CODE_LEN {
        return Err(ValidationError::TooLong {
            field: "discount code".to_string(),
            max: MAX_DISCOUNT_CODE_LEN,
        });
    }

    if !code
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
    {
        return Err(ValidationError::InvalidFormat {
            field: "discount code".to_string(),
            reason: "must contain only letters, numbers, hyphens, and underscores".to_string(),
        });
    }

    Ok(code.to_ascii_uppercase())
}

// =============================================================================
// Numeric Validators
// =============================================================================

/// Validates a quantity value.
///
/// ## Rules
/// - Must be positive (> 0)
/// - Must not exceed MAX_ITEM_QUANTITY (999)
///
/// ```text
/// validate_quantity(qty)
///       │
///       ├── qty <= 0?  → MustBePositive
///       ├── qty > 999? → OutOfRange
///       └── OK
/// ```
pub fn validate_quantity(qty: i64) -> ValidationResult<()> {
    if qty <= 0 {
        return Err(ValidationError::MustBePositive {
            field: "quantity".to_string(),
        });
    }

    if qty > MAX_ITEM_QUANTITY {
        return Err(ValidationError::OutOfRange {
            field: "quantity".to_string(),
            min: 1,
            max: MAX_ITEM_QUANTITY,
        });
    }

    Ok(())
}

/// Validates a price in cents. Zero is allowed (free items).
///
/// ```rust
/// use emporium_core::validation::validate_price_cents;
///
/// assert!(validate_price_cents(1099).is_ok());
/// assert!(validate_price_cents(0).is_ok());
/// assert!(validate_price_cents(-100).is_err());
/// ```
pub fn validate_price_cents(cents: i64) -> ValidationResult<()> {
    if cents < 0 {
        return Err(ValidationError::OutOfRange {
            field: "price".to_string(),
            min: 0,
            max: i64::MAX,
        });
    }

    Ok(())
}

/// Validates a percentage in basis points: 0% to 100%.
pub fn validate_percentage_bps(bps: i64) -> ValidationResult<()> {
    if !(0..=Percentage::FULL.bps() as i64).contains(&bps) {
        return Err(ValidationError::OutOfRange {
            field: "percentage".to_string(),
            min: 0,
            max: Percentage::FULL.bps() as i64,
        });
    }

    Ok(())
}

// =============================================================================
// Discount Validators
// =============================================================================

/// Validates a new discount and returns it with its code normalized.
///
/// ## Rules
/// - Code: see [`normalize_discount_code`]
/// - Percentage: value in 1..=10000 bps; cap (if any) positive
/// - Fixed amount: value positive; cap not allowed
/// - Minimum order, usage limit: non-negative / positive
/// - Window: start before end when both are set
pub fn validate_new_discount(discount: &NewDiscount) -> ValidationResult<NewDiscount> {
    let code = normalize_discount_code(&discount.code)?;

    if discount.value <= 0 {
        return Err(ValidationError::MustBePositive {
            field: "value".to_string(),
        });
    }

    match discount.discount_type {
        DiscountType::Percentage => {
            validate_percentage_bps(discount.value)?;
            if let Some(cap) = discount.max_discount_cents {
                if cap <= 0 {
                    return Err(ValidationError::MustBePositive {
                        field: "max discount".to_string(),
                    });
                }
            }
        }
        DiscountType::FixedAmount => {
            if discount.max_discount_cents.is_some() {
                return Err(ValidationError::InvalidFormat {
                    field: "max discount".to_string(),
                    reason: "only percentage discounts can be capped".to_string(),
                });
            }
        }
    }

    if discount.min_order_cents < 0 {
        return Err(ValidationError::OutOfRange {
            field: "min order".to_string(),
            min: 0,
            max: i64::MAX,
        });
    }

    if let Some(limit) = discount.usage_limit {
        if limit <= 0 {
            return Err(ValidationError::MustBePositive {
                field: "usage limit".to_string(),
            });
        }
    }

    if let (Some(start), Some(end)) = (discount.starts_at, discount.ends_at) {
        if start > end {
            return Err(ValidationError::InvalidFormat {
                field: "validity window".to_string(),
                reason: "start must not be after end".to_string(),
            });
        }
    }

    Ok(NewDiscount {
        code,
        ..discount.clone()
    })
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::money::Money;
    use chrono::{Duration, Utc};

    #[test]
    fn test_validate_sku() {
        assert!(validate_sku("TEE-BLK-M").is_ok());
        assert!(validate_sku("mug_01").is_ok());

        assert!(validate_sku("").is_err());
        assert!(validate_sku("   ").is_err());
        assert!(validate_sku("has space").is_err());
        assert!(validate_sku(&"A".repeat(100)).is_err());
    }

    #[test]
    fn test_validate_product_name() {
        assert!(validate_product_name("Linen Shirt").is_ok());
        assert!(validate_product_name("").is_err());
        assert!(validate_product_name(&"A".repeat(300)).is_err());
    }

    #[test]
    fn test_normalize_discount_code() {
        assert_eq!(normalize_discount_code("save10").unwrap(), "SAVE10");
        assert_eq!(normalize_discount_code("  Save10 ").unwrap(), "SAVE10");
        assert!(normalize_discount_code("").is_err());
        assert!(normalize_discount_code("bad code").is_err());
        assert!(normalize_discount_code(&"X".repeat(33)).is_err());
    }

    #[test]
    fn test_validate_quantity() {
        assert!(validate_quantity(1).is_ok());
        assert!(validate_quantity(999).is_ok());

        assert!(validate_quantity(0).is_err());
        assert!(validate_quantity(-1).is_err());
        assert!(validate_quantity(1000).is_err());
    }

    #[test]
    fn test_validate_price_cents() {
        assert!(validate_price_cents(0).is_ok());
        assert!(validate_price_cents(1099).is_ok());
        assert!(validate_price_cents(-100).is_err());
    }

    #[test]
    fn test_validate_percentage_bps() {
        assert!(validate_percentage_bps(0).is_ok());
        assert!(validate_percentage_bps(1250).is_ok());
        assert!(validate_percentage_bps(10000).is_ok());
        assert!(validate_percentage_bps(10001).is_err());
        assert!(validate_percentage_bps(-1).is_err());
    }

    #[test]
    fn test_validate_new_discount_normalizes_code() {
        let discount = NewDiscount::percentage(" welcome ", Percentage::from_whole(15));
        let validated = validate_new_discount(&discount).unwrap();
        assert_eq!(validated.code, "WELCOME");
        assert_eq!(validated.value, 1500);
    }

    #[test]
    fn test_validate_new_discount_rejects_bad_values() {
        let over_100 = NewDiscount::percentage("BIG", Percentage::from_whole(101));
        assert!(validate_new_discount(&over_100).is_err());

        let zero_fixed = NewDiscount::fixed_amount("NONE", Money::zero());
        assert!(validate_new_discount(&zero_fixed).is_err());

        let mut capped_fixed = NewDiscount::fixed_amount("CAP", Money::from_cents(500));
        capped_fixed.max_discount_cents = Some(100);
        assert!(validate_new_discount(&capped_fixed).is_err());

        let mut zero_limit = NewDiscount::fixed_amount("LIMIT", Money::from_cents(500));
        zero_limit.usage_limit = Some(0);
        assert!(validate_new_discount(&zero_limit).is_err());

        let mut backwards = NewDiscount::fixed_amount("WINDOW", Money::from_cents(500));
        backwards.starts_at = Some(Utc::now());
        backwards.ends_at = Some(Utc::now() - Duration::days(1));
        assert!(validate_new_discount(&backwards).is_err());
    }
}
