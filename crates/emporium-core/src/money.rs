//! # Money
//!
//! Exact amounts for pricing: an `i64` count of cents, never a float.
//!
//! ## Rounding
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Sums, differences and quantity products are exact.                    │
//! │                                                                         │
//! │  Percentages are the only derived amounts and round HALF-UP:           │
//! │                                                                         │
//! │    $32.97 × 10%   = 329.7 cents  → $3.30                                │
//! │    $0.05  × 50%   =   2.5 cents  → $0.03                                │
//! │    -$0.05 × 50%   =  -2.5 cents  → -$0.03  (half away from zero)        │
//! │                                                                         │
//! │  Arithmetic is checked only: overflow is None, never a wrapped value.  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use emporium_core::money::{Money, Percentage};
//!
//! let price = Money::from_cents(1099); // $10.99
//! let line = price.checked_multiply_quantity(3).unwrap(); // $32.97
//! let off = line.percentage(Percentage::from_whole(10));
//! assert_eq!(off, Some(Money::from_cents(330))); // $3.297 → $3.30
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use ts_rs::TS;

/// Basis points in 100%.
const BPS_SCALE: i128 = 10_000;

// =============================================================================
// Percentage
// =============================================================================

/// A percentage represented in basis points (bps).
///
/// 1 basis point = 0.01%, so 1000 bps = 10% and 10000 bps = 100%.
/// Percentage discounts are stored this way so that "12.5% off" is exact.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Percentage(u32);

impl Percentage {
    /// 100%.
    pub const FULL: Percentage = Percentage(10_000);

    /// Creates a percentage from basis points.
    #[inline]
    pub const fn from_bps(bps: u32) -> Self {
        Percentage(bps)
    }

    /// Creates a percentage from a whole number of percent (10 → 10%).
    ///
    /// Saturates at `u32::MAX` bps; validation rejects anything above 100%.
    #[inline]
    pub const fn from_whole(percent: u32) -> Self {
        Percentage(percent.saturating_mul(100))
    }

    /// Returns the rate in basis points.
    #[inline]
    pub const fn bps(&self) -> u32 {
        self.0
    }

    /// Checks if the percentage is zero.
    #[inline]
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }
}

impl fmt::Display for Percentage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{:02}%", self.0 / 100, self.0 % 100)
    }
}

// =============================================================================
// Money Type
// =============================================================================

/// Represents a monetary value in the smallest currency unit (cents).
///
/// Signed, so a difference can be inspected with `is_negative` before it is
/// clamped with `floor_zero`.
///
/// ## Where Money is Used
/// ```text
/// Product.price_cents ──► OrderItem.unit_price ──► OrderItem.line_subtotal
///                                                          │
///                         Discount ◄── Order.subtotal ◄────┘
///                            │
///                            ▼
///                  Order.total = subtotal − discount (floor 0)
/// ```
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize, TS,
)]
#[ts(export)]
pub struct Money(i64);

impl Money {
    /// Creates a Money value from cents (the smallest currency unit).
    ///
    /// ## Example
    /// ```rust
    /// use emporium_core::money::Money;
    ///
    /// let price = Money::from_cents(1099); // Represents $10.99
    /// assert_eq!(price.cents(), 1099);
    /// ```
    #[inline]
    pub const fn from_cents(cents: i64) -> Self {
        Money(cents)
    }

    /// Returns the value in cents.
    #[inline]
    pub const fn cents(&self) -> i64 {
        self.0
    }

    /// Returns the major unit (dollars) portion.
    #[inline]
    pub const fn dollars(&self) -> i64 {
        self.0 / 100
    }

    /// Returns the minor unit (cents) portion, always 0-99.
    #[inline]
    pub const fn cents_part(&self) -> i64 {
        (self.0 % 100).abs()
    }

    /// Returns zero money value.
    #[inline]
    pub const fn zero() -> Self {
        Money(0)
    }

    /// Checks if the value is zero.
    #[inline]
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }

    /// Checks if the value is positive (greater than zero).
    #[inline]
    pub const fn is_positive(&self) -> bool {
        self.0 > 0
    }

    /// Checks if the value is negative (less than zero).
    #[inline]
    pub const fn is_negative(&self) -> bool {
        self.0 < 0
    }

    /// Returns the smaller of two amounts.
    #[inline]
    pub fn min(self, other: Money) -> Money {
        std::cmp::min(self, other)
    }

    /// Clamps negative amounts to zero.
    #[inline]
    pub const fn floor_zero(self) -> Money {
        if self.0 < 0 {
            Money(0)
        } else {
            self
        }
    }

    /// Addition that reports overflow instead of wrapping.
    #[inline]
    pub const fn checked_add(self, other: Money) -> Option<Money> {
        match self.0.checked_add(other.0) {
            Some(cents) => Some(Money(cents)),
            None => None,
        }
    }

    /// Subtraction that reports overflow instead of wrapping.
    #[inline]
    pub const fn checked_sub(self, other: Money) -> Option<Money> {
        match self.0.checked_sub(other.0) {
            Some(cents) => Some(Money(cents)),
            None => None,
        }
    }

    /// Multiplies money by a quantity, `None` on overflow.
    ///
    /// ## Example
    /// ```rust
    /// use emporium_core::money::Money;
    ///
    /// let unit_price = Money::from_cents(299); // $2.99
    /// let line_total = unit_price.checked_multiply_quantity(3);
    /// assert_eq!(line_total, Some(Money::from_cents(897))); // $8.97
    /// ```
    #[inline]
    pub const fn checked_multiply_quantity(&self, qty: i64) -> Option<Money> {
        match self.0.checked_mul(qty) {
            Some(cents) => Some(Money(cents)),
            None => None,
        }
    }

    /// Computes `round_half_up(amount * percent / 100)`, `None` if the
    /// result does not fit in i64.
    ///
    /// ## Rounding
    /// Half-up means a remainder of exactly half a cent rounds away from
    /// zero: $0.825 → $0.83, -$0.825 → -$0.83.
    ///
    /// ## Implementation
    /// i128 intermediate, so any i64 amount times any u32 rate is exact:
    /// `(cents * bps ± 5000) / 10000`
    ///
    /// ## Example
    /// ```rust
    /// use emporium_core::money::{Money, Percentage};
    ///
    /// let subtotal = Money::from_cents(10000); // $100.00
    /// let ten_percent = subtotal.percentage(Percentage::from_whole(10));
    /// assert_eq!(ten_percent, Some(Money::from_cents(1000))); // $10.00
    /// ```
    pub fn percentage(&self, rate: Percentage) -> Option<Money> {
        let scaled = self.0 as i128 * rate.bps() as i128;
        let half = BPS_SCALE / 2;
        let rounded = if scaled >= 0 {
            (scaled + half) / BPS_SCALE
        } else {
            (scaled - half) / BPS_SCALE
        };
        // Only rates above 100% can leave the i64 range
        i64::try_from(rounded).ok().map(Money)
    }
}

// =============================================================================
// Trait Implementations
// =============================================================================

/// Debug-style display, e.g. "$10.99". Localised formatting belongs to the UI.
impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        write!(
            f,
            "{}${}.{:02}",
            sign,
            self.dollars().abs(),
            self.cents_part()
        )
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
