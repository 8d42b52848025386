//! # Domain Types
//!
//! Core domain types used throughout Emporium.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │    Product      │   │      Order      │   │    Discount     │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  id (UUID)      │   │  id (UUID)      │   │  id (UUID)      │       │
//! │  │  sku (business) │   │  order_number   │   │  code (unique)  │       │
//! │  │  price_cents    │   │  status         │   │  discount_type  │       │
//! │  │  stock_quantity │   │  total_cents    │   │  usage_count    │       │
//! │  └────────▲────────┘   └────────┬────────┘   └─────────────────┘       │
//! │           │ weak (id only)      │ owns                                  │
//! │           │            ┌────────▼────────┐                              │
//! │           └────────────│   OrderItem     │  snapshot of name + price   │
//! │                        └─────────────────┘                              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Rows reference each other by UUID `id`. People use the SKU, the order
//! number or the discount code instead.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use ts_rs::TS;

use crate::money::{Money, Percentage};

// =============================================================================
// Product
// =============================================================================

/// A product in the catalog.
///
/// Read-only to the checkout engine except for `stock_quantity`, which only
/// stock reservation (decrement/release) and restocking touch.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Product {
    /// Unique identifier (UUID v4).
    pub id: String,

    /// Stock Keeping Unit - business identifier.
    pub sku: String,

    /// Display name, copied into order items at checkout.
    pub name: String,

    /// Optional description for product details.
    pub description: Option<String>,

    /// Price in cents (smallest currency unit).
    pub price_cents: i64,

    /// Units available for sale. Never negative.
    pub stock_quantity: i64,

    /// Whether product is for sale (soft delete).
    pub is_active: bool,

    /// When the product was created.
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,

    /// When the product was last updated.
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

impl Product {
    /// Returns the price as a Money type.
    #[inline]
    pub fn price(&self) -> Money {
        Money::from_cents(self.price_cents)
    }
}

// =============================================================================
// Cart Line
// =============================================================================

/// One requested product + quantity. Transient checkout input.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct CartLine {
    pub product_id: String,
    pub quantity: i64,
}

impl CartLine {
    pub fn new(product_id: impl Into<String>, quantity: i64) -> Self {
        CartLine {
            product_id: product_id.into(),
            quantity,
        }
    }
}

// =============================================================================
// Order Status
// =============================================================================

/// The lifecycle status of an order.
///
/// Allowed transitions live in [`crate::order_status`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    /// Created by checkout, stock reserved.
    Pending,
    /// Accepted by the shop.
    Confirmed,
    /// Being picked and packed.
    Processing,
    /// Handed to the carrier.
    Shipped,
    /// Received by the customer (terminal).
    Delivered,
    /// Abandoned before shipping (terminal); reserved stock is released.
    Cancelled,
}

impl OrderStatus {
    /// Every status, in lifecycle order.
    pub const ALL: [OrderStatus; 6] = [
        OrderStatus::Pending,
        OrderStatus::Confirmed,
        OrderStatus::Processing,
        OrderStatus::Shipped,
        OrderStatus::Delivered,
        OrderStatus::Cancelled,
    ];

    /// Database / wire representation.
    pub const fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "pending",
            OrderStatus::Confirmed => "confirmed",
            OrderStatus::Processing => "processing",
            OrderStatus::Shipped => "shipped",
            OrderStatus::Delivered => "delivered",
            OrderStatus::Cancelled => "cancelled",
        }
    }
}

impl Default for OrderStatus {
    fn default() -> Self {
        OrderStatus::Pending
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for OrderStatus {
    type Err = crate::error::ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_lowercase();
        OrderStatus::ALL
            .into_iter()
            .find(|status| status.as_str() == wanted)
            .ok_or_else(|| crate::error::ValidationError::InvalidFormat {
                field: "status".to_string(),
                reason: format!("unknown order status '{}'", s),
            })
    }
}

// =============================================================================
// Shipping Info
// =============================================================================

/// Delivery and contact details captured on the order.
///
/// Format checks (email syntax, required fields) happen in the API layer.
#[derive(Debug, Clone, Default, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ShippingInfo {
    pub shipping_address: String,
    pub customer_name: String,
    pub customer_email: String,
    pub customer_phone: Option<String>,
    pub notes: Option<String>,
}

// =============================================================================
// Order
// =============================================================================

/// A placed order.
///
/// Created once, atomically, by checkout. Items and amounts never change
/// afterwards; only `status` (through the state machine) and `admin_notes` do.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Order {
    pub id: String,
    /// Human-readable number, e.g. `ORD-20261019-3F9A1C2B`.
    pub order_number: String,
    pub user_id: String,
    pub status: OrderStatus,
    pub subtotal_cents: i64,
    /// Discount row that was applied, if any.
    pub discount_id: Option<String>,
    /// Normalized code as entered, kept for display after the discount changes.
    pub discount_code: Option<String>,
    pub discount_cents: i64,
    /// `subtotal_cents - discount_cents`, never negative.
    pub total_cents: i64,
    pub shipping_address: String,
    pub customer_name: String,
    pub customer_email: String,
    pub customer_phone: Option<String>,
    pub notes: Option<String>,
    pub admin_notes: Option<String>,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
    /// Line items, loaded separately from `order_items`.
    #[cfg_attr(feature = "sqlx", sqlx(skip))]
    pub items: Vec<OrderItem>,
}

impl Order {
    #[inline]
    pub fn subtotal(&self) -> Money {
        Money::from_cents(self.subtotal_cents)
    }

    #[inline]
    pub fn discount_amount(&self) -> Money {
        Money::from_cents(self.discount_cents)
    }

    #[inline]
    pub fn total(&self) -> Money {
        Money::from_cents(self.total_cents)
    }
}

// =============================================================================
// Order Item
// =============================================================================

/// A line item in an order.
/// Uses snapshot pattern to freeze product data at time of checkout.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct OrderItem {
    pub id: String,
    pub order_id: String,
    /// Weak reference: the product may change or be deactivated later.
    pub product_id: String,
    /// SKU at time of checkout (frozen).
    pub sku_snapshot: String,
    /// Product name at time of checkout (frozen).
    pub name_snapshot: String,
    /// Unit price in cents at time of checkout (frozen).
    pub unit_price_cents: i64,
    pub quantity: i64,
    /// unit_price × quantity.
    pub line_subtotal_cents: i64,
}

impl OrderItem {
    #[inline]
    pub fn unit_price(&self) -> Money {
        Money::from_cents(self.unit_price_cents)
    }

    #[inline]
    pub fn line_subtotal(&self) -> Money {
        Money::from_cents(self.line_subtotal_cents)
    }
}

// =============================================================================
// Discount
// =============================================================================

/// How a discount's `value` is interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum DiscountType {
    /// `value` is basis points of the order amount (1000 = 10%).
    Percentage,
    /// `value` is cents off the order amount.
    FixedAmount,
}

/// A discount code.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Discount {
    pub id: String,
    /// Upper-cased code; lookups are case-insensitive.
    pub code: String,
    pub description: Option<String>,
    pub discount_type: DiscountType,
    /// Basis points for `Percentage`, cents for `FixedAmount`.
    pub value: i64,
    /// Order amount required before the code applies. 0 = no minimum.
    pub min_order_cents: i64,
    /// Cap on a percentage discount.
    pub max_discount_cents: Option<i64>,
    /// Total number of orders allowed to use the code. `None` = unlimited.
    pub usage_limit: Option<i64>,
    /// Orders that have successfully applied the code.
    pub usage_count: i64,
    #[ts(as = "Option<String>")]
    pub starts_at: Option<DateTime<Utc>>,
    #[ts(as = "Option<String>")]
    pub ends_at: Option<DateTime<Utc>>,
    pub is_active: bool,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

impl Discount {
    #[inline]
    pub fn min_order_amount(&self) -> Money {
        Money::from_cents(self.min_order_cents)
    }

    #[inline]
    pub fn max_discount_amount(&self) -> Option<Money> {
        self.max_discount_cents.map(Money::from_cents)
    }

    /// The percentage for a `Percentage` discount.
    ///
    /// Values outside `u32` are treated as 0%; creation rejects them anyway.
    pub fn percentage(&self) -> Percentage {
        Percentage::from_bps(u32::try_from(self.value).unwrap_or(0))
    }

    /// The amount for a `FixedAmount` discount.
    #[inline]
    pub fn fixed_amount(&self) -> Money {
        Money::from_cents(self.value)
    }

    /// Checks whether another order may still use the code.
    pub fn has_uses_remaining(&self) -> bool {
        match self.usage_limit {
            Some(limit) => self.usage_count < limit,
            None => true,
        }
    }
}

/// Input for creating a discount code.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct NewDiscount {
    pub code: String,
    pub description: Option<String>,
    pub discount_type: DiscountType,
    pub value: i64,
    pub min_order_cents: i64,
    pub max_discount_cents: Option<i64>,
    pub usage_limit: Option<i64>,
    #[ts(as = "Option<String>")]
    pub starts_at: Option<DateTime<Utc>>,
    #[ts(as = "Option<String>")]
    pub ends_at: Option<DateTime<Utc>>,
}

impl NewDiscount {
    /// A percentage discount with no minimum, cap, limit or window.
    pub fn percentage(code: impl Into<String>, percent: Percentage) -> Self {
        NewDiscount {
            code: code.into(),
            description: None,
            discount_type: DiscountType::Percentage,
            value: percent.bps() as i64,
            min_order_cents: 0,
            max_discount_cents: None,
            usage_limit: None,
            starts_at: None,
            ends_at: None,
        }
    }

    /// A fixed-amount discount with no minimum, limit or window.
    pub fn fixed_amount(code: impl Into<String>, amount: Money) -> Self {
        NewDiscount {
            code: code.into(),
            description: None,
            discount_type: DiscountType::FixedAmount,
            value: amount.cents(),
            min_order_cents: 0,
            max_discount_cents: None,
            usage_limit: None,
            starts_at: None,
            ends_at: None,
        }
    }
}

// =============================================================================
// Order Event Outbox
// =============================================================================

/// What happened to an order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum OrderEventType {
    OrderCreated,
    OrderStatusChanged,
}

/// An entry in the order event outbox.
///
/// Written in the same transaction as the order change it describes and
/// drained by the notification service (email, webhooks).
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct OrderEvent {
    pub id: String,
    pub order_id: String,
    pub event_type: OrderEventType,
    /// JSON document describing the event.
    pub payload: String,
    /// Number of delivery attempts.
    pub attempts: i64,
    /// Last error message if delivery failed.
    pub last_error: Option<String>,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "Option<String>")]
    pub attempted_at: Option<DateTime<Utc>>,
    #[ts(as = "Option<String>")]
    pub delivered_at: Option<DateTime<Utc>>,
}

// =============================================================================
// Unit Tests
// =============================================================================
