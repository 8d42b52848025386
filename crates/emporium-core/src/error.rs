//! # Error Types
//!
//! Domain-specific error types for emporium-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  emporium-core errors (this file)                                      │
//! │  ├── CoreError        - Pricing, discount and order rule failures      │
//! │  └── ValidationError  - Input validation failures                      │
//! │                                                                         │
//! │  emporium-db errors (separate crate)                                   │
//! │  └── DbError          - Database operation failures                    │
//! │                                                                         │
//! │  emporium-checkout errors                                              │
//! │  └── CheckoutError    - What the API layer renders                     │
//! │                                                                         │
//! │  Flow: ValidationError → CoreError → CheckoutError → API response      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Every `CoreError` belongs to one [`ErrorKind`], which decides how the
//! API layer answers (400 / 404 / 409 / 422 / 500).

use serde::Serialize;
use serde_json::json;
use thiserror::Error;
use ts_rs::TS;

use crate::types::OrderStatus;

// =============================================================================
// Error Kind
// =============================================================================

/// Broad failure category shared by every error in the workspace.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// Malformed input; the caller's fault, nothing was changed.
    Validation,
    /// Product, discount or order does not exist.
    NotFound,
    /// Stale data: stock, discount usage or order status moved on. Retry with fresh data.
    Conflict,
    /// Input is well-formed but a business rule refuses it.
    BusinessRule,
    /// Storage or unexpected failure.
    Internal,
}

// =============================================================================
// Core Error
// =============================================================================

/// Core business logic errors.
///
/// Variants carry the identifiers and numbers the API layer needs to render
/// an actionable message (see [`CoreError::details`]).
#[derive(Debug, Error)]
pub enum CoreError {
    /// The cart has no lines.
    #[error("Cart is empty")]
    EmptyCart,

    /// Product id is unknown to the catalog.
    #[error("Product not found: {0}")]
    ProductNotFound(String),

    /// Product exists but is not for sale.
    #[error("Product is not available: {0}")]
    ProductInactive(String),

    /// Not enough stock to reserve the requested quantity.
    ///
    /// ## User Workflow
    /// ```text
    /// Checkout (qty: 5)
    ///      │
    ///      ▼
    /// Reserve stock: available=3
    ///      │
    ///      ▼
    /// InsufficientStock { product_id, requested: 5, available: 3 }
    ///      │
    ///      ▼
    /// UI shows: "Only 3 left in stock"
    /// ```
    #[error("Insufficient stock for {product_id}: requested {requested}, available {available}")]
    InsufficientStock {
        product_id: String,
        requested: i64,
        available: i64,
    },

    /// Cart has exceeded maximum allowed distinct products.
    #[error("Cart cannot have more than {max} items")]
    CartTooLarge { max: usize },

    /// Item quantity exceeds maximum allowed.
    #[error("Quantity {requested} exceeds maximum allowed ({max})")]
    QuantityTooLarge { requested: i64, max: i64 },

    /// An amount left the representable range.
    #[error("Amount overflow while computing {context}")]
    AmountOverflow { context: String },

    /// Unknown or inactive discount code.
    #[error("Discount code not found: {0}")]
    DiscountNotFound(String),

    /// Discount window has closed.
    #[error("Discount code {0} has expired")]
    DiscountExpired(String),

    /// Discount window has not opened yet.
    #[error("Discount code {0} is not active yet")]
    DiscountNotYetActive(String),

    /// Discount has been used `usage_limit` times.
    #[error("Discount code {code} has reached its usage limit of {limit}")]
    DiscountUsageExceeded { code: String, limit: i64 },

    /// Order amount is below the discount's minimum.
    #[error("Discount code {code} requires a minimum order of {minimum_cents} cents, order is {amount_cents} cents")]
    DiscountMinimumNotMet {
        code: String,
        minimum_cents: i64,
        amount_cents: i64,
    },

    /// Order cannot be found.
    #[error("Order not found: {0}")]
    OrderNotFound(String),

    /// Requested status change is not an edge of the order state machine.
    #[error("Cannot change order status from {from} to {to}")]
    InvalidStatusTransition { from: OrderStatus, to: OrderStatus },

    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

impl CoreError {
    /// Returns the failure category.
    pub fn kind(&self) -> ErrorKind {
        match self {
            CoreError::EmptyCart
            | CoreError::CartTooLarge { .. }
            | CoreError::QuantityTooLarge { .. }
            | CoreError::AmountOverflow { .. }
            | CoreError::Validation(_) => ErrorKind::Validation,

            CoreError::ProductNotFound(_)
            | CoreError::DiscountNotFound(_)
            | CoreError::OrderNotFound(_) => ErrorKind::NotFound,

            CoreError::InsufficientStock { .. }
            | CoreError::DiscountUsageExceeded { .. }
            | CoreError::InvalidStatusTransition { .. } => ErrorKind::Conflict,

            CoreError::ProductInactive(_)
            | CoreError::DiscountExpired(_)
            | CoreError::DiscountNotYetActive(_)
            | CoreError::DiscountMinimumNotMet { .. } => ErrorKind::BusinessRule,
        }
    }

    /// Machine-readable code for API consumers.
    pub fn code(&self) -> &'static str {
        match self {
            CoreError::EmptyCart => "EMPTY_CART",
            CoreError::ProductNotFound(_) => "PRODUCT_NOT_FOUND",
            CoreError::ProductInactive(_) => "PRODUCT_INACTIVE",
            CoreError::InsufficientStock { .. } => "INSUFFICIENT_STOCK",
            CoreError::CartTooLarge { .. } => "CART_TOO_LARGE",
            CoreError::QuantityTooLarge { .. } => "QUANTITY_TOO_LARGE",
            CoreError::AmountOverflow { .. } => "AMOUNT_OVERFLOW",
            CoreError::DiscountNotFound(_) => "DISCOUNT_NOT_FOUND",
            CoreError::DiscountExpired(_) => "DISCOUNT_EXPIRED",
            CoreError::DiscountNotYetActive(_) => "DISCOUNT_NOT_YET_ACTIVE",
            CoreError::DiscountUsageExceeded { .. } => "DISCOUNT_USAGE_EXCEEDED",
            CoreError::DiscountMinimumNotMet { .. } => "DISCOUNT_MINIMUM_NOT_MET",
            CoreError::OrderNotFound(_) => "ORDER_NOT_FOUND",
            CoreError::InvalidStatusTransition { .. } => "INVALID_STATUS_TRANSITION",
            CoreError::Validation(_) => "VALIDATION_ERROR",
        }
    }

    /// Structured fields for the API layer (camelCase keys).
    pub fn details(&self) -> serde_json::Value {
        match self {
            CoreError::EmptyCart => json!({}),
            CoreError::ProductNotFound(id) | CoreError::ProductInactive(id) => {
                json!({ "productId": id })
            }
            CoreError::InsufficientStock {
                product_id,
                requested,
                available,
            } => json!({
                "productId": product_id,
                "requested": requested,
                "available": available,
            }),
            CoreError::CartTooLarge { max } => json!({ "max": max }),
            CoreError::QuantityTooLarge { requested, max } => {
                json!({ "requested": requested, "max": max })
            }
            CoreError::AmountOverflow { context } => json!({ "context": context }),
            CoreError::DiscountNotFound(code)
            | CoreError::DiscountExpired(code)
            | CoreError::DiscountNotYetActive(code) => json!({ "code": code }),
            CoreError::DiscountUsageExceeded { code, limit } => {
                json!({ "code": code, "usageLimit": limit })
            }
            CoreError::DiscountMinimumNotMet {
                code,
                minimum_cents,
                amount_cents,
            } => json!({
                "code": code,
                "minOrderCents": minimum_cents,
                "amountCents": amount_cents,
            }),
            CoreError::OrderNotFound(id) => json!({ "orderId": id }),
            CoreError::InvalidStatusTransition { from, to } => {
                json!({ "from": from, "to": to })
            }
            CoreError::Validation(e) => e.details(),
        }
    }

    /// Shorthand for an overflow in the named computation.
    pub fn overflow(context: impl Into<String>) -> Self {
        CoreError::AmountOverflow {
            context: context.into(),
        }
    }
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
///
/// These errors occur when input doesn't meet requirements.
/// Used for early validation before business logic runs.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Field value is too long.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    /// Numeric value is out of range.
    #[error("{field} must be between {min} and {max}")]
    OutOfRange { field: String, min: i64, max: i64 },

    /// Value must be positive.
    #[error("{field} must be positive")]
    MustBePositive { field: String },

    /// Invalid format (e.g., invalid UUID, bad discount code characters).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },
}

impl ValidationError {
    /// Name of the offending field.
    pub fn field(&self) -> &str {
        match self {
            ValidationError::Required { field }
            | ValidationError::TooLong { field, .. }
            | ValidationError::OutOfRange { field, .. }
            | ValidationError::MustBePositive { field }
            | ValidationError::InvalidFormat { field, .. } => field,
        }
    }

    fn details(&self) -> serde_json::Value {
        json!({ "field": self.field() })
    }
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = CoreError::InsufficientStock {
            product_id: "p-1".to_string(),
            requested: 5,
            available: 3,
        };
        assert_eq!(
            err.to_string(),
            "Insufficient stock for p-1: requested 5, available 3"
        );

        let err = CoreError::InvalidStatusTransition {
            from: OrderStatus::Delivered,
            to: OrderStatus::Cancelled,
        };
        assert_eq!(
            err.to_string(),
            "Cannot change order status from delivered to cancelled"
        );
    }

    #[test]
    fn test_validation_error_messages() {
        let err = ValidationError::Required {
            field: "code".to_string(),
        };
        assert_eq!(err.to_string(), "code is required");
        assert_eq!(err.field(), "code");
    }

    #[test]
    fn test_validation_converts_to_core_error() {
        let validation_err = ValidationError::MustBePositive {
            field: "quantity".to_string(),
        };
        let core_err: CoreError = validation_err.into();
        assert!(matches!(core_err, CoreError::Validation(_)));
        assert_eq!(core_err.kind(), ErrorKind::Validation);
    }

    #[test]
    fn test_kinds() {
        assert_eq!(CoreError::EmptyCart.kind(), ErrorKind::Validation);
        assert_eq!(CoreError::DiscountNotFound("X".into()).kind(), ErrorKind::NotFound);
        assert_eq!(
            CoreError::DiscountUsageExceeded {
                code: "X".into(),
                limit: 1
            }
            .kind(),
            ErrorKind::Conflict
        );
        assert_eq!(CoreError::DiscountExpired("X".into()).kind(), ErrorKind::BusinessRule);
        assert_eq!(CoreError::ProductInactive("p".into()).kind(), ErrorKind::BusinessRule);
    }

    #[test]
    fn test_insufficient_stock_details() {
        let err = CoreError::InsufficientStock {
            product_id: "p-9".to_string(),
            requested: 2,
            available: 0,
        };
        let details = err.details();
        assert_eq!(details["productId"], "p-9");
        assert_eq!(details["requested"], 2);
        assert_eq!(details["available"], 0);
        assert_eq!(err.code(), "INSUFFICIENT_STOCK");
    }

    #[test]
    fn test_transition_details_use_snake_case_statuses() {
        let err = CoreError::InvalidStatusTransition {
            from: OrderStatus::Shipped,
            to: OrderStatus::Pending,
        };
        assert_eq!(err.details()["from"], "shipped");
        assert_eq!(err.details()["to"], "pending");
    }
}
