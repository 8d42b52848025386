//! # Checkout Error Type
//!
//! Unified error type for the checkout engine.
//!
//! ## Error Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Error Flow in Emporium                               │
//! │                                                                         │
//! │  CheckoutService::create_order                                         │
//! │         │                                                               │
//! │         ▼                                                               │
//! │  Domain rule fails? ─── CoreError::InsufficientStock ──┐               │
//! │         │                                              │               │
//! │         ▼                                              ▼               │
//! │  Storage fails? ─────── DbError::Busy ──────────► CheckoutError        │
//! │                                                        │               │
//! │                                                        ▼               │
//! │                                              to_response()             │
//! │                                                        │               │
//! │                                                        ▼               │
//! │  {                                                                      │
//! │    "code": "INSUFFICIENT_STOCK",                                        │
//! │    "kind": "conflict",                                                  │
//! │    "message": "Insufficient stock for p-1: requested 2, available 1",  │
//! │    "details": { "productId": "p-1", "requested": 2, "available": 1 }   │
//! │  }                                                                      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use serde::Serialize;
use serde_json::json;
use tracing::error;

use emporium_core::{CoreError, ErrorKind, ValidationError};
use emporium_db::DbError;

/// Any failure surfaced by [`CheckoutService`](crate::CheckoutService).
#[derive(Debug, thiserror::Error)]
pub enum CheckoutError {
    #[error(transparent)]
    Core(#[from] CoreError),

    #[error(transparent)]
    Db(#[from] DbError),
}

impl From<ValidationError> for CheckoutError {
    fn from(err: ValidationError) -> Self {
        CheckoutError::Core(CoreError::Validation(err))
    }
}

impl CheckoutError {
    /// Failure category.
    pub fn kind(&self) -> ErrorKind {
        match self {
            CheckoutError::Core(e) => e.kind(),
            CheckoutError::Db(DbError::NotFound { .. }) => ErrorKind::NotFound,
            CheckoutError::Db(DbError::UniqueViolation { .. }) => ErrorKind::Conflict,
            CheckoutError::Db(e) if e.is_transient() => ErrorKind::Conflict,
            CheckoutError::Db(_) => ErrorKind::Internal,
        }
    }

    /// Machine-readable code (SCREAMING_SNAKE_CASE).
    pub fn code(&self) -> &'static str {
        match self {
            CheckoutError::Core(e) => e.code(),
            CheckoutError::Db(DbError::NotFound { .. }) => "NOT_FOUND",
            CheckoutError::Db(DbError::UniqueViolation { .. }) => "ALREADY_EXISTS",
            CheckoutError::Db(DbError::Busy(_)) | CheckoutError::Db(DbError::PoolExhausted) => {
                "DATABASE_BUSY"
            }
            CheckoutError::Db(_) => "DATABASE_ERROR",
        }
    }

    /// Renders the error for API consumers.
    ///
    /// Internal failures are logged here and replaced by a generic message so
    /// storage details never reach a client.
    pub fn to_response(&self) -> ErrorResponse {
        let kind = self.kind();

        let (message, details) = match self {
            CheckoutError::Core(e) => (e.to_string(), e.details()),
            CheckoutError::Db(DbError::NotFound { entity, id }) => (
                self.to_string(),
                json!({ "entity": entity, "id": id }),
            ),
            CheckoutError::Db(DbError::UniqueViolation { field, value }) => (
                format!("{} '{}' already exists", field, value),
                json!({ "field": field, "value": value }),
            ),
            CheckoutError::Db(e) if e.is_transient() => (
                "The store is busy, please retry".to_string(),
                json!({}),
            ),
            CheckoutError::Db(e) => {
                error!(error = %e, "Database operation failed");
                ("Internal error".to_string(), json!({}))
            }
        };

        ErrorResponse {
            code: self.code().to_string(),
            kind,
            message,
            details,
        }
    }
}

/// Serialized error body.
///
/// ```json
/// { "code": "DISCOUNT_EXPIRED", "kind": "business_rule",
///   "message": "Discount code SUMMER15 has expired", "details": { "code": "SUMMER15" } }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorResponse {
    pub code: String,
    pub kind: ErrorKind,
    pub message: String,
    pub details: serde_json::Value,
}

/// Result type for checkout operations.
pub type CheckoutResult<T> = Result<T, CheckoutError>;

#[cfg(test)]
mod tests {
    use super::*;
    use emporium_core::OrderStatus;

    #[test]
    fn test_core_error_response() {
        let err = CheckoutError::from(CoreError::InsufficientStock {
            product_id: "p-1".to_string(),
            requested: 2,
            available: 1,
        });

        let response = err.to_response();
        assert_eq!(response.code, "INSUFFICIENT_STOCK");
        assert_eq!(response.kind, ErrorKind::Conflict);
        assert_eq!(response.details["productId"], "p-1");
        assert_eq!(response.details["available"], 1);

        let body = serde_json::to_value(&response).unwrap();
        assert_eq!(body["kind"], "conflict");
    }

    #[test]
    fn test_transition_error_details() {
        let err = CheckoutError::from(CoreError::InvalidStatusTransition {
            from: OrderStatus::Delivered,
            to: OrderStatus::Cancelled,
        });
        let response = err.to_response();
        assert_eq!(response.code, "INVALID_STATUS_TRANSITION");
        assert_eq!(response.details["from"], "delivered");
        assert_eq!(response.details["to"], "cancelled");
    }

    #[test]
    fn test_validation_conversion() {
        let err = CheckoutError::from(ValidationError::Required {
            field: "user_id".to_string(),
        });
        assert_eq!(err.kind(), ErrorKind::Validation);
        assert_eq!(err.code(), "VALIDATION_ERROR");
    }

    #[test]
    fn test_internal_error_is_generic() {
        let err = CheckoutError::from(DbError::QueryFailed("no such table: orders".to_string()));
        let response = err.to_response();
        assert_eq!(response.kind, ErrorKind::Internal);
        assert_eq!(response.code, "DATABASE_ERROR");
        assert_eq!(response.message, "Internal error");
        assert!(!response.message.contains("orders"));
    }

    #[test]
    fn test_busy_is_retryable_conflict() {
        let err = CheckoutError::from(DbError::PoolExhausted);
        assert_eq!(err.kind(), ErrorKind::Conflict);
        assert_eq!(err.code(), "DATABASE_BUSY");
    }

    #[test]
    fn test_duplicate_discount_code() {
        let err = CheckoutError::from(DbError::duplicate("discount code", "WELCOME10"));
        let response = err.to_response();
        assert_eq!(response.kind, ErrorKind::Conflict);
        assert_eq!(response.message, "discount code 'WELCOME10' already exists");
    }
}
