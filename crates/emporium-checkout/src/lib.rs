//! # emporium-checkout
//!
//! The checkout engine: prices carts, applies discount codes, reserves stock
//! and commits orders atomically, then governs order status changes.
//!
//! ## Architecture
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Checkout Engine                                  │
//! │                                                                         │
//! │  HTTP layer ───► CheckoutService ───► emporium-db ───► SQLite (WAL)    │
//! │                        │                                                │
//! │                        ▼                                                │
//! │                  emporium-core                                          │
//! │            (cart, discount, order_status)                               │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust,ignore
//! use emporium_checkout::{telemetry, CheckoutConfig, CheckoutService};
//!
//! telemetry::init();
//! let config = CheckoutConfig::load()?;
//! let service = CheckoutService::connect(&config).await?;
//!
//! let order = service
//!     .create_order(&user_id, &lines, Some("WELCOME10"), shipping)
//!     .await
//!     .map_err(|e| e.to_response())?;
//! ```

pub mod config;
pub mod error;
pub mod service;
pub mod telemetry;

pub use config::{CheckoutConfig, ConfigError};
pub use error::{CheckoutError, CheckoutResult, ErrorResponse};
pub use service::CheckoutService;

// Domain types callers need to build requests and read results
pub use emporium_core::{
    AppliedDiscount, CartLine, Discount, ErrorKind, Money, NewDiscount, Order, OrderItem,
    OrderStatus, Percentage, ShippingInfo,
};
