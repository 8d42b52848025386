//! # emporium-core: Pure Checkout Logic for Emporium
//!
//! This crate holds the pricing and order rules of the Emporium shop as pure
//! functions with zero I/O dependencies.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Emporium Architecture                            │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                    REST API (thin layer)                        │   │
//! │  │    auth, request DTOs, role checks                              │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                    emporium-checkout                            │   │
//! │  │    create_order, evaluate_discount, transition_order_status     │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │             ★ emporium-core (THIS CRATE) ★                      │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────┐  ┌───────────┐  ┌───────────┐  ┌────────────┐  │   │
//! │  │   │   money   │  │   cart    │  │ discount  │  │order_status│  │   │
//! │  │   │   Money   │  │PricedCart │  │ evaluate  │  │ transition │  │   │
//! │  │   │Percentage │  │  build    │  │           │  │            │  │   │
//! │  │   └───────────┘  └───────────┘  └───────────┘  └────────────┘  │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO NETWORK • PURE FUNCTIONS           │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                  emporium-db (Database Layer)                   │   │
//! │  │        SQLite queries, migrations, repositories, reservation    │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Domain types (Product, Order, Discount, etc.)
//! - [`money`] - Money type with integer arithmetic (no floating point!)
//! - [`cart`] - Cart Aggregator
//! - [`discount`] - Discount Evaluator
//! - [`order_status`] - Order State Machine
//! - [`error`] - Domain error types
//! - [`validation`] - Input validation
//!
//! ## Example Usage
//!
//! ```rust
//! use emporium_core::money::{Money, Percentage};
//!
//! let subtotal = Money::from_cents(10_000); // $100.00
//!
//! // 12.5% off, rounded half-up
//! let off = subtotal.percentage(Percentage::from_bps(1250)).unwrap();
//! assert_eq!(off.cents(), 1250);
//! assert_eq!(subtotal.checked_sub(off).unwrap().to_string(), "$87.50");
//! ```
//!
//! ## Features
//! - `sqlx`: derives `sqlx::FromRow` / `sqlx::Type` on the domain types so
//!   `emporium-db` can read them straight from rows.

// =============================================================================
// Module Declarations
// =============================================================================

pub mod cart;
pub mod discount;
pub mod error;
pub mod money;
pub mod order_status;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use cart::{PricedCart, PricedLine, ProductLookup};
pub use discount::AppliedDiscount;
pub use error::{CoreError, CoreResult, ErrorKind, ValidationError};
pub use money::{Money, Percentage};
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Maximum distinct products in a single cart.
pub const MAX_CART_ITEMS: usize = 100;

/// Maximum quantity of a single product in a cart.
///
/// Catches typos like 1000 instead of 10.
pub const MAX_ITEM_QUANTITY: i64 = 999;
