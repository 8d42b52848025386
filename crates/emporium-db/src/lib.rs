//! # emporium-db: Database Layer for Emporium
//!
//! SQLite storage for the checkout engine, accessed through sqlx.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Emporium Data Flow                               │
//! │                                                                         │
//! │  CheckoutService (emporium-checkout)                                   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                   emporium-db (THIS CRATE)                      │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────────┐    ┌────────────────┐   ┌──────────────┐  │   │
//! │  │   │   Database    │    │  Repositories  │   │  Migrations  │  │   │
//! │  │   │   (pool.rs)   │    │                │   │  (embedded)  │  │   │
//! │  │   │               │    │ ProductRepo    │   │              │  │   │
//! │  │   │ SqlitePool    │◄───│ DiscountRepo   │   │ 001_initial  │  │   │
//! │  │   │ Transactions  │    │ OrderRepo      │   │   _schema    │  │   │
//! │  │   │               │    │ OrderEventRepo │   │              │  │   │
//! │  │   └───────────────┘    └────────────────┘   └──────────────┘  │   │
//! │  │            ▲                                                    │   │
//! │  │            └──── reservation (stock decrement / release)       │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  SQLite database file (WAL mode)                                       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`pool`] - Connection pool creation and configuration
//! - [`migrations`] - Embedded database migrations
//! - [`error`] - Database error types
//! - [`repository`] - Repository implementations
//! - [`reservation`] - Stock reservation inside a checkout transaction
//!
//! ## Usage
//!
//! ```rust,ignore
//! use emporium_db::{Database, DbConfig};
//!
//! let db = Database::new(DbConfig::new("./emporium.db")).await?;
//!
//! let discount = db.discounts().get_by_code("WELCOME10").await?;
//! let orders = db.orders().list_for_user(&user_id, 20).await?;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod migrations;
pub mod pool;
pub mod repository;
pub mod reservation;

// =============================================================================
// Re-exports
// =============================================================================

pub use error::{DbError, DbResult};
pub use pool::{Database, DbConfig};
pub use reservation::{ReserveOutcome, StockReservation};

// Repository re-exports for convenience
pub use repository::discount::DiscountRepository;
pub use repository::order::OrderRepository;
pub use repository::outbox::OrderEventRepository;
pub use repository::product::ProductRepository;
