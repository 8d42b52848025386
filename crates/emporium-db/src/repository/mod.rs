//! # Repository Module
//!
//! Database repository implementations for Emporium.
//!
//! ## Repository Pattern
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Repository Pattern                                   │
//! │                                                                         │
//! │  CheckoutService                                                       │
//! │       │                                                                 │
//! │       │  db.products().get_many(&ids)                                  │
//! │       ▼                                                                 │
//! │  XRepository { pool }          pool-level reads and simple writes      │
//! │  XRepository::fn(&mut conn)    writes that must join a transaction    │
//! │       │                                                                 │
//! │       │  SQL Query                                                      │
//! │       ▼                                                                 │
//! │  SQLite Database                                                       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Available Repositories
//!
//! - [`ProductRepository`](product::ProductRepository) - Catalog reads, restock, listing
//! - [`DiscountRepository`](discount::DiscountRepository) - Codes and the usage counter
//! - [`OrderRepository`](order::OrderRepository) - Orders, items, status CAS
//! - [`OrderEventRepository`](outbox::OrderEventRepository) - Order event outbox

pub mod discount;
pub mod order;
pub mod outbox;
pub mod product;
