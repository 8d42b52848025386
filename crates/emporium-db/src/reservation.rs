//! # Stock Reservation
//!
//! Takes stock for every line of an order, or reports the first line that
//! can't be covered.
//!
//! ## How Concurrent Checkouts Stay Correct
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Checkout A (qty 1)                 Checkout B (qty 1)    stock = 1     │
//! │  ─────────────────                  ─────────────────                   │
//! │  BEGIN                              BEGIN                               │
//! │  UPDATE products                                                        │
//! │    SET stock = stock - 1                                                │
//! │    WHERE id = ? AND stock >= 1      UPDATE ... (waits on write lock,    │
//! │  → 1 row, stock = 0                   up to busy_timeout)               │
//! │  INSERT order ...                                                       │
//! │  COMMIT ──────────────────────────► → 0 rows (stock is 0)               │
//! │                                     SELECT stock → 0                    │
//! │                                     Shortfall { available: 0 }          │
//! │                                     ROLLBACK                            │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Decrements run on the caller's transaction. A shortfall leaves earlier
//! decrements in place; the caller's rollback discards them.

use chrono::Utc;
use sqlx::SqliteConnection;
use tracing::debug;

use crate::error::DbResult;
use emporium_core::OrderItem;

/// One reserved line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReservedLine {
    pub product_id: String,
    pub quantity: i64,
}

/// Proof that stock was taken for a set of lines.
///
/// Hand it to [`release`] to give the stock back.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct StockReservation {
    lines: Vec<ReservedLine>,
}

impl StockReservation {
    /// Rebuilds the reservation an order holds from its items.
    pub fn from_items(items: &[OrderItem]) -> Self {
        StockReservation {
            lines: items
                .iter()
                .map(|item| ReservedLine {
                    product_id: item.product_id.clone(),
                    quantity: item.quantity,
                })
                .collect(),
        }
    }

    pub fn lines(&self) -> &[ReservedLine] {
        &self.lines
    }

    pub fn total_quantity(&self) -> i64 {
        self.lines.iter().map(|l| l.quantity).sum()
    }
}

/// Result of [`reserve`].
#[derive(Debug, Clone, PartialEq, Eq)]
#[must_use]
pub enum ReserveOutcome {
    /// Every line was covered.
    Reserved(StockReservation),
    /// `product_id` had only `available` units for a request of `requested`.
    Shortfall {
        product_id: String,
        requested: i64,
        available: i64,
    },
}

/// Decrements stock for each `(product_id, quantity)` line on `conn`.
///
/// Stops at the first line that can't be covered. Must run inside a
/// transaction that the caller rolls back on [`ReserveOutcome::Shortfall`].
///
/// ## Example
/// ```rust,ignore
/// let mut tx = db.begin().await?;
/// match reservation::reserve(&mut tx, &cart.quantities()).await? {
///     ReserveOutcome::Reserved(token) => { /* insert order, commit */ }
///     ReserveOutcome::Shortfall { product_id, requested, available } => {
///         return Err(CoreError::InsufficientStock { product_id, requested, available }.into());
///     }
/// }
/// ```
pub async fn reserve(
    conn: &mut SqliteConnection,
    lines: &[(String, i64)],
) -> DbResult<ReserveOutcome> {
    let now = Utc::now();
    let mut reserved = Vec::with_capacity(lines.len());

    for (product_id, quantity) in lines {
        let result = sqlx::query(
            r#"
            UPDATE products
            SET
                stock_quantity = stock_quantity - ?2,
                updated_at = ?3
            WHERE id = ?1 AND stock_quantity >= ?2
            "#,
        )
        .bind(product_id)
        .bind(*quantity)
        .bind(now)
        .execute(&mut *conn)
        .await?;

        if result.rows_affected() == 0 {
            let available: Option<i64> =
                sqlx::query_scalar("SELECT stock_quantity FROM products WHERE id = ?1")
                    .bind(product_id)
                    .fetch_optional(&mut *conn)
                    .await?;
            let available = available.unwrap_or(0);

            debug!(
                product_id = %product_id,
                requested = %quantity,
                available = %available,
                "Stock shortfall"
            );

            return Ok(ReserveOutcome::Shortfall {
                product_id: product_id.clone(),
                requested: *quantity,
                available,
            });
        }

        reserved.push(ReservedLine {
            product_id: product_id.clone(),
            quantity: *quantity,
        });
    }

    debug!(lines = reserved.len(), "Stock reserved");
    Ok(ReserveOutcome::Reserved(StockReservation { lines: reserved }))
}

/// Puts a reservation's quantities back on the shelf.
///
/// Products that no longer exist are skipped.
pub async fn release(conn: &mut SqliteConnection, reservation: &StockReservation) -> DbResult<()> {
    let now = Utc::now();

    for line in &reservation.lines {
        sqlx::query(
            r#"
            UPDATE products
            SET
                stock_quantity = stock_quantity + ?2,
                updated_at = ?3
            WHERE id = ?1
            "#,
        )
        .bind(&line.product_id)
        .bind(line.quantity)
        .bind(now)
        .execute(&mut *conn)
        .await?;
    }

    debug!(lines = reservation.lines.len(), "Stock released");
    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================
