//! # Order Repository
//!
//! Database operations for orders and order items.
//!
//! ## Order Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       Order Lifecycle                                   │
//! │                                                                         │
//! │  1. CREATE (inside the checkout transaction)                           │
//! │     └── insert(conn, order) → orders row + order_items rows            │
//! │                                                                         │
//! │  2. STATUS CHANGES (one transaction each)                              │
//! │     └── compare_and_set_status(conn, id, from, to)                     │
//! │         UPDATE ... WHERE id = ? AND status = <from>                    │
//! │         0 rows → someone else moved the order first                    │
//! │                                                                         │
//! │  3. ADMIN NOTES (any time)                                             │
//! │     └── update_admin_notes(id, notes)                                  │
//! │                                                                         │
//! │  Items and amounts are never updated.                                  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{DateTime, Utc};
use sqlx::{SqliteConnection, SqlitePool};
use tracing::debug;
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use emporium_core::{Order, OrderItem, OrderStatus};

/// Repository for order database operations.
#[derive(Debug, Clone)]
pub struct OrderRepository {
    pool: SqlitePool,
}

impl OrderRepository {
    /// Creates a new OrderRepository.
    pub fn new(pool: SqlitePool) -> Self {
        OrderRepository { pool }
    }

    /// Inserts an order and all of its items on `conn`.
    ///
    /// Meant to run inside the checkout transaction; nothing is visible to
    /// other connections until that transaction commits.
    pub async fn insert(conn: &mut SqliteConnection, order: &Order) -> DbResult<()> {
        debug!(
            id = %order.id,
            order_number = %order.order_number,
            items = order.items.len(),
            "Inserting order"
        );

        sqlx::query(
            r#"
            INSERT INTO orders (
                id, order_number, user_id, status,
                subtotal_cents, discount_id, discount_code, discount_cents, total_cents,
                shipping_address, customer_name, customer_email, customer_phone,
                notes, admin_notes,
                created_at, updated_at
            ) VALUES (
                ?1, ?2, ?3, ?4,
                ?5, ?6, ?7, ?8, ?9,
                ?10, ?11, ?12, ?13,
                ?14, ?15,
                ?16, ?17
            )
            "#,
        )
        .bind(&order.id)
        .bind(&order.order_number)
        .bind(&order.user_id)
        .bind(order.status)
        .bind(order.subtotal_cents)
        .bind(&order.discount_id)
        .bind(&order.discount_code)
        .bind(order.discount_cents)
        .bind(order.total_cents)
        .bind(&order.shipping_address)
        .bind(&order.customer_name)
        .bind(&order.customer_email)
        .bind(&order.customer_phone)
        .bind(&order.notes)
        .bind(&order.admin_notes)
        .bind(order.created_at)
        .bind(order.updated_at)
        .execute(&mut *conn)
        .await?;

        for (position, item) in order.items.iter().enumerate() {
            sqlx::query(
                r#"
                INSERT INTO order_items (
                    id, order_id, product_id,
                    sku_snapshot, name_snapshot, unit_price_cents,
                    quantity, line_subtotal_cents, position
                ) VALUES (
                    ?1, ?2, ?3,
                    ?4, ?5, ?6,
                    ?7, ?8, ?9
                )
                "#,
            )
            .bind(&item.id)
            .bind(&item.order_id)
            .bind(&item.product_id)
            .bind(&item.sku_snapshot)
            .bind(&item.name_snapshot)
            .bind(item.unit_price_cents)
            .bind(item.quantity)
            .bind(item.line_subtotal_cents)
            .bind(position as i64)
            .execute(&mut *conn)
            .await?;
        }

        Ok(())
    }

    /// Gets an order with its items.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Order>> {
        let order = sqlx::query_as::<_, Order>(
            r#"
            SELECT
                id, order_number, user_id, status,
                subtotal_cents, discount_id, discount_code, discount_cents, total_cents,
                shipping_address, customer_name, customer_email, customer_phone,
                notes, admin_notes,
                created_at, updated_at
            FROM orders
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        match order {
            Some(mut order) => {
                order.items = self.get_items(&order.id).await?;
                Ok(Some(order))
            }
            None => Ok(None),
        }
    }

    /// Gets the items of an order in cart order.
    pub async fn get_items(&self, order_id: &str) -> DbResult<Vec<OrderItem>> {
        let items = sqlx::query_as::<_, OrderItem>(
            r#"
            SELECT
                id, order_id, product_id,
                sku_snapshot, name_snapshot, unit_price_cents,
                quantity, line_subtotal_cents
            FROM order_items
            WHERE order_id = ?1
            ORDER BY position
            "#,
        )
        .bind(order_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(items)
    }

    /// A user's orders, newest first, with items.
    pub async fn list_for_user(&self, user_id: &str, limit: u32) -> DbResult<Vec<Order>> {
        debug!(user_id = %user_id, limit = %limit, "Listing orders for user");

        let orders = sqlx::query_as::<_, Order>(
            r#"
            SELECT
                id, order_number, user_id, status,
                subtotal_cents, discount_id, discount_code, discount_cents, total_cents,
                shipping_address, customer_name, customer_email, customer_phone,
                notes, admin_notes,
                created_at, updated_at
            FROM orders
            WHERE user_id = ?1
            ORDER BY created_at DESC, rowid DESC
            LIMIT ?2
            "#,
        )
        .bind(user_id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        self.with_items(orders).await
    }

    /// Orders currently in `status`, oldest first (work queue order), with items.
    pub async fn list_by_status(&self, status: OrderStatus, limit: u32) -> DbResult<Vec<Order>> {
        debug!(status = %status, limit = %limit, "Listing orders by status");

        let orders = sqlx::query_as::<_, Order>(
            r#"
            SELECT
                id, order_number, user_id, status,
                subtotal_cents, discount_id, discount_code, discount_cents, total_cents,
                shipping_address, customer_name, customer_email, customer_phone,
                notes, admin_notes,
                created_at, updated_at
            FROM orders
            WHERE status = ?1
            ORDER BY created_at ASC, rowid ASC
            LIMIT ?2
            "#,
        )
        .bind(status)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        self.with_items(orders).await
    }

    async fn with_items(&self, mut orders: Vec<Order>) -> DbResult<Vec<Order>> {
        for order in &mut orders {
            order.items = self.get_items(&order.id).await?;
        }
        Ok(orders)
    }

    /// Reads an order's current status on `conn`.
    pub async fn get_status(conn: &mut SqliteConnection, id: &str) -> DbResult<Option<OrderStatus>> {
        let status: Option<OrderStatus> =
            sqlx::query_scalar("SELECT status FROM orders WHERE id = ?1")
                .bind(id)
                .fetch_optional(&mut *conn)
                .await?;

        Ok(status)
    }

    /// Moves an order from `from` to `to` if it is still in `from`.
    ///
    /// ## Returns
    /// * `Ok(true)` - status changed
    /// * `Ok(false)` - order missing or no longer in `from`
    pub async fn compare_and_set_status(
        conn: &mut SqliteConnection,
        id: &str,
        from: OrderStatus,
        to: OrderStatus,
        now: DateTime<Utc>,
    ) -> DbResult<bool> {
        let result = sqlx::query(
            r#"
            UPDATE orders
            SET
                status = ?3,
                updated_at = ?4
            WHERE id = ?1 AND status = ?2
            "#,
        )
        .bind(id)
        .bind(from)
        .bind(to)
        .bind(now)
        .execute(&mut *conn)
        .await?;

        let changed = result.rows_affected() == 1;
        debug!(id = %id, from = %from, to = %to, changed = %changed, "Order status CAS");

        Ok(changed)
    }

    /// Replaces an order's admin notes. `None` clears them.
    pub async fn update_admin_notes(&self, id: &str, notes: Option<&str>) -> DbResult<()> {
        debug!(id = %id, "Updating admin notes");

        let result = sqlx::query(
            r#"
            UPDATE orders
            SET
                admin_notes = ?2,
                updated_at = ?3
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .bind(notes)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Order", id));
        }

        Ok(())
    }

    /// Counts all orders (for diagnostics).
    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM orders")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }
}

/// Generates an order number in format: ORD-YYYYMMDD-XXXXXXXX
///
/// ## Format
/// - YYYYMMDD: UTC date
/// - XXXXXXXX: first 8 hex digits of a fresh UUID v4, upper case
///
/// ## Example
/// `ORD-20261019-3F9A1C2B`
pub fn generate_order_number(now: DateTime<Utc>) -> String {
    let suffix: String = Uuid::new_v4()
        .simple()
        .to_string()
        .chars()
        .take(8)
        .collect::<String>()
        .to_ascii_uppercase();

    format!("ORD-{}-{}", now.format("%Y%m%d"), suffix)
}

/// Generates a new order ID.
pub fn generate_order_id() -> String {
    Uuid::new_v4().to_string()
}

// =============================================================================
// Unit Tests
// =============================================================================
