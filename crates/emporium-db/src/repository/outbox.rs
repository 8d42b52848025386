//! # Order Event Outbox Repository
//!
//! Queue of order events for the notification service (emails, webhooks).
//!
//! ## The Outbox Pattern
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Outbox Pattern Implementation                        │
//! │                                                                         │
//! │  ORDER MUTATION (create_order / transition_order_status)               │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                   SINGLE TRANSACTION                            │   │
//! │  │                                                                 │   │
//! │  │  1. INSERT INTO orders / UPDATE orders SET status = ...        │   │
//! │  │                                                                 │   │
//! │  │  2. INSERT INTO order_events (order_id, event_type, payload)   │   │
//! │  │                                                                 │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  COMMIT ← Both succeed or both fail                                    │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │            NOTIFICATION WORKER (external)                       │   │
//! │  │                                                                 │   │
//! │  │  pending(limit) → deliver → mark_delivered(id)                 │   │
//! │  │                           └→ mark_failed(id, error)            │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │                                                                         │
//! │  No event without its order change; no order change without event.    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::Utc;
use sqlx::{SqliteConnection, SqlitePool};
use tracing::debug;
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use emporium_core::{OrderEvent, OrderEventType};

/// Repository for the order event outbox.
#[derive(Debug, Clone)]
pub struct OrderEventRepository {
    pool: SqlitePool,
}

impl OrderEventRepository {
    /// Creates a new OrderEventRepository.
    pub fn new(pool: SqlitePool) -> Self {
        OrderEventRepository { pool }
    }

    /// Queues an event on `conn`, normally inside the transaction that made
    /// the change it describes.
    ///
    /// ## Example
    /// ```rust,ignore
    /// let payload = serde_json::json!({ "orderNumber": order.order_number });
    /// OrderEventRepository::append(&mut tx, &order.id, OrderEventType::OrderCreated, &payload).await?;
    /// ```
    pub async fn append(
        conn: &mut SqliteConnection,
        order_id: &str,
        event_type: OrderEventType,
        payload: &serde_json::Value,
    ) -> DbResult<OrderEvent> {
        let event = OrderEvent {
            id: Uuid::new_v4().to_string(),
            order_id: order_id.to_string(),
            event_type,
            payload: serde_json::to_string(payload)?,
            attempts: 0,
            last_error: None,
            created_at: Utc::now(),
            attempted_at: None,
            delivered_at: None,
        };

        debug!(
            id = %event.id,
            order_id = %order_id,
            event_type = ?event_type,
            "Queuing order event"
        );

        sqlx::query(
            r#"
            INSERT INTO order_events (
                id, order_id, event_type, payload,
                attempts, last_error, created_at, attempted_at, delivered_at
            ) VALUES (
                ?1, ?2, ?3, ?4,
                ?5, ?6, ?7, ?8, ?9
            )
            "#,
        )
        .bind(&event.id)
        .bind(&event.order_id)
        .bind(event.event_type)
        .bind(&event.payload)
        .bind(event.attempts)
        .bind(&event.last_error)
        .bind(event.created_at)
        .bind(event.attempted_at)
        .bind(event.delivered_at)
        .execute(&mut *conn)
        .await?;

        Ok(event)
    }

    /// Undelivered events, oldest first.
    pub async fn pending(&self, limit: u32) -> DbResult<Vec<OrderEvent>> {
        let events = sqlx::query_as::<_, OrderEvent>(
            r#"
            SELECT
                id, order_id, event_type, payload,
                attempts, last_error, created_at, attempted_at, delivered_at
            FROM order_events
            WHERE delivered_at IS NULL
            ORDER BY rowid ASC
            LIMIT ?1
            "#,
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(events)
    }

    /// All events of one order, oldest first.
    pub async fn for_order(&self, order_id: &str) -> DbResult<Vec<OrderEvent>> {
        let events = sqlx::query_as::<_, OrderEvent>(
            r#"
            SELECT
                id, order_id, event_type, payload,
                attempts, last_error, created_at, attempted_at, delivered_at
            FROM order_events
            WHERE order_id = ?1
            ORDER BY rowid ASC
            "#,
        )
        .bind(order_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(events)
    }

    /// Marks an event as delivered.
    pub async fn mark_delivered(&self, id: &str) -> DbResult<()> {
        let now = Utc::now();

        let result = sqlx::query(
            r#"
            UPDATE order_events SET
                attempts = attempts + 1,
                delivered_at = ?2,
                attempted_at = ?2
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .bind(now)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Order event", id));
        }

        Ok(())
    }

    /// Records a failed delivery attempt. The event stays pending.
    pub async fn mark_failed(&self, id: &str, error: &str) -> DbResult<()> {
        let now = Utc::now();

        let result = sqlx::query(
            r#"
            UPDATE order_events SET
                attempts = attempts + 1,
                last_error = ?2,
                attempted_at = ?3
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .bind(error)
        .bind(now)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Order event", id));
        }

        Ok(())
    }

    /// Counts undelivered events.
    pub async fn count_pending(&self) -> DbResult<i64> {
        let count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM order_events WHERE delivered_at IS NULL")
                .fetch_one(&self.pool)
                .await?;

        Ok(count)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
