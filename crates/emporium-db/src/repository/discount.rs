//! # Discount Repository
//!
//! Discount code storage and the guarded usage counter.
//!
//! ## Usage Counting
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Preview (evaluate_discount)        Checkout (create_order)             │
//! │  ─────────────────────────          ───────────────────────             │
//! │  get_by_code ──► evaluate           get_by_code ──► evaluate            │
//! │  (no write)                         BEGIN                               │
//! │                                       reserve stock                     │
//! │                                       increment_usage ◄── guarded:      │
//! │                                       insert order        still active  │
//! │                                     COMMIT                AND under the │
//! │                                                           usage limit   │
//! │                                                                         │
//! │  Two checkouts racing for the last use: the second UPDATE matches no    │
//! │  row, increment_usage returns false and that checkout rolls back.       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::Utc;
use sqlx::{SqliteConnection, SqlitePool};
use tracing::debug;
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use emporium_core::{Discount, NewDiscount};

/// Repository for discount code operations.
#[derive(Debug, Clone)]
pub struct DiscountRepository {
    pool: SqlitePool,
}

impl DiscountRepository {
    /// Creates a new DiscountRepository.
    pub fn new(pool: SqlitePool) -> Self {
        DiscountRepository { pool }
    }

    /// Looks a code up case-insensitively.
    ///
    /// Returns inactive discounts too; the evaluator decides what they mean.
    pub async fn get_by_code(&self, code: &str) -> DbResult<Option<Discount>> {
        debug!(code = %code, "Looking up discount");

        let discount = sqlx::query_as::<_, Discount>(
            r#"
            SELECT
                id, code, description, discount_type, value,
                min_order_cents, max_discount_cents,
                usage_limit, usage_count,
                starts_at, ends_at, is_active,
                created_at, updated_at
            FROM discounts
            WHERE code = ?1 COLLATE NOCASE
            "#,
        )
        .bind(code.trim())
        .fetch_optional(&self.pool)
        .await?;

        Ok(discount)
    }

    /// Gets a discount by its ID.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Discount>> {
        let discount = sqlx::query_as::<_, Discount>(
            r#"
            SELECT
                id, code, description, discount_type, value,
                min_order_cents, max_discount_cents,
                usage_limit, usage_count,
                starts_at, ends_at, is_active,
                created_at, updated_at
            FROM discounts
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(discount)
    }

    /// Stores a new discount with `usage_count = 0`.
    ///
    /// The input is expected to have passed
    /// `emporium_core::validation::validate_new_discount`; the table CHECKs
    /// reject anything that slipped through.
    ///
    /// ## Returns
    /// * `Err(DbError::UniqueViolation)` - code already exists (any casing)
    pub async fn insert(&self, new: &NewDiscount) -> DbResult<Discount> {
        let now = Utc::now();
        let discount = Discount {
            id: Uuid::new_v4().to_string(),
            code: new.code.clone(),
            description: new.description.clone(),
            discount_type: new.discount_type,
            value: new.value,
            min_order_cents: new.min_order_cents,
            max_discount_cents: new.max_discount_cents,
            usage_limit: new.usage_limit,
            usage_count: 0,
            starts_at: new.starts_at,
            ends_at: new.ends_at,
            is_active: true,
            created_at: now,
            updated_at: now,
        };

        debug!(id = %discount.id, code = %discount.code, "Inserting discount");

        sqlx::query(
            r#"
            INSERT INTO discounts (
                id, code, description, discount_type, value,
                min_order_cents, max_discount_cents,
                usage_limit, usage_count,
                starts_at, ends_at, is_active,
                created_at, updated_at
            ) VALUES (
                ?1, ?2, ?3, ?4, ?5,
                ?6, ?7,
                ?8, ?9,
                ?10, ?11, ?12,
                ?13, ?14
            )
            "#,
        )
        .bind(&discount.id)
        .bind(&discount.code)
        .bind(&discount.description)
        .bind(discount.discount_type)
        .bind(discount.value)
        .bind(discount.min_order_cents)
        .bind(discount.max_discount_cents)
        .bind(discount.usage_limit)
        .bind(discount.usage_count)
        .bind(discount.starts_at)
        .bind(discount.ends_at)
        .bind(discount.is_active)
        .bind(discount.created_at)
        .bind(discount.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| match DbError::from(e) {
            DbError::UniqueViolation { .. } => DbError::duplicate("discount code", &new.code),
            other => other,
        })?;

        Ok(discount)
    }

    /// Enables or disables a code.
    pub async fn set_active(&self, id: &str, active: bool) -> DbResult<()> {
        debug!(id = %id, active = %active, "Setting discount active flag");

        let result = sqlx::query(
            r#"
            UPDATE discounts
            SET
                is_active = ?2,
                updated_at = ?3
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .bind(active)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Discount", id));
        }

        Ok(())
    }

    /// Consumes one use of a discount inside the caller's transaction.
    ///
    /// ## Returns
    /// * `Ok(true)` - usage_count incremented
    /// * `Ok(false)` - discount disabled or its limit was reached since it
    ///   was evaluated; the caller must abort
    pub async fn increment_usage(conn: &mut SqliteConnection, id: &str) -> DbResult<bool> {
        let result = sqlx::query(
            r#"
            UPDATE discounts
            SET
                usage_count = usage_count + 1,
                updated_at = ?2
            WHERE id = ?1
              AND is_active = 1
              AND (usage_limit IS NULL OR usage_count < usage_limit)
            "#,
        )
        .bind(id)
        .bind(Utc::now())
        .execute(&mut *conn)
        .await?;

        let applied = result.rows_affected() == 1;
        debug!(id = %id, applied = %applied, "Incrementing discount usage");

        Ok(applied)
    }

    /// Reads a discount's active flag on `conn`, `None` if it is gone.
    pub async fn get_active_flag(conn: &mut SqliteConnection, id: &str) -> DbResult<Option<bool>> {
        let active: Option<bool> = sqlx::query_scalar("SELECT is_active FROM discounts WHERE id = ?1")
            .bind(id)
            .fetch_optional(&mut *conn)
            .await?;

        Ok(active)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};
    use emporium_core::{DiscountType, Money, Percentage};

    async fn setup() -> Database {
        Database::new(DbConfig::in_memory()).await.unwrap()
    }

    #[tokio::test]
    async fn test_insert_and_lookup_case_insensitive() {
        let db = setup().await;
        let repo = db.discounts();

        let mut new = NewDiscount::percentage("SPRING20", Percentage::from_whole(20));
        new.max_discount_cents = Some(1500);
        let created = repo.insert(&new).await.unwrap();

        let found = repo.get_by_code("spring20").await.unwrap().unwrap();
        assert_eq!(found.id, created.id);
        assert_eq!(found.discount_type, DiscountType::Percentage);
        assert_eq!(found.value, 2000);
        assert_eq!(found.max_discount_cents, Some(1500));
        assert_eq!(found.usage_count, 0);

        assert!(repo.get_by_code("UNKNOWN").await.unwrap().is_none());
        assert!(repo.get_by_id(&created.id).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_duplicate_code_any_casing() {
        let db = setup().await;
        let repo = db.discounts();
        repo.insert(&NewDiscount::fixed_amount("FLAT5", Money::from_cents(500)))
            .await
            .unwrap();

        let err = repo
            .insert(&NewDiscount::fixed_amount("flat5", Money::from_cents(700)))
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::UniqueViolation { .. }));
    }

    #[tokio::test]
    async fn test_increment_usage_respects_limit() {
        let db = setup().await;
        let repo = db.discounts();
        let mut new = NewDiscount::fixed_amount("ONCE", Money::from_cents(500));
        new.usage_limit = Some(1);
        let discount = repo.insert(&new).await.unwrap();

        let mut conn = db.pool().acquire().await.unwrap();
        assert!(DiscountRepository::increment_usage(&mut conn, &discount.id)
            .await
            .unwrap());
        assert!(!DiscountRepository::increment_usage(&mut conn, &discount.id)
            .await
            .unwrap());
        drop(conn);

        let reloaded = repo.get_by_id(&discount.id).await.unwrap().unwrap();
        assert_eq!(reloaded.usage_count, 1);
    }

    #[tokio::test]
    async fn test_increment_usage_refuses_inactive() {
        let db = setup().await;
        let repo = db.discounts();
        let discount = repo
            .insert(&NewDiscount::percentage("OFF", Percentage::from_whole(5)))
            .await
            .unwrap();
        repo.set_active(&discount.id, false).await.unwrap();

        let mut conn = db.pool().acquire().await.unwrap();
        assert!(!DiscountRepository::increment_usage(&mut conn, &discount.id)
            .await
            .unwrap());
    }

    #[tokio::test]
    async fn test_active_flag_follows_set_active() {
        let db = setup().await;
        let repo = db.discounts();
        let discount = repo
            .insert(&NewDiscount::fixed_amount("PAUSE", Money::from_cents(500)))
            .await
            .unwrap();

        let mut conn = db.pool().acquire().await.unwrap();
        assert_eq!(
            DiscountRepository::get_active_flag(&mut conn, &discount.id).await.unwrap(),
            Some(true)
        );
        drop(conn);

        repo.set_active(&discount.id, false).await.unwrap();

        let mut conn = db.pool().acquire().await.unwrap();
        assert_eq!(
            DiscountRepository::get_active_flag(&mut conn, &discount.id).await.unwrap(),
            Some(false)
        );
        assert!(!DiscountRepository::increment_usage(&mut conn, &discount.id)
            .await
            .unwrap());
        assert_eq!(
            DiscountRepository::get_active_flag(&mut conn, "missing").await.unwrap(),
            None
        );
    }
}
