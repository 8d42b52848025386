//! # Product Repository
//!
//! Catalog access for the checkout engine and catalog management.
//!
//! ## Who Touches What
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        products table                                   │
//! │                                                                         │
//! │  ProductRepository (this module)                                       │
//! │  ├── insert / get_by_id / get_many / get_by_sku                        │
//! │  ├── restock          stock_quantity += n                              │
//! │  └── set_active       soft delete / re-list                            │
//! │                                                                         │
//! │  reservation module (inside the checkout transaction)                  │
//! │  ├── reserve          stock_quantity -= n  WHERE stock_quantity >= n   │
//! │  └── release          stock_quantity += n                              │
//! │                                                                         │
//! │  Stock is only ever changed by delta, never by absolute assignment.    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::collections::HashMap;

use chrono::Utc;
use sqlx::{QueryBuilder, Sqlite, SqlitePool};
use tracing::debug;
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use emporium_core::Product;

/// Repository for product database operations.
///
/// ## Usage
/// ```rust,ignore
/// let repo = ProductRepository::new(pool);
///
/// let product = repo.get_by_id("uuid-here").await?;
/// let cart_products = repo.get_many(&ids).await?;
/// ```
#[derive(Debug, Clone)]
pub struct ProductRepository {
    pool: SqlitePool,
}

impl ProductRepository {
    /// Creates a new ProductRepository.
    pub fn new(pool: SqlitePool) -> Self {
        ProductRepository { pool }
    }

    /// Gets a product by its ID.
    ///
    /// ## Returns
    /// * `Ok(Some(Product))` - Product found
    /// * `Ok(None)` - Product not found
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Product>> {
        let product = sqlx::query_as::<_, Product>(
            r#"
            SELECT
                id, sku, name, description,
                price_cents, stock_quantity, is_active,
                created_at, updated_at
            FROM products
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(product)
    }

    /// Gets every product whose id is in `ids`, keyed by id.
    ///
    /// Unknown ids are simply absent from the map. One query regardless of
    /// cart size.
    pub async fn get_many(&self, ids: &[String]) -> DbResult<HashMap<String, Product>> {
        if ids.is_empty() {
            return Ok(HashMap::new());
        }

        debug!(count = ids.len(), "Loading products");

        let mut query: QueryBuilder<Sqlite> = QueryBuilder::new(
            r#"
            SELECT
                id, sku, name, description,
                price_cents, stock_quantity, is_active,
                created_at, updated_at
            FROM products
            WHERE id IN ("#,
        );
        let mut separated = query.separated(", ");
        for id in ids {
            separated.push_bind(id);
        }
        separated.push_unseparated(")");

        let products = query
            .build_query_as::<Product>()
            .fetch_all(&self.pool)
            .await?;

        Ok(products.into_iter().map(|p| (p.id.clone(), p)).collect())
    }

    /// Gets a product by its SKU.
    pub async fn get_by_sku(&self, sku: &str) -> DbResult<Option<Product>> {
        let product = sqlx::query_as::<_, Product>(
            r#"
            SELECT
                id, sku, name, description,
                price_cents, stock_quantity, is_active,
                created_at, updated_at
            FROM products
            WHERE sku = ?1
            "#,
        )
        .bind(sku)
        .fetch_optional(&self.pool)
        .await?;

        Ok(product)
    }

    /// Lists active products ordered by name.
    pub async fn list_active(&self, limit: u32) -> DbResult<Vec<Product>> {
        let products = sqlx::query_as::<_, Product>(
            r#"
            SELECT
                id, sku, name, description,
                price_cents, stock_quantity, is_active,
                created_at, updated_at
            FROM products
            WHERE is_active = 1
            ORDER BY name
            LIMIT ?1
            "#,
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(products)
    }

    /// Inserts a new product.
    ///
    /// ## Returns
    /// * `Ok(Product)` - Inserted product
    /// * `Err(DbError::UniqueViolation)` - SKU already exists
    pub async fn insert(&self, product: &Product) -> DbResult<Product> {
        debug!(sku = %product.sku, "Inserting product");

        sqlx::query(
            r#"
            INSERT INTO products (
                id, sku, name, description,
                price_cents, stock_quantity, is_active,
                created_at, updated_at
            ) VALUES (
                ?1, ?2, ?3, ?4,
                ?5, ?6, ?7,
                ?8, ?9
            )
            "#,
        )
        .bind(&product.id)
        .bind(&product.sku)
        .bind(&product.name)
        .bind(&product.description)
        .bind(product.price_cents)
        .bind(product.stock_quantity)
        .bind(product.is_active)
        .bind(product.created_at)
        .bind(product.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| match DbError::from(e) {
            DbError::UniqueViolation { field, .. } => DbError::duplicate(field, &product.sku),
            other => other,
        })?;

        Ok(product.clone())
    }

    /// Adds `quantity` units to a product's stock.
    pub async fn restock(&self, id: &str, quantity: u32) -> DbResult<()> {
        debug!(id = %id, quantity = %quantity, "Restocking product");

        let result = sqlx::query(
            r#"
            UPDATE products
            SET
                stock_quantity = stock_quantity + ?2,
                updated_at = ?3
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .bind(i64::from(quantity))
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Product", id));
        }

        Ok(())
    }

    /// Changes a product's price. Existing orders keep their snapshots.
    pub async fn update_price(&self, id: &str, price_cents: i64) -> DbResult<()> {
        debug!(id = %id, price_cents = %price_cents, "Updating price");

        let result = sqlx::query(
            r#"
            UPDATE products
            SET
                price_cents = ?2,
                updated_at = ?3
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .bind(price_cents)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Product", id));
        }

        Ok(())
    }

    /// Lists or delists a product. Inactive products can't be checked out.
    pub async fn set_active(&self, id: &str, active: bool) -> DbResult<()> {
        debug!(id = %id, active = %active, "Setting product active flag");

        let result = sqlx::query(
            r#"
            UPDATE products
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
            return Err(DbError::not_found("Product", id));
        }

        Ok(())
    }

    /// Counts active products (for diagnostics).
    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM products WHERE is_active = 1")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }
}

/// Helper to generate a new product ID.
pub fn generate_product_id() -> String {
    Uuid::new_v4().to_string()
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};
    use crate::repository::fixtures::sample_product;

    async fn setup() -> Database {
        Database::new(DbConfig::in_memory()).await.unwrap()
    }

    #[tokio::test]
    async fn test_insert_and_get() {
        let db = setup().await;
        let repo = db.products();
        let product = sample_product("MUG-01", 1299, 5);

        repo.insert(&product).await.unwrap();

        let by_id = repo.get_by_id(&product.id).await.unwrap().unwrap();
        assert_eq!(by_id.sku, "MUG-01");
        assert_eq!(by_id.price_cents, 1299);
        assert_eq!(by_id.stock_quantity, 5);
        assert!(by_id.is_active);

        let by_sku = repo.get_by_sku("MUG-01").await.unwrap().unwrap();
        assert_eq!(by_sku.id, product.id);

        assert!(repo.get_by_id("missing").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_duplicate_sku_rejected() {
        let db = setup().await;
        let repo = db.products();
        repo.insert(&sample_product("DUP", 100, 1)).await.unwrap();

        let err = repo.insert(&sample_product("DUP", 200, 1)).await.unwrap_err();
        assert!(matches!(err, DbError::UniqueViolation { value, .. } if value == "DUP"));
    }

    #[tokio::test]
    async fn test_get_many_skips_unknown_ids() {
        let db = setup().await;
        let repo = db.products();
        let a = sample_product("A", 100, 1);
        let b = sample_product("B", 200, 1);
        repo.insert(&a).await.unwrap();
        repo.insert(&b).await.unwrap();

        let ids = vec![a.id.clone(), b.id.clone(), "ghost".to_string()];
        let found = repo.get_many(&ids).await.unwrap();

        assert_eq!(found.len(), 2);
        assert_eq!(found[&a.id].sku, "A");
        assert!(!found.contains_key("ghost"));

        assert!(repo.get_many(&[]).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_restock_and_set_active() {
        let db = setup().await;
        let repo = db.products();
        let product = sample_product("TEE", 2500, 0);
        repo.insert(&product).await.unwrap();

        repo.restock(&product.id, 7).await.unwrap();
        repo.set_active(&product.id, false).await.unwrap();

        let reloaded = repo.get_by_id(&product.id).await.unwrap().unwrap();
        assert_eq!(reloaded.stock_quantity, 7);
        assert!(!reloaded.is_active);
        assert_eq!(repo.count().await.unwrap(), 0);
        assert!(repo.list_active(10).await.unwrap().is_empty());

        assert!(matches!(
            repo.restock("missing", 1).await,
            Err(DbError::NotFound { .. })
        ));
    }

    #[tokio::test]
    async fn test_update_price() {
        let db = setup().await;
        let repo = db.products();
        let product = sample_product("CAP", 1500, 3);
        repo.insert(&product).await.unwrap();

        repo.update_price(&product.id, 1800).await.unwrap();

        let reloaded = repo.get_by_id(&product.id).await.unwrap().unwrap();
        assert_eq!(reloaded.price_cents, 1800);
    }
}
