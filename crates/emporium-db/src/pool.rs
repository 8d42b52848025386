//! # Pool and Transactions
//!
//! Opens the SQLite file, applies the pragmas checkout depends on and hands
//! out repositories and write transactions.
//!
//! ## Locking Model
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  SqlitePool (max_connections)                                          │
//! │                                                                         │
//! │  catalog / order reads ──► any connection, never blocked (WAL)         │
//! │                                                                         │
//! │  checkout A: BEGIN ─ UPDATE products ... ─ INSERT orders ─ COMMIT      │
//! │                       ▲ takes the write lock                            │
//! │  checkout B: BEGIN ─ UPDATE products ... (busy: retried until A        │
//! │                       commits or busy_timeout elapses)                  │
//! │                                                                         │
//! │  pool exhausted ──► caller waits up to acquire_timeout                 │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! A transaction whose first statement reads would hold a snapshot that a
//! concurrent commit can invalidate, and SQLite then fails the later write
//! immediately instead of waiting. Every write transaction therefore opens
//! with its first write.

use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous};
use sqlx::{Sqlite, SqlitePool, Transaction};
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;
use tracing::{debug, info};

use crate::error::{DbError, DbResult};
use crate::migrations;
use crate::repository::discount::DiscountRepository;
use crate::repository::order::OrderRepository;
use crate::repository::outbox::OrderEventRepository;
use crate::repository::product::ProductRepository;

// =============================================================================
// Configuration
// =============================================================================

/// Pool and pragma settings.
///
/// ## Example
/// ```rust,ignore
/// let config = DbConfig::new("/var/lib/emporium/emporium.db")
///     .max_connections(5)
///     .busy_timeout(Duration::from_secs(5));
/// ```
#[derive(Debug, Clone)]
pub struct DbConfig {
    /// SQLite file; `:memory:` for a private in-process database.
    pub database_path: PathBuf,

    /// Upper bound on pooled connections.
    /// Default: 5
    pub max_connections: u32,

    /// Connections kept open while idle.
    /// Default: 1
    pub min_connections: u32,

    /// How long a caller waits for a free connection.
    /// Default: 30 seconds
    pub acquire_timeout: Duration,

    /// How long a statement waits on a locked database before failing.
    /// Default: 5 seconds
    pub busy_timeout: Duration,

    /// How long an unused connection stays open.
    /// Default: 10 minutes
    pub idle_timeout: Duration,

    /// Apply embedded migrations when the pool opens.
    /// Default: true
    pub run_migrations: bool,
}

impl DbConfig {
    /// Defaults for a file-backed database at `path` (created on first use).
    pub fn new(path: impl Into<PathBuf>) -> Self {
        DbConfig {
            database_path: path.into(),
            max_connections: 5,
            min_connections: 1,
            acquire_timeout: Duration::from_secs(30),
            busy_timeout: Duration::from_secs(5),
            idle_timeout: Duration::from_secs(600),
            run_migrations: true,
        }
    }

    /// Sets `max_connections`.
    pub fn max_connections(mut self, max: u32) -> Self {
        self.max_connections = max;
        self
    }

    /// Sets `min_connections`.
    pub fn min_connections(mut self, min: u32) -> Self {
        self.min_connections = min;
        self
    }

    /// Sets the pool acquire timeout.
    pub fn acquire_timeout(mut self, timeout: Duration) -> Self {
        self.acquire_timeout = timeout;
        self
    }

    /// Sets the SQLite busy timeout.
    pub fn busy_timeout(mut self, timeout: Duration) -> Self {
        self.busy_timeout = timeout;
        self
    }

    /// Sets `run_migrations`.
    pub fn run_migrations(mut self, run: bool) -> Self {
        self.run_migrations = run;
        self
    }

    /// Creates an in-memory database configuration (for testing).
    ///
    /// ## Usage
    /// ```rust,ignore
    /// let db = Database::new(DbConfig::in_memory()).await?;
    /// // Database is isolated, perfect for tests
    /// ```
    ///
    /// A single connection owns the in-memory database, so callers must not
    /// touch the pool while holding a transaction from [`Database::begin`].
    pub fn in_memory() -> Self {
        DbConfig {
            database_path: PathBuf::from(":memory:"),
            max_connections: 1,
            min_connections: 1,
            acquire_timeout: Duration::from_secs(5),
            busy_timeout: Duration::from_secs(5),
            idle_timeout: Duration::from_secs(60),
            run_migrations: true,
        }
    }
}

// =============================================================================
// Database
// =============================================================================

/// Handle to the store: repositories plus [`Database::begin`].
///
/// Cheap to clone: the pool is reference counted.
///
/// ## Usage
/// ```rust,ignore
/// let db = Database::new(DbConfig::new("./emporium.db")).await?;
///
/// let product = db.products().get_by_id(&id).await?;
/// let pending = db.order_events().pending(50).await?;
/// ```
#[derive(Debug, Clone)]
pub struct Database {
    pool: SqlitePool,
}

impl Database {
    /// Opens (or creates) the database and migrates it.
    ///
    /// Every connection gets WAL journaling, NORMAL synchronous, foreign
    /// keys and `busy_timeout`, so queued checkouts wait for the write lock
    /// rather than failing at once.
    ///
    /// ## Returns
    /// * `Err(DbError::ConnectionFailed)` - file could not be opened
    /// * `Err(DbError::MigrationFailed)` - schema could not be applied
    pub async fn new(config: DbConfig) -> DbResult<Self> {
        info!(
            path = %config.database_path.display(),
            "Opening checkout database"
        );

        // sqlite://path?mode=rwc creates the file if missing
        let connect_url = format!("sqlite://{}?mode=rwc", config.database_path.display());

        let connect_options = SqliteConnectOptions::from_str(&connect_url)
            .map_err(|e| DbError::ConnectionFailed(e.to_string()))?
            .journal_mode(SqliteJournalMode::Wal)
            .synchronous(SqliteSynchronous::Normal)
            // order_items and order_events reference orders
            .foreign_keys(true)
            .busy_timeout(config.busy_timeout)
            .create_if_missing(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(config.max_connections)
            .min_connections(config.min_connections)
            .acquire_timeout(config.acquire_timeout)
            .idle_timeout(Some(config.idle_timeout))
            .connect_with(connect_options)
            .await
            .map_err(|e| DbError::ConnectionFailed(e.to_string()))?;

        info!(
            max_connections = config.max_connections,
            busy_timeout_ms = config.busy_timeout.as_millis() as u64,
            "Database pool created"
        );

        let db = Database { pool };

        if config.run_migrations {
            db.run_migrations().await?;
        }

        Ok(db)
    }

    /// Applies pending migrations.
    ///
    /// Called by `new()` when `run_migrations` is true; safe to call again.
    pub async fn run_migrations(&self) -> DbResult<()> {
        info!("Running database migrations");
        migrations::run_migrations(&self.pool).await?;
        info!("Migrations complete");
        Ok(())
    }

    /// The raw pool, for callers that need a plain connection.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Starts a transaction.
    ///
    /// SQLite begins it DEFERRED: the write lock is taken by the first
    /// write, so every write transaction here must start with a write.
    /// Dropping the transaction without `commit()` rolls it back.
    pub async fn begin(&self) -> DbResult<Transaction<'static, Sqlite>> {
        Ok(self.pool.begin().await?)
    }

    /// Returns the product (catalog) repository.
    pub fn products(&self) -> ProductRepository {
        ProductRepository::new(self.pool.clone())
    }

    /// Returns the discount repository.
    pub fn discounts(&self) -> DiscountRepository {
        DiscountRepository::new(self.pool.clone())
    }

    /// Returns the order repository.
    pub fn orders(&self) -> OrderRepository {
        OrderRepository::new(self.pool.clone())
    }

    /// Returns the order event outbox repository.
    pub fn order_events(&self) -> OrderEventRepository {
        OrderEventRepository::new(self.pool.clone())
    }

    /// Closes the pool. Later repository calls fail with `ConnectionFailed`.
    pub async fn close(&self) {
        info!("Closing database connection pool");
        self.pool.close().await;
    }

    /// `SELECT 1` succeeds.
    pub async fn health_check(&self) -> bool {
        sqlx::query("SELECT 1").execute(&self.pool).await.is_ok()
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_in_memory_database() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();

        assert!(db.health_check().await);
    }

    #[tokio::test]
    async fn test_config_builder() {
        let config = DbConfig::new("/tmp/test.db")
            .max_connections(10)
            .min_connections(2)
            .busy_timeout(Duration::from_millis(250))
            .run_migrations(false);

        assert_eq!(config.max_connections, 10);
        assert_eq!(config.min_connections, 2);
        assert_eq!(config.busy_timeout, Duration::from_millis(250));
        assert!(!config.run_migrations);
    }

    #[tokio::test]
    async fn test_dropped_transaction_rolls_back() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();

        {
            let mut tx = db.begin().await.unwrap();
            sqlx::query(
                "INSERT INTO products (id, sku, name, price_cents, stock_quantity, is_active, created_at, updated_at)
                 VALUES ('p1', 'SKU-1', 'Thing', 100, 1, 1, '2026-01-01T00:00:00Z', '2026-01-01T00:00:00Z')",
            )
            .execute(&mut *tx)
            .await
            .unwrap();
            // dropped without commit
        }

        assert_eq!(db.products().count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_closed_pool_is_unhealthy() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        db.close().await;
        assert!(!db.health_check().await);
    }
}
