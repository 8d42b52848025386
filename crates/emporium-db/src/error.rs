//! # Storage Errors
//!
//! What can go wrong below the repositories, and how callers should react.
//!
//! ```text
//! ┌──────────────────────────────┬─────────────────────┬───────────────────┐
//! │ sqlx / SQLite                │ DbError             │ caller            │
//! ├──────────────────────────────┼─────────────────────┼───────────────────┤
//! │ UNIQUE constraint failed     │ UniqueViolation     │ report conflict   │
//! │ FOREIGN KEY / CHECK failed   │ ForeignKey/Check    │ bug: log it       │
//! │ database is locked           │ Busy                │ retry later       │
//! │ PoolTimedOut                 │ PoolExhausted       │ retry later       │
//! │ column decode                │ InvalidData         │ bug: log it       │
//! │ anything else                │ QueryFailed/Internal│ log, generic 500  │
//! └──────────────────────────────┴─────────────────────┴───────────────────┘
//! ```
//!
//! `emporium-checkout` wraps these in `CheckoutError`; domain failures
//! (out of stock, bad discount) never appear here.

use thiserror::Error;

/// Storage failure.
#[derive(Debug, Error)]
pub enum DbError {
    /// An update or `fetch_one` matched no row.
    #[error("{entity} not found: {id}")]
    NotFound { entity: String, id: String },

    /// SKU, discount code (any casing) or order number already taken.
    #[error("Duplicate {field}: '{value}' already exists")]
    UniqueViolation { field: String, value: String },

    /// An order points at a missing discount, or an item/event at a missing order.
    #[error("Foreign key violation: {message}")]
    ForeignKeyViolation { message: String },

    /// CHECK constraint violation (negative stock, usage over limit, ...).
    #[error("Constraint violation: {message}")]
    CheckViolation { message: String },

    /// Database is locked by another writer and `busy_timeout` ran out.
    #[error("Database busy: {0}")]
    Busy(String),

    /// The file could not be opened, or the pool is closed.
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    /// An embedded migration did not apply (bad SQL or a changed checksum).
    #[error("Migration failed: {0}")]
    MigrationFailed(String),

    /// SQLite rejected a statement for a reason not mapped above.
    #[error("Query failed: {0}")]
    QueryFailed(String),

    /// Stored data could not be turned back into a domain value.
    #[error("Invalid stored data: {0}")]
    InvalidData(String),

    /// Pool exhausted (all connections in use past `acquire_timeout`).
    #[error("Connection pool exhausted")]
    PoolExhausted,

    /// Any other sqlx failure.
    #[error("Internal database error: {0}")]
    Internal(String),
}

impl DbError {
    /// `entity` with `id` does not exist.
    pub fn not_found(entity: impl Into<String>, id: impl Into<String>) -> Self {
        DbError::NotFound {
            entity: entity.into(),
            id: id.into(),
        }
    }

    /// `value` is already used for `field`.
    pub fn duplicate(field: impl Into<String>, value: impl Into<String>) -> Self {
        DbError::UniqueViolation {
            field: field.into(),
            value: value.into(),
        }
    }

    /// Whether retrying the whole operation later could succeed.
    pub fn is_transient(&self) -> bool {
        matches!(self, DbError::Busy(_) | DbError::PoolExhausted)
    }
}

/// SQLite reports constraint failures only through the message text, e.g.
/// `UNIQUE constraint failed: products.sku`.
impl From<sqlx::Error> for DbError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => DbError::NotFound {
                entity: "Record".to_string(),
                id: "unknown".to_string(),
            },

            sqlx::Error::Database(db_err) => {
                let msg = db_err.message();

                if msg.contains("UNIQUE constraint failed") {
                    let field = msg
                        .split("UNIQUE constraint failed: ")
                        .nth(1)
                        .unwrap_or("unknown")
                        .to_string();
                    DbError::UniqueViolation {
                        field,
                        value: "unknown".to_string(),
                    }
                } else if msg.contains("FOREIGN KEY constraint failed") {
                    DbError::ForeignKeyViolation {
                        message: msg.to_string(),
                    }
                } else if msg.contains("CHECK constraint failed") {
                    DbError::CheckViolation {
                        message: msg.to_string(),
                    }
                } else if msg.contains("database is locked") || msg.contains("database is busy") {
                    DbError::Busy(msg.to_string())
                } else {
                    DbError::QueryFailed(msg.to_string())
                }
            }

            sqlx::Error::PoolTimedOut => DbError::PoolExhausted,

            sqlx::Error::PoolClosed => DbError::ConnectionFailed("Pool is closed".to_string()),

            sqlx::Error::ColumnDecode { .. } | sqlx::Error::Decode(_) => {
                DbError::InvalidData(err.to_string())
            }

            _ => DbError::Internal(err.to_string()),
        }
    }
}

impl From<sqlx::migrate::MigrateError> for DbError {
    fn from(err: sqlx::migrate::MigrateError) -> Self {
        DbError::MigrationFailed(err.to_string())
    }
}

impl From<serde_json::Error> for DbError {
    fn from(err: serde_json::Error) -> Self {
        DbError::InvalidData(err.to_string())
    }
}

/// Result of a repository call.
pub type DbResult<T> = Result<T, DbError>;
