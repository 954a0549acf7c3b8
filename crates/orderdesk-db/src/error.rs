//! # DbError
//!
//! Everything a repository call can fail with, from a broken file to a
//! payment the invoice cannot absorb.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  sqlx::Error ──────────┐                                                │
//! │    RowNotFound         │                                                │
//! │    Database(kind)  ────┼──► DbError ──► ApiError (status + code)        │
//! │    PoolTimedOut        │       ▲                                        │
//! │                        │       │                                        │
//! │  CoreError ────────────┘   Core(..) raised inside create_invoice /      │
//! │    Validation, Payment,    record_payment; the SQL transaction is       │
//! │    NotAnInvoice            dropped, so nothing is written               │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use orderdesk_core::{CoreError, PaymentError, ValidationError};
use sqlx::error::ErrorKind;
use thiserror::Error;

// Primary SQLite result codes; extended codes carry them in the low byte.
const SQLITE_BUSY: i32 = 5;
const SQLITE_LOCKED: i32 = 6;

fn is_lock_contention(code: Option<&str>) -> bool {
    code.and_then(|c| c.parse::<i32>().ok())
        .map(|c| matches!(c & 0xff, SQLITE_BUSY | SQLITE_LOCKED))
        .unwrap_or(false)
}

#[derive(Debug, Error)]
pub enum DbError {
    /// A looked-up row is absent: unknown id, or a client, vendor or product
    /// referenced by an invoice that no longer exists.
    #[error("{entity} not found: {id}")]
    NotFound { entity: String, id: String },

    /// A UNIQUE index rejected the write (product code, vendor id).
    #[error("Duplicate {field}: '{value}' already exists")]
    UniqueViolation { field: String, value: String },

    /// Deleting a client or vendor that still has transactions.
    #[error("Foreign key violation: {message}")]
    ForeignKeyViolation { message: String },

    /// The database file cannot be opened or the pool is closed.
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    #[error("Migration failed: {0}")]
    MigrationFailed(String),

    /// Any other statement-level error (CHECK, NOT NULL, bad SQL).
    #[error("Query failed: {0}")]
    QueryFailed(String),

    /// Commit of an invoice or payment failed.
    #[error("Transaction failed: {0}")]
    TransactionFailed(String),

    /// No connection became free within the acquire timeout.
    #[error("Connection pool exhausted")]
    PoolExhausted,

    /// Another writer held the database lock past the busy timeout.
    #[error("Database is locked by another writer")]
    Busy,

    /// Schema state the code relies on is missing (e.g. a document counter).
    #[error("Internal database error: {0}")]
    Internal(String),

    /// A business rule rejected the operation. Raised inside a transaction,
    /// which is rolled back.
    #[error(transparent)]
    Core(#[from] CoreError),
}

impl DbError {
    pub fn not_found(entity: impl Into<String>, id: impl Into<String>) -> Self {
        DbError::NotFound {
            entity: entity.into(),
            id: id.into(),
        }
    }

    pub fn duplicate(field: impl Into<String>, value: impl Into<String>) -> Self {
        DbError::UniqueViolation {
            field: field.into(),
            value: value.into(),
        }
    }
}

impl From<sqlx::Error> for DbError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => DbError::not_found("Record", "unknown"),
            sqlx::Error::Database(db_err) if is_lock_contention(db_err.code().as_deref()) => {
                DbError::Busy
            }
            sqlx::Error::Database(db_err) => {
                let message = db_err.message().to_string();
                match db_err.kind() {
                    // SQLite: "UNIQUE constraint failed: products.code"
                    ErrorKind::UniqueViolation => DbError::UniqueViolation {
                        field: message
                            .rsplit(": ")
                            .next()
                            .unwrap_or("unknown")
                            .to_string(),
                        value: "unknown".to_string(),
                    },
                    ErrorKind::ForeignKeyViolation => DbError::ForeignKeyViolation { message },
                    _ => DbError::QueryFailed(message),
                }
            }
            sqlx::Error::PoolTimedOut => DbError::PoolExhausted,
            sqlx::Error::PoolClosed => DbError::ConnectionFailed("pool is closed".to_string()),
            sqlx::Error::Io(io) => DbError::ConnectionFailed(io.to_string()),
            other => DbError::Internal(other.to_string()),
        }
    }
}

impl From<sqlx::migrate::MigrateError> for DbError {
    fn from(err: sqlx::migrate::MigrateError) -> Self {
        DbError::MigrationFailed(err.to_string())
    }
}

impl From<ValidationError> for DbError {
    fn from(err: ValidationError) -> Self {
        DbError::Core(CoreError::Validation(err))
    }
}

impl From<PaymentError> for DbError {
    fn from(err: PaymentError) -> Self {
        DbError::Core(CoreError::Payment(err))
    }
}

pub type DbResult<T> = Result<T, DbError>;
