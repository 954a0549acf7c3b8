//! Schema migrations, embedded at compile time from `migrations/sqlite/`.
//!
//! ```text
//!  001_initial_schema.sql   products, clients, vendors, transactions,
//!                           transaction_lines, payment_references,
//!                           document_counters, settings (row id = 1)
//! ```
//!
//! Files are applied in name order and recorded in `_sqlx_migrations`.
//! An applied file is never edited; schema changes go in `NNN_name.sql`.

use sqlx::SqlitePool;
use tracing::{debug, info};

use crate::error::DbResult;

static MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!("../../migrations/sqlite");

/// Applies every migration not yet recorded. Safe to call on each start.
pub async fn run_migrations(pool: &SqlitePool) -> DbResult<()> {
    let (known, applied) = migration_status(pool).await?;
    debug!(known, applied, "Migration state before run");

    MIGRATOR.run(pool).await?;

    if applied < known {
        info!(count = known - applied, "Applied pending migrations");
    }
    Ok(())
}

/// `(embedded, applied)` migration counts.
pub async fn migration_status(pool: &SqlitePool) -> DbResult<(usize, usize)> {
    let embedded = MIGRATOR.migrations.len();

    // _sqlx_migrations only exists after the first run
    let applied = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM _sqlx_migrations")
        .fetch_one(pool)
        .await
        .unwrap_or(0);

    Ok((embedded, usize::try_from(applied).unwrap_or(0)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};

    #[tokio::test]
    async fn test_fresh_database_is_fully_migrated() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let (embedded, applied) = migration_status(db.pool()).await.unwrap();

        assert!(embedded >= 1);
        assert_eq!(embedded, applied);
        assert_eq!(db.pending_migrations().await, 0);
    }

    #[tokio::test]
    async fn test_skipped_migrations_are_pending() {
        let db = Database::new(DbConfig::in_memory().run_migrations(false))
            .await
            .unwrap();
        let (embedded, applied) = migration_status(db.pool()).await.unwrap();
        assert_eq!(applied, 0);
        assert_eq!(db.pending_migrations().await, embedded);

        db.run_migrations().await.unwrap();
        db.run_migrations().await.unwrap();
        assert_eq!(db.pending_migrations().await, 0);
    }
}
