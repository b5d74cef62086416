//! Database access layer
//!
//! SQLite via sqlx. One module per entity, raw SQL with explicit binds.
//! The three-document write path lives in `unit_of_work`.

pub mod batches;
pub mod events;
pub mod payments;
pub mod registrations;
pub mod schema;
pub mod unit_of_work;

use crate::Result;
use sqlx::sqlite::SqlitePoolOptions;
use sqlx::SqlitePool;
use std::path::Path;
use tracing::info;

/// Open (or create) the database file and initialize the schema
pub async fn init_database(db_path: &Path) -> Result<SqlitePool> {
    let newly_created = !db_path.exists();

    if let Some(parent) = db_path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    let db_url = format!("sqlite://{}?mode=rwc", db_path.display());
    let pool = SqlitePoolOptions::new()
        .max_connections(10)
        .connect(&db_url)
        .await?;

    if newly_created {
        info!("Initialized new database: {}", db_path.display());
    } else {
        info!("Opened existing database: {}", db_path.display());
    }

    configure_pragmas(&pool).await?;
    init_schema(&pool).await?;
    Ok(pool)
}

/// Session pragmas: WAL for concurrent readers, busy timeout for writer
/// contention
async fn configure_pragmas(pool: &SqlitePool) -> Result<()> {
    sqlx::query("PRAGMA journal_mode = WAL").execute(pool).await?;
    sqlx::query("PRAGMA busy_timeout = 5000").execute(pool).await?;
    Ok(())
}

/// Create all tables (idempotent); exposed separately so tests can run it
/// against `sqlite::memory:` pools
pub async fn init_schema(pool: &SqlitePool) -> Result<()> {
    schema::create_schools_table(pool).await?;
    schema::create_events_table(pool).await?;
    schema::create_event_fields_table(pool).await?;
    schema::create_discount_tiers_table(pool).await?;
    schema::create_event_fees_table(pool).await?;
    schema::create_batches_table(pool).await?;
    schema::create_registrations_table(pool).await?;
    schema::create_payments_table(pool).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_init_database_creates_file_and_parent_dirs() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("regbatch.db");

        let pool = init_database(&path).await.unwrap();
        assert!(path.exists());

        // Reopening an existing file also works
        drop(pool);
        init_database(&path).await.unwrap();
    }

    #[tokio::test]
    async fn test_init_schema_is_idempotent() {
        let pool = SqlitePool::connect("sqlite::memory:").await.unwrap();
        init_schema(&pool).await.unwrap();
        init_schema(&pool).await.unwrap();

        let count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM sqlite_master WHERE type = 'table'")
                .fetch_one(&pool)
                .await
                .unwrap();
        assert!(count >= 8);
    }
}
