//! Table creation for the regbatch database
//!
//! All statements are `CREATE TABLE IF NOT EXISTS`, so initialization is
//! idempotent and safe to run on every startup.
//!
//! Batch/registration/payment linkage is by `batch_reference` without
//! declared foreign keys: the sequential unit-of-work fallback must be
//! able to leave "orphaned children, no parent" on a crash, which an
//! immediate FK constraint would forbid.

use crate::Result;
use sqlx::SqlitePool;

pub async fn create_schools_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS schools (
            id TEXT PRIMARY KEY,
            name TEXT NOT NULL,
            currency TEXT NOT NULL,
            created_at TEXT DEFAULT CURRENT_TIMESTAMP,
            updated_at TEXT DEFAULT CURRENT_TIMESTAMP
        )
        "#,
    )
    .execute(pool)
    .await?;
    Ok(())
}

pub async fn create_events_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS events (
            id TEXT PRIMARY KEY,
            code TEXT NOT NULL,
            name TEXT NOT NULL,
            active INTEGER NOT NULL DEFAULT 1,
            deadline TEXT,
            created_at TEXT DEFAULT CURRENT_TIMESTAMP,
            updated_at TEXT DEFAULT CURRENT_TIMESTAMP
        )
        "#,
    )
    .execute(pool)
    .await?;
    Ok(())
}

pub async fn create_event_fields_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS event_fields (
            event_id TEXT NOT NULL,
            field_id TEXT NOT NULL,
            label TEXT NOT NULL,
            field_type TEXT NOT NULL,
            required INTEGER NOT NULL DEFAULT 0,
            options TEXT,
            min_value REAL,
            max_value REAL,
            min_length INTEGER,
            max_length INTEGER,
            pattern TEXT,
            sort_order INTEGER NOT NULL DEFAULT 0,
            PRIMARY KEY (event_id, field_id)
        )
        "#,
    )
    .execute(pool)
    .await?;
    Ok(())
}

pub async fn create_discount_tiers_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS discount_tiers (
            event_id TEXT NOT NULL,
            min_students INTEGER NOT NULL,
            discount_percent REAL NOT NULL,
            PRIMARY KEY (event_id, min_students)
        )
        "#,
    )
    .execute(pool)
    .await?;
    Ok(())
}

pub async fn create_event_fees_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS event_fees (
            event_id TEXT NOT NULL,
            currency TEXT NOT NULL,
            unit_fee INTEGER NOT NULL,
            PRIMARY KEY (event_id, currency)
        )
        "#,
    )
    .execute(pool)
    .await?;
    Ok(())
}

pub async fn create_batches_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS batches (
            reference TEXT PRIMARY KEY,
            school_id TEXT NOT NULL,
            event_id TEXT NOT NULL,
            registration_ids TEXT NOT NULL,
            total_students INTEGER NOT NULL,
            base_amount INTEGER NOT NULL,
            discount_percent REAL NOT NULL,
            discount_amount INTEGER NOT NULL,
            total_amount INTEGER NOT NULL,
            currency TEXT NOT NULL,
            status TEXT NOT NULL,
            payment_status TEXT NOT NULL,
            payment_mode TEXT NOT NULL,
            validation_errors TEXT NOT NULL DEFAULT '[]',
            cancelled_reason TEXT,
            cancelled_at TEXT,
            verified_by TEXT,
            verified_at TEXT,
            verification_notes TEXT,
            rejected_by TEXT,
            rejected_at TEXT,
            rejection_reason TEXT,
            created_at TEXT DEFAULT CURRENT_TIMESTAMP,
            updated_at TEXT DEFAULT CURRENT_TIMESTAMP
        )
        "#,
    )
    .execute(pool)
    .await?;
    Ok(())
}

pub async fn create_registrations_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS registrations (
            id TEXT PRIMARY KEY,
            batch_reference TEXT NOT NULL,
            event_id TEXT NOT NULL,
            school_id TEXT NOT NULL,
            student_name TEXT NOT NULL,
            grade TEXT NOT NULL,
            section TEXT,
            dynamic_data TEXT NOT NULL DEFAULT '{}',
            status TEXT NOT NULL,
            result_score REAL,
            result_rank INTEGER,
            result_award TEXT,
            result_remarks TEXT,
            created_at TEXT DEFAULT CURRENT_TIMESTAMP,
            updated_at TEXT DEFAULT CURRENT_TIMESTAMP
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        "CREATE INDEX IF NOT EXISTS idx_registrations_batch ON registrations(batch_reference)",
    )
    .execute(pool)
    .await?;
    sqlx::query(
        "CREATE INDEX IF NOT EXISTS idx_registrations_event ON registrations(event_id)",
    )
    .execute(pool)
    .await?;
    Ok(())
}

pub async fn create_payments_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS payments (
            batch_reference TEXT PRIMARY KEY,
            school_id TEXT NOT NULL,
            event_id TEXT NOT NULL,
            amount INTEGER NOT NULL,
            currency TEXT NOT NULL,
            status TEXT NOT NULL,
            gateway_refs TEXT NOT NULL DEFAULT '{}',
            verified_by TEXT,
            verified_at TEXT,
            verification_notes TEXT,
            rejected_by TEXT,
            rejected_at TEXT,
            rejection_reason TEXT,
            created_at TEXT DEFAULT CURRENT_TIMESTAMP,
            updated_at TEXT DEFAULT CURRENT_TIMESTAMP
        )
        "#,
    )
    .execute(pool)
    .await?;
    Ok(())
}
