//! Batch persistence

use crate::models::{Batch, BatchStatus, PaymentMode, PaymentStatus, RowError};
use crate::{Error, Result};
use chrono::{DateTime, Utc};
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};
use std::str::FromStr;

pub(crate) fn parse_timestamp(value: Option<String>) -> Result<Option<DateTime<Utc>>> {
    value
        .map(|s| chrono::DateTime::parse_from_rfc3339(&s))
        .transpose()
        .map_err(|e| Error::Internal(format!("Failed to parse timestamp: {}", e)))
        .map(|opt| opt.map(|dt| dt.with_timezone(&Utc)))
}

pub(crate) fn batch_from_row(row: &SqliteRow) -> Result<Batch> {
    let status: String = row.get("status");
    let payment_status: String = row.get("payment_status");
    let payment_mode: String = row.get("payment_mode");

    let registration_ids: String = row.get("registration_ids");
    let registration_ids: Vec<String> = serde_json::from_str(&registration_ids)
        .map_err(|e| Error::Internal(format!("Failed to parse registration_ids: {}", e)))?;

    let validation_errors: String = row.get("validation_errors");
    let validation_errors: Vec<RowError> = serde_json::from_str(&validation_errors)
        .map_err(|e| Error::Internal(format!("Failed to parse validation_errors: {}", e)))?;

    Ok(Batch {
        reference: row.get("reference"),
        school_id: row.get("school_id"),
        event_id: row.get("event_id"),
        registration_ids,
        total_students: row.get::<i64, _>("total_students") as u32,
        base_amount: row.get("base_amount"),
        discount_percent: row.get("discount_percent"),
        discount_amount: row.get("discount_amount"),
        total_amount: row.get("total_amount"),
        currency: row.get("currency"),
        status: BatchStatus::from_str(&status)?,
        payment_status: PaymentStatus::from_str(&payment_status)?,
        payment_mode: PaymentMode::from_str(&payment_mode)?,
        validation_errors,
        cancelled_reason: row.get("cancelled_reason"),
        cancelled_at: parse_timestamp(row.get("cancelled_at"))?,
        verified_by: row.get("verified_by"),
        verified_at: parse_timestamp(row.get("verified_at"))?,
        verification_notes: row.get("verification_notes"),
        rejected_by: row.get("rejected_by"),
        rejected_at: parse_timestamp(row.get("rejected_at"))?,
        rejection_reason: row.get("rejection_reason"),
    })
}

/// Load a batch by reference
pub async fn load_batch(pool: &SqlitePool, reference: &str) -> Result<Option<Batch>> {
    let row = sqlx::query("SELECT * FROM batches WHERE reference = ?")
        .bind(reference)
        .fetch_optional(pool)
        .await?;

    match row {
        Some(row) => Ok(Some(batch_from_row(&row)?)),
        None => Ok(None),
    }
}

/// Load a batch, failing with NotFound when absent
pub async fn require_batch(pool: &SqlitePool, reference: &str) -> Result<Batch> {
    load_batch(pool, reference)
        .await?
        .ok_or_else(|| Error::NotFound(format!("Batch not found: {}", reference)))
}

/// List batch references for a school+event pair, newest first
pub async fn list_batch_references(
    pool: &SqlitePool,
    school_id: &str,
    event_id: &str,
) -> Result<Vec<String>> {
    let rows = sqlx::query(
        r#"
        SELECT reference FROM batches
        WHERE school_id = ? AND event_id = ?
        ORDER BY created_at DESC
        "#,
    )
    .bind(school_id)
    .bind(event_id)
    .fetch_all(pool)
    .await?;

    Ok(rows.iter().map(|r| r.get("reference")).collect())
}
