//! Payment persistence

use crate::db::batches::parse_timestamp;
use crate::models::{Payment, PaymentStatus};
use crate::{Error, Result};
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};
use std::collections::BTreeMap;
use std::str::FromStr;

pub(crate) fn payment_from_row(row: &SqliteRow) -> Result<Payment> {
    let status: String = row.get("status");
    let gateway_refs: String = row.get("gateway_refs");
    let gateway_refs: BTreeMap<String, String> = serde_json::from_str(&gateway_refs)
        .map_err(|e| Error::Internal(format!("Failed to parse gateway_refs: {}", e)))?;

    Ok(Payment {
        batch_reference: row.get("batch_reference"),
        school_id: row.get("school_id"),
        event_id: row.get("event_id"),
        amount: row.get("amount"),
        currency: row.get("currency"),
        status: PaymentStatus::from_str(&status)?,
        gateway_refs,
        verified_by: row.get("verified_by"),
        verified_at: parse_timestamp(row.get("verified_at"))?,
        verification_notes: row.get("verification_notes"),
        rejected_by: row.get("rejected_by"),
        rejected_at: parse_timestamp(row.get("rejected_at"))?,
        rejection_reason: row.get("rejection_reason"),
    })
}

/// Load the payment attached to a batch
pub async fn load_payment(pool: &SqlitePool, batch_reference: &str) -> Result<Option<Payment>> {
    let row = sqlx::query("SELECT * FROM payments WHERE batch_reference = ?")
        .bind(batch_reference)
        .fetch_optional(pool)
        .await?;

    match row {
        Some(row) => Ok(Some(payment_from_row(&row)?)),
        None => Ok(None),
    }
}

/// Record gateway references handed back by the payment gateway
pub async fn record_gateway_refs(
    pool: &SqlitePool,
    batch_reference: &str,
    refs: &BTreeMap<String, String>,
) -> Result<()> {
    let existing = load_payment(pool, batch_reference)
        .await?
        .ok_or_else(|| Error::NotFound(format!("Payment not found: {}", batch_reference)))?;

    let mut merged = existing.gateway_refs;
    merged.extend(refs.iter().map(|(k, v)| (k.clone(), v.clone())));
    let merged_json = serde_json::to_string(&merged)
        .map_err(|e| Error::Internal(format!("Failed to serialize gateway_refs: {}", e)))?;

    sqlx::query(
        "UPDATE payments SET gateway_refs = ?, updated_at = CURRENT_TIMESTAMP WHERE batch_reference = ?",
    )
    .bind(merged_json)
    .bind(batch_reference)
    .execute(pool)
    .await?;
    Ok(())
}
