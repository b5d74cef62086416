//! Batch lifecycle state machine
//!
//! Batch status: draft → submitted → {confirmed | cancelled}, with an
//! independent payment overlay pending → {completed | failed |
//! pending_verification → {completed | failed}}. Every transition checks
//! its preconditions before touching the store: an illegal transition is
//! a rejected `Precondition` error, never a silent no-op, and mutates
//! nothing. Status updates that span batch, payment and registrations run
//! in one transaction so the mirror invariant between
//! `Batch::payment_status` and `Payment::status` cannot be observed
//! broken.

use crate::db::batches::require_batch;
use crate::db::payments::load_payment;
use crate::db::unit_of_work::UnitOfWork;
use crate::models::{Batch, BatchStatus, PaymentMode, PaymentStatus};
use crate::{Error, Result};
use chrono::Utc;
use sqlx::SqlitePool;
use std::collections::BTreeMap;
use tracing::info;

/// draft → submitted, once batch and payment both exist
pub async fn submit(pool: &SqlitePool, reference: &str) -> Result<Batch> {
    let batch = require_batch(pool, reference).await?;
    if batch.status != BatchStatus::Draft {
        return Err(Error::Precondition(format!(
            "Batch {} cannot be submitted from status {}",
            reference,
            batch.status.as_str()
        )));
    }
    if load_payment(pool, reference).await?.is_none() {
        return Err(Error::Precondition(format!(
            "Batch {} has no payment record",
            reference
        )));
    }

    sqlx::query(
        "UPDATE batches SET status = ?, updated_at = CURRENT_TIMESTAMP WHERE reference = ?",
    )
    .bind(BatchStatus::Submitted.as_str())
    .bind(reference)
    .execute(pool)
    .await?;

    info!(%reference, "Batch submitted");
    require_batch(pool, reference).await
}

/// Offline payment proof received: pending → pending_verification
pub async fn flag_for_verification(pool: &SqlitePool, reference: &str) -> Result<Batch> {
    let batch = require_batch(pool, reference).await?;
    if batch.payment_mode != PaymentMode::Offline {
        return Err(Error::Precondition(format!(
            "Batch {} is not an offline-payment batch",
            reference
        )));
    }
    if batch.payment_status != PaymentStatus::Pending {
        return Err(Error::Precondition(format!(
            "Batch {} payment is {}, expected pending",
            reference,
            batch.payment_status.as_str()
        )));
    }

    let mut tx = pool.begin().await?;
    sqlx::query(
        "UPDATE batches SET payment_status = ?, updated_at = CURRENT_TIMESTAMP WHERE reference = ?",
    )
    .bind(PaymentStatus::PendingVerification.as_str())
    .bind(reference)
    .execute(&mut *tx)
    .await?;
    sqlx::query(
        "UPDATE payments SET status = ?, updated_at = CURRENT_TIMESTAMP WHERE batch_reference = ?",
    )
    .bind(PaymentStatus::PendingVerification.as_str())
    .bind(reference)
    .execute(&mut *tx)
    .await?;
    tx.commit().await?;

    require_batch(pool, reference).await
}

/// Online gateway success: payment completed, batch confirmed,
/// registrations bulk-flipped registered → confirmed
pub async fn record_online_payment(
    pool: &SqlitePool,
    reference: &str,
    gateway_refs: &BTreeMap<String, String>,
) -> Result<Batch> {
    let batch = require_batch(pool, reference).await?;
    if batch.payment_mode != PaymentMode::Online {
        return Err(Error::Precondition(format!(
            "Batch {} is not an online-payment batch",
            reference
        )));
    }
    if batch.payment_status != PaymentStatus::Pending {
        return Err(Error::Precondition(format!(
            "Batch {} payment is {}, expected pending",
            reference,
            batch.payment_status.as_str()
        )));
    }

    let payment = load_payment(pool, reference)
        .await?
        .ok_or_else(|| Error::NotFound(format!("Payment not found: {}", reference)))?;
    let mut merged = payment.gateway_refs;
    merged.extend(gateway_refs.iter().map(|(k, v)| (k.clone(), v.clone())));
    let merged_json = serde_json::to_string(&merged)
        .map_err(|e| Error::Internal(format!("Failed to serialize gateway_refs: {}", e)))?;

    let mut tx = pool.begin().await?;
    sqlx::query(
        r#"
        UPDATE batches
        SET status = ?, payment_status = ?, updated_at = CURRENT_TIMESTAMP
        WHERE reference = ?
        "#,
    )
    .bind(BatchStatus::Confirmed.as_str())
    .bind(PaymentStatus::Completed.as_str())
    .bind(reference)
    .execute(&mut *tx)
    .await?;
    sqlx::query(
        r#"
        UPDATE payments
        SET status = ?, gateway_refs = ?, updated_at = CURRENT_TIMESTAMP
        WHERE batch_reference = ?
        "#,
    )
    .bind(PaymentStatus::Completed.as_str())
    .bind(merged_json)
    .bind(reference)
    .execute(&mut *tx)
    .await?;
    confirm_registrations(&mut tx, reference).await?;
    tx.commit().await?;

    info!(%reference, "Online payment recorded, batch confirmed");
    require_batch(pool, reference).await
}

/// Admin verifies an offline payment: completed, verifier/date/notes
/// stamped identically on batch and payment, registrations confirmed
pub async fn verify_offline(
    pool: &SqlitePool,
    reference: &str,
    admin_id: &str,
    notes: Option<&str>,
) -> Result<Batch> {
    require_offline_pending(pool, reference, "verified").await?;
    let now = Utc::now().to_rfc3339();

    let mut tx = pool.begin().await?;
    sqlx::query(
        r#"
        UPDATE batches
        SET status = ?, payment_status = ?,
            verified_by = ?, verified_at = ?, verification_notes = ?,
            updated_at = CURRENT_TIMESTAMP
        WHERE reference = ?
        "#,
    )
    .bind(BatchStatus::Confirmed.as_str())
    .bind(PaymentStatus::Completed.as_str())
    .bind(admin_id)
    .bind(&now)
    .bind(notes)
    .bind(reference)
    .execute(&mut *tx)
    .await?;
    sqlx::query(
        r#"
        UPDATE payments
        SET status = ?, verified_by = ?, verified_at = ?, verification_notes = ?,
            updated_at = CURRENT_TIMESTAMP
        WHERE batch_reference = ?
        "#,
    )
    .bind(PaymentStatus::Completed.as_str())
    .bind(admin_id)
    .bind(&now)
    .bind(notes)
    .bind(reference)
    .execute(&mut *tx)
    .await?;
    confirm_registrations(&mut tx, reference).await?;
    tx.commit().await?;

    info!(%reference, %admin_id, "Offline payment verified, batch confirmed");
    require_batch(pool, reference).await
}

/// Admin rejects an offline payment: failed, rejector/date/reason stamped
/// identically on batch and payment
pub async fn reject_offline(
    pool: &SqlitePool,
    reference: &str,
    admin_id: &str,
    reason: &str,
) -> Result<Batch> {
    require_offline_pending(pool, reference, "rejected").await?;
    let now = Utc::now().to_rfc3339();

    let mut tx = pool.begin().await?;
    sqlx::query(
        r#"
        UPDATE batches
        SET payment_status = ?,
            rejected_by = ?, rejected_at = ?, rejection_reason = ?,
            updated_at = CURRENT_TIMESTAMP
        WHERE reference = ?
        "#,
    )
    .bind(PaymentStatus::Failed.as_str())
    .bind(admin_id)
    .bind(&now)
    .bind(reason)
    .bind(reference)
    .execute(&mut *tx)
    .await?;
    sqlx::query(
        r#"
        UPDATE payments
        SET status = ?, rejected_by = ?, rejected_at = ?, rejection_reason = ?,
            updated_at = CURRENT_TIMESTAMP
        WHERE batch_reference = ?
        "#,
    )
    .bind(PaymentStatus::Failed.as_str())
    .bind(admin_id)
    .bind(&now)
    .bind(reason)
    .bind(reference)
    .execute(&mut *tx)
    .await?;
    tx.commit().await?;

    info!(%reference, %admin_id, "Offline payment rejected");
    require_batch(pool, reference).await
}

/// Soft cancel: flags the batch cancelled with reason and time, flips its
/// registrations to cancelled, deletes nothing. Forbidden once the
/// payment is completed.
pub async fn cancel(pool: &SqlitePool, reference: &str, reason: &str) -> Result<Batch> {
    let batch = require_batch(pool, reference).await?;
    if batch.payment_status == PaymentStatus::Completed {
        return Err(Error::Precondition(format!(
            "Batch {} cannot be cancelled: payment already completed",
            reference
        )));
    }

    let mut tx = pool.begin().await?;
    sqlx::query(
        r#"
        UPDATE batches
        SET status = ?, cancelled_reason = ?, cancelled_at = ?,
            updated_at = CURRENT_TIMESTAMP
        WHERE reference = ?
        "#,
    )
    .bind(BatchStatus::Cancelled.as_str())
    .bind(reason)
    .bind(Utc::now().to_rfc3339())
    .bind(reference)
    .execute(&mut *tx)
    .await?;
    sqlx::query(
        r#"
        UPDATE registrations
        SET status = 'cancelled', updated_at = CURRENT_TIMESTAMP
        WHERE batch_reference = ?
        "#,
    )
    .bind(reference)
    .execute(&mut *tx)
    .await?;
    tx.commit().await?;

    info!(%reference, "Batch cancelled");
    require_batch(pool, reference).await
}

/// Hard delete: cascades to all child registrations and the payment
/// through the unit-of-work strategy. Rejected outright when a completed
/// payment exists; nothing is touched in that case.
pub async fn delete(pool: &SqlitePool, uow: &dyn UnitOfWork, reference: &str) -> Result<()> {
    let batch = require_batch(pool, reference).await?;
    let payment_completed = batch.payment_status == PaymentStatus::Completed
        || load_payment(pool, reference)
            .await?
            .map(|p| p.status == PaymentStatus::Completed)
            .unwrap_or(false);
    if payment_completed {
        return Err(Error::Precondition(format!(
            "Batch {} cannot be deleted: payment already completed",
            reference
        )));
    }

    uow.delete_batch(pool, reference).await?;
    info!(%reference, "Batch hard-deleted with registrations and payment");
    Ok(())
}

/// Common precondition for offline verification decisions
async fn require_offline_pending(
    pool: &SqlitePool,
    reference: &str,
    action: &str,
) -> Result<Batch> {
    let batch = require_batch(pool, reference).await?;
    if batch.payment_mode != PaymentMode::Offline {
        return Err(Error::Precondition(format!(
            "Batch {} cannot be {}: not an offline-payment batch",
            reference, action
        )));
    }
    match batch.payment_status {
        PaymentStatus::Pending | PaymentStatus::PendingVerification => Ok(batch),
        other => Err(Error::Precondition(format!(
            "Batch {} cannot be {}: payment is {}",
            reference,
            action,
            other.as_str()
        ))),
    }
}

async fn confirm_registrations(
    tx: &mut sqlx::Transaction<'_, sqlx::Sqlite>,
    reference: &str,
) -> Result<()> {
    sqlx::query(
        r#"
        UPDATE registrations
        SET status = 'confirmed', updated_at = CURRENT_TIMESTAMP
        WHERE batch_reference = ? AND status = 'registered'
        "#,
    )
    .bind(reference)
    .execute(&mut **tx)
    .await?;
    Ok(())
}
