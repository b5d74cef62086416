//! Unit of Work: the transactional boundary around Batch + Registrations
//! + Payment
//!
//! The three-document write is a strategy so stores with and without
//! multi-document transactions share one call site:
//!
//! - `TransactionalUnitOfWork` wraps everything in one SQLite transaction
//!   (the primary path).
//! - `SequentialUnitOfWork` writes in the fixed order Registrations →
//!   Batch → Payment. A crash mid-sequence leaves orphaned children with
//!   no parent (detectable and cleanable) rather than a parent referencing
//!   missing children. Mid-sequence failures trigger compensating deletes;
//!   if compensation itself fails the error is a `Consistency` variant so
//!   an operator sees it.

use crate::models::{Batch, Payment, Registration};
use crate::{Error, Result};
use async_trait::async_trait;
use sqlx::{Sqlite, SqlitePool};
use tracing::{error, warn};

/// Strategy for atomically persisting and deleting a batch with its
/// child documents
#[async_trait]
pub trait UnitOfWork: Send + Sync {
    /// Persist registrations, batch and payment as one unit
    async fn persist_batch(
        &self,
        pool: &SqlitePool,
        batch: &Batch,
        registrations: &[Registration],
        payment: &Payment,
    ) -> Result<()>;

    /// Delete a batch with all child registrations and its payment as one
    /// unit; on any failure the prior state must remain intact or the
    /// error must be operator-visible
    async fn delete_batch(&self, pool: &SqlitePool, reference: &str) -> Result<()>;
}

async fn insert_registration<'e, E>(executor: E, reg: &Registration) -> Result<()>
where
    E: sqlx::Executor<'e, Database = Sqlite>,
{
    let dynamic_data = serde_json::to_string(&reg.dynamic_data)
        .map_err(|e| Error::Internal(format!("Failed to serialize dynamic_data: {}", e)))?;

    sqlx::query(
        r#"
        INSERT INTO registrations (
            id, batch_reference, event_id, school_id,
            student_name, grade, section, dynamic_data, status,
            result_score, result_rank, result_award, result_remarks
        ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&reg.id)
    .bind(&reg.batch_reference)
    .bind(&reg.event_id)
    .bind(&reg.school_id)
    .bind(&reg.student_name)
    .bind(&reg.grade)
    .bind(&reg.section)
    .bind(dynamic_data)
    .bind(reg.status.as_str())
    .bind(reg.result.as_ref().and_then(|r| r.score))
    .bind(reg.result.as_ref().and_then(|r| r.rank.map(|v| v as i64)))
    .bind(reg.result.as_ref().and_then(|r| r.award.clone()))
    .bind(reg.result.as_ref().and_then(|r| r.remarks.clone()))
    .execute(executor)
    .await?;
    Ok(())
}

async fn insert_batch<'e, E>(executor: E, batch: &Batch) -> Result<()>
where
    E: sqlx::Executor<'e, Database = Sqlite>,
{
    let registration_ids = serde_json::to_string(&batch.registration_ids)
        .map_err(|e| Error::Internal(format!("Failed to serialize registration_ids: {}", e)))?;
    let validation_errors = serde_json::to_string(&batch.validation_errors)
        .map_err(|e| Error::Internal(format!("Failed to serialize validation_errors: {}", e)))?;

    sqlx::query(
        r#"
        INSERT INTO batches (
            reference, school_id, event_id, registration_ids, total_students,
            base_amount, discount_percent, discount_amount, total_amount,
            currency, status, payment_status, payment_mode, validation_errors
        ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&batch.reference)
    .bind(&batch.school_id)
    .bind(&batch.event_id)
    .bind(registration_ids)
    .bind(batch.total_students as i64)
    .bind(batch.base_amount)
    .bind(batch.discount_percent)
    .bind(batch.discount_amount)
    .bind(batch.total_amount)
    .bind(&batch.currency)
    .bind(batch.status.as_str())
    .bind(batch.payment_status.as_str())
    .bind(batch.payment_mode.as_str())
    .bind(validation_errors)
    .execute(executor)
    .await?;
    Ok(())
}

async fn insert_payment<'e, E>(executor: E, payment: &Payment) -> Result<()>
where
    E: sqlx::Executor<'e, Database = Sqlite>,
{
    let gateway_refs = serde_json::to_string(&payment.gateway_refs)
        .map_err(|e| Error::Internal(format!("Failed to serialize gateway_refs: {}", e)))?;

    sqlx::query(
        r#"
        INSERT INTO payments (batch_reference, school_id, event_id, amount, currency, status, gateway_refs)
        VALUES (?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&payment.batch_reference)
    .bind(&payment.school_id)
    .bind(&payment.event_id)
    .bind(payment.amount)
    .bind(&payment.currency)
    .bind(payment.status.as_str())
    .bind(gateway_refs)
    .execute(executor)
    .await?;
    Ok(())
}

/// Primary path: one SQLite transaction around all three documents
pub struct TransactionalUnitOfWork;

#[async_trait]
impl UnitOfWork for TransactionalUnitOfWork {
    async fn persist_batch(
        &self,
        pool: &SqlitePool,
        batch: &Batch,
        registrations: &[Registration],
        payment: &Payment,
    ) -> Result<()> {
        let mut tx = pool.begin().await?;
        for reg in registrations {
            insert_registration(&mut *tx, reg).await?;
        }
        insert_batch(&mut *tx, batch).await?;
        insert_payment(&mut *tx, payment).await?;
        tx.commit().await?;
        Ok(())
    }

    async fn delete_batch(&self, pool: &SqlitePool, reference: &str) -> Result<()> {
        let mut tx = pool.begin().await?;
        sqlx::query("DELETE FROM payments WHERE batch_reference = ?")
            .bind(reference)
            .execute(&mut *tx)
            .await?;
        sqlx::query("DELETE FROM registrations WHERE batch_reference = ?")
            .bind(reference)
            .execute(&mut *tx)
            .await?;
        sqlx::query("DELETE FROM batches WHERE reference = ?")
            .bind(reference)
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;
        Ok(())
    }
}

/// Fallback path for stores without multi-document transactions:
/// fixed-order writes with compensating cleanup
pub struct SequentialUnitOfWork;

impl SequentialUnitOfWork {
    async fn remove_registrations(&self, pool: &SqlitePool, reference: &str) -> Result<()> {
        sqlx::query("DELETE FROM registrations WHERE batch_reference = ?")
            .bind(reference)
            .execute(pool)
            .await?;
        Ok(())
    }
}

#[async_trait]
impl UnitOfWork for SequentialUnitOfWork {
    async fn persist_batch(
        &self,
        pool: &SqlitePool,
        batch: &Batch,
        registrations: &[Registration],
        payment: &Payment,
    ) -> Result<()> {
        // Children first: a crash here leaves orphaned registrations with
        // no batch, never a batch referencing missing registrations
        for reg in registrations {
            if let Err(e) = insert_registration(pool, reg).await {
                warn!(reference = %batch.reference, "Registration write failed, compensating");
                self.remove_registrations(pool, &batch.reference).await?;
                return Err(e);
            }
        }

        if let Err(e) = insert_batch(pool, batch).await {
            warn!(reference = %batch.reference, "Batch write failed, compensating");
            self.remove_registrations(pool, &batch.reference).await?;
            return Err(e);
        }

        if let Err(e) = insert_payment(pool, payment).await {
            warn!(reference = %batch.reference, "Payment write failed, compensating");
            let batch_cleanup = sqlx::query("DELETE FROM batches WHERE reference = ?")
                .bind(&batch.reference)
                .execute(pool)
                .await;
            let reg_cleanup = self.remove_registrations(pool, &batch.reference).await;
            if batch_cleanup.is_err() || reg_cleanup.is_err() {
                error!(reference = %batch.reference, "Compensation failed after payment write error");
                return Err(Error::Consistency(format!(
                    "Batch {} partially written and cleanup failed; manual reconciliation required",
                    batch.reference
                )));
            }
            return Err(e);
        }

        Ok(())
    }

    async fn delete_batch(&self, pool: &SqlitePool, reference: &str) -> Result<()> {
        // Parent first: a crash mid-delete leaves orphaned children with
        // no batch, never a batch referencing deleted registrations
        sqlx::query("DELETE FROM batches WHERE reference = ?")
            .bind(reference)
            .execute(pool)
            .await?;

        if let Err(e) = sqlx::query("DELETE FROM payments WHERE batch_reference = ?")
            .bind(reference)
            .execute(pool)
            .await
        {
            error!(%reference, "Payment delete failed after batch delete");
            return Err(Error::Consistency(format!(
                "Batch {} deleted but its payment remains: {}",
                reference, e
            )));
        }

        if let Err(e) = sqlx::query("DELETE FROM registrations WHERE batch_reference = ?")
            .bind(reference)
            .execute(pool)
            .await
        {
            error!(%reference, "Registration delete failed after batch delete");
            return Err(Error::Consistency(format!(
                "Batch {} deleted but its registrations remain: {}",
                reference, e
            )));
        }

        Ok(())
    }
}
