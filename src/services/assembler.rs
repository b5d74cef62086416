//! Batch assembly: validated rows + pricing → one persisted unit
//!
//! Combines validated rows and the event's pricing snapshot into one
//! Batch, one Registration per row and one Payment, written through the
//! injected unit-of-work strategy. All precondition checks run before any
//! write; a rejected assembly mutates nothing.

use crate::db::unit_of_work::UnitOfWork;
use crate::ingest::session::SessionCache;
use crate::models::{
    Batch, BatchStatus, EventSnapshot, Payment, PaymentMode, PaymentStatus, Registration,
    RegistrationStatus, School, ValidatedRow,
};
use crate::pricing::compute_total;
use crate::services::reference;
use crate::{Error, Result};
use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use std::collections::BTreeMap;
use tracing::info;
use uuid::Uuid;

/// The persisted unit: one batch, its registrations, its payment
#[derive(Debug)]
pub struct AssembledBatch {
    pub batch: Batch,
    pub registrations: Vec<Registration>,
    pub payment: Payment,
}

/// Assemble and persist a batch from validated rows
///
/// Rejected (no writes) when the event is not accepting registrations,
/// when no fee is configured for the school's currency, or when there
/// are zero valid rows.
pub async fn assemble_and_persist(
    pool: &SqlitePool,
    uow: &dyn UnitOfWork,
    event: &EventSnapshot,
    school: &School,
    rows: Vec<ValidatedRow>,
    payment_mode: PaymentMode,
    now: DateTime<Utc>,
) -> Result<AssembledBatch> {
    if !event.accepts_registrations(now) {
        return Err(Error::Precondition(format!(
            "Event {} is not currently accepting registrations",
            event.id
        )));
    }
    if rows.is_empty() {
        return Err(Error::Precondition(
            "Cannot create a batch with zero valid rows".to_string(),
        ));
    }
    let unit_fee = event.unit_fee(&school.currency).ok_or_else(|| {
        Error::Precondition(format!(
            "Event {} has no fee configured for currency {}",
            event.id, school.currency
        ))
    })?;

    let pricing = compute_total(rows.len() as u32, unit_fee, &event.tiers);
    let batch_ref = reference::batch_reference(&event.code, now);

    let registrations: Vec<Registration> = rows
        .into_iter()
        .enumerate()
        .map(|(index, row)| Registration {
            id: reference::registration_id(&batch_ref, index + 1),
            batch_reference: batch_ref.clone(),
            event_id: event.id.clone(),
            school_id: school.id.clone(),
            student_name: row.student_name,
            grade: row.grade,
            section: row.section,
            dynamic_data: row.dynamic_data,
            status: RegistrationStatus::Registered,
            result: None,
        })
        .collect();

    let batch = Batch {
        reference: batch_ref.clone(),
        school_id: school.id.clone(),
        event_id: event.id.clone(),
        registration_ids: registrations.iter().map(|r| r.id.clone()).collect(),
        total_students: registrations.len() as u32,
        base_amount: pricing.base_amount,
        discount_percent: pricing.discount_percent,
        discount_amount: pricing.discount_amount,
        total_amount: pricing.total_amount,
        currency: school.currency.clone(),
        status: BatchStatus::Draft,
        payment_status: PaymentStatus::Pending,
        payment_mode,
        validation_errors: Vec::new(),
        cancelled_reason: None,
        cancelled_at: None,
        verified_by: None,
        verified_at: None,
        verification_notes: None,
        rejected_by: None,
        rejected_at: None,
        rejection_reason: None,
    };

    let payment = Payment {
        batch_reference: batch_ref.clone(),
        school_id: school.id.clone(),
        event_id: event.id.clone(),
        amount: pricing.total_amount,
        currency: school.currency.clone(),
        status: PaymentStatus::Pending,
        gateway_refs: BTreeMap::new(),
        verified_by: None,
        verified_at: None,
        verification_notes: None,
        rejected_by: None,
        rejected_at: None,
        rejection_reason: None,
    };

    uow.persist_batch(pool, &batch, &registrations, &payment).await?;
    info!(
        reference = %batch_ref,
        students = registrations.len(),
        total = pricing.total_amount,
        currency = %school.currency,
        "Batch persisted"
    );

    Ok(AssembledBatch {
        batch,
        registrations,
        payment,
    })
}

/// Assemble a batch from a previously cached validation session
///
/// Skips re-validation when the token is known, unexpired and was issued
/// for the same event; otherwise the submission is rejected before any
/// writes.
pub async fn assemble_from_session(
    pool: &SqlitePool,
    uow: &dyn UnitOfWork,
    cache: &SessionCache,
    token: Uuid,
    event: &EventSnapshot,
    school: &School,
    payment_mode: PaymentMode,
    now: DateTime<Utc>,
) -> Result<AssembledBatch> {
    let rows = cache.take(token, &event.id).ok_or_else(|| {
        Error::Precondition("Validation session expired or unknown; please re-upload".to_string())
    })?;
    assemble_and_persist(pool, uow, event, school, rows, payment_mode, now).await
}
