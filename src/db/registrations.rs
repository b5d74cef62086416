//! Registration persistence

use crate::models::{ExamResult, FieldValue, Registration, RegistrationStatus};
use crate::{Error, Result};
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};
use std::collections::{BTreeMap, HashMap, HashSet};
use std::str::FromStr;

pub(crate) fn registration_from_row(row: &SqliteRow) -> Result<Registration> {
    let status: String = row.get("status");
    let dynamic_data: String = row.get("dynamic_data");
    let dynamic_data: BTreeMap<String, FieldValue> = serde_json::from_str(&dynamic_data)
        .map_err(|e| Error::Internal(format!("Failed to parse dynamic_data: {}", e)))?;

    let result = ExamResult {
        score: row.get("result_score"),
        rank: row.get::<Option<i64>, _>("result_rank").map(|r| r as u32),
        award: row.get("result_award"),
        remarks: row.get("result_remarks"),
    };

    Ok(Registration {
        id: row.get("id"),
        batch_reference: row.get("batch_reference"),
        event_id: row.get("event_id"),
        school_id: row.get("school_id"),
        student_name: row.get("student_name"),
        grade: row.get("grade"),
        section: row.get("section"),
        dynamic_data,
        status: RegistrationStatus::from_str(&status)?,
        result: if result.is_empty() { None } else { Some(result) },
    })
}

/// Load one registration by id
pub async fn load_registration(pool: &SqlitePool, id: &str) -> Result<Option<Registration>> {
    let row = sqlx::query("SELECT * FROM registrations WHERE id = ?")
        .bind(id)
        .fetch_optional(pool)
        .await?;

    match row {
        Some(row) => Ok(Some(registration_from_row(&row)?)),
        None => Ok(None),
    }
}

/// Load all registrations belonging to a batch
pub async fn load_registrations_for_batch(
    pool: &SqlitePool,
    batch_reference: &str,
) -> Result<Vec<Registration>> {
    let rows = sqlx::query("SELECT * FROM registrations WHERE batch_reference = ? ORDER BY id")
        .bind(batch_reference)
        .fetch_all(pool)
        .await?;

    rows.iter().map(registration_from_row).collect()
}

/// Load all registrations for an event (results-template generation)
pub async fn load_registrations_for_event(
    pool: &SqlitePool,
    event_id: &str,
) -> Result<Vec<Registration>> {
    let rows = sqlx::query("SELECT * FROM registrations WHERE event_id = ? ORDER BY id")
        .bind(event_id)
        .fetch_all(pool)
        .await?;

    rows.iter().map(registration_from_row).collect()
}

/// One existence query for results reconciliation: every registration id
/// known for the event
pub async fn load_ids_for_event(pool: &SqlitePool, event_id: &str) -> Result<HashSet<String>> {
    let rows = sqlx::query("SELECT id FROM registrations WHERE event_id = ?")
        .bind(event_id)
        .fetch_all(pool)
        .await?;

    Ok(rows.iter().map(|r| r.get("id")).collect())
}

/// Current result sub-documents for an event, keyed by registration id
///
/// Used to detect which incoming result rows actually change anything,
/// keeping bulk result application idempotent.
pub async fn load_results_for_event(
    pool: &SqlitePool,
    event_id: &str,
) -> Result<HashMap<String, ExamResult>> {
    let rows = sqlx::query(
        r#"
        SELECT id, result_score, result_rank, result_award, result_remarks
        FROM registrations
        WHERE event_id = ?
        "#,
    )
    .bind(event_id)
    .fetch_all(pool)
    .await?;

    Ok(rows
        .iter()
        .map(|row| {
            (
                row.get::<String, _>("id"),
                ExamResult {
                    score: row.get("result_score"),
                    rank: row.get::<Option<i64>, _>("result_rank").map(|r| r as u32),
                    award: row.get("result_award"),
                    remarks: row.get("result_remarks"),
                },
            )
        })
        .collect())
}

/// Apply result sub-documents inside one transaction, keyed by
/// registration id; applying the same input twice reproduces the same
/// end state
pub async fn apply_results(
    pool: &SqlitePool,
    updates: &[(String, ExamResult)],
) -> Result<()> {
    let mut tx = pool.begin().await?;
    for (id, result) in updates {
        sqlx::query(
            r#"
            UPDATE registrations
            SET result_score = ?,
                result_rank = ?,
                result_award = ?,
                result_remarks = ?,
                updated_at = CURRENT_TIMESTAMP
            WHERE id = ?
            "#,
        )
        .bind(result.score)
        .bind(result.rank.map(|r| r as i64))
        .bind(&result.award)
        .bind(&result.remarks)
        .bind(id)
        .execute(&mut *tx)
        .await?;
    }
    tx.commit().await?;
    Ok(())
}

/// Count registrations for a batch (consistency checks in tests/tools)
pub async fn count_for_batch(pool: &SqlitePool, batch_reference: &str) -> Result<i64> {
    let count: i64 =
        sqlx::query_scalar("SELECT COUNT(*) FROM registrations WHERE batch_reference = ?")
            .bind(batch_reference)
            .fetch_one(pool)
            .await?;
    Ok(count)
}
