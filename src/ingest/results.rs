//! Bulk exam-results ingestion
//!
//! Parses a results file, validates rows, cross-checks registration ids
//! against the event with one existence query, and applies the survivors
//! as an idempotent bulk update of the result sub-document. Rows that
//! reference unknown registrations are dropped and reported, never
//! applied.

use crate::db::registrations::{apply_results, load_ids_for_event, load_results_for_event};
use crate::ingest::spreadsheet::read_grid;
use crate::models::{ExamResult, ResultsReport, ResultsSummary, RowError};
use crate::validators::HeaderMap;
use crate::{Error, Result};
use sqlx::SqlitePool;
use std::collections::HashSet;
use tracing::info;

const REGISTRATION_ID: &str = "Registration ID";
const SCORE: &str = "Score";
const RANK: &str = "Rank";
const AWARD: &str = "Award";
const REMARKS: &str = "Remarks";

struct ParsedRow {
    row_number: u32,
    registration_id: String,
    result: ExamResult,
}

fn cell<'a>(cells: &'a [String], col: Option<usize>) -> &'a str {
    col.and_then(|c| cells.get(c))
        .map(|s| s.trim())
        .unwrap_or("")
}

fn opt(raw: &str) -> Option<String> {
    if raw.is_empty() {
        None
    } else {
        Some(raw.to_string())
    }
}

/// Validate and apply a results upload for an event
pub async fn ingest_results(
    pool: &SqlitePool,
    event_id: &str,
    bytes: &[u8],
) -> Result<ResultsReport> {
    let grid = read_grid(bytes)?;
    if grid.is_empty() {
        return Err(Error::Header("The uploaded file is empty".to_string()));
    }

    let headers = HeaderMap::from_row(&grid[0]);
    if headers.column(REGISTRATION_ID).is_none() {
        return Err(Error::Header(format!(
            "Missing required column: {}",
            REGISTRATION_ID
        )));
    }

    let mut errors = Vec::new();
    let mut parsed = Vec::new();
    let mut seen_ids = HashSet::new();
    let mut total = 0usize;

    for (index, cells) in grid.iter().enumerate().skip(1) {
        let row_number = (index + 1) as u32;
        if cells.iter().all(|c| c.trim().is_empty()) {
            continue;
        }
        total += 1;

        let registration_id = cell(cells, headers.column(REGISTRATION_ID)).to_string();
        let mut row_errors = Vec::new();

        if registration_id.is_empty() {
            row_errors.push(RowError::new(
                row_number,
                REGISTRATION_ID,
                format!("{} is required", REGISTRATION_ID),
            ));
        } else if !seen_ids.insert(registration_id.clone()) {
            // Unique within the file: first occurrence wins
            row_errors.push(RowError::new(
                row_number,
                REGISTRATION_ID,
                format!("Duplicate {}: {}", REGISTRATION_ID, registration_id),
            ));
        }

        let score_raw = cell(cells, headers.column(SCORE));
        let score = if score_raw.is_empty() {
            None
        } else {
            match score_raw.parse::<f64>() {
                Ok(s) if s >= 0.0 && s.is_finite() => Some(s),
                _ => {
                    row_errors.push(RowError::new(
                        row_number,
                        SCORE,
                        format!("{} must be a non-negative number", SCORE),
                    ));
                    None
                }
            }
        };

        let rank_raw = cell(cells, headers.column(RANK));
        let rank = if rank_raw.is_empty() {
            None
        } else {
            match rank_raw.parse::<u32>() {
                Ok(r) if r >= 1 => Some(r),
                _ => {
                    row_errors.push(RowError::new(
                        row_number,
                        RANK,
                        format!("{} must be a positive integer", RANK),
                    ));
                    None
                }
            }
        };

        if row_errors.is_empty() {
            parsed.push(ParsedRow {
                row_number,
                registration_id,
                result: ExamResult {
                    score,
                    rank,
                    award: opt(cell(cells, headers.column(AWARD))),
                    remarks: opt(cell(cells, headers.column(REMARKS))),
                },
            });
        } else {
            errors.extend(row_errors);
        }
    }

    // One existence query for the whole file, not per row
    let known_ids = load_ids_for_event(pool, event_id).await?;
    let existing_results = load_results_for_event(pool, event_id).await?;

    let mut matched = 0usize;
    let mut changed = Vec::new();
    for row in parsed {
        if !known_ids.contains(&row.registration_id) {
            errors.push(RowError::new(
                row.row_number,
                REGISTRATION_ID,
                format!(
                    "{} {} not found for this event",
                    REGISTRATION_ID, row.registration_id
                ),
            ));
            continue;
        }
        matched += 1;
        let current = existing_results.get(&row.registration_id);
        if current != Some(&row.result) {
            changed.push((row.registration_id, row.result));
        }
    }

    let updated = changed.len();
    if !changed.is_empty() {
        apply_results(pool, &changed).await?;
    }

    // Keep error reporting in spreadsheet row order
    errors.sort_by_key(|e| e.row);

    let summary = ResultsSummary { total, matched, updated };
    info!(
        %event_id,
        total = summary.total,
        matched = summary.matched,
        updated = summary.updated,
        "Results upload applied"
    );

    Ok(ResultsReport {
        success: errors.is_empty(),
        errors,
        summary,
    })
}
