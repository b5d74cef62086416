//! Ingestion reports: per-row errors returned as data, never thrown

use crate::models::registration::FieldValue;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One rejected cell: spreadsheet row (1-based, header is row 1), the
/// offending field's label, and a user-facing message
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RowError {
    pub row: u32,
    pub field: String,
    pub message: String,
}

impl RowError {
    pub fn new(row: u32, field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            row,
            field: field.into(),
            message: message.into(),
        }
    }
}

/// A spreadsheet row that passed schema validation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidatedRow {
    pub row: u32,
    pub student_name: String,
    pub grade: String,
    pub section: Option<String>,
    /// Values coerced to typed primitives; keys are field definition ids
    pub dynamic_data: BTreeMap<String, FieldValue>,
}

/// Row counts for one ingestion attempt; `total` excludes blank spacer
/// and sample rows
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IngestSummary {
    pub total: usize,
    pub valid: usize,
    pub invalid: usize,
}

/// Outcome of validating one registration upload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngestReport {
    /// True when every data row validated cleanly
    pub success: bool,
    pub rows: Vec<ValidatedRow>,
    pub errors: Vec<RowError>,
    pub summary: IngestSummary,
}

/// Row counts for one results upload
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResultsSummary {
    /// Data rows in the file (blank rows excluded)
    pub total: usize,
    /// Rows whose registration id exists for the event
    pub matched: usize,
    /// Rows whose stored result actually changed
    pub updated: usize,
}

/// Outcome of one bulk results ingestion
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResultsReport {
    pub success: bool,
    pub errors: Vec<RowError>,
    pub summary: ResultsSummary,
}
