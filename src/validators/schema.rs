//! Schema validation for one spreadsheet row
//!
//! Headers are matched case-insensitively with a trailing `*` stripped
//! (templates mark required columns as `Label*`). Field values resolve by
//! label first, falling back to field id. All field errors for a row are
//! aggregated; nothing short-circuits.

use crate::models::{FieldDefinition, RowError, ValidatedRow};
use crate::validators::field_types::validate_value;
use crate::{Error, Result};
use std::collections::BTreeMap;
use std::collections::HashMap;

/// Baseline columns every registration sheet must carry
pub const SEQUENCE_HEADER: &str = "S.No";
pub const STUDENT_NAME_HEADER: &str = "Student Name";
pub const GRADE_HEADER: &str = "Grade";
pub const SECTION_HEADER: &str = "Section";

/// Normalize a header cell for matching: trim, drop the required-marker
/// asterisk, lowercase
pub fn normalize_header(header: &str) -> String {
    header.trim().trim_end_matches('*').trim().to_lowercase()
}

/// Case-insensitive header → column index lookup
#[derive(Debug, Clone)]
pub struct HeaderMap {
    index: HashMap<String, usize>,
}

impl HeaderMap {
    pub fn from_row(headers: &[String]) -> Self {
        let mut index = HashMap::new();
        for (col, header) in headers.iter().enumerate() {
            let key = normalize_header(header);
            if !key.is_empty() {
                // First occurrence wins on duplicate headers
                index.entry(key).or_insert(col);
            }
        }
        Self { index }
    }

    pub fn column(&self, header: &str) -> Option<usize> {
        self.index.get(&normalize_header(header)).copied()
    }
}

/// Outcome of validating one data row
#[derive(Debug)]
pub enum RowOutcome {
    Valid(ValidatedRow),
    Invalid(Vec<RowError>),
    /// Blank spacer or the template's sample row; silently ignored
    Skipped,
}

/// Validate sheet structure once per file, before any row is processed
///
/// Every required field must be resolvable by label or id, and the
/// baseline columns must be present. Failure aborts the whole file.
pub fn validate_headers(headers: &HeaderMap, fields: &[FieldDefinition]) -> Result<()> {
    let mut missing = Vec::new();

    for baseline in [SEQUENCE_HEADER, STUDENT_NAME_HEADER, GRADE_HEADER] {
        if headers.column(baseline).is_none() {
            missing.push(baseline.to_string());
        }
    }

    for field in fields.iter().filter(|f| f.required) {
        if headers.column(&field.label).is_none() && headers.column(&field.id).is_none() {
            missing.push(field.label.clone());
        }
    }

    if missing.is_empty() {
        Ok(())
    } else {
        Err(Error::Header(format!(
            "Missing required columns: {}",
            missing.join(", ")
        )))
    }
}

fn cell<'a>(cells: &'a [String], col: Option<usize>) -> &'a str {
    col.and_then(|c| cells.get(c))
        .map(|s| s.trim())
        .unwrap_or("")
}

/// Validate one data row against the event's ordered field definitions
///
/// `row_number` is the 1-based spreadsheet row (header is row 1) so users
/// can map errors back to their file.
pub fn validate_row(
    row_number: u32,
    cells: &[String],
    headers: &HeaderMap,
    fields: &[FieldDefinition],
) -> RowOutcome {
    let student_name = cell(cells, headers.column(STUDENT_NAME_HEADER));
    let grade = cell(cells, headers.column(GRADE_HEADER));
    let section = cell(cells, headers.column(SECTION_HEADER));

    // Blank spacer rows and the template's example row are not data
    if student_name.is_empty() && grade.is_empty() && section.is_empty() {
        return RowOutcome::Skipped;
    }
    if student_name.to_lowercase().contains("sample") {
        return RowOutcome::Skipped;
    }

    let mut errors = Vec::new();

    // Student name and grade are checked regardless of schema
    if student_name.is_empty() {
        errors.push(RowError::new(
            row_number,
            STUDENT_NAME_HEADER,
            format!("{} is required", STUDENT_NAME_HEADER),
        ));
    }
    if grade.is_empty() {
        errors.push(RowError::new(
            row_number,
            GRADE_HEADER,
            format!("{} is required", GRADE_HEADER),
        ));
    }

    let mut dynamic_data = BTreeMap::new();
    for field in fields {
        let column = headers
            .column(&field.label)
            .or_else(|| headers.column(&field.id));
        let raw = cell(cells, column);

        if raw.is_empty() {
            if field.required {
                errors.push(RowError::new(
                    row_number,
                    field.label.clone(),
                    format!("{} is required", field.label),
                ));
            }
            // Optional and empty: omit the key entirely
            continue;
        }

        match validate_value(field, raw) {
            Ok(value) => {
                dynamic_data.insert(field.id.clone(), value);
            }
            Err(message) => {
                errors.push(RowError::new(row_number, field.label.clone(), message));
            }
        }
    }

    if errors.is_empty() {
        RowOutcome::Valid(ValidatedRow {
            row: row_number,
            student_name: student_name.to_string(),
            grade: grade.to_string(),
            section: if section.is_empty() {
                None
            } else {
                Some(section.to_string())
            },
            dynamic_data,
        })
    } else {
        RowOutcome::Invalid(errors)
    }
}
