//! Spreadsheet ingestion: uploaded bytes → validated registration rows
//!
//! Accepts binary workbooks (xlsx/xls/ods via calamine) and delimited
//! text (via csv). Header errors abort the whole file before any row is
//! processed; row errors are collected without stopping subsequent rows,
//! so a partially-invalid file still yields its valid remainder. Error
//! reporting follows spreadsheet row order.

use crate::ingest::cells::cell_to_string;
use crate::models::{EventSnapshot, IngestReport, IngestSummary};
use crate::validators::{validate_headers, validate_row, HeaderMap, RowOutcome};
use crate::{Error, Result};
use calamine::{open_workbook_auto_from_rs, Reader, SheetVisible};
use std::io::Cursor;
use tracing::{debug, info};

/// Preferred worksheet name for registration uploads
const REGISTRATIONS_SHEET: &str = "Registrations";

/// Parse an upload into a string grid, sniffing the format
///
/// Workbooks start with the ZIP magic (`PK`) or the legacy OLE2 header;
/// everything else is treated as delimited text.
pub fn read_grid(bytes: &[u8]) -> Result<Vec<Vec<String>>> {
    if bytes.starts_with(b"PK") || bytes.starts_with(&[0xD0, 0xCF, 0x11, 0xE0]) {
        read_workbook(bytes)
    } else {
        read_delimited(bytes)
    }
}

fn read_workbook(bytes: &[u8]) -> Result<Vec<Vec<String>>> {
    let cursor = Cursor::new(bytes);
    let mut workbook = open_workbook_auto_from_rs(cursor)
        .map_err(|e| Error::InvalidInput(format!("Unreadable workbook: {}", e)))?;

    // Prefer a sheet named "Registrations", else first visible, else first
    let sheets = workbook.sheets_metadata().to_vec();
    if sheets.is_empty() {
        return Err(Error::InvalidInput("Workbook has no sheets".to_string()));
    }
    let sheet_name = sheets
        .iter()
        .find(|s| s.name.eq_ignore_ascii_case(REGISTRATIONS_SHEET))
        .or_else(|| sheets.iter().find(|s| s.visible == SheetVisible::Visible))
        .unwrap_or(&sheets[0])
        .name
        .clone();
    debug!("Reading worksheet '{}'", sheet_name);

    let range = workbook
        .worksheet_range(&sheet_name)
        .map_err(|e| Error::InvalidInput(format!("Unreadable worksheet: {}", e)))?;

    Ok(range
        .rows()
        .map(|row| row.iter().map(cell_to_string).collect())
        .collect())
}

fn read_delimited(bytes: &[u8]) -> Result<Vec<Vec<String>>> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(bytes);

    let mut grid = Vec::new();
    for record in reader.records() {
        let record =
            record.map_err(|e| Error::InvalidInput(format!("Unreadable CSV: {}", e)))?;
        grid.push(record.iter().map(|s| s.trim().to_string()).collect());
    }
    Ok(grid)
}

/// Validate an uploaded registration file against an event's schema
///
/// Returns the full report: valid rows (typed and ready for assembly),
/// per-row errors for the rest, and the summary counts. `summary.total`
/// excludes blank spacer rows and the template's sample row.
pub fn ingest_registrations(bytes: &[u8], event: &EventSnapshot) -> Result<IngestReport> {
    let grid = read_grid(bytes)?;
    if grid.is_empty() {
        return Err(Error::Header("The uploaded file is empty".to_string()));
    }

    let headers = HeaderMap::from_row(&grid[0]);
    validate_headers(&headers, &event.fields)?;

    let mut rows = Vec::new();
    let mut errors = Vec::new();
    let mut invalid = 0usize;

    for (index, cells) in grid.iter().enumerate().skip(1) {
        let row_number = (index + 1) as u32;
        match validate_row(row_number, cells, &headers, &event.fields) {
            RowOutcome::Valid(row) => rows.push(row),
            RowOutcome::Invalid(row_errors) => {
                invalid += 1;
                errors.extend(row_errors);
            }
            RowOutcome::Skipped => {}
        }
    }

    let summary = IngestSummary {
        total: rows.len() + invalid,
        valid: rows.len(),
        invalid,
    };
    info!(
        event_id = %event.id,
        total = summary.total,
        valid = summary.valid,
        invalid = summary.invalid,
        "Registration upload validated"
    );

    Ok(IngestReport {
        success: errors.is_empty() && summary.valid > 0,
        rows,
        errors,
        summary,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{FieldConstraints, FieldDefinition, FieldType};
    use std::collections::HashMap;

    fn event_with_parent_email() -> EventSnapshot {
        EventSnapshot {
            id: "evt-1".to_string(),
            code: "SCI24".to_string(),
            name: "Science Olympiad".to_string(),
            active: true,
            deadline: None,
            fields: vec![FieldDefinition {
                id: "parent_email".to_string(),
                label: "Parent Email".to_string(),
                field_type: FieldType::Email,
                required: true,
                options: Vec::new(),
                constraints: FieldConstraints::default(),
                order: 1,
            }],
            tiers: Vec::new(),
            fees: HashMap::new(),
        }
    }

    #[test]
    fn test_header_error_aborts_whole_file() {
        let csv = b"S.No,Student Name\n1,Asha\n";
        let err = ingest_registrations(csv, &event_with_parent_email()).unwrap_err();
        assert!(matches!(err, Error::Header(_)));
    }

    #[test]
    fn test_row_errors_do_not_stop_subsequent_rows() {
        let csv = b"S.No,Student Name*,Grade*,Section,Parent Email*\n\
            1,Asha Rao,5,A,asha@example.com\n\
            2,Ben Kim,6,B,\n\
            3,Chitra Nair,5,A,chitra@example.com\n";
        let report = ingest_registrations(csv, &event_with_parent_email()).unwrap();
        assert!(!report.success);
        assert_eq!(report.summary, IngestSummary { total: 3, valid: 2, invalid: 1 });
        assert_eq!(report.errors.len(), 1);
        assert_eq!(report.errors[0].row, 3);
        assert_eq!(report.errors[0].field, "Parent Email");
        assert_eq!(report.errors[0].message, "Parent Email is required");
    }

    #[test]
    fn test_blank_and_sample_rows_excluded_from_total() {
        let csv = b"S.No,Student Name*,Grade*,Section,Parent Email*\n\
            1,Sample Student,5,A,sample@example.com\n\
            ,,,,\n\
            2,Asha Rao,5,A,asha@example.com\n";
        let report = ingest_registrations(csv, &event_with_parent_email()).unwrap();
        assert!(report.success);
        assert_eq!(report.summary.total, 1);
        assert_eq!(report.rows[0].student_name, "Asha Rao");
    }

    #[test]
    fn test_errors_follow_row_order() {
        let csv = b"S.No,Student Name*,Grade*,Section,Parent Email*\n\
            1,Asha,5,A,bad\n\
            2,Ben,6,B,also-bad\n";
        let report = ingest_registrations(csv, &event_with_parent_email()).unwrap();
        let rows: Vec<u32> = report.errors.iter().map(|e| e.row).collect();
        assert_eq!(rows, vec![2, 3]);
    }
}
