//! Cell normalization at the ingestion boundary
//!
//! Spreadsheet-library cell representations (formula results, typed
//! numbers, serial dates) are leaky; everything is flattened to a plain
//! string here so validation only ever sees primitives.

use calamine::Data;
use chrono::NaiveDate;

/// Render one workbook cell as a trimmed plain string
///
/// Dates render as DD/MM/YYYY to match the validator's expected format;
/// whole-number floats drop the decimal point (Excel stores most numeric
/// cells as floats); error cells render empty so a `#REF!` never reaches
/// a validator as text.
pub fn cell_to_string(cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        Data::String(s) => s.trim().to_string(),
        Data::Int(i) => i.to_string(),
        Data::Float(f) if f.fract() == 0.0 && f.abs() < 1e15 => format!("{}", *f as i64),
        Data::Float(f) => f.to_string(),
        Data::Bool(b) => b.to_string(),
        Data::DateTime(dt) => dt
            .as_datetime()
            .map(|d| d.format("%d/%m/%Y").to_string())
            .unwrap_or_default(),
        Data::DateTimeIso(s) => iso_to_display_date(s),
        Data::DurationIso(s) => s.trim().to_string(),
        Data::Error(_) => String::new(),
    }
}

/// ISO-8601 date/datetime string → DD/MM/YYYY; passed through untouched
/// when the prefix is not a date
fn iso_to_display_date(s: &str) -> String {
    let date_part = s.split('T').next().unwrap_or(s);
    match NaiveDate::parse_from_str(date_part, "%Y-%m-%d") {
        Ok(d) => d.format("%d/%m/%Y").to_string(),
        Err(_) => s.trim().to_string(),
    }
}
