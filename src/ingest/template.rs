//! Downloadable templates
//!
//! Templates are generated from the same field definition list the
//! validator runs against, so the two can never diverge. The example row
//! uses a "Sample" student name, which the row-skip policy ignores on
//! re-upload.

use crate::models::{EventSnapshot, FieldDefinition, FieldType, Registration, RegistrationStatus};
use crate::validators::schema::{
    GRADE_HEADER, SECTION_HEADER, SEQUENCE_HEADER, STUDENT_NAME_HEADER,
};
use crate::{Error, Result};

/// Column headers for results files, identity columns first
pub const RESULTS_HEADERS: [&str; 7] = [
    "Registration ID",
    "Student Name",
    "Grade",
    "Score",
    "Rank",
    "Award",
    "Remarks",
];

fn header_label(field: &FieldDefinition) -> String {
    if field.required {
        format!("{}*", field.label)
    } else {
        field.label.clone()
    }
}

/// A plausible example value for the template's sample row
fn sample_value(field: &FieldDefinition) -> String {
    match field.field_type {
        FieldType::Text | FieldType::Textarea => "Sample text".to_string(),
        FieldType::Number => field
            .constraints
            .min
            .map(|m| m.to_string())
            .unwrap_or_else(|| "10".to_string()),
        FieldType::Email => "parent@example.com".to_string(),
        FieldType::Date => "15/06/2015".to_string(),
        FieldType::Select => field.options.first().cloned().unwrap_or_default(),
        FieldType::Checkbox => "Yes".to_string(),
        FieldType::Url => "https://example.com/document.pdf".to_string(),
    }
}

fn finish(writer: csv::Writer<Vec<u8>>) -> Result<Vec<u8>> {
    writer
        .into_inner()
        .map_err(|e| Error::Internal(format!("Template write failed: {}", e)))
}

/// Generate the registration upload template for an event
///
/// Baseline columns first, then the event's fields in canonical order;
/// required columns carry a `*` suffix. Includes one sample row.
pub fn registration_template(event: &EventSnapshot) -> Result<Vec<u8>> {
    let mut writer = csv::Writer::from_writer(Vec::new());

    let mut headers = vec![
        SEQUENCE_HEADER.to_string(),
        format!("{}*", STUDENT_NAME_HEADER),
        format!("{}*", GRADE_HEADER),
        SECTION_HEADER.to_string(),
    ];
    headers.extend(event.fields.iter().map(header_label));
    writer.write_record(&headers)?;

    let mut sample = vec![
        "1".to_string(),
        "Sample Student".to_string(),
        "5".to_string(),
        "A".to_string(),
    ];
    sample.extend(event.fields.iter().map(sample_value));
    writer.write_record(&sample)?;

    finish(writer)
}

/// Generate the results upload template for an event
///
/// One skeleton row per confirmed or attended registration, identity
/// columns filled and result columns blank.
pub fn results_template(registrations: &[Registration]) -> Result<Vec<u8>> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(RESULTS_HEADERS)?;

    for reg in registrations.iter().filter(|r| {
        matches!(
            r.status,
            RegistrationStatus::Confirmed | RegistrationStatus::Attended
        )
    }) {
        writer.write_record([
            reg.id.as_str(),
            reg.student_name.as_str(),
            reg.grade.as_str(),
            "",
            "",
            "",
            "",
        ])?;
    }

    finish(writer)
}

impl From<csv::Error> for Error {
    fn from(e: csv::Error) -> Self {
        Error::Internal(format!("CSV write failed: {}", e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{FieldConstraints, FieldDefinition};
    use std::collections::{BTreeMap, HashMap};

    fn event() -> EventSnapshot {
        EventSnapshot {
            id: "evt-1".to_string(),
            code: "SCI24".to_string(),
            name: "Science Olympiad".to_string(),
            active: true,
            deadline: None,
            fields: vec![
                FieldDefinition {
                    id: "parent_email".to_string(),
                    label: "Parent Email".to_string(),
                    field_type: FieldType::Email,
                    required: true,
                    options: Vec::new(),
                    constraints: FieldConstraints::default(),
                    order: 1,
                },
                FieldDefinition {
                    id: "tshirt".to_string(),
                    label: "T-Shirt Size".to_string(),
                    field_type: FieldType::Select,
                    required: false,
                    options: vec!["Small".to_string(), "Large".to_string()],
                    constraints: FieldConstraints::default(),
                    order: 2,
                },
            ],
            tiers: Vec::new(),
            fees: HashMap::new(),
        }
    }

    #[test]
    fn test_template_headers_mark_required_columns() {
        let bytes = registration_template(&event()).unwrap();
        let text = String::from_utf8(bytes).unwrap();
        let header_line = text.lines().next().unwrap();
        assert_eq!(
            header_line,
            "S.No,Student Name*,Grade*,Section,Parent Email*,T-Shirt Size"
        );
    }

    #[test]
    fn test_template_sample_row_would_be_skipped_on_upload() {
        let bytes = registration_template(&event()).unwrap();
        let text = String::from_utf8(bytes).unwrap();
        let sample_line = text.lines().nth(1).unwrap();
        assert!(sample_line.to_lowercase().contains("sample"));
    }

    #[test]
    fn test_results_template_filters_by_status() {
        let reg = |id: &str, status: RegistrationStatus| Registration {
            id: id.to_string(),
            batch_reference: "B1".to_string(),
            event_id: "evt-1".to_string(),
            school_id: "sch-1".to_string(),
            student_name: "Asha".to_string(),
            grade: "5".to_string(),
            section: None,
            dynamic_data: BTreeMap::new(),
            status,
            result: None,
        };
        let regs = vec![
            reg("R1", RegistrationStatus::Confirmed),
            reg("R2", RegistrationStatus::Registered),
            reg("R3", RegistrationStatus::Attended),
        ];
        let text = String::from_utf8(results_template(&regs).unwrap()).unwrap();
        assert!(text.contains("R1"));
        assert!(!text.contains("R2"));
        assert!(text.contains("R3"));
    }
}
