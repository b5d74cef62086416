//! End-to-end registration upload tests: CSV bytes in, typed report out

mod common;

use regbatch::ingest::{ingest_registrations, registration_template};
use regbatch::models::FieldValue;
use regbatch::Error;

fn upload(data_rows: &[&str]) -> Vec<u8> {
    let mut text = String::from(
        "S.No,Student Name*,Grade*,Section,Parent Email*,Date of Birth*,T-Shirt Size\n",
    );
    for row in data_rows {
        text.push_str(row);
        text.push('\n');
    }
    text.into_bytes()
}

#[test]
fn test_valid_upload_produces_typed_rows() {
    let event = common::science_event();
    let bytes = upload(&[
        "1,Asha Verma,5,A,asha@example.com,14/03/2014,Small",
        "2,Ben Thomas,6,B,ben@example.com,02/11/2013,",
    ]);

    let report = ingest_registrations(&bytes, &event).unwrap();
    assert!(report.success);
    assert!(report.errors.is_empty());
    assert_eq!(report.summary.total, 2);
    assert_eq!(report.summary.valid, 2);
    assert_eq!(report.summary.invalid, 0);

    // Header is row 1, first data row is row 2
    assert_eq!(report.rows[0].row, 2);
    assert_eq!(report.rows[0].student_name, "Asha Verma");
    assert_eq!(report.rows[0].section.as_deref(), Some("A"));

    // Values are coerced to typed primitives keyed by field id
    assert!(matches!(
        report.rows[0].dynamic_data.get("parent_email"),
        Some(FieldValue::Text(v)) if v == "asha@example.com"
    ));
    assert!(matches!(
        report.rows[0].dynamic_data.get("dob"),
        Some(FieldValue::Date(_))
    ));
    // Optional field left blank is omitted, not stored as empty
    assert!(!report.rows[1].dynamic_data.contains_key("tshirt"));
}

#[test]
fn test_invalid_cell_reported_on_spreadsheet_row() {
    let event = common::science_event();
    let bytes = upload(&[
        "1,Asha Verma,5,A,not-an-email,14/03/2014,Small",
        "2,Ben Thomas,6,B,ben@example.com,02/11/2013,Medium",
    ]);

    let report = ingest_registrations(&bytes, &event).unwrap();
    assert!(!report.success);
    assert_eq!(report.summary.total, 2);
    assert_eq!(report.summary.valid, 1);
    assert_eq!(report.summary.invalid, 1);
    assert_eq!(report.errors.len(), 1);
    assert_eq!(report.errors[0].row, 2);
    assert_eq!(report.errors[0].field, "Parent Email");
    // The valid row still comes through
    assert_eq!(report.rows.len(), 1);
    assert_eq!(report.rows[0].student_name, "Ben Thomas");
}

#[test]
fn test_impossible_date_rejected() {
    let event = common::science_event();
    let bytes = upload(&["1,Asha Verma,5,A,asha@example.com,31/02/2014,"]);

    let report = ingest_registrations(&bytes, &event).unwrap();
    assert!(!report.success);
    assert_eq!(report.errors[0].field, "Date of Birth");
}

#[test]
fn test_missing_required_header_aborts_whole_file() {
    let event = common::science_event();
    let bytes = b"S.No,Student Name,Grade,Section\n1,Asha Verma,5,A\n";

    let err = ingest_registrations(bytes, &event).unwrap_err();
    match err {
        Error::Header(message) => {
            assert!(message.contains("Parent Email"));
            assert!(message.contains("Date of Birth"));
        }
        other => panic!("Expected Header error, got {:?}", other),
    }
}

#[test]
fn test_blank_and_sample_rows_excluded_from_counts() {
    let event = common::science_event();
    let bytes = upload(&[
        "1,Sample Student,5,A,parent@example.com,15/06/2015,Small",
        ",,,,,,",
        "2,Asha Verma,5,A,asha@example.com,14/03/2014,",
    ]);

    let report = ingest_registrations(&bytes, &event).unwrap();
    assert!(report.success);
    assert_eq!(report.summary.total, 1);
    assert_eq!(report.rows.len(), 1);
    // Row numbering reflects the original file positions
    assert_eq!(report.rows[0].row, 4);
}

#[test]
fn test_zero_data_rows_is_not_success() {
    let event = common::science_event();
    let bytes = upload(&[]);

    let report = ingest_registrations(&bytes, &event).unwrap();
    assert!(!report.success);
    assert_eq!(report.summary.total, 0);
}

// A file filled in from the generated template must validate cleanly and
// carry every required field id in its dynamic data.
#[test]
fn test_template_round_trip() {
    let event = common::science_event();
    let template = String::from_utf8(registration_template(&event).unwrap()).unwrap();
    let filled = format!(
        "{}2,Asha Verma,5,A,asha@example.com,14/03/2014,Small\n",
        template
    );

    let report = ingest_registrations(filled.as_bytes(), &event).unwrap();
    assert!(report.success, "errors: {:?}", report.errors);
    assert_eq!(report.rows.len(), 1);

    let keys = &report.rows[0].dynamic_data;
    for field in event.fields.iter().filter(|f| f.required) {
        assert!(keys.contains_key(&field.id), "missing {}", field.id);
    }
}
