//! Per-type field validators
//!
//! Each validator takes a trimmed raw string and returns either a value
//! coerced to its typed primitive or a failure reason. Failures are plain
//! data, never errors, so the schema validator can aggregate every problem
//! in a row instead of short-circuiting on the first one.

use crate::models::registration::DATE_FORMAT;
use crate::models::{FieldDefinition, FieldType, FieldValue};
use chrono::NaiveDate;
use once_cell::sync::Lazy;
use regex::Regex;
use url::Url;

static EMAIL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s.]+$").unwrap());

/// Validate one raw cell value against its field definition
///
/// `raw` must be trimmed and non-empty; required/empty handling is the
/// schema validator's job.
pub fn validate_value(field: &FieldDefinition, raw: &str) -> Result<FieldValue, String> {
    match field.field_type {
        FieldType::Text | FieldType::Textarea => validate_text(field, raw),
        FieldType::Number => validate_number(field, raw),
        FieldType::Email => validate_email(field, raw),
        FieldType::Date => validate_date(field, raw),
        FieldType::Select => validate_select(field, raw),
        FieldType::Checkbox => validate_checkbox(field, raw),
        FieldType::Url => validate_url(field, raw),
    }
}

fn validate_text(field: &FieldDefinition, raw: &str) -> Result<FieldValue, String> {
    let length = raw.chars().count();
    if let Some(min) = field.constraints.min_length {
        if length < min {
            return Err(format!(
                "{} must be at least {} characters",
                field.label, min
            ));
        }
    }
    if let Some(max) = field.constraints.max_length {
        if length > max {
            return Err(format!(
                "{} must be at most {} characters",
                field.label, max
            ));
        }
    }
    if let Some(pattern) = &field.constraints.pattern {
        let re = Regex::new(pattern)
            .map_err(|_| format!("{} has an invalid validation pattern", field.label))?;
        if !re.is_match(raw) {
            return Err(format!("{} has an invalid format", field.label));
        }
    }
    Ok(FieldValue::Text(raw.to_string()))
}

fn validate_number(field: &FieldDefinition, raw: &str) -> Result<FieldValue, String> {
    let value: f64 = raw
        .parse()
        .map_err(|_| format!("{} must be a number", field.label))?;
    if !value.is_finite() {
        return Err(format!("{} must be a number", field.label));
    }
    if let Some(min) = field.constraints.min {
        if value < min {
            return Err(format!("{} must be at least {}", field.label, min));
        }
    }
    if let Some(max) = field.constraints.max {
        if value > max {
            return Err(format!("{} must be at most {}", field.label, max));
        }
    }
    Ok(FieldValue::Number(value))
}

fn validate_email(field: &FieldDefinition, raw: &str) -> Result<FieldValue, String> {
    if EMAIL_RE.is_match(raw) {
        Ok(FieldValue::Text(raw.to_string()))
    } else {
        Err(format!("{} must be a valid email address", field.label))
    }
}

/// DD/MM/YYYY, semantically valid: parsing through NaiveDate rejects
/// impossible dates like 31/02
fn validate_date(field: &FieldDefinition, raw: &str) -> Result<FieldValue, String> {
    NaiveDate::parse_from_str(raw, DATE_FORMAT)
        .map(FieldValue::Date)
        .map_err(|_| {
            format!(
                "{} must be a valid date in DD/MM/YYYY format",
                field.label
            )
        })
}

/// Case-insensitive option match, normalized to the declared casing
fn validate_select(field: &FieldDefinition, raw: &str) -> Result<FieldValue, String> {
    field
        .options
        .iter()
        .find(|option| option.eq_ignore_ascii_case(raw))
        .map(|option| FieldValue::Text(option.clone()))
        .ok_or_else(|| {
            format!(
                "{} must be one of: {}",
                field.label,
                field.options.join(", ")
            )
        })
}

fn validate_checkbox(field: &FieldDefinition, raw: &str) -> Result<FieldValue, String> {
    match raw.to_ascii_lowercase().as_str() {
        "yes" | "true" | "1" => Ok(FieldValue::Bool(true)),
        "no" | "false" | "0" => Ok(FieldValue::Bool(false)),
        _ => Err(format!("{} must be Yes or No", field.label)),
    }
}

fn validate_url(field: &FieldDefinition, raw: &str) -> Result<FieldValue, String> {
    match Url::parse(raw) {
        Ok(url) if (url.scheme() == "http" || url.scheme() == "https") && url.has_host() => {
            Ok(FieldValue::Text(raw.to_string()))
        }
        _ => Err(format!("{} must be a valid http(s) URL", field.label)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::FieldConstraints;

    fn field(field_type: FieldType) -> FieldDefinition {
        FieldDefinition {
            id: "f1".to_string(),
            label: "Test Field".to_string(),
            field_type,
            required: true,
            options: Vec::new(),
            constraints: FieldConstraints::default(),
            order: 1,
        }
    }

    #[test]
    fn test_text_length_bounds() {
        let mut f = field(FieldType::Text);
        f.constraints.min_length = Some(3);
        f.constraints.max_length = Some(5);
        assert!(validate_value(&f, "ab").is_err());
        assert!(validate_value(&f, "abcdef").is_err());
        assert_eq!(
            validate_value(&f, "abcd").unwrap(),
            FieldValue::Text("abcd".to_string())
        );
    }

    #[test]
    fn test_text_pattern() {
        let mut f = field(FieldType::Text);
        f.constraints.pattern = Some(r"^[A-Z]{2}\d{4}$".to_string());
        assert!(validate_value(&f, "AB1234").is_ok());
        assert!(validate_value(&f, "ab1234").is_err());
    }

    #[test]
    fn test_invalid_pattern_is_a_failure_not_a_panic() {
        let mut f = field(FieldType::Text);
        f.constraints.pattern = Some("([unclosed".to_string());
        let err = validate_value(&f, "anything").unwrap_err();
        assert!(err.contains("invalid validation pattern"));
    }

    #[test]
    fn test_number_parse_and_bounds() {
        let mut f = field(FieldType::Number);
        f.constraints.min = Some(1.0);
        f.constraints.max = Some(12.0);
        assert_eq!(
            validate_value(&f, "7").unwrap(),
            FieldValue::Number(7.0)
        );
        assert!(validate_value(&f, "0").is_err());
        assert!(validate_value(&f, "13").is_err());
        assert!(validate_value(&f, "seven").is_err());
    }

    #[test]
    fn test_email() {
        let f = field(FieldType::Email);
        assert!(validate_value(&f, "parent@example.com").is_ok());
        assert!(validate_value(&f, "no-at-sign.com").is_err());
        assert!(validate_value(&f, "user@nodot").is_err());
        assert!(validate_value(&f, "two words@example.com").is_err());
    }

    #[test]
    fn test_date_round_trip_rejects_impossible_dates() {
        let f = field(FieldType::Date);
        assert_eq!(
            validate_value(&f, "29/02/2024").unwrap(),
            FieldValue::Date(NaiveDate::from_ymd_opt(2024, 2, 29).unwrap())
        );
        assert!(validate_value(&f, "31/02/2024").is_err());
        assert!(validate_value(&f, "2024-02-28").is_err());
        assert!(validate_value(&f, "28/13/2024").is_err());
    }

    #[test]
    fn test_select_case_insensitive_normalizes_casing() {
        let mut f = field(FieldType::Select);
        f.options = vec!["Small".to_string(), "Large".to_string()];
        assert_eq!(
            validate_value(&f, "small").unwrap(),
            FieldValue::Text("Small".to_string())
        );
        assert!(validate_value(&f, "medium").is_err());
    }

    #[test]
    fn test_checkbox_accepted_spellings() {
        let f = field(FieldType::Checkbox);
        for yes in ["yes", "Yes", "TRUE", "1"] {
            assert_eq!(validate_value(&f, yes).unwrap(), FieldValue::Bool(true));
        }
        for no in ["no", "No", "false", "0"] {
            assert_eq!(validate_value(&f, no).unwrap(), FieldValue::Bool(false));
        }
        assert!(validate_value(&f, "maybe").is_err());
    }

    #[test]
    fn test_url_requires_absolute_http() {
        let f = field(FieldType::Url);
        assert!(validate_value(&f, "https://example.com/doc.pdf").is_ok());
        assert!(validate_value(&f, "http://example.com").is_ok());
        assert!(validate_value(&f, "ftp://example.com/file").is_err());
        assert!(validate_value(&f, "example.com/doc").is_err());
    }
}
