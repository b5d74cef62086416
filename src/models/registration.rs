//! Registration records and the typed dynamic-data bag

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Date format used everywhere a date crosses an edge (cells, JSON, templates)
pub const DATE_FORMAT: &str = "%d/%m/%Y";

/// A dynamic field value, already coerced to its primitive at validation
/// time so downstream readers never type-sniff
///
/// Canonical in-memory forms: checkbox is `Bool`, date is `Date`; both are
/// converted to text only at the template/export edge.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Text(String),
    Number(f64),
    Bool(bool),
    Date(NaiveDate),
}

impl FieldValue {
    /// Render for spreadsheet/template edges (bool as Yes/No, date as
    /// DD/MM/YYYY, whole numbers without a decimal point)
    pub fn to_display_string(&self) -> String {
        match self {
            Self::Text(s) => s.clone(),
            Self::Number(n) if n.fract() == 0.0 && n.abs() < 1e15 => {
                format!("{}", *n as i64)
            }
            Self::Number(n) => n.to_string(),
            Self::Bool(true) => "Yes".to_string(),
            Self::Bool(false) => "No".to_string(),
            Self::Date(d) => d.format(DATE_FORMAT).to_string(),
        }
    }
}

impl Serialize for FieldValue {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Text(s) => serializer.serialize_str(s),
            Self::Number(n) => serializer.serialize_f64(*n),
            Self::Bool(b) => serializer.serialize_bool(*b),
            Self::Date(d) => serializer.serialize_str(&d.format(DATE_FORMAT).to_string()),
        }
    }
}

impl<'de> Deserialize<'de> for FieldValue {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = serde_json::Value::deserialize(deserializer)?;
        Ok(match value {
            serde_json::Value::Bool(b) => Self::Bool(b),
            serde_json::Value::Number(n) => Self::Number(n.as_f64().unwrap_or(0.0)),
            serde_json::Value::String(s) => match NaiveDate::parse_from_str(&s, DATE_FORMAT) {
                Ok(d) => Self::Date(d),
                Err(_) => Self::Text(s),
            },
            other => Self::Text(other.to_string()),
        })
    }
}

/// Registration status within a batch
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RegistrationStatus {
    Registered,
    Confirmed,
    Cancelled,
    Attended,
}

impl RegistrationStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Registered => "registered",
            Self::Confirmed => "confirmed",
            Self::Cancelled => "cancelled",
            Self::Attended => "attended",
        }
    }
}

impl std::str::FromStr for RegistrationStatus {
    type Err = crate::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "registered" => Ok(Self::Registered),
            "confirmed" => Ok(Self::Confirmed),
            "cancelled" => Ok(Self::Cancelled),
            "attended" => Ok(Self::Attended),
            other => Err(crate::Error::Internal(format!(
                "Unknown registration status: {}",
                other
            ))),
        }
    }
}

/// Exam result sub-document, set by bulk results ingestion
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExamResult {
    pub score: Option<f64>,
    pub rank: Option<u32>,
    pub award: Option<String>,
    pub remarks: Option<String>,
}

impl ExamResult {
    pub fn is_empty(&self) -> bool {
        self.score.is_none()
            && self.rank.is_none()
            && self.award.is_none()
            && self.remarks.is_none()
    }
}

/// One student's enrollment record within a batch
///
/// `dynamic_data` keys are a subset of the event's field definition ids.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Registration {
    pub id: String,
    pub batch_reference: String,
    pub event_id: String,
    pub school_id: String,
    pub student_name: String,
    pub grade: String,
    pub section: Option<String>,
    pub dynamic_data: BTreeMap<String, FieldValue>,
    pub status: RegistrationStatus,
    pub result: Option<ExamResult>,
}
