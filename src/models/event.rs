//! Event-owned configuration: dynamic form schema, discount tiers, fees
//!
//! An event administrator defines the registration form at runtime; this
//! core treats the whole definition as an immutable snapshot.

use crate::{Error, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Closed set of dynamic field types
///
/// Validation dispatches on this tag (see `validators::field_types`);
/// adding a type means adding one validator arm, not a new class.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldType {
    Text,
    Textarea,
    Number,
    Email,
    Date,
    Select,
    Checkbox,
    /// External link (http/https); file fields are links, not uploads
    Url,
}

impl FieldType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::Textarea => "textarea",
            Self::Number => "number",
            Self::Email => "email",
            Self::Date => "date",
            Self::Select => "select",
            Self::Checkbox => "checkbox",
            Self::Url => "url",
        }
    }
}

impl std::str::FromStr for FieldType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "text" => Ok(Self::Text),
            "textarea" => Ok(Self::Textarea),
            "number" => Ok(Self::Number),
            "email" => Ok(Self::Email),
            "date" => Ok(Self::Date),
            "select" => Ok(Self::Select),
            "checkbox" => Ok(Self::Checkbox),
            "url" => Ok(Self::Url),
            other => Err(Error::Internal(format!("Unknown field type: {}", other))),
        }
    }
}

/// Optional per-field validation constraints
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FieldConstraints {
    /// Minimum numeric value (number fields)
    pub min: Option<f64>,
    /// Maximum numeric value (number fields)
    pub max: Option<f64>,
    /// Minimum text length (text/textarea fields)
    pub min_length: Option<usize>,
    /// Maximum text length (text/textarea fields)
    pub max_length: Option<usize>,
    /// Regex the value must match (text/textarea fields)
    pub pattern: Option<String>,
}

/// One dynamic form field declared by an event
///
/// `order` is the canonical column order for templates and validation;
/// ids are unique per event (enforced at snapshot load).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FieldDefinition {
    pub id: String,
    pub label: String,
    pub field_type: FieldType,
    pub required: bool,
    /// Declared options; required iff `field_type` is Select
    #[serde(default)]
    pub options: Vec<String>,
    #[serde(default)]
    pub constraints: FieldConstraints,
    pub order: i64,
}

/// Bulk-discount rule: `discount_percent` off once `min_students` is reached
///
/// Non-cumulative: the single tier with the largest qualifying
/// `min_students` wins. `min_students` is unique per event.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DiscountTier {
    pub min_students: u32,
    pub discount_percent: f64,
}

/// School identity; currency is fixed per school
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct School {
    pub id: String,
    pub name: String,
    pub currency: String,
}

/// Immutable per-request view of one event's configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventSnapshot {
    pub id: String,
    /// Short human-legible code used in batch references (e.g. "MATH24")
    pub code: String,
    pub name: String,
    pub active: bool,
    pub deadline: Option<DateTime<Utc>>,
    /// Dynamic form fields, sorted by `order`
    pub fields: Vec<FieldDefinition>,
    pub tiers: Vec<DiscountTier>,
    /// Unit fee per currency, in the currency's minor units
    pub fees: HashMap<String, i64>,
}

impl EventSnapshot {
    /// Whether the event currently accepts registrations
    pub fn accepts_registrations(&self, now: DateTime<Utc>) -> bool {
        self.active && self.deadline.map(|d| now <= d).unwrap_or(true)
    }

    /// Unit fee for a currency, in minor units
    pub fn unit_fee(&self, currency: &str) -> Option<i64> {
        self.fees.get(currency).copied()
    }

    /// Check structural invariants: unique field ids, unique tier minimums,
    /// options present on every select field
    pub fn validate(&self) -> Result<()> {
        let mut ids = std::collections::HashSet::new();
        for field in &self.fields {
            if !ids.insert(field.id.as_str()) {
                return Err(Error::InvalidInput(format!(
                    "Duplicate field id '{}' in event {}",
                    field.id, self.id
                )));
            }
            if field.field_type == FieldType::Select && field.options.is_empty() {
                return Err(Error::InvalidInput(format!(
                    "Select field '{}' declares no options",
                    field.id
                )));
            }
        }
        let mut minimums = std::collections::HashSet::new();
        for tier in &self.tiers {
            if tier.min_students < 1 {
                return Err(Error::InvalidInput(
                    "Discount tier min_students must be >= 1".to_string(),
                ));
            }
            if !(0.0..=100.0).contains(&tier.discount_percent) {
                return Err(Error::InvalidInput(
                    "Discount percent must be within [0, 100]".to_string(),
                ));
            }
            if !minimums.insert(tier.min_students) {
                return Err(Error::InvalidInput(format!(
                    "Duplicate discount tier at {} students",
                    tier.min_students
                )));
            }
        }
        Ok(())
    }
}
