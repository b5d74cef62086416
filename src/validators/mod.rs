//! Row validation against per-event dynamic form schemas

pub mod field_types;
pub mod schema;

pub use field_types::validate_value;
pub use schema::{validate_headers, validate_row, HeaderMap, RowOutcome};
