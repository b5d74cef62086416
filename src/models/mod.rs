//! Domain model types
//!
//! Event-owned configuration (`EventSnapshot` and its field definitions,
//! discount tiers and fees) is read-only input to this core: it is loaded
//! once per request and passed explicitly into the validators and pricing
//! engine, never read from ambient state.

pub mod batch;
pub mod event;
pub mod payment;
pub mod registration;
pub mod report;

pub use batch::{Batch, BatchStatus, PaymentMode, PaymentStatus};
pub use event::{DiscountTier, EventSnapshot, FieldConstraints, FieldDefinition, FieldType, School};
pub use payment::Payment;
pub use registration::{ExamResult, FieldValue, Registration, RegistrationStatus};
pub use report::{
    IngestReport, IngestSummary, ResultsReport, ResultsSummary, RowError, ValidatedRow,
};
