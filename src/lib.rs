//! regbatch - bulk event-registration ingestion core
//!
//! Accepts uploaded registration spreadsheets, validates every row
//! against a per-event dynamic form schema, computes tiered bulk-discount
//! pricing, and commits each submission as one consistent unit: a Batch,
//! its per-student Registrations, and one Payment. A symmetric pipeline
//! ingests bulk exam results and reconciles them against existing
//! registrations.
//!
//! This crate is a library boundary: the surrounding application owns
//! auth, routing, file storage and gateway integration.

pub mod config;
pub mod db;
pub mod error;
pub mod ingest;
pub mod models;
pub mod pricing;
pub mod services;
pub mod validators;

pub use crate::config::Config;
pub use crate::error::{Error, Result};
