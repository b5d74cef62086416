//! Upload ingestion: spreadsheet parsing, validation, templates, results

pub mod cells;
pub mod results;
pub mod session;
pub mod spreadsheet;
pub mod template;

pub use results::ingest_results;
pub use session::SessionCache;
pub use spreadsheet::ingest_registrations;
pub use template::{registration_template, results_template};
