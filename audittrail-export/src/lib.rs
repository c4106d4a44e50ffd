//! audittrail-export library - CSV export of audit trail events
//!
//! This library validates export settings, pages through the audit trail API
//! and writes the matching events to a CSV file.
pub mod cli;
pub mod config;
pub mod datetime;
pub mod error;
pub mod export;
pub mod output;
pub mod row;

// Re-export commonly used types
pub use config::ExportConfig;
pub use error::{ConfigError, ExportError, Result};
pub use export::{ExportSummary, collect_events, paginate, run_export};
pub use row::{CSV_HEADERS, ExportRow};
