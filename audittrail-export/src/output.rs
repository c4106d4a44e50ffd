//! CSV output for audit trail exports
//!
//! Rows are written to a temporary file next to the destination and moved into
//! place by [`CsvExport::finish`]. A run that fails before that point leaves no
//! file at the destination.
use crate::error::Result;
use crate::row::{CSV_HEADERS, ExportRow};
use audittrail_api::AuditEvent;
use log::{debug, info};
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

/// CSV file being written for one export run
pub struct CsvExport {
    writer: csv::Writer<NamedTempFile>,
    destination: PathBuf,
    rows: usize,
}

impl CsvExport {
    /// Create the parent directory if needed, open a temporary file beside the
    /// destination and write the header row.
    ///
    /// # Errors
    ///
    /// Returns error if the directory or temporary file cannot be created, or if
    /// the header cannot be written.
    pub fn create(destination: &Path) -> Result<Self> {
        let parent = match destination.parent() {
            Some(dir) if !dir.as_os_str().is_empty() => dir,
            _ => Path::new("."),
        };
        fs::create_dir_all(parent)?;

        let temp = tempfile::Builder::new()
            .prefix(".audittrail-export-")
            .suffix(".csv.tmp")
            .tempfile_in(parent)?;
        debug!(
            "Writing CSV to temporary file {} for {}",
            temp.path().display(),
            destination.display()
        );

        let mut writer = csv::Writer::from_writer(temp);
        writer.write_record(CSV_HEADERS)?;

        Ok(Self {
            writer,
            destination: destination.to_path_buf(),
            rows: 0,
        })
    }

    /// Append one row per event, preserving order
    ///
    /// # Errors
    ///
    /// Returns error if a record cannot be written.
    pub fn write_events(&mut self, events: &[AuditEvent]) -> Result<()> {
        for event in events {
            let row = ExportRow::from(event);
            self.writer.write_record(row.to_record())?;
        }
        self.rows += events.len();
        Ok(())
    }

    /// Number of data rows written so far
    #[must_use]
    pub fn rows(&self) -> usize {
        self.rows
    }

    /// Flush the CSV and move it to the destination, replacing any existing file
    ///
    /// # Errors
    ///
    /// Returns error if flushing, syncing or renaming fails; the temporary file
    /// is removed in that case.
    pub fn finish(self) -> Result<PathBuf> {
        let temp = self.writer.into_inner().map_err(|e| e.into_error())?;
        temp.as_file().sync_all()?;
        temp.persist(&self.destination).map_err(|e| e.error)?;

        info!(
            "Wrote {} audit events to {}",
            self.rows,
            self.destination.display()
        );
        Ok(self.destination)
    }
}
