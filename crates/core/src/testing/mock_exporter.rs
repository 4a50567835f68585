//! Mock CSV exporter for testing.

use std::path::{Path, PathBuf};
use std::sync::Mutex;

use crate::export::{CsvExporter, ExportError};
use crate::sorter::CardRecord;

/// A recorded export for test assertions.
#[derive(Debug, Clone)]
pub struct RecordedExport {
    pub path: PathBuf,
    pub records: Vec<CardRecord>,
}

/// Mock implementation of the CsvExporter trait. Writes nothing.
#[derive(Debug, Default)]
pub struct MockCsvExporter {
    exports: Mutex<Vec<RecordedExport>>,
    /// If set, the next write fails with this reason.
    next_error: Mutex<Option<String>>,
}

impl MockCsvExporter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_next_error(&self, reason: impl Into<String>) {
        *self.next_error.lock().unwrap() = Some(reason.into());
    }

    pub fn recorded_exports(&self) -> Vec<RecordedExport> {
        self.exports.lock().unwrap().clone()
    }
}

impl CsvExporter for MockCsvExporter {
    fn name(&self) -> &str {
        "mock"
    }

    fn write(&self, records: &[CardRecord], path: &Path) -> Result<(), ExportError> {
        if let Some(reason) = self.next_error.lock().unwrap().take() {
            return Err(ExportError::WriteFailed {
                path: path.to_path_buf(),
                reason,
            });
        }

        self.exports.lock().unwrap().push(RecordedExport {
            path: path.to_path_buf(),
            records: records.to_vec(),
        });
        Ok(())
    }
}
