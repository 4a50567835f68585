use std::path::Path;

use super::error::ExportError;
use crate::sorter::CardRecord;

/// Writes an already ordered sequence of records to a file.
pub trait CsvExporter: Send + Sync {
    /// Name of the exporter for logging.
    fn name(&self) -> &str;

    /// Write `records` to `path` in the given order, replacing any existing file.
    fn write(&self, records: &[CardRecord], path: &Path) -> Result<(), ExportError>;
}
