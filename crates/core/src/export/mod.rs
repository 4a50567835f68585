//! Export of the accumulated card history.
//!
//! The supervisor decides the order; an exporter only writes what it is
//! given. [`SemicolonCsvExporter`] produces the spreadsheet layout the
//! shop imports.

mod config;
mod csv_writer;
mod error;
mod traits;

pub use config::ExportConfig;
pub use csv_writer::{SemicolonCsvExporter, CSV_HEADER};
pub use error::ExportError;
pub use traits::CsvExporter;
