//! Semicolon separated export in the shop's spreadsheet layout.

use std::fs::File;
use std::path::Path;
use tracing::info;

use super::config::ExportConfig;
use super::error::ExportError;
use super::traits::CsvExporter;
use crate::sorter::CardRecord;

/// Header row, in column order.
pub const CSV_HEADER: [&str; 21] = [
    "Fachbuchstabe",
    "Fachnummer",
    "Kartenname",
    "Bildnummer",
    "Edition",
    "Kartennummer",
    "Sprache",
    "Verlag",
    "Erscheinungsjahr",
    "Region",
    "Seltenheit",
    "Kartentyp",
    "Subtyp",
    "Farbe",
    "Spezialeffekte",
    "Limitierung",
    "Autogramm",
    "Memorabilia",
    "Zustand",
    "Ankaufspreis",
    "Marktwert",
];

/// CSV exporter using `;` as delimiter.
pub struct SemicolonCsvExporter {
    purchase_price: String,
}

impl SemicolonCsvExporter {
    pub fn new(config: &ExportConfig) -> Self {
        Self {
            purchase_price: config.purchase_price.clone(),
        }
    }

    fn row<'a>(&'a self, record: &'a CardRecord, slot: &'a str, image: &'a str) -> [&'a str; 21] {
        let c = &record.card;
        [
            record.label.as_str(),
            slot,
            c.name.as_str(),
            image,
            c.edition.as_str(),
            c.card_number.as_str(),
            c.language.as_str(),
            c.publisher.as_str(),
            c.release_year.as_str(),
            c.region.as_str(),
            c.rarity.as_str(),
            c.card_type.as_str(),
            c.subtype.as_str(),
            c.color.as_str(),
            c.special_effects.as_str(),
            c.limitation.as_str(),
            c.autograph.as_str(),
            c.memorabilia.as_str(),
            c.condition.as_str(),
            self.purchase_price.as_str(),
            c.market_value.as_str(),
        ]
    }
}

impl CsvExporter for SemicolonCsvExporter {
    fn name(&self) -> &str {
        "csv"
    }

    fn write(&self, records: &[CardRecord], path: &Path) -> Result<(), ExportError> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|source| {
                ExportError::DirectoryCreationFailed {
                    path: parent.to_path_buf(),
                    source,
                }
            })?;
        }

        let write_failed = |reason: String| ExportError::WriteFailed {
            path: path.to_path_buf(),
            reason,
        };

        let file = File::create(path).map_err(|e| write_failed(e.to_string()))?;
        let mut writer = csv::WriterBuilder::new()
            .delimiter(b';')
            .from_writer(file);

        writer
            .write_record(CSV_HEADER)
            .map_err(|e| write_failed(e.to_string()))?;

        for record in records {
            let slot = record.slot.to_string();
            let image = record
                .image_path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default();
            writer
                .write_record(self.row(record, &slot, &image))
                .map_err(|e| write_failed(e.to_string()))?;
        }

        writer.flush().map_err(|e| write_failed(e.to_string()))?;

        info!(path = %path.display(), records = records.len(), "export written");
        Ok(())
    }
}
