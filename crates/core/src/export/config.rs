use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Export configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportConfig {
    /// Directory for exports written without an explicit path.
    #[serde(default = "default_dir")]
    pub dir: PathBuf,

    /// Value written to the purchase price column.
    #[serde(default = "default_purchase_price")]
    pub purchase_price: String,
}

fn default_dir() -> PathBuf {
    PathBuf::from(".")
}

fn default_purchase_price() -> String {
    "unbekannt".to_string()
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            dir: default_dir(),
            purchase_price: default_purchase_price(),
        }
    }
}
