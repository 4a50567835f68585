//! Camera configuration.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Available camera backends.
#[derive(Debug, Clone, Copy, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum CameraBackend {
    /// External still-capture program.
    Command,
    /// Writes a stub image; for development without a sensor.
    #[default]
    Simulated,
}

/// Configuration for image capture.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CameraConfig {
    #[serde(default)]
    pub backend: CameraBackend,

    /// Capture program for the `command` backend.
    #[serde(default = "default_program")]
    pub program: String,

    /// Program arguments. `{path}` is replaced by the output file.
    #[serde(default = "default_args")]
    pub args: Vec<String>,

    /// Directory images are written to.
    #[serde(default = "default_image_dir")]
    pub image_dir: PathBuf,

    /// Image file extension (without dot).
    #[serde(default = "default_extension")]
    pub extension: String,

    /// Maximum time a single capture may take.
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
}

fn default_program() -> String {
    "libcamera-still".to_string()
}

fn default_args() -> Vec<String> {
    ["-n", "-t", "1", "-o", "{path}"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

fn default_image_dir() -> PathBuf {
    PathBuf::from("images")
}

fn default_extension() -> String {
    "jpg".to_string()
}

fn default_timeout() -> u64 {
    30
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            backend: CameraBackend::default(),
            program: default_program(),
            args: default_args(),
            image_dir: default_image_dir(),
            extension: default_extension(),
            timeout_secs: default_timeout(),
        }
    }
}
