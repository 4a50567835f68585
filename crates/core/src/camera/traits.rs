//! Trait definitions for the camera module.

use async_trait::async_trait;
use std::path::Path;

use super::error::CaptureError;

/// A camera that can capture a still image to a file.
#[async_trait]
pub trait CameraService: Send + Sync {
    /// Returns the name of this camera implementation.
    fn name(&self) -> &str;

    /// Capture one image to `path`.
    ///
    /// On success the file exists. Parent directories are created as needed.
    async fn capture(&self, path: &Path) -> Result<(), CaptureError>;
}
