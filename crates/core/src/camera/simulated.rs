//! Camera stand-in that writes a stub image.

use async_trait::async_trait;
use std::path::Path;

use super::error::CaptureError;
use super::traits::CameraService;

/// Minimal JPEG start/end markers; enough for tools that sniff the type.
const STUB_IMAGE: &[u8] = &[0xFF, 0xD8, 0xFF, 0xD9];

#[derive(Debug, Default)]
pub struct SimulatedCamera;

impl SimulatedCamera {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl CameraService for SimulatedCamera {
    fn name(&self) -> &str {
        "simulated"
    }

    async fn capture(&self, path: &Path) -> Result<(), CaptureError> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }
        tokio::fs::write(path, STUB_IMAGE).await?;
        Ok(())
    }
}
