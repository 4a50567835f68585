//! Mock camera for testing.

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;

use crate::camera::{CameraService, CaptureError};

/// Mock implementation of the CameraService trait.
///
/// Records every requested path. Files are only written when created with
/// [`MockCamera::writing_files`], so tests without a temp dir leave no trace.
#[derive(Debug)]
pub struct MockCamera {
    captures: Arc<RwLock<Vec<PathBuf>>>,
    calls: Arc<RwLock<usize>>,
    /// Fail the n-th call (1-based).
    fail_on_call: Arc<RwLock<Option<usize>>>,
    delay: Arc<RwLock<Duration>>,
    write_files: bool,
}

impl Default for MockCamera {
    fn default() -> Self {
        Self::new()
    }
}

impl MockCamera {
    pub fn new() -> Self {
        Self {
            captures: Arc::new(RwLock::new(Vec::new())),
            calls: Arc::new(RwLock::new(0)),
            fail_on_call: Arc::new(RwLock::new(None)),
            delay: Arc::new(RwLock::new(Duration::ZERO)),
            write_files: false,
        }
    }

    /// Camera that writes a small file to every requested path.
    pub fn writing_files() -> Self {
        Self {
            write_files: true,
            ..Self::new()
        }
    }

    pub async fn fail_on_call(&self, n: usize) {
        *self.fail_on_call.write().await = Some(n);
    }

    pub async fn set_delay(&self, delay: Duration) {
        *self.delay.write().await = delay;
    }

    /// Paths of successful captures in order.
    pub async fn recorded_captures(&self) -> Vec<PathBuf> {
        self.captures.read().await.clone()
    }

    pub async fn call_count(&self) -> usize {
        *self.calls.read().await
    }
}

#[async_trait]
impl CameraService for MockCamera {
    fn name(&self) -> &str {
        "mock"
    }

    async fn capture(&self, path: &Path) -> Result<(), CaptureError> {
        let call = {
            let mut calls = self.calls.write().await;
            *calls += 1;
            *calls
        };

        let delay = *self.delay.read().await;
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }

        if *self.fail_on_call.read().await == Some(call) {
            return Err(CaptureError::failed(
                format!("mock capture failure on call {}", call),
                None,
            ));
        }

        if self.write_files {
            if let Some(parent) = path.parent() {
                tokio::fs::create_dir_all(parent).await?;
            }
            tokio::fs::write(path, b"mock image").await?;
        }

        self.captures.write().await.push(path.to_path_buf());
        Ok(())
    }
}
