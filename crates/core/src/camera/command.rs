//! Camera backed by an external still-capture program.

use async_trait::async_trait;
use std::path::Path;
use std::process::Stdio;
use tokio::process::Command;
use tokio::time::{timeout, Duration};
use tracing::debug;

use super::config::CameraConfig;
use super::error::CaptureError;
use super::traits::CameraService;

/// Runs the configured capture program once per image.
pub struct CommandCamera {
    config: CameraConfig,
}

impl CommandCamera {
    pub fn new(config: CameraConfig) -> Self {
        Self { config }
    }

    /// Builds the argument list with `{path}` substituted.
    fn build_args(&self, path: &Path) -> Vec<String> {
        let path = path.to_string_lossy();
        self.config
            .args
            .iter()
            .map(|arg| arg.replace("{path}", &path))
            .collect()
    }
}

#[async_trait]
impl CameraService for CommandCamera {
    fn name(&self) -> &str {
        "command"
    }

    async fn capture(&self, path: &Path) -> Result<(), CaptureError> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }

        let args = self.build_args(path);
        debug!(program = %self.config.program, ?args, "capturing image");

        let child = Command::new(&self.config.program)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| {
                if e.kind() == std::io::ErrorKind::NotFound {
                    CaptureError::ProgramNotFound {
                        program: self.config.program.clone(),
                    }
                } else {
                    CaptureError::Io(e)
                }
            })?;

        let output = timeout(
            Duration::from_secs(self.config.timeout_secs),
            child.wait_with_output(),
        )
        .await
        .map_err(|_| CaptureError::Timeout {
            timeout_secs: self.config.timeout_secs,
        })??;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
            return Err(CaptureError::failed(
                format!("{} exited with code: {:?}", self.config.program, output.status.code()),
                if stderr.is_empty() { None } else { Some(stderr) },
            ));
        }

        if tokio::fs::metadata(path).await.is_err() {
            return Err(CaptureError::MissingOutput {
                path: path.to_path_buf(),
            });
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;
    use tempfile::TempDir;

    fn camera(program: &str, args: &[&str]) -> CommandCamera {
        CommandCamera::new(CameraConfig {
            program: program.to_string(),
            args: args.iter().map(|s| s.to_string()).collect(),
            timeout_secs: 5,
            ..Default::default()
        })
    }

    #[test]
    fn test_build_args_substitutes_path() {
        let cam = camera("libcamera-still", &["-n", "-o", "{path}"]);
        let args = cam.build_args(&PathBuf::from("/tmp/images/a.jpg"));
        assert_eq!(args, vec!["-n", "-o", "/tmp/images/a.jpg"]);
    }

    #[tokio::test]
    async fn test_missing_program() {
        let dir = TempDir::new().unwrap();
        let cam = camera("definitely-not-a-capture-program", &["{path}"]);
        let err = cam.capture(&dir.path().join("a.jpg")).await.unwrap_err();
        assert!(matches!(err, CaptureError::ProgramNotFound { .. }));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_capture_with_touch() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("card.jpg");
        let cam = camera("touch", &["{path}"]);
        cam.capture(&path).await.unwrap();
        assert!(path.exists());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_success_without_output_is_error() {
        let dir = TempDir::new().unwrap();
        let cam = camera("true", &[]);
        let err = cam.capture(&dir.path().join("card.jpg")).await.unwrap_err();
        assert!(matches!(err, CaptureError::MissingOutput { .. }));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_nonzero_exit_is_failure() {
        let dir = TempDir::new().unwrap();
        let cam = camera("false", &[]);
        let err = cam.capture(&dir.path().join("card.jpg")).await.unwrap_err();
        assert!(matches!(err, CaptureError::Failed { .. }));
    }
}
