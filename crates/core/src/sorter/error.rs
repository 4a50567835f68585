//! Error types for run orchestration.

use thiserror::Error;

use crate::camera::CaptureError;
use crate::export::ExportError;
use crate::hardware::MotorFault;

/// Errors that end a homing attempt or a run.
#[derive(Debug, Error)]
pub enum SequenceError {
    /// The reference switch never asserted.
    #[error("homing timed out after {steps} steps")]
    HomingTimeout { steps: u32 },

    /// Capture failed; the card may be half separated.
    #[error("capture failed: {0}")]
    Capture(#[from] CaptureError),

    /// A motor move failed.
    #[error("motor fault: {0}")]
    Motor(#[from] MotorFault),

    /// Start slot outside the magazine.
    #[error("invalid start slot {slot} for magazine of {magazine_size}")]
    InvalidStartSlot { slot: u32, magazine_size: u32 },
}

/// Errors returned to control-plane callers.
#[derive(Debug, Error)]
pub enum SupervisorError {
    /// A run is in progress or being started.
    #[error("a run is already in progress")]
    AlreadyRunning,

    /// Empty magazine label.
    #[error("label must not be empty")]
    InvalidLabel,

    #[error(transparent)]
    Sequence(#[from] SequenceError),

    #[error("export failed: {0}")]
    Export(#[from] ExportError),
}
