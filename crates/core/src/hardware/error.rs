//! Error types for motor operations.

use thiserror::Error;

use super::traits::Axis;

/// Faults raised by a motor driver.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum MotorFault {
    /// A move was requested while the drivers were de-energized.
    #[error("{axis} axis is disabled")]
    Disabled { axis: Axis },

    /// The driver reported a stall or lost steps.
    #[error("{axis} axis stalled after {completed} of {requested} steps")]
    Stalled {
        axis: Axis,
        completed: u32,
        requested: u32,
    },

    /// Communication with the driver failed.
    #[error("driver error on {axis} axis: {reason}")]
    Driver { axis: Axis, reason: String },
}

impl MotorFault {
    /// Axis the fault occurred on.
    pub fn axis(&self) -> Axis {
        match self {
            Self::Disabled { axis } | Self::Stalled { axis, .. } | Self::Driver { axis, .. } => {
                *axis
            }
        }
    }
}
