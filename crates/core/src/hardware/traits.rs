//! Trait definitions for the hardware layer.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

use super::error::MotorFault;

/// Physical axes driven by the machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Axis {
    /// Card transport (separate and eject).
    Cards,
    /// Magazine carriage (advance, return, homing).
    Magazine,
}

impl fmt::Display for Axis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Axis::Cards => write!(f, "cards"),
            Axis::Magazine => write!(f, "magazine"),
        }
    }
}

/// Rotation direction along an axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    Forward,
    Backward,
}

/// Reading of the magazine reference switch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SensorState {
    Asserted,
    NotAsserted,
}

/// Stepper drivers for both axes behind a shared enable line.
///
/// Implementations must be safe to call from several tasks: the run worker
/// issues moves while an emergency stop may call [`MotorDriver::set_enabled`]
/// from the control plane at the same time.
#[async_trait]
pub trait MotorDriver: Send + Sync {
    /// Returns the name of this driver implementation.
    fn name(&self) -> &str;

    /// Emit `steps` pulses on `axis` with `step_delay` between edges.
    ///
    /// A move always runs its full pulse train or fails; callers never
    /// interrupt it part way. Moving while disabled is a fault.
    async fn move_axis(
        &self,
        axis: Axis,
        direction: Direction,
        steps: u32,
        step_delay: Duration,
    ) -> Result<(), MotorFault>;

    /// Energize or de-energize all drivers. Must be idempotent.
    fn set_enabled(&self, enabled: bool);

    /// Whether the drivers are currently energized.
    fn is_enabled(&self) -> bool;
}

/// Binary reference-position sensor on the magazine axis.
pub trait HomeSensor: Send + Sync {
    fn read(&self) -> SensorState;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_direction_serialization() {
        assert_eq!(
            serde_json::to_string(&Direction::Backward).unwrap(),
            "\"backward\""
        );
    }

    #[test]
    fn test_axis_serialization() {
        assert_eq!(serde_json::to_string(&Axis::Magazine).unwrap(), "\"magazine\"");
        assert_eq!(Axis::Cards.to_string(), "cards");
    }
}
