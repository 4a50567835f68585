//! Motor and sensor capabilities consumed by the sequence engine.
//!
//! The engine never touches pins directly. It receives a [`MotorDriver`] and a
//! [`HomeSensor`] at construction, so the same sequencing code runs against
//! real drivers, the simulated backend, or test doubles.

mod error;
mod simulated;
mod traits;

pub use error::MotorFault;
pub use simulated::{SimulatedHomeSensor, SimulatedMotorDriver};
pub use traits::{Axis, Direction, HomeSensor, MotorDriver, SensorState};

use std::sync::Arc;

use crate::config::{HardwareBackend, HardwareConfig};

/// Factory function to create the motor driver and home sensor from config
pub fn create_drivers(config: &HardwareConfig) -> (Arc<dyn MotorDriver>, Arc<dyn HomeSensor>) {
    match config.backend {
        HardwareBackend::Simulated => (
            Arc::new(SimulatedMotorDriver::new()),
            Arc::new(SimulatedHomeSensor::new(config.simulated_home_after_reads)),
        ),
    }
}
